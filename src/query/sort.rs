//! # Sort Specification
//!
//! Ordered (field, direction) pairs parsed from `sort` tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::catalog::IndexDescriptor;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// The opposite direction
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Store-native direction: 1 or -1
    pub fn as_native(self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered sort keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    /// Parse tokens such as `title` or `-year`.
    ///
    /// A repeated field keeps its first position and takes the last direction.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        let mut keys: Vec<SortKey> = Vec::new();
        for token in tokens {
            let (field, direction) = match token.strip_prefix('-') {
                Some(field) => (field, SortDirection::Descending),
                None => (token, SortDirection::Ascending),
            };
            match keys.iter_mut().find(|k| k.field == field) {
                Some(existing) => existing.direction = direction,
                None => keys.push(SortKey {
                    field: field.to_string(),
                    direction,
                }),
            }
        }
        Self { keys }
    }

    /// An index scanned forward: every key ascending
    pub fn from_index(index: &IndexDescriptor) -> Self {
        Self {
            keys: index
                .fields()
                .iter()
                .map(|field| SortKey {
                    field: field.clone(),
                    direction: SortDirection::Ascending,
                })
                .collect(),
        }
    }

    /// Every direction flipped, field order kept
    pub fn reversed(&self) -> Self {
        Self {
            keys: self
                .keys
                .iter()
                .map(|k| SortKey {
                    field: k.field.clone(),
                    direction: k.direction.flipped(),
                })
                .collect(),
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Store-native sort as ordered pairs, e.g. `[["year", -1]]`
    pub fn to_native(&self) -> Value {
        Value::Array(
            self.keys
                .iter()
                .map(|k| json!([k.field, k.direction.as_native()]))
                .collect(),
        )
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            if key.direction == SortDirection::Descending {
                write!(f, "-")?;
            }
            write!(f, "{}", key.field)?;
        }
        Ok(())
    }
}
