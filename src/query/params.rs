//! # Raw Request Parameters
//!
//! The untyped query-string mapping a list request arrives with.
//!
//! Bracket keys nest one level: `year[gte]=1990` becomes
//! `year -> {gte: "1990"}`. Repeated plain keys collect into a list.
//!
//! Keys that start with the store's operator marker `$` or contain a `.`
//! are dropped on insertion, so client input can never name a store
//! operator or reach into a nested document path.

use std::collections::BTreeMap;

use serde::Serialize;

use super::filter::OPERATOR_MARKER;

/// Control key: page number
pub const PAGE_KEY: &str = "page";

/// Control key: page size
pub const LIMIT_KEY: &str = "limit";

/// Control key: sort order
pub const SORT_KEY: &str = "sort";

/// Keys that steer pagination and ordering rather than filtering
pub const CONTROL_KEYS: [&str; 3] = [PAGE_KEY, LIMIT_KEY, SORT_KEY];

/// A single parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
    Nested(BTreeMap<String, ParamValue>),
    /// Plain and bracket forms of the same key, e.g. `year=1990&year[lt]=2000`
    Mixed {
        value: Box<ParamValue>,
        nested: BTreeMap<String, ParamValue>,
    },
}

impl ParamValue {
    /// The scalar value, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            _ => None,
        }
    }

    /// Add a plain `key=value` occurrence
    fn with_plain(self, value: String) -> Self {
        match self {
            ParamValue::Single(first) => ParamValue::Many(vec![first, value]),
            ParamValue::Many(mut values) => {
                values.push(value);
                ParamValue::Many(values)
            }
            ParamValue::Nested(nested) => ParamValue::Mixed {
                value: Box::new(ParamValue::Single(value)),
                nested,
            },
            ParamValue::Mixed { value: plain, nested } => ParamValue::Mixed {
                value: Box::new(plain.with_plain(value)),
                nested,
            },
        }
    }

    /// Add a `key[sub]=value` occurrence
    fn with_nested(self, sub: &str, value: String) -> Self {
        match self {
            ParamValue::Nested(mut nested) => {
                insert_sub(&mut nested, sub, value);
                ParamValue::Nested(nested)
            }
            ParamValue::Mixed {
                value: plain,
                mut nested,
            } => {
                insert_sub(&mut nested, sub, value);
                ParamValue::Mixed {
                    value: plain,
                    nested,
                }
            }
            plain => {
                let mut nested = BTreeMap::new();
                insert_sub(&mut nested, sub, value);
                ParamValue::Mixed {
                    value: Box::new(plain),
                    nested,
                }
            }
        }
    }
}

fn insert_sub(nested: &mut BTreeMap<String, ParamValue>, sub: &str, value: String) {
    let slot = match nested.remove(sub) {
        Some(existing) => existing.with_plain(value),
        None => ParamValue::Single(value),
    };
    nested.insert(sub.to_string(), slot);
}

/// Query-string parameters keyed by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RawParams {
    entries: BTreeMap<String, ParamValue>,
}

impl RawParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from decoded `key=value` pairs in request order.
    ///
    /// For control keys the last occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = RawParams::new();
        for (key, value) in pairs {
            params.insert_pair(key.as_ref(), value.into());
        }
        params
    }

    fn insert_pair(&mut self, key: &str, value: String) {
        if let Some((field, sub)) = split_bracket_key(key) {
            if !is_safe_key(field) || !is_safe_key(sub) {
                return;
            }
            let merged = match self.entries.remove(field) {
                Some(existing) => existing.with_nested(sub, value),
                None => ParamValue::Nested(BTreeMap::new()).with_nested(sub, value),
            };
            self.entries.insert(field.to_string(), merged);
            return;
        }

        if !is_safe_key(key) {
            return;
        }

        if CONTROL_KEYS.contains(&key) {
            self.entries
                .insert(key.to_string(), ParamValue::Single(value));
            return;
        }

        let merged = match self.entries.remove(key) {
            Some(existing) => existing.with_plain(value),
            None => ParamValue::Single(value),
        };
        self.entries.insert(key.to_string(), merged);
    }

    /// Insert or replace a value
    pub fn insert(&mut self, key: impl Into<String>, value: ParamValue) {
        self.entries.insert(key.into(), value);
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// Scalar value of a key
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Not empty, no operator marker prefix, no path separator
fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.starts_with(OPERATOR_MARKER) && !key.contains('.')
}

/// `field[sub]` -> (`field`, `sub`)
fn split_bracket_key(key: &str) -> Option<(&str, &str)> {
    let open = key.find('[')?;
    let inner = key[open + 1..].strip_suffix(']')?;
    if open == 0 || inner.is_empty() || inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some((&key[..open], inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_pairs() {
        let params = RawParams::from_pairs([("title", "Dune"), ("page", "2")]);

        assert_eq!(params.get_str("title"), Some("Dune"));
        assert_eq!(params.get_str("page"), Some("2"));
    }

    #[test]
    fn test_bracket_keys_nest() {
        let params = RawParams::from_pairs([("year[gte]", "1990"), ("year[lt]", "2000")]);

        let mut expected = BTreeMap::new();
        expected.insert("gte".to_string(), ParamValue::Single("1990".to_string()));
        expected.insert("lt".to_string(), ParamValue::Single("2000".to_string()));
        assert_eq!(params.get("year"), Some(&ParamValue::Nested(expected)));
    }

    #[test]
    fn test_repeated_filter_key_collects() {
        let params = RawParams::from_pairs([("languages", "en"), ("languages", "fr")]);

        assert_eq!(
            params.get("languages"),
            Some(&ParamValue::Many(vec!["en".to_string(), "fr".to_string()]))
        );
    }

    #[test]
    fn test_repeated_control_key_last_wins() {
        let params = RawParams::from_pairs([("limit", "5"), ("limit", "7")]);
        assert_eq!(params.get_str("limit"), Some("7"));
    }

    #[test]
    fn test_malformed_brackets_stay_literal() {
        let params = RawParams::from_pairs([("[gte]", "1"), ("a[b][c]", "2"), ("x[", "3")]);

        assert!(params.contains_key("[gte]"));
        assert!(params.contains_key("a[b][c]"));
        assert!(params.contains_key("x["));
    }

    #[test]
    fn test_operator_keys_dropped() {
        let params = RawParams::from_pairs([
            ("year[$gt]", "1"),
            ("$where", "sleep(1)"),
            ("$or[title]", "x"),
            ("title", "Dune"),
        ]);

        assert_eq!(params.len(), 1);
        assert!(!params.contains_key("year"));
        assert_eq!(params.get_str("title"), Some("Dune"));
    }

    #[test]
    fn test_dotted_keys_dropped() {
        let params = RawParams::from_pairs([("meta.secret", "1"), ("year[a.b]", "2")]);
        assert!(params.is_empty());
    }

    #[test]
    fn test_operator_sub_key_keeps_siblings() {
        let params = RawParams::from_pairs([("year[gte]", "1990"), ("year[$ne]", "1")]);

        let mut expected = BTreeMap::new();
        expected.insert("gte".to_string(), ParamValue::Single("1990".to_string()));
        assert_eq!(params.get("year"), Some(&ParamValue::Nested(expected)));
    }

    #[test]
    fn test_plain_then_bracket_keeps_both() {
        let params = RawParams::from_pairs([("year", "1990"), ("year[lt]", "2000")]);

        let mut nested = BTreeMap::new();
        nested.insert("lt".to_string(), ParamValue::Single("2000".to_string()));
        assert_eq!(
            params.get("year"),
            Some(&ParamValue::Mixed {
                value: Box::new(ParamValue::Single("1990".to_string())),
                nested,
            })
        );
    }

    #[test]
    fn test_bracket_then_plain_keeps_both() {
        let params =
            RawParams::from_pairs([("year[gte]", "1990"), ("year", "1995"), ("year", "1996")]);

        let mut nested = BTreeMap::new();
        nested.insert("gte".to_string(), ParamValue::Single("1990".to_string()));
        assert_eq!(
            params.get("year"),
            Some(&ParamValue::Mixed {
                value: Box::new(ParamValue::Many(vec![
                    "1995".to_string(),
                    "1996".to_string()
                ])),
                nested,
            })
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = RawParams::from_pairs([("page", "1"), ("title", "x")]);
        let mut copy = original.clone();
        copy.remove("page");

        assert!(original.contains_key("page"));
        assert!(!copy.contains_key("page"));
    }
}
