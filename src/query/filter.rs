//! # Filter Expression Tree
//!
//! Typed filter expressions for list queries. Client range filters, equality
//! filters and developer-injected search clauses all end up here before they
//! reach the document store.

use std::cmp::Ordering;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker that prefixes every store-native operator token
pub const OPERATOR_MARKER: char = '$';

/// Range comparison operators a client may request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeOp {
    /// Greater than
    #[serde(rename = "gt")]
    Gt,

    /// Greater than or equal
    #[serde(rename = "gte")]
    Gte,

    /// Less than
    #[serde(rename = "lt")]
    Lt,

    /// Less than or equal
    #[serde(rename = "lte")]
    Lte,
}

impl RangeOp {
    /// Get the operator name as clients spell it
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeOp::Gt => "gt",
            RangeOp::Gte => "gte",
            RangeOp::Lt => "lt",
            RangeOp::Lte => "lte",
        }
    }

    /// Parse a client suffix. Matching is exact and case-sensitive.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(RangeOp::Gt),
            "gte" => Some(RangeOp::Gte),
            "lt" => Some(RangeOp::Lt),
            "lte" => Some(RangeOp::Lte),
            _ => None,
        }
    }

    /// The store-native token, e.g. `$gte`
    pub fn native_token(&self) -> String {
        format!("{}{}", OPERATOR_MARKER, self.as_str())
    }

    /// Parse a store-native token back into an operator
    pub fn from_native_token(token: &str) -> Option<Self> {
        token
            .strip_prefix(OPERATOR_MARKER)
            .and_then(Self::from_suffix)
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            RangeOp::Gt => ordering == Ordering::Greater,
            RangeOp::Gte => ordering != Ordering::Less,
            RangeOp::Lt => ordering == Ordering::Less,
            RangeOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterExpr {
    /// Field equals value
    Eq { field: String, value: Value },

    /// Field compared against a bound
    Range {
        field: String,
        op: RangeOp,
        value: Value,
    },

    /// Field matches a regular expression
    Regex {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },

    /// All clauses must match. An empty conjunction matches everything.
    And { clauses: Vec<FilterExpr> },
}

impl Default for FilterExpr {
    fn default() -> Self {
        Self::all()
    }
}

impl FilterExpr {
    /// Filter that matches every document
    pub fn all() -> Self {
        FilterExpr::And {
            clauses: Vec::new(),
        }
    }

    /// Create an equality filter
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value,
        }
    }

    /// Create a range filter
    pub fn range(field: impl Into<String>, op: RangeOp, value: Value) -> Self {
        FilterExpr::Range {
            field: field.into(),
            op,
            value,
        }
    }

    /// Case-insensitive substring search on a field.
    ///
    /// The search text is escaped, so it never acts as a pattern.
    pub fn contains_ci(field: impl Into<String>, text: &str) -> Self {
        FilterExpr::Regex {
            field: field.into(),
            pattern: regex::escape(text),
            case_insensitive: true,
        }
    }

    /// Conjunction of the given clauses, flattened. A lone clause is returned as is.
    pub fn all_of(clauses: impl IntoIterator<Item = FilterExpr>) -> Self {
        let mut clauses: Vec<FilterExpr> = clauses
            .into_iter()
            .flat_map(FilterExpr::into_clauses)
            .collect();
        if clauses.len() == 1 {
            return clauses.remove(0);
        }
        FilterExpr::And { clauses }
    }

    /// Combine with another filter. Nested conjunctions are flattened.
    pub fn and(self, other: FilterExpr) -> Self {
        let mut clauses = self.into_clauses();
        clauses.extend(other.into_clauses());
        FilterExpr::And { clauses }
    }

    fn into_clauses(self) -> Vec<FilterExpr> {
        match self {
            FilterExpr::And { clauses } => clauses
                .into_iter()
                .flat_map(FilterExpr::into_clauses)
                .collect(),
            leaf => vec![leaf],
        }
    }

    /// True when the filter matches every document
    pub fn is_empty(&self) -> bool {
        match self {
            FilterExpr::And { clauses } => clauses.iter().all(FilterExpr::is_empty),
            _ => false,
        }
    }

    /// Distinct field names referenced by the filter, in first-seen order
    pub fn fields(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Eq { field, .. }
            | FilterExpr::Range { field, .. }
            | FilterExpr::Regex { field, .. } => {
                if !out.contains(&field.as_str()) {
                    out.push(field);
                }
            }
            FilterExpr::And { clauses } => {
                for clause in clauses {
                    clause.collect_fields(out);
                }
            }
        }
    }

    /// Check if a document matches this filter.
    ///
    /// Compiles any regular expression on every call, and a pattern that does
    /// not compile matches nothing. Use [`FilterExpr::compile`] to evaluate
    /// many documents and surface pattern errors.
    pub fn matches(&self, doc: &Value) -> bool {
        self.compile().is_ok_and(|matcher| matcher.matches(doc))
    }

    /// Compile regular expressions once, ready to test many documents
    pub fn compile(&self) -> Result<FilterMatcher<'_>, regex::Error> {
        let node = match self {
            FilterExpr::Regex {
                field,
                pattern,
                case_insensitive,
            } => MatchNode::Regex {
                field,
                regex: RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()?,
            },
            FilterExpr::And { clauses } => MatchNode::All(
                clauses
                    .iter()
                    .map(|c| c.compile().map(|m| m.node))
                    .collect::<Result<_, _>>()?,
            ),
            leaf => MatchNode::Leaf(leaf),
        };
        Ok(FilterMatcher { node })
    }

    /// Render the store-native filter document
    pub fn to_native(&self) -> Value {
        match self {
            FilterExpr::Eq { field, value } => single(field, value.clone()),
            FilterExpr::Range { field, op, value } => {
                single(field, single(&op.native_token(), value.clone()))
            }
            FilterExpr::Regex {
                field,
                pattern,
                case_insensitive,
            } => {
                let mut ops = Map::new();
                ops.insert("$regex".to_string(), Value::String(pattern.clone()));
                if *case_insensitive {
                    ops.insert("$options".to_string(), Value::String("i".to_string()));
                }
                single(field, Value::Object(ops))
            }
            FilterExpr::And { clauses } => match clauses.as_slice() {
                [] => Value::Object(Map::new()),
                [only] => only.to_native(),
                many => single("$and", Value::Array(many.iter().map(Self::to_native).collect())),
            },
        }
    }

    /// Parse a store-native filter document.
    ///
    /// Operator objects that mix `$` and plain keys are kept as equality on an
    /// object value, the same way a document store treats them.
    pub fn from_native(native: &Value) -> Self {
        let Value::Object(map) = native else {
            return FilterExpr::all();
        };

        let mut clauses = Vec::new();
        for (key, value) in map {
            if key == "$and" {
                if let Value::Array(items) = value {
                    clauses.extend(items.iter().map(Self::from_native));
                }
                continue;
            }
            clauses.push(Self::from_native_field(key, value));
        }

        match clauses.len() {
            1 => clauses.remove(0),
            _ => FilterExpr::all_of(clauses),
        }
    }

    fn from_native_field(field: &str, value: &Value) -> Self {
        let Value::Object(ops) = value else {
            return FilterExpr::eq(field, value.clone());
        };
        if ops.is_empty() || !ops.keys().all(|k| k.starts_with(OPERATOR_MARKER)) {
            return FilterExpr::eq(field, value.clone());
        }

        let mut clauses = Vec::new();
        if let Some(Value::String(pattern)) = ops.get("$regex") {
            clauses.push(FilterExpr::Regex {
                field: field.to_string(),
                pattern: pattern.clone(),
                case_insensitive: ops
                    .get("$options")
                    .and_then(Value::as_str)
                    .is_some_and(|o| o.contains('i')),
            });
        }
        for (token, bound) in ops {
            if let Some(op) = RangeOp::from_native_token(token) {
                clauses.push(FilterExpr::range(field, op, bound.clone()));
            }
        }

        match clauses.len() {
            0 => FilterExpr::eq(field, value.clone()),
            1 => clauses.remove(0),
            _ => FilterExpr::And { clauses },
        }
    }
}

/// A filter with its regular expressions compiled
#[derive(Debug)]
pub struct FilterMatcher<'f> {
    node: MatchNode<'f>,
}

#[derive(Debug)]
enum MatchNode<'f> {
    Leaf(&'f FilterExpr),
    Regex { field: &'f str, regex: Regex },
    All(Vec<MatchNode<'f>>),
}

impl FilterMatcher<'_> {
    /// Check if a document matches
    pub fn matches(&self, doc: &Value) -> bool {
        self.node.matches(doc)
    }
}

impl MatchNode<'_> {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            MatchNode::Leaf(expr) => leaf_matches(expr, doc),
            MatchNode::Regex { field, regex } => match doc.get(*field) {
                Some(Value::String(s)) => regex.is_match(s),
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|s| regex.is_match(s)),
                _ => false,
            },
            MatchNode::All(nodes) => nodes.iter().all(|n| n.matches(doc)),
        }
    }
}

/// Equality and range leaves
fn leaf_matches(expr: &FilterExpr, doc: &Value) -> bool {
    match expr {
        FilterExpr::Eq { field, value } => match doc.get(field) {
            Some(Value::Array(items)) if !value.is_array() => {
                items.iter().any(|item| values_equal(item, value))
            }
            Some(field_value) => values_equal(field_value, value),
            None => value.is_null(),
        },
        FilterExpr::Range { field, op, value } => match doc.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .any(|item| compare_values(item, value).is_some_and(|o| op.accepts(o))),
            Some(field_value) => compare_values(field_value, value).is_some_and(|o| op.accepts(o)),
            None => false,
        },
        FilterExpr::Regex { .. } | FilterExpr::And { .. } => false,
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Equality with the loose typing of a query string: a string query value
/// equals a number or boolean when it parses to it.
pub fn values_equal(doc_value: &Value, query_value: &Value) -> bool {
    match (doc_value, query_value) {
        (Value::Number(_), Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .zip(doc_value.as_f64())
            .is_some_and(|(q, d)| q == d),
        (Value::Bool(b), Value::String(s)) => s.parse::<bool>().is_ok_and(|q| q == *b),
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => doc_value == query_value,
    }
}

/// Compare a document value against a query bound.
///
/// Returns `None` when the two values have no common ordering.
pub fn compare_values(doc_value: &Value, query_value: &Value) -> Option<Ordering> {
    match (doc_value, query_value) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::String(s)) => {
            a.as_f64()?.partial_cmp(&s.trim().parse::<f64>().ok()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}
