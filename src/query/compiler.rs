//! # Query Compiler
//!
//! Turns raw request parameters into a typed user filter and sort tokens.
//!
//! Range suffixes (`year[gte]=1990`) are rewritten structurally into
//! `FilterExpr::Range`; everything else stays an equality. Injected criteria
//! pass through untouched.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::filter::{FilterExpr, RangeOp};
use super::params::{ParamValue, RawParams, CONTROL_KEYS, SORT_KEY};

/// Sort token used when the request names no order: most recent first
pub const DEFAULT_SORT: &str = "-id";

/// The ordering a request asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortRequest {
    /// No `sort` parameter; served by the primary key
    Default,
    /// Comma-split tokens from the `sort` parameter
    Requested(Vec<String>),
}

impl SortRequest {
    /// Tokens in order; the default order is `-id`
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            SortRequest::Default => vec![DEFAULT_SORT],
            SortRequest::Requested(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }
}

/// Output of compiling one request
#[derive(Debug, Clone)]
pub struct CompiledRequest {
    /// Filter built from client parameters
    pub user_filter: FilterExpr,
    /// Client filter keys, each of which must be index-covered
    pub filter_fields: Vec<String>,
    /// Requested ordering
    pub sort: SortRequest,
    /// Developer-supplied criteria, exempt from index checks
    pub injected: FilterExpr,
}

impl CompiledRequest {
    /// User filter and injected criteria combined
    pub fn combined_filter(&self) -> FilterExpr {
        self.user_filter.clone().and(self.injected.clone())
    }
}

/// Compile request parameters. Never fails; value problems surface at the store.
pub fn compile(raw: &RawParams, injected: FilterExpr) -> CompiledRequest {
    let mut working = raw.clone();
    let sort = working
        .get(SORT_KEY)
        .map(sort_request)
        .unwrap_or(SortRequest::Default);
    for key in CONTROL_KEYS {
        working.remove(key);
    }

    let mut filter_fields = Vec::with_capacity(working.len());
    let mut clauses = Vec::with_capacity(working.len());
    for (field, value) in working.iter() {
        filter_fields.push(field.clone());
        clauses.push(field_filter(field, value));
    }

    CompiledRequest {
        user_filter: FilterExpr::all_of(clauses),
        filter_fields,
        sort,
        injected,
    }
}

fn sort_request(value: &ParamValue) -> SortRequest {
    let Some(raw) = value.as_str() else {
        return SortRequest::Default;
    };
    let tokens: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    if tokens.is_empty() {
        SortRequest::Default
    } else {
        SortRequest::Requested(tokens)
    }
}

/// Filter for one client field
fn field_filter(field: &str, value: &ParamValue) -> FilterExpr {
    match value {
        ParamValue::Single(_) | ParamValue::Many(_) => FilterExpr::eq(field, to_json(value)),
        ParamValue::Nested(entries) => nested_filter(field, entries),
        ParamValue::Mixed { value, nested } => FilterExpr::all_of([
            FilterExpr::eq(field, to_json(value)),
            nested_filter(field, nested),
        ]),
    }
}

/// Range clauses for known suffixes; other sub-keys are equality on an object
fn nested_filter(field: &str, entries: &BTreeMap<String, ParamValue>) -> FilterExpr {
    let mut clauses = Vec::new();
    let mut rest = Map::new();
    for (key, inner) in entries {
        match RangeOp::from_suffix(key) {
            Some(op) => clauses.push(FilterExpr::range(field, op, bound(inner))),
            None => {
                rest.insert(key.clone(), to_json(inner));
            }
        }
    }
    if !rest.is_empty() {
        clauses.push(FilterExpr::eq(field, Value::Object(rest)));
    }
    FilterExpr::all_of(clauses)
}

/// Range bound; when a suffix repeats the last value wins
fn bound(value: &ParamValue) -> Value {
    match value {
        ParamValue::Many(values) => values
            .last()
            .cloned()
            .map(Value::String)
            .unwrap_or(Value::Null),
        other => to_json(other),
    }
}

fn to_json(value: &ParamValue) -> Value {
    match value {
        ParamValue::Single(s) => Value::String(s.clone()),
        ParamValue::Many(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        ParamValue::Nested(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), to_json(v)))
                .collect(),
        ),
        // only ever a top-level value
        ParamValue::Mixed { value, .. } => to_json(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> RawParams {
        RawParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_control_keys_removed() {
        let raw = params(&[("page", "2"), ("limit", "10"), ("sort", "title"), ("title", "x")]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(compiled.filter_fields, vec!["title"]);
        assert_eq!(compiled.user_filter.to_native(), json!({"title": "x"}));
    }

    #[test]
    fn test_range_rewrite() {
        let raw = params(&[("year[gte]", "1990")]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(compiled.filter_fields, vec!["year"]);
        assert_eq!(
            compiled.user_filter.to_native(),
            json!({"year": {"$gte": "1990"}})
        );
        assert!(compiled.user_filter.matches(&json!({"year": 1995})));
        assert!(!compiled.user_filter.matches(&json!({"year": 1985})));
    }

    #[test]
    fn test_suffix_matching_is_exact() {
        let raw = params(&[("year[GTE]", "1990"), ("rating[gtx]", "3")]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(
            compiled.user_filter,
            FilterExpr::all_of([
                FilterExpr::eq("rating", json!({"gtx": "3"})),
                FilterExpr::eq("year", json!({"GTE": "1990"})),
            ])
        );
    }

    #[test]
    fn test_operator_words_in_values_untouched() {
        let raw = params(&[("title", "gt"), ("status", "lte")]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(
            compiled.user_filter.to_native(),
            json!({"$and": [{"status": "lte"}, {"title": "gt"}]})
        );
    }

    #[test]
    fn test_repeated_field_is_array_equality() {
        let raw = params(&[("languages", "en"), ("languages", "fr")]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(
            compiled.user_filter,
            FilterExpr::eq("languages", json!(["en", "fr"]))
        );
    }

    #[test]
    fn test_sort_tokens() {
        let compiled = compile(&params(&[("sort", "-year, title,")]), FilterExpr::all());
        assert_eq!(
            compiled.sort,
            SortRequest::Requested(vec!["-year".to_string(), "title".to_string()])
        );
    }

    #[test]
    fn test_default_sort() {
        let compiled = compile(&RawParams::new(), FilterExpr::all());
        assert_eq!(compiled.sort, SortRequest::Default);
        assert_eq!(compiled.sort.tokens(), vec!["-id"]);

        let blank = compile(&params(&[("sort", " ")]), FilterExpr::all());
        assert_eq!(blank.sort, SortRequest::Default);
    }

    #[test]
    fn test_injected_untouched() {
        let injected = FilterExpr::contains_ci("title", "gte");
        let compiled = compile(&params(&[("year", "2000")]), injected.clone());

        assert_eq!(compiled.injected, injected);
        assert_eq!(compiled.filter_fields, vec!["year"]);
        assert_eq!(
            compiled.combined_filter(),
            FilterExpr::all_of([FilterExpr::eq("year", json!("2000")), injected])
        );
    }

    #[test]
    fn test_operator_sub_key_never_compiles() {
        let compiled = compile(&params(&[("year[$gt]", "1")]), FilterExpr::all());

        assert!(compiled.filter_fields.is_empty());
        assert!(compiled.user_filter.is_empty());
    }

    #[test]
    fn test_native_round_trip_after_sanitizing() {
        let raw = params(&[
            ("year[$gt]", "1"),
            ("year[gte]", "1990"),
            ("meta[$ne]", "x"),
            ("title[en]", "Dune"),
        ]);
        let compiled = compile(&raw, FilterExpr::all());

        assert_eq!(compiled.filter_fields, vec!["title", "year"]);
        let reparsed = FilterExpr::from_native(&compiled.user_filter.to_native());
        assert_eq!(reparsed, compiled.user_filter);
    }

    #[test]
    fn test_plain_then_bracket_keeps_both_constraints() {
        let compiled = compile(
            &params(&[("year", "1990"), ("year[lt]", "2000")]),
            FilterExpr::all(),
        );

        assert_eq!(compiled.filter_fields, vec!["year"]);
        assert_eq!(
            compiled.user_filter,
            FilterExpr::all_of([
                FilterExpr::eq("year", json!("1990")),
                FilterExpr::range("year", RangeOp::Lt, json!("2000")),
            ])
        );
        assert!(compiled.user_filter.matches(&json!({"year": 1990})));
        assert!(!compiled.user_filter.matches(&json!({"year": 1995})));
    }

    #[test]
    fn test_bracket_then_plain_keeps_both_constraints() {
        let compiled = compile(
            &params(&[("year[gte]", "1990"), ("year", "1995")]),
            FilterExpr::all(),
        );

        assert_eq!(
            compiled.user_filter.to_native(),
            json!({"$and": [{"year": "1995"}, {"year": {"$gte": "1990"}}]})
        );
        assert!(compiled.user_filter.matches(&json!({"year": 1995})));
        assert!(!compiled.user_filter.matches(&json!({"year": 1985})));
    }

    #[test]
    fn test_raw_params_not_mutated() {
        let raw = params(&[("page", "3"), ("title", "x")]);
        let _ = compile(&raw, FilterExpr::all());
        assert!(raw.contains_key("page"));
    }
}
