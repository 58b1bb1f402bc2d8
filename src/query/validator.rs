//! # Index Validator
//!
//! Rejects client filters and sorts the index catalog cannot serve, so a
//! list request never turns into a full collection scan.
//!
//! Filter rule: a field passes when it has a single-field index, or when
//! some compound entry ends with that field and every field of that entry is
//! also requested. Sort rule: the requested order must equal some catalog
//! entry read ascending, or that entry fully reversed.

use tracing::warn;

use super::catalog::IndexCatalog;
use super::errors::{QueryError, QueryResult};
use super::sort::SortSpec;

/// Check that every client filter field is index-covered.
///
/// Fails on the first uncovered field, in request order.
pub fn validate_filter_fields<S: AsRef<str>>(
    requested: &[S],
    catalog: &IndexCatalog,
) -> QueryResult<()> {
    let requested: Vec<&str> = requested.iter().map(AsRef::as_ref).collect();

    for field in &requested {
        if !is_covered(field, &requested, catalog) {
            warn!(field = *field, "filter field not covered by an index");
            return Err(QueryError::filter_not_indexed(*field));
        }
    }
    Ok(())
}

fn is_covered(field: &str, requested: &[&str], catalog: &IndexCatalog) -> bool {
    if catalog.simple().any(|index| index.fields()[0] == field) {
        return true;
    }
    catalog
        .compound()
        .filter(|index| index.last_field() == Some(field))
        .any(|index| {
            index
                .fields()
                .iter()
                .all(|f| requested.contains(&f.as_str()))
        })
}

/// Check a requested sort against the catalog and return it as a `SortSpec`
pub fn validate_sort<'a>(
    tokens: impl IntoIterator<Item = &'a str>,
    catalog: &IndexCatalog,
) -> QueryResult<SortSpec> {
    let requested = SortSpec::from_tokens(tokens);
    let reversed = requested.reversed();

    let servable = !requested.is_empty()
        && catalog.indexes().any(|index| {
            let forward = SortSpec::from_index(index);
            forward == requested || forward == reversed
        });

    if servable {
        Ok(requested)
    } else {
        warn!(sort = %requested, "sort not covered by an index");
        Err(QueryError::sort_not_indexed(requested.to_string()))
    }
}
