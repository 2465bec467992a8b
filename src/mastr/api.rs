/// The registry operations the commands depend on.
use serde_json::{Map, Value};

use super::errors::MastrError;
use super::roles::Role;

/// A registry record: field names mapped to the values the service returned.
pub type Record = Map<String, Value>;

/// One page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery<'a> {
    /// Zero-based offset of the first record (`startAb`).
    pub start: u64,
    /// Page size (`limit`).
    pub limit: u32,
    /// Delta-query lower bound (`datumAb`), sent verbatim when present.
    pub datum_ab: Option<&'a str>,
}

/// Registry operations used by the commands.
///
/// Implemented over SOAP by [`super::MastrClient`]; tests substitute an
/// in-memory registry.
pub trait RegistryApi {
    /// One page of electricity-market participants holding `role`.
    ///
    /// # Errors
    ///
    /// Returns `MastrError` when the remote call fails.
    fn marktakteure_page(&self, query: &PageQuery<'_>, role: Role) -> Result<Vec<Record>, MastrError>;

    /// One page of the list of all units.
    ///
    /// # Errors
    ///
    /// Returns `MastrError` when the remote call fails.
    fn einheiten_page(&self, query: &PageQuery<'_>) -> Result<Vec<Record>, MastrError>;

    /// Details of one market participant, or `None` when the registry does
    /// not know the number.
    ///
    /// # Errors
    ///
    /// Returns `MastrError` when the remote call fails for any other reason.
    fn marktakteur(&self, mastr_nummer: &str) -> Result<Option<Record>, MastrError>;

    /// Details of one electricity storage unit.
    ///
    /// # Errors
    ///
    /// Returns `MastrError` when the remote call fails.
    fn einheit_stromspeicher(&self, einheit_mastr_nummer: &str) -> Result<Record, MastrError>;
}

/// Take the list held in `field` out of a response.
///
/// The field may hold an array of records, a single record, or a wrapper
/// object whose only member is that array or record. A missing field is an
/// empty page.
#[must_use]
pub fn extract_items(mut response: Record, field: &str) -> Vec<Record> {
    response.remove(field).map(into_records).unwrap_or_default()
}

fn into_records(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        Value::Object(map) if is_wrapper(&map) => map
            .into_iter()
            .next()
            .map(|(_, inner)| into_records(inner))
            .unwrap_or_default(),
        Value::Object(map) => vec![map],
        _ => Vec::new(),
    }
}

fn is_wrapper(map: &Record) -> bool {
    map.len() == 1 && map.values().all(|v| v.is_array() || v.is_object())
}

/// Look up a value by path through nested objects.
#[must_use]
pub fn get_path<'a>(record: &'a Record, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = record.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

/// Render a scalar value as plain text (strings without quotes).
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
