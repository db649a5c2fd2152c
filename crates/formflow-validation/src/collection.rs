//! Collection validation functions

use std::collections::BTreeSet;

/// Enum/value restriction
pub fn is_one_of(value: &str, allowed: &[&str]) -> bool {
    allowed.contains(&value)
}

/// First value that is not in the allowed set, if any
pub fn first_not_in<'a>(values: &'a [String], allowed: &[&str]) -> Option<&'a str> {
    values
        .iter()
        .map(String::as_str)
        .find(|value| !is_one_of(value, allowed))
}

/// Drops repeated entries, keeping first occurrences in order
pub fn dedup_preserving_order(items: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}
