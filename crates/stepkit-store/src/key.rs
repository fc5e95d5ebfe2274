//! Ordinal-aware store keys ("2nd User", "21st Order")

use once_cell::sync::Lazy;
use regex::Regex;

static ORDINAL_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)(?:st|nd|rd|th) (.+)$").expect("valid ordinal regex"));

/// A key split into its base name and optional 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKey<'a> {
    pub name: &'a str,
    pub nth: Option<usize>,
}

/// Splits an ordinal prefix off `key` unless an explicit `nth` was given.
///
/// Keys that start with a bare number ("1 University") are left alone.
pub fn parse_key(key: &str, nth: Option<usize>) -> StoreKey<'_> {
    if nth.is_some() {
        return StoreKey { name: key, nth };
    }

    let Some(caps) = ORDINAL_KEY.captures(key) else {
        return StoreKey { name: key, nth: None };
    };

    match (caps[1].parse::<usize>(), caps.get(2)) {
        (Ok(position), Some(rest)) => StoreKey {
            name: rest.as_str(),
            nth: Some(position),
        },
        _ => StoreKey { name: key, nth: None },
    }
}
