//! Account identifiers and extraction from free-form text.
//!
//! Identifiers show up embedded in usernames and profile URLs
//! (`user_100012345678901`, `https://x.com/100012345678901`). Extraction
//! scans every maximal run of ASCII digits on a line and picks one.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Number of digits in a canonical account identifier.
pub const ID_LEN: usize = 14;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[0-9]+").expect("digit-run pattern is valid"));

/// A canonical account identifier: exactly 14 ASCII digits.
///
/// The only ways to obtain one are [`extract`] and [`str::parse`], both of
/// which enforce the length and charset invariant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NormalizedId(String);

impl NormalizedId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_digits_unchecked(digits: &str) -> Self {
        debug_assert!(is_canonical(digits));
        NormalizedId(digits.to_string())
    }
}

fn is_canonical(s: &str) -> bool {
    s.len() == ID_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

impl std::fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NormalizedId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_canonical(s) {
            Ok(NormalizedId(s.to_string()))
        } else {
            Err(format!(
                "Invalid account id '{}': expected exactly {} ASCII digits",
                s, ID_LEN
            ))
        }
    }
}

impl TryFrom<String> for NormalizedId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NormalizedId> for String {
    fn from(id: NormalizedId) -> Self {
        id.0
    }
}

/// Extract the account identifier from one line of text.
///
/// A digit run of exactly [`ID_LEN`] wins (first one by position). Failing
/// that, the longest run is truncated to its first [`ID_LEN`] digits when it
/// is long enough. Ties between equally long runs go to the earliest one.
/// Returns `None` when no run reaches [`ID_LEN`] digits.
pub fn extract(line: &str) -> Option<NormalizedId> {
    let mut longest: Option<&str> = None;

    for run in DIGIT_RUN.find_iter(line).map(|m| m.as_str()) {
        if run.len() == ID_LEN {
            return Some(NormalizedId::from_digits_unchecked(run));
        }
        if longest.is_none_or(|best| run.len() > best.len()) {
            longest = Some(run);
        }
    }

    // Digit runs are ASCII, so byte slicing lands on a char boundary.
    longest
        .filter(|run| run.len() >= ID_LEN)
        .map(|run| NormalizedId::from_digits_unchecked(&run[..ID_LEN]))
}
