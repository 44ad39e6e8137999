//! Turning pasted text into the id set for one run.

use crate::domain::{UniqueIdSet, dedupe, extract};
use crate::error::{CheckerError, Result};

/// Outcome of parsing one block of input text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedInput {
    /// Unique ids in first-seen order.
    pub ids: UniqueIdSet,
    /// Non-blank lines that were considered.
    pub accepted_lines: usize,
    /// Non-blank lines dropped because of the per-run cap.
    pub truncated_lines: usize,
}

impl ParsedInput {
    pub fn is_truncated(&self) -> bool {
        self.truncated_lines > 0
    }

    /// The id set, or [`CheckerError::NoValidIds`] if nothing usable was found.
    pub fn into_ids(self) -> Result<UniqueIdSet> {
        if self.ids.is_empty() {
            return Err(CheckerError::NoValidIds);
        }
        Ok(self.ids)
    }
}

/// Parse free-form text into unique ids.
///
/// Lines are trimmed and blank lines ignored. Only the first `max_lines`
/// non-blank lines are looked at; the remainder is counted in
/// [`ParsedInput::truncated_lines`].
pub fn parse_input(text: &str, max_lines: usize) -> ParsedInput {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());

    let accepted: Vec<&str> = lines.by_ref().take(max_lines).collect();
    let truncated_lines = lines.count();

    if truncated_lines > 0 {
        tracing::warn!(
            max_lines,
            truncated_lines,
            "Input exceeds the per-run line cap, extra lines ignored"
        );
    }

    let ids = dedupe(accepted.iter().map(|line| extract(line)));

    tracing::debug!(
        lines = accepted.len(),
        unique_ids = ids.len(),
        "Parsed input"
    );

    ParsedInput {
        ids,
        accepted_lines: accepted.len(),
        truncated_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_in_three_formats_collapses_to_one() {
        let text = "100012345678901\nuser_100012345678901\nhttps://x.com/100012345678901";
        let parsed = parse_input(text, 10_000);

        assert_eq!(parsed.accepted_lines, 3);
        assert_eq!(parsed.ids.len(), 1);
        assert_eq!(parsed.ids.as_slice()[0].as_str(), "10001234567890");
    }

    #[test]
    fn test_no_valid_ids_is_rejected() {
        let parsed = parse_input("12345\nabc\n", 10_000);
        assert!(parsed.ids.is_empty());
        assert!(matches!(parsed.into_ids(), Err(CheckerError::NoValidIds)));

        assert!(matches!(
            parse_input("   \n\n", 10_000).into_ids(),
            Err(CheckerError::NoValidIds)
        ));
    }

    #[test]
    fn test_blank_lines_do_not_count_toward_cap() {
        let text = "\n11111111111111\n\n   \n22222222222222\n33333333333333\n";
        let parsed = parse_input(text, 2);

        assert_eq!(parsed.accepted_lines, 2);
        assert_eq!(parsed.truncated_lines, 1);
        assert!(parsed.is_truncated());
        let ids: Vec<&str> = parsed.ids.iter().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["11111111111111", "22222222222222"]);
    }

    #[test]
    fn test_crlf_and_surrounding_whitespace() {
        let parsed = parse_input("  11111111111111  \r\n\t22222222222222\r\n", 10);
        assert_eq!(parsed.ids.len(), 2);
        assert!(!parsed.is_truncated());
    }
}
