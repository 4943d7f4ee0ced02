//! Natural-language invoice field extraction.
//!
//! A deterministic, regex-based heuristic: the first sentence is the title,
//! the rest is the description, the first money pattern is the amount and the
//! first date token after a deadline cue is the deadline. Dates are captured
//! verbatim and never validated against a calendar.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ExtractedInvoice;

/// Inputs at or below this many characters are never split into title/description.
const MIN_SPLIT_CHARS: usize = 10;

/// Longest title kept as-is.
const MAX_TITLE_CHARS: usize = 50;

/// Characters kept from an over-long title before the ellipsis.
const TRUNCATED_TITLE_CHARS: usize = 47;

const ELLIPSIS: &str = "...";

/// `$N[.N]`, `N[.N] dollars` or `N USD`, tried in that order at each position.
static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$([0-9]+(?:\.[0-9]+)?)|([0-9]+(?:\.[0-9]+)?) dollars|([0-9]+) USD").unwrap()
});

/// A deadline cue followed by `Month Day`, `D/M/Y` or `D-M-Y`.
static DEADLINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:due by|deadline|by|due on|due) ([A-Za-z]+ [0-9]+|[0-9]+/[0-9]+/[0-9]+|[0-9]+-[0-9]+-[0-9]+)",
    )
    .unwrap()
});

/// Extract candidate invoice fields from free-form text.
///
/// Never fails: empty or unrecognizable input yields an incomplete result.
pub fn extract(text: &str) -> ExtractedInvoice {
    let (title, description) = split_title(text);
    let description = if description.is_empty() {
        title.clone()
    } else {
        description
    };

    ExtractedInvoice {
        title,
        description,
        amount: extract_amount(text),
        deadline: extract_deadline(text),
    }
}

/// First amount mentioned in `text`.
pub fn extract_amount(text: &str) -> Option<f64> {
    let captures = AMOUNT_PATTERN.captures(text)?;
    captures
        .iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Date token following the first deadline cue in `text`.
pub fn extract_deadline(text: &str) -> Option<String> {
    DEADLINE_PATTERN
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split on sentence punctuation: the first segment is the title, the rest
/// rejoined with ". " is the description.
fn split_title(text: &str) -> (String, String) {
    if text.chars().count() <= MIN_SPLIT_CHARS {
        return (String::new(), String::new());
    }

    let mut segments = text.split(['.', '!', '?']);
    let title = segments.next().unwrap_or_default().trim();
    let description = segments.collect::<Vec<_>>().join(". ").trim().to_string();

    (truncate_title(title), description)
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let kept: String = title.chars().take(TRUNCATED_TITLE_CHARS).collect();
    format!("{}{}", kept, ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_complete_sentence() {
        let result = extract("Logo design. $500 due by June 10");
        assert_eq!(result.title, "Logo design");
        assert_eq!(result.description, "$500 due by June 10");
        assert_eq!(result.amount, Some(500.0));
        assert_eq!(result.deadline.as_deref(), Some("June 10"));
        assert!(result.is_complete());
    }

    #[test]
    fn test_extract_empty() {
        let result = extract("");
        assert_eq!(result, ExtractedInvoice::default());
        assert_eq!(result.title, "");
        assert_eq!(result.description, "");
        assert!(result.amount.is_none());
        assert!(result.deadline.is_none());
        assert!(!result.is_complete());
    }

    #[test]
    fn test_extract_iso_deadline_single_sentence() {
        let result = extract("Website redesign for $2500, due 2025-06-01");
        assert_eq!(result.title, "Website redesign for $2500, due 2025-06-01");
        // No further sentences: description falls back to the title
        assert_eq!(result.description, result.title);
        assert_eq!(result.amount, Some(2500.0));
        assert_eq!(result.deadline.as_deref(), Some("2025-06-01"));
        assert!(result.is_complete());
    }

    #[test]
    fn test_title_truncation() {
        let sentence = "a".repeat(60);
        let result = extract(&format!("{}. $10 due by May 1", sentence));
        assert_eq!(result.title.chars().count(), 50);
        assert!(result.title.ends_with("..."));
        assert_eq!(&result.title[..47], &sentence[..47]);
    }

    #[test]
    fn test_title_exactly_fifty_kept() {
        let sentence = "b".repeat(50);
        let result = extract(&sentence);
        assert_eq!(result.title, sentence);
    }

    #[test]
    fn test_short_input_not_split() {
        // 10 characters or fewer never produce a title
        let result = extract("$5 due 1/2");
        assert_eq!(result.title, "");
        assert_eq!(result.description, "");
        assert_eq!(result.amount, Some(5.0));
        assert!(!result.is_complete());
    }

    #[test]
    fn test_amount_dollars_word() {
        assert_eq!(extract_amount("I charge 120.50 dollars for it"), Some(120.5));
        assert_eq!(extract_amount("I charge 75 DOLLARS"), Some(75.0));
    }

    #[test]
    fn test_amount_usd() {
        assert_eq!(extract_amount("Total is 300 USD"), Some(300.0));
        assert_eq!(extract_amount("Total is 300 usd"), Some(300.0));
    }

    #[test]
    fn test_amount_decimal_dollar_sign() {
        assert_eq!(extract_amount("Pay $99.95 now"), Some(99.95));
    }

    #[test]
    fn test_amount_leftmost_match_wins() {
        assert_eq!(extract_amount("40 USD or $50"), Some(40.0));
        assert_eq!(extract_amount("$50 or 40 USD"), Some(50.0));
    }

    #[test]
    fn test_amount_absent() {
        assert_eq!(extract_amount("no money mentioned here"), None);
        assert_eq!(extract_amount("costs 100 euros"), None);
    }

    #[test]
    fn test_deadline_forms() {
        assert_eq!(extract_deadline("deadline March 3").as_deref(), Some("March 3"));
        assert_eq!(extract_deadline("due on 12/31/2025").as_deref(), Some("12/31/2025"));
        assert_eq!(extract_deadline("DUE BY 1-2-2026").as_deref(), Some("1-2-2026"));
    }

    #[test]
    fn test_deadline_not_validated() {
        // Calendar validity is not checked
        assert_eq!(extract_deadline("due Smarch 45").as_deref(), Some("Smarch 45"));
        assert_eq!(extract_deadline("due 99/99/99").as_deref(), Some("99/99/99"));
    }

    #[test]
    fn test_deadline_requires_cue() {
        assert_eq!(extract_deadline("June 10 is fine"), None);
    }

    #[test]
    fn test_description_rejoins_sentences() {
        let result = extract("Mobile app! Two screens? Delivered by July 4. $900");
        assert_eq!(result.title, "Mobile app");
        assert_eq!(result.description, "Two screens.  Delivered by July 4.  $900");
        assert_eq!(result.deadline.as_deref(), Some("July 4"));
    }

    #[test]
    fn test_missing_amount_incomplete() {
        let result = extract("Copywriting for the blog, due by May 20");
        assert!(result.amount.is_none());
        assert!(!result.is_complete());
    }

    #[test]
    fn test_extract_is_deterministic() {
        let text = "Bookkeeping. 450 dollars due on 3/4/2026";
        assert_eq!(extract(text), extract(text));
    }
}
