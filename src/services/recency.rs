//! Posting recency classification.
//!
//! A structured publication date wins when the source provides one; the
//! rendered text is only pattern-matched as a fallback. Anything that cannot
//! be classified is excluded, so ambiguous input undercounts.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::models::{Recency, ResultItem};

static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d+)\s+days?\s+ago\b").expect("valid regex"));

static POSTED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(added|posted)\b").expect("valid regex"));

static SAME_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(today|yesterday)\b").expect("valid regex"));

/// Classify a result item against a window of `window_days`, as seen on `today`.
pub fn classify(item: &ResultItem, window_days: u32, today: NaiveDate) -> Recency {
    match item.posted_on {
        Some(posted_on) => classify_date(posted_on, window_days, today),
        None => classify_text(&item.text, window_days),
    }
}

/// Classify by publication date. Dates in the future are not trusted.
pub fn classify_date(posted_on: NaiveDate, window_days: u32, today: NaiveDate) -> Recency {
    let age = (today - posted_on).num_days();
    if age < 0 {
        Recency::Unclassified
    } else if age <= i64::from(window_days) {
        Recency::Within
    } else {
        Recency::Outside
    }
}

/// Classify by rendered text such as "Added 5 days ago" or "Posted Today".
pub fn classify_text(text: &str, window_days: u32) -> Recency {
    if let Some(caps) = DAYS_AGO.captures(text) {
        // A count too large for u32 is far outside any window.
        return match caps[1].parse::<u32>() {
            Ok(days) if days <= window_days => Recency::Within,
            _ => Recency::Outside,
        };
    }

    if POSTED_MARKER.is_match(text) && SAME_DAY.is_match(text) {
        return Recency::Within;
    }

    Recency::Unclassified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_days_ago_within_window() {
        assert_eq!(classify_text("5 days ago", 10), Recency::Within);
        assert_eq!(classify_text("Added 10 days ago", 10), Recency::Within);
        assert_eq!(classify_text("added 1 day ago", 10), Recency::Within);
    }

    #[test]
    fn test_days_ago_outside_window() {
        assert_eq!(classify_text("15 days ago", 10), Recency::Outside);
        assert_eq!(classify_text("Added 11 days ago", 10), Recency::Outside);
        assert_eq!(
            classify_text("Added 99999999999 days ago", 10),
            Recency::Outside
        );
    }

    #[test]
    fn test_today_and_yesterday_need_a_marker() {
        assert_eq!(classify_text("Posted Today", 10), Recency::Within);
        assert_eq!(classify_text("Added yesterday", 10), Recency::Within);
        assert_eq!(classify_text("Today", 10), Recency::Unclassified);
        assert_eq!(classify_text("Yesterday's specials", 10), Recency::Unclassified);
    }

    #[test]
    fn test_unrecognised_text_is_unclassified() {
        assert_eq!(classify_text("Posted last month", 10), Recency::Unclassified);
        assert_eq!(classify_text("Added 3 hours ago", 10), Recency::Unclassified);
        assert_eq!(classify_text("", 10), Recency::Unclassified);
        assert!(!classify_text("Posted last month", 10).is_within());
    }

    #[test]
    fn test_multiline_card_text() {
        let card = "Chef de partie\nCairns QLD 4870\nFull time\nAdded 2 days ago";
        assert_eq!(classify_text(card, 10), Recency::Within);
    }

    #[test]
    fn test_structured_date_preferred_over_text() {
        let today = date("2025-08-20");
        let item = ResultItem {
            id: None,
            text: "Added 2 days ago".into(),
            posted_on: Some(date("2025-07-01")),
        };
        assert_eq!(classify(&item, 10, today), Recency::Outside);

        let item = ResultItem {
            posted_on: None,
            ..item
        };
        assert_eq!(classify(&item, 10, today), Recency::Within);
    }

    #[test]
    fn test_structured_date_boundaries() {
        let today = date("2025-08-20");
        assert_eq!(classify_date(date("2025-08-20"), 10, today), Recency::Within);
        assert_eq!(classify_date(date("2025-08-10"), 10, today), Recency::Within);
        assert_eq!(classify_date(date("2025-08-09"), 10, today), Recency::Outside);
        assert_eq!(
            classify_date(date("2025-08-21"), 10, today),
            Recency::Unclassified
        );
    }
}
