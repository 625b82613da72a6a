//! Aggregation over stored feedback.

use masa_types::{FeedbackRecord, FeedbackSummary, RecentFeedback};

const RECENT_LIMIT: usize = 5;
const COMMENT_PREVIEW_CHARS: usize = 100;

/// Summarize feedback given in chronological order.
///
/// Ratings of 2 or less count as low. The average is rounded to two
/// decimals and the low-rating share to one.
pub fn summarize(records: &[FeedbackRecord]) -> FeedbackSummary {
    if records.is_empty() {
        return FeedbackSummary::default();
    }

    let total = records.len();
    let sum: u32 = records.iter().map(|r| u32::from(r.rating.value())).sum();
    let low = records.iter().filter(|r| r.rating.is_low()).count();

    let recent_feedback = records
        .iter()
        .rev()
        .take(RECENT_LIMIT)
        .map(|r| RecentFeedback {
            created_at: r.created_at,
            rating: r.rating,
            comment: preview(&r.comment),
        })
        .collect();

    FeedbackSummary {
        total_feedback: total,
        average_rating: round_to(f64::from(sum) / total as f64, 2),
        low_ratings: low,
        low_ratings_percentage: round_to(low as f64 / total as f64 * 100.0, 1),
        recent_feedback,
    }
}

fn preview(comment: &str) -> String {
    if comment.chars().count() > COMMENT_PREVIEW_CHARS {
        let cut: String = comment.chars().take(COMMENT_PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        comment.to_string()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use masa_types::{Exchange, Rating};

    fn record(rating: i64, comment: &str) -> FeedbackRecord {
        let exchange = Exchange::new("user_1", "q", "r", vec![]);
        FeedbackRecord::for_exchange(&exchange, "claude", Rating::new(rating).unwrap(), comment)
    }

    #[test]
    fn test_empty_summary() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_feedback, 0);
        assert_eq!(summary.average_rating, 0.0);
        assert!(summary.recent_feedback.is_empty());
    }

    #[test]
    fn test_summary_rounding() {
        let records = vec![record(5, "a"), record(4, "b"), record(2, "c")];
        let summary = summarize(&records);
        assert_eq!(summary.total_feedback, 3);
        assert_eq!(summary.average_rating, 3.67);
        assert_eq!(summary.low_ratings, 1);
        assert_eq!(summary.low_ratings_percentage, 33.3);
    }

    #[test]
    fn test_recent_is_last_five_newest_first() {
        let records: Vec<_> = (1..=7).map(|i| record(3, &format!("c{}", i))).collect();
        let summary = summarize(&records);
        let comments: Vec<_> = summary.recent_feedback.iter().map(|r| r.comment.as_str()).collect();
        assert_eq!(comments, vec!["c7", "c6", "c5", "c4", "c3"]);
    }

    #[test]
    fn test_long_comments_are_cut() {
        let long = "ñ".repeat(120);
        let summary = summarize(&[record(1, &long)]);
        let comment = &summary.recent_feedback[0].comment;
        assert!(comment.ends_with("..."));
        assert_eq!(comment.chars().count(), 103);
    }
}
