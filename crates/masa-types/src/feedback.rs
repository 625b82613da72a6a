use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rating must be an integer between 1 and 5, got {0}")]
pub struct RatingError(pub i64);

/// A 1..=5 star rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, RatingError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(RatingError(value))
        }
    }

    /// Rating attached automatically to internal failures.
    pub fn lowest() -> Self {
        Self(Self::MIN)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Ratings of 1 or 2 count as negative feedback.
    pub fn is_low(self) -> bool {
        self.0 <= 2
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Where a feedback record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackOrigin {
    /// Submitted by the user through the widget; always points at an exchange.
    User,
    /// Recorded by the pipeline when a turn failed.
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackRecord {
    pub id: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange_id: Option<String>,
    pub query: String,
    pub response: String,
    pub provider: String,
    pub rating: Rating,
    #[serde(default)]
    pub comment: String,
    pub origin: FeedbackOrigin,
    pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
    /// Feedback for a specific exchange of a session.
    pub fn for_exchange(
        exchange: &crate::Exchange,
        provider: impl Into<String>,
        rating: Rating,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: exchange.session_id.clone(),
            exchange_id: Some(exchange.id.clone()),
            query: exchange.query.clone(),
            response: exchange.response.clone(),
            provider: provider.into(),
            rating,
            comment: comment.into(),
            origin: FeedbackOrigin::User,
            created_at: Utc::now(),
        }
    }

    /// Lowest-rated record describing an internal failure.
    pub fn system_error(
        session_id: impl Into<String>,
        query: impl Into<String>,
        response: impl Into<String>,
        provider: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            exchange_id: None,
            query: query.into(),
            response: response.into(),
            provider: provider.into(),
            rating: Rating::lowest(),
            comment: comment.into(),
            origin: FeedbackOrigin::System,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RecentFeedback {
    pub created_at: DateTime<Utc>,
    pub rating: Rating,
    pub comment: String,
}

/// Aggregate view over all recorded feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeedbackSummary {
    pub total_feedback: usize,
    pub average_rating: f64,
    pub low_ratings: usize,
    pub low_ratings_percentage: f64,
    pub recent_feedback: Vec<RecentFeedback>,
}

impl Default for FeedbackSummary {
    fn default() -> Self {
        Self {
            total_feedback: 0,
            average_rating: 0.0,
            low_ratings: 0,
            low_ratings_percentage: 0.0,
            recent_feedback: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
        assert!(Rating::new(-3).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!(Rating::new(5).unwrap().value(), 5);
    }

    #[test]
    fn test_rating_serializes_as_integer() {
        let rating = Rating::new(4).unwrap();
        assert_eq!(serde_json::to_string(&rating).unwrap(), "4");

        let parsed: Rating = serde_json::from_str("3").unwrap();
        assert_eq!(parsed.value(), 3);
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }

    #[test]
    fn test_low_ratings() {
        assert!(Rating::new(2).unwrap().is_low());
        assert!(!Rating::new(3).unwrap().is_low());
    }

    #[test]
    fn test_feedback_for_exchange_references_it() {
        let exchange = crate::Exchange::new("user_9", "¿Envían a domicilio?", "Sí, en Monterrey.", vec![]);
        let record = FeedbackRecord::for_exchange(&exchange, "claude", Rating::new(5).unwrap(), "");

        assert_eq!(record.exchange_id.as_deref(), Some(exchange.id.as_str()));
        assert_eq!(record.session_id, "user_9");
        assert_eq!(record.origin, FeedbackOrigin::User);
    }

    #[test]
    fn test_system_error_feedback() {
        let record = FeedbackRecord::system_error("user_9", "hola", "fallo", "claude", "timeout");
        assert_eq!(record.rating, Rating::lowest());
        assert!(record.exchange_id.is_none());
        assert_eq!(record.origin, FeedbackOrigin::System);
    }
}
