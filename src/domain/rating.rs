//! Rating domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MIN_SCORE: i64 = 1;
pub const MAX_SCORE: i64 = 5;

/// Check a submitted score and narrow it to its stored width.
pub fn parse_score(value: i64) -> Option<u8> {
    if (MIN_SCORE..=MAX_SCORE).contains(&value) {
        u8::try_from(value).ok()
    } else {
        None
    }
}

/// One user's score for one store. At most one exists per (store, user).
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub store_id: Uuid,
    pub user_id: Uuid,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    pub fn new(store_id: Uuid, user_id: Uuid, rating: u8) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            store_id,
            user_id,
            rating,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Whether a submission created a rating or replaced the caller's previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingOutcome {
    Created,
    Updated { previous: u8 },
}

/// Who left a rating, as shown to the store's owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RaterInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
}

/// A rating with its author's details.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingWithRater {
    #[serde(flatten)]
    pub rating: Rating,
    pub user: Option<RaterInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        assert_eq!(parse_score(0), None);
        assert_eq!(parse_score(1), Some(1));
        assert_eq!(parse_score(5), Some(5));
        assert_eq!(parse_score(6), None);
        assert_eq!(parse_score(-3), None);
    }

    #[test]
    fn test_rating_serializes_camel_case() {
        let rating = Rating::new(Uuid::new_v4(), Uuid::new_v4(), 3);
        let json = serde_json::to_value(&rating).unwrap();
        assert_eq!(json["rating"], 3);
        assert!(json.get("storeId").is_some());
        assert!(json.get("userId").is_some());
    }
}
