//! Store domain types and the running rating aggregate.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::validation::normalize_email;

/// A business that users can rate.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: Uuid,
    /// Mean of all ratings, 0 while the store has none.
    pub average_rating: f64,
    pub total_ratings: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Create an unrated store. Name and address are trimmed, email is normalized.
    pub fn new(name: &str, email: &str, address: &str, owner_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            address: address.trim().to_string(),
            owner_id,
            average_rating: 0.0,
            total_ratings: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate {
            average: self.average_rating,
            count: self.total_ratings,
        }
    }
}

/// Denormalized rating summary kept on each store.
///
/// Updated incrementally: callers must apply exactly one step per rating
/// insert or change, inside the same transaction as the rating write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub count: i64,
}

impl RatingAggregate {
    pub const EMPTY: RatingAggregate = RatingAggregate {
        average: 0.0,
        count: 0,
    };

    /// Fold in a rating from a user who had not rated the store before.
    pub fn with_new_rating(self, score: u8) -> Self {
        let sum = self.average * self.count as f64 + f64::from(score);
        let count = self.count + 1;
        Self {
            average: clamp_average(sum / count as f64),
            count,
        }
    }

    /// Replace one existing rating `old` with `new`. The count is unchanged.
    pub fn with_changed_rating(self, old: u8, new: u8) -> Self {
        if self.count == 0 {
            return self.with_new_rating(new);
        }
        let sum = self.average * self.count as f64 - f64::from(old) + f64::from(new);
        Self {
            average: clamp_average(sum / self.count as f64),
            count: self.count,
        }
    }
}

fn clamp_average(value: f64) -> f64 {
    value.clamp(0.0, 5.0)
}

/// Owner details embedded in store responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreOwnerInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A store with its owner's contact details.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreWithOwner {
    #[serde(flatten)]
    pub store: Store,
    pub owner: Option<StoreOwnerInfo>,
}

/// Store listing entry. `user_rating` is only present for callers who can rate.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreListing {
    #[serde(flatten)]
    pub store: Store,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<Option<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_first_rating_sets_average() {
        let agg = RatingAggregate::EMPTY.with_new_rating(4);
        assert_eq!(agg.count, 1);
        assert!(approx(agg.average, 4.0));
    }

    #[test]
    fn test_running_average_matches_mean() {
        let scores = [5, 3, 4, 1, 2, 5];
        let agg = scores
            .iter()
            .fold(RatingAggregate::EMPTY, |agg, &s| agg.with_new_rating(s));

        let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
        assert_eq!(agg.count, 6);
        assert!(approx(agg.average, mean));
    }

    #[test]
    fn test_changed_rating_keeps_count() {
        let agg = RatingAggregate::EMPTY
            .with_new_rating(2)
            .with_new_rating(4)
            .with_changed_rating(2, 5);
        assert_eq!(agg.count, 2);
        assert!(approx(agg.average, 4.5));
    }

    #[test]
    fn test_change_on_empty_counts_as_new() {
        let agg = RatingAggregate::EMPTY.with_changed_rating(3, 1);
        assert_eq!(agg, RatingAggregate::EMPTY.with_new_rating(1));
    }

    #[test]
    fn test_new_store_is_unrated() {
        let store = Store::new(" Corner Grocery And Deli Shop ", "SHOP@x.io", "A", Uuid::new_v4());
        assert_eq!(store.aggregate(), RatingAggregate::EMPTY);
        assert_eq!(store.email, "shop@x.io");
        assert_eq!(store.name, "Corner Grocery And Deli Shop");
    }

    #[test]
    fn test_listing_hides_user_rating_when_not_applicable() {
        let store = Store::new("Corner Grocery And Deli Shop", "s@x.io", "A", Uuid::new_v4());

        let hidden = StoreListing {
            store: store.clone(),
            user_rating: None,
        };
        let json = serde_json::to_value(&hidden).unwrap();
        assert!(json.get("userRating").is_none());
        assert_eq!(json["totalRatings"], 0);

        let unrated = StoreListing {
            store,
            user_rating: Some(None),
        };
        let json = serde_json::to_value(&unrated).unwrap();
        assert!(json["userRating"].is_null());
    }
}
