//! Database models.
//!
//! These are the row types returned by SQLx queries.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    OwnedStoreSummary, RaterInfo, Rating, RatingWithRater, Store, StoreListing, StoreOwnerInfo,
    StoreWithOwner, User, UserWithStore,
};
use crate::error::AppError;

/// Fixed-width RFC 3339 so stored timestamps sort as text.
pub fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Internal(e.to_string()))
}

fn parse_id(s: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(s).map_err(|e| AppError::Internal(e.to_string()))
}

/// Database row for users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub address: String,
    pub role: String,
    pub store_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: parse_id(&row.id)?,
            name: row.name,
            email: row.email,
            address: row.address,
            role: row.role.parse().map_err(AppError::Internal)?,
            store_id: row.store_id.as_deref().map(parse_id).transpose()?,
            password_hash: row.password_hash,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// User joined with the store they own.
#[derive(Debug, Clone, FromRow)]
pub struct UserWithStoreRow {
    #[sqlx(flatten)]
    pub user: UserRow,
    pub store_name: Option<String>,
    pub store_average_rating: Option<f64>,
}

impl TryFrom<UserWithStoreRow> for UserWithStore {
    type Error = AppError;

    fn try_from(row: UserWithStoreRow) -> Result<Self, Self::Error> {
        let user: User = row.user.try_into()?;
        let store = match (user.store_id, row.store_name) {
            (Some(id), Some(name)) => Some(OwnedStoreSummary {
                id,
                name,
                average_rating: row.store_average_rating.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(UserWithStore { user, store })
    }
}

/// Database row for stores table.
#[derive(Debug, Clone, FromRow)]
pub struct StoreRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: String,
    pub owner_id: String,
    pub average_rating: f64,
    pub total_ratings: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<StoreRow> for Store {
    type Error = AppError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        Ok(Store {
            id: parse_id(&row.id)?,
            name: row.name,
            email: row.email,
            address: row.address,
            owner_id: parse_id(&row.owner_id)?,
            average_rating: row.average_rating,
            total_ratings: row.total_ratings,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Store joined with the viewer's own rating, if any.
#[derive(Debug, Clone, FromRow)]
pub struct StoreListingRow {
    #[sqlx(flatten)]
    pub store: StoreRow,
    pub user_rating: Option<i64>,
}

impl StoreListingRow {
    /// `with_user_rating` is false for viewers who cannot rate.
    pub fn into_listing(self, with_user_rating: bool) -> Result<StoreListing, AppError> {
        let user_rating = if with_user_rating {
            Some(self.user_rating.map(score_from_column).transpose()?)
        } else {
            None
        };

        Ok(StoreListing {
            store: self.store.try_into()?,
            user_rating,
        })
    }
}

/// Store joined with its owner.
#[derive(Debug, Clone, FromRow)]
pub struct StoreWithOwnerRow {
    #[sqlx(flatten)]
    pub store: StoreRow,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

impl TryFrom<StoreWithOwnerRow> for StoreWithOwner {
    type Error = AppError;

    fn try_from(row: StoreWithOwnerRow) -> Result<Self, Self::Error> {
        let store: Store = row.store.try_into()?;
        let owner = match (row.owner_name, row.owner_email) {
            (Some(name), Some(email)) => Some(StoreOwnerInfo {
                id: store.owner_id,
                name,
                email,
            }),
            _ => None,
        };

        Ok(StoreWithOwner { store, owner })
    }
}

fn score_from_column(value: i64) -> Result<u8, AppError> {
    crate::domain::parse_score(value)
        .ok_or_else(|| AppError::Internal(format!("Stored rating out of range: {}", value)))
}

/// Database row for ratings table.
#[derive(Debug, Clone, FromRow)]
pub struct RatingRow {
    pub id: String,
    pub store_id: String,
    pub user_id: String,
    pub rating: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<RatingRow> for Rating {
    type Error = AppError;

    fn try_from(row: RatingRow) -> Result<Self, Self::Error> {
        Ok(Rating {
            id: parse_id(&row.id)?,
            store_id: parse_id(&row.store_id)?,
            user_id: parse_id(&row.user_id)?,
            rating: score_from_column(row.rating)?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Rating joined with its author.
#[derive(Debug, Clone, FromRow)]
pub struct RatingWithRaterRow {
    #[sqlx(flatten)]
    pub rating: RatingRow,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_address: Option<String>,
}

impl TryFrom<RatingWithRaterRow> for RatingWithRater {
    type Error = AppError;

    fn try_from(row: RatingWithRaterRow) -> Result<Self, Self::Error> {
        let rating: Rating = row.rating.try_into()?;
        let user = match (row.user_name, row.user_email, row.user_address) {
            (Some(name), Some(email), Some(address)) => Some(RaterInfo {
                id: rating.user_id,
                name,
                email,
                address,
            }),
            _ => None,
        };

        Ok(RatingWithRater { rating, user })
    }
}
