//! API request and response types.
//!
//! Request bodies default missing fields to empty and read any JSON scalar
//! as text, so absent, mistyped and invalid values all surface as the same
//! field validation errors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{parse_score, Rating, RatingWithRater, User};

/// Numbers and booleans read as their text; `null`, arrays and objects as empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

fn lenient_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_string(deserializer)?;
    Ok((!value.is_empty()).then_some(value))
}

// ==================== Authentication ====================

/// Self-service registration. Always creates a `user` account.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
}

/// Login request.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
}

/// Token plus the account it belongs to.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT bearer token.
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePasswordRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub current_password: String,
    #[serde(deserialize_with = "lenient_string")]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentUserResponse {
    pub user: User,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ==================== Users ====================

/// Query parameters for the admin user listing.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Exact role: admin, user or storeOwner.
    pub role: Option<String>,
    /// name, email, address, role or createdAt.
    pub sort_by: Option<String>,
    /// asc (default) or desc.
    pub sort_order: Option<String>,
}

/// Admin-created account. Store owners also need the store fields.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub password: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub role: String,
    #[serde(deserialize_with = "lenient_optional_string")]
    pub store_name: Option<String>,
    #[serde(deserialize_with = "lenient_optional_string")]
    pub store_email: Option<String>,
    #[serde(deserialize_with = "lenient_optional_string")]
    pub store_address: Option<String>,
}

// ==================== Stores ====================

/// Query parameters for the store listing.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListStoresQuery {
    /// Matches name or address; overrides the name and address filters.
    pub search: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// name, email, address, averageRating, totalRatings or createdAt.
    pub sort_by: Option<String>,
    /// asc (default) or desc.
    pub sort_order: Option<String>,
}

/// A store together with the account that will own it.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateStoreRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub address: String,
    #[serde(deserialize_with = "lenient_string")]
    pub owner_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub owner_email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub owner_password: String,
    #[serde(deserialize_with = "lenient_string")]
    pub owner_address: String,
}

/// Aggregate and individual ratings of one store.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreRatingsResponse {
    pub average_rating: f64,
    pub total_ratings: i64,
    pub ratings: Vec<RatingWithRater>,
}

// ==================== Ratings ====================

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitRatingRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub store_id: String,
    /// Integer from 1 to 5, as a number or numeric string.
    #[schema(value_type = Option<i64>)]
    pub rating: Option<Value>,
}

impl SubmitRatingRequest {
    /// The submitted score, if it is a whole number from 1 to 5.
    pub fn score(&self) -> Option<u8> {
        let value = match self.rating.as_ref()? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }?;
        parse_score(value)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitRatingResponse {
    pub message: String,
    pub rating: Rating,
}

/// The caller's rating of a store, null if they have not rated it.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserRatingResponse {
    pub rating: Option<Rating>,
}

// ==================== Health ====================

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Database connectivity.
    pub database: String,
    /// Timestamp.
    pub timestamp: String,
}
