//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::validation::normalize_email;

/// Role of an account. Decides which routes the account may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Manages users and stores.
    Admin,
    /// Browses and rates stores.
    User,
    /// Owns exactly one store and reads its ratings.
    StoreOwner,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_rate(&self) -> bool {
        matches!(self, Role::User)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::User => write!(f, "user"),
            Role::StoreOwner => write!(f, "storeOwner"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            "storeOwner" => Ok(Role::StoreOwner),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// An account.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub address: String,
    pub role: Role,
    /// Store owned by this account; only set for store owners.
    pub store_id: Option<Uuid>,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user. Name and address are trimmed, email is normalized.
    pub fn new(name: &str, email: &str, address: &str, role: Role, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            address: address.trim().to_string(),
            role,
            store_id: None,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Short view of the store a user owns, embedded in user listings.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnedStoreSummary {
    pub id: Uuid,
    pub name: String,
    pub average_rating: f64,
}

/// A user together with the store they own, if any.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserWithStore {
    #[serde(flatten)]
    pub user: User,
    pub store: Option<OwnedStoreSummary>,
}
