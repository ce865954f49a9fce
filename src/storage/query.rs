//! Listing filters and sort keys accepted by the user and store listings.

use std::str::FromStr;

use crate::domain::Role;

/// Sort direction. Ascending unless `desc` is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order: {}", s)),
        }
    }
}

/// Columns a user listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Name,
    Email,
    Address,
    Role,
    CreatedAt,
}

impl UserSortField {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::Name => "u.name COLLATE NOCASE",
            UserSortField::Email => "u.email",
            UserSortField::Address => "u.address COLLATE NOCASE",
            UserSortField::Role => "u.role",
            UserSortField::CreatedAt => "u.created_at",
        }
    }
}

impl FromStr for UserSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(UserSortField::Name),
            "email" => Ok(UserSortField::Email),
            "address" => Ok(UserSortField::Address),
            "role" => Ok(UserSortField::Role),
            "createdAt" => Ok(UserSortField::CreatedAt),
            _ => Err(format!("Cannot sort users by: {}", s)),
        }
    }
}

/// Columns a store listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSortField {
    Name,
    Email,
    Address,
    AverageRating,
    TotalRatings,
    CreatedAt,
}

impl StoreSortField {
    pub fn column(&self) -> &'static str {
        match self {
            StoreSortField::Name => "s.name COLLATE NOCASE",
            StoreSortField::Email => "s.email",
            StoreSortField::Address => "s.address COLLATE NOCASE",
            StoreSortField::AverageRating => "s.average_rating",
            StoreSortField::TotalRatings => "s.total_ratings",
            StoreSortField::CreatedAt => "s.created_at",
        }
    }
}

impl FromStr for StoreSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(StoreSortField::Name),
            "email" => Ok(StoreSortField::Email),
            "address" => Ok(StoreSortField::Address),
            "averageRating" => Ok(StoreSortField::AverageRating),
            "totalRatings" => Ok(StoreSortField::TotalRatings),
            "createdAt" => Ok(StoreSortField::CreatedAt),
            _ => Err(format!("Cannot sort stores by: {}", s)),
        }
    }
}

/// Admin user listing filter. Text fields match case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub role: Option<Role>,
    pub sort: Option<(UserSortField, SortOrder)>,
}

/// Store listing filter. `search` matches name or address and, when set,
/// replaces the separate name and address filters.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub search: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub sort: Option<(StoreSortField, SortOrder)>,
}

/// `%term%` with LIKE wildcards in the term escaped by `\`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Treat empty query parameters as absent.
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
