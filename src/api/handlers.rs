//! HTTP request handlers.

use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;

use crate::api::extract::AppJson;
use crate::api::types::*;
use crate::auth::{hash_password_blocking, verify_password_blocking, CurrentUser};
use crate::domain::validation::Validator;
use crate::domain::{
    DashboardStats, RatingOutcome, Role, Store, StoreListing, StoreWithOwner, User,
    UserWithStore,
};
use crate::error::{AppError, AppResult};
use crate::storage::query::{SortOrder, StoreFilter, UserFilter};
use crate::AppState;

const NAME_MESSAGE: &str = "Name must be 20-60 characters";
const EMAIL_MESSAGE: &str = "Please provide a valid email";
const ADDRESS_MESSAGE: &str = "Address cannot exceed 400 characters";

/// Parse `sortBy`/`sortOrder`. No `sortBy` means storage order.
fn parse_sort<F>(
    sort_by: &Option<String>,
    sort_order: &Option<String>,
) -> AppResult<Option<(F, SortOrder)>>
where
    F: FromStr<Err = String>,
{
    let Some(field) = sort_by.as_deref().filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let field = field.parse::<F>().map_err(AppError::BadRequest)?;
    let order = match sort_order.as_deref().filter(|s| !s.is_empty()) {
        Some(order) => order.parse::<SortOrder>().map_err(AppError::BadRequest)?,
        None => SortOrder::default(),
    };

    Ok(Some((field, order)))
}

/// Service banner.
///
/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = MessageResponse)),
    tag = "health"
)]
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("Store Rating API is running"))
}

/// Health check endpoint.
///
/// GET /api/health
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1")
        .fetch_one(state.repository.pool())
        .await
    {
        Ok(_) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ==================== Authentication Endpoints ====================

/// Register a new `user` account.
///
/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed or email taken", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    Validator::new()
        .name("name", request.name.trim(), NAME_MESSAGE)
        .email("email", request.email.trim(), EMAIL_MESSAGE)
        .address("address", request.address.trim(), ADDRESS_MESSAGE)
        .password("password", &request.password)
        .finish()?;

    if state
        .repository
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password_blocking(request.password).await?;
    let user = User::new(
        &request.name,
        &request.email,
        &request.address,
        Role::User,
        password_hash,
    );
    state.repository.create_user(&user).await?;

    let token = state.jwt_manager.generate_token(user.id, user.role)?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// Login to obtain a JWT token.
///
/// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    Validator::new()
        .email("email", request.email.trim(), EMAIL_MESSAGE)
        .required("password", &request.password, "Password is required")
        .finish()?;

    let invalid = || AppError::BadRequest("Invalid credentials".to_string());

    let Some(user) = state.repository.find_user_by_email(&request.email).await? else {
        tracing::warn!(email = %request.email, "Login for unknown email");
        return Err(invalid());
    };

    if !verify_password_blocking(request.password, user.password_hash.clone()).await? {
        tracing::warn!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    let token = state.jwt_manager.generate_token(user.id, user.role)?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    Ok(Json(AuthResponse { token, user }))
}

/// Change the caller's password.
///
/// PUT /api/auth/update-password
#[utoipa::path(
    put,
    path = "/api/auth/update-password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Weak new password or wrong current password", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn update_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<UpdatePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    Validator::new()
        .required(
            "currentPassword",
            &request.current_password,
            "Current password is required",
        )
        .password("newPassword", &request.new_password)
        .finish()?;

    if !verify_password_blocking(request.current_password, user.password_hash.clone()).await? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(request.new_password).await?;
    state
        .repository
        .update_password(user.id, &password_hash)
        .await?;

    tracing::info!(user_id = %user.id, "Password updated");

    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// Get the account behind the bearer token.
///
/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user info", body = CurrentUserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<CurrentUserResponse> {
    Json(CurrentUserResponse { user })
}

// ==================== User Endpoints (admin) ====================

/// Counts for the admin dashboard.
///
/// GET /api/users/dashboard/stats
#[utoipa::path(
    get,
    path = "/api/users/dashboard/stats",
    responses(
        (status = 200, description = "Totals", body = DashboardStats),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn dashboard_stats(State(state): State<AppState>) -> AppResult<Json<DashboardStats>> {
    Ok(Json(state.repository.dashboard_stats().await?))
}

/// List users with optional filters and sorting.
///
/// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    params(
        ("name" = Option<String>, Query, description = "Name contains (case-insensitive)"),
        ("email" = Option<String>, Query, description = "Email contains (case-insensitive)"),
        ("address" = Option<String>, Query, description = "Address contains (case-insensitive)"),
        ("role" = Option<String>, Query, description = "Exact role: admin, user, storeOwner"),
        ("sortBy" = Option<String>, Query, description = "name, email, address, role, createdAt"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserWithStore>),
        (status = 400, description = "Unknown role or sort key"),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<UserWithStore>>> {
    let role = query
        .role
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Role>().map_err(AppError::BadRequest))
        .transpose()?;

    let filter = UserFilter {
        name: query.name,
        email: query.email,
        address: query.address,
        role,
        sort: parse_sort(&query.sort_by, &query.sort_order)?,
    };

    Ok(Json(state.repository.list_users(&filter).await?))
}

/// Get a user by ID.
///
/// GET /api/users/{id}
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserWithStore),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserWithStore>> {
    Ok(Json(state.repository.get_user_with_store(id).await?))
}

/// Create an account of any role. Store owners get their store created too.
///
/// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserWithStore),
        (status = 400, description = "Validation failed or email taken", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserWithStore>)> {
    let mut validator = Validator::new();
    validator
        .name("name", request.name.trim(), NAME_MESSAGE)
        .email("email", request.email.trim(), EMAIL_MESSAGE)
        .password("password", &request.password)
        .address("address", request.address.trim(), ADDRESS_MESSAGE);
    let role = request.role.parse::<Role>().ok();
    if role.is_none() {
        validator.custom("role", "Invalid role");
    }
    validator.finish()?;
    let role = role.ok_or_else(|| AppError::BadRequest("Invalid role".to_string()))?;

    if state
        .repository
        .find_user_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let store_fields = if role == Role::StoreOwner {
        let fields = (
            request.store_name.as_deref().map(str::trim).unwrap_or_default(),
            request.store_email.as_deref().map(str::trim).unwrap_or_default(),
            request.store_address.as_deref().map(str::trim).unwrap_or_default(),
        );
        if fields.0.is_empty() || fields.1.is_empty() || fields.2.is_empty() {
            return Err(AppError::BadRequest(
                "Store details are required for store owner".to_string(),
            ));
        }

        Validator::new()
            .name("storeName", fields.0, "Store name must be 20-60 characters")
            .email("storeEmail", fields.1, "Please provide a valid store email")
            .address(
                "storeAddress",
                fields.2,
                "Store address cannot exceed 400 characters",
            )
            .finish()?;

        if state
            .repository
            .find_store_by_email(fields.1)
            .await?
            .is_some()
        {
            return Err(AppError::BadRequest(
                "Store email already exists".to_string(),
            ));
        }
        Some(fields)
    } else {
        None
    };

    let password_hash = hash_password_blocking(request.password).await?;
    let mut user = User::new(
        &request.name,
        &request.email,
        &request.address,
        role,
        password_hash,
    );

    match store_fields {
        Some((name, email, address)) => {
            let store = Store::new(name, email, address, user.id);
            state
                .repository
                .create_store_with_owner(&mut user, &store)
                .await?;
        }
        None => state.repository.create_user(&user).await?,
    }

    tracing::info!(
        user_id = %user.id,
        role = %user.role,
        store_id = ?user.store_id,
        created_by = %admin.id,
        "User created by admin"
    );

    let created = state.repository.get_user_with_store(user.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ==================== Store Endpoints ====================

/// List stores. Plain users also see their own rating of each store.
///
/// GET /api/stores
#[utoipa::path(
    get,
    path = "/api/stores",
    params(
        ("search" = Option<String>, Query, description = "Name or address contains; overrides name/address"),
        ("name" = Option<String>, Query, description = "Name contains (case-insensitive)"),
        ("email" = Option<String>, Query, description = "Email contains (case-insensitive)"),
        ("address" = Option<String>, Query, description = "Address contains (case-insensitive)"),
        ("sortBy" = Option<String>, Query, description = "name, email, address, averageRating, totalRatings, createdAt"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "Matching stores", body = Vec<StoreListing>),
        (status = 400, description = "Unknown sort key"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub async fn list_stores(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ListStoresQuery>,
) -> AppResult<Json<Vec<StoreListing>>> {
    let filter = StoreFilter {
        search: query.search,
        name: query.name,
        email: query.email,
        address: query.address,
        sort: parse_sort(&query.sort_by, &query.sort_order)?,
    };
    let rater = user.role.can_rate().then_some(user.id);

    Ok(Json(state.repository.list_stores(&filter, rater).await?))
}

/// Get a store with its owner.
///
/// GET /api/stores/{id}
#[utoipa::path(
    get,
    path = "/api/stores/{id}",
    params(
        ("id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Store details", body = StoreWithOwner),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub async fn get_store(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StoreWithOwner>> {
    Ok(Json(state.repository.get_store_with_owner(id).await?))
}

/// Aggregate and individual ratings of a store.
///
/// Store owners may only read their own store.
///
/// GET /api/stores/{id}/ratings
#[utoipa::path(
    get,
    path = "/api/stores/{id}/ratings",
    params(
        ("id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "Store ratings", body = StoreRatingsResponse),
        (status = 403, description = "Store owner reading another store"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub async fn get_store_ratings(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StoreRatingsResponse>> {
    let store = state
        .repository
        .find_store(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

    if user.role == Role::StoreOwner && store.owner_id != user.id {
        tracing::warn!(user_id = %user.id, store_id = %store.id, "Owner read of foreign store");
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    let ratings = state.repository.list_store_ratings(store.id).await?;

    Ok(Json(StoreRatingsResponse {
        average_rating: store.average_rating,
        total_ratings: store.total_ratings,
        ratings,
    }))
}

/// Create a store and its owner account.
///
/// POST /api/stores
#[utoipa::path(
    post,
    path = "/api/stores",
    request_body = CreateStoreRequest,
    responses(
        (status = 201, description = "Store created", body = StoreWithOwner),
        (status = 400, description = "Validation failed or email taken", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = [])),
    tag = "stores"
)]
pub async fn create_store(
    State(state): State<AppState>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    AppJson(request): AppJson<CreateStoreRequest>,
) -> AppResult<(StatusCode, Json<StoreWithOwner>)> {
    Validator::new()
        .name("name", request.name.trim(), NAME_MESSAGE)
        .email("email", request.email.trim(), EMAIL_MESSAGE)
        .address("address", request.address.trim(), ADDRESS_MESSAGE)
        .name(
            "ownerName",
            request.owner_name.trim(),
            "Owner name must be 20-60 characters",
        )
        .email(
            "ownerEmail",
            request.owner_email.trim(),
            "Please provide a valid owner email",
        )
        .password("ownerPassword", &request.owner_password)
        .address(
            "ownerAddress",
            request.owner_address.trim(),
            "Owner address cannot exceed 400 characters",
        )
        .finish()?;

    if state
        .repository
        .find_store_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Store email already exists".to_string(),
        ));
    }

    if state
        .repository
        .find_user_by_email(&request.owner_email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Owner email already exists".to_string(),
        ));
    }

    let password_hash = hash_password_blocking(request.owner_password).await?;
    let mut owner = User::new(
        &request.owner_name,
        &request.owner_email,
        &request.owner_address,
        Role::StoreOwner,
        password_hash,
    );
    let store = Store::new(&request.name, &request.email, &request.address, owner.id);

    state
        .repository
        .create_store_with_owner(&mut owner, &store)
        .await?;

    tracing::info!(
        store_id = %store.id,
        owner_id = %owner.id,
        created_by = %admin.id,
        "Store created"
    );

    let created = state.repository.get_store_with_owner(store.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// ==================== Rating Endpoints ====================

/// Rate a store, or change the caller's existing rating of it.
///
/// POST /api/ratings
#[utoipa::path(
    post,
    path = "/api/ratings",
    request_body = SubmitRatingRequest,
    responses(
        (status = 201, description = "Rating submitted", body = SubmitRatingResponse),
        (status = 200, description = "Rating updated", body = SubmitRatingResponse),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse),
        (status = 403, description = "Caller is not a plain user"),
        (status = 404, description = "Store not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(request): AppJson<SubmitRatingRequest>,
) -> AppResult<(StatusCode, Json<SubmitRatingResponse>)> {
    let mut validator = Validator::new();
    validator.required("storeId", &request.store_id, "Store ID is required");
    let score = request.score();
    if score.is_none() {
        validator.custom("rating", "Rating must be between 1 and 5");
    }
    validator.finish()?;
    let score = score.ok_or_else(|| {
        AppError::BadRequest("Rating must be between 1 and 5".to_string())
    })?;

    if !user.role.can_rate() {
        return Err(AppError::Forbidden(
            "Only normal users can submit ratings".to_string(),
        ));
    }

    // An ID that cannot name a store names no store.
    let store_id = Uuid::parse_str(request.store_id.trim())
        .map_err(|_| AppError::NotFound("Store not found".to_string()))?;

    let submitted = state
        .repository
        .submit_rating(store_id, user.id, score)
        .await?;

    let (status, message, previous) = match submitted.outcome {
        RatingOutcome::Created => (StatusCode::CREATED, "Rating submitted successfully", None),
        RatingOutcome::Updated { previous } => {
            (StatusCode::OK, "Rating updated successfully", Some(previous))
        }
    };

    tracing::info!(
        store_id = %store_id,
        user_id = %user.id,
        rating = score,
        previous = ?previous,
        average_rating = submitted.aggregate.average,
        total_ratings = submitted.aggregate.count,
        "Rating recorded"
    );

    Ok((
        status,
        Json(SubmitRatingResponse {
            message: message.to_string(),
            rating: submitted.rating,
        }),
    ))
}

/// The caller's own rating of a store.
///
/// GET /api/ratings/store/{store_id}
#[utoipa::path(
    get,
    path = "/api/ratings/store/{store_id}",
    params(
        ("store_id" = Uuid, Path, description = "Store ID")
    ),
    responses(
        (status = 200, description = "The caller's rating or null", body = UserRatingResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn get_my_rating(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(store_id): Path<Uuid>,
) -> AppResult<Json<UserRatingResponse>> {
    let rating = state.repository.find_user_rating(store_id, user.id).await?;

    Ok(Json(UserRatingResponse { rating }))
}
