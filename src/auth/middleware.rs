//! Authentication middleware for axum.

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::domain::User;
use crate::error::AppError;
use crate::AppState;

/// The account behind the request's bearer token, loaded fresh from storage.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract and validate JWT token from request, then load its user.
///
/// Expects `Authorization: Bearer <token>` header. The user's role is taken
/// from storage, not from the token.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing authorization token".to_string()))?;

    let claims = state.jwt_manager.validate_token(token)?;

    let user = state
        .repository
        .find_user(claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id = %claims.sub, "Token for unknown user");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;

    // Add the user to request extensions for handlers to access
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Middleware that requires the admin role. Must run after [`require_auth`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    let CurrentUser(user) = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, role = %user.role, "Admin route refused");
        return Err(AppError::Forbidden("Access denied. Admin only.".to_string()));
    }

    Ok(next.run(request).await)
}
