//! Route definitions for the API.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers;
use crate::auth::{require_admin, require_auth};
use crate::config::CorsConfig;
use crate::AppState;

/// Security scheme modifier for OpenAPI.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health_check,
        handlers::register,
        handlers::login,
        handlers::update_password,
        handlers::get_current_user,
        handlers::dashboard_stats,
        handlers::list_users,
        handlers::get_user,
        handlers::create_user,
        handlers::list_stores,
        handlers::get_store,
        handlers::get_store_ratings,
        handlers::create_store,
        handlers::submit_rating,
        handlers::get_my_rating,
    ),
    components(schemas(
        crate::api::types::RegisterRequest,
        crate::api::types::LoginRequest,
        crate::api::types::AuthResponse,
        crate::api::types::UpdatePasswordRequest,
        crate::api::types::CurrentUserResponse,
        crate::api::types::MessageResponse,
        crate::api::types::ListUsersQuery,
        crate::api::types::CreateUserRequest,
        crate::api::types::ListStoresQuery,
        crate::api::types::CreateStoreRequest,
        crate::api::types::StoreRatingsResponse,
        crate::api::types::SubmitRatingRequest,
        crate::api::types::SubmitRatingResponse,
        crate::api::types::UserRatingResponse,
        crate::api::types::HealthResponse,
        crate::error::ErrorResponse,
        crate::error::FieldError,
        crate::domain::Role,
        crate::domain::User,
        crate::domain::UserWithStore,
        crate::domain::OwnedStoreSummary,
        crate::domain::Store,
        crate::domain::StoreWithOwner,
        crate::domain::StoreOwnerInfo,
        crate::domain::StoreListing,
        crate::domain::Rating,
        crate::domain::RatingWithRater,
        crate::domain::RaterInfo,
        crate::domain::DashboardStats,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login and the current account"),
        (name = "users", description = "Admin user management"),
        (name = "stores", description = "Store browsing and admin store management"),
        (name = "ratings", description = "Submitting and reading ratings"),
        (name = "health", description = "Health and status endpoints")
    ),
    info(
        title = "Store Rating API",
        version = "0.1.0",
        description = "Users rate stores, store owners follow their ratings, admins manage both",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// CORS for the browser frontend: listed origins only, with credentials.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the API router.
///
/// Every route except the banner, health, register and login requires a
/// bearer token; user management and store creation also require an admin.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let admin_only = || middleware::from_fn(require_admin);

    let admin_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/dashboard/stats",
            get(handlers::dashboard_stats),
        )
        .route("/api/users/:id", get(handlers::get_user))
        .route_layer(admin_only());

    let authenticated_routes = Router::new()
        .route("/api/auth/me", get(handlers::get_current_user))
        .route("/api/auth/update-password", put(handlers::update_password))
        .route(
            "/api/stores",
            get(handlers::list_stores)
                .merge(post(handlers::create_store).route_layer(admin_only())),
        )
        .route("/api/stores/:id", get(handlers::get_store))
        .route("/api/stores/:id/ratings", get(handlers::get_store_ratings))
        .route("/api/ratings", post(handlers::submit_rating))
        .route("/api/ratings/store/:store_id", get(handlers::get_my_rating))
        .merge(admin_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(handlers::health_check))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{hash_password, JwtManager};
    use crate::domain::{Role, User};
    use crate::storage::setup_test_db;

    const ADMIN_EMAIL: &str = "admin@example.com";
    const ADMIN_PASSWORD: &str = "Admin@123";

    async fn test_app() -> Router {
        crate::logging::init_test();

        let repository = setup_test_db().await;
        let admin = User::new(
            "Administrator Account For Testing",
            ADMIN_EMAIL,
            "1 Admin Street",
            Role::Admin,
            hash_password(ADMIN_PASSWORD).unwrap(),
        );
        repository.create_user(&admin).await.unwrap();

        let state = AppState {
            repository,
            jwt_manager: JwtManager::new("test-secret", "store-rating".to_string(), 1),
        };
        build_router(state, cors_layer(&CorsConfig::default()))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Regular Shopper With Long Name",
                "email": email,
                "password": "Shopper@1",
                "address": "9 Shopper Lane"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_store(app: &Router, admin: &str, store_email: &str, owner_email: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/stores",
            Some(admin),
            Some(json!({
                "name": "Corner Grocery And Deli Shop",
                "email": store_email,
                "address": "1 Market Square",
                "ownerName": "Owner Of Some Fine Establishment",
                "ownerEmail": owner_email,
                "ownerPassword": "Owner@123",
                "ownerAddress": "2 Market Square"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "store creation failed: {body}");
        body
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = test_app().await;
        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Store Rating API is running");
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = test_app().await;
        let token = register(&app, "Shopper@Example.com").await;

        let (status, body) = send(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["email"], "shopper@example.com");
        assert_eq!(body["user"]["role"], "user");
        assert!(body["user"].get("passwordHash").is_none());

        login(&app, "shopper@example.com", "Shopper@1").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "shopper@example.com", "password": "Wrong@123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_register_reports_every_invalid_field() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Too short", "email": "nope", "password": "weak" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["path"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"name"));
        assert!(fields.contains(&"email"));
        assert_eq!(fields.iter().filter(|f| **f == "password").count(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_registration_rejected() {
        let app = test_app().await;
        register(&app, "twice@example.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Regular Shopper With Long Name",
                "email": "TWICE@example.com",
                "password": "Shopper@1",
                "address": "9 Shopper Lane"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn test_missing_or_bad_token_is_unauthorized() {
        let app = test_app().await;

        let (status, _) = send(&app, Method::GET, "/api/stores", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::GET, "/api/stores", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_refuse_plain_users() {
        let app = test_app().await;
        let token = register(&app, "shopper@example.com").await;

        for uri in ["/api/users", "/api/users/dashboard/stats"] {
            let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
            assert_eq!(body["message"], "Access denied. Admin only.");
        }

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/stores",
            Some(&token),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // Listing stores is open to every authenticated role.
        let (status, _) = send(&app, Method::GET, "/api/stores", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rating_flow_updates_store_aggregate() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let store = create_store(&app, &admin, "deli@x.io", "owner@x.io").await;
        let store_id = store["id"].as_str().unwrap().to_string();
        assert_eq!(store["owner"]["email"], "owner@x.io");
        assert_eq!(store["averageRating"], 0.0);

        let alice = register(&app, "alice@x.io").await;
        let bob = register(&app, "bob@x.io").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&alice),
            Some(json!({ "storeId": store_id, "rating": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Rating submitted successfully");

        send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&bob),
            Some(json!({ "storeId": store_id, "rating": 1 })),
        )
        .await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&alice),
            Some(json!({ "storeId": store_id, "rating": 5 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Rating updated successfully");
        assert_eq!(body["rating"]["rating"], 5);

        let owner = login(&app, "owner@x.io", "Owner@123").await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/stores/{store_id}/ratings"),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRatings"], 2);
        assert_eq!(body["averageRating"], 3.0);
        assert_eq!(body["ratings"].as_array().unwrap().len(), 2);
        assert_eq!(body["ratings"][0]["user"]["email"], "alice@x.io");

        let (_, body) = send(&app, Method::GET, "/api/stores", Some(&alice), None).await;
        assert_eq!(body[0]["userRating"], 5);

        let (_, body) = send(&app, Method::GET, "/api/stores", Some(&owner), None).await;
        assert!(body[0].get("userRating").is_none());

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/ratings/store/{store_id}"),
            Some(&bob),
            None,
        )
        .await;
        assert_eq!(body["rating"]["rating"], 1);
    }

    #[tokio::test]
    async fn test_rating_rules() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let store = create_store(&app, &admin, "deli@x.io", "owner@x.io").await;
        let store_id = store["id"].as_str().unwrap();
        let shopper = register(&app, "shopper@x.io").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&shopper),
            Some(json!({ "storeId": store_id, "rating": 6 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["msg"], "Rating must be between 1 and 5");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&admin),
            Some(json!({ "storeId": store_id, "rating": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Only normal users can submit ratings");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&shopper),
            Some(json!({ "storeId": uuid::Uuid::new_v4(), "rating": 3 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(
            &app,
            Method::GET,
            &format!("/api/ratings/store/{store_id}"),
            Some(&shopper),
            None,
        )
        .await;
        assert!(body["rating"].is_null());
    }

    #[tokio::test]
    async fn test_mistyped_rating_fields_are_validated() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let store = create_store(&app, &admin, "deli@x.io", "owner@x.io").await;
        let store_id = store["id"].as_str().unwrap();
        let shopper = register(&app, "shopper@x.io").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&shopper),
            Some(json!({ "storeId": store_id, "rating": 4.5 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["path"], "rating");
        assert_eq!(body["errors"][0]["msg"], "Rating must be between 1 and 5");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&shopper),
            Some(json!({ "storeId": null, "rating": 4 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["path"], "storeId");
        assert_eq!(body["errors"][0]["msg"], "Store ID is required");

        // Numeric strings count as whole-number scores.
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ratings",
            Some(&shopper),
            Some(json!({ "storeId": store_id, "rating": "4" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["rating"]["rating"], 4);
    }

    #[tokio::test]
    async fn test_mistyped_and_malformed_register_bodies() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": 12345,
                "email": "numbers@x.io",
                "password": "Shopper@1",
                "address": "9 Shopper Lane"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["path"], "name");
        assert_eq!(body["errors"][0]["msg"], "Name must be 20-60 characters");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_error_bodies_carry_message_and_code() {
        let app = test_app().await;
        let shopper = register(&app, "shopper@x.io").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "shopper@x.io", "password": "Wrong@123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body.get("error").is_none());

        let (status, body) = send(&app, Method::GET, "/api/users", Some(&shopper), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied. Admin only.");
        assert_eq!(body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_owner_cannot_read_foreign_store_ratings() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        create_store(&app, &admin, "deli@x.io", "owner@x.io").await;
        let other = create_store(&app, &admin, "books@x.io", "bookseller@x.io").await;

        let owner = login(&app, "owner@x.io", "Owner@123").await;
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/stores/{}/ratings", other["id"].as_str().unwrap()),
            Some(&owner),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Access denied");

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/stores/{}/ratings", other["id"].as_str().unwrap()),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_store_creation_conflicts() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        create_store(&app, &admin, "deli@x.io", "owner@x.io").await;

        let body = json!({
            "name": "Another Grocery And Deli Shop",
            "email": "DELI@x.io",
            "address": "3 Market Square",
            "ownerName": "Second Owner With A Long Name",
            "ownerEmail": "second@x.io",
            "ownerPassword": "Owner@123",
            "ownerAddress": "4 Market Square"
        });
        let (status, resp) = send(&app, Method::POST, "/api/stores", Some(&admin), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Store email already exists");

        let body = json!({
            "name": "Another Grocery And Deli Shop",
            "email": "other@x.io",
            "address": "3 Market Square",
            "ownerName": "Second Owner With A Long Name",
            "ownerEmail": "owner@x.io",
            "ownerPassword": "Owner@123",
            "ownerAddress": "4 Market Square"
        });
        let (status, resp) = send(&app, Method::POST, "/api/stores", Some(&admin), Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["message"], "Owner email already exists");
    }

    #[tokio::test]
    async fn test_admin_user_management() {
        let app = test_app().await;
        let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Boutique Owner With Long Name",
                "email": "boutique@x.io",
                "password": "Owner@123",
                "address": "5 High Street",
                "role": "storeOwner"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Store details are required for store owner");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Boutique Owner With Long Name",
                "email": "boutique@x.io",
                "password": "Owner@123",
                "address": "5 High Street",
                "role": "storeOwner",
                "storeName": "High Street Fashion Boutique",
                "storeEmail": "shop@boutique.io",
                "storeAddress": "5 High Street"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["role"], "storeOwner");
        assert_eq!(body["store"]["name"], "High Street Fashion Boutique");
        let owner_id = body["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/users",
            Some(&admin),
            Some(json!({
                "name": "Second Administrator Account",
                "email": "admin2@x.io",
                "password": "Admin@456",
                "address": "6 High Street",
                "role": "superuser"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["path"], "role");

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users?role=storeOwner",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/users/{owner_id}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "boutique@x.io");

        let (status, _) = send(
            &app,
            Method::GET,
            "/api/users?sortBy=password",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::GET,
            "/api/users/dashboard/stats",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalUsers"], 2);
        assert_eq!(body["totalStores"], 1);
        assert_eq!(body["totalRatings"], 0);
    }

    #[tokio::test]
    async fn test_update_password() {
        let app = test_app().await;
        let token = register(&app, "shopper@x.io").await;

        let (status, body) = send(
            &app,
            Method::PUT,
            "/api/auth/update-password",
            Some(&token),
            Some(json!({ "currentPassword": "Wrong@123", "newPassword": "Changed@9" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");

        let (status, _) = send(
            &app,
            Method::PUT,
            "/api/auth/update-password",
            Some(&token),
            Some(json!({ "currentPassword": "Shopper@1", "newPassword": "Changed@9" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        login(&app, "shopper@x.io", "Changed@9").await;
    }
}
