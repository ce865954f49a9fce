//! Store Rating API
//!
//! Users rate stores from 1 to 5, store owners follow the ratings of their
//! store and admins manage accounts and stores.

use sqlx::sqlite::SqlitePoolOptions;
use tokio::net::TcpListener;

mod api;
mod auth;
mod config;
mod domain;
mod error;
mod logging;
mod storage;

use crate::api::{build_router, cors_layer};
use crate::auth::{hash_password_blocking, JwtManager};
use crate::config::{BootstrapAdmin, Config};
use crate::domain::validation::Validator;
use crate::domain::{Role, User};
use crate::error::AppResult;
use crate::storage::StoreRatingRepository;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database repository.
    pub repository: StoreRatingRepository,
    /// JWT manager for token operations.
    pub jwt_manager: JwtManager,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is expected in production
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: No .env file loaded ({e})");
    }

    logging::init();

    tracing::info!("Starting Store Rating API v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.url,
        cors_origins = ?config.cors.allowed_origins,
        "Configuration loaded"
    );

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to database");
            anyhow::anyhow!("Database connection error: {}", e)
        })?;

    let repository = StoreRatingRepository::new(pool);
    repository.init_schema().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize database schema");
        anyhow::anyhow!("Schema initialization error: {}", e)
    })?;

    tracing::info!("Database connected and schema initialized");

    if let Some(admin) = &config.bootstrap_admin {
        seed_admin(&repository, admin).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to seed admin account");
            anyhow::anyhow!("Admin seeding error: {}", e)
        })?;
    }

    let jwt_manager = JwtManager::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.token_duration_hours,
    );

    let state = AppState {
        repository,
        jwt_manager,
    };

    let app = build_router(state, cors_layer(&config.cors));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the configured admin account unless its email is already taken.
async fn seed_admin(repository: &StoreRatingRepository, admin: &BootstrapAdmin) -> AppResult<()> {
    if let Err(e) = Validator::new()
        .name("name", admin.name.trim(), "Name must be 20-60 characters")
        .email("email", admin.email.trim(), "Please provide a valid email")
        .password("password", &admin.password)
        .address("address", admin.address.trim(), "Address cannot exceed 400 characters")
        .finish()
    {
        tracing::warn!(error = %e, "Bootstrap admin is invalid, skipping");
        return Ok(());
    }

    if repository.find_user_by_email(&admin.email).await?.is_some() {
        tracing::info!(email = %admin.email, "Bootstrap admin already exists");
        return Ok(());
    }

    let password_hash = hash_password_blocking(admin.password.clone()).await?;
    let user = User::new(
        &admin.name,
        &admin.email,
        &admin.address,
        Role::Admin,
        password_hash,
    );
    repository.create_user(&user).await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
    Ok(())
}
