//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use admin::application::manage_admins::ManageAdminsUseCase;
use admin::domain::repository::{OtpSessionRepository, RefreshTokenRepository};
use admin::{AdminAppState, AdminAuthConfig, Mailer, PgAdminRepository, TokenService, admin_router};
use anyhow::Context;
use axum::{
    Router, http,
    http::{Method, header},
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,admin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Signing key first: nothing else is worth starting without it
    let mut config = if env::var("APP_ENV").is_ok_and(|v| v == "production") {
        AdminAuthConfig::default()
    } else {
        AdminAuthConfig::development()
    };
    config.password_pepper = env::var("PASSWORD_PEPPER")
        .ok()
        .filter(|p| !p.is_empty())
        .map(String::into_bytes);

    let tokens = TokenService::from_env(config.access_token_ttl)
        .context("JWT_SECRET_KEY must be set")?;

    // Database connection
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = PgAdminRepository::new(pool.clone());

    // Startup cleanup: remove expired OTP sessions and refresh tokens
    // Errors here should not prevent server startup
    match repo.cleanup_expired_sessions().await {
        Ok(sessions) => {
            tracing::info!(sessions_deleted = sessions, "OTP session cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "OTP session cleanup failed, continuing anyway");
        }
    }

    match repo.cleanup_expired_refresh_tokens().await {
        Ok(tokens) => {
            tracing::info!(tokens_deleted = tokens, "Refresh token cleanup completed");
        }
        Err(e) => {
            tracing::warn!(error = %e, "Refresh token cleanup failed, continuing anyway");
        }
    }

    let config = Arc::new(config);

    // Optional super admin seeding
    if let (Ok(email), Ok(password)) = (
        env::var("SEED_SUPER_ADMIN_EMAIL"),
        env::var("SEED_SUPER_ADMIN_PASSWORD"),
    ) {
        let seeder = ManageAdminsUseCase::new(Arc::new(repo.clone()), config.clone());
        match seeder.seed_super_admin(&email, &password).await {
            Ok(true) => tracing::info!("Super admin seeded"),
            Ok(false) => tracing::info!("Super admin already exists, seeding skipped"),
            Err(e) => tracing::warn!(error = %e, "Super admin seeding failed, continuing anyway"),
        }
    }

    let mailer = Mailer::from_env()?;

    let state = AdminAppState {
        repo: Arc::new(repo),
        notifier: Arc::new(mailer),
        tokens: Arc::new(tokens),
        config,
    };

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api/admins", admin_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
