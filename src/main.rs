//! Coastal Alert Backend
//!
//! REST backend for coastal threat alerts: SQLite persistence, email/SMS
//! fan-out to a recipient directory, and proxies to weather, tide-gauge and
//! prediction services.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod export;
mod models;
mod notify;
mod upstream;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use auth::TokenKeys;
use config::{Config, LogFormat};
use db::Repository;
use notify::{
    Dispatcher, EmailTransport, RecipientDirectory, SmsTransport, SmtpTransport, TwilioClient,
    Unconfigured,
};
use upstream::UpstreamClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub tokens: Arc<TokenKeys>,
    pub dispatcher: Arc<Dispatcher>,
    pub upstream: Arc<UpstreamClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let registry = tracing_subscriber::registry().with(env_filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting Coastal Alert Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Recipient directory
    let directory = match &config.recipients_path {
        Some(path) => {
            let directory = RecipientDirectory::load(path).await?;
            if directory.is_empty() {
                tracing::warn!("Recipient directory {:?} is empty", path);
            } else {
                tracing::info!("Loaded {} recipients from {:?}", directory.len(), path);
            }
            directory
        }
        None => {
            tracing::warn!("No recipient directory configured (COASTAL_RECIPIENTS_PATH). Alerts will not be delivered!");
            RecipientDirectory::default()
        }
    };

    // Transports
    let http = UpstreamClient::http_client(&config.upstream)?;

    let email: Arc<dyn EmailTransport> = match SmtpTransport::from_config(&config.smtp)? {
        Some(transport) => {
            tracing::info!("Email transport: SMTP via {}", config.smtp.host);
            Arc::new(transport)
        }
        None => {
            tracing::warn!("SMTP credentials missing (COASTAL_SMTP_USER/COASTAL_SMTP_PASS). Email is disabled!");
            Arc::new(Unconfigured)
        }
    };

    let sms: Arc<dyn SmsTransport> = match TwilioClient::from_config(&config.twilio, http.clone()) {
        Some(client) => {
            tracing::info!("SMS transport: Twilio");
            Arc::new(client)
        }
        None => {
            tracing::warn!("Twilio credentials missing (COASTAL_TWILIO_*). SMS is disabled!");
            Arc::new(Unconfigured)
        }
    };

    // Token signing
    let secret = match &config.jwt_secret {
        Some(secret) => secret.clone(),
        None => {
            tracing::warn!("No token secret configured (COASTAL_JWT_SECRET). Using a random secret; tokens will not survive a restart!");
            format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            )
        }
    };

    // Create application state
    let state = AppState {
        repo,
        tokens: Arc::new(TokenKeys::new(secret.as_bytes(), config.token_ttl)),
        dispatcher: Arc::new(Dispatcher::new(Arc::new(directory), email, sms)),
        upstream: Arc::new(UpstreamClient::new(http, config.upstream.clone())),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes requiring a bearer token
    let protected_routes = Router::new()
        .route("/users", get(api::list_users))
        .route("/users/logout", post(api::logout))
        .route("/alerts", get(api::list_alerts).post(api::create_alert))
        .route(
            "/alerts/{id}",
            get(api::get_alert)
                .put(api::update_alert)
                .delete(api::delete_alert),
        )
        .route("/reports", post(api::create_report))
        .route("/recipients", get(api::list_recipients))
        .route("/notifications/sms", post(api::send_sms))
        .route("/notifications/email", post(api::send_email))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::bearer_auth_layer,
        ));

    let public_routes = Router::new()
        .route("/users/register", post(api::register))
        .route("/users/login", post(api::login))
        .route("/predict", post(api::predict))
        .route("/cyclone", post(api::cyclone))
        .route("/sea-level", get(api::sea_level))
        .route("/weather", get(api::weather));

    // Report search/export and health (no auth required)
    let root_routes = Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/search", get(api::search_reports))
        .route("/export/csv", get(api::export_csv))
        .route("/export/pdf", get(api::export_pdf));

    Router::new()
        .nest("/api", protected_routes.merge(public_routes))
        .merge(root_routes)
        .fallback(api::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

async fn welcome() -> &'static str {
    "Welcome to the Coastal Alert API"
}
