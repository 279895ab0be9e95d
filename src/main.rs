use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use scout_api::config::AppConfig;
use scout_api::database::{self, Repository};
use scout_api::handlers::{conditions, locations, session, upload};
use scout_api::middleware::require_auth;
use scout_api::state::AppState;
use scout_api::storage::CloudinaryStorage;

// 10 MiB file cap plus headroom for multipart framing
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "scout-api")]
#[command(about = "Scout API - trail condition reports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve,

    #[command(about = "Apply the database schema")]
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SCOUT_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::InitDb => init_db(config).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting Scout API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SCOUT_JWT_SECRET is not set; every protected route will reject");
    }

    let pool = database::connect_pool(&config.database)?;
    let repository = Repository::new(pool);
    let photos = Arc::new(CloudinaryStorage::new(&config.storage));

    let port = config.server.port;
    let state = AppState::new(config, repository, photos);
    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Scout API listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_db(config: AppConfig) -> anyhow::Result<()> {
    let pool = database::connect_pool(&config.database)?;
    database::apply_schema(&pool).await?;

    println!("Database schema applied.");
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(locations::list))
        .route("/api/locations/:id", get(locations::get_one))
}

/// Mutating routes plus the actor's own reads; everything here sits behind
/// the bearer-token gate.
fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/auth/session", post(session::sign_in))
        .route("/api/locations", post(locations::create))
        .route("/api/conditions", post(conditions::create))
        .route("/api/users/me/conditions", get(conditions::list_mine))
        .route(
            "/api/upload",
            post(upload::upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route_layer(axum::middleware::from_fn_with_state(state, require_auth))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Scout API",
            "version": version,
            "description": "Point-located trail condition reports with photos and ratings",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "locations": "GET /api/locations, GET /api/locations/:id (public); POST /api/locations (protected)",
                "conditions": "POST /api/conditions (protected)",
                "profile": "GET /api/users/me/conditions (protected)",
                "session": "POST /auth/session (protected - sign-in hook)",
                "upload": "POST /api/upload (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(state.repository.pool()).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
