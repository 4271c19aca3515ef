//! ReCaatinga API Server

use axum::{
    routing::{get, post, put},
    Router,
};
use engine::{SweeperConfig, TempFileSweeper};
use services::{DeliveryConfig, DeliveryService, Notifier};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

mod error;
mod extract;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recaatinga=debug".parse()?)
                .add_directive("api=debug".parse()?),
        )
        .init();

    info!("🌵 Starting ReCaatinga API");

    // Load configuration
    let config = common::Config::from_env();

    // Connect to database
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    db::run_migrations(&pool).await?;

    let notifier = Notifier::new(&config);

    // Temp-file sweeper (if enabled)
    if config.sweep_interval_mins > 0 {
        let sweeper = TempFileSweeper::new(SweeperConfig {
            interval: Duration::from_secs(config.sweep_interval_mins as u64 * 60),
            max_age: Duration::from_secs(60 * 60),
            dir: PathBuf::from(&config.temp_dir),
        });
        tokio::spawn(async move {
            sweeper.run().await;
        });
        info!(
            "🧹 Temp-file sweeper enabled (every {} minutes)",
            config.sweep_interval_mins
        );
    } else {
        info!("🧹 Temp-file sweeper disabled (SWEEP_INTERVAL_MINS=0)");
    }

    // Unlock-notification delivery loop (if enabled)
    if config.delivery_interval_secs > 0 {
        let delivery = DeliveryService::new(
            pool.clone(),
            notifier.clone(),
            DeliveryConfig {
                interval: Duration::from_secs(config.delivery_interval_secs as u64),
                ..Default::default()
            },
        );
        tokio::spawn(async move {
            delivery.run().await;
        });
        info!(
            "📣 Notification delivery enabled (every {} seconds)",
            config.delivery_interval_secs
        );
    } else {
        info!("📣 Notification delivery disabled (DELIVERY_INTERVAL_SECS=0)");
    }

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), pool, notifier));

    // Build API router with state
    let api_router = Router::new()
        .route("/health", get(routes::health::health))
        // Phases
        .route(
            "/api/phases",
            get(routes::phases::list).post(routes::phases::create),
        )
        .route(
            "/api/phases/:id",
            get(routes::phases::get)
                .put(routes::phases::update)
                .delete(routes::phases::delete),
        )
        .route(
            "/api/phases/:id/video-watched",
            post(routes::progress::video_watched),
        )
        .route("/api/phases/:id/progress", get(routes::progress::get))
        // Missions
        .route(
            "/api/phases/:id/missions",
            get(routes::missions::list).post(routes::missions::create),
        )
        .route(
            "/api/missions/:id",
            put(routes::missions::update).delete(routes::missions::delete),
        )
        .route(
            "/api/missions/:id/complete",
            post(routes::missions::complete),
        )
        // Games
        .route(
            "/api/missions/:id/games",
            get(routes::games::list).post(routes::games::create),
        )
        .route(
            "/api/games/:id",
            put(routes::games::update).delete(routes::games::delete),
        )
        .route("/api/games/:id/submit", post(routes::games::submit))
        // Task submissions
        .route("/api/tasks/submit", post(routes::tasks::submit))
        .route("/api/tasks/mine", get(routes::tasks::mine))
        .route("/api/tasks/pending", get(routes::tasks::pending))
        .route("/api/tasks/review/:id", put(routes::tasks::review))
        // Ranking
        .route("/api/ranking/top", get(routes::ranking::top))
        .route("/api/ranking/me", get(routes::ranking::me))
        // Achievements
        .route("/api/achievements", get(routes::achievements::list))
        .route(
            "/api/users/:id/achievements",
            get(routes::achievements::for_user),
        )
        // Users
        .route("/api/users", post(routes::users::create))
        .route("/api/users/me", get(routes::users::me))
        .route("/api/users/me/badge", put(routes::users::set_badge))
        .route(
            "/api/users/me/devices",
            post(routes::users::register_device),
        )
        .route(
            "/api/users/me/devices/:token",
            axum::routing::delete(routes::users::remove_device),
        )
        .with_state(state);

    // Build full router with static file serving and SPA fallback
    // Serve static files, but fall back to index.html for SPA routing
    let static_service = ServeDir::new("static")
        .append_index_html_on_directories(true)
        .fallback(tower_http::services::ServeFile::new("static/index.html"));

    let app = api_router
        .fallback_service(static_service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    info!("🚀 Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
