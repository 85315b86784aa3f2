use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod reminder;
mod settings;
#[cfg(test)]
mod test_util;

use config::Config;
use reminder::sink::DesktopSink;
use settings::SettingsStore;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub settings: SettingsStore,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let settings = SettingsStore::new(&config.settings_path);

    let state = AppState {
        db,
        config: config.clone(),
        settings: settings.clone(),
    };

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login));

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        // Entries
        .route("/api/entries", get(handlers::entries::list_entries))
        .route("/api/entries", post(handlers::entries::create_entry))
        .route("/api/entries/series", get(handlers::entries::entry_series))
        .route("/api/entries/:id", get(handlers::entries::get_entry))
        .route("/api/entries/:id", put(handlers::entries::update_entry))
        .route("/api/entries/:id", delete(handlers::entries::delete_entry))
        // Medications
        .route(
            "/api/medications",
            get(handlers::medications::list_medications),
        )
        .route(
            "/api/medications",
            post(handlers::medications::add_medication),
        )
        .route(
            "/api/medications/:id",
            put(handlers::medications::rename_medication),
        )
        .route(
            "/api/medications/:id/activate",
            post(handlers::medications::activate_medication),
        )
        .route(
            "/api/medications/:id/deactivate",
            post(handlers::medications::deactivate_medication),
        )
        // Notification settings admin surface
        .route("/api/settings", get(handlers::settings::get_settings))
        .route("/api/settings", put(handlers::settings::update_settings))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .frontend_url
                .parse::<axum::http::HeaderValue>()
                .expect("FRONTEND_URL must be a valid origin"),
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ]);

    // The reminder scheduler runs as its own long-lived task and only reads
    // the store and the settings file.
    match &config.reminder_username {
        Some(username) => {
            reminder::spawn_reminder_worker(
                state.db.clone(),
                settings,
                Arc::new(DesktopSink),
                username.clone(),
                config.reminder_tick_secs,
            );
        }
        None => {
            tracing::info!("REMINDER_USERNAME not set, reminder scheduler disabled");
        }
    }

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
