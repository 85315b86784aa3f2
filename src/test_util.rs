//! Shared fixtures for in-crate tests.

use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::settings::SettingsStore;
use crate::AppState;

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: String::new(),
        jwt_secret: "test-secret".into(),
        jwt_access_ttl_secs: 3600,
        beta_code: "code".into(),
        min_password_length: 6,
        settings_path: String::new(),
        reminder_username: None,
        reminder_tick_secs: 60,
    }
}

pub fn test_state(db: PgPool) -> AppState {
    AppState {
        db,
        config: Arc::new(test_config()),
        settings: SettingsStore::new("test_settings_unused.json"),
    }
}

pub async fn seed_user(db: &PgPool, username: &str) -> AuthUser {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, 'x')",
    )
    .bind(id)
    .bind(username)
    .bind(format!("{}@example.com", username))
    .execute(db)
    .await
    .expect("failed to seed user");
    AuthUser {
        id,
        username: username.into(),
    }
}
