use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{
    jwt::{create_access_token, AccessToken},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserProfile};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub beta_code: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<Json<AccessToken>> {
    if body.beta_code != state.config.beta_code {
        return Err(AppError::Validation("Invalid beta access code".into()));
    }
    if body.username.trim().is_empty() || body.email.trim().is_empty() {
        return Err(AppError::Validation("Username and email are required".into()));
    }
    if body.password.len() < state.config.min_password_length {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            state.config.min_password_length
        )));
    }

    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
    )
    .bind(&body.username)
    .bind(&body.email)
    .fetch_one(&state.db)
    .await?;
    if taken {
        return Err(AppError::Validation(
            "Username or email is already registered".into(),
        ));
    }

    let password_hash = hash_password(&body.password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(body.username.trim())
    .bind(body.email.trim())
    .bind(&password_hash)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(username = %user.username, "New user registered");
    let token = create_access_token(user.id, &user.username, &state.config)?;
    Ok(Json(token))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<AccessToken>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&body.username)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let token = create_access_token(user.id, &user.username, &state.config)?;
    Ok(Json(token))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user.into()))
}
