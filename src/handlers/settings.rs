use axum::{extract::State, Json};

use crate::error::{AppError, AppResult};
use crate::settings::NotificationSettings;
use crate::AppState;

/// Admin surface for the notification settings document. Reads go straight
/// to the file, never a cached copy, so what the admin sees is what the
/// scheduler will use on its next tick.
pub async fn get_settings(State(state): State<AppState>) -> Json<NotificationSettings> {
    Json(state.settings.load())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<NotificationSettings>,
) -> AppResult<Json<NotificationSettings>> {
    // Reject times the scheduler would silently replace with the default.
    if chrono::NaiveTime::parse_from_str(&body.time, "%H:%M").is_err() {
        return Err(AppError::Validation(
            "Reminder time must be a 24-hour HH:MM string".into(),
        ));
    }

    state
        .settings
        .save(&body)
        .map_err(AppError::Internal)?;
    tracing::info!(enabled = body.enabled, time = %body.time, "Notification settings updated");
    Ok(Json(body))
}
