use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::medication::{
    AddMedicationOutcome, AddMedicationRequest, AddMedicationResponse, Medication,
    MedicationQuery, MedicationState, RenameMedicationRequest,
};
use crate::AppState;

pub async fn list_medications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MedicationQuery>,
) -> AppResult<Json<Vec<Medication>>> {
    let medications = if query.include_inactive {
        sqlx::query_as::<_, Medication>(
            "SELECT * FROM medications WHERE user_id = $1 ORDER BY name",
        )
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?
    } else {
        // Only active medications are offered on new entries.
        sqlx::query_as::<_, Medication>(
            "SELECT * FROM medications WHERE user_id = $1 AND state = 'active' ORDER BY name",
        )
        .bind(auth_user.id)
        .fetch_all(&state.db)
        .await?
    };

    Ok(Json(medications))
}

/// Add by name. An inactive medication with the same name is reactivated
/// rather than duplicated, which is why the lookup ignores lifecycle state.
pub async fn add_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<AddMedicationRequest>,
) -> AppResult<Json<AddMedicationResponse>> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::EmptyName);
    }

    let existing = sqlx::query_as::<_, Medication>(
        "SELECT * FROM medications WHERE user_id = $1 AND name = $2",
    )
    .bind(auth_user.id)
    .bind(name)
    .fetch_optional(&state.db)
    .await?;

    match existing {
        Some(med) if med.state == MedicationState::Active => Err(AppError::DuplicateName),
        Some(med) => {
            let medication = set_medication_state(
                &state.db,
                auth_user.id,
                med.id,
                MedicationState::Active,
            )
            .await?;
            tracing::info!(user = %auth_user.username, name, "Medication reactivated");
            Ok(Json(AddMedicationResponse {
                outcome: AddMedicationOutcome::Reactivated,
                medication,
            }))
        }
        None => {
            let medication = sqlx::query_as::<_, Medication>(
                r#"
                INSERT INTO medications (id, user_id, name, state)
                VALUES ($1, $2, $3, 'active')
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(auth_user.id)
            .bind(name)
            .fetch_one(&state.db)
            .await?;
            tracing::info!(user = %auth_user.username, name, "Medication added");
            Ok(Json(AddMedicationResponse {
                outcome: AddMedicationOutcome::Created,
                medication,
            }))
        }
    }
}

pub async fn rename_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(med_id): Path<Uuid>,
    Json(body): Json<RenameMedicationRequest>,
) -> AppResult<Json<Medication>> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::EmptyName);
    }

    // Collision check spans both lifecycle states.
    let collides = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM medications WHERE user_id = $1 AND name = $2 AND id <> $3)",
    )
    .bind(auth_user.id)
    .bind(name)
    .bind(med_id)
    .fetch_one(&state.db)
    .await?;
    if collides {
        return Err(AppError::DuplicateName);
    }

    let medication = sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications SET name = $3, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(med_id)
    .bind(auth_user.id)
    .bind(name)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Medication not found".into()))?;

    Ok(Json(medication))
}

pub async fn activate_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(med_id): Path<Uuid>,
) -> AppResult<Json<Medication>> {
    let medication =
        set_medication_state(&state.db, auth_user.id, med_id, MedicationState::Active).await?;
    Ok(Json(medication))
}

/// Soft delete: the medication disappears from the active list but stays
/// referenced by historical entries.
pub async fn deactivate_medication(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(med_id): Path<Uuid>,
) -> AppResult<Json<Medication>> {
    let medication =
        set_medication_state(&state.db, auth_user.id, med_id, MedicationState::Inactive).await?;
    Ok(Json(medication))
}

async fn set_medication_state(
    db: &sqlx::PgPool,
    user_id: Uuid,
    med_id: Uuid,
    state: MedicationState,
) -> AppResult<Medication> {
    sqlx::query_as::<_, Medication>(
        r#"
        UPDATE medications SET state = $3, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(med_id)
    .bind(user_id)
    .bind(state)
    .fetch_optional(db)
    .await?
    .ok_or(AppError::NotFound("Medication not found".into()))
}
