use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{Local, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::entry::{
    CreateEntryRequest, EntryQuery, EntrySeries, EntryWithMedications, MoodEntry,
};
use crate::AppState;

/// Entries may only be logged for today or the past, against the server's
/// local clock.
fn validate_entry_date(date: NaiveDate, today: NaiveDate) -> AppResult<()> {
    if date > today {
        return Err(AppError::FutureDate);
    }
    Ok(())
}

/// A date collides when another entry already sits on it. When editing,
/// finding the entry being edited itself is not a collision.
fn date_conflicts(existing: Option<Uuid>, editing: Option<Uuid>) -> bool {
    match existing {
        Some(id) => editing != Some(id),
        None => false,
    }
}

async fn entry_id_on_date(
    db: &PgPool,
    user_id: Uuid,
    date: NaiveDate,
) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM mood_entries WHERE user_id = $1 AND entry_date = $2",
    )
    .bind(user_id)
    .bind(date)
    .fetch_optional(db)
    .await
}

async fn medications_taken_for(db: &PgPool, entry_id: Uuid) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT medication_id FROM mood_entry_medications WHERE mood_entry_id = $1 AND taken",
    )
    .bind(entry_id)
    .fetch_all(db)
    .await
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<Json<EntryWithMedications>> {
    validate_entry_date(body.entry_date, Local::now().date_naive())?;

    // Checked up front so a duplicate surfaces as a warning the user can act
    // on; the unique constraint below remains the backstop.
    if date_conflicts(
        entry_id_on_date(&state.db, auth_user.id, body.entry_date).await?,
        None,
    ) {
        return Err(AppError::DuplicateDate);
    }

    // Entry plus its medication links commit or roll back as one unit.
    let mut tx = state.db.begin().await?;

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        INSERT INTO mood_entries (
            id, user_id, entry_date, mood_level, energy_level, anxiety, irritability,
            hours_slept, weight, alcohol_drugs, exercise, menstruation, stressful_event, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(body.entry_date)
    .bind(body.mood_level)
    .bind(body.energy_level)
    .bind(body.anxiety)
    .bind(body.irritability)
    .bind(body.hours_slept)
    .bind(body.weight)
    .bind(body.alcohol_drugs)
    .bind(body.exercise)
    .bind(body.menstruation)
    .bind(body.stressful_event)
    .bind(&body.notes)
    .fetch_one(&mut *tx)
    .await?;

    let taken = insert_medication_links(&mut tx, auth_user.id, entry.id, &body.medications_taken)
        .await?;

    tx.commit().await?;

    tracing::info!(user = %auth_user.username, date = %entry.entry_date, "Entry created");
    Ok(Json(EntryWithMedications {
        entry,
        medications_taken: taken,
    }))
}

/// Link the given medications to an entry, skipping ids the user does not
/// own. Returns the ids actually linked.
async fn insert_medication_links(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    user_id: Uuid,
    entry_id: Uuid,
    medication_ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    let mut linked = Vec::with_capacity(medication_ids.len());
    for med_id in medication_ids {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM medications WHERE id = $1 AND user_id = $2)",
        )
        .bind(med_id)
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        if !owned {
            continue;
        }
        sqlx::query(
            r#"
            INSERT INTO mood_entry_medications (id, mood_entry_id, medication_id, taken)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (mood_entry_id, medication_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry_id)
        .bind(med_id)
        .execute(&mut **tx)
        .await?;
        linked.push(*med_id);
    }
    Ok(linked)
}

pub async fn get_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<EntryWithMedications>> {
    let entry = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    let taken = medications_taken_for(&state.db, entry.id).await?;
    Ok(Json(EntryWithMedications {
        entry,
        medications_taken: taken,
    }))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<EntryQuery>,
) -> AppResult<Json<Vec<MoodEntry>>> {
    let mut q = String::from(
        "SELECT * FROM mood_entries WHERE user_id = $1",
    );
    if query.start_date.is_some() {
        q.push_str(" AND entry_date >= $2");
    }
    if query.end_date.is_some() {
        q.push_str(if query.start_date.is_some() {
            " AND entry_date <= $3"
        } else {
            " AND entry_date <= $2"
        });
    }
    q.push_str(" ORDER BY entry_date DESC");

    let mut stmt = sqlx::query_as::<_, MoodEntry>(&q).bind(auth_user.id);
    if let Some(start) = query.start_date {
        stmt = stmt.bind(start);
    }
    if let Some(end) = query.end_date {
        stmt = stmt.bind(end);
    }

    let entries = stmt.fetch_all(&state.db).await?;
    Ok(Json(entries))
}

/// Time-series payload for the history chart, oldest first.
pub async fn entry_series(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<EntrySeries>> {
    let entries = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE user_id = $1 ORDER BY entry_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    let mut series = EntrySeries {
        dates: Vec::with_capacity(entries.len()),
        mood: Vec::with_capacity(entries.len()),
        energy: Vec::with_capacity(entries.len()),
        anxiety: Vec::with_capacity(entries.len()),
        irritability: Vec::with_capacity(entries.len()),
    };
    for entry in &entries {
        series.dates.push(entry.entry_date);
        series.mood.push(entry.mood_level);
        series.energy.push(entry.energy_level);
        series.anxiety.push(entry.anxiety);
        series.irritability.push(entry.irritability);
    }

    Ok(Json(series))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<Json<EntryWithMedications>> {
    validate_entry_date(body.entry_date, Local::now().date_naive())?;

    let existing = sqlx::query_as::<_, MoodEntry>(
        "SELECT * FROM mood_entries WHERE id = $1 AND user_id = $2",
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Entry not found".into()))?;

    // The date may move; moving onto its own current date is always allowed.
    if date_conflicts(
        entry_id_on_date(&state.db, auth_user.id, body.entry_date).await?,
        Some(existing.id),
    ) {
        return Err(AppError::DuplicateDate);
    }

    let mut tx = state.db.begin().await?;

    let entry = sqlx::query_as::<_, MoodEntry>(
        r#"
        UPDATE mood_entries SET
            entry_date = $3, mood_level = $4, energy_level = $5, anxiety = $6,
            irritability = $7, hours_slept = $8, weight = $9, alcohol_drugs = $10,
            exercise = $11, menstruation = $12, stressful_event = $13, notes = $14,
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(entry_id)
    .bind(auth_user.id)
    .bind(body.entry_date)
    .bind(body.mood_level)
    .bind(body.energy_level)
    .bind(body.anxiety)
    .bind(body.irritability)
    .bind(body.hours_slept)
    .bind(body.weight)
    .bind(body.alcohol_drugs)
    .bind(body.exercise)
    .bind(body.menstruation)
    .bind(body.stressful_event)
    .bind(&body.notes)
    .fetch_one(&mut *tx)
    .await?;

    // Medication links are replaced wholesale on edit.
    sqlx::query("DELETE FROM mood_entry_medications WHERE mood_entry_id = $1")
        .bind(entry_id)
        .execute(&mut *tx)
        .await?;
    let taken = insert_medication_links(&mut tx, auth_user.id, entry.id, &body.medications_taken)
        .await?;

    tx.commit().await?;

    tracing::info!(user = %auth_user.username, date = %entry.entry_date, "Entry updated");
    Ok(Json(EntryWithMedications {
        entry,
        medications_taken: taken,
    }))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(entry_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    // Medication-taken rows go with the entry via ON DELETE CASCADE.
    let result = sqlx::query("DELETE FROM mood_entries WHERE id = $1 AND user_id = $2")
        .bind(entry_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Entry not found".into()));
    }

    tracing::info!(user = %auth_user.username, "Entry deleted");
    Ok(Json(serde_json::json!({ "deleted": true })))
}
