use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub state: MedicationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state. Deactivated medications stay referenced by historical
/// entries and can be reactivated by re-adding the same name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "medication_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MedicationState {
    Active,
    Inactive,
}

#[derive(Debug, Deserialize)]
pub struct AddMedicationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameMedicationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MedicationQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Outcome of an add-by-name, surfaced to the caller so the UI can word
/// its flash message.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AddMedicationOutcome {
    Created,
    Reactivated,
}

#[derive(Debug, Serialize)]
pub struct AddMedicationResponse {
    pub outcome: AddMedicationOutcome,
    pub medication: Medication,
}
