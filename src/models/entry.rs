use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub mood_level: i32,
    pub energy_level: i32,
    pub anxiety: i32,
    pub irritability: i32,
    pub hours_slept: f64,
    pub weight: Option<f64>,
    pub alcohol_drugs: bool,
    pub exercise: bool,
    pub menstruation: bool,
    pub stressful_event: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub entry_date: NaiveDate,
    pub mood_level: i32,
    pub energy_level: i32,
    pub anxiety: i32,
    pub irritability: i32,
    pub hours_slept: f64,
    pub weight: Option<f64>,
    #[serde(default)]
    pub alcohol_drugs: bool,
    #[serde(default)]
    pub exercise: bool,
    #[serde(default)]
    pub menstruation: bool,
    #[serde(default)]
    pub stressful_event: bool,
    #[serde(default)]
    pub notes: String,
    /// Medications taken on this date, by id.
    #[serde(default)]
    pub medications_taken: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// An entry plus the medications marked taken on it.
#[derive(Debug, Serialize)]
pub struct EntryWithMedications {
    #[serde(flatten)]
    pub entry: MoodEntry,
    pub medications_taken: Vec<Uuid>,
}

/// Chart payload: one parallel series per tracked level.
#[derive(Debug, Serialize)]
pub struct EntrySeries {
    pub dates: Vec<NaiveDate>,
    pub mood: Vec<i32>,
    pub energy: Vec<i32>,
    pub anxiety: Vec<i32>,
    pub irritability: Vec<i32>,
}
