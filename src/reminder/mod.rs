//! Daily reminder scheduler.
//!
//! A long-lived worker wakes once per minute, re-reads the notification
//! settings, and once the configured time-of-day has been reached checks
//! whether today's entry exists and whether the weekly weight checkpoint is
//! due. While either condition holds it emits a toast on every qualifying
//! tick (the historical behavior); `notify_once_per_day` turns on an
//! in-memory marker that limits it to the first toast of each local day.
//!
//! The worker only reads the entry store and the settings document. Every
//! error inside a tick is logged and swallowed; the loop never exits on its
//! own.

pub mod sink;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::settings::{NotificationSettings, SettingsStore};
use self::sink::NotificationSink;

pub const TOAST_TITLE: &str = "Mood Tracker Reminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderMessage {
    MoodOnly,
    WeightOnly,
    MoodAndWeight,
}

impl ReminderMessage {
    pub fn body(self) -> String {
        let core = match self {
            ReminderMessage::MoodOnly => "You haven't logged your mood today!".to_string(),
            ReminderMessage::WeightOnly => "It's time to log your weekly weight!".to_string(),
            ReminderMessage::MoodAndWeight => {
                "You haven't logged your mood today! Also, it's time to log your weekly weight."
                    .to_string()
            }
        };
        format!("{} Open your browser to add your entry.", core)
    }
}

/// Weekly weight cadence: due when no weight was ever recorded, or the most
/// recent weighted entry is 7 or more days before `today`. Pure over the
/// entry history; never cached.
pub fn weight_checkpoint_due(last_weighted: Option<NaiveDate>, today: NaiveDate) -> bool {
    match last_weighted {
        None => true,
        Some(date) => (today - date).num_days() >= 7,
    }
}

/// Pick the message for one tick, or none when nothing is outstanding.
pub fn decide_message(entry_exists: bool, weight_due: bool) -> Option<ReminderMessage> {
    match (entry_exists, weight_due) {
        (false, true) => Some(ReminderMessage::MoodAndWeight),
        (false, false) => Some(ReminderMessage::MoodOnly),
        (true, true) => Some(ReminderMessage::WeightOnly),
        (true, false) => None,
    }
}

/// Parse the settings' "HH:MM" reminder time, falling back to the default
/// when the document carries something unparseable.
pub fn parse_reminder_time(raw: &str) -> NaiveTime {
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap_or_else(|_| {
        tracing::warn!(raw, "Unparseable reminder time, falling back to 15:00");
        NaiveTime::from_hms_opt(15, 0, 0).unwrap()
    })
}

/// What one tick sees of the wall clock: the local calendar date in the
/// settings' fixed-offset timezone, and whether the configured time-of-day
/// has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    pub today: NaiveDate,
    pub reminder_due: bool,
}

pub fn tick_context(settings: &NotificationSettings, now_utc: DateTime<Utc>) -> TickContext {
    let local = now_utc.with_timezone(&settings.timezone.fixed_offset());
    TickContext {
        today: local.date_naive(),
        reminder_due: local.time() >= parse_reminder_time(&settings.time),
    }
}

/// Cross-tick state. Empty unless once-per-day suppression is enabled.
#[derive(Debug, Default)]
pub struct TickState {
    last_notified: Option<NaiveDate>,
}

impl TickState {
    /// Record a delivered toast. Called only after the sink accepted the
    /// notification, so a failed send never suppresses the retry on the
    /// next tick.
    pub fn mark_notified(&mut self, today: NaiveDate) {
        self.last_notified = Some(today);
    }
}

/// Apply the decision table plus optional suppression. Read-only; the
/// marker advances via `TickState::mark_notified` once delivery succeeds.
pub fn should_notify(
    settings: &NotificationSettings,
    today: NaiveDate,
    entry_exists: bool,
    weight_due: bool,
    state: &TickState,
) -> Option<ReminderMessage> {
    let message = decide_message(entry_exists, weight_due)?;
    if settings.notify_once_per_day && state.last_notified == Some(today) {
        return None;
    }
    Some(message)
}

async fn entry_exists_for(db: &PgPool, user_id: Uuid, date: NaiveDate) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM mood_entries WHERE user_id = $1 AND entry_date = $2)",
    )
    .bind(user_id)
    .bind(date)
    .fetch_one(db)
    .await
}

async fn last_weighted_entry_date(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<NaiveDate>> {
    sqlx::query_scalar::<_, NaiveDate>(
        r#"
        SELECT entry_date FROM mood_entries
        WHERE user_id = $1 AND weight IS NOT NULL
        ORDER BY entry_date DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// Resolve the reminder target account. The scheduler reminds one user: the
/// owner of the desktop this process runs on.
async fn lookup_user(db: &PgPool, username: &str) -> sqlx::Result<Option<Uuid>> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db)
        .await
}

async fn run_tick(
    db: &PgPool,
    settings_store: &SettingsStore,
    sink: &dyn NotificationSink,
    username: &str,
    state: &mut TickState,
) -> anyhow::Result<()> {
    // Settings are re-read every tick so admin changes apply within one
    // polling interval.
    let settings = settings_store.load();
    if !settings.enabled {
        tracing::debug!("Notifications disabled, skipping check");
        return Ok(());
    }

    let ctx = tick_context(&settings, Utc::now());
    if !ctx.reminder_due {
        return Ok(());
    }

    let Some(user_id) = lookup_user(db, username).await? else {
        tracing::warn!(username, "Reminder target user not found, skipping tick");
        return Ok(());
    };

    let entry_exists = entry_exists_for(db, user_id, ctx.today).await?;
    let last_weighted = last_weighted_entry_date(db, user_id).await?;
    let weight_due = weight_checkpoint_due(last_weighted, ctx.today);

    match should_notify(&settings, ctx.today, entry_exists, weight_due, state) {
        Some(message) => {
            if let Err(e) = sink.send(TOAST_TITLE, &message.body(), settings.duration) {
                tracing::warn!(error = %e, "Failed to send reminder notification");
            } else {
                state.mark_notified(ctx.today);
                tracing::info!(date = %ctx.today, ?message, "Reminder notification sent");
            }
        }
        None => {
            tracing::debug!(date = %ctx.today, "Nothing outstanding, no notification");
        }
    }

    Ok(())
}

pub fn spawn_reminder_worker(
    db: PgPool,
    settings_store: SettingsStore,
    sink: Arc<dyn NotificationSink>,
    username: String,
    tick_secs: u64,
) {
    tokio::spawn(async move {
        tracing::info!(%username, tick_secs, "Reminder scheduler started");
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));
        let mut state = TickState::default();
        loop {
            interval.tick().await;
            if let Err(e) = run_tick(&db, &settings_store, sink.as_ref(), &username, &mut state).await
            {
                tracing::error!(error = %e, "Reminder tick failed");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TimezoneCode;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings() -> NotificationSettings {
        NotificationSettings {
            enabled: true,
            time: "15:00".into(),
            timezone: TimezoneCode::Est,
            duration: 10,
            gender: "female".into(),
            notify_once_per_day: false,
        }
    }

    // ── weight_checkpoint_due ────────────────────────────────────────────

    #[test]
    fn test_checkpoint_due_when_never_weighed() {
        assert!(weight_checkpoint_due(None, date(2024, 1, 10)));
    }

    #[test]
    fn test_checkpoint_due_at_exactly_seven_days() {
        assert!(weight_checkpoint_due(Some(date(2024, 1, 3)), date(2024, 1, 10)));
    }

    #[test]
    fn test_checkpoint_not_due_at_six_days() {
        assert!(!weight_checkpoint_due(Some(date(2024, 1, 4)), date(2024, 1, 10)));
    }

    #[test]
    fn test_checkpoint_due_at_ten_days() {
        assert!(weight_checkpoint_due(Some(date(2023, 12, 31)), date(2024, 1, 10)));
    }

    #[test]
    fn test_checkpoint_not_due_same_day() {
        assert!(!weight_checkpoint_due(Some(date(2024, 1, 10)), date(2024, 1, 10)));
    }

    // ── decide_message ───────────────────────────────────────────────────

    #[test]
    fn test_no_entry_and_weight_due_combines() {
        assert_eq!(decide_message(false, true), Some(ReminderMessage::MoodAndWeight));
    }

    #[test]
    fn test_no_entry_only_mood_message() {
        assert_eq!(decide_message(false, false), Some(ReminderMessage::MoodOnly));
    }

    #[test]
    fn test_entry_exists_weight_due_weight_message() {
        assert_eq!(decide_message(true, true), Some(ReminderMessage::WeightOnly));
    }

    #[test]
    fn test_nothing_outstanding_no_message() {
        assert_eq!(decide_message(true, false), None);
    }

    #[test]
    fn test_message_bodies() {
        assert!(ReminderMessage::MoodOnly.body().starts_with("You haven't logged your mood today!"));
        assert!(ReminderMessage::WeightOnly.body().starts_with("It's time to log your weekly weight!"));
        let combined = ReminderMessage::MoodAndWeight.body();
        assert!(combined.contains("mood today"));
        assert!(combined.contains("weekly weight"));
        assert!(combined.ends_with("Open your browser to add your entry."));
    }

    // ── tick_context ─────────────────────────────────────────────────────

    #[test]
    fn test_tick_not_due_before_configured_time() {
        // 19:30 UTC is 14:30 EST, half an hour before the 15:00 reminder.
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 19, 30, 0).unwrap();
        let ctx = tick_context(&settings(), now);
        assert_eq!(ctx.today, date(2024, 1, 10));
        assert!(!ctx.reminder_due);
    }

    #[test]
    fn test_tick_due_at_configured_time() {
        // 20:00 UTC is exactly 15:00 EST.
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 20, 0, 0).unwrap();
        assert!(tick_context(&settings(), now).reminder_due);
    }

    #[test]
    fn test_tick_still_due_after_configured_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 23, 45, 0).unwrap();
        assert!(tick_context(&settings(), now).reminder_due);
    }

    #[test]
    fn test_local_date_rolls_back_across_midnight_utc() {
        // 02:00 UTC on the 11th is still 21:00 EST on the 10th.
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 2, 0, 0).unwrap();
        let ctx = tick_context(&settings(), now);
        assert_eq!(ctx.today, date(2024, 1, 10));
        assert!(ctx.reminder_due);
    }

    #[test]
    fn test_pst_shifts_local_date() {
        let mut s = settings();
        s.timezone = TimezoneCode::Pst;
        let now = Utc.with_ymd_and_hms(2024, 1, 11, 5, 0, 0).unwrap();
        // 05:00 UTC on the 11th is 21:00 PST on the 10th.
        assert_eq!(tick_context(&s, now).today, date(2024, 1, 10));
    }

    #[test]
    fn test_unparseable_time_falls_back_to_default() {
        assert_eq!(parse_reminder_time("not a time"), NaiveTime::from_hms_opt(15, 0, 0).unwrap());
        assert_eq!(parse_reminder_time("08:30"), NaiveTime::from_hms_opt(8, 30, 0).unwrap());
    }

    // ── should_notify / suppression ──────────────────────────────────────

    #[test]
    fn test_renotifies_every_tick_by_default() {
        let s = settings();
        let mut state = TickState::default();
        let today = date(2024, 1, 10);
        // Conditions persist: every tick produces the combined message, even
        // after deliveries are recorded.
        for _ in 0..3 {
            assert_eq!(
                should_notify(&s, today, false, true, &state),
                Some(ReminderMessage::MoodAndWeight)
            );
            state.mark_notified(today);
        }
    }

    #[test]
    fn test_once_per_day_suppresses_repeats() {
        let mut s = settings();
        s.notify_once_per_day = true;
        let mut state = TickState::default();
        let today = date(2024, 1, 10);
        assert_eq!(should_notify(&s, today, false, false, &state), Some(ReminderMessage::MoodOnly));
        state.mark_notified(today);
        assert_eq!(should_notify(&s, today, false, false, &state), None);
        // A new local day resets the marker.
        let tomorrow = date(2024, 1, 11);
        assert_eq!(
            should_notify(&s, tomorrow, false, false, &state),
            Some(ReminderMessage::MoodOnly)
        );
    }

    #[test]
    fn test_failed_delivery_does_not_suppress_retry() {
        let mut s = settings();
        s.notify_once_per_day = true;
        let state = TickState::default();
        let today = date(2024, 1, 10);
        // First tick decides to notify but the toast fails, so the marker is
        // never advanced; the next tick must still notify.
        assert!(should_notify(&s, today, false, false, &state).is_some());
        assert!(should_notify(&s, today, false, false, &state).is_some());
    }
}
