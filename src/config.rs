use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,

    /// Registration gate: the access code new users must supply.
    pub beta_code: String,
    pub min_password_length: usize,

    /// Path of the notification settings JSON document.
    pub settings_path: String,

    /// Account the reminder scheduler watches: the owner of the desktop this
    /// process runs on. Unset disables the scheduler.
    pub reminder_username: Option<String>,

    /// Reminder scheduler polling interval. One minute in production;
    /// overridable for local experimentation.
    pub reminder_tick_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "86400".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),

            beta_code: env::var("BETA_CODE").unwrap_or_else(|_| "moodtracker2024".into()),
            min_password_length: env::var("MIN_PASSWORD_LENGTH")
                .unwrap_or_else(|_| "6".into())
                .parse()
                .unwrap_or(6),

            settings_path: env::var("NOTIFICATION_SETTINGS_PATH")
                .unwrap_or_else(|_| "notification_settings.json".into()),

            reminder_username: env::var("REMINDER_USERNAME").ok().filter(|s| !s.is_empty()),

            reminder_tick_secs: env::var("REMINDER_TICK_SECS")
                .unwrap_or_else(|_| "60".into())
                .parse()
                .unwrap_or(60),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
