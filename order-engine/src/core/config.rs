use chrono_tz::Tz;
use std::path::PathBuf;

/// Engine configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | /var/lib/order-engine | Working directory (database, logs) |
/// | ORDER_DB_FILE | orders.redb | Database file name inside WORK_DIR |
/// | TIMEZONE | UTC | Business timezone (order numbers, availability windows) |
/// | TAX_RATE_PERCENT | 8 | Tax applied to the subtotal |
/// | PREPARATION_MINUTES | 30 | Kitchen estimate added on confirmation |
/// | DELIVERY_MINUTES | 20 | Courier estimate |
/// | PAYMENT_TIMEOUT_MS | 10000 | Upper bound for a gateway charge |
/// | STRICT_SELECTIONS | true | Reject unknown customizations/add-ons |
/// | EVENT_CHANNEL_CAPACITY | 65536 | Broadcast capacity for committed events |
/// | LOG_LEVEL | info | Default tracing level |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/orders TIMEZONE=Asia/Kolkata cargo test
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub db_file: String,
    pub timezone: Tz,
    pub tax_rate_percent: u32,
    pub preparation_minutes: i64,
    pub delivery_minutes: i64,
    pub payment_timeout_ms: u64,
    pub strict_selections: bool,
    pub event_channel_capacity: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "/var/lib/order-engine".into(),
            db_file: "orders.redb".into(),
            timezone: chrono_tz::UTC,
            tax_rate_percent: 8,
            preparation_minutes: 30,
            delivery_minutes: 20,
            payment_timeout_ms: 10_000,
            strict_selections: true,
            event_channel_capacity: 65_536,
            log_level: "info".into(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load `.env` (if present) and then read the environment
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    /// Read configuration from environment variables
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let timezone = match std::env::var("TIMEZONE") {
            Ok(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                tracing::warn!(timezone = %name, "Unknown TIMEZONE, falling back to UTC");
                defaults.timezone
            }),
            Err(_) => defaults.timezone,
        };

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or(defaults.work_dir),
            db_file: std::env::var("ORDER_DB_FILE").unwrap_or(defaults.db_file),
            timezone,
            tax_rate_percent: env_parse("TAX_RATE_PERCENT").unwrap_or(defaults.tax_rate_percent),
            preparation_minutes: env_parse("PREPARATION_MINUTES")
                .unwrap_or(defaults.preparation_minutes),
            delivery_minutes: env_parse("DELIVERY_MINUTES").unwrap_or(defaults.delivery_minutes),
            payment_timeout_ms: env_parse("PAYMENT_TIMEOUT_MS")
                .unwrap_or(defaults.payment_timeout_ms),
            strict_selections: env_parse("STRICT_SELECTIONS")
                .unwrap_or(defaults.strict_selections),
            event_channel_capacity: env_parse("EVENT_CHANNEL_CAPACITY")
                .unwrap_or(defaults.event_channel_capacity),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Override the working directory, keeping everything else
    ///
    /// Mostly used by tests with a temporary directory.
    pub fn with_work_dir(mut self, work_dir: impl Into<String>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Full path of the order database
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    /// Log directory inside the working directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn preparation_millis(&self) -> i64 {
        shared::util::minutes_to_millis(self.preparation_minutes)
    }

    pub fn delivery_millis(&self) -> i64 {
        shared::util::minutes_to_millis(self.delivery_minutes)
    }
}
