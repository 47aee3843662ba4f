use std::env;

const DEFAULT_ORACLE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub metrics_addr: String,

    // Price oracle
    pub price_oracle_url: String,
    pub price_lookup_timeout_secs: u64,
    pub max_concurrent_price_lookups: usize,

    // Scheduling
    pub refresh_interval_secs: u64,
    pub verification_interval_secs: u64,
    pub highlight_interval_secs: u64,

    // Engine parameters
    pub max_signal_age_days: i64,
    pub trending_window_hours: i64,
    pub trending_top_n: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            metrics_addr: env::var("METRICS_ADDR").unwrap_or_else(|_| "127.0.0.1:9090".into()),

            price_oracle_url: env::var("PRICE_ORACLE_URL")
                .unwrap_or_else(|_| DEFAULT_ORACLE_URL.into()),
            price_lookup_timeout_secs: parse_env("PRICE_LOOKUP_TIMEOUT_SECS", 5),
            max_concurrent_price_lookups: parse_env("MAX_CONCURRENT_PRICE_LOOKUPS", 8),

            refresh_interval_secs: parse_env("REFRESH_INTERVAL_SECS", 300),
            verification_interval_secs: parse_env("VERIFICATION_INTERVAL_SECS", 86_400),
            highlight_interval_secs: parse_env("HIGHLIGHT_INTERVAL_SECS", 86_400),

            max_signal_age_days: parse_env("MAX_SIGNAL_AGE_DAYS", 30),
            trending_window_hours: parse_env("TRENDING_WINDOW_HOURS", 24),
            trending_top_n: parse_env("TRENDING_TOP_N", 5),
        })
    }
}

fn parse_env<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
