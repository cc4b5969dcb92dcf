use tracing::warn;

pub struct Config {
    pub host: String,
    pub port: u16,
    /// TTL for browse result pages, seconds.
    pub browse_ttl_secs: u64,
    /// TTL for single-listing lookups, seconds.
    pub show_ttl_secs: u64,
    /// TTL for facet aggregations, seconds.
    pub facets_ttl_secs: u64,
    /// TTL for statistics aggregations, seconds.
    pub statistics_ttl_secs: u64,
    pub cache_driver: String,
}

impl Config {
    const DEFAULT_BROWSE_TTL_SECS: u64 = 300;
    const DEFAULT_SHOW_TTL_SECS: u64 = 600;
    const DEFAULT_FACETS_TTL_SECS: u64 = 900;
    const DEFAULT_STATISTICS_TTL_SECS: u64 = 1800;

    pub fn from_env() -> Self {
        Self {
            host: std::env::var("FORECOURT_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_u64("FORECOURT_HTTP_PORT", 8080) as u16,
            browse_ttl_secs: env_u64("FORECOURT_BROWSE_TTL_SECS", Self::DEFAULT_BROWSE_TTL_SECS),
            show_ttl_secs: env_u64("FORECOURT_SHOW_TTL_SECS", Self::DEFAULT_SHOW_TTL_SECS),
            facets_ttl_secs: env_u64("FORECOURT_FACETS_TTL_SECS", Self::DEFAULT_FACETS_TTL_SECS),
            statistics_ttl_secs: env_u64(
                "FORECOURT_STATISTICS_TTL_SECS",
                Self::DEFAULT_STATISTICS_TTL_SECS,
            ),
            cache_driver: std::env::var("FORECOURT_CACHE_DRIVER")
                .unwrap_or_else(|_| "moka".to_string()),
        }
    }
}

fn env_u64(var: &str, default: u64) -> u64 {
    match std::env::var(var) {
        Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
            warn!("{} is not a valid number, falling back to {}", var, default);
            default
        }),
        Err(_) => default,
    }
}
