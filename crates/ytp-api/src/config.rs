//! API configuration.

/// Port used when neither `PORT` nor `API_PORT` is set.
pub const DEFAULT_PORT: u16 = 3001;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Per-IP rate limit in requests per second (0 disables)
    pub rate_limit_rps: u32,
    /// Key rate limits on X-Forwarded-For / X-Real-IP (only behind a proxy)
    pub trust_proxy_headers: bool,
    /// Max request body size
    pub max_body_size: usize,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            trust_proxy_headers: false,
            max_body_size: 1024 * 1024, // 1MB
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("API_PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            trust_proxy_headers: std::env::var("TRUST_PROXY_HEADERS")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.trust_proxy_headers),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| is_truthy(&v))
                .unwrap_or(defaults.metrics_enabled),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "true" || value == "1"
}

/// Whether `ENVIRONMENT` names production. Error responses hide internal
/// details there.
pub fn is_production() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|v| is_production_environment(&v))
        .unwrap_or(false)
}

pub fn is_production_environment(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("production")
}
