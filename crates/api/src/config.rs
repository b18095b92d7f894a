//! Environment-driven configuration, read once at startup.

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// Listen address, e.g. `0.0.0.0:8080`.
    pub bind_addr: String,
    /// When set, use the Postgres store instead of the in-memory one.
    pub use_persistent_store: bool,
    /// Postgres connection string; required with `use_persistent_store`.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("SIPHON_JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("SIPHON_JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });
        let bind_addr =
            std::env::var("SIPHON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let use_persistent_store = std::env::var("USE_PERSISTENT_STORE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let database_url = std::env::var("DATABASE_URL").ok();

        Self {
            jwt_secret,
            bind_addr,
            use_persistent_store,
            database_url,
        }
    }
}
