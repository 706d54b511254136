//! Service configuration.

use std::str::FromStr;

use classroom_cascade::CascadeConfig;

/// Where blob objects live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    /// HTTP object gateway (`BLOB_GATEWAY_URL`).
    Http,
    /// Local directory (`BLOB_ROOT`).
    Fs,
    /// Process memory; objects vanish on restart.
    Memory,
}

impl FromStr for BlobBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" | "gateway" => Ok(Self::Http),
            "fs" | "file" | "filesystem" => Ok(Self::Fs),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown blob backend: {other}")),
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/classroom").
    pub data_dir: String,

    /// Service API key required on every cascade endpoint.
    pub service_api_key: Option<String>,

    /// Blob backend (default: http).
    pub blob_backend: BlobBackend,

    /// Object gateway URL, for the http backend.
    pub blob_gateway_url: Option<String>,

    /// Bearer token for the object gateway.
    pub blob_gateway_token: Option<String>,

    /// Directory holding bucket directories, for the fs backend.
    pub blob_root: String,

    /// Engine tuning; `cascade.bucket` names the media bucket.
    pub cascade: CascadeConfig,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            None
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cascade_defaults = CascadeConfig::default();

        let cascade = CascadeConfig {
            bucket: std::env::var("BLOB_BUCKET").unwrap_or(cascade_defaults.bucket),
            max_batch_size: env_parse("BLOB_BATCH_SIZE")
                .unwrap_or(cascade_defaults.max_batch_size),
            blob_concurrency: env_parse("BLOB_CONCURRENCY")
                .unwrap_or(cascade_defaults.blob_concurrency),
            record_concurrency: env_parse("RECORD_DELETE_CONCURRENCY")
                .unwrap_or(cascade_defaults.record_concurrency),
            roster_update_attempts: env_parse("ROSTER_UPDATE_ATTEMPTS")
                .unwrap_or(cascade_defaults.roster_update_attempts),
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            blob_backend: env_parse("BLOB_BACKEND").unwrap_or(defaults.blob_backend),
            blob_gateway_url: std::env::var("BLOB_GATEWAY_URL").ok(),
            blob_gateway_token: std::env::var("BLOB_GATEWAY_TOKEN").ok(),
            blob_root: std::env::var("BLOB_ROOT").unwrap_or(defaults.blob_root),
            cascade,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/classroom".into(),
            service_api_key: None,
            blob_backend: BlobBackend::Http,
            blob_gateway_url: None,
            blob_gateway_token: None,
            blob_root: "/data/blobs".into(),
            cascade: CascadeConfig::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
