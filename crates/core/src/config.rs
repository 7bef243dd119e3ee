use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("true") | Some("1") | Some("yes") => true,
        Some("false") | Some("0") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub source: SourceConfig,
    pub store: StoreConfig,
    pub sync: SyncConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `LEADSYNC_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("LEADSYNC_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            source: SourceConfig::from_env_profiled(p),
            store: StoreConfig::from_env_profiled(p),
            sync: SyncConfig::from_env_profiled(p),
            client: ClientConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:  {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  source:  name={}, url={}, auth={}",
            self.source.name,
            self.source.api_url.as_deref().unwrap_or("(none)"),
            if self.source.has_credentials() { "basic" } else { "none" }
        );
        tracing::info!(
            "  store:   backend={}, data_dir={}",
            self.store.backend.as_str(),
            self.store.data_dir.display()
        );
        tracing::info!(
            "  sync:    enrichment={}, reset_after={}s, rules={}",
            self.sync.fetch_enrichment,
            self.sync.reset_after_secs,
            self.sync
                .assignment_rules_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in)".to_string())
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Upstream call-center ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Label stamped on imported leads (`source` field and tags).
    pub name: String,
    pub api_url: Option<String>,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

impl SourceConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            name: profiled_env_or(p, "SOURCE_NAME", "ViciDial"),
            api_url: profiled_env_opt(p, "SOURCE_API_URL"),
            username: profiled_env_opt(p, "SOURCE_USERNAME"),
            password: profiled_env_opt(p, "SOURCE_PASSWORD"),
            timeout_secs: profiled_env_u64(p, "SOURCE_TIMEOUT_SECS", 30),
            accept_invalid_certs: profiled_env_bool(p, "SOURCE_ACCEPT_INVALID_CERTS", false),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }

    pub fn is_configured(&self) -> bool {
        self.api_url.is_some()
    }
}

// ── Lead store ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
    Postgres,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Postgres => "postgres",
        }
    }

    fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "memory" => Self::Memory,
            "postgres" | "pg" => Self::Postgres,
            _ => Self::File,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
    #[serde(skip_serializing)]
    pub pg_url: Option<String>,
    pub pg_max_connections: u32,
}

impl StoreConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            backend: StoreBackend::parse(&profiled_env_or(p, "STORE_BACKEND", "file")),
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", "data")),
            pg_url: profiled_env_opt(p, "PG_URL"),
            pg_max_connections: profiled_env_u32(p, "PG_MAX_CONNECTIONS", 5),
        }
    }
}

// ── Sync pipeline ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Fetch per-lead interaction history during full imports.
    pub fetch_enrichment: bool,
    /// Seconds after a finished run before the job resets to idle (0 = never).
    pub reset_after_secs: u64,
    pub assignment_rules_path: Option<PathBuf>,
}

impl SyncConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            fetch_enrichment: profiled_env_bool(p, "SYNC_FETCH_ENRICHMENT", true),
            reset_after_secs: profiled_env_u64(p, "SYNC_RESET_AFTER_SECS", 30),
            assignment_rules_path: profiled_env_opt(p, "ASSIGNMENT_RULES_PATH").map(PathBuf::from),
        }
    }

    pub fn reset_after(&self) -> Option<Duration> {
        (self.reset_after_secs > 0).then(|| Duration::from_secs(self.reset_after_secs))
    }
}

// ── Client (endpoint candidates + polling) ────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Explicitly configured API base; always tried first.
    pub api_url: Option<String>,
    /// Origin the client runs under; used for the host:port and proxy candidates.
    pub origin: String,
    /// Well-known port of the API on the origin host.
    pub api_port: u16,
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    /// Multiplier applied to the interval after each poll (1.0 = fixed).
    pub poll_backoff: f64,
    pub poll_max_interval_ms: u64,
}

impl ClientConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            api_url: profiled_env_opt(p, "LEADSYNC_API_URL"),
            origin: profiled_env_or(p, "LEADSYNC_ORIGIN", "http://localhost"),
            api_port: profiled_env_u16(p, "LEADSYNC_API_PORT", 3001),
            poll_interval_ms: profiled_env_u64(p, "POLL_INTERVAL_MS", 2000),
            poll_max_attempts: profiled_env_u32(p, "POLL_MAX_ATTEMPTS", 600),
            poll_backoff: profiled_env_or(p, "POLL_BACKOFF", "1.0")
                .parse()
                .unwrap_or(1.0),
            poll_max_interval_ms: profiled_env_u64(p, "POLL_MAX_INTERVAL_MS", 10_000),
        }
    }
}
