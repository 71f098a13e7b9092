use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;
use zeroize::Zeroizing;

/// Application-level constants
pub const APP_NAME: &str = "EduPulse";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Salt used when none is configured. Only acceptable for local development.
const DEV_SECRET_SALT: &str = "edupulse-salt-change-in-prod";

const DEFAULT_BIND: &str = "0.0.0.0:8000";
const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8000",
    "http://127.0.0.1:5173",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid bind address '{value}': {reason}")]
    InvalidBind { value: String, reason: String },

    #[error("Cannot determine home directory; set EDUPULSE_DATA_DIR")]
    NoDataDir,

    #[error("No secret salt configured; set EDUPULSE_SECRET_SALT")]
    MissingSalt,
}

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,edupulse_lib=debug"
    } else {
        "info"
    }
}

/// Default data directory: ~/EduPulse/
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

// ═══════════════════════════════════════════════════════════
// Secret salt
// ═══════════════════════════════════════════════════════════

/// Process-wide salt for the identity hasher.
///
/// Rotating the salt breaks the link between future submissions and past
/// ones for the same identifier: returning teachers are treated as new and
/// asked for consent again.
#[derive(Clone)]
pub struct SecretSalt(Zeroizing<String>);

impl SecretSalt {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SecretSalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretSalt(<redacted>)")
    }
}

/// The configured salt, or the development salt in debug builds.
/// Release builds refuse to start without one.
fn resolve_salt(
    configured: Option<String>,
    allow_dev_salt: bool,
) -> Result<SecretSalt, ConfigError> {
    match configured {
        Some(salt) => Ok(SecretSalt::new(salt)),
        None if allow_dev_salt => {
            tracing::warn!("No secret salt configured; using the development salt");
            Ok(SecretSalt::new(DEV_SECRET_SALT))
        }
        None => Err(ConfigError::MissingSalt),
    }
}

// ═══════════════════════════════════════════════════════════
// Runtime configuration
// ═══════════════════════════════════════════════════════════

/// Service configuration, loaded once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub secret_salt: SecretSalt,
    pub db_path: PathBuf,
    pub exports_dir: PathBuf,
    pub media_dir: PathBuf,
    /// Optional JSON template table. `None` means built-in templates.
    pub templates_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    pub base_url: String,
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
}

impl Config {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (testable without
    /// touching the real environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret_salt = resolve_salt(
            get("EDUPULSE_SECRET_SALT").or_else(|| get("SECRET_SALT")),
            cfg!(debug_assertions),
        )?;

        let data_dir = match get("EDUPULSE_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir().ok_or(ConfigError::NoDataDir)?,
        };

        let db_path = get("EDUPULSE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("edupulse.db"));
        let exports_dir = get("EDUPULSE_EXPORTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("exports"));
        let media_dir = get("EDUPULSE_MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("media"));
        let templates_path = get("EDUPULSE_TEMPLATES_PATH").map(PathBuf::from);

        let bind_raw = get("EDUPULSE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidBind {
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let base_url = get("EDUPULSE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let frontend_url = get("EDUPULSE_FRONTEND_URL")
            .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_origins = match get("EDUPULSE_CORS_ORIGINS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self {
            secret_salt,
            db_path,
            exports_dir,
            media_dir,
            templates_path,
            bind_addr,
            base_url,
            frontend_url,
            cors_origins,
        })
    }

    /// Configuration rooted in a scratch directory (tests, local runs).
    pub fn for_data_dir(data_dir: impl Into<PathBuf>, salt: &str) -> Self {
        let data_dir = data_dir.into();
        Self {
            secret_salt: SecretSalt::new(salt),
            db_path: data_dir.join("edupulse.db"),
            exports_dir: data_dir.join("exports"),
            media_dir: data_dir.join("media"),
            templates_path: None,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            base_url: DEFAULT_BASE_URL.to_string(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
