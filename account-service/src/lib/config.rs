use std::env;
use std::time::Duration;

use auth::TokenSettings;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Token, lockout and hashing settings.
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub access_token: TokenConfig,
    pub refresh_token: TokenConfig,
    /// `meta.authErrors` value at which an account counts as blocked.
    #[serde(default = "default_auth_errors_limit")]
    pub auth_errors_limit: u32,
    /// Count password mismatches into `meta.authErrors` (and reset on success).
    #[serde(default)]
    pub track_failed_logins: bool,
    #[serde(default = "default_sweep_secs")]
    pub refresh_cache_sweep_secs: u64,
    #[serde(default)]
    pub password: PasswordConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub expires_in_secs: i64,
}

/// Argon2 cost parameters for newly hashed passwords.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Fixed-window limits for the public auth endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub login_max_requests: u32,
    pub refresh_max_requests: u32,
}

fn default_max_connections() -> u32 {
    5
}

fn default_auth_errors_limit() -> u32 {
    5
}

fn default_sweep_secs() -> u64 {
    60
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            login_max_requests: 3,
            refresh_max_requests: 30,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl From<&TokenConfig> for TokenSettings {
    fn from(config: &TokenConfig) -> Self {
        TokenSettings {
            secret: config.secret.clone(),
            expires_in_secs: config.expires_in_secs,
        }
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, AUTH__ACCESS_TOKEN__SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: DATABASE__URL=postgres://... overrides database.url
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        configuration.try_deserialize()
    }
}
