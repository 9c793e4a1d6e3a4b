//! Server configuration module
//!
//! Parses and manages portal configuration from YAML files.
//! serde fills in defaults for anything left out; `validate` catches the rest.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Upper bound on `pool_size`; well past what one MySQL server allows per client.
pub const MAX_POOL_SIZE: u32 = 1024;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    // ============================================
    // MySQL Database Configuration
    // ============================================
    pub sql_ip: String,

    #[serde(default = "default_sql_port")]
    pub sql_port: u16,

    pub sql_id: String,
    pub sql_pw: String,

    #[serde(default = "default_sql_db")]
    pub sql_db: String,

    /// Charset of the legacy tables, as an encoding label ("gbk", "gb2312", ...)
    #[serde(default = "default_sql_charset")]
    pub sql_charset: String,

    // ============================================
    // Connection Pool
    // ============================================
    /// Maximum connections checked out at once
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Seconds a request waits for a usable connection, connect included
    #[serde(default = "default_pool_acquire_timeout_secs")]
    pub pool_acquire_timeout_secs: u64,

    /// Idle connections older than this are closed, not reused.
    /// Keep it below the server's `wait_timeout`.
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,

    #[serde(default = "default_pool_max_lifetime_secs")]
    pub pool_max_lifetime_secs: u64,

    // ============================================
    // HTTP Portal
    // ============================================
    #[serde(default = "default_http_ip")]
    pub http_ip: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // ============================================
    // Session Cookie
    // ============================================
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Cookie max-age, also the server-side session lifetime
    #[serde(default = "default_session_max_age_secs")]
    pub session_max_age_secs: u64,

    /// Mark the cookie `Secure` (set when served behind TLS)
    #[serde(default)]
    pub secure_cookie: bool,
}

// ============================================
// Default value functions
// ============================================

fn default_sql_port() -> u16 {
    3306
}

fn default_sql_db() -> String {
    "cgmsv".to_string()
}

fn default_sql_charset() -> String {
    "gbk".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_pool_acquire_timeout_secs() -> u64 {
    10
}

fn default_pool_idle_timeout_secs() -> u64 {
    600
}

fn default_pool_max_lifetime_secs() -> u64 {
    1800
}

fn default_http_ip() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    3000
}

fn default_session_cookie() -> String {
    "cg_session".to_string()
}

fn default_session_max_age_secs() -> u64 {
    7 * 24 * 60 * 60
}

impl ServerConfig {
    /// Load configuration from a YAML file
    ///
    /// # Example
    /// ```no_run
    /// use cg_portal::config::ServerConfig;
    ///
    /// let config = ServerConfig::from_file("conf/portal.yaml")
    ///     .expect("Failed to load config");
    /// println!("SQL DB: {}", config.sql_db);
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ServerConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML in {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from a YAML string
    ///
    /// Useful for testing
    pub fn from_str(contents: &str) -> Result<Self> {
        let config: ServerConfig = serde_yaml::from_str(contents)
            .context("Failed to parse YAML")?;

        config.validate()?;

        Ok(config)
    }

    /// Address the portal listens on
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_ip, self.http_port)
    }

    pub fn pool_acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_acquire_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    pub fn pool_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.pool_max_lifetime_secs)
    }

    pub fn session_max_age(&self) -> Duration {
        Duration::from_secs(self.session_max_age_secs)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.sql_ip.is_empty(), "sql_ip cannot be empty");
        anyhow::ensure!(!self.sql_id.is_empty(), "sql_id cannot be empty");
        anyhow::ensure!(!self.sql_db.is_empty(), "sql_db cannot be empty");
        anyhow::ensure!(!self.http_ip.is_empty(), "http_ip cannot be empty");

        anyhow::ensure!(
            (1..=MAX_POOL_SIZE).contains(&self.pool_size),
            "pool_size must be between 1 and {}",
            MAX_POOL_SIZE
        );
        anyhow::ensure!(
            self.pool_acquire_timeout_secs > 0,
            "pool_acquire_timeout_secs must be positive"
        );

        anyhow::ensure!(
            encoding_rs::Encoding::for_label(self.sql_charset.as_bytes()).is_some(),
            "Unknown sql_charset: {}",
            self.sql_charset
        );

        anyhow::ensure!(
            !self.session_cookie.is_empty()
                && self
                    .session_cookie
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
            "Invalid session_cookie name: {}",
            self.session_cookie
        );

        anyhow::ensure!(
            self.session_max_age_secs > 0,
            "session_max_age_secs must be positive"
        );

        Ok(())
    }

    /// Save configuration to a YAML file
    ///
    /// Useful for generating config templates
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(&self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config to {}", path.as_ref().display()))?;

        Ok(())
    }
}
