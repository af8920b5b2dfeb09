// src/config.rs
// Environment-driven configuration and start-up validation

use crate::catalog::SEPOLIA_CHAIN_ID;
use crate::storage::{StorageMode, DEFAULT_TTL_SECS, MAX_TTL_SECS};
use std::env;
use std::net::SocketAddr;
use tracing::{error, info, warn};

pub const DEFAULT_API_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_SLED_PATH: &str = "./data/lendlink";
pub const DEFAULT_EXPLORER_URL: &str = "https://sepolia.etherscan.io";

/// Runtime configuration for the link service.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_addr: String,
    /// Origin used when printing shareable links.
    pub public_base_url: String,
    pub storage_mode: StorageMode,
    pub sled_path: String,
    pub link_ttl_secs: i64,
    /// Chain the client page insists on before submitting.
    pub chain_id: u64,
    pub explorer_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_addr: DEFAULT_API_ADDR.to_string(),
            public_base_url: DEFAULT_BASE_URL.to_string(),
            storage_mode: StorageMode::Sled,
            sled_path: DEFAULT_SLED_PATH.to_string(),
            link_ttl_secs: DEFAULT_TTL_SECS,
            chain_id: SEPOLIA_CHAIN_ID,
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
        }
    }
}

impl Config {
    /// Read configuration from the process environment, falling back to defaults.
    /// Unparseable numeric values keep the default; `validate_config` reports them.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Self {
            api_addr: env::var("API_ADDR").unwrap_or(defaults.api_addr),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            storage_mode: env::var("STORAGE_MODE")
                .map(|m| StorageMode::from_str(&m))
                .unwrap_or(defaults.storage_mode),
            sled_path: env::var("SLED_PATH").unwrap_or(defaults.sled_path),
            link_ttl_secs: env::var("LINK_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(defaults.link_ttl_secs),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.chain_id),
            explorer_url: env::var("EXPLORER_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.explorer_url),
        }
    }

    /// Link lifetime, clamped to `0..=MAX_TTL_SECS`; `validate_config` rejects values outside it.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.link_ttl_secs.clamp(0, MAX_TTL_SECS))
    }

    /// Link lifetime in whole minutes, as shown to users (never below 1).
    pub fn ttl_minutes(&self) -> i64 {
        std::cmp::max(self.link_ttl_secs / 60, 1)
    }

    /// Shareable page URL for a stored link.
    pub fn page_url(&self, id: &str) -> String {
        format!("{}/transaction/{}", self.public_base_url, id)
    }
}

/// Validation result for configuration checks
pub struct ConfigValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ConfigValidation {
    fn new() -> Self {
        Self {
            valid: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn add_warning(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    fn add_error(&mut self, msg: String) {
        self.errors.push(msg);
        self.valid = false;
    }

    pub fn print_summary(&self) {
        if !self.warnings.is_empty() {
            warn!("⚠️  Configuration Warnings:");
            for w in &self.warnings {
                warn!("   - {}", w);
            }
        }

        if !self.errors.is_empty() {
            error!("❌ Configuration Errors:");
            for e in &self.errors {
                error!("   - {}", e);
            }
        }

        if self.valid && self.warnings.is_empty() {
            info!("✅ Configuration validation passed");
        }
    }
}

/// Validate the effective configuration at startup
pub fn validate_config(config: &Config) -> ConfigValidation {
    let mut validation = ConfigValidation::new();

    info!("🔍 Validating configuration...");

    validate_addresses(config, &mut validation);
    validate_storage(config, &mut validation);
    validate_links(config, &mut validation);
    check_raw_env(&mut validation);

    validation
}

fn validate_addresses(config: &Config, validation: &mut ConfigValidation) {
    if config.api_addr.parse::<SocketAddr>().is_err() {
        validation.add_error(format!(
            "API_ADDR has invalid format: '{}' (expected IP:PORT)",
            config.api_addr
        ));
    }

    let base = &config.public_base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        validation.add_error(format!(
            "PUBLIC_BASE_URL must start with http:// or https:// (got '{}')",
            base
        ));
    } else if base.starts_with("http://localhost") || base.starts_with("http://127.0.0.1") {
        validation.add_warning(format!(
            "PUBLIC_BASE_URL is '{}' - generated links only work on this machine",
            base
        ));
    }
}

fn validate_storage(config: &Config, validation: &mut ConfigValidation) {
    match config.storage_mode {
        StorageMode::Memory => validation.add_warning(
            "STORAGE_MODE=memory - links are lost whenever the process restarts".into(),
        ),
        StorageMode::Sled => {
            if config.sled_path.trim().is_empty() {
                validation.add_error("SLED_PATH must not be empty".into());
            } else {
                info!("✓ sled storage at {}", config.sled_path);
            }
        }
    }
}

fn validate_links(config: &Config, validation: &mut ConfigValidation) {
    if config.link_ttl_secs <= 0 {
        validation.add_error(format!(
            "LINK_TTL_SECS must be positive (got {})",
            config.link_ttl_secs
        ));
    } else if config.link_ttl_secs > MAX_TTL_SECS {
        validation.add_error(format!(
            "LINK_TTL_SECS must be at most {} (30 days), got {}",
            MAX_TTL_SECS, config.link_ttl_secs
        ));
    } else if config.link_ttl_secs < 60 {
        validation.add_warning(format!(
            "LINK_TTL_SECS is {} - links expire before most users open them",
            config.link_ttl_secs
        ));
    }

    if config.chain_id != SEPOLIA_CHAIN_ID {
        validation.add_warning(format!(
            "CHAIN_ID is {} but the token catalog targets Sepolia ({})",
            config.chain_id, SEPOLIA_CHAIN_ID
        ));
    }
}

/// Values that failed to parse were silently replaced by defaults in `from_env`.
fn check_raw_env(validation: &mut ConfigValidation) {
    if let Ok(v) = env::var("LINK_TTL_SECS") {
        if v.parse::<i64>().is_err() {
            validation.add_error(format!("LINK_TTL_SECS is not an integer: '{}'", v));
        }
    }
    if let Ok(v) = env::var("CHAIN_ID") {
        if v.parse::<u64>().is_err() {
            validation.add_error(format!("CHAIN_ID is not an integer: '{}'", v));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config {
            public_base_url: "https://links.example.org".into(),
            ..Config::default()
        };
        let mut v = ConfigValidation::new();
        validate_addresses(&cfg, &mut v);
        validate_storage(&cfg, &mut v);
        validate_links(&cfg, &mut v);
        assert!(v.valid, "{:?}", v.errors);
        assert!(v.warnings.is_empty(), "{:?}", v.warnings);
    }

    #[test]
    fn test_bad_values_are_errors() {
        let cfg = Config {
            api_addr: "localhost".into(),
            public_base_url: "ftp://nope".into(),
            link_ttl_secs: 0,
            ..Config::default()
        };
        let mut v = ConfigValidation::new();
        validate_addresses(&cfg, &mut v);
        validate_links(&cfg, &mut v);
        assert!(!v.valid);
        assert_eq!(v.errors.len(), 3);
    }

    #[test]
    fn test_oversized_ttl_is_rejected_and_clamped() {
        let cfg = Config {
            link_ttl_secs: 9_223_372_036_854_775,
            ..Config::default()
        };
        let mut v = ConfigValidation::new();
        validate_links(&cfg, &mut v);
        assert!(!v.valid);
        assert!(v.errors[0].contains("at most"), "{:?}", v.errors);
        assert_eq!(cfg.ttl().num_seconds(), MAX_TTL_SECS);

        let cfg = Config {
            link_ttl_secs: MAX_TTL_SECS,
            ..Config::default()
        };
        let mut v = ConfigValidation::new();
        validate_links(&cfg, &mut v);
        assert!(v.valid, "{:?}", v.errors);
    }

    #[test]
    fn test_page_url() {
        let cfg = Config {
            public_base_url: "https://links.example.org".into(),
            ..Config::default()
        };
        assert_eq!(cfg.page_url("abc12345"), "https://links.example.org/transaction/abc12345");
    }
}
