//! CLI configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `TABLESIDE_DATA_DIR` - Directory holding stored carts (default: .tableside)
//! - `TABLESIDE_PERSIST_DEBOUNCE_MS` - Delay before a cart write (default: 250)
//! - `TABLESIDE_DISCOUNTS_FILE` - JSON array of promotion codes
//! - `TABLESIDE_DISCOUNT_CACHE_TTL_SECS` - Discount lookup cache TTL (default: 300)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Root directory of the file-backed cart storage
    pub data_dir: PathBuf,
    /// Delay between the last mutation and the cart write
    pub persist_debounce: Duration,
    /// Promotion codes file, if any
    pub discounts_file: Option<PathBuf>,
    /// How long discount lookups stay cached
    pub discount_cache_ttl: Duration,
}

impl CliConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(
            lookup("TABLESIDE_DATA_DIR").unwrap_or_else(|| ".tableside".to_string()),
        );
        let persist_debounce =
            Duration::from_millis(parse_or_default(&lookup, "TABLESIDE_PERSIST_DEBOUNCE_MS", 250)?);
        let discounts_file = lookup("TABLESIDE_DISCOUNTS_FILE")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        let discount_cache_ttl = Duration::from_secs(parse_or_default(
            &lookup,
            "TABLESIDE_DISCOUNT_CACHE_TTL_SECS",
            300,
        )?);

        Ok(Self {
            data_dir,
            persist_debounce,
            discounts_file,
            discount_cache_ttl,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a numeric variable, falling back to `default` when unset.
fn parse_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    lookup(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<CliConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CliConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.data_dir, PathBuf::from(".tableside"));
        assert_eq!(config.persist_debounce, Duration::from_millis(250));
        assert_eq!(config.discounts_file, None);
        assert_eq!(config.discount_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("TABLESIDE_DATA_DIR", "/var/lib/tableside"),
            ("TABLESIDE_PERSIST_DEBOUNCE_MS", "0"),
            ("TABLESIDE_DISCOUNTS_FILE", "promos.json"),
            ("TABLESIDE_DISCOUNT_CACHE_TTL_SECS", " 60 "),
        ])
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/tableside"));
        assert_eq!(config.persist_debounce, Duration::ZERO);
        assert_eq!(config.discounts_file, Some(PathBuf::from("promos.json")));
        assert_eq!(config.discount_cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("TABLESIDE_PERSIST_DEBOUNCE_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "TABLESIDE_PERSIST_DEBOUNCE_MS"));
    }

    #[test]
    fn test_empty_discounts_file_is_ignored() {
        let config = config_from(&[("TABLESIDE_DISCOUNTS_FILE", "")]).unwrap();
        assert_eq!(config.discounts_file, None);
    }
}
