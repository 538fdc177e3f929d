//! Bridge configuration: where claim records and fetchable documents live.

use std::env;
use std::path::PathBuf;

use crate::error::{BridgeError, BridgeResult};

pub const ENV_STORE_PATH: &str = "CLAIMS_SIM_STORE_PATH";
pub const ENV_DOCUMENT_DIR: &str = "CLAIMS_SIM_DOCUMENT_DIR";
pub const ENV_FETCH_COLLECTION: &str = "ELIGIBILITY_FETCH_COLLECTION";
pub const ENV_SEED_ON_START: &str = "CLAIMS_SIM_SEED_ON_START";

/// Configuration for the collaborators around the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Path to the claim tracking database (SQLite)
    pub store_path: PathBuf,
    /// Directory holding `<collection>.json` document exports
    pub document_dir: PathBuf,
    /// Collection used by eligibility fetches when none is given
    pub fetch_collection: Option<String>,
    /// Whether the simulator is seeded at startup
    pub seed_on_start: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./var/data/claim_store.db"),
            document_dir: PathBuf::from("./var/documents"),
            fetch_collection: None,
            seed_on_start: true,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by any of the `CLAIMS_SIM_*` variables that are set.
    pub fn from_env() -> BridgeResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> BridgeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let present = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(path) = present(ENV_STORE_PATH) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(dir) = present(ENV_DOCUMENT_DIR) {
            config.document_dir = PathBuf::from(dir);
        }
        config.fetch_collection = present(ENV_FETCH_COLLECTION);
        if let Some(flag) = present(ENV_SEED_ON_START) {
            config.seed_on_start = parse_flag(&flag)
                .ok_or_else(|| BridgeError::Config(format!("{} must be a boolean, got '{}'", ENV_SEED_ON_START, flag)))?;
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = BridgeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert!(config.seed_on_start);
    }

    #[test]
    fn test_env_overrides() {
        let config = BridgeConfig::from_lookup(lookup(&[
            (ENV_STORE_PATH, "/tmp/claims.db"),
            (ENV_FETCH_COLLECTION, " members "),
            (ENV_SEED_ON_START, "no"),
        ]))
        .unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/claims.db"));
        assert_eq!(config.fetch_collection.as_deref(), Some("members"));
        assert!(!config.seed_on_start);
    }

    #[test]
    fn test_invalid_flag_rejected() {
        let err = BridgeConfig::from_lookup(lookup(&[(ENV_SEED_ON_START, "maybe")])).unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }
}
