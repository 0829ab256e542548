//! Sweeper configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the expiry sweeper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    /// Enable/disable the background sweep loop.
    /// Sweeps can still be triggered manually via API when disabled.
    #[serde(default)]
    pub enabled: bool,

    /// How often the background loop runs (seconds).
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Sessions older than this are removed (hours).
    #[serde(default = "default_max_age")]
    pub max_age_hours: u64,
}

fn default_interval() -> u64 {
    3600 // hourly
}

fn default_max_age() -> u64 {
    24
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval(),
            max_age_hours: default_max_age(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SweeperConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.max_age_hours, 24);
    }

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
            enabled = true
        "#;
        let config: SweeperConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.interval_secs, 3600);
        assert_eq!(config.max_age_hours, 24);
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
            enabled = true
            interval_secs = 600
            max_age_hours = 48
        "#;
        let config: SweeperConfig = toml::from_str(toml).unwrap();
        assert!(config.enabled);
        assert_eq!(config.interval_secs, 600);
        assert_eq!(config.max_age_hours, 48);
    }
}
