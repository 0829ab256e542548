//! Quota ledger types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for quota operations.
#[derive(Debug, Error)]
pub enum QuotaError {
    /// Database error.
    #[error("quota database error: {0}")]
    Database(String),
}

/// Monthly admission limits per plan tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuotaConfig {
    /// Separations allowed per calendar month on the standard plan.
    #[serde(default = "default_monthly_limit")]
    pub monthly_limit: u32,
    /// Separations allowed per calendar month on the premium plan.
    #[serde(default = "default_premium_monthly_limit")]
    pub premium_monthly_limit: u32,
}

fn default_monthly_limit() -> u32 {
    10
}

fn default_premium_monthly_limit() -> u32 {
    100
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            monthly_limit: default_monthly_limit(),
            premium_monthly_limit: default_premium_monthly_limit(),
        }
    }
}

/// Plan tier a user is billed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Standard,
    Premium,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Standard => "standard",
            PlanTier::Premium => "premium",
        }
    }
}

/// Outcome of an admission check.
///
/// On an allowed admission `used` already includes the job being admitted.
/// On a denial the counter is untouched and `used` is the current count.
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionDecision {
    pub allowed: bool,
    pub used: u32,
    pub limit: u32,
    pub is_premium: bool,
}

/// Snapshot of a user's consumption for one calendar month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageReport {
    pub current_usage: u32,
    pub monthly_limit: u32,
    pub remaining: u32,
    pub can_process: bool,
    pub is_premium: bool,
    /// Month key in `YYYY-MM` form (UTC).
    pub month: String,
}

/// Trait for quota ledger backends.
///
/// Counters are keyed on (user, calendar month in UTC). An admission check
/// and its increment happen as one step so that concurrent callers racing
/// for the last slot of the month cannot both win.
pub trait QuotaLedger: Send + Sync {
    /// Admit one separation for the user if the month's limit allows it,
    /// incrementing the counter on success. A denied check never mutates.
    fn check_and_admit(&self, user_id: &str) -> Result<AdmissionDecision, QuotaError>;

    /// Report the user's consumption for the current month.
    fn usage(&self, user_id: &str) -> Result<UsageReport, QuotaError>;

    /// Set the user's plan tier.
    fn set_plan(&self, user_id: &str, tier: PlanTier) -> Result<(), QuotaError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_config_defaults() {
        let config = QuotaConfig::default();
        assert_eq!(config.monthly_limit, 10);
        assert_eq!(config.premium_monthly_limit, 100);
    }

    #[test]
    fn test_quota_config_from_toml_with_defaults() {
        let config: QuotaConfig = toml::from_str("").unwrap();
        assert_eq!(config, QuotaConfig::default());
    }

    #[test]
    fn test_quota_config_from_toml_overrides() {
        let config: QuotaConfig = toml::from_str(
            r#"
            monthly_limit = 3
            premium_monthly_limit = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.monthly_limit, 3);
        assert_eq!(config.premium_monthly_limit, 30);
    }

    #[test]
    fn test_plan_tier_serde() {
        assert_eq!(serde_json::to_string(&PlanTier::Premium).unwrap(), "\"premium\"");
        let tier: PlanTier = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(tier, PlanTier::Standard);
    }

    #[test]
    fn test_plan_tier_as_str() {
        assert_eq!(PlanTier::Standard.as_str(), "standard");
        assert_eq!(PlanTier::Premium.as_str(), "premium");
    }
}
