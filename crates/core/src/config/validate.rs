use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Token auth has at least one non-empty token entry
/// - Worker URL is present and http(s)
/// - Quota limits are nonzero and premium >= standard
/// - Poll interval is nonzero and below the separation budget
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Auth validation
    if config.auth.method == AuthMethod::Token {
        if config.auth.tokens.is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.tokens cannot be empty when auth.method = \"token\"".to_string(),
            ));
        }
        for entry in &config.auth.tokens {
            if entry.token.is_empty() || entry.user_id.is_empty() {
                return Err(ConfigError::ValidationError(
                    "auth.tokens entries require a non-empty token and user_id".to_string(),
                ));
            }
        }
    }

    // Worker validation
    if config.worker.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "worker.url is required".to_string(),
        ));
    }
    if !config.worker.url.starts_with("http://") && !config.worker.url.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "worker.url must be http(s), got: {}",
            config.worker.url
        )));
    }

    // Quota validation
    if config.quota.monthly_limit == 0 {
        return Err(ConfigError::ValidationError(
            "quota.monthly_limit cannot be 0".to_string(),
        ));
    }
    if config.quota.premium_monthly_limit < config.quota.monthly_limit {
        return Err(ConfigError::ValidationError(
            "quota.premium_monthly_limit cannot be below quota.monthly_limit".to_string(),
        ));
    }

    // Orchestrator validation
    if config.orchestrator.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.poll_interval_secs cannot be 0".to_string(),
        ));
    }
    if config.orchestrator.poll_interval_secs >= config.orchestrator.separation_timeout_secs {
        return Err(ConfigError::ValidationError(
            "orchestrator.poll_interval_secs must be below separation_timeout_secs".to_string(),
        ));
    }

    // Sweeper validation
    if config.sweeper.enabled && config.sweeper.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "sweeper.interval_secs cannot be 0 when the sweeper is enabled".to_string(),
        ));
    }

    Ok(())
}
