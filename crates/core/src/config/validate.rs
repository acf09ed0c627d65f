use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Replay queue retains fewer events than its capacity
/// - Transport buffer can hold a full replay
/// - Upload limit and extensions are usable
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let hub = &config.hub;
    if hub.queue_capacity == 0 {
        return Err(ConfigError::ValidationError(
            "hub.queue_capacity must be greater than 0".to_string(),
        ));
    }
    if hub.overflow_retain == 0 || hub.overflow_retain > hub.queue_capacity {
        return Err(ConfigError::ValidationError(format!(
            "hub.overflow_retain must be between 1 and queue_capacity ({})",
            hub.queue_capacity
        )));
    }
    if hub.transport_buffer < hub.queue_capacity {
        return Err(ConfigError::ValidationError(format!(
            "hub.transport_buffer must be at least queue_capacity ({})",
            hub.queue_capacity
        )));
    }
    if hub.heartbeat_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "hub.heartbeat_interval_secs cannot be 0".to_string(),
        ));
    }

    if config.upload.max_file_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_file_size_bytes cannot be 0".to_string(),
        ));
    }
    if config.upload.allowed_extensions.is_empty() {
        return Err(ConfigError::ValidationError(
            "upload.allowed_extensions cannot be empty".to_string(),
        ));
    }

    if config.orchestrator.result_ttl_secs > 0 && config.orchestrator.reap_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.reap_interval_secs cannot be 0 when result_ttl_secs is set".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_retain_above_capacity_fails() {
        let mut config = Config::default();
        config.hub.queue_capacity = 10;
        config.hub.overflow_retain = 11;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_buffer_smaller_than_replay_fails() {
        let mut config = Config::default();
        config.hub.transport_buffer = config.hub.queue_capacity - 1;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));

        config.hub.transport_buffer = config.hub.queue_capacity;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_extensions_fails() {
        let mut config = Config::default();
        config.upload.allowed_extensions.clear();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_ttl_without_interval_fails() {
        let mut config = Config::default();
        config.orchestrator.result_ttl_secs = 600;
        config.orchestrator.reap_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
