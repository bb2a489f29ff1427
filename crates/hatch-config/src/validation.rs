// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::{HatchConfig, ProviderConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure rather than stopping at the first.
pub fn validate_config(config: &HatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        fail("server.bind_address must not be empty".to_string());
    } else {
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        fail(format!(
            "server.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.server.log_level
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let delivery = &config.delivery;
    if delivery.max_attempts < 1 {
        fail("delivery.max_attempts must be at least 1".to_string());
    }
    if delivery.max_backoff_ms < delivery.base_backoff_ms {
        fail(format!(
            "delivery.max_backoff_ms ({}) must not be less than delivery.base_backoff_ms ({})",
            delivery.max_backoff_ms, delivery.base_backoff_ms
        ));
    }
    if delivery.request_timeout_secs == 0 {
        fail("delivery.request_timeout_secs must be greater than 0".to_string());
    }

    for (name, provider) in [("sms", &delivery.sms), ("email", &delivery.email)] {
        if let Some(message) = check_endpoint(provider) {
            fail(format!("delivery.{name}.endpoint {message}"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(provider: &ProviderConfig) -> Option<String> {
    let endpoint = provider.endpoint.trim();
    if endpoint.is_empty() {
        return Some("must not be empty".to_string());
    }
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Some(format!("`{endpoint}` must be an http:// or https:// URL"));
    }
    None
}
