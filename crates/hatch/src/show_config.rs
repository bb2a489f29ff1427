// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hatch config`: print the effective configuration.

use hatch_config::model::HatchConfig;
use hatch_core::HatchError;

const MASK: &str = "********";

/// Print `config` as TOML with provider API keys masked.
pub fn print_config(config: &HatchConfig) -> Result<(), HatchError> {
    print!("{}", render(config)?);
    Ok(())
}

fn render(config: &HatchConfig) -> Result<String, HatchError> {
    let mut masked = config.clone();
    for provider in [&mut masked.delivery.sms, &mut masked.delivery.email] {
        if provider.api_key.is_some() {
            provider.api_key = Some(MASK.to_string());
        }
    }
    toml::to_string_pretty(&masked)
        .map_err(|e| HatchError::Config(format!("failed to render configuration: {e}")))
}
