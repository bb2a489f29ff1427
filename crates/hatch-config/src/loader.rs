// SPDX-FileCopyrightText: 2026 Hatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered config loading with Figment.
//!
//! Lookup order: `./hatch.toml` > `~/.config/hatch/hatch.toml` > `/etc/hatch/hatch.toml`,
//! with `HATCH_*` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::HatchConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/hatch/hatch.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_PATH: &str = "hatch.toml";

/// Section prefixes recognised in environment variable names, most specific first.
const ENV_SECTIONS: &[(&str, &str)] = &[
    ("delivery_sms_", "delivery.sms."),
    ("delivery_email_", "delivery.email."),
    ("delivery_", "delivery."),
    ("server_", "server."),
    ("storage_", "storage."),
];

/// The user's XDG config file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("hatch").join("hatch.toml"))
}

/// Build the full layered Figment without extracting it.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/hatch/hatch.toml`
/// 3. `~/.config/hatch/hatch.toml`
/// 4. `./hatch.toml`
/// 5. `HATCH_*` environment variables
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HatchConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy.
pub fn load_config() -> Result<HatchConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<HatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HatchConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string over the defaults. No env lookup.
pub fn load_config_from_str(toml_content: &str) -> Result<HatchConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HatchConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Environment provider mapping `HATCH_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `HATCH_DELIVERY_SMS_API_KEY` must become
/// `delivery.sms.api_key`, not `delivery.sms.api.key`.
fn env_provider() -> Env {
    Env::prefixed("HATCH_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

/// Map a lowercased, prefix-stripped env var name to its config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for (prefix, section) in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(prefix) {
            return format!("{section}{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_nested_sections() {
        assert_eq!(map_env_key("delivery_sms_api_key"), "delivery.sms.api_key");
        assert_eq!(
            map_env_key("delivery_email_account_id"),
            "delivery.email.account_id"
        );
        assert_eq!(map_env_key("delivery_max_attempts"), "delivery.max_attempts");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("server_port"), "server.port");
    }

    #[test]
    fn unmapped_keys_pass_through() {
        assert_eq!(map_env_key("verbose"), "verbose");
    }
}
