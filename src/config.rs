/*
 * This file is part of cprofan.
 *
 * Copyright (C) 2025 cprofan contributors
 *
 * cprofan is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * cprofan is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with cprofan. If not, see <https://www.gnu.org/licenses/>.
 */

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{channels, paths, usb};
use crate::error::{CproError, Result};
use crate::registry::ChannelKind;

/// Driver settings. Every field has a default, so an empty JSON object
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface: u8,
    pub endpoint_out: u8,
    pub endpoint_in: u8,
    /// Per-transfer timeout in milliseconds
    pub timeout_ms: u64,
    /// Disabled fans report no data instead of their speed
    pub fan_enable_gating: bool,
    /// 0-based fan channels switched off with `fan-enable`
    pub disabled_fans: Vec<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            vendor_id: usb::VENDOR_ID,
            product_id: usb::PRODUCT_ID,
            interface: usb::INTERFACE,
            endpoint_out: usb::ENDPOINT_OUT,
            endpoint_in: usb::ENDPOINT_IN,
            timeout_ms: usb::TIMEOUT.as_millis() as u64,
            fan_enable_gating: true,
            disabled_fans: Vec::new(),
        }
    }
}

impl DriverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn fan_enabled(&self, channel: usize) -> bool {
        !self.disabled_fans.contains(&channel)
    }

    /// Record a fan's enable flag; the list stays sorted and unique
    pub fn set_fan_enabled(&mut self, channel: usize, enabled: bool) -> Result<()> {
        ChannelKind::Fan.check(channel)?;
        self.disabled_fans.retain(|&ch| ch != channel);
        if !enabled {
            self.disabled_fans.push(channel);
            self.disabled_fans.sort_unstable();
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return Path::new(&xdg).join(paths::APP_DIR).join(paths::CONFIG_FILE);
    }
    if let Ok(home) = env::var("HOME") {
        return Path::new(&home)
            .join(".config")
            .join(paths::APP_DIR)
            .join(paths::CONFIG_FILE);
    }
    PathBuf::from(paths::SYSTEM_CONFIG)
}

/// Load and validate the configuration.
///
/// An explicit `path` must exist. Without one, [`config_path`] is tried
/// and a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<DriverConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path(), false),
    };

    if !explicit && !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(DriverConfig::default());
    }

    let data = fs::read_to_string(&path)
        .map_err(|e| CproError::config(format!("cannot read {}: {}", path.display(), e)))?;
    let cfg: DriverConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    debug!(path = %path.display(), "Loaded config");
    Ok(cfg)
}

pub fn validate_config(cfg: &DriverConfig) -> Result<()> {
    if cfg.timeout_ms == 0 {
        return Err(CproError::config("timeout_ms must be greater than 0"));
    }
    if cfg.timeout_ms > usb::MAX_TIMEOUT_MS {
        return Err(CproError::config(format!(
            "timeout_ms {} exceeds maximum of {}",
            cfg.timeout_ms,
            usb::MAX_TIMEOUT_MS
        )));
    }
    if cfg.endpoint_out & usb::ENDPOINT_DIR_IN != 0 {
        return Err(CproError::config(format!(
            "endpoint_out 0x{:02x} is an IN endpoint",
            cfg.endpoint_out
        )));
    }
    if cfg.endpoint_in & usb::ENDPOINT_DIR_IN == 0 {
        return Err(CproError::config(format!(
            "endpoint_in 0x{:02x} is an OUT endpoint",
            cfg.endpoint_in
        )));
    }
    if let Some(&ch) = cfg.disabled_fans.iter().find(|&&ch| ch >= channels::FAN_COUNT) {
        return Err(CproError::config(format!(
            "disabled_fans entry {} is out of range (0-{})",
            ch,
            channels::FAN_COUNT - 1
        )));
    }
    Ok(())
}

pub fn save_config(path: &Path, cfg: &DriverConfig) -> Result<()> {
    validate_config(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_utils::create_temp_json_file;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_defaults() {
        let cfg = DriverConfig::default();
        assert_eq!(cfg.vendor_id, 0x1b1c);
        assert_eq!(cfg.product_id, 0x0c10);
        assert_eq!(cfg.endpoint_out, 0x02);
        assert_eq!(cfg.endpoint_in, 0x81);
        assert_eq!(cfg.timeout(), Duration::from_millis(1000));
        assert!(cfg.fan_enable_gating);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_empty_object_is_defaults() {
        let cfg: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DriverConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let cfg: DriverConfig =
            serde_json::from_str(r#"{ "timeout_ms": 250, "fan_enable_gating": false }"#).unwrap();
        assert_eq!(cfg.timeout_ms, 250);
        assert!(!cfg.fan_enable_gating);
        assert_eq!(cfg.product_id, 0x0c10);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<DriverConfig, _> =
            serde_json::from_str(r#"{ "timeout": 250 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let mut cfg = DriverConfig { timeout_ms: 0, ..DriverConfig::default() };
        assert!(validate_config(&cfg).is_err());
        cfg.timeout_ms = 10_001;
        assert!(validate_config(&cfg).is_err());
        cfg.timeout_ms = 10_000;
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_endpoint_direction() {
        let cfg = DriverConfig { endpoint_out: 0x82, ..DriverConfig::default() };
        assert!(matches!(validate_config(&cfg), Err(CproError::Config(_))));
        let cfg = DriverConfig { endpoint_in: 0x01, ..DriverConfig::default() };
        assert!(matches!(validate_config(&cfg), Err(CproError::Config(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let file = create_temp_json_file(&serde_json::json!({ "timeout_ms": 500 }));
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.timeout_ms, 500);
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = load_config(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, CproError::Config(_)));
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        file.flush().unwrap();
        assert!(matches!(load_config(Some(file.path())), Err(CproError::JsonParse(_))));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let file = create_temp_json_file(&serde_json::json!({ "timeout_ms": 0 }));
        assert!(matches!(load_config(Some(file.path())), Err(CproError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_config_path_with_xdg() {
        env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = config_path();
        assert_eq!(path, PathBuf::from("/custom/config/cprofan/config.json"));
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_config_path_with_home() {
        let saved_home = env::var("HOME").ok();
        env::remove_var("XDG_CONFIG_HOME");
        env::set_var("HOME", "/home/testuser");
        let path = config_path();
        assert_eq!(path, PathBuf::from("/home/testuser/.config/cprofan/config.json"));
        match saved_home {
            Some(h) => env::set_var("HOME", h),
            None => env::remove_var("HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_load_implicit_missing_gives_defaults() {
        let dir = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, DriverConfig::default());
        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_save_then_load_implicit() {
        let dir = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", dir.path());

        let cfg = DriverConfig { timeout_ms: 750, fan_enable_gating: false, ..DriverConfig::default() };
        save_config(&config_path(), &cfg).unwrap();
        assert!(dir.path().join("cprofan").join("config.json").exists());
        assert_eq!(load_config(None).unwrap(), cfg);

        env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    fn test_disabled_fans_validated() {
        let cfg = DriverConfig { disabled_fans: vec![0, 5], ..DriverConfig::default() };
        assert!(validate_config(&cfg).is_ok());
        let cfg = DriverConfig { disabled_fans: vec![6], ..DriverConfig::default() };
        assert!(matches!(validate_config(&cfg), Err(CproError::Config(_))));
    }

    #[test]
    fn test_set_fan_enabled_keeps_list_sorted() {
        let mut cfg = DriverConfig::default();
        cfg.set_fan_enabled(4, false).unwrap();
        cfg.set_fan_enabled(1, false).unwrap();
        cfg.set_fan_enabled(4, false).unwrap();
        assert_eq!(cfg.disabled_fans, vec![1, 4]);
        assert!(!cfg.fan_enabled(1));

        cfg.set_fan_enabled(1, true).unwrap();
        assert_eq!(cfg.disabled_fans, vec![4]);
        assert!(cfg.fan_enabled(1));
        assert!(cfg.set_fan_enabled(6, false).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_disabled_fans_survive_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut cfg = DriverConfig::default();
        cfg.set_fan_enabled(2, false).unwrap();
        save_config(&path, &cfg).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.disabled_fans, vec![2]);
        assert!(!loaded.fan_enabled(2));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let cfg = DriverConfig { timeout_ms: 0, ..DriverConfig::default() };
        assert!(save_config(&dir.path().join("c.json"), &cfg).is_err());
        assert!(!dir.path().join("c.json").exists());
    }
}
