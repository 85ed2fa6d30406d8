//! Process-wide switches controlling scope capture.
//!
//! [`ScopeConfig`] is shared by every request thread and read at the moment
//! an ops-log entry is written, so a toggle takes effect on the next entry
//! without rebuilding any decorator.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_OPS_LOG: &str = "SCOPE_AUDIT_OPS_LOG";
const ENV_SCOPE_ENABLED: &str = "SCOPE_AUDIT_SCOPE_ENABLED";
const ENV_INCLUDE_NAMES: &str = "SCOPE_AUDIT_INCLUDE_NAMES";
const ENV_INCLUDE_ROLES: &str = "SCOPE_AUDIT_INCLUDE_ROLES";

/// A consistent snapshot of the four scope-logging switches.
///
/// Defaults are privacy-first: nothing is logged and names are redacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeLogSettings {
    /// Global ops-log gate
    pub ops_log_enabled: bool,
    /// Scope capture feature gate
    pub scope_enabled: bool,
    /// Disclose human-readable names
    pub include_names: bool,
    /// Disclose role names
    pub include_roles: bool,
}

impl Default for ScopeLogSettings {
    fn default() -> Self {
        Self {
            ops_log_enabled: false,
            scope_enabled: false,
            include_names: false,
            include_roles: true,
        }
    }
}

impl ScopeLogSettings {
    /// Reads the switches from the process environment.
    ///
    /// Unset variables keep their default. Accepted values are
    /// `1/0`, `true/false`, `yes/no` and `on/off` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first variable that is set
    /// to something else.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let flag = |key: &'static str, default: bool| match lookup(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid(key)),
        };

        Ok(Self {
            ops_log_enabled: flag(ENV_OPS_LOG, defaults.ops_log_enabled)?,
            scope_enabled: flag(ENV_SCOPE_ENABLED, defaults.scope_enabled)?,
            include_names: flag(ENV_INCLUDE_NAMES, defaults.include_names)?,
            include_roles: flag(ENV_INCLUDE_ROLES, defaults.include_roles)?,
        })
    }

    /// Returns true if both the ops-log gate and the scope gate are open.
    pub fn capture_enabled(&self) -> bool {
        self.ops_log_enabled && self.scope_enabled
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Shared, runtime-togglable configuration handle.
///
/// Typically held as `Arc<ScopeConfig>`. Reads take a read lock and return
/// a copy, so a reader never observes a half-applied update.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use scope_audit::{ScopeConfig, ScopeLogSettings};
///
/// let config = Arc::new(ScopeConfig::new(ScopeLogSettings::default()));
/// assert!(!config.snapshot().capture_enabled());
///
/// config.set_ops_log_enabled(true);
/// config.set_scope_enabled(true);
/// assert!(config.snapshot().capture_enabled());
/// ```
#[derive(Debug, Default)]
pub struct ScopeConfig {
    settings: RwLock<ScopeLogSettings>,
}

impl ScopeConfig {
    /// Creates a handle holding `settings`.
    pub fn new(settings: ScopeLogSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Returns a consistent copy of the current settings.
    pub fn snapshot(&self) -> ScopeLogSettings {
        *self.settings.read()
    }

    /// Replaces all settings at once.
    pub fn update(&self, settings: ScopeLogSettings) {
        *self.settings.write() = settings;
        tracing::debug!(?settings, "scope logging settings updated");
    }

    /// Toggles the global ops-log gate.
    pub fn set_ops_log_enabled(&self, enabled: bool) {
        self.settings.write().ops_log_enabled = enabled;
    }

    /// Toggles the scope capture gate.
    pub fn set_scope_enabled(&self, enabled: bool) {
        self.settings.write().scope_enabled = enabled;
    }

    /// Toggles name disclosure.
    pub fn set_include_names(&self, include: bool) {
        self.settings.write().include_names = include;
    }

    /// Toggles role disclosure.
    pub fn set_include_roles(&self, include: bool) {
        self.settings.write().include_roles = include;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_privacy_first() {
        let settings = ScopeLogSettings::default();

        assert!(!settings.ops_log_enabled);
        assert!(!settings.scope_enabled);
        assert!(!settings.include_names);
        assert!(settings.include_roles);
        assert!(!settings.capture_enabled());
    }

    #[test]
    fn lookup_overrides_defaults() {
        let settings = ScopeLogSettings::from_lookup(lookup(&[
            (ENV_OPS_LOG, "true"),
            (ENV_SCOPE_ENABLED, "1"),
            (ENV_INCLUDE_NAMES, "Yes"),
            (ENV_INCLUDE_ROLES, "off"),
        ]))
        .expect("valid settings");

        assert!(settings.capture_enabled());
        assert!(settings.include_names);
        assert!(!settings.include_roles);
    }

    #[test]
    fn unset_variables_keep_defaults() {
        let settings = ScopeLogSettings::from_lookup(lookup(&[])).expect("valid settings");
        assert_eq!(settings, ScopeLogSettings::default());
    }

    #[test]
    fn garbage_value_is_rejected_with_its_key() {
        let result = ScopeLogSettings::from_lookup(lookup(&[(ENV_INCLUDE_NAMES, "maybe")]));
        assert_eq!(result, Err(ConfigError::Invalid(ENV_INCLUDE_NAMES)));
    }

    #[test]
    fn settings_deserialize_with_missing_keys() {
        let settings: ScopeLogSettings =
            serde_json::from_str(r#"{"ops_log_enabled": true}"#).expect("valid json");

        assert!(settings.ops_log_enabled);
        assert!(!settings.scope_enabled);
        assert!(settings.include_roles);
    }

    #[test]
    fn setters_are_visible_in_next_snapshot() {
        let config = ScopeConfig::default();
        config.set_include_names(true);
        config.set_include_roles(false);

        let snapshot = config.snapshot();
        assert!(snapshot.include_names);
        assert!(!snapshot.include_roles);
    }

    #[test]
    fn update_replaces_everything() {
        let config = ScopeConfig::default();
        let settings = ScopeLogSettings {
            ops_log_enabled: true,
            scope_enabled: true,
            include_names: true,
            include_roles: false,
        };
        config.update(settings);

        assert_eq!(config.snapshot(), settings);
    }
}
