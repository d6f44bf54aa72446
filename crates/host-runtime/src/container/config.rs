//! # Host Configuration
//!
//! Startup configuration read from the environment.
//!
//! | Variable | Format | Effect |
//! |----------|--------|--------|
//! | `HOST_ACTIVATION` | `eager` or `lazy` | Initial activation policy (default `lazy`) |
//! | `HOST_CAPABILITIES` | `id[:priority],...` | Capabilities added at startup |
//! | `HOST_SYSTEM_MODULES` | free text | Sets `org.jboss.osgi.system.modules` |
//! | `HOST_SYSTEM_MODULES_EXTRA` | free text | Sets `org.jboss.osgi.system.modules.extra` |
//! | `HOST_PROPERTIES` | `key=value,...` | Extra properties, stored as JSON strings |

use serde_json::Value;
use subsystem_state::{
    Activation, Capability, DEFAULT_ACTIVATION, PROP_SYSTEM_MODULES, PROP_SYSTEM_MODULES_EXTRA,
};
use thiserror::Error;

/// Environment variable selecting the activation policy.
pub const ENV_ACTIVATION: &str = "HOST_ACTIVATION";
/// Environment variable listing startup capabilities.
pub const ENV_CAPABILITIES: &str = "HOST_CAPABILITIES";
/// Environment variable for the system modules property.
pub const ENV_SYSTEM_MODULES: &str = "HOST_SYSTEM_MODULES";
/// Environment variable for the extra system modules property.
pub const ENV_SYSTEM_MODULES_EXTRA: &str = "HOST_SYSTEM_MODULES_EXTRA";
/// Environment variable listing extra properties.
pub const ENV_PROPERTIES: &str = "HOST_PROPERTIES";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `HOST_ACTIVATION` is neither `eager` nor `lazy`.
    #[error("Invalid activation policy: {0}")]
    InvalidActivation(String),

    /// A `HOST_CAPABILITIES` entry could not be parsed.
    #[error("Invalid capability entry '{entry}': {reason}")]
    InvalidCapability {
        /// The rejected entry.
        entry: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A `HOST_PROPERTIES` entry is not `key=value`.
    #[error("Invalid property entry '{0}': expected key=value")]
    InvalidProperty(String),
}

/// Startup configuration of the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Activation policy the state is created with.
    pub activation: Activation,
    /// Capabilities added in order at startup.
    pub capabilities: Vec<Capability>,
    /// Properties set in order at startup.
    pub properties: Vec<(String, Value)>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            activation: DEFAULT_ACTIVATION,
            capabilities: Vec::new(),
            properties: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Unset variables keep their defaults. System module properties come
    /// before `HOST_PROPERTIES` entries.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_ACTIVATION) {
            config.activation = raw
                .parse()
                .map_err(|_| ConfigError::InvalidActivation(raw.clone()))?;
        }

        if let Some(raw) = lookup(ENV_CAPABILITIES) {
            config.capabilities = parse_capabilities(&raw)?;
        }

        if let Some(modules) = lookup(ENV_SYSTEM_MODULES) {
            config
                .properties
                .push((PROP_SYSTEM_MODULES.to_string(), Value::String(modules)));
        }
        if let Some(extra) = lookup(ENV_SYSTEM_MODULES_EXTRA) {
            config
                .properties
                .push((PROP_SYSTEM_MODULES_EXTRA.to_string(), Value::String(extra)));
        }

        if let Some(raw) = lookup(ENV_PROPERTIES) {
            config.properties.extend(parse_properties(&raw)?);
        }

        Ok(config)
    }
}

/// Parse a comma-separated `id[:priority]` list. Blank entries are skipped.
pub fn parse_capabilities(raw: &str) -> Result<Vec<Capability>, ConfigError> {
    entries(raw)
        .map(|entry| {
            let invalid = |reason: String| ConfigError::InvalidCapability {
                entry: entry.to_string(),
                reason,
            };

            let (identifier, priority) = match entry.split_once(':') {
                Some((id, level)) => {
                    let level = level
                        .trim()
                        .parse::<i32>()
                        .map_err(|e| invalid(format!("bad priority: {e}")))?;
                    (id.trim(), Some(level))
                }
                None => (entry, None),
            };

            Capability::new(identifier, priority).map_err(|e| invalid(e.to_string()))
        })
        .collect()
}

/// Parse a comma-separated `key=value` list. Blank entries are skipped.
pub fn parse_properties(raw: &str) -> Result<Vec<(String, Value)>, ConfigError> {
    entries(raw)
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok((
                key.trim().to_string(),
                Value::String(value.trim().to_string()),
            )),
            _ => Err(ConfigError::InvalidProperty(entry.to_string())),
        })
        .collect()
}

fn entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = HostConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.activation, Activation::Lazy);
    }

    #[test]
    fn test_activation_is_case_insensitive() {
        let config = HostConfig::from_lookup(lookup(&[(ENV_ACTIVATION, "Eager")])).unwrap();
        assert_eq!(config.activation, Activation::Eager);
    }

    #[test]
    fn test_invalid_activation() {
        let result = HostConfig::from_lookup(lookup(&[(ENV_ACTIVATION, "sometimes")]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidActivation("sometimes".to_string()))
        );
    }

    #[test]
    fn test_capabilities_with_and_without_priority() {
        let config = HostConfig::from_lookup(lookup(&[(
            ENV_CAPABILITIES,
            "org.acme.api:3, org.acme.impl ,,",
        )]))
        .unwrap();

        assert_eq!(config.capabilities.len(), 2);
        assert_eq!(config.capabilities[0].identifier(), "org.acme.api");
        assert_eq!(config.capabilities[0].priority(), Some(3));
        assert_eq!(config.capabilities[1].identifier(), "org.acme.impl");
        assert_eq!(config.capabilities[1].priority(), None);
    }

    #[test]
    fn test_capability_bad_priority() {
        let result = parse_capabilities("org.acme.api:high");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidCapability { entry, .. }) if entry == "org.acme.api:high"
        ));
    }

    #[test]
    fn test_capability_empty_identifier() {
        assert!(matches!(
            parse_capabilities(":4"),
            Err(ConfigError::InvalidCapability { .. })
        ));
    }

    #[test]
    fn test_system_modules_map_to_well_known_properties() {
        let config = HostConfig::from_lookup(lookup(&[
            (ENV_SYSTEM_MODULES, "javax.api,org.slf4j"),
            (ENV_SYSTEM_MODULES_EXTRA, "org.acme"),
            (ENV_PROPERTIES, "a=1, b = two"),
        ]))
        .unwrap();

        let names: Vec<&str> = config.properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            names,
            vec![PROP_SYSTEM_MODULES, PROP_SYSTEM_MODULES_EXTRA, "a", "b"]
        );
        assert_eq!(config.properties[0].1, Value::from("javax.api,org.slf4j"));
        assert_eq!(config.properties[3].1, Value::from("two"));
    }

    #[test]
    fn test_property_without_separator() {
        assert_eq!(
            parse_properties("a=1,broken"),
            Err(ConfigError::InvalidProperty("broken".to_string()))
        );
        assert_eq!(
            parse_properties("=value"),
            Err(ConfigError::InvalidProperty("=value".to_string()))
        );
    }

    #[test]
    fn test_property_value_may_contain_separator() {
        let props = parse_properties("url=a=b").unwrap();
        assert_eq!(props, vec![("url".to_string(), Value::from("a=b"))]);
    }
}
