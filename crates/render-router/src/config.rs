//! Construction-time configuration.
//!
//! Both structs deserialize with defaults for missing fields, so a partial
//! YAML document is enough:
//!
//! ```rust
//! use render_router::config::RenderRouterConfig;
//!
//! let config = RenderRouterConfig::from_yaml(r#"
//! registry:
//!   cache_capacity: 64
//! dispatcher:
//!   debug_mode: true
//! "#).unwrap();
//!
//! assert_eq!(config.registry.cache_capacity, 64);
//! assert_eq!(config.registry.extension, ".html");
//! assert!(config.dispatcher.debug_mode);
//! assert_eq!(config.dispatcher.object_key, "object");
//! ```

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::convention::DEFAULT_EXTENSION;

/// Context key the rendered object is injected under.
pub const DEFAULT_OBJECT_KEY: &str = "object";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Maximum number of cached table lookups.
    pub cache_capacity: usize,
    /// Extension appended to convention paths.
    pub extension: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub debug_mode: bool,
    pub object_key: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            debug_mode: false,
            object_key: DEFAULT_OBJECT_KEY.to_string(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderRouterConfig {
    pub registry: RegistryConfig,
    pub dispatcher: DispatcherConfig,
}

impl RenderRouterConfig {
    /// Parses a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RenderRouterConfig::default();
        assert_eq!(config.registry.cache_capacity, 256);
        assert_eq!(config.registry.extension, ".html");
        assert!(!config.dispatcher.debug_mode);
        assert_eq!(config.dispatcher.object_key, "object");
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = RenderRouterConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RenderRouterConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = RenderRouterConfig::from_yaml("registry:\n  extension: .jinja\n").unwrap();
        assert_eq!(config.registry.extension, ".jinja");
        assert_eq!(config.registry.cache_capacity, 256);
    }

    #[test]
    fn test_invalid_document() {
        let err = RenderRouterConfig::from_yaml("registry:\n  cache_capacity: lots\n").unwrap_err();
        assert!(err.to_string().starts_with("invalid configuration"));
    }
}
