//! Host configuration.

use serde::{Deserialize, Serialize};

use filterhost_abi::DEFAULT_HOST_SIGNATURE;

use crate::error::{FilterHostError, Result};

/// Configuration for discovery and filter execution.
///
/// Presets follow the usual pattern: [`HostConfig::default`] for general
/// use, [`HostConfig::strict`] to reject anything malformed, and
/// [`HostConfig::permissive`] to load whatever can be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Descend into subdirectories when enumerating plug-ins.
    pub search_subdirectories: bool,
    /// Follow symbolic links and shortcuts while enumerating.
    pub follow_links: bool,
    /// File extension of plug-in modules, without the dot.
    pub plugin_extension: String,
    /// Build the color bridge for previews when profiles are supplied.
    pub color_management: bool,
    /// Bytes advertised to plug-ins through `max_space`.
    pub max_buffer_space: u32,
    /// Fail enumeration on an invalid descriptor instead of skipping it.
    pub require_valid_descriptors: bool,
    /// Four-character host signature placed in the record.
    pub host_signature: u32,
    /// Opaque owner window handed to plug-ins through the UI hooks.
    pub owner_window: isize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            search_subdirectories: true,
            follow_links: true,
            plugin_extension: "8bf".to_string(),
            color_management: true,
            max_buffer_space: 256 * 1024 * 1024,
            require_valid_descriptors: false,
            host_signature: DEFAULT_HOST_SIGNATURE,
            owner_window: 0,
        }
    }
}

impl HostConfig {
    /// Create a strict configuration: no link following, invalid
    /// descriptors are errors.
    pub fn strict() -> Self {
        Self {
            follow_links: false,
            require_valid_descriptors: true,
            ..Self::default()
        }
    }

    /// Create a permissive configuration.
    pub fn permissive() -> Self {
        Self {
            search_subdirectories: true,
            follow_links: true,
            require_valid_descriptors: false,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::Json`] for malformed input and
    /// [`FilterHostError::Config`] for values that fail validation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::Json`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`FilterHostError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.plugin_extension.is_empty() || self.plugin_extension.starts_with('.') {
            return Err(FilterHostError::Config(format!(
                "plugin_extension must be a bare extension, got {:?}",
                self.plugin_extension
            )));
        }
        if self.max_buffer_space == 0 {
            return Err(FilterHostError::Config(
                "max_buffer_space must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// `max_buffer_space` clamped into the record's signed field.
    pub fn max_space_i32(&self) -> i32 {
        i32::try_from(self.max_buffer_space).unwrap_or(i32::MAX)
    }

    /// Whether `extension` matches the plug-in extension, ignoring case.
    pub fn matches_extension(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case(&self.plugin_extension)
    }
}
