//! Typed runtime configuration.
//!
//! Every field has a default, so a partial (or empty) TOML document is a valid configuration.
//!
//! ```toml
//! mode = "development"
//!
//! [discovery]
//! auto_scan = true
//! gate = "development-only"
//! scan_paths = ["apps/demo", "apps/custom"]
//! exclude_patterns = ["\\.test\\."]
//! file_extensions = [".app"]
//!
//! [resolver]
//! loading_delay_ms = 200
//! timeout_ms = 10000
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Execution mode of the host process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Local development build.
    Development,
    /// Shipped build.
    #[default]
    Production,
}

/// When discovery is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryGate {
    /// Run whenever `auto_scan` is set.
    Always,
    /// Run only in [`ExecutionMode::Development`].
    #[default]
    DevelopmentOnly,
}

/// Discovery scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Master switch for discovery.
    #[serde(alias = "enabled")]
    pub auto_scan: bool,
    /// Mode gate applied on top of `auto_scan`.
    pub gate: DiscoveryGate,
    /// Roots handed to the module source for listing.
    pub scan_paths: Vec<String>,
    /// Regular expressions; matching locations are skipped.
    pub exclude_patterns: Vec<String>,
    /// Accepted location suffixes. Empty accepts everything.
    pub file_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            auto_scan: true,
            gate: DiscoveryGate::default(),
            scan_paths: vec![
                "apps/system".to_string(),
                "apps/demo".to_string(),
                "apps/custom".to_string(),
            ],
            exclude_patterns: vec![r"\.test\.".to_string(), r"/_".to_string()],
            file_extensions: vec![".app".to_string()],
        }
    }
}

/// Component resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root prefix of conventional component locations.
    pub module_root: String,
    /// Suffix appended to conventional component locations.
    pub module_extension: String,
    /// Legacy location tried last for system apps.
    pub legacy_system_root: String,
    /// Delay before a loading placeholder is shown.
    pub loading_delay_ms: u64,
    /// Maximum wait before a load surfaces as timed out.
    pub timeout_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            module_root: "apps".to_string(),
            module_extension: ".app".to_string(),
            legacy_system_root: "legacy/system-apps".to_string(),
            loading_delay_ms: 200,
            timeout_ms: 10_000,
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Execution mode.
    pub mode: ExecutionMode,
    /// Discovery settings.
    pub discovery: DiscoveryConfig,
    /// Resolver settings.
    pub resolver: ResolverConfig,
}

impl RuntimeConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&body)
    }

    /// Returns whether discovery should run under the current mode.
    pub fn discovery_enabled(&self) -> bool {
        self.discovery.auto_scan
            && match self.discovery.gate {
                DiscoveryGate::Always => true,
                DiscoveryGate::DevelopmentOnly => self.mode == ExecutionMode::Development,
            }
    }
}
