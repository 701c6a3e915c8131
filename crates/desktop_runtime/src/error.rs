//! Error taxonomy for the registry, resolver, discovery scanner, and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Synchronous registry and lookup failures returned to the immediate caller.
pub enum RegistryError {
    /// A descriptor is missing a required field; the catalog is unchanged.
    #[error("invalid descriptor `{key}`: {reason}")]
    Validation {
        /// Key of the rejected descriptor (may be empty).
        key: String,
        /// Which requirement failed.
        reason: String,
    },
    /// Removal of an `essential` or `system` descriptor without `force`.
    #[error("app `{key}` is protected; removal requires force")]
    Protected {
        /// Protected descriptor key.
        key: String,
    },
    /// The key is not registered.
    #[error("unknown app `{key}`")]
    UnknownApp {
        /// Requested key.
        key: String,
    },
    /// A static descriptor source could not be loaded at all. Fatal to `initialize`.
    #[error("static catalog unavailable: {0}")]
    StaticCatalog(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Component resolution failures surfaced to the rendering layer as error placeholders.
pub enum ResolveError {
    /// Every candidate location failed to load.
    #[error("no component found for `{key}` (tried: {})", attempted.join(", "))]
    ComponentNotFound {
        /// Descriptor key.
        key: String,
        /// Every location attempted, in priority order.
        attempted: Vec<String>,
    },
    /// The load did not settle before the configured deadline.
    #[error("component for `{key}` did not load within {timeout_ms}ms")]
    TimedOut {
        /// Descriptor key.
        key: String,
        /// Deadline that elapsed.
        timeout_ms: u64,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Per-item discovery failures. Scanning continues past every one of these.
pub enum DiscoveryError {
    /// A scan root could not be listed.
    #[error("failed to list `{root}`: {reason}")]
    List {
        /// Scan root.
        root: String,
        /// Source-reported reason.
        reason: String,
    },
    /// A candidate location failed to load.
    #[error("failed to load `{location}`: {reason}")]
    Load {
        /// Candidate location.
        location: String,
        /// Source-reported reason.
        reason: String,
    },
    /// No usable descriptor could be produced for a location.
    #[error("cannot describe `{location}`: {reason}")]
    Invalid {
        /// Candidate location.
        location: String,
        /// Why inference failed.
        reason: String,
    },
}

#[derive(Debug, Error)]
/// Runtime configuration failures.
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The config text is not valid TOML for [`crate::config::RuntimeConfig`].
    #[error("failed to parse runtime config: {0}")]
    Parse(String),
    /// An exclude pattern is not a valid regular expression.
    #[error("invalid exclude pattern `{pattern}`: {reason}")]
    InvalidPattern {
        /// Offending pattern.
        pattern: String,
        /// Regex compiler message.
        reason: String,
    },
}
