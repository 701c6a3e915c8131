//! Discovery scanner: finds app implementations under configured roots and describes them.
//!
//! A location either embeds its own descriptor or gets one inferred from its path:
//! `apps/demo/color-picker.app` becomes key `DemoColorPicker`, title `Color Picker`, category
//! `demo`. The scanner never touches the catalog; [`crate::registry::AppRegistry`] decides what
//! to keep.

use desktop_app_contract::{AppCategory, AppDescriptor};
use futures::stream::{self, LocalBoxStream, StreamExt};
use platform_host::ModuleSource;
use regex::Regex;
use tracing::debug;

use crate::{
    config::DiscoveryConfig,
    error::{ConfigError, DiscoveryError},
    icons,
};

enum Candidate {
    Location(String),
    Unlistable { root: String, reason: String },
}

/// Scanner compiled from a [`DiscoveryConfig`].
#[derive(Debug, Clone)]
pub struct DiscoveryScanner {
    scan_paths: Vec<String>,
    file_extensions: Vec<String>,
    exclude: Vec<Regex>,
}

impl DiscoveryScanner {
    /// Compiles the exclude patterns of `config`.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, ConfigError> {
        let exclude = config
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: err.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            scan_paths: config.scan_paths.clone(),
            file_extensions: config.file_extensions.clone(),
            exclude,
        })
    }

    /// Returns whether `location` passes the extension and exclude filters.
    pub fn accepts(&self, location: &str) -> bool {
        self.matched_extension(location).is_some()
            && !self.exclude.iter().any(|pattern| pattern.is_match(location))
    }

    fn matched_extension(&self, location: &str) -> Option<&str> {
        if self.file_extensions.is_empty() {
            return Some("");
        }
        self.file_extensions
            .iter()
            .map(String::as_str)
            .find(|ext| location.ends_with(ext))
    }

    /// Lazily scans every root in order.
    ///
    /// Each call starts a fresh scan. Per-item failures are yielded as `Err` values and never end
    /// the stream.
    pub fn scan<'a>(
        &'a self,
        source: &'a dyn ModuleSource,
    ) -> LocalBoxStream<'a, Result<AppDescriptor, DiscoveryError>> {
        stream::iter(self.scan_paths.iter())
            .then(move |root| async move {
                match source.list_locations(root).await {
                    Ok(locations) => locations
                        .into_iter()
                        .filter(|location| {
                            let accepted = self.accepts(location);
                            if !accepted {
                                debug!(
                                    location = location.as_str(),
                                    "discovery candidate filtered"
                                );
                            }
                            accepted
                        })
                        .map(Candidate::Location)
                        .collect::<Vec<_>>(),
                    Err(reason) => vec![Candidate::Unlistable {
                        root: root.clone(),
                        reason,
                    }],
                }
            })
            .flat_map(stream::iter)
            .then(move |candidate| async move {
                match candidate {
                    Candidate::Unlistable { root, reason } => {
                        Err(DiscoveryError::List { root, reason })
                    }
                    Candidate::Location(location) => self.describe(source, location).await,
                }
            })
            .boxed_local()
    }

    async fn describe(
        &self,
        source: &dyn ModuleSource,
        location: String,
    ) -> Result<AppDescriptor, DiscoveryError> {
        let loaded = source
            .load_module(&location)
            .await
            .map_err(|reason| DiscoveryError::Load {
                location: location.clone(),
                reason,
            })?;
        match loaded.descriptor {
            Some(mut descriptor) => {
                descriptor.component_path = Some(location);
                Ok(descriptor)
            }
            None => self.infer_descriptor(&location),
        }
    }

    /// Builds a descriptor from the path of a location that embeds none.
    pub fn infer_descriptor(&self, location: &str) -> Result<AppDescriptor, DiscoveryError> {
        let invalid = |reason: &str| DiscoveryError::Invalid {
            location: location.to_string(),
            reason: reason.to_string(),
        };
        let (parent, file_name) = location
            .trim_end_matches('/')
            .rsplit_once('/')
            .ok_or_else(|| invalid("location has no parent directory"))?;
        let category_name = parent.rsplit('/').next().unwrap_or(parent);
        if category_name.trim().is_empty() {
            return Err(invalid("empty parent directory name"));
        }

        let extension = self.matched_extension(file_name).unwrap_or("");
        let stem = if extension.is_empty() {
            file_name
                .rsplit_once('.')
                .map(|(stem, _)| stem)
                .unwrap_or(file_name)
        } else {
            file_name.strip_suffix(extension).unwrap_or(file_name)
        };
        if stem.trim().is_empty() {
            return Err(invalid("empty file name"));
        }

        let category = AppCategory::from_token(category_name);
        Ok(AppDescriptor {
            key: format!("{}{}", pascal_case(category_name), pascal_case(stem)),
            title: title_case(stem),
            icon: icons::default_icon_for_category(&category).token().to_string(),
            category: Some(category),
            component: Some(stem.to_string()),
            component_path: Some(location.to_string()),
            ..AppDescriptor::default()
        })
    }
}

fn words(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(['-', '_', ' ', '.'])
        .filter(|word| !word.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pascal_case(raw: &str) -> String {
    words(raw).map(capitalize).collect()
}

fn title_case(raw: &str) -> String {
    words(raw).map(capitalize).collect::<Vec<_>>().join(" ")
}
