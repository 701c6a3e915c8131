//! In-memory descriptor catalog and registration-time defaulting/validation.

use std::collections::HashMap;

use desktop_app_contract::{AppCategory, AppDescriptor, DEFAULT_APP_VERSION};

use crate::{apps, error::RegistryError};

/// Source of descriptors registered at startup, ahead of discovery.
#[derive(Debug, Clone)]
pub enum StaticCatalog {
    /// Catalog generated at build time from `manifests/*.toml`.
    Builtin,
    /// JSON array of camelCase descriptor records.
    Json(String),
    /// Descriptors supplied in memory.
    Descriptors(Vec<AppDescriptor>),
}

impl StaticCatalog {
    /// Produces the raw (not yet validated) descriptors of this source.
    pub fn load(&self) -> Result<Vec<AppDescriptor>, String> {
        match self {
            Self::Builtin => parse_descriptor_list(apps::APP_MANIFEST_CATALOG_JSON),
            Self::Json(raw) => parse_descriptor_list(raw),
            Self::Descriptors(descriptors) => Ok(descriptors.clone()),
        }
    }
}

fn parse_descriptor_list(raw: &str) -> Result<Vec<AppDescriptor>, String> {
    serde_json::from_str(raw).map_err(|err| format!("invalid descriptor list: {err}"))
}

/// Insertion-ordered mapping from app key to descriptor.
///
/// Replacing an existing key keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<AppDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&AppDescriptor> {
        self.index.get(key).and_then(|idx| self.entries.get(*idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppDescriptor> {
        self.entries.iter()
    }

    /// Inserts or replaces by key and returns the previous entry.
    pub fn upsert(&mut self, descriptor: AppDescriptor) -> Option<AppDescriptor> {
        match self.index.get(&descriptor.key).copied() {
            Some(idx) => self
                .entries
                .get_mut(idx)
                .map(|slot| std::mem::replace(slot, descriptor)),
            None => {
                self.index.insert(descriptor.key.clone(), self.entries.len());
                self.entries.push(descriptor);
                None
            }
        }
    }

    /// Inserts only when the key is absent. Returns whether the entry was added.
    pub fn insert_new(&mut self, descriptor: AppDescriptor) -> bool {
        if self.contains(&descriptor.key) {
            return false;
        }
        self.upsert(descriptor);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<AppDescriptor> {
        let idx = self.index.remove(key)?;
        let removed = self.entries.remove(idx);
        for (position, entry) in self.entries.iter().enumerate().skip(idx) {
            self.index.insert(entry.key.clone(), position);
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

/// Category implied by a key prefix when a descriptor does not declare one.
pub fn infer_category_from_key(key: &str) -> AppCategory {
    let lowered = key.to_ascii_lowercase();
    if lowered.starts_with("system") {
        AppCategory::System
    } else if lowered.starts_with("demo") {
        AppCategory::Demo
    } else {
        AppCategory::Custom
    }
}

/// Description assigned to descriptors registered without one.
pub fn default_description(title: &str) -> String {
    format!("{title} application")
}

/// Checks the required fields of a descriptor.
pub fn validate_descriptor(descriptor: &AppDescriptor) -> Result<(), RegistryError> {
    let reject = |reason: &str| {
        Err(RegistryError::Validation {
            key: descriptor.key.clone(),
            reason: reason.to_string(),
        })
    };
    if descriptor.key.trim().is_empty() {
        return reject("missing key");
    }
    if descriptor.title.trim().is_empty() {
        return reject("missing title");
    }
    if !descriptor.has_launch_target() {
        return reject("missing component reference or external link");
    }
    Ok(())
}

/// Validates `descriptor` and fills every omitted optional field.
pub fn prepare_descriptor(mut descriptor: AppDescriptor) -> Result<AppDescriptor, RegistryError> {
    validate_descriptor(&descriptor)?;
    if descriptor.category.is_none() {
        descriptor.category = Some(infer_category_from_key(&descriptor.key));
    }
    if descriptor.version.is_none() {
        descriptor.version = Some(DEFAULT_APP_VERSION.to_string());
    }
    if descriptor.description.is_none() {
        descriptor.description = Some(default_description(&descriptor.title));
    }
    Ok(descriptor)
}
