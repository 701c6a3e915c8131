//! Semantic icon tokens for app descriptors.
//!
//! Descriptors carry icon tokens as plain strings so the rendering layer can map them onto its
//! own icon set. This module owns the per-category defaults used when a discovered app does not
//! declare an icon.

use desktop_app_contract::AppCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Per-category fallback icons. App manifests name their own icons directly.
pub enum IconName {
    /// Generic system component.
    Desktop,
    /// Demo / sample app.
    Beaker,
    /// User-provided app.
    Puzzle,
    /// Small utility app.
    Wrench,
    /// Fallback for categories without a mapping.
    Apps,
}

impl IconName {
    /// Stable token stored in [`desktop_app_contract::AppDescriptor::icon`].
    pub const fn token(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Beaker => "beaker",
            Self::Puzzle => "puzzle",
            Self::Wrench => "wrench",
            Self::Apps => "apps",
        }
    }
}

/// Returns the default icon for descriptors of `category`.
pub fn default_icon_for_category(category: &AppCategory) -> IconName {
    match category {
        AppCategory::System => IconName::Desktop,
        AppCategory::Demo => IconName::Beaker,
        AppCategory::Custom => IconName::Puzzle,
        AppCategory::Utility => IconName::Wrench,
        AppCategory::Other(_) => IconName::Apps,
    }
}
