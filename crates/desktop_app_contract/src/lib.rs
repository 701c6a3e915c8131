//! Shared contract types between the desktop runtime core and the rendering layer.
//!
//! The runtime owns the catalog of [`AppDescriptor`] values and the running-instance state; the
//! rendering layer consumes descriptors, [`AppModule`] handles, and lifecycle notifications but
//! never mutates runtime state directly.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default window width applied to descriptors that omit one.
pub const DEFAULT_APP_WIDTH: u32 = 800;
/// Default window height applied to descriptors that omit one.
pub const DEFAULT_APP_HEIGHT: u32 = 600;
/// Version string assigned to descriptors registered without one.
pub const DEFAULT_APP_VERSION: &str = "1.0.0";

/// Process-like identifier for a running app instance.
///
/// Values are unique for the lifetime of a session and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pid(pub u64);

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pid-{}", self.0)
    }
}

/// Grouping category for a descriptor.
///
/// The closed set covers the categories the runtime knows how to lay out and infer; anything
/// else round-trips as [`AppCategory::Other`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppCategory {
    /// Built-in system apps.
    System,
    /// Demonstration apps.
    Demo,
    /// User-provided apps.
    Custom,
    /// Small utilities.
    Utility,
    /// Free-form category name.
    Other(String),
}

impl AppCategory {
    /// Returns the stable lowercase token for the category.
    pub fn token(&self) -> &str {
        match self {
            Self::System => "system",
            Self::Demo => "demo",
            Self::Custom => "custom",
            Self::Utility => "utility",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Parses a category token, falling back to [`AppCategory::Other`] for unknown names.
    pub fn from_token(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "system" => Self::System,
            "demo" => Self::Demo,
            "custom" => Self::Custom,
            "utility" => Self::Utility,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl From<String> for AppCategory {
    fn from(raw: String) -> Self {
        Self::from_token(&raw)
    }
}

impl From<AppCategory> for String {
    fn from(category: AppCategory) -> Self {
        category.token().to_string()
    }
}

impl std::fmt::Display for AppCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// One entry in an app's nested menu description.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MenuEntry {
    /// Display label.
    pub label: String,
    /// Action token dispatched to the app when the entry is chosen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Keyboard shortcut hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    /// Whether this entry renders as a separator.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub separator: bool,
    /// Nested submenu entries, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MenuEntry>,
}

/// Immutable catalog entry describing an installable application.
///
/// Identity is [`AppDescriptor::key`]. The runtime never mutates a registered descriptor in
/// place; updates replace the catalog entry. Optional fields left as `None` are filled by the
/// registry at registration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppDescriptor {
    /// Globally unique, stable identifier.
    pub key: String,
    /// Display title.
    pub title: String,
    /// Icon token.
    pub icon: String,
    /// Icon foreground color.
    pub icon_color: Option<String>,
    /// Icon background color.
    pub icon_bg_color: Option<String>,
    /// Grouping category; inferred from the key prefix when absent.
    pub category: Option<AppCategory>,
    /// Initial window width.
    pub width: u32,
    /// Initial window height.
    pub height: u32,
    /// Minimum window width.
    pub min_width: Option<u32>,
    /// Minimum window height.
    pub min_height: Option<u32>,
    /// Whether the window can be resized.
    pub resizable: bool,
    /// Whether the window can be dragged.
    pub draggable: bool,
    /// Whether the window shows a close control.
    pub closable: bool,
    /// Whether the window can be minimized.
    pub minimizable: bool,
    /// Whether the window can be maximized.
    pub maximizable: bool,
    /// Whether the window stays above other windows.
    pub always_on_top: bool,
    /// Whether the window is modal.
    pub modal: bool,
    /// At most one concurrent instance.
    pub singleton: bool,
    /// Never removed from the dock on close.
    pub keep_in_dock: bool,
    /// Close acts as hide.
    pub hide_when_close: bool,
    /// Omitted from desktop icon projections.
    #[serde(alias = "hideDesktop")]
    pub hide_in_desktop: bool,
    /// Protected from removal.
    pub essential: bool,
    /// System app; protected from removal.
    pub system: bool,
    /// Logical implementation name; defaults to the key when resolving.
    pub component: Option<String>,
    /// Explicit resolved location override.
    pub component_path: Option<String>,
    /// External link opened instead of (or in addition to) a component.
    pub external_url: Option<String>,
    /// Descriptor version.
    pub version: Option<String>,
    /// Author name.
    pub author: Option<String>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Free-form tags.
    pub tags: BTreeSet<String>,
    /// Declared permissions. Descriptive metadata only.
    pub permissions: BTreeSet<String>,
    /// Nested ordered menu description.
    pub menu: Vec<MenuEntry>,
    /// Opaque stable identifier distinct from `key`.
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

impl Default for AppDescriptor {
    fn default() -> Self {
        Self {
            key: String::new(),
            title: String::new(),
            icon: String::new(),
            icon_color: None,
            icon_bg_color: None,
            category: None,
            width: DEFAULT_APP_WIDTH,
            height: DEFAULT_APP_HEIGHT,
            min_width: None,
            min_height: None,
            resizable: true,
            draggable: true,
            closable: true,
            minimizable: true,
            maximizable: true,
            always_on_top: false,
            modal: false,
            singleton: false,
            keep_in_dock: false,
            hide_when_close: false,
            hide_in_desktop: false,
            essential: false,
            system: false,
            component: None,
            component_path: None,
            external_url: None,
            version: None,
            author: None,
            description: None,
            tags: BTreeSet::new(),
            permissions: BTreeSet::new(),
            menu: Vec::new(),
            id: None,
        }
    }
}

impl AppDescriptor {
    /// Creates a descriptor with the given key, title, and component name.
    pub fn new(
        key: impl Into<String>,
        title: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            component: Some(component.into()),
            ..Self::default()
        }
    }

    /// Returns the key the resolver caches this descriptor's implementation under.
    pub fn component_key(&self) -> &str {
        self.component
            .as_deref()
            .filter(|component| !component.trim().is_empty())
            .unwrap_or(&self.key)
    }

    /// Returns the category, or [`AppCategory::Custom`] when none was assigned.
    pub fn category_or_default(&self) -> AppCategory {
        self.category.clone().unwrap_or(AppCategory::Custom)
    }

    /// Returns whether removal requires an explicit force flag.
    pub fn is_protected(&self) -> bool {
        self.essential || self.system
    }

    /// Returns whether the descriptor names something the runtime can launch.
    pub fn has_launch_target(&self) -> bool {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(|raw| !raw.trim().is_empty())
                .unwrap_or(false)
        };
        present(&self.component) || present(&self.component_path) || present(&self.external_url)
    }
}

/// Lifecycle notifications emitted by the session store for running instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppLifecycleEvent {
    /// A new instance was created.
    Opened,
    /// The instance became the focused instance.
    Focused,
    /// The instance lost focus.
    Blurred,
    /// The instance was hidden.
    Hidden,
    /// The instance was unhidden.
    Shown,
    /// The instance was removed.
    Closed,
}

impl AppLifecycleEvent {
    /// Returns a stable string token for logging and debugging hooks.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Focused => "focused",
            Self::Blurred => "blurred",
            Self::Hidden => "hidden",
            Self::Shown => "shown",
            Self::Closed => "closed",
        }
    }
}

/// Mount context supplied by the rendering layer per running instance.
#[derive(Debug, Clone, PartialEq)]
pub struct AppMountContext {
    /// Catalog key of the mounted app.
    pub app_key: String,
    /// Running instance identifier.
    pub pid: Pid,
    /// Launch parameters supplied at open time.
    pub launch_params: Value,
}

/// Render description produced by an [`AppModule`].
///
/// The rendering layer interprets `component` and `props`; the runtime treats both as opaque.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountedView {
    /// Renderer-side component name.
    pub component: String,
    /// Properties passed to the renderer.
    pub props: Value,
}

/// Mount function exposed by a loaded app implementation.
pub type AppMountFn = fn(AppMountContext) -> MountedView;

#[derive(Debug, Clone, Copy)]
/// Loaded renderable implementation of an app.
pub struct AppModule {
    mount_fn: AppMountFn,
}

impl AppModule {
    /// Creates a module from a mount function.
    pub const fn new(mount_fn: AppMountFn) -> Self {
        Self { mount_fn }
    }

    /// Mounts the app with a rendering-layer context.
    pub fn mount(self, context: AppMountContext) -> MountedView {
        (self.mount_fn)(context)
    }
}
