//! Built-in app catalog and implementations.
//!
//! The descriptor catalog is generated at build time from `manifests/*.toml`. Implementations are
//! published through an in-memory module source at the conventional `apps/<category>/<name>.app`
//! locations, each system module embedding its own descriptor so discovery recognizes it as
//! already registered.

mod placeholders;

use desktop_app_contract::{AppModule, AppMountFn};
use platform_host::{LoadedModule, MemoryModuleSource};

use crate::catalog::StaticCatalog;

include!(concat!(env!("OUT_DIR"), "/app_catalog_generated.rs"));

const SYSTEM_MODULES: [(&str, AppMountFn); 5] = [
    ("calculator", placeholders::mount_calculator),
    ("explorer", placeholders::mount_explorer),
    ("notepad", placeholders::mount_notepad),
    ("terminal", placeholders::mount_terminal),
    ("settings", placeholders::mount_settings),
];

const DEMO_MODULES: [(&str, AppMountFn); 1] = [("color-picker", placeholders::mount_color_picker)];

/// Location of a built-in module.
pub fn builtin_location(category: &str, name: &str) -> String {
    format!("apps/{category}/{name}.app")
}

/// Module source holding every built-in implementation.
pub fn builtin_module_source() -> MemoryModuleSource {
    let descriptors = StaticCatalog::Builtin.load().unwrap_or_default();
    let source = MemoryModuleSource::default();
    for (name, mount) in SYSTEM_MODULES {
        let mut module = LoadedModule::new(AppModule::new(mount));
        if let Some(descriptor) = descriptors
            .iter()
            .find(|descriptor| descriptor.component.as_deref() == Some(name))
        {
            module = module.with_descriptor(descriptor.clone());
        }
        source.insert(builtin_location("system", name), module);
    }
    for (name, mount) in DEMO_MODULES {
        source.insert(
            builtin_location("demo", name),
            LoadedModule::new(AppModule::new(mount)),
        );
    }
    source
}
