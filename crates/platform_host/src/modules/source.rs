//! Module source service contracts and adapters.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use desktop_app_contract::{AppDescriptor, AppModule};

/// Object-safe boxed future used by [`ModuleSource`] async methods.
pub type ModuleSourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone)]
/// A loaded implementation together with its self-declared descriptor, when it embeds one.
pub struct LoadedModule {
    /// Renderable implementation.
    pub module: AppModule,
    /// Descriptor embedded by the implementation itself.
    pub descriptor: Option<AppDescriptor>,
}

impl LoadedModule {
    /// Creates a loaded module without an embedded descriptor.
    pub fn new(module: AppModule) -> Self {
        Self {
            module,
            descriptor: None,
        }
    }

    /// Attaches a self-declared descriptor.
    pub fn with_descriptor(mut self, descriptor: AppDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }
}

/// Host capability for enumerating and loading app implementations by location string.
pub trait ModuleSource {
    /// Lists candidate locations below `root`, in a stable order.
    fn list_locations<'a>(
        &'a self,
        root: &'a str,
    ) -> ModuleSourceFuture<'a, Result<Vec<String>, String>>;

    /// Loads the implementation stored at `location`.
    fn load_module<'a>(
        &'a self,
        location: &'a str,
    ) -> ModuleSourceFuture<'a, Result<LoadedModule, String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// No-op module source for hosts without loadable apps and baseline tests.
pub struct NoopModuleSource;

impl ModuleSource for NoopModuleSource {
    fn list_locations<'a>(
        &'a self,
        _root: &'a str,
    ) -> ModuleSourceFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn load_module<'a>(
        &'a self,
        location: &'a str,
    ) -> ModuleSourceFuture<'a, Result<LoadedModule, String>> {
        Box::pin(async move { Err(format!("no module source available for `{location}`")) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory module source keyed by location, counting every load attempt.
///
/// Clones share the same table and counters.
pub struct MemoryModuleSource {
    modules: Rc<RefCell<BTreeMap<String, LoadedModule>>>,
    failing: Rc<RefCell<BTreeMap<String, String>>>,
    loads: Rc<RefCell<HashMap<String, usize>>>,
}

impl MemoryModuleSource {
    /// Stores a module at `location`, replacing any previous entry.
    pub fn insert(&self, location: impl Into<String>, module: LoadedModule) {
        let location = location.into();
        self.failing.borrow_mut().remove(&location);
        self.modules.borrow_mut().insert(location, module);
    }

    /// Makes loads of `location` fail with `reason` while keeping it listed.
    pub fn insert_failing(&self, location: impl Into<String>, reason: impl Into<String>) {
        let location = location.into();
        self.modules.borrow_mut().remove(&location);
        self.failing.borrow_mut().insert(location, reason.into());
    }

    /// Removes whatever is stored at `location`.
    pub fn remove(&self, location: &str) {
        self.modules.borrow_mut().remove(location);
        self.failing.borrow_mut().remove(location);
    }

    /// Returns how many times `location` has been requested.
    pub fn load_count(&self, location: &str) -> usize {
        self.loads.borrow().get(location).copied().unwrap_or(0)
    }

    /// Returns the number of load requests across all locations.
    pub fn total_loads(&self) -> usize {
        self.loads.borrow().values().sum()
    }
}

impl ModuleSource for MemoryModuleSource {
    fn list_locations<'a>(
        &'a self,
        root: &'a str,
    ) -> ModuleSourceFuture<'a, Result<Vec<String>, String>> {
        Box::pin(async move {
            let prefix = format!("{}/", root.trim_end_matches('/'));
            let modules = self.modules.borrow();
            let failing = self.failing.borrow();
            let mut locations: Vec<String> = modules
                .keys()
                .chain(failing.keys())
                .filter(|location| location.starts_with(&prefix))
                .cloned()
                .collect();
            locations.sort();
            Ok(locations)
        })
    }

    fn load_module<'a>(
        &'a self,
        location: &'a str,
    ) -> ModuleSourceFuture<'a, Result<LoadedModule, String>> {
        Box::pin(async move {
            *self
                .loads
                .borrow_mut()
                .entry(location.to_string())
                .or_default() += 1;
            if let Some(reason) = self.failing.borrow().get(location) {
                return Err(reason.clone());
            }
            self.modules
                .borrow()
                .get(location)
                .cloned()
                .ok_or_else(|| format!("module not found: {location}"))
        })
    }
}
