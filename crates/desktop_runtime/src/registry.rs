//! Application registry: the single entry point for listing, searching, registering, and
//! resolving apps.
//!
//! The registry owns the descriptor [`Catalog`] and the [`ComponentResolver`]. Getters return
//! owned copies so callers can never mutate catalog state behind the registry's back.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap, HashSet},
    rc::Rc,
};

use desktop_app_contract::{AppCategory, AppDescriptor};
use futures::{future, StreamExt};
use platform_host::{unix_time_ms_now, ModuleSource, TimerService};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    catalog::{prepare_descriptor, Catalog, StaticCatalog},
    config::RuntimeConfig,
    discovery::DiscoveryScanner,
    error::{ConfigError, RegistryError, ResolveError},
    resolver::{CacheStats, ComponentHandle, ComponentResolver, PendingComponent},
    surface::{self, ComponentSurface},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InitPhase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Outcome counters of the last discovery pass.
pub struct DiscoveryStats {
    /// Descriptors added to the catalog.
    pub discovered: usize,
    /// Descriptors dropped because their key was already registered.
    pub duplicates: usize,
    /// Locations that failed to list, load, or validate.
    pub failures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Cumulative preload counters.
pub struct PreloadStats {
    /// Components warmed successfully.
    pub succeeded: usize,
    /// Components that failed to resolve.
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
/// Per-key outcome of one [`AppRegistry::preload`] batch.
pub struct PreloadReport {
    /// App keys whose component is now cached.
    pub succeeded: Vec<String>,
    /// App keys that failed, with the reason.
    pub failed: Vec<(String, String)>,
    /// Link-only apps with nothing to load.
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
/// Diagnostic snapshot returned by [`AppRegistry::status`].
pub struct RegistryStatus {
    /// Whether initialization has completed.
    pub initialized: bool,
    /// Descriptors currently in the catalog.
    pub total_apps: usize,
    /// Descriptor count per category token.
    pub counts_by_category: BTreeMap<String, usize>,
    /// Resolver counters since construction or the last reload.
    pub cache_stats: CacheStats,
    /// Outcome of the last discovery pass.
    pub discovery: DiscoveryStats,
    /// Preload counters since construction or the last reload.
    pub preload: PreloadStats,
    /// Unix milliseconds at which the last initialization completed.
    pub initialized_at_ms: Option<u64>,
}

#[derive(Default)]
struct RegistryInner {
    phase: InitPhase,
    catalog: Catalog,
    component_index: HashMap<String, String>,
    static_keys: HashSet<String>,
    discovery: DiscoveryStats,
    preload: PreloadStats,
    initialized_at_ms: Option<u64>,
}

impl RegistryInner {
    fn rebuild_component_index(&mut self) {
        self.component_index = self
            .catalog
            .iter()
            .map(|descriptor| {
                (
                    descriptor.key.clone(),
                    descriptor.component_key().to_string(),
                )
            })
            .collect();
    }

    fn component_shared(&self, component_key: &str) -> bool {
        self.component_index
            .values()
            .any(|existing| existing == component_key)
    }
}

/// Catalog, discovery, and component resolution behind one owner.
pub struct AppRegistry {
    config: RuntimeConfig,
    static_sources: Vec<StaticCatalog>,
    source: Rc<dyn ModuleSource>,
    scanner: DiscoveryScanner,
    resolver: ComponentResolver,
    inner: RefCell<RegistryInner>,
}

impl AppRegistry {
    /// Creates an uninitialized registry.
    ///
    /// Fails only when the discovery exclude patterns do not compile.
    pub fn new(
        config: RuntimeConfig,
        static_sources: Vec<StaticCatalog>,
        source: Rc<dyn ModuleSource>,
    ) -> Result<Self, ConfigError> {
        let scanner = DiscoveryScanner::new(&config.discovery)?;
        let resolver = ComponentResolver::new(Rc::clone(&source), &config.resolver);
        Ok(Self {
            config,
            static_sources,
            source,
            scanner,
            resolver,
            inner: RefCell::new(RegistryInner::default()),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ComponentResolver {
        &self.resolver
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.borrow().phase == InitPhase::Ready
    }

    /// Loads static descriptors, runs discovery when enabled, and indexes components.
    ///
    /// Runs once; later calls (including calls made while the first is still scanning) return
    /// immediately. Only a static source that cannot be loaded at all is an error, and it leaves
    /// the registry uninitialized.
    pub async fn initialize(&self) -> Result<(), RegistryError> {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.phase != InitPhase::Uninitialized {
                return Ok(());
            }
            inner.phase = InitPhase::Initializing;
        }

        let mut statics = Vec::new();
        for source in &self.static_sources {
            match source.load() {
                Ok(descriptors) => statics.extend(descriptors),
                Err(reason) => {
                    self.inner.borrow_mut().phase = InitPhase::Uninitialized;
                    return Err(RegistryError::StaticCatalog(reason));
                }
            }
        }
        for descriptor in statics {
            match self.register(descriptor) {
                Ok(stored) => {
                    self.inner.borrow_mut().static_keys.insert(stored.key);
                }
                Err(err) => warn!(error = %err, "skipping invalid static descriptor"),
            }
        }

        let discovery = if self.config.discovery_enabled() {
            self.discover().await
        } else {
            debug!(mode = ?self.config.mode, "discovery disabled");
            DiscoveryStats::default()
        };

        let mut inner = self.inner.borrow_mut();
        inner.discovery = discovery;
        inner.rebuild_component_index();
        inner.phase = InitPhase::Ready;
        inner.initialized_at_ms = Some(unix_time_ms_now());
        info!(
            apps = inner.catalog.len(),
            discovered = discovery.discovered,
            duplicates = discovery.duplicates,
            failures = discovery.failures,
            "app registry initialized"
        );
        Ok(())
    }

    async fn discover(&self) -> DiscoveryStats {
        let mut stats = DiscoveryStats::default();
        let mut found = self.scanner.scan(&*self.source);
        while let Some(item) = found.next().await {
            let descriptor = match item {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(error = %err, "discovery candidate skipped");
                    stats.failures += 1;
                    continue;
                }
            };
            let descriptor = match prepare_descriptor(descriptor) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    warn!(error = %err, "discovered descriptor rejected");
                    stats.failures += 1;
                    continue;
                }
            };
            let key = descriptor.key.clone();
            if self.inner.borrow_mut().catalog.insert_new(descriptor) {
                debug!(key = key.as_str(), "app discovered");
                stats.discovered += 1;
            } else {
                warn!(key = key.as_str(), "discovered app duplicates a registered key; dropped");
                stats.duplicates += 1;
            }
        }
        stats
    }

    /// Clears the catalog, the resolver cache, and every counter, then initializes again.
    pub async fn reload(&self) -> Result<(), RegistryError> {
        *self.inner.borrow_mut() = RegistryInner::default();
        self.resolver.reset();
        info!("app registry reloading");
        self.initialize().await
    }

    /// Validates, fills defaults, and inserts or replaces a descriptor.
    ///
    /// Returns the stored descriptor. Replacing an entry evicts the resolver's handle for the
    /// previous component key.
    pub fn register(&self, descriptor: AppDescriptor) -> Result<AppDescriptor, RegistryError> {
        let descriptor = prepare_descriptor(descriptor)?;
        let component_key = descriptor.component_key().to_string();
        let key = descriptor.key.clone();

        let mut inner = self.inner.borrow_mut();
        let previous = inner.catalog.upsert(descriptor.clone());
        inner
            .component_index
            .insert(key.clone(), component_key.clone());
        if let Some(previous) = previous {
            let previous_component = previous.component_key();
            if previous_component != component_key && inner.component_shared(previous_component) {
                debug!(key = key.as_str(), "previous component still referenced");
            } else {
                self.resolver.evict(previous_component);
            }
            info!(key = key.as_str(), "app replaced");
        } else {
            info!(key = key.as_str(), "app registered");
        }
        Ok(descriptor)
    }

    /// Removes a descriptor and its cached component handle.
    ///
    /// Returns whether an entry existed. Essential and system apps require `force`.
    pub fn unregister(&self, key: &str, force: bool) -> Result<bool, RegistryError> {
        let mut inner = self.inner.borrow_mut();
        let Some(existing) = inner.catalog.get(key) else {
            return Ok(false);
        };
        if existing.is_protected() && !force {
            return Err(RegistryError::Protected {
                key: key.to_string(),
            });
        }

        let removed = inner.catalog.remove(key);
        inner.component_index.remove(key);
        inner.static_keys.remove(key);
        if let Some(removed) = removed {
            let component_key = removed.component_key();
            if !inner.component_shared(component_key) {
                self.resolver.evict(component_key);
            }
        }
        info!(key, force, "app unregistered");
        Ok(true)
    }

    pub fn get(&self, key: &str) -> Option<AppDescriptor> {
        self.inner.borrow().catalog.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.borrow().catalog.contains(key)
    }

    /// Every descriptor in catalog (insertion) order.
    pub fn all(&self) -> Vec<AppDescriptor> {
        self.collect(|_| true)
    }

    /// Apps listed in the launcher.
    pub fn launcher_apps(&self) -> Vec<AppDescriptor> {
        self.all()
    }

    /// Apps shown as desktop icons.
    pub fn desktop_apps(&self) -> Vec<AppDescriptor> {
        self.collect(|descriptor| !descriptor.hide_in_desktop)
    }

    /// Statically configured apps pinned to the dock regardless of whether they run.
    ///
    /// Apps added later through [`AppRegistry::register`] or discovery are never dock defaults.
    pub fn dock_defaults(&self) -> Vec<AppDescriptor> {
        let inner = self.inner.borrow();
        inner
            .catalog
            .iter()
            .filter(|descriptor| {
                descriptor.keep_in_dock && inner.static_keys.contains(&descriptor.key)
            })
            .cloned()
            .collect()
    }

    pub fn by_category(&self, category: &AppCategory) -> Vec<AppDescriptor> {
        self.collect(|descriptor| descriptor.category.as_ref() == Some(category))
    }

    /// Case-insensitive substring search over title, key, and description.
    ///
    /// Results keep catalog order.
    pub fn search(&self, query: &str) -> Vec<AppDescriptor> {
        let needle = query.trim().to_lowercase();
        self.collect(|descriptor| {
            descriptor.title.to_lowercase().contains(&needle)
                || descriptor.key.to_lowercase().contains(&needle)
                || descriptor
                    .description
                    .as_deref()
                    .map(|description| description.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
    }

    pub fn group_by_category(&self) -> BTreeMap<AppCategory, Vec<AppDescriptor>> {
        let mut groups: BTreeMap<AppCategory, Vec<AppDescriptor>> = BTreeMap::new();
        for descriptor in self.all() {
            groups
                .entry(descriptor.category_or_default())
                .or_default()
                .push(descriptor);
        }
        groups
    }

    fn collect(&self, keep: impl Fn(&AppDescriptor) -> bool) -> Vec<AppDescriptor> {
        self.inner
            .borrow()
            .catalog
            .iter()
            .filter(|descriptor| keep(descriptor))
            .cloned()
            .collect()
    }

    /// Starts (or joins) resolution of `descriptor`'s implementation.
    pub fn resolve_component(&self, descriptor: &AppDescriptor) -> PendingComponent {
        self.resolver.resolve(descriptor)
    }

    /// Resolves the implementation of a registered app by key.
    pub fn component(&self, key: &str) -> Result<PendingComponent, RegistryError> {
        let descriptor = self.get(key).ok_or_else(|| RegistryError::UnknownApp {
            key: key.to_string(),
        })?;
        Ok(self.resolver.resolve(&descriptor))
    }

    /// Resolves `descriptor`, giving up after the configured timeout on `timer`.
    pub async fn resolve_component_within(
        &self,
        descriptor: &AppDescriptor,
        timer: &dyn TimerService,
    ) -> Result<ComponentHandle, ResolveError> {
        surface::resolve_within(
            self.resolver.resolve(descriptor),
            timer,
            self.config.resolver.timeout_ms,
        )
        .await
    }

    /// Fresh loading surface for `descriptor`, using the configured delay and timeout.
    pub fn surface(&self, descriptor: &AppDescriptor) -> ComponentSurface {
        ComponentSurface::new(descriptor.component_key(), &self.config.resolver)
    }

    /// Warms the resolver cache for `keys`, or for every app when `None`.
    ///
    /// Every resolution settles independently; failures are reported, never propagated.
    pub async fn preload(&self, keys: Option<&[String]>) -> PreloadReport {
        let mut report = PreloadReport::default();
        let targets = match keys {
            Some(keys) => keys
                .iter()
                .filter_map(|key| match self.get(key) {
                    Some(descriptor) => Some(descriptor),
                    None => {
                        report.failed.push((key.clone(), "unknown app".to_string()));
                        None
                    }
                })
                .collect::<Vec<_>>(),
            None => self.all(),
        };

        let mut pending = Vec::with_capacity(targets.len());
        for descriptor in targets {
            let link_only = descriptor.component.is_none()
                && descriptor.component_path.is_none()
                && descriptor.external_url.is_some();
            if link_only {
                report.skipped.push(descriptor.key);
                continue;
            }
            let load = self.resolver.resolve(&descriptor);
            pending.push(async move { (descriptor.key, load.await) });
        }

        for (key, outcome) in future::join_all(pending).await {
            match outcome {
                Ok(_) => report.succeeded.push(key),
                Err(err) => {
                    warn!(key = key.as_str(), error = %err, "preload failed");
                    report.failed.push((key, err.to_string()));
                }
            }
        }

        let mut inner = self.inner.borrow_mut();
        inner.preload.succeeded += report.succeeded.len();
        inner.preload.failed += report.failed.len();
        report
    }

    pub fn status(&self) -> RegistryStatus {
        let inner = self.inner.borrow();
        let mut counts_by_category = BTreeMap::new();
        for descriptor in inner.catalog.iter() {
            *counts_by_category
                .entry(descriptor.category_or_default().token().to_string())
                .or_insert(0) += 1;
        }
        RegistryStatus {
            initialized: inner.phase == InitPhase::Ready,
            total_apps: inner.catalog.len(),
            counts_by_category,
            cache_stats: self.resolver.stats(),
            discovery: inner.discovery,
            preload: inner.preload,
            initialized_at_ms: inner.initialized_at_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppModule, AppMountContext, MountedView};
    use futures::executor::block_on;
    use platform_host::{LoadedModule, MemoryModuleSource};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::{DiscoveryGate, ExecutionMode};

    fn mount_blank(context: AppMountContext) -> MountedView {
        MountedView {
            component: context.app_key,
            props: serde_json::Value::Null,
        }
    }

    fn module() -> LoadedModule {
        LoadedModule::new(AppModule::new(mount_blank))
    }

    fn dev_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.mode = ExecutionMode::Development;
        config
    }

    fn registry(
        config: RuntimeConfig,
        statics: Vec<AppDescriptor>,
        source: &MemoryModuleSource,
    ) -> AppRegistry {
        AppRegistry::new(
            config,
            vec![StaticCatalog::Descriptors(statics)],
            Rc::new(source.clone()),
        )
        .expect("registry")
    }

    fn keys(descriptors: &[AppDescriptor]) -> Vec<&str> {
        descriptors.iter().map(|d| d.key.as_str()).collect()
    }

    #[test]
    fn register_then_get_round_trips_except_defaults() {
        let registry = registry(
            RuntimeConfig::default(),
            Vec::new(),
            &MemoryModuleSource::default(),
        );
        let mut input = AppDescriptor::new("weather", "Weather", "weather");
        input.tags.insert("forecast".to_string());

        let stored = registry.register(input.clone()).expect("register");
        let fetched = registry.get("weather").expect("registered");
        assert_eq!(stored, fetched);

        let mut expected = input;
        expected.category = Some(AppCategory::Custom);
        expected.version = Some("1.0.0".to_string());
        expected.description = Some("Weather application".to_string());
        assert_eq!(fetched, expected);
    }

    #[test]
    fn invalid_registration_leaves_catalog_unchanged() {
        let registry = registry(
            RuntimeConfig::default(),
            Vec::new(),
            &MemoryModuleSource::default(),
        );
        registry
            .register(AppDescriptor::new("a", "A", "a"))
            .expect("register");
        assert!(registry
            .register(AppDescriptor::new("b", "", "b"))
            .is_err());
        assert_eq!(keys(&registry.all()), vec!["a"]);
    }

    #[test]
    fn search_is_case_insensitive_over_title_key_and_description() {
        let registry = registry(
            RuntimeConfig::default(),
            Vec::new(),
            &MemoryModuleSource::default(),
        );
        registry
            .register(AppDescriptor::new("systemCalculator", "Calculator", "calculator"))
            .expect("calculator");
        let mut notes = AppDescriptor::new("notes", "Notes", "notes");
        notes.description = Some("Quick scratchpad".to_string());
        registry.register(notes).expect("notes");
        registry
            .register(AppDescriptor::new("clock", "Clock", "clock"))
            .expect("clock");

        assert_eq!(keys(&registry.search("calc")), vec!["systemCalculator"]);
        assert_eq!(keys(&registry.search("SCRATCH")), vec!["notes"]);
        assert_eq!(keys(&registry.search("o")), vec!["systemCalculator", "notes", "clock"]);
        assert!(registry.search("zzz").is_empty());
    }

    #[test]
    fn category_projections_and_groups() {
        let registry = registry(
            RuntimeConfig::default(),
            Vec::new(),
            &MemoryModuleSource::default(),
        );
        let mut settings = AppDescriptor::new("systemSettings", "Settings", "settings");
        settings.keep_in_dock = true;
        settings.hide_in_desktop = true;
        registry.register(settings).expect("settings");
        registry
            .register(AppDescriptor::new("demoClock", "Clock", "clock"))
            .expect("clock");
        registry
            .register(AppDescriptor::new("systemNotepad", "Notepad", "notepad"))
            .expect("notepad");

        assert_eq!(
            keys(&registry.by_category(&AppCategory::System)),
            vec!["systemSettings", "systemNotepad"]
        );
        assert_eq!(keys(&registry.desktop_apps()), vec!["demoClock", "systemNotepad"]);
        assert!(registry.dock_defaults().is_empty());
        assert_eq!(registry.launcher_apps().len(), 3);

        let groups = registry.group_by_category();
        assert_eq!(groups[&AppCategory::System].len(), 2);
        assert_eq!(keys(&groups[&AppCategory::Demo]), vec!["demoClock"]);

        let status = registry.status();
        assert_eq!(status.counts_by_category.get("system"), Some(&2));
        assert_eq!(status.total_apps, 3);
        assert!(!status.initialized);
    }

    #[test]
    fn dock_defaults_only_list_static_pins() {
        let mut settings = AppDescriptor::new("systemSettings", "Settings", "settings");
        settings.keep_in_dock = true;
        let mut terminal = AppDescriptor::new("systemTerminal", "Terminal", "terminal");
        terminal.keep_in_dock = true;
        let registry = registry(
            RuntimeConfig::default(),
            vec![settings, terminal],
            &MemoryModuleSource::default(),
        );
        block_on(registry.initialize()).expect("initialize");

        let mut clock = AppDescriptor::new("demoClock", "Clock", "clock");
        clock.keep_in_dock = true;
        registry.register(clock).expect("clock");
        registry
            .unregister("systemTerminal", true)
            .expect("forced unregister");

        assert_eq!(keys(&registry.dock_defaults()), vec!["systemSettings"]);
    }

    #[test]
    fn protected_apps_need_force_to_unregister() {
        let source = MemoryModuleSource::default();
        source.insert("apps/system/settings.app", module());
        let registry = registry(RuntimeConfig::default(), Vec::new(), &source);
        let mut settings = AppDescriptor::new("systemSettings", "Settings", "settings");
        settings.system = true;
        let settings = registry.register(settings).expect("register");
        block_on(registry.resolve_component(&settings)).expect("resolved");

        assert_eq!(
            registry.unregister("systemSettings", false),
            Err(RegistryError::Protected {
                key: "systemSettings".to_string()
            })
        );
        assert!(registry.get("systemSettings").is_some());
        assert_eq!(registry.unregister("systemSettings", true), Ok(true));
        assert!(registry.get("systemSettings").is_none());
        assert!(registry.resolver().cached("settings").is_none());
        assert_eq!(registry.unregister("systemSettings", true), Ok(false));
    }

    #[test]
    fn replacing_a_descriptor_evicts_its_previous_component() {
        let source = MemoryModuleSource::default();
        source.insert("apps/custom/clock.app", module());
        source.insert("apps/custom/clock-v2.app", module());
        let registry = registry(RuntimeConfig::default(), Vec::new(), &source);
        let first = registry
            .register(AppDescriptor::new("clock", "Clock", "clock"))
            .expect("register");
        block_on(registry.resolve_component(&first)).expect("resolved");
        assert!(registry.resolver().cached("clock").is_some());

        registry
            .register(AppDescriptor::new("clock", "Clock", "clock-v2"))
            .expect("replace");
        assert!(registry.resolver().cached("clock").is_none());
        let handle = block_on(registry.component("clock").expect("known")).expect("resolved");
        assert_eq!(handle.location, "apps/custom/clock-v2.app");
        assert!(matches!(
            registry.component("missing"),
            Err(RegistryError::UnknownApp { .. })
        ));
    }

    #[test]
    fn initialize_keeps_static_keys_over_discovered_duplicates() {
        let source = MemoryModuleSource::default();
        source.insert(
            "apps/demo/clock.app",
            module().with_descriptor(AppDescriptor::new("X", "Discovered X", "clock")),
        );
        source.insert("apps/demo/color-picker.app", module());
        source.insert_failing("apps/demo/broken.app", "syntax error");
        let registry = registry(
            dev_config(),
            vec![AppDescriptor::new("X", "Static X", "x")],
            &source,
        );

        block_on(registry.initialize()).expect("initialize");

        assert_eq!(registry.get("X").expect("static").title, "Static X");
        assert!(registry.get("DemoColorPicker").is_some());
        let status = registry.status();
        assert!(status.initialized);
        assert!(status.initialized_at_ms.is_some());
        assert_eq!(
            status.discovery,
            DiscoveryStats {
                discovered: 1,
                duplicates: 1,
                failures: 1,
            }
        );
    }

    #[test]
    fn initialize_runs_once_and_discovery_respects_gate() {
        let source = MemoryModuleSource::default();
        source.insert("apps/demo/color-picker.app", module());
        let registry = registry(RuntimeConfig::default(), Vec::new(), &source);

        block_on(registry.initialize()).expect("initialize");
        assert!(registry.get("DemoColorPicker").is_none());
        assert_eq!(source.total_loads(), 0);

        registry
            .register(AppDescriptor::new("late", "Late", "late"))
            .expect("register");
        block_on(registry.initialize()).expect("second initialize is a no-op");
        assert!(registry.get("late").is_some());

        let mut always = RuntimeConfig::default();
        always.discovery.gate = DiscoveryGate::Always;
        let gated_open = self::registry(always, Vec::new(), &source);
        block_on(gated_open.initialize()).expect("initialize");
        assert!(gated_open.get("DemoColorPicker").is_some());
    }

    #[test]
    fn reload_clears_dynamic_registrations_and_cache() {
        let source = MemoryModuleSource::default();
        source.insert("apps/custom/base.app", module());
        let registry = registry(
            RuntimeConfig::default(),
            vec![AppDescriptor::new("base", "Base", "base")],
            &source,
        );
        block_on(registry.initialize()).expect("initialize");
        registry
            .register(AppDescriptor::new("extra", "Extra", "extra"))
            .expect("register");
        block_on(registry.component("base").expect("known")).expect("resolved");
        registry
            .register(AppDescriptor::new("ghost", "Ghost", "ghost"))
            .expect("ghost");
        let report = block_on(registry.preload(Some(&["ghost".to_string()])));
        assert_eq!(report.failed.len(), 1);

        block_on(registry.reload()).expect("reload");
        assert_eq!(keys(&registry.all()), vec!["base"]);
        assert!(registry.is_initialized());
        let status = registry.status();
        assert_eq!(status.preload, PreloadStats::default());
        assert_eq!(status.cache_stats, CacheStats::default());
    }

    #[test]
    fn unloadable_static_source_is_fatal_and_retryable() {
        let registry = AppRegistry::new(
            RuntimeConfig::default(),
            vec![StaticCatalog::Json("not json".to_string())],
            Rc::new(MemoryModuleSource::default()),
        )
        .expect("registry");

        assert!(matches!(
            block_on(registry.initialize()),
            Err(RegistryError::StaticCatalog(_))
        ));
        assert!(!registry.is_initialized());
        assert!(block_on(registry.initialize()).is_err());
    }

    #[test]
    fn preload_settles_every_key_independently() {
        let source = MemoryModuleSource::default();
        source.insert("apps/custom/good.app", module());
        let registry = registry(RuntimeConfig::default(), Vec::new(), &source);
        registry
            .register(AppDescriptor::new("good", "Good", "good"))
            .expect("good");
        registry
            .register(AppDescriptor::new("bad", "Bad", "bad"))
            .expect("bad");
        let mut link = AppDescriptor::new("docs", "Docs", "docs");
        link.component = None;
        link.external_url = Some("https://example.com/docs".to_string());
        registry.register(link).expect("link");

        let report = block_on(registry.preload(None));
        assert_eq!(report.succeeded, vec!["good".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "bad");
        assert_eq!(report.skipped, vec!["docs".to_string()]);

        let targeted = block_on(registry.preload(Some(&["good".to_string(), "ghost".to_string()])));
        assert_eq!(targeted.succeeded, vec!["good".to_string()]);
        assert_eq!(
            targeted.failed,
            vec![("ghost".to_string(), "unknown app".to_string())]
        );

        let status = registry.status();
        assert_eq!(status.preload, PreloadStats { succeeded: 2, failed: 2 });
        assert_eq!(status.cache_stats.hits, 1);
    }

    #[test]
    fn invalid_exclude_pattern_fails_construction() {
        let mut config = RuntimeConfig::default();
        config.discovery.exclude_patterns = vec!["[".to_string()];
        let source = Rc::new(MemoryModuleSource::default());
        assert!(AppRegistry::new(config, Vec::new(), source).is_err());
    }
}
