//! Component resolver: turns descriptors into cached, loaded app implementations.
//!
//! Loads are memoized per component key (`component`, falling back to `key`). Concurrent requests
//! for the same key share one underlying load. Failures are never cached, so the next request
//! retries from scratch.

use std::{
    cell::RefCell,
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
};

use desktop_app_contract::{AppCategory, AppDescriptor, AppModule};
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};
use platform_host::ModuleSource;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{catalog::infer_category_from_key, config::ResolverConfig, error::ResolveError};

#[derive(Debug, Clone)]
/// Loaded implementation together with where it was found.
pub struct ComponentHandle {
    /// Component key the handle is cached under.
    pub key: String,
    /// Location that loaded successfully.
    pub location: String,
    /// Renderable implementation.
    pub module: AppModule,
}

type SharedLoad = Shared<LocalBoxFuture<'static, Result<ComponentHandle, ResolveError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How a resolve request was satisfied.
pub enum Resolution {
    /// Served from the completed-handle cache.
    Cached,
    /// Joined a load already in flight for the same key.
    Joined,
    /// Started a new load.
    Started,
}

#[must_use = "a pending component does nothing unless awaited"]
/// Future returned by [`ComponentResolver::resolve`].
pub struct PendingComponent {
    key: String,
    resolution: Resolution,
    load: SharedLoad,
}

impl PendingComponent {
    /// Component key being resolved.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this request hit the cache, joined a load, or started one.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}

impl Future for PendingComponent {
    type Output = Result<ComponentHandle, ResolveError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.load.poll_unpin(cx)
    }
}

/// Tries `attempt` on each candidate in order and returns the first success.
///
/// Every failure is collected with its candidate when none succeeds.
pub async fn first_success<T, E, F, Fut>(
    candidates: &[String],
    mut attempt: F,
) -> Result<T, Vec<(String, E)>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut failures = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) => failures.push((candidate.clone(), err)),
        }
    }
    Err(failures)
}

/// Conventional location scheme for component implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLayout {
    module_root: String,
    module_extension: String,
    legacy_system_root: String,
}

impl CandidateLayout {
    pub fn from_config(config: &ResolverConfig) -> Self {
        Self {
            module_root: config.module_root.trim_end_matches('/').to_string(),
            module_extension: config.module_extension.clone(),
            legacy_system_root: config.legacy_system_root.trim_end_matches('/').to_string(),
        }
    }

    fn location(&self, root: &str, segments: &[&str]) -> String {
        let mut location = String::new();
        for part in std::iter::once(root).chain(segments.iter().copied()) {
            if part.is_empty() {
                continue;
            }
            if !location.is_empty() {
                location.push('/');
            }
            location.push_str(part);
        }
        location.push_str(&self.module_extension);
        location
    }

    /// Locations to try for `descriptor`, highest priority first, without duplicates.
    pub fn candidates(&self, descriptor: &AppDescriptor) -> Vec<String> {
        let component = descriptor.component_key();
        let key = descriptor.key.as_str();
        let category = descriptor
            .category
            .clone()
            .unwrap_or_else(|| infer_category_from_key(key));
        let category_token = category.token();

        let mut ordered = Vec::new();
        if let Some(path) = descriptor
            .component_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
        {
            ordered.push(path.to_string());
        }
        ordered.push(self.location(&self.module_root, &[category_token, component]));
        ordered.push(self.location(&self.module_root, &[category_token, key]));
        ordered.push(self.location(&self.module_root, &[component]));
        ordered.push(self.location(&self.module_root, &[key]));
        if category == AppCategory::System {
            ordered.push(self.location(&self.legacy_system_root, &[component]));
            ordered.push(self.location(&self.legacy_system_root, &[key]));
        }

        let mut unique = Vec::with_capacity(ordered.len());
        for location in ordered {
            if !unique.contains(&location) {
                unique.push(location);
            }
        }
        unique
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
/// Resolver cache counters reported through registry status.
pub struct CacheStats {
    /// Completed handles currently cached.
    pub cached: usize,
    /// Loads currently tracked as in flight.
    pub in_flight: usize,
    /// Requests served from the cache.
    pub hits: u64,
    /// Requests that joined an in-flight load.
    pub coalesced: u64,
    /// Underlying loads started.
    pub loads_started: u64,
    /// Underlying loads that found a component.
    pub loads_succeeded: u64,
    /// Underlying loads that exhausted every candidate.
    pub loads_failed: u64,
}

#[derive(Default)]
struct ResolverState {
    next_ticket: u64,
    // Loads ticketed below this started before the last reset and are not counted.
    counted_from: u64,
    cache: HashMap<String, ComponentHandle>,
    in_flight: HashMap<String, (u64, SharedLoad)>,
    stats: CacheStats,
}

/// Cached, coalescing component resolver.
///
/// Clones share the same cache.
#[derive(Clone)]
pub struct ComponentResolver {
    source: Rc<dyn ModuleSource>,
    layout: CandidateLayout,
    state: Rc<RefCell<ResolverState>>,
}

impl ComponentResolver {
    pub fn new(source: Rc<dyn ModuleSource>, config: &ResolverConfig) -> Self {
        Self {
            source,
            layout: CandidateLayout::from_config(config),
            state: Rc::new(RefCell::new(ResolverState::default())),
        }
    }

    pub fn layout(&self) -> &CandidateLayout {
        &self.layout
    }

    /// Resolves `descriptor`'s implementation.
    ///
    /// The in-flight record is registered before this returns, so a second call made before the
    /// first is awaited joins the same load.
    pub fn resolve(&self, descriptor: &AppDescriptor) -> PendingComponent {
        let component_key = descriptor.component_key().to_string();
        let mut state = self.state.borrow_mut();

        if let Some(handle) = state.cache.get(&component_key).cloned() {
            state.stats.hits += 1;
            return PendingComponent {
                key: component_key,
                resolution: Resolution::Cached,
                load: future::ready(Ok(handle)).boxed_local().shared(),
            };
        }

        if let Some((_, load)) = state.in_flight.get(&component_key) {
            let load = load.clone();
            state.stats.coalesced += 1;
            return PendingComponent {
                key: component_key,
                resolution: Resolution::Joined,
                load,
            };
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.stats.loads_started += 1;
        let load = run_load(
            Rc::clone(&self.source),
            Rc::downgrade(&self.state),
            ticket,
            descriptor.key.clone(),
            component_key.clone(),
            self.layout.candidates(descriptor),
        )
        .boxed_local()
        .shared();
        state
            .in_flight
            .insert(component_key.clone(), (ticket, load.clone()));
        debug!(
            app_key = descriptor.key.as_str(),
            component_key = component_key.as_str(),
            "component load started"
        );

        PendingComponent {
            key: component_key,
            resolution: Resolution::Started,
            load,
        }
    }

    /// Returns the cached handle for `component_key`, if a load has completed.
    pub fn cached(&self, component_key: &str) -> Option<ComponentHandle> {
        self.state.borrow().cache.get(component_key).cloned()
    }

    pub fn is_in_flight(&self, component_key: &str) -> bool {
        self.state.borrow().in_flight.contains_key(component_key)
    }

    /// Drops the cached handle and any in-flight record for one component key.
    pub fn evict(&self, component_key: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let cached = state.cache.remove(component_key).is_some();
        let in_flight = state.in_flight.remove(component_key).is_some();
        if cached || in_flight {
            debug!(component_key, "component evicted");
        }
        cached || in_flight
    }

    /// Forgets every cached handle and every in-flight load.
    ///
    /// Loads already running are not cancelled; their results are simply not recorded.
    pub fn clear_cache(&self) {
        let mut state = self.state.borrow_mut();
        state.cache.clear();
        state.in_flight.clear();
    }

    /// Clears the cache like [`ComponentResolver::clear_cache`] and zeroes every counter.
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        state.cache.clear();
        state.in_flight.clear();
        state.stats = CacheStats::default();
        state.counted_from = state.next_ticket;
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.borrow();
        CacheStats {
            cached: state.cache.len(),
            in_flight: state.in_flight.len(),
            ..state.stats
        }
    }
}

async fn run_load(
    source: Rc<dyn ModuleSource>,
    state: Weak<RefCell<ResolverState>>,
    ticket: u64,
    app_key: String,
    component_key: String,
    candidates: Vec<String>,
) -> Result<ComponentHandle, ResolveError> {
    let outcome = first_success(&candidates, |location| {
        let source = Rc::clone(&source);
        async move {
            let loaded = source.load_module(&location).await?;
            Ok::<_, String>((location, loaded.module))
        }
    })
    .await;

    let result = match outcome {
        Ok((location, module)) => Ok(ComponentHandle {
            key: component_key.clone(),
            location,
            module,
        }),
        Err(failures) => {
            for (location, reason) in &failures {
                debug!(
                    app_key = app_key.as_str(),
                    location = location.as_str(),
                    reason = reason.as_str(),
                    "component candidate failed"
                );
            }
            warn!(
                app_key = app_key.as_str(),
                attempts = failures.len(),
                "component not found"
            );
            Err(ResolveError::ComponentNotFound {
                key: app_key,
                attempted: failures.into_iter().map(|(location, _)| location).collect(),
            })
        }
    };

    if let Some(state) = state.upgrade() {
        let mut state = state.borrow_mut();
        if ticket >= state.counted_from {
            match &result {
                Ok(_) => state.stats.loads_succeeded += 1,
                Err(_) => state.stats.loads_failed += 1,
            }
        }
        let current = state
            .in_flight
            .get(&component_key)
            .map(|(current, _)| *current == ticket)
            .unwrap_or(false);
        if current {
            state.in_flight.remove(&component_key);
            if let Ok(handle) = &result {
                state.cache.insert(component_key, handle.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use desktop_app_contract::{AppMountContext, MountedView};
    use futures::executor::block_on;
    use platform_host::{LoadedModule, MemoryModuleSource};
    use pretty_assertions::assert_eq;

    use super::*;

    fn mount_blank(context: AppMountContext) -> MountedView {
        MountedView {
            component: context.app_key,
            props: serde_json::Value::Null,
        }
    }

    fn resolver_with(source: &MemoryModuleSource) -> ComponentResolver {
        ComponentResolver::new(Rc::new(source.clone()), &ResolverConfig::default())
    }

    fn system_calculator() -> AppDescriptor {
        let mut descriptor = AppDescriptor::new("systemCalculator", "Calculator", "calculator");
        descriptor.category = Some(AppCategory::System);
        descriptor
    }

    #[test]
    fn candidates_follow_priority_order_and_skip_duplicates() {
        let layout = CandidateLayout::from_config(&ResolverConfig::default());
        let mut descriptor = system_calculator();
        descriptor.component_path = Some("vendor/calc.app".to_string());

        assert_eq!(
            layout.candidates(&descriptor),
            vec![
                "vendor/calc.app",
                "apps/system/calculator.app",
                "apps/system/systemCalculator.app",
                "apps/calculator.app",
                "apps/systemCalculator.app",
                "legacy/system-apps/calculator.app",
                "legacy/system-apps/systemCalculator.app",
            ]
        );

        let mut plain = AppDescriptor::new("notes", "Notes", "notes");
        plain.category = Some(AppCategory::Custom);
        assert_eq!(
            layout.candidates(&plain),
            vec!["apps/custom/notes.app", "apps/notes.app"]
        );
    }

    #[test]
    fn first_success_stops_at_first_ok_and_collects_failures() {
        let candidates = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let mut tried = Vec::new();
        let found = block_on(first_success(&candidates, |candidate| {
            tried.push(candidate.clone());
            async move {
                if candidate == "b" {
                    Ok(candidate)
                } else {
                    Err("missing")
                }
            }
        }));
        assert_eq!(found, Ok("b".to_string()));
        assert_eq!(tried, vec!["a".to_string(), "b".to_string()]);

        let none: Result<(), _> =
            block_on(first_success(&candidates, |_| async { Err::<(), _>("nope") }));
        assert_eq!(none.unwrap_err().len(), 3);
    }

    #[test]
    fn concurrent_requests_share_one_load_and_later_requests_hit_cache() {
        let source = MemoryModuleSource::default();
        source.insert(
            "apps/system/calculator.app",
            LoadedModule::new(AppModule::new(mount_blank)),
        );
        let resolver = resolver_with(&source);
        let descriptor = system_calculator();

        let first = resolver.resolve(&descriptor);
        let second = resolver.resolve(&descriptor);
        assert_eq!(first.resolution(), Resolution::Started);
        assert_eq!(second.resolution(), Resolution::Joined);
        assert!(resolver.is_in_flight("calculator"));

        let (a, b) = block_on(future::join(first, second));
        let (a, b) = (a.expect("first"), b.expect("second"));
        assert_eq!(a.location, "apps/system/calculator.app");
        assert_eq!(b.location, a.location);
        assert_eq!(source.load_count("apps/system/calculator.app"), 1);

        let third = resolver.resolve(&descriptor);
        assert_eq!(third.resolution(), Resolution::Cached);
        assert!(block_on(third).is_ok());
        assert_eq!(source.total_loads(), 1);

        let stats = resolver.stats();
        assert_eq!(stats.cached, 1);
        assert_eq!(stats.in_flight, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.coalesced, 1);
        assert_eq!(stats.loads_started, 1);
        assert_eq!(stats.loads_succeeded, 1);
    }

    #[test]
    fn failures_name_every_attempt_and_are_not_cached() {
        let source = MemoryModuleSource::default();
        let resolver = resolver_with(&source);
        let descriptor = system_calculator();

        let err = block_on(resolver.resolve(&descriptor)).expect_err("nothing to load");
        match err {
            ResolveError::ComponentNotFound { key, attempted } => {
                assert_eq!(key, "systemCalculator");
                assert_eq!(attempted.len(), 6);
                assert_eq!(attempted[0], "apps/system/calculator.app");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(resolver.cached("calculator").is_none());
        assert!(!resolver.is_in_flight("calculator"));

        source.insert(
            "legacy/system-apps/calculator.app",
            LoadedModule::new(AppModule::new(mount_blank)),
        );
        let handle = block_on(resolver.resolve(&descriptor)).expect("retry succeeds");
        assert_eq!(handle.location, "legacy/system-apps/calculator.app");
        assert_eq!(resolver.stats().loads_failed, 1);
        assert_eq!(resolver.stats().loads_started, 2);
    }

    #[test]
    fn clear_cache_forgets_in_flight_loads_without_recording_stale_results() {
        let source = MemoryModuleSource::default();
        source.insert(
            "apps/system/calculator.app",
            LoadedModule::new(AppModule::new(mount_blank)),
        );
        let resolver = resolver_with(&source);
        let descriptor = system_calculator();

        let stale = resolver.resolve(&descriptor);
        resolver.clear_cache();
        assert_eq!(resolver.stats().in_flight, 0);

        let fresh = resolver.resolve(&descriptor);
        assert_eq!(fresh.resolution(), Resolution::Started);
        assert!(block_on(fresh).is_ok());
        assert!(block_on(stale).is_ok());

        assert_eq!(source.load_count("apps/system/calculator.app"), 2);
        assert_eq!(resolver.stats().cached, 1);
        assert_eq!(resolver.stats().in_flight, 0);
    }

    #[test]
    fn evict_drops_cached_handle() {
        let source = MemoryModuleSource::default();
        source.insert(
            "apps/system/calculator.app",
            LoadedModule::new(AppModule::new(mount_blank)),
        );
        let resolver = resolver_with(&source);
        block_on(resolver.resolve(&system_calculator())).expect("loaded");

        assert!(resolver.evict("calculator"));
        assert!(!resolver.evict("calculator"));
        assert!(resolver.cached("calculator").is_none());
        assert_eq!(
            resolver.resolve(&system_calculator()).resolution(),
            Resolution::Started
        );
    }
}
