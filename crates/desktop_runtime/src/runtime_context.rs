//! Runtime context object wiring the registry and session store together.
//!
//! One [`DesktopRuntime`] is constructed per session and handed to every consumer; nothing in the
//! crate keeps process-global state.

use std::rc::Rc;

use desktop_app_contract::AppDescriptor;
use platform_host::{HostServices, HostStrategy, TimerService};
use tracing::info;

use crate::{
    apps,
    catalog::StaticCatalog,
    config::RuntimeConfig,
    error::{ConfigError, RegistryError, ResolveError},
    registry::AppRegistry,
    resolver::ComponentHandle,
    session::SessionStore,
};

/// Session-scoped runtime: registry, session store, and the host services they run on.
pub struct DesktopRuntime {
    registry: Rc<AppRegistry>,
    session: SessionStore,
    timer: Rc<dyn TimerService>,
    host_strategy: HostStrategy,
}

impl DesktopRuntime {
    pub fn new(
        config: RuntimeConfig,
        static_sources: Vec<StaticCatalog>,
        host: HostServices,
    ) -> Result<Self, ConfigError> {
        let registry = Rc::new(AppRegistry::new(config, static_sources, host.modules)?);
        Ok(Self {
            session: SessionStore::new(Rc::clone(&registry)),
            registry,
            timer: host.timer,
            host_strategy: host.host_strategy,
        })
    }

    /// Runtime over the built-in catalog and built-in module source.
    pub fn with_builtin_apps(config: RuntimeConfig) -> Result<Self, ConfigError> {
        Self::new(
            config,
            vec![StaticCatalog::Builtin],
            HostServices::embedded(Rc::new(apps::builtin_module_source())),
        )
    }

    /// Initializes the registry and seeds the dock with its pinned apps.
    pub async fn boot(&mut self) -> Result<(), RegistryError> {
        self.registry.initialize().await?;
        self.session.refresh_dock();
        info!(
            host = self.host_strategy.as_str(),
            apps = self.registry.status().total_apps,
            "desktop runtime booted"
        );
        Ok(())
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionStore {
        &mut self.session
    }

    pub fn host_strategy(&self) -> HostStrategy {
        self.host_strategy
    }

    /// Resolves `descriptor` against the host timer and the configured timeout.
    pub async fn resolve_component(
        &self,
        descriptor: &AppDescriptor,
    ) -> Result<ComponentHandle, ResolveError> {
        self.registry
            .resolve_component_within(descriptor, &*self.timer)
            .await
    }
}
