pub mod apps;
pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod icons;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod runtime_context;
pub mod session;
pub mod surface;
pub mod window_manager;

pub use catalog::{prepare_descriptor, Catalog, StaticCatalog};
pub use config::{DiscoveryConfig, DiscoveryGate, ExecutionMode, ResolverConfig, RuntimeConfig};
pub use discovery::DiscoveryScanner;
pub use error::{ConfigError, DiscoveryError, RegistryError, ResolveError};
pub use model::*;
pub use registry::{AppRegistry, DiscoveryStats, PreloadReport, PreloadStats, RegistryStatus};
pub use resolver::{
    CacheStats, ComponentHandle, ComponentResolver, PendingComponent, Resolution,
};
pub use runtime_context::DesktopRuntime;
pub use session::{SessionEvent, SessionListener, SessionStore};
pub use surface::{resolve_within, ComponentSurface, SurfacePhase};
