//! Host-bundle model injected into the desktop runtime at composition time.

use std::rc::Rc;

use crate::{DelayTimerService, ManualTimerService, MemoryModuleSource, ModuleSource, TimerService};

/// Stable host strategy selected for the current composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Modules linked into the host binary.
    Embedded,
    /// Test composition with in-memory modules and a manual clock.
    Test,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics and runtime inspection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Embedded => "embedded",
            Self::Test => "test",
        }
    }
}

/// Runtime-selected host service bundle injected into the shared desktop runtime.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `desktop_runtime`, which keeps the runtime decoupled from where app implementations live.
#[derive(Clone)]
pub struct HostServices {
    /// Loader capability for app implementations.
    pub modules: Rc<dyn ModuleSource>,
    /// Timer used for load deadlines.
    pub timer: Rc<dyn TimerService>,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Creates an embedded host bundle around `modules` with a wall-clock timer.
    pub fn embedded(modules: Rc<dyn ModuleSource>) -> Self {
        Self {
            modules,
            timer: Rc::new(DelayTimerService),
            host_strategy: HostStrategy::Embedded,
        }
    }

    /// Creates a test host bundle sharing the given in-memory source and manual timer.
    pub fn test(modules: MemoryModuleSource, timer: ManualTimerService) -> Self {
        Self {
            modules: Rc::new(modules),
            timer: Rc::new(timer),
            host_strategy: HostStrategy::Test,
        }
    }
}
