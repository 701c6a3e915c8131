//! Loading/placeholder/error surface the rendering layer shows while a component resolves.
//!
//! [`ComponentSurface`] is a pure state machine over elapsed time: the renderer feeds it clock
//! ticks and the resolution outcome, and draws whatever [`SurfacePhase`] says. A loading
//! placeholder only appears once the configured delay has passed, so fast loads never flicker.

use futures::future::{self, Either};
use platform_host::TimerService;
use tracing::warn;

use crate::{
    config::ResolverConfig,
    error::ResolveError,
    resolver::{ComponentHandle, PendingComponent},
};

#[derive(Debug, Clone)]
/// What the rendering layer should draw for one component slot.
pub enum SurfacePhase {
    /// Resolution started; nothing is drawn yet.
    Pending,
    /// Resolution is taking long enough to show a loading placeholder.
    Loading,
    /// The implementation is available.
    Ready(ComponentHandle),
    /// Resolution failed; an error placeholder is drawn.
    Failed(ResolveError),
    /// The deadline elapsed before resolution settled.
    TimedOut,
}

impl SurfacePhase {
    /// Returns whether the phase can no longer change.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_) | Self::TimedOut)
    }
}

/// Per-slot loading surface state.
#[derive(Debug, Clone)]
pub struct ComponentSurface {
    key: String,
    loading_delay_ms: u64,
    timeout_ms: u64,
    elapsed_ms: u64,
    phase: SurfacePhase,
}

impl ComponentSurface {
    pub fn new(key: impl Into<String>, config: &ResolverConfig) -> Self {
        Self {
            key: key.into(),
            loading_delay_ms: config.loading_delay_ms,
            timeout_ms: config.timeout_ms,
            elapsed_ms: 0,
            phase: SurfacePhase::Pending,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn phase(&self) -> &SurfacePhase {
        &self.phase
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// Advances the surface clock.
    pub fn tick(&mut self, delta_ms: u64) -> &SurfacePhase {
        if self.phase.is_settled() {
            return &self.phase;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        if self.elapsed_ms >= self.timeout_ms {
            warn!(
                component_key = self.key.as_str(),
                timeout_ms = self.timeout_ms,
                "component surface timed out"
            );
            self.phase = SurfacePhase::TimedOut;
        } else if self.elapsed_ms >= self.loading_delay_ms {
            self.phase = SurfacePhase::Loading;
        }
        &self.phase
    }

    /// Records the resolution outcome. Returns `false` when the surface had already settled.
    pub fn settle(&mut self, outcome: Result<ComponentHandle, ResolveError>) -> bool {
        if self.phase.is_settled() {
            return false;
        }
        self.phase = match outcome {
            Ok(handle) => SurfacePhase::Ready(handle),
            Err(err) => SurfacePhase::Failed(err),
        };
        true
    }

    /// Error the rendering layer shows for a failed or timed-out slot.
    pub fn error(&self) -> Option<ResolveError> {
        match &self.phase {
            SurfacePhase::Failed(err) => Some(err.clone()),
            SurfacePhase::TimedOut => Some(ResolveError::TimedOut {
                key: self.key.clone(),
                timeout_ms: self.timeout_ms,
            }),
            _ => None,
        }
    }
}

/// Awaits `pending`, failing with [`ResolveError::TimedOut`] once `timeout_ms` elapses on `timer`.
///
/// The underlying load keeps running after a timeout and stays joinable by later requests.
pub async fn resolve_within(
    pending: PendingComponent,
    timer: &dyn TimerService,
    timeout_ms: u64,
) -> Result<ComponentHandle, ResolveError> {
    let key = pending.key().to_string();
    match future::select(pending, timer.sleep(timeout_ms)).await {
        Either::Left((outcome, _)) => outcome,
        Either::Right(((), _)) => {
            warn!(component_key = key.as_str(), timeout_ms, "component load timed out");
            Err(ResolveError::TimedOut { key, timeout_ms })
        }
    }
}
