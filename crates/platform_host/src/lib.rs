//! Typed host-capability contracts used by the desktop runtime.
//!
//! This crate is the boundary between the runtime core and wherever app implementations and
//! timers actually come from. It exposes object-safe async traits plus in-memory and no-op
//! adapters that tests and embedded hosts share.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod host;
pub mod modules;
pub mod time;
pub mod timer;

pub use host::{HostServices, HostStrategy};
pub use modules::{
    LoadedModule, MemoryModuleSource, ModuleSource, ModuleSourceFuture, NoopModuleSource,
};
pub use time::{next_monotonic_timestamp_ms, unix_time_ms_now};
pub use timer::{DelayTimerService, ManualTimerService, TimerFuture, TimerService};
