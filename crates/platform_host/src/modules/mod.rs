//! Module-loading domain contracts and lightweight adapters.

mod source;

pub use source::{
    LoadedModule, MemoryModuleSource, ModuleSource, ModuleSourceFuture, NoopModuleSource,
};
