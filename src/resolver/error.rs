//! Resolver error types.

use thiserror::Error;

/// Terminal failures of a resolution. Incompatible forced values are never
/// reported here; the resolver drops them and keeps searching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The engine id is not registered.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),

    /// The engine is registered but disabled.
    #[error("engine is disabled: {0}")]
    EngineDisabled(String),

    /// No player, mode, format and transcoder combination works for the
    /// engine. The caller must pick another engine.
    #[error("no usable configuration for engine {engine}")]
    NoConfiguration { engine: String },
}

impl ResolveError {
    pub fn engine(&self) -> &str {
        match self {
            ResolveError::UnknownEngine(engine) | ResolveError::EngineDisabled(engine) => engine,
            ResolveError::NoConfiguration { engine } => engine,
        }
    }
}
