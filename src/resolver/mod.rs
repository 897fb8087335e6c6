//! Configuration resolver: negotiates an [`EngineConfig`] for an engine.
//!
//! # Architecture
//!
//! ```text
//! ResolveRequest ──▶ ConfigResolver::resolve ──▶ EngineConfig
//!                        │        │
//!                        │        └─ TranscoderLocator (format bridging)
//!                        └─ CapabilityRegistry (read-only queries)
//!
//! ConfigResolver::resolve_into / repair_engine ──▶ SettingsStack top frame
//! ```
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use voice_pipeline_config::capability::{builtin_descriptors, RegistryBuilder};
//! use voice_pipeline_config::resolver::{ConfigResolver, ResolveRequest};
//! use voice_pipeline_config::settings::{MemoryStore, SettingsStack};
//!
//! let registry = RegistryBuilder::new().extend(builtin_descriptors()).build();
//! let stack = SettingsStack::open(Arc::new(MemoryStore::default())).unwrap();
//! let resolver = ConfigResolver::new(&registry);
//!
//! // Trial selection in its own frame.
//! stack.push();
//! let config = resolver
//!     .resolve_into(&ResolveRequest::new("google"), &stack)
//!     .unwrap();
//! assert!(config.use_cache);
//!
//! // Accept it.
//! stack.commit_all().unwrap();
//! assert_eq!(stack.current_settings().get("engine"), Some(&"google".into()));
//! ```

pub mod engine_config;
pub mod error;
pub mod negotiate;
pub mod request;
mod search;
pub mod transcoder;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use engine_config::{EngineConfig, TranscoderChoice};
pub use error::ResolveError;
pub use negotiate::ConfigResolver;
pub use request::ResolveRequest;
pub use transcoder::TranscoderLocator;
