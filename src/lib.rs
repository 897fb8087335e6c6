//! Speech-pipeline configuration: picks a compatible engine, player,
//! transport, audio format and optional transcoder, and keeps the choice in
//! a transactional settings stack.
//!
//! # Modules
//!
//! ```text
//! capability ──▶ resolver ──▶ settings
//!  (registry)    (negotiation)  (frames, store, snapshot)
//!
//! config: AppConfig / AppPaths used by the binary at startup
//! ```

pub mod capability;
pub mod config;
pub mod resolver;
pub mod settings;
