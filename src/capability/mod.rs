//! Capability registry: what every engine, player and transcoder supports.
//!
//! # Architecture
//!
//! ```text
//! builtin_descriptors() ──┐
//!                         ├─▶ RegistryBuilder ──build()──▶ CapabilityRegistry
//! load_descriptors(path) ─┘        (disable ids)              │
//!                                                             ├─ engine / player / transcoder lookup
//!                                                             ├─ output_formats / input_formats
//!                                                             └─ is_valid_setting / validator
//! ```
//!
//! The registry is immutable once built; the resolver only queries it.

pub mod descriptor;
pub mod registry;
pub mod types;
pub mod validator;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use descriptor::{
    builtin_descriptors, load_descriptors, AdapterDescriptor, CapabilityError, EngineInfo,
    PlayerInfo, SettingSpec, TranscoderInfo, DEFAULT_RANK,
};
pub use registry::{CapabilityRegistry, RegistryBuilder};
pub use types::{AudioType, ParseEnumError, PlayerMode};
pub use validator::Validator;
