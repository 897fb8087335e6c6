//! Transactional settings: frames, the frame stack and its backing store.
//!
//! # Lifecycle
//!
//! ```text
//! enter settings UI ──▶ push()            depth 1 → 2
//! trial selection   ──▶ push()            depth 2 → 3
//!                       set(..) / resolver writes
//! cancel trial      ──▶ restore(2)        changes discarded
//! accept            ──▶ merge_down()      depth 3 → 2, changes kept
//! save              ──▶ commit_all()      flattened to depth 1, store flushed
//! ```

pub mod frame;
pub mod stack;
pub mod store;
pub mod value;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use frame::SettingsFrame;
pub use stack::{SettingsStack, StackError};
pub use store::{MemoryStore, SettingsStore, TomlSettingsStore};
pub use value::{keys, SettingValue, SettingsMap};
