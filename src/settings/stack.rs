//! Transactional settings stack.
//!
//! ```text
//!  depth 3 │ trial frame      ◀── reads / writes go here
//!  depth 2 │ settings UI frame
//!  depth 1 │ base frame       ◀── mirrors the persistent store
//!          └──────────────────
//!  committed snapshot (ArcSwap) ◀── background readers, no lock
//! ```
//!
//! Every mutating operation runs under one reentrant lock, so a caller can
//! wrap several operations in [`SettingsStack::transaction`] and have them
//! appear atomic to other threads. Background consumers read the committed
//! base frame through [`SettingsStack::current_settings`], which never takes
//! the lock; only [`SettingsStack::commit`] replaces that snapshot, in a
//! single pointer swap.

use std::cell::RefCell;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::ReentrantMutex;
use thiserror::Error;

use super::frame::SettingsFrame;
use super::store::SettingsStore;
use super::value::{SettingValue, SettingsMap};

// ---------------------------------------------------------------------------
// StackError
// ---------------------------------------------------------------------------

/// Errors from stack operations. A failed operation leaves the stack
/// untouched.
#[derive(Debug, Error)]
pub enum StackError {
    /// A restore or merge would pop below the caller's entry depth (or
    /// below the base frame).
    #[error("cannot reduce stack to depth {target}: entry depth is {floor}")]
    Underflow { target: usize, floor: usize },

    /// `commit` was called while trial frames are still open.
    #[error("commit requires depth 1, stack is at depth {depth}")]
    NotAtBase { depth: usize },

    /// The persistent store refused the committed values.
    #[error("settings store commit failed: {0:#}")]
    Store(anyhow::Error),
}

// ---------------------------------------------------------------------------
// SettingsStack
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StackState {
    frames: Vec<SettingsFrame>,
    /// Entry depths recorded by [`SettingsStack::enter`], innermost last.
    floors: Vec<usize>,
}

impl StackState {
    fn top(&self) -> &SettingsFrame {
        // `frames` is never empty: every pop is bounded by a floor >= 1.
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut SettingsFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn floor(&self) -> usize {
        self.floors.last().copied().unwrap_or(1).max(1)
    }
}

/// Ordered stack of copy-on-write settings frames.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use voice_pipeline_config::settings::{MemoryStore, SettingsStack};
///
/// let stack = SettingsStack::open(Arc::new(MemoryStore::default())).unwrap();
/// let depth = stack.depth();
///
/// stack.push();
/// stack.set("engine", "piper");
/// stack.restore(depth).unwrap();
///
/// assert!(stack.get("engine").is_none());
/// ```
pub struct SettingsStack {
    state: ReentrantMutex<RefCell<StackState>>,
    committed: ArcSwap<SettingsMap>,
    store: Arc<dyn SettingsStore>,
}

impl std::fmt::Debug for SettingsStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStack")
            .field("depth", &self.depth())
            .finish_non_exhaustive()
    }
}

impl SettingsStack {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Seed the base frame from `store`.
    pub fn open(store: Arc<dyn SettingsStore>) -> anyhow::Result<Self> {
        let values = store.load()?;
        log::debug!("settings stack seeded with {} value(s)", values.len());
        Ok(Self {
            committed: ArcSwap::from_pointee(values.clone()),
            state: ReentrantMutex::new(RefCell::new(StackState {
                frames: vec![SettingsFrame::new(values)],
                floors: Vec::new(),
            })),
            store,
        })
    }

    /// Run `f` while holding the configuration lock.
    ///
    /// The lock is reentrant, so `f` may call any stack method.
    pub fn transaction<R>(&self, f: impl FnOnce(&Self) -> R) -> R {
        let _guard = self.state.lock();
        f(self)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn depth(&self) -> usize {
        self.state.lock().borrow().frames.len()
    }

    /// Value of `key` in the top frame.
    pub fn get(&self, key: &str) -> Option<SettingValue> {
        self.state.lock().borrow().top().get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    /// Copy of the top frame's values.
    pub fn snapshot(&self) -> SettingsMap {
        self.state.lock().borrow().top().values().clone()
    }

    /// Whether the top frame has been written since it was created.
    pub fn is_changed(&self) -> bool {
        self.state.lock().borrow().top().is_changed()
    }

    /// The committed base frame. Lock-free; safe to call from any thread.
    pub fn current_settings(&self) -> Arc<SettingsMap> {
        self.committed.load_full()
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Snapshot the top frame into a new top frame; returns the new depth.
    pub fn push(&self) -> usize {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let frame = state.top().snapshot();
        state.frames.push(frame);
        log::debug!("settings frame pushed, depth {}", state.frames.len());
        state.frames.len()
    }

    /// Write into the top frame; returns whether the value changed.
    pub fn set(&self, key: &str, value: impl Into<SettingValue>) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.top_mut().set(key, value.into())
    }

    /// Remove `key` from the top frame; returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.top_mut().remove(key)
    }

    /// Pop frames until the depth is `target`, discarding their changes.
    ///
    /// Rejected without touching the stack when `target` is below the
    /// current entry depth. A `target` above the current depth is a no-op.
    pub fn restore(&self, target: usize) -> Result<usize, StackError> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let floor = state.floor();
        if target < floor {
            log::error!(
                "refusing to restore settings stack to depth {target} (entry depth {floor})"
            );
            return Err(StackError::Underflow { target, floor });
        }
        if state.frames.len() > target {
            state.frames.truncate(target);
            log::debug!("settings stack restored to depth {target}");
        }
        Ok(state.frames.len())
    }

    /// Flatten the top frame into the frame below it; returns the new depth.
    pub fn merge_down(&self) -> Result<usize, StackError> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let target = state.frames.len() - 1;
        let floor = state.floor();
        if target < floor {
            log::error!("refusing to merge settings frame below entry depth {floor}");
            return Err(StackError::Underflow { target, floor });
        }
        if let Some(top) = state.frames.pop() {
            state.top_mut().replace(top.into_values());
        }
        log::debug!("settings frame merged, depth {}", state.frames.len());
        Ok(state.frames.len())
    }

    /// Flush the base frame to the persistent store and publish it to
    /// [`current_settings`](Self::current_settings).
    ///
    /// Only valid at depth 1.
    pub fn commit(&self) -> Result<(), StackError> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let depth = state.frames.len();
        if depth != 1 {
            return Err(StackError::NotAtBase { depth });
        }

        let values = state.top().values().clone();
        self.store.commit(&values).map_err(StackError::Store)?;
        self.committed.store(Arc::new(values));
        state.top_mut().mark_clean();
        log::debug!("settings committed");
        Ok(())
    }

    /// Merge every frame down to the base and commit.
    pub fn commit_all(&self) -> Result<(), StackError> {
        self.transaction(|stack| {
            while stack.depth() > 1 {
                stack.merge_down()?;
            }
            stack.commit()
        })
    }

    // -----------------------------------------------------------------------
    // Caller context
    // -----------------------------------------------------------------------

    /// Record the current depth as the entry depth of a new caller context;
    /// `restore` and `merge_down` will not go below it until
    /// [`leave`](Self::leave). Returns the recorded depth.
    pub fn enter(&self) -> usize {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let depth = state.frames.len();
        state.floors.push(depth);
        depth
    }

    /// Drop the innermost entry depth; returns it, if any.
    pub fn leave(&self) -> Option<usize> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.floors.pop()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemoryStore;

    fn seeded() -> (Arc<MemoryStore>, SettingsStack) {
        let mut values = SettingsMap::new();
        values.insert("k".into(), "base".into());
        let store = Arc::new(MemoryStore::new(values));
        let stack = SettingsStack::open(store.clone()).expect("open");
        (store, stack)
    }

    #[test]
    fn starts_at_depth_one_with_store_values() {
        let (_, stack) = seeded();
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.get_str("k").as_deref(), Some("base"));
        assert_eq!(stack.current_settings().get("k"), Some(&"base".into()));
    }

    #[test]
    fn push_set_restore_rolls_back() {
        let (_, stack) = seeded();
        let original = stack.depth();

        assert_eq!(stack.push(), original + 1);
        assert!(stack.set("k", "v"));
        assert_eq!(stack.get_str("k").as_deref(), Some("v"));

        assert_eq!(stack.restore(original).expect("restore"), original);
        assert_eq!(stack.get_str("k").as_deref(), Some("base"));
    }

    #[test]
    fn restore_never_removes_base_frame() {
        let (_, stack) = seeded();
        stack.push();
        let err = stack.restore(0).unwrap_err();
        assert!(matches!(err, StackError::Underflow { target: 0, floor: 1 }));
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn restore_below_entry_depth_is_rejected() {
        let (_, stack) = seeded();
        stack.push();
        let entry = stack.enter();
        stack.push();
        stack.set("k", "trial");

        assert!(stack.restore(entry - 1).is_err());
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.get_str("k").as_deref(), Some("trial"));

        stack.restore(entry).expect("restore to entry");
        assert_eq!(stack.depth(), entry);

        assert_eq!(stack.leave(), Some(entry));
        stack.restore(1).expect("restore after leave");
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn set_reports_change_against_top_frame() {
        let (_, stack) = seeded();
        stack.push();
        assert!(!stack.set("k", "base"));
        assert!(!stack.is_changed());
        assert!(stack.set("k", "new"));
        assert!(stack.is_changed());
    }

    #[test]
    fn merge_down_keeps_changes() {
        let (_, stack) = seeded();
        stack.push();
        stack.set("k", "kept");
        stack.push();
        stack.remove("k");
        stack.restore(2).expect("restore");

        assert_eq!(stack.merge_down().expect("merge"), 1);
        assert_eq!(stack.get_str("k").as_deref(), Some("kept"));
    }

    #[test]
    fn merge_down_at_base_is_rejected() {
        let (_, stack) = seeded();
        assert!(matches!(
            stack.merge_down(),
            Err(StackError::Underflow { target: 0, floor: 1 })
        ));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn commit_requires_base_depth() {
        let (store, stack) = seeded();
        stack.push();
        assert!(matches!(
            stack.commit(),
            Err(StackError::NotAtBase { depth: 2 })
        ));
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn uncommitted_base_writes_are_invisible_to_readers() {
        let (store, stack) = seeded();
        stack.set("k", "pending");
        assert_eq!(stack.current_settings().get("k"), Some(&"base".into()));

        stack.commit().expect("commit");
        assert_eq!(stack.current_settings().get("k"), Some(&"pending".into()));
        assert_eq!(store.values().get("k"), Some(&"pending".into()));
        assert!(!stack.is_changed());
    }

    #[test]
    fn commit_all_flattens_and_flushes() {
        let (store, stack) = seeded();
        stack.push();
        stack.set("a", 1_i64);
        stack.push();
        stack.set("b", true);

        stack.commit_all().expect("commit all");

        assert_eq!(stack.depth(), 1);
        let values = store.values();
        assert_eq!(values.get("a"), Some(&SettingValue::Int(1)));
        assert_eq!(values.get("b"), Some(&SettingValue::Bool(true)));
    }

    #[test]
    fn transaction_is_reentrant() {
        let (_, stack) = seeded();
        let depth = stack.transaction(|s| {
            s.push();
            s.transaction(|inner| {
                inner.set("k", "nested");
                inner.depth()
            })
        });
        assert_eq!(depth, 2);
        assert_eq!(stack.get_str("k").as_deref(), Some("nested"));
    }

    #[test]
    fn background_readers_see_only_committed_values() {
        let (_, stack) = seeded();
        let stack = Arc::new(stack);

        stack.push();
        stack.set("k", "trial");

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let stack = Arc::clone(&stack);
                std::thread::spawn(move || {
                    (0..100).all(|_| stack.current_settings().get("k") == Some(&"base".into()))
                })
            })
            .collect();

        for reader in readers {
            assert!(reader.join().expect("reader thread"));
        }
    }

    #[test]
    fn stack_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SettingsStack>();
    }
}
