//! Snapshot-based undo history.

use crate::scene::{SceneSnapshot, SceneStore};
use std::collections::VecDeque;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded undo stack of full scene snapshots.
///
/// A mutation is recorded in two steps: [`begin`](Self::begin) copies the
/// scene before anything changes, [`commit`](Self::commit) pushes that copy
/// once the mutation is complete. Gestures call `begin` when they first
/// mutate and `commit` on pointer-up, so a whole drag undoes in one step.
///
/// One-shot commands recorded while a snapshot is pending join that step
/// instead of pushing their own.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo_stack: VecDeque<SceneSnapshot>,
    pending: Option<SceneSnapshot>,
    /// A command was folded into the pending step, so it must be pushed
    /// even if the gesture itself changed nothing.
    pending_forced: bool,
    limit: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryManager {
    /// Create an empty history keeping at most `limit` snapshots.
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            pending: None,
            pending_forced: false,
            limit: limit.max(1),
        }
    }

    /// Capture the pre-mutation scene. Does nothing if a snapshot is
    /// already pending.
    pub fn begin(&mut self, scene: &SceneStore) {
        if self.pending.is_none() {
            self.pending = Some(scene.snapshot());
            self.pending_forced = false;
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Push the pending snapshot. Returns false if nothing was pending.
    pub fn commit(&mut self) -> bool {
        self.pending_forced = false;
        let Some(snapshot) = self.pending.take() else {
            return false;
        };
        self.push(snapshot);
        true
    }

    /// Drop the pending snapshot without recording it, unless a command was
    /// folded into it, in which case it is committed. Returns true if a
    /// step was pushed.
    pub fn discard(&mut self) -> bool {
        if self.pending_forced {
            return self.commit();
        }
        self.pending = None;
        false
    }

    /// Record the current scene as one undo step; call right before a
    /// one-shot mutation.
    ///
    /// While a snapshot is pending the command joins that step and nothing
    /// is pushed. Returns true if a step was pushed.
    pub fn record(&mut self, scene: &SceneStore) -> bool {
        if self.fold_into_pending() {
            return false;
        }
        self.push(scene.snapshot());
        true
    }

    /// Like [`record`](Self::record) for a snapshot taken before the
    /// mutation was attempted.
    pub fn record_snapshot(&mut self, snapshot: SceneSnapshot) -> bool {
        if self.fold_into_pending() {
            return false;
        }
        self.push(snapshot);
        true
    }

    fn fold_into_pending(&mut self) -> bool {
        if self.pending.is_some() {
            self.pending_forced = true;
            return true;
        }
        false
    }

    fn push(&mut self, snapshot: SceneSnapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }

    /// Restore the most recent snapshot and clear the selection.
    ///
    /// Any pending snapshot is dropped. Returns false on an empty stack, in
    /// which case the scene is left untouched.
    pub fn undo(&mut self, scene: &mut SceneStore) -> bool {
        self.pending = None;
        self.pending_forced = false;
        match self.undo_stack.pop_back() {
            Some(snapshot) => {
                scene.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Number of undo steps available.
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Forget all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.pending = None;
        self.pending_forced = false;
    }
}
