//! Goal registry: the process-wide map of desired retention per tangle.

use std::collections::HashMap;
use std::sync::RwLock;

use weft_core::{Goal, MsgId};

/// Process-wide goal registry, keyed by tangle root hash.
///
/// Last-write-wins: re-registering a goal for a root replaces the previous
/// one, it is never merged. Registering a goal has no side effects — it
/// neither starts a sync nor prunes anything.
#[derive(Debug, Default)]
pub struct GoalRegistry {
    goals: RwLock<HashMap<MsgId, Goal>>,
}

impl GoalRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or replace the goal for a tangle.
    pub fn set_goal(&self, root: MsgId, goal: Goal) {
        self.goals.write().unwrap().insert(root, goal);
    }

    /// The registered goal for a tangle, or `None` for "no interest".
    ///
    /// A root hash that never matched anything simply returns `None`;
    /// hash validation is the caller's responsibility.
    pub fn goal_for(&self, root: &MsgId) -> Option<Goal> {
        self.goals.read().unwrap().get(root).copied()
    }

    /// Remove a goal. Subsequent sessions treat the tangle as
    /// "no interest".
    pub fn clear_goal(&self, root: &MsgId) {
        self.goals.write().unwrap().remove(root);
    }

    /// Snapshot of all registered (root, goal) pairs.
    pub fn roots(&self) -> Vec<(MsgId, Goal)> {
        self.goals
            .read()
            .unwrap()
            .iter()
            .map(|(root, goal)| (*root, *goal))
            .collect()
    }
}
