//! The Replicator: the host-facing API for tangle replication.
//!
//! Hosts register retention goals, hand over established connections, and
//! trigger sync rounds; everything else (frontier exchange, reconciliation,
//! transfer, retention) happens inside.

use std::sync::Arc;

use weft_core::{Goal, MsgId};
use weft_store::MsgStore;
use weft_sync::{
    Connection, Coordinator, GoalRegistry, PeerId, PruneReport, SessionReport, SyncConfig,
};

use crate::error::Result;

/// Configuration for the replicator.
#[derive(Debug, Clone, Default)]
pub struct ReplicatorConfig {
    /// Session behavior.
    pub sync: SyncConfig,
    /// Whether registering a `newest-<N>` goal immediately trims local
    /// history to the new window. Off by default: retention is otherwise
    /// enforced after sync rounds and by explicit [`Replicator::prune`]
    /// calls.
    pub prune_on_goal_update: bool,
}

/// The main replicator handle.
///
/// Owns the goal registry and the replication coordinator over a
/// host-provided store. Connections come from the transport collaborator
/// via [`Replicator::attach`].
pub struct Replicator<S: MsgStore + 'static> {
    store: Arc<S>,
    registry: Arc<GoalRegistry>,
    coordinator: Arc<Coordinator<S>>,
    config: ReplicatorConfig,
}

impl<S: MsgStore + 'static> Replicator<S> {
    /// Create a replicator over the given store.
    pub fn new(store: S, config: ReplicatorConfig) -> Self {
        Self::with_store(Arc::new(store), config)
    }

    /// Create a replicator over a shared store handle.
    pub fn with_store(store: Arc<S>, config: ReplicatorConfig) -> Self {
        let registry = Arc::new(GoalRegistry::new());
        let coordinator = Arc::new(Coordinator::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            config.sync.clone(),
        ));
        Self {
            store,
            registry,
            coordinator,
            config,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register (or replace) the retention goal for a tangle.
    ///
    /// `spec` is `"all"` or `"newest-<N>"`; anything else is rejected
    /// before any protocol exchange. Registering a goal does not itself
    /// start a sync; with [`ReplicatorConfig::prune_on_goal_update`] set,
    /// a `newest` goal trims local history right away.
    pub async fn set_goal(&self, root: MsgId, spec: &str) -> Result<Goal> {
        let goal: Goal = spec.parse().map_err(crate::error::ReplicatorError::Input)?;
        self.registry.set_goal(root, goal);
        tracing::debug!(%root, %goal, "goal registered");

        if self.config.prune_on_goal_update {
            if let Goal::Newest(n) = goal {
                weft_sync::prune(&*self.store, root, n).await?;
            }
        }
        Ok(goal)
    }

    /// The registered goal for a tangle, or `None` for "no interest".
    pub fn goal(&self, root: &MsgId) -> Option<Goal> {
        self.registry.goal_for(root)
    }

    /// Drop interest in a tangle.
    pub fn clear_goal(&self, root: &MsgId) {
        self.registry.clear_goal(root);
    }

    /// Register an established connection (the transport's "connected"
    /// event). The connection is served until its peer closes it.
    pub fn attach(&self, conn: Arc<dyn Connection>) {
        self.coordinator.attach(conn);
    }

    /// Trigger a sync round over every registered tangle and live
    /// connection. Idempotent while sessions are in flight. Returns the
    /// per-tangle reports of the sessions this call started; a failed
    /// report is the signal for the caller's retry policy.
    pub async fn initiate(&self) -> Vec<SessionReport> {
        self.coordinator.initiate().await
    }

    /// Wait until all sessions (including ones serving remote initiators)
    /// are finished.
    pub async fn wait_idle(&self) {
        self.coordinator.wait_idle().await;
    }

    /// Explicit local retention enforcement: trim the tangle to its
    /// `keep` most recent messages. The root message always survives.
    pub async fn prune(&self, root: MsgId, keep: u64) -> Result<PruneReport> {
        Ok(weft_sync::prune(&*self.store, root, keep).await?)
    }

    /// Peers with a live connection.
    pub fn peers(&self) -> Vec<PeerId> {
        self.coordinator.peers()
    }
}
