//! Reconciliation: deciding what to send and what to accept.
//!
//! Given the local view plus both sides' goals and the remote's advertised
//! frontier, compute the hash sets flowing each way. Both peers run the
//! same computation; because each filters by the *other* side's goal when
//! sending and by its *own* goal when requesting, one round converges to
//! the intersection of both retention windows.

use std::collections::HashSet;

use weft_core::{Goal, MsgId};

use crate::view::TangleView;
use crate::wire::FrontierEntry;

/// The outcome of reconciling one frontier exchange.
#[derive(Debug, Clone)]
pub struct ReconcilePlan {
    /// Locally held messages the remote is missing and willing to hold,
    /// ordered oldest first.
    pub to_send: Vec<MsgId>,
    /// Remote-held messages we are missing and willing to hold. Incoming
    /// data frames must stay inside this set.
    pub to_request: Vec<MsgId>,
    /// Highest depth known across both frontiers; the windowing anchor.
    pub union_max: u64,
}

impl ReconcilePlan {
    /// Whether the exchange has nothing to move in either direction.
    pub fn is_settled(&self) -> bool {
        self.to_send.is_empty() && self.to_request.is_empty()
    }
}

/// Compute the transfer plan for one session.
///
/// `local_goal` / `remote_goal` are `None` when the respective side never
/// registered interest in this tangle: a side without a goal requests
/// nothing and is sent nothing, but still serves the other side's pull.
pub fn reconcile(
    local: &TangleView,
    local_goal: Option<Goal>,
    remote: &[FrontierEntry],
    remote_goal: Option<Goal>,
) -> ReconcilePlan {
    let remote_ids: HashSet<MsgId> = remote.iter().map(|e| e.id).collect();
    let remote_max = remote.iter().map(|e| e.depth).max().unwrap_or(0);
    let union_max = local.max_depth().max(remote_max);

    let to_send = match remote_goal {
        None => Vec::new(),
        Some(goal) => {
            let mut send: Vec<(u64, MsgId)> = local
                .frontier()
                .into_iter()
                .filter(|e| !remote_ids.contains(&e.id) && goal.admits(e.depth, union_max))
                .map(|e| (e.depth, e.id))
                .collect();
            send.sort();
            send.into_iter().map(|(_, id)| id).collect()
        }
    };

    let to_request = match local_goal {
        None => Vec::new(),
        Some(goal) => {
            let mut want: Vec<(u64, MsgId)> = remote
                .iter()
                .filter(|e| !local.contains(&e.id) && goal.admits(e.depth, union_max))
                .map(|e| (e.depth, e.id))
                .collect();
            want.sort();
            want.into_iter().map(|(_, id)| id).collect()
        }
    };

    ReconcilePlan {
        to_send,
        to_request,
        union_max,
    }
}
