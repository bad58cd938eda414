//! Retention goals: how much of a tangle a peer wants to hold.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Declared retention policy for one tangle.
///
/// Parsed once from its string form (`"all"`, `"newest-<N>"`) at the
/// registry boundary; everything downstream operates on the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    /// Keep and replicate every reachable message.
    All,
    /// Keep only the n most recent messages of the feed backbone; older
    /// messages are eligible for deletion and are not requested from peers.
    Newest(u64),
}

impl Goal {
    /// Lower depth bound of the retention window, given the highest depth
    /// known across both peers. Messages with a depth below the bound fall
    /// outside the window.
    pub fn window_bound(&self, union_max_depth: u64) -> u64 {
        match self {
            Goal::All => 0,
            Goal::Newest(n) => union_max_depth.saturating_add(1).saturating_sub(*n),
        }
    }

    /// Check whether a message at the given depth falls inside the window.
    pub fn admits(&self, depth: u64, union_max_depth: u64) -> bool {
        depth >= self.window_bound(union_max_depth)
    }
}

impl FromStr for Goal {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Goal::All);
        }
        if let Some(n) = s.strip_prefix("newest-") {
            let n: u64 = n
                .parse()
                .map_err(|_| CoreError::InvalidGoal(s.to_string()))?;
            if n == 0 {
                return Err(CoreError::InvalidGoal(s.to_string()));
            }
            return Ok(Goal::Newest(n));
        }
        Err(CoreError::InvalidGoal(s.to_string()))
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::All => write!(f, "all"),
            Goal::Newest(n) => write!(f, "newest-{}", n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all() {
        assert_eq!("all".parse::<Goal>().unwrap(), Goal::All);
    }

    #[test]
    fn test_parse_newest() {
        assert_eq!("newest-5".parse::<Goal>().unwrap(), Goal::Newest(5));
        assert_eq!("newest-1".parse::<Goal>().unwrap(), Goal::Newest(1));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "ALL", "newest-", "newest-0", "newest-abc", "oldest-5", "newest-5x"] {
            assert!(bad.parse::<Goal>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_display_roundtrip() {
        for goal in [Goal::All, Goal::Newest(7)] {
            let s = goal.to_string();
            assert_eq!(s.parse::<Goal>().unwrap(), goal);
        }
    }

    #[test]
    fn test_window_bound() {
        // 10-message feed (depths 1..=10 above a depth-0 root), newest-5
        // keeps depths 6..=10.
        assert_eq!(Goal::Newest(5).window_bound(10), 6);
        assert!(Goal::Newest(5).admits(6, 10));
        assert!(!Goal::Newest(5).admits(5, 10));

        // Window larger than the tangle admits everything.
        assert_eq!(Goal::Newest(20).window_bound(10), 0);
        assert!(Goal::Newest(20).admits(0, 10));

        assert_eq!(Goal::All.window_bound(10), 0);
        assert!(Goal::All.admits(0, 10));
    }
}
