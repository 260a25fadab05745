use std::fmt;

use serde::{Deserialize, Serialize};

/// Phases of one automation run.
///
/// A run flows: GATE → SETTLING → DISPATCHING (⇄ PAUSED) → KEEP_ALIVE → DONE,
/// and may end early in CANCELLED or FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Gate,
    Settling,
    Dispatching,
    Paused,
    KeepAlive,
    Done,
    Cancelled,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Gate => write!(f, "GATE"),
            Phase::Settling => write!(f, "SETTLING"),
            Phase::Dispatching => write!(f, "DISPATCHING"),
            Phase::Paused => write!(f, "PAUSED"),
            Phase::KeepAlive => write!(f, "KEEP_ALIVE"),
            Phase::Done => write!(f, "DONE"),
            Phase::Cancelled => write!(f, "CANCELLED"),
            Phase::Failed => write!(f, "FAILED"),
        }
    }
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Cancelled | Phase::Failed)
    }

    /// Whether a run in `self` may move to `next`.
    ///
    /// Cancellation is reachable only from item boundaries (dispatching or
    /// paused); failure from any phase that talks to the operator or target.
    pub fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Gate, Settling)
                | (Gate, Failed)
                | (Settling, Dispatching)
                | (Dispatching, Paused)
                | (Dispatching, KeepAlive)
                | (Dispatching, Cancelled)
                | (Dispatching, Failed)
                | (Paused, Dispatching)
                | (Paused, Cancelled)
                | (KeepAlive, Done)
                | (KeepAlive, Failed)
        )
    }
}
