use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::input::Key;

/// One step of an entry protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Type(String),
    Tap(Key),
    Wait(Duration),
}

/// The closed set of ways to submit one identifier to the target.
///
/// Chosen once per item from its special flag; every call site goes through
/// [`EntryProtocol::actions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryProtocol {
    /// Identifier, confirm, confirm.
    Standard,
    /// Standard entry plus one extra confirmation for multi-layout items.
    Special,
}

impl fmt::Display for EntryProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryProtocol::Standard => write!(f, "standard"),
            EntryProtocol::Special => write!(f, "special"),
        }
    }
}

impl EntryProtocol {
    pub fn for_item(special: bool) -> Self {
        if special {
            EntryProtocol::Special
        } else {
            EntryProtocol::Standard
        }
    }

    fn confirmations(self) -> usize {
        match self {
            EntryProtocol::Standard => 2,
            EntryProtocol::Special => 3,
        }
    }

    /// Time spent in the confirmation gaps when each gap lasts `gap`.
    pub fn duration(self, gap: Duration) -> Duration {
        gap * self.confirmations() as u32
    }

    /// The keystroke script for `identifier`.
    pub fn actions(self, identifier: &str, confirm: Key, gap: Duration) -> Vec<Action> {
        let mut actions = vec![Action::Type(identifier.to_string())];
        for _ in 0..self.confirmations() {
            actions.push(Action::Wait(gap));
            actions.push(Action::Tap(confirm));
        }
        actions
    }
}
