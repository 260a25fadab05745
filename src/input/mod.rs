//! Simulated input subsystem.
//!
//! The dispatcher only talks to the two traits defined here: an
//! [`InputSink`] that synthesizes keystrokes into whatever window has focus,
//! and a [`SignalSource`] that reports which operator keys are held right now.
//! [`dry_run`] provides a logging backend; the `os-input` feature adds a real
//! desktop backend in `os`.

pub mod dry_run;
#[cfg(feature = "os-input")]
pub mod os;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named keys the tool ever presses or watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Enter,
    Escape,
    Shift,
    Tab,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Enter => write!(f, "enter"),
            Key::Escape => write!(f, "esc"),
            Key::Shift => write!(f, "shift"),
            Key::Tab => write!(f, "tab"),
        }
    }
}

#[derive(Debug, Error)]
pub enum InputError {
    /// The backend could not be reached (no display, permissions revoked, ...).
    #[error("input subsystem unavailable: {0}")]
    Unavailable(String),

    /// The backend accepted the call but failed to deliver the event.
    #[error("failed to send {what}: {message}")]
    Rejected { what: String, message: String },
}

/// Destination of synthesized keyboard events.
pub trait InputSink {
    /// Types `text` character by character.
    fn type_text(&mut self, text: &str) -> Result<(), InputError>;

    /// Presses and releases a single named key.
    fn tap(&mut self, key: Key) -> Result<(), InputError>;
}

/// Snapshot of the operator interrupt keys at one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalState {
    pub cancel: bool,
    pub pause: bool,
}

impl SignalState {
    pub const IDLE: SignalState = SignalState {
        cancel: false,
        pause: false,
    };
}

/// Non-blocking query of the operator interrupt keys.
///
/// Polled synchronously by the dispatcher at fixed points, so a real event
/// subscription can replace the key-state query without touching dispatch
/// logic.
pub trait SignalSource {
    fn poll(&mut self) -> SignalState;
}
