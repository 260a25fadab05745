//! Desktop backend: `enigo` synthesizes events, `device_query` reads held keys.

use device_query::{DeviceQuery, DeviceState, Keycode};
use enigo::{Direction, Enigo, Keyboard, Settings};

use super::{InputError, InputSink, Key, SignalSource, SignalState};

pub struct OsInput {
    enigo: Enigo,
}

impl OsInput {
    pub fn new() -> Result<Self, InputError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InputError::Unavailable(e.to_string()))?;
        Ok(Self { enigo })
    }
}

fn enigo_key(key: Key) -> enigo::Key {
    match key {
        Key::Enter => enigo::Key::Return,
        Key::Escape => enigo::Key::Escape,
        Key::Shift => enigo::Key::Shift,
        Key::Tab => enigo::Key::Tab,
    }
}

impl InputSink for OsInput {
    fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        self.enigo.text(text).map_err(|e| InputError::Rejected {
            what: format!("text {text:?}"),
            message: e.to_string(),
        })
    }

    fn tap(&mut self, key: Key) -> Result<(), InputError> {
        self.enigo
            .key(enigo_key(key), Direction::Click)
            .map_err(|e| InputError::Rejected {
                what: key.to_string(),
                message: e.to_string(),
            })
    }
}

/// Polls the global keyboard state for the configured interrupt keys.
pub struct OsSignals {
    device: DeviceState,
    cancel: Key,
    pause: Key,
}

impl OsSignals {
    pub fn new(cancel: Key, pause: Key) -> Self {
        Self {
            device: DeviceState::new(),
            cancel,
            pause,
        }
    }
}

fn keycodes(key: Key) -> &'static [Keycode] {
    match key {
        Key::Enter => &[Keycode::Enter],
        Key::Escape => &[Keycode::Escape],
        Key::Shift => &[Keycode::LShift, Keycode::RShift],
        Key::Tab => &[Keycode::Tab],
    }
}

impl SignalSource for OsSignals {
    fn poll(&mut self) -> SignalState {
        let held = self.device.get_keys();
        let is_held = |key: Key| keycodes(key).iter().any(|k| held.contains(k));
        SignalState {
            cancel: is_held(self.cancel),
            pause: is_held(self.pause),
        }
    }
}
