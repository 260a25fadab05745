use tracing::info;

use super::{InputError, InputSink, Key, SignalSource, SignalState};

/// Backend that logs every keystroke instead of sending it.
///
/// Its signal side never reports a held key; dry runs skip keep-alive.
#[derive(Debug, Default)]
pub struct DryRunInput {
    typed: usize,
    taps: usize,
}

impl DryRunInput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSink for DryRunInput {
    fn type_text(&mut self, text: &str) -> Result<(), InputError> {
        self.typed += 1;
        info!(text, n = self.typed, "dry-run: type");
        Ok(())
    }

    fn tap(&mut self, key: Key) -> Result<(), InputError> {
        self.taps += 1;
        info!(%key, n = self.taps, "dry-run: tap");
        Ok(())
    }
}

impl SignalSource for DryRunInput {
    fn poll(&mut self) -> SignalState {
        SignalState::IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_calls_and_never_signals() {
        let mut input = DryRunInput::new();
        input.type_text("A1").unwrap();
        input.tap(Key::Enter).unwrap();
        input.tap(Key::Enter).unwrap();
        assert_eq!((input.typed, input.taps), (1, 2));
        assert_eq!(input.poll(), SignalState::IDLE);
    }
}
