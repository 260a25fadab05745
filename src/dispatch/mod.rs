//! Automation dispatcher.
//!
//! Plays a [`WorkList`] into the focused target one item at a time. Before
//! each item the operator keys are polled: cancel aborts the run, a pause
//! press suspends it until the next press. After the last item the dispatcher
//! keeps the target session alive until the operator presses cancel again.

pub mod protocol;

pub use protocol::{Action, EntryProtocol};

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::{Keys, Timings};
use crate::error::ZeroEntryError;
use crate::input::{InputError, InputSink, SignalSource};
use crate::pipeline::{WorkItem, WorkList};
use crate::state_machine::{Phase, RunOutcome, RunReport, RunState};

/// Operator-facing telemetry emitted after each dispatched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    /// 1-based position of the item just dispatched.
    pub index: usize,
    pub total: usize,
    pub percent: u8,
    pub eta: Duration,
    pub identifier: String,
    pub protocol: EntryProtocol,
}

/// Everything the operator console is told about a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started { total: usize },
    Progress(ProgressReport),
    Paused { at: usize },
    Resumed { at: usize },
    Cancelled { at: usize },
    KeepAlive { ticks: u32 },
}

/// Receives [`RunEvent`]s; the console renders them, tests collect them.
pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);
}

/// The mandatory operator acknowledgment before any keystroke is sent.
pub trait StartGate {
    fn acknowledge(&mut self) -> std::io::Result<()>;
}

/// Turns the polled pause level into presses: only a released→held change
/// counts, so holding the key does not toggle repeatedly.
#[derive(Debug, Default)]
struct PauseToggle {
    held: bool,
}

impl PauseToggle {
    fn pressed(&mut self, level: bool) -> bool {
        let edge = level && !self.held;
        self.held = level;
        edge
    }
}

/// What a run does after polling the operator keys at an item boundary.
enum Checkpoint {
    Proceed,
    Cancel,
}

/// Drives a [`WorkList`] into an [`InputSink`] under operator control.
///
/// Generic over the input backend and the key poller so the same loop runs
/// against the desktop, the dry-run logger or a scripted test double.
pub struct Dispatcher<S, P> {
    // Destination of the synthesized keystrokes.
    sink: S,
    // Source of the cancel and pause key levels.
    signals: P,
    // Delays between actions, items and polls.
    timings: Timings,
    // Which keys cancel, pause and confirm.
    keys: Keys,
    // Whether to hold the session open after the last item.
    keep_alive: bool,
}

impl<S: InputSink, P: SignalSource> Dispatcher<S, P> {
    /// Builds a dispatcher with keep-alive enabled.
    pub fn new(sink: S, signals: P, timings: Timings, keys: Keys) -> Self {
        Self {
            sink,
            signals,
            timings,
            keys,
            keep_alive: true,
        }
    }

    /// Disables the keep-alive phase; the run ends right after the last item.
    pub fn without_keep_alive(mut self) -> Self {
        self.keep_alive = false;
        self
    }

    /// Nominal time one item occupies under `protocol`: its confirmation
    /// gaps plus the pause before the next item.
    pub fn item_estimate(&self, protocol: EntryProtocol) -> Duration {
        protocol.duration(self.timings.action_delay()) + self.timings.item_delay()
    }

    /// Nominal time left for `items`, priced by each item's own protocol.
    pub fn estimate(&self, items: &[WorkItem]) -> Duration {
        items
            .iter()
            .map(|item| self.item_estimate(EntryProtocol::for_item(item.special)))
            .sum()
    }

    /// Runs the whole work list: gate, settle, dispatch, keep-alive.
    ///
    /// Returns a report when the run completes or the operator cancels. A
    /// failing gate or input backend aborts the run with an error.
    pub async fn run(
        &mut self,
        work: &WorkList,
        gate: &mut dyn StartGate,
        observer: &mut dyn RunObserver,
    ) -> Result<RunReport, ZeroEntryError> {
        let mut run = RunState::new(work.len());
        info!(run_id = %run.id, total = run.total, "waiting for operator acknowledgment");

        if let Err(e) = gate.acknowledge() {
            run.enter(Phase::Failed)?;
            return Err(e.into());
        }
        run.enter(Phase::Settling)?;
        sleep(self.timings.settle_delay()).await;

        run.enter(Phase::Dispatching)?;
        observer.on_event(&RunEvent::Started { total: run.total });

        let mut toggle = PauseToggle::default();
        while run.index < run.total {
            let item = &work.items()[run.index];

            if let Checkpoint::Cancel = self.checkpoint(&mut run, &mut toggle, observer).await? {
                let at = run.index + 1;
                info!(at, "run cancelled by operator");
                run.enter(Phase::Cancelled)?;
                observer.on_event(&RunEvent::Cancelled { at });
                let outcome = RunOutcome::Cancelled {
                    at,
                    dispatched: run.dispatched(),
                };
                return Ok(RunReport::from_run(&run, outcome));
            }

            let protocol = EntryProtocol::for_item(item.special);
            let began = Instant::now();
            if let Err(source) = self.play(protocol, &item.identifier).await {
                run.enter(Phase::Failed)?;
                return Err(ZeroEntryError::Dispatch {
                    index: run.index + 1,
                    total: run.total,
                    identifier: item.identifier.clone(),
                    source,
                });
            }
            sleep(self.timings.item_delay()).await;
            run.item_done(began.elapsed());

            let report = self.progress(&run, work, item, protocol);
            observer.on_event(&RunEvent::Progress(report));
        }

        run.enter(Phase::KeepAlive)?;
        if let Err(source) = self.keep_alive(&mut run, observer).await {
            run.enter(Phase::Failed)?;
            return Err(ZeroEntryError::Dispatch {
                index: run.total,
                total: run.total,
                identifier: "keep-alive".into(),
                source,
            });
        }
        run.enter(Phase::Done)?;

        let outcome = RunOutcome::Completed {
            dispatched: run.dispatched(),
            keepalive_ticks: run.keepalive_ticks,
        };
        info!(run_id = %run.id, ?outcome, "run finished");
        Ok(RunReport::from_run(&run, outcome))
    }

    /// Polls the operator keys at an item boundary, blocking while paused.
    async fn checkpoint(
        &mut self,
        run: &mut RunState,
        toggle: &mut PauseToggle,
        observer: &mut dyn RunObserver,
    ) -> Result<Checkpoint, ZeroEntryError> {
        let state = self.signals.poll();
        let pressed = toggle.pressed(state.pause);
        if state.cancel {
            return Ok(Checkpoint::Cancel);
        }
        if !pressed {
            return Ok(Checkpoint::Proceed);
        }

        let at = run.index + 1;
        run.enter(Phase::Paused)?;
        observer.on_event(&RunEvent::Paused { at });
        loop {
            sleep(self.timings.pause_poll()).await;
            let state = self.signals.poll();
            let pressed = toggle.pressed(state.pause);
            if state.cancel {
                return Ok(Checkpoint::Cancel);
            }
            if pressed {
                break;
            }
        }
        run.enter(Phase::Dispatching)?;
        observer.on_event(&RunEvent::Resumed { at });
        Ok(Checkpoint::Proceed)
    }

    async fn play(&mut self, protocol: EntryProtocol, identifier: &str) -> Result<(), InputError> {
        let actions = protocol.actions(identifier, self.keys.confirm, self.timings.action_delay());
        debug!(identifier, %protocol, steps = actions.len(), "entering item");
        for action in actions {
            match action {
                Action::Type(text) => self.sink.type_text(&text)?,
                Action::Tap(key) => self.sink.tap(key)?,
                Action::Wait(gap) => sleep(gap).await,
            }
        }
        Ok(())
    }

    fn progress(
        &self,
        run: &RunState,
        work: &WorkList,
        item: &WorkItem,
        protocol: EntryProtocol,
    ) -> ProgressReport {
        let index = run.dispatched();
        ProgressReport {
            index,
            total: run.total,
            percent: (index * 100 / run.total) as u8,
            eta: self.estimate(&work.items()[index..]),
            identifier: item.identifier.clone(),
            protocol,
        }
    }

    /// Sends a harmless confirmation every keep-alive interval until the
    /// operator presses cancel.
    async fn keep_alive(
        &mut self,
        run: &mut RunState,
        observer: &mut dyn RunObserver,
    ) -> Result<(), InputError> {
        if !self.keep_alive {
            return Ok(());
        }
        info!("all items entered; keeping the session alive");
        let step = self.timings.pause_poll();
        let interval = self.timings.keepalive_interval();
        let mut waited = Duration::ZERO;
        loop {
            if self.signals.poll().cancel {
                return Ok(());
            }
            sleep(step).await;
            waited += step;
            if waited >= interval {
                self.sink.tap(self.keys.confirm)?;
                run.keepalive_ticks += 1;
                waited = Duration::ZERO;
                observer.on_event(&RunEvent::KeepAlive {
                    ticks: run.keepalive_ticks,
                });
            }
        }
    }
}
