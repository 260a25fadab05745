use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::state::Phase;
use crate::error::ZeroEntryError;

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every item was dispatched and the operator closed keep-alive.
    Completed {
        dispatched: usize,
        keepalive_ticks: u32,
    },
    /// The operator cancelled before item `at` (1-based); it and every later
    /// item were never dispatched.
    Cancelled { at: usize, dispatched: usize },
}

/// Mutable state of one run, owned by the dispatcher.
#[derive(Debug)]
pub struct RunState {
    pub id: String,
    pub total: usize,
    /// Zero-based index of the next item to dispatch.
    pub index: usize,
    pub phase: Phase,
    pub history: Vec<Phase>,
    pub keepalive_ticks: u32,
    pub started_at: DateTime<Utc>,
    started: Instant,
    paused_since: Option<Instant>,
    paused_for: Duration,
    active_for: Duration,
}

impl RunState {
    pub fn new(total: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            total,
            index: 0,
            phase: Phase::Gate,
            history: Vec::new(),
            keepalive_ticks: 0,
            started_at: Utc::now(),
            started: Instant::now(),
            paused_since: None,
            paused_for: Duration::ZERO,
            active_for: Duration::ZERO,
        }
    }

    /// Moves to `next`, recording the phase being left.
    ///
    /// An illegal transition is refused and leaves the run untouched.
    pub fn enter(&mut self, next: Phase) -> Result<(), ZeroEntryError> {
        if !self.phase.can_advance_to(next) {
            warn!(from = %self.phase, to = %next, "refusing phase transition");
            return Err(ZeroEntryError::IllegalTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!(from = %self.phase, to = %next, "phase change");
        if next.is_terminal() {
            info!(run_id = %self.id, phase = %next, dispatched = self.index, "run ended");
        }
        match next {
            Phase::Paused => self.paused_since = Some(Instant::now()),
            _ if self.phase == Phase::Paused => {
                if let Some(since) = self.paused_since.take() {
                    self.paused_for += since.elapsed();
                }
            }
            _ => {}
        }
        self.history.push(self.phase);
        self.phase = next;
        Ok(())
    }

    pub fn dispatched(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.total - self.index
    }

    /// Records that the current item finished after `took`.
    pub fn item_done(&mut self, took: Duration) {
        self.active_for += took;
        self.index += 1;
    }

    pub fn paused_for(&self) -> Duration {
        self.paused_for
    }

    pub fn active_for(&self) -> Duration {
        self.active_for
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Structured report produced when a run ends without failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub source: Option<PathBuf>,
    pub total: usize,
    pub outcome: RunOutcome,
    pub phase_transitions: Vec<Phase>,
    pub keepalive_ticks: u32,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub active_ms: u64,
    pub paused_ms: u64,
}

impl RunReport {
    pub fn from_run(run: &RunState, outcome: RunOutcome) -> Self {
        let mut transitions = run.history.clone();
        transitions.push(run.phase);
        Self {
            run_id: run.id.clone(),
            source: None,
            total: run.total,
            outcome,
            phase_transitions: transitions,
            keepalive_ticks: run.keepalive_ticks,
            started_at: run.started_at,
            completed_at: Utc::now(),
            duration_ms: run.elapsed().as_millis() as u64,
            active_ms: run.active_for().as_millis() as u64,
            paused_ms: run.paused_for().as_millis() as u64,
        }
    }

    pub fn with_source(mut self, source: PathBuf) -> Self {
        self.source = Some(source);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_defaults() {
        let run = RunState::new(4);
        assert_eq!(run.phase, Phase::Gate);
        assert_eq!(run.index, 0);
        assert_eq!(run.remaining(), 4);
        assert!(run.history.is_empty());
        assert!(!run.id.is_empty());
    }

    #[test]
    fn enter_records_history() {
        let mut run = RunState::new(1);
        run.enter(Phase::Settling).unwrap();
        run.enter(Phase::Dispatching).unwrap();
        assert_eq!(run.history, vec![Phase::Gate, Phase::Settling]);
        assert_eq!(run.phase, Phase::Dispatching);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_time_is_accumulated() {
        let mut run = RunState::new(2);
        run.enter(Phase::Settling).unwrap();
        run.enter(Phase::Dispatching).unwrap();
        run.enter(Phase::Paused).unwrap();
        assert_eq!(run.phase, Phase::Paused);
        tokio::time::sleep(Duration::from_secs(3)).await;
        run.enter(Phase::Dispatching).unwrap();
        assert_eq!(run.paused_for(), Duration::from_secs(3));
    }

    #[test]
    fn illegal_transition_is_refused() {
        let mut run = RunState::new(1);
        let err = run.enter(Phase::Done).unwrap_err();
        assert!(matches!(
            err,
            ZeroEntryError::IllegalTransition {
                from: Phase::Gate,
                to: Phase::Done
            }
        ));
        assert_eq!(run.phase, Phase::Gate);
        assert!(run.history.is_empty());
    }

    #[test]
    fn terminal_phases_accept_nothing() {
        let mut run = RunState::new(1);
        run.enter(Phase::Failed).unwrap();
        assert!(run.enter(Phase::Settling).is_err());
        assert_eq!(run.phase, Phase::Failed);
        assert_eq!(run.history, vec![Phase::Gate]);
    }

    #[test]
    fn item_done_advances_index() {
        let mut run = RunState::new(3);
        run.item_done(Duration::from_millis(2500));
        run.item_done(Duration::from_millis(3500));
        assert_eq!(run.dispatched(), 2);
        assert_eq!(run.remaining(), 1);
        assert_eq!(run.active_for(), Duration::from_secs(6));
    }

    #[test]
    fn report_from_run() {
        let mut run = RunState::new(2);
        run.enter(Phase::Settling).unwrap();
        run.enter(Phase::Dispatching).unwrap();
        run.enter(Phase::Cancelled).unwrap();
        let report = RunReport::from_run(
            &run,
            RunOutcome::Cancelled {
                at: 1,
                dispatched: 0,
            },
        )
        .with_source("stock.xls".into());

        assert_eq!(report.run_id, run.id);
        assert_eq!(report.total, 2);
        assert_eq!(
            report.phase_transitions,
            vec![Phase::Gate, Phase::Settling, Phase::Dispatching, Phase::Cancelled]
        );
        assert_eq!(report.source, Some(PathBuf::from("stock.xls")));
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let json = serde_json::to_value(RunOutcome::Completed {
            dispatched: 3,
            keepalive_ticks: 1,
        })
        .unwrap();
        assert_eq!(json["kind"], "completed");
        assert_eq!(json["dispatched"], 3);
    }
}
