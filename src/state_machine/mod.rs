mod run;
mod state;

pub use run::{RunOutcome, RunReport, RunState};
pub use state::Phase;
