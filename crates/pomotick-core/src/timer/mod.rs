mod engine;
mod phase;

pub use engine::{CompletionEvent, TimerEngine, TimerState};
pub use phase::{Phase, PhaseDurations};
