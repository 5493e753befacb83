//! Side-effect hook fired when a phase finishes.
//!
//! Playing audio is left to the host; the core only decides *when* a cue is
//! due. The default [`LogChime`] writes the cue to the log.

use crate::timer::CompletionEvent;

/// Receives one call per phase completion while sound is enabled.
pub trait CompletionAlert: Send {
    fn phase_completed(&mut self, event: &CompletionEvent);
}

/// Emits the cue as a log line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogChime;

impl CompletionAlert for LogChime {
    fn phase_completed(&mut self, event: &CompletionEvent) {
        tracing::info!(phase = event.completed_phase.as_str(), "Ding! Timer complete");
    }
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl CompletionAlert for Silent {
    fn phase_completed(&mut self, _event: &CompletionEvent) {}
}

impl<F> CompletionAlert for F
where
    F: FnMut(&CompletionEvent) + Send,
{
    fn phase_completed(&mut self, event: &CompletionEvent) {
        self(event)
    }
}
