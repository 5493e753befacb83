use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::presentation::PresentationState;
use crate::timer::{Phase, TimerState};
use crate::tracker::SessionCounters;

/// Every observable state change produces an Event.
/// Hosts subscribe to them to know when to re-render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// A phase ran out. The timer has already flipped to `next_phase`
    /// and stopped.
    PhaseCompleted {
        completed_phase: Phase,
        next_phase: Phase,
        at: DateTime<Utc>,
    },
    DailyGoalReached {
        completed_focus_sessions: u32,
        daily_goal: u32,
        at: DateTime<Utc>,
    },
    CelebrationCleared {
        reason: ClearReason,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        timer: TimerState,
        counters: SessionCounters,
        presentation: PresentationState,
        at: DateTime<Utc>,
    },
}

/// Why a celebration stopped being displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClearReason {
    Dismissed,
    Expired,
}
