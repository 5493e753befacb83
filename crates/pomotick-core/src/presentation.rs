//! Display values derived from timer and tracker state.
//!
//! Everything here is a pure function of [`TimerState`], the phase durations
//! and [`SessionCounters`]. Nothing is cached; hosts recompute on every render.

use serde::{Deserialize, Serialize};

use crate::timer::{Phase, PhaseDurations, TimerState};
use crate::tracker::SessionCounters;

/// Mascot mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Idle,
    Working,
    OnBreak,
    SessionHappy,
    /// Declared for the mascot but never produced by any transition.
    Sleeping,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Idle => "idle",
            Mood::Working => "working",
            Mood::OnBreak => "on_break",
            Mood::SessionHappy => "session_happy",
            Mood::Sleeping => "sleeping",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationState {
    /// `MM:SS`
    pub clock_text: String,
    /// Elapsed share of the current phase, 0.0 ..= 1.0.
    pub progress_fraction: f64,
    pub mood: Mood,
    pub phase_label: String,
    pub message: String,
    /// Completed focus sessions over the daily goal, 0.0 ..= 1.0.
    pub goal_fraction: f64,
    pub celebration_active: bool,
}

pub fn derive(
    timer: &TimerState,
    durations: &PhaseDurations,
    counters: &SessionCounters,
) -> PresentationState {
    PresentationState {
        clock_text: clock_text(timer.remaining_secs),
        progress_fraction: progress_fraction(
            durations.duration_of(timer.phase),
            timer.remaining_secs,
        ),
        mood: mood(timer),
        phase_label: timer.phase.label().to_string(),
        message: message(timer).to_string(),
        goal_fraction: goal_fraction(counters),
        celebration_active: counters.celebration_active,
    }
}

pub fn mood(timer: &TimerState) -> Mood {
    match (timer.is_running, timer.phase) {
        (true, Phase::Focus) => Mood::Working,
        (true, Phase::Break) => Mood::OnBreak,
        (false, _) if timer.remaining_secs == 0 => Mood::SessionHappy,
        (false, _) => Mood::Idle,
    }
}

/// `(total - remaining) / total`, clamped. A zero total yields 0.0.
pub fn progress_fraction(total_secs: u64, remaining_secs: u64) -> f64 {
    if total_secs == 0 {
        return 0.0;
    }
    let elapsed = total_secs.saturating_sub(remaining_secs);
    (elapsed as f64 / total_secs as f64).clamp(0.0, 1.0)
}

pub fn clock_text(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

pub fn goal_fraction(counters: &SessionCounters) -> f64 {
    if counters.daily_goal == 0 {
        return 0.0;
    }
    (counters.completed_focus_sessions as f64 / counters.daily_goal as f64).clamp(0.0, 1.0)
}

pub fn message(timer: &TimerState) -> &'static str {
    match (timer.is_running, timer.phase) {
        (true, Phase::Focus) => "You're doing amazing! Keep it up!",
        (true, Phase::Break) => "Take a well-deserved break!",
        (false, _) => "Ready to start your next session?",
    }
}
