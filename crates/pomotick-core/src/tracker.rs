//! Daily-goal tracking and the celebration flag.
//!
//! The tracker only reacts to [`CompletionEvent`]s. When a focus completion
//! brings the count up to the daily goal it raises the celebration flag and
//! hands back a [`CelebrationTicket`]; the host is expected to call
//! [`SessionTracker::expire_celebration`] with that ticket's generation once
//! the display window has elapsed. Dismissing early, or a fresh celebration,
//! bumps the generation so any outstanding expiry becomes a no-op.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::timer::{CompletionEvent, Phase};

/// Cumulative counters shown alongside the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub completed_focus_sessions: u32,
    pub daily_goal: u32,
    pub streak_days: u32,
    pub celebration_active: bool,
}

/// Request to clear a celebration after `display_for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelebrationTicket {
    pub generation: u64,
    pub display_for: Duration,
}

#[derive(Debug, Clone)]
pub struct SessionTracker {
    counters: SessionCounters,
    celebration_window: Duration,
    generation: u64,
}

impl SessionTracker {
    pub fn new(daily_goal: u32, celebration_window: Duration) -> Result<Self, ConfigError> {
        validate_goal(daily_goal)?;
        if celebration_window.is_zero() {
            return Err(ConfigError::invalid(
                "timer.celebration_display_secs",
                "celebration must be shown for at least one second",
            ));
        }
        Ok(Self {
            counters: SessionCounters {
                completed_focus_sessions: 0,
                daily_goal,
                streak_days: 0,
                celebration_active: false,
            },
            celebration_window,
            generation: 0,
        })
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn celebration_window(&self) -> Duration {
        self.celebration_window
    }

    /// Account for a finished phase.
    ///
    /// Breaks never count. A focus completion that lands exactly on the daily
    /// goal starts a celebration and returns the ticket for clearing it.
    pub fn on_completion(&mut self, event: CompletionEvent) -> Option<CelebrationTicket> {
        if event.completed_phase != Phase::Focus {
            return None;
        }

        self.counters.completed_focus_sessions =
            self.counters.completed_focus_sessions.saturating_add(1);
        tracing::debug!(
            completed = self.counters.completed_focus_sessions,
            goal = self.counters.daily_goal,
            "focus session counted"
        );

        if self.counters.completed_focus_sessions != self.counters.daily_goal {
            return None;
        }

        self.generation += 1;
        self.counters.celebration_active = true;
        tracing::info!(goal = self.counters.daily_goal, "daily goal reached");
        Some(CelebrationTicket {
            generation: self.generation,
            display_for: self.celebration_window,
        })
    }

    /// Clear the celebration now. Returns whether it was showing.
    pub fn dismiss_celebration(&mut self) -> bool {
        let was_active = self.counters.celebration_active;
        self.counters.celebration_active = false;
        // Outstanding tickets must not clear a later celebration.
        self.generation += 1;
        was_active
    }

    /// Clear the celebration if `generation` is still the live one.
    /// Returns whether anything was cleared.
    pub fn expire_celebration(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.counters.celebration_active {
            return false;
        }
        self.counters.celebration_active = false;
        true
    }

    pub fn set_daily_goal(&mut self, goal: u32) -> Result<(), ConfigError> {
        validate_goal(goal)?;
        self.counters.daily_goal = goal;
        Ok(())
    }

    /// Streak bookkeeping lives outside the tracker; this just records it.
    pub fn set_streak_days(&mut self, days: u32) {
        self.counters.streak_days = days;
    }
}

fn validate_goal(goal: u32) -> Result<(), ConfigError> {
    if goal == 0 {
        return Err(ConfigError::invalid(
            "goals.daily_goal",
            "daily goal must be at least one session",
        ));
    }
    Ok(())
}
