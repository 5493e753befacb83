//! One focus session: the timer engine, the tracker and the completion cue
//! wired together.
//!
//! `FocusSession` is synchronous and clock-free. Completions flow
//! engine -> tracker inside [`FocusSession::tick`]; the celebration ticket is
//! handed back so the caller can schedule its expiry.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::alert::CompletionAlert;
use crate::config::Config;
use crate::error::ConfigError;
use crate::events::{ClearReason, Event};
use crate::presentation::{self, PresentationState};
use crate::timer::{PhaseDurations, TimerEngine, TimerState};
use crate::tracker::{CelebrationTicket, SessionCounters, SessionTracker};

/// Everything a renderer needs, captured at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timer: TimerState,
    pub counters: SessionCounters,
    pub presentation: PresentationState,
}

/// Result of one tick.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub events: Vec<Event>,
    /// Present when this tick started a celebration.
    pub celebration: Option<CelebrationTicket>,
}

impl TickOutcome {
    pub fn completed(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, Event::PhaseCompleted { .. }))
    }
}

pub struct FocusSession {
    engine: TimerEngine,
    tracker: SessionTracker,
    alert: Box<dyn CompletionAlert>,
    sound_enabled: bool,
}

impl FocusSession {
    pub fn new(engine: TimerEngine, tracker: SessionTracker, alert: Box<dyn CompletionAlert>) -> Self {
        Self {
            engine,
            tracker,
            alert,
            sound_enabled: true,
        }
    }

    /// Build a session from validated configuration.
    pub fn from_config(config: &Config, alert: Box<dyn CompletionAlert>) -> Result<Self, ConfigError> {
        config.validate()?;
        let durations = PhaseDurations::new(
            config.timer.focus_duration_secs,
            config.timer.break_duration_secs,
        )?;
        let mut tracker =
            SessionTracker::new(config.goals.daily_goal, config.timer.celebration_window())?;
        tracker.set_streak_days(config.goals.streak_days);

        let mut session = Self::new(TimerEngine::new(durations), tracker, alert);
        session.sound_enabled = config.notifications.sound_enabled;
        Ok(session)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn timer_state(&self) -> TimerState {
        self.engine.state()
    }

    pub fn counters(&self) -> SessionCounters {
        self.tracker.counters()
    }

    pub fn presentation(&self) -> PresentationState {
        presentation::derive(
            &self.engine.state(),
            &self.engine.durations(),
            &self.tracker.counters(),
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            timer: self.timer_state(),
            counters: self.counters(),
            presentation: self.presentation(),
        }
    }

    pub fn snapshot_event(&self) -> Event {
        let Snapshot {
            timer,
            counters,
            presentation,
        } = self.snapshot();
        Event::StateSnapshot {
            timer,
            counters,
            presentation,
            at: Utc::now(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.engine.start()
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.engine.pause()
    }

    pub fn toggle(&mut self) -> Option<Event> {
        self.engine.toggle()
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.engine.reset()
    }

    pub fn tick(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let Some(done) = self.engine.tick() else {
            return outcome;
        };

        outcome.events.push(Event::PhaseCompleted {
            completed_phase: done.completed_phase,
            next_phase: self.engine.phase(),
            at: Utc::now(),
        });

        if let Some(ticket) = self.tracker.on_completion(done) {
            let counters = self.tracker.counters();
            outcome.events.push(Event::DailyGoalReached {
                completed_focus_sessions: counters.completed_focus_sessions,
                daily_goal: counters.daily_goal,
                at: Utc::now(),
            });
            outcome.celebration = Some(ticket);
        }

        if self.sound_enabled {
            self.alert.phase_completed(&done);
        }
        outcome
    }

    pub fn set_daily_goal(&mut self, goal: u32) -> Result<(), ConfigError> {
        self.tracker.set_daily_goal(goal)
    }

    pub fn set_streak_days(&mut self, days: u32) {
        self.tracker.set_streak_days(days);
    }

    pub fn dismiss_celebration(&mut self) -> Option<Event> {
        self.tracker.dismiss_celebration().then(|| Event::CelebrationCleared {
            reason: ClearReason::Dismissed,
            at: Utc::now(),
        })
    }

    pub fn expire_celebration(&mut self, generation: u64) -> Option<Event> {
        self.tracker
            .expire_celebration(generation)
            .then(|| Event::CelebrationCleared {
                reason: ClearReason::Expired,
                at: Utc::now(),
            })
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) {
        self.sound_enabled = enabled;
    }

    /// Flip the sound cue on or off; returns the new setting.
    pub fn toggle_sound(&mut self) -> bool {
        self.sound_enabled = !self.sound_enabled;
        self.sound_enabled
    }
}

impl std::fmt::Debug for FocusSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusSession")
            .field("engine", &self.engine)
            .field("tracker", &self.tracker)
            .field("sound_enabled", &self.sound_enabled)
            .finish_non_exhaustive()
    }
}
