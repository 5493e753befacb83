//! Timer engine implementation.
//!
//! The engine is a one-second-granularity countdown state machine. It does not
//! own a clock: the host calls `tick()` once per second while the engine is
//! running (see [`crate::driver`] for a tokio-based host).
//!
//! ## State Transitions
//!
//! ```text
//! stopped --start--> running --tick (remaining > 0)--> running
//! running --tick (remaining == 0)--> stopped, phase flipped, CompletionEvent
//! any --pause--> stopped          any --reset--> stopped, phase refilled
//! ```
//!
//! Reaching the end of a phase stops the countdown; the next phase only begins
//! once the user starts it again.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(PhaseDurations::default());
//! engine.start();
//! // Once per second:
//! if let Some(done) = engine.tick() { /* hand to the tracker */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseDurations};
use crate::events::Event;

/// Authoritative countdown state.
///
/// `remaining_secs` always lies in `[0, duration_of(phase)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_secs: u64,
    pub phase: Phase,
    pub is_running: bool,
}

/// Emitted exactly once per phase exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub completed_phase: Phase,
}

/// Core timer engine.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    durations: PhaseDurations,
    state: TimerState,
}

impl TimerEngine {
    /// Create an engine in the stopped state with a full focus phase ready.
    pub fn new(durations: PhaseDurations) -> Self {
        Self {
            durations,
            state: TimerState {
                remaining_secs: durations.duration_of(Phase::Focus),
                phase: Phase::Focus,
                is_running: false,
            },
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn remaining_secs(&self) -> u64 {
        self.state.remaining_secs
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    /// Nominal length of the current phase.
    pub fn total_secs(&self) -> u64 {
        self.durations.duration_of(self.state.phase)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or continue) counting down. Returns `None` if already running.
    pub fn start(&mut self) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        tracing::debug!(
            phase = self.state.phase.as_str(),
            remaining_secs = self.state.remaining_secs,
            "timer started"
        );
        Some(Event::TimerStarted {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Stop counting down, keeping the remaining time. Returns `None` if
    /// already stopped.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        tracing::debug!(
            phase = self.state.phase.as_str(),
            remaining_secs = self.state.remaining_secs,
            "timer paused"
        );
        Some(Event::TimerPaused {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Start if stopped, pause if running.
    pub fn toggle(&mut self) -> Option<Event> {
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Stop and refill the current phase. The phase itself is kept.
    pub fn reset(&mut self) -> Option<Event> {
        self.state.is_running = false;
        self.state.remaining_secs = self.total_secs();
        tracing::debug!(phase = self.state.phase.as_str(), "timer reset");
        Some(Event::TimerReset {
            phase: self.state.phase,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance the countdown by one second.
    ///
    /// Does nothing while stopped. A tick that finds the clock already at
    /// zero exhausts the phase: the phase flips, the clock is refilled for
    /// the new phase, the engine stops, and the exhausted phase is reported.
    pub fn tick(&mut self) -> Option<CompletionEvent> {
        if !self.state.is_running {
            return None;
        }
        if self.state.remaining_secs > 0 {
            self.state.remaining_secs -= 1;
            return None;
        }

        let completed_phase = self.state.phase;
        let next = completed_phase.next();
        self.state = TimerState {
            remaining_secs: self.durations.duration_of(next),
            phase: next,
            is_running: false,
        };
        tracing::info!(
            completed = completed_phase.as_str(),
            next = next.as_str(),
            "phase completed"
        );
        Some(CompletionEvent { completed_phase })
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(PhaseDurations::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn short_engine() -> TimerEngine {
        TimerEngine::new(PhaseDurations::new(3, 2).unwrap())
    }

    #[test]
    fn new_engine_is_stopped_at_full_focus() {
        let engine = TimerEngine::default();
        assert_eq!(
            engine.state(),
            TimerState {
                remaining_secs: 1500,
                phase: Phase::Focus,
                is_running: false,
            }
        );
    }

    #[test]
    fn start_is_idempotent() {
        let mut engine = short_engine();
        assert!(engine.start().is_some());
        assert!(engine.start().is_none());
        assert!(engine.is_running());
        assert_eq!(engine.remaining_secs(), 3);
    }

    #[test]
    fn pause_is_idempotent() {
        let mut engine = short_engine();
        assert!(engine.pause().is_none());
        engine.start();
        assert!(engine.pause().is_some());
        assert!(engine.pause().is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn start_keeps_remaining_time() {
        let mut engine = short_engine();
        engine.start();
        engine.tick();
        engine.pause();
        engine.start();
        assert_eq!(engine.remaining_secs(), 2);
    }

    #[test]
    fn toggle_flips_running() {
        let mut engine = short_engine();
        assert!(matches!(engine.toggle(), Some(Event::TimerStarted { .. })));
        assert!(engine.is_running());
        assert!(matches!(engine.toggle(), Some(Event::TimerPaused { .. })));
        assert!(!engine.is_running());
    }

    #[test]
    fn tick_while_stopped_is_ignored() {
        let mut engine = short_engine();
        assert!(engine.tick().is_none());
        assert_eq!(engine.state(), short_engine().state());
    }

    #[test]
    fn phase_exhausts_on_the_tick_after_zero() {
        let mut engine = short_engine();
        engine.start();
        for _ in 0..3 {
            assert!(engine.tick().is_none());
        }
        assert_eq!(engine.remaining_secs(), 0);
        assert!(engine.is_running());

        let done = engine.tick();
        assert_eq!(
            done,
            Some(CompletionEvent {
                completed_phase: Phase::Focus
            })
        );
        assert_eq!(
            engine.state(),
            TimerState {
                remaining_secs: 2,
                phase: Phase::Break,
                is_running: false,
            }
        );
    }

    #[test]
    fn break_exhaustion_returns_to_focus() {
        let mut engine = short_engine();
        engine.start();
        for _ in 0..4 {
            engine.tick();
        }
        engine.start();
        for _ in 0..2 {
            assert!(engine.tick().is_none());
        }
        assert_eq!(
            engine.tick(),
            Some(CompletionEvent {
                completed_phase: Phase::Break
            })
        );
        assert_eq!(engine.phase(), Phase::Focus);
        assert_eq!(engine.remaining_secs(), 3);
        assert!(!engine.is_running());
    }

    #[test]
    fn reset_refills_current_phase_without_flipping() {
        let mut engine = short_engine();
        engine.start();
        for _ in 0..4 {
            engine.tick();
        }
        engine.start();
        engine.tick();
        engine.reset();
        assert_eq!(
            engine.state(),
            TimerState {
                remaining_secs: 2,
                phase: Phase::Break,
                is_running: false,
            }
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Start,
        Pause,
        Reset,
        Toggle,
        Tick,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            1 => Just(Op::Start),
            1 => Just(Op::Pause),
            1 => Just(Op::Reset),
            1 => Just(Op::Toggle),
            4 => Just(Op::Tick),
        ]
    }

    fn apply(engine: &mut TimerEngine, op: &Op) -> Option<CompletionEvent> {
        match op {
            Op::Start => {
                engine.start();
                None
            }
            Op::Pause => {
                engine.pause();
                None
            }
            Op::Reset => {
                engine.reset();
                None
            }
            Op::Toggle => {
                engine.toggle();
                None
            }
            Op::Tick => engine.tick(),
        }
    }

    proptest! {
        #[test]
        fn remaining_stays_within_phase_bounds(
            focus in 1u64..6,
            brk in 1u64..6,
            ops in proptest::collection::vec(op(), 0..80),
        ) {
            let mut engine = TimerEngine::new(PhaseDurations::new(focus, brk).unwrap());
            for op in &ops {
                apply(&mut engine, op);
                prop_assert!(engine.remaining_secs() <= engine.total_secs());
            }
        }

        #[test]
        fn exhaustion_always_stops_the_timer(
            ops in proptest::collection::vec(op(), 0..80),
        ) {
            let mut engine = TimerEngine::new(PhaseDurations::new(2, 1).unwrap());
            for op in &ops {
                if apply(&mut engine, op).is_some() {
                    prop_assert!(!engine.is_running());
                    prop_assert_eq!(engine.remaining_secs(), engine.total_secs());
                }
            }
        }

        #[test]
        fn ticks_while_stopped_change_nothing(
            ops in proptest::collection::vec(op(), 0..40),
            extra in 1usize..20,
        ) {
            let mut engine = TimerEngine::new(PhaseDurations::new(4, 2).unwrap());
            for op in &ops {
                apply(&mut engine, op);
            }
            engine.pause();
            let before = engine.state();
            for _ in 0..extra {
                prop_assert!(engine.tick().is_none());
            }
            prop_assert_eq!(engine.state(), before);
        }

        #[test]
        fn reset_restores_full_phase(
            ops in proptest::collection::vec(op(), 0..60),
        ) {
            let mut engine = TimerEngine::new(PhaseDurations::new(3, 2).unwrap());
            for op in &ops {
                apply(&mut engine, op);
            }
            let phase = engine.phase();
            engine.reset();
            prop_assert_eq!(engine.phase(), phase);
            prop_assert_eq!(engine.remaining_secs(), engine.total_secs());
            prop_assert!(!engine.is_running());
        }

        /// Driving the engine continuously, restarting after every stop,
        /// a phase of length r ends every r + 1 ticks.
        #[test]
        fn exhaustions_follow_phase_lengths(
            focus in 1u64..5,
            brk in 1u64..5,
            n in 0u64..60,
        ) {
            let mut engine = TimerEngine::new(PhaseDurations::new(focus, brk).unwrap());
            let mut expected = 0u64;
            let mut budget = n;
            let mut phase = Phase::Focus;
            loop {
                let cost = engine.durations().duration_of(phase) + 1;
                if budget < cost {
                    break;
                }
                budget -= cost;
                expected += 1;
                phase = phase.next();
            }

            let mut seen = 0u64;
            for _ in 0..n {
                engine.start();
                if engine.tick().is_some() {
                    seen += 1;
                }
            }
            prop_assert_eq!(seen, expected);
            prop_assert_eq!(engine.phase(), phase);
        }
    }
}
