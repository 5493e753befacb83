//! # pomotick core library
//!
//! A focus/break interval timer with derived display state. Hosts (the CLI,
//! or any UI) drive it and render what it reports.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a one-tick-per-second countdown that alternates focus
//!   and break phases and stops itself whenever a phase runs out
//! - **Session Tracker**: counts completed focus sessions toward a daily goal
//!   and raises a short-lived celebration when the goal is reached
//! - **Presentation**: pure derivation of clock text, ring progress and mood
//! - **Driver**: a tokio task that owns a session, ticks it at 1 Hz and clears
//!   celebrations on a timer
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionTracker`]: Goal and celebration bookkeeping
//! - [`FocusSession`]: Engine and tracker wired together
//! - [`Config`]: Application configuration management

pub mod alert;
pub mod config;
pub mod driver;
pub mod error;
pub mod events;
pub mod presentation;
pub mod session;
pub mod timer;
pub mod tracker;

pub use alert::{CompletionAlert, LogChime, Silent};
pub use config::Config;
pub use driver::{DriverOptions, SessionHandle};
pub use error::{ConfigError, CoreError};
pub use events::{ClearReason, Event};
pub use presentation::{Mood, PresentationState};
pub use session::{FocusSession, Snapshot, TickOutcome};
pub use timer::{CompletionEvent, Phase, PhaseDurations, TimerEngine, TimerState};
pub use tracker::{CelebrationTicket, SessionCounters, SessionTracker};
