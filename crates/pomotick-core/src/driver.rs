//! Async host for a [`FocusSession`].
//!
//! A single tokio task owns the session. Commands arrive over an mpsc queue
//! and are applied one at a time, so ticks never overlap with each other or
//! with user commands. The task keeps at most one tick source: a fresh
//! interval is created whenever the timer starts and dropped whenever it
//! stops. Celebrations are cleared by a short-lived delayed task which is
//! aborted when the user dismisses early or a new celebration replaces it.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::error::{ConfigError, CoreError, Result};
use crate::events::Event;
use crate::presentation::PresentationState;
use crate::session::{FocusSession, Snapshot};
use crate::timer::TimerState;
use crate::tracker::{CelebrationTicket, SessionCounters};

const COMMAND_QUEUE: usize = 32;
const EVENT_BUFFER: usize = 256;

/// Tuning for the driver task.
#[derive(Debug, Clone, Copy)]
pub struct DriverOptions {
    /// Time between ticks. One second outside of tests.
    pub tick_period: Duration,
    /// Broadcast a `StateSnapshot` after every tick.
    pub snapshot_every_tick: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            snapshot_every_tick: true,
        }
    }
}

enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    DismissCelebration,
    SetDailyGoal(u32, oneshot::Sender<std::result::Result<(), ConfigError>>),
    SetStreakDays(u32),
    ToggleSound(oneshot::Sender<bool>),
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

/// Cloneable handle to a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

impl SessionHandle {
    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CoreError::SessionClosed)
    }

    async fn ask<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.send(make(tx)).await?;
        rx.await.map_err(|_| CoreError::SessionClosed)
    }

    /// Receive every event the session emits from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn toggle(&self) -> Result<()> {
        self.send(Command::Toggle).await
    }

    pub async fn reset(&self) -> Result<()> {
        self.send(Command::Reset).await
    }

    pub async fn dismiss_celebration(&self) -> Result<()> {
        self.send(Command::DismissCelebration).await
    }

    pub async fn set_daily_goal(&self, goal: u32) -> Result<()> {
        self.ask(|tx| Command::SetDailyGoal(goal, tx)).await??;
        Ok(())
    }

    pub async fn set_streak_days(&self, days: u32) -> Result<()> {
        self.send(Command::SetStreakDays(days)).await
    }

    /// Flip the sound cue; returns the new setting.
    pub async fn toggle_sound(&self) -> Result<bool> {
        self.ask(Command::ToggleSound).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        self.ask(Command::Snapshot).await
    }

    pub async fn timer_state(&self) -> Result<TimerState> {
        Ok(self.snapshot().await?.timer)
    }

    pub async fn counters(&self) -> Result<SessionCounters> {
        Ok(self.snapshot().await?.counters)
    }

    pub async fn presentation(&self) -> Result<PresentationState> {
        Ok(self.snapshot().await?.presentation)
    }

    /// Stop the session task. Later calls return [`CoreError::SessionClosed`].
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }
}

/// Spawn a task driving `session` and return a handle to it.
///
/// Must be called from within a tokio runtime.
pub fn spawn(session: FocusSession, options: DriverOptions) -> (SessionHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
    let (expiry_tx, expiry_rx) = mpsc::unbounded_channel();

    let actor = Driver {
        session,
        options,
        events: event_tx.clone(),
        ticker: None,
        celebration: None,
        expiry_tx,
    };
    let task = tokio::spawn(actor.run(command_rx, expiry_rx));

    (
        SessionHandle {
            commands: command_tx,
            events: event_tx,
        },
        task,
    )
}

struct Driver {
    session: FocusSession,
    options: DriverOptions,
    events: broadcast::Sender<Event>,
    ticker: Option<Interval>,
    celebration: Option<JoinHandle<()>>,
    expiry_tx: mpsc::UnboundedSender<u64>,
}

impl Driver {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut expiries: mpsc::UnboundedReceiver<u64>,
    ) {
        tracing::debug!("focus session driver started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle(command),
                },
                _ = next_tick(&mut self.ticker) => self.on_tick(),
                Some(generation) = expiries.recv() => {
                    if let Some(event) = self.session.expire_celebration(generation) {
                        self.celebration = None;
                        self.emit(event);
                    }
                }
            }
        }

        if let Some(pending) = self.celebration.take() {
            pending.abort();
        }
        tracing::debug!("focus session driver stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start => {
                let event = self.session.start();
                self.after_command(event);
            }
            Command::Pause => {
                let event = self.session.pause();
                self.after_command(event);
            }
            Command::Toggle => {
                let event = self.session.toggle();
                self.after_command(event);
            }
            Command::Reset => {
                let event = self.session.reset();
                self.after_command(event);
            }
            Command::DismissCelebration => {
                if let Some(pending) = self.celebration.take() {
                    pending.abort();
                }
                if let Some(event) = self.session.dismiss_celebration() {
                    self.emit(event);
                }
            }
            Command::SetDailyGoal(goal, reply) => {
                let _ = reply.send(self.session.set_daily_goal(goal));
            }
            Command::SetStreakDays(days) => self.session.set_streak_days(days),
            Command::ToggleSound(reply) => {
                let _ = reply.send(self.session.toggle_sound());
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.session.snapshot());
            }
            Command::Shutdown => {}
        }
    }

    /// Emit the command's event and make the tick source match the timer.
    fn after_command(&mut self, event: Option<Event>) {
        let Some(event) = event else {
            return;
        };
        // Any transition replaces the tick source, so a restart never
        // stacks a second interval on top of the first.
        self.ticker = None;
        if self.session.is_running() {
            let period = self.options.tick_period;
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.ticker = Some(interval);
        }
        self.emit(event);
    }

    fn on_tick(&mut self) {
        let outcome = self.session.tick();
        if !self.session.is_running() {
            self.ticker = None;
        }
        if let Some(ticket) = outcome.celebration {
            self.schedule_expiry(ticket);
        }
        for event in outcome.events {
            self.emit(event);
        }
        if self.options.snapshot_every_tick {
            self.emit(self.session.snapshot_event());
        }
    }

    fn schedule_expiry(&mut self, ticket: CelebrationTicket) {
        if let Some(previous) = self.celebration.take() {
            previous.abort();
        }
        let expiry_tx = self.expiry_tx.clone();
        self.celebration = Some(tokio::spawn(async move {
            time::sleep(ticket.display_for).await;
            let _ = expiry_tx.send(ticket.generation);
        }));
    }

    fn emit(&self, event: Event) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Silent;
    use crate::config::Config;
    use crate::events::ClearReason;
    use crate::timer::Phase;

    fn session(focus: u64, brk: u64, goal: u32) -> FocusSession {
        let mut config = Config::default();
        config.timer.focus_duration_secs = focus;
        config.timer.break_duration_secs = brk;
        config.goals.daily_goal = goal;
        FocusSession::from_config(&config, Box::new(Silent)).unwrap()
    }

    fn spawn_quiet(session: FocusSession) -> (SessionHandle, JoinHandle<()>) {
        spawn(
            session,
            DriverOptions {
                snapshot_every_tick: false,
                ..DriverOptions::default()
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second_while_running() {
        let (handle, _task) = spawn_quiet(session(10, 5, 8));
        handle.start().await.unwrap();

        time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(handle.timer_state().await.unwrap().remaining_secs, 7);

        handle.pause().await.unwrap();
        time::sleep(Duration::from_secs(5)).await;
        let state = handle.timer_state().await.unwrap();
        assert_eq!(state.remaining_secs, 7);
        assert!(!state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_does_not_double_tick() {
        let (handle, _task) = spawn_quiet(session(10, 5, 8));
        handle.start().await.unwrap();
        handle.start().await.unwrap();
        handle.start().await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(handle.timer_state().await.unwrap().remaining_secs, 8);
    }

    #[tokio::test(start_paused = true)]
    async fn phase_end_stops_and_celebrates_then_clears() {
        let (handle, _task) = spawn_quiet(session(3, 2, 1));
        let mut events = handle.subscribe();
        handle.start().await.unwrap();

        time::sleep(Duration::from_millis(4_500)).await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.timer.phase, Phase::Break);
        assert_eq!(snap.timer.remaining_secs, 2);
        assert!(!snap.timer.is_running);
        assert_eq!(snap.counters.completed_focus_sessions, 1);
        assert!(snap.counters.celebration_active);

        // Stopped: no further ticks.
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(handle.timer_state().await.unwrap().remaining_secs, 2);

        time::sleep(Duration::from_secs(2)).await;
        assert!(!handle.counters().await.unwrap().celebration_active);

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert!(matches!(seen[0], Event::TimerStarted { .. }));
        assert!(matches!(
            seen[1],
            Event::PhaseCompleted {
                completed_phase: Phase::Focus,
                ..
            }
        ));
        assert!(matches!(seen[2], Event::DailyGoalReached { .. }));
        assert!(matches!(
            seen[3],
            Event::CelebrationCleared {
                reason: ClearReason::Expired,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_cancels_pending_expiry() {
        let (handle, _task) = spawn_quiet(session(1, 1, 1));
        let mut events = handle.subscribe();
        handle.start().await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        assert!(handle.counters().await.unwrap().celebration_active);

        handle.dismiss_celebration().await.unwrap();
        assert!(!handle.counters().await.unwrap().celebration_active);

        time::sleep(Duration::from_secs(5)).await;
        let cleared: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|e| match e {
                Event::CelebrationCleared { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(cleared, vec![ClearReason::Dismissed]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_stops_ticking() {
        let (handle, _task) = spawn_quiet(session(10, 5, 8));
        handle.start().await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        handle.reset().await.unwrap();
        time::sleep(Duration::from_secs(3)).await;
        let state = handle.timer_state().await.unwrap();
        assert_eq!(state.remaining_secs, 10);
        assert!(!state.is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_are_broadcast_each_tick() {
        let (handle, _task) = spawn(session(10, 5, 8), DriverOptions::default());
        let mut events = handle.subscribe();
        handle.start().await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        handle.pause().await.unwrap();
        let _ = handle.snapshot().await.unwrap();

        let clocks: Vec<String> = std::iter::from_fn(|| events.try_recv().ok())
            .filter_map(|e| match e {
                Event::StateSnapshot { presentation, .. } => Some(presentation.clock_text),
                _ => None,
            })
            .collect();
        assert_eq!(clocks, vec!["00:09".to_string(), "00:08".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn goal_and_sound_commands() {
        let (handle, _task) = spawn_quiet(session(10, 5, 8));
        assert!(matches!(
            handle.set_daily_goal(0).await,
            Err(CoreError::Config(ConfigError::InvalidValue { .. }))
        ));
        handle.set_daily_goal(3).await.unwrap();
        handle.set_streak_days(7).await.unwrap();
        let counters = handle.counters().await.unwrap();
        assert_eq!(counters.daily_goal, 3);
        assert_eq!(counters.streak_days, 7);

        assert!(!handle.toggle_sound().await.unwrap());
        assert!(handle.toggle_sound().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_closed_session() {
        let (handle, task) = spawn_quiet(session(10, 5, 8));
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        assert!(matches!(handle.start().await, Err(CoreError::SessionClosed)));
        assert!(matches!(handle.snapshot().await, Err(CoreError::SessionClosed)));
    }
}
