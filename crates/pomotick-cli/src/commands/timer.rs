use clap::Subcommand;
use pomotick_core::driver::{self, DriverOptions};
use pomotick_core::presentation;
use pomotick_core::{
    Config, Event, FocusSession, LogChime, Phase, PhaseDurations, SessionCounters, TimerState,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a live session, one line per second
    Run {
        /// Focus length in seconds (overrides config)
        #[arg(long)]
        focus_secs: Option<u64>,
        /// Break length in seconds (overrides config)
        #[arg(long)]
        break_secs: Option<u64>,
        /// Daily goal in focus sessions (overrides config)
        #[arg(long)]
        goal: Option<u32>,
        /// Stop after this many phases have completed
        #[arg(long, default_value = "1")]
        phases: u32,
        /// Print every event as a JSON line
        #[arg(long)]
        json: bool,
        /// Disable the completion cue
        #[arg(long)]
        no_sound: bool,
    },
    /// Print the display state for an arbitrary timer state as JSON
    Preview {
        /// Seconds left on the clock
        #[arg(long)]
        remaining: u64,
        /// Current phase (focus or break)
        #[arg(long, default_value = "focus")]
        phase: Phase,
        /// Whether the countdown is running
        #[arg(long)]
        running: bool,
        /// Focus sessions completed today
        #[arg(long, default_value = "0")]
        completed: u32,
    },
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            focus_secs,
            break_secs,
            goal,
            phases,
            json,
            no_sound,
        } => {
            let mut config = Config::load()?;
            if let Some(secs) = focus_secs {
                config.timer.focus_duration_secs = secs;
            }
            if let Some(secs) = break_secs {
                config.timer.break_duration_secs = secs;
            }
            if let Some(goal) = goal {
                config.goals.daily_goal = goal;
            }
            if no_sound {
                config.notifications.sound_enabled = false;
            }
            let session = FocusSession::from_config(&config, Box::new(LogChime))?;

            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(drive(session, phases.max(1), json))
        }
        TimerAction::Preview {
            remaining,
            phase,
            running,
            completed,
        } => {
            let config = Config::load()?;
            let durations = PhaseDurations::new(
                config.timer.focus_duration_secs,
                config.timer.break_duration_secs,
            )?;
            let total = durations.duration_of(phase);
            if remaining > total {
                return Err(format!(
                    "--remaining {remaining} exceeds the {} phase length of {total}s",
                    phase.as_str()
                )
                .into());
            }

            let timer = TimerState {
                remaining_secs: remaining,
                phase,
                is_running: running,
            };
            let counters = SessionCounters {
                completed_focus_sessions: completed,
                daily_goal: config.goals.daily_goal,
                streak_days: config.goals.streak_days,
                celebration_active: false,
            };
            let state = presentation::derive(&timer, &durations, &counters);
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }
    }
}

/// Drive the session until `phases` phases have completed or Ctrl-C.
///
/// The engine stops at every phase boundary; this loop restarts it on the
/// user's behalf until the requested number of phases is done.
async fn drive(session: FocusSession, phases: u32, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = driver::spawn(session, DriverOptions::default());
    let mut events = handle.subscribe();
    handle.start().await?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut completed = 0u32;
    loop {
        tokio::select! {
            received = events.recv() => {
                let event = match received {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "renderer fell behind");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                render(&event, json)?;

                match event {
                    Event::PhaseCompleted { .. } => completed += 1,
                    // Snapshots follow the tick's other events, so the
                    // completion and any goal message are already printed.
                    Event::StateSnapshot { timer, .. } if !timer.is_running => {
                        if completed >= phases {
                            break;
                        }
                        handle.start().await?;
                    }
                    _ => {}
                }
            }
            _ = &mut ctrl_c => {
                eprintln!("interrupted");
                break;
            }
        }
    }

    handle.shutdown().await?;
    task.await?;
    Ok(())
}

fn render(event: &Event, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(event)?);
        return Ok(());
    }

    match event {
        Event::TimerStarted {
            phase,
            remaining_secs,
            ..
        } => println!(
            "▶ {} ({})",
            phase.label(),
            presentation::clock_text(*remaining_secs)
        ),
        Event::StateSnapshot {
            counters,
            presentation,
            ..
        } => println!(
            "{}  {:<10}  {:<13}  {:>3.0}%  goal {}/{}",
            presentation.clock_text,
            presentation.phase_label,
            presentation.mood.as_str(),
            presentation.progress_fraction * 100.0,
            counters.completed_focus_sessions,
            counters.daily_goal,
        ),
        Event::PhaseCompleted {
            completed_phase, ..
        } => println!("Ding! {} complete", completed_phase.label()),
        Event::DailyGoalReached {
            completed_focus_sessions,
            daily_goal,
            ..
        } => println!("🎉 Daily goal reached: {completed_focus_sessions}/{daily_goal} sessions"),
        _ => {}
    }
    Ok(())
}
