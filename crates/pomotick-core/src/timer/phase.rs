use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The current countdown mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Focus,
    Break,
}

impl Phase {
    /// The phase that follows this one once it is exhausted.
    pub fn next(self) -> Self {
        match self {
            Phase::Focus => Phase::Break,
            Phase::Break => Phase::Focus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Focus => "focus",
            Phase::Break => "break",
        }
    }

    /// Human-readable label shown under the clock.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Focus => "Focus Time",
            Phase::Break => "Break Time",
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "focus" => Ok(Phase::Focus),
            "break" => Ok(Phase::Break),
            other => Err(format!("unknown phase '{other}' (expected focus or break)")),
        }
    }
}

/// Nominal length of each phase, in seconds.
///
/// Both durations are strictly positive; zero is rejected on construction
/// so that nothing downstream ever divides by a zero-length phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseDurations {
    focus_secs: u64,
    break_secs: u64,
}

impl PhaseDurations {
    pub fn new(focus_secs: u64, break_secs: u64) -> Result<Self, ConfigError> {
        if focus_secs == 0 {
            return Err(ConfigError::invalid(
                "timer.focus_duration_secs",
                "focus phase must last at least one second",
            ));
        }
        if break_secs == 0 {
            return Err(ConfigError::invalid(
                "timer.break_duration_secs",
                "break phase must last at least one second",
            ));
        }
        Ok(Self {
            focus_secs,
            break_secs,
        })
    }

    pub fn duration_of(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Focus => self.focus_secs,
            Phase::Break => self.break_secs,
        }
    }
}

impl Default for PhaseDurations {
    /// 25:00 focus, 05:00 break.
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}
