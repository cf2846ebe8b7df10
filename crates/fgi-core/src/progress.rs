//! Progress clock.
//!
//! Derives elapsed time, completion percentage and interview stage from the
//! turn counter and the configured target duration. Pure functions of their
//! inputs; nothing here mutates session state.

use serde::{Deserialize, Serialize};

/// Minutes of simulated interview time per completed turn.
///
/// Fixed by design: turn granularity is assumed uniform regardless of how
/// long the generated text actually is.
pub const MINUTES_PER_TURN: u32 = 5;

/// Interview stage derived from completion percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Below 20%: icebreaking and everyday conversation.
    Opening,
    /// 20%..80%: probing for insight.
    Exploration,
    /// 80% and above: wrap-up and confirmation.
    Closing,
}

impl Stage {
    /// Human-readable stage label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Opening => "opening (icebreak, build rapport)",
            Stage::Exploration => "exploration (probe motivations and insight)",
            Stage::Closing => "closing (confirm takeaways, wrap up)",
        }
    }
}

/// Derived pacing state for one point in the session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Simulated minutes elapsed.
    pub elapsed_minutes: u32,
    /// Completion percentage, clamped to 100.
    pub percent: u32,
    /// Stage derived from the percentage.
    pub stage: Stage,
}

impl Progress {
    /// Computes the progress for the given turn count and target duration.
    ///
    /// A zero `target_duration_minutes` is treated as already complete
    /// rather than dividing by zero.
    pub fn at(turn_count: u32, target_duration_minutes: u32) -> Self {
        let elapsed_minutes = turn_count * MINUTES_PER_TURN;

        let percent = if target_duration_minutes == 0 {
            100
        } else {
            ((elapsed_minutes as u64 * 100) / target_duration_minutes as u64).min(100) as u32
        };

        let stage = if percent < 20 {
            Stage::Opening
        } else if percent >= 80 {
            Stage::Closing
        } else {
            Stage::Exploration
        };

        Self {
            elapsed_minutes,
            percent,
            stage,
        }
    }
}
