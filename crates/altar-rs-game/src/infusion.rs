//! Infusion countdown.
//!
//! A single enum carries both "is the countdown running" and "how far along
//! is it", so a running timer with nothing left to count, or an idle timer
//! that claims to be infusing, cannot be constructed.

use serde::{Deserialize, Serialize};

use crate::config::TICKS_PER_SECOND;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InfusionTimer {
    /// No infusion scheduled.
    #[default]
    Idle,
    /// Started but not advancing; progress is kept.
    Paused { remaining: u32 },
    /// Counting down one per tick.
    Running { remaining: u32 },
}

/// Result of advancing the timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerStep {
    Idle,
    Paused,
    Counting { remaining: u32 },
    /// Reached zero on this tick. The timer is now `Idle`.
    Completed,
}

impl InfusionTimer {
    /// Schedule an infusion of `seconds`. A running timer keeps running with
    /// the new length; otherwise it waits for [`set_infusing`](Self::set_infusing).
    /// A zero-length infusion completes on the next tick either way.
    pub fn start(&mut self, seconds: u32) {
        let remaining = seconds.saturating_mul(TICKS_PER_SECOND);
        *self = match *self {
            InfusionTimer::Running { .. } => InfusionTimer::Running { remaining },
            _ => InfusionTimer::Paused { remaining },
        };
    }

    /// Resume (`true`) or pause (`false`). Returns `false` if there is no
    /// scheduled infusion to resume.
    pub fn set_infusing(&mut self, infusing: bool) -> bool {
        match (*self, infusing) {
            (InfusionTimer::Idle, true) => false,
            (InfusionTimer::Paused { remaining }, true) => {
                *self = InfusionTimer::Running { remaining };
                true
            }
            (InfusionTimer::Running { remaining }, false) => {
                *self = InfusionTimer::Paused { remaining };
                true
            }
            _ => true,
        }
    }

    /// Advance by one tick. Only a running timer moves; a timer already at
    /// zero completes whether or not it is running.
    pub fn tick(&mut self) -> TimerStep {
        match *self {
            InfusionTimer::Idle => TimerStep::Idle,
            InfusionTimer::Paused { remaining: 0 } => {
                *self = InfusionTimer::Idle;
                TimerStep::Completed
            }
            InfusionTimer::Paused { .. } => TimerStep::Paused,
            InfusionTimer::Running { remaining } => {
                let next = remaining.saturating_sub(1);
                if next == 0 {
                    *self = InfusionTimer::Idle;
                    TimerStep::Completed
                } else {
                    *self = InfusionTimer::Running { remaining: next };
                    TimerStep::Counting { remaining: next }
                }
            }
        }
    }

    pub fn reset(&mut self) {
        *self = InfusionTimer::Idle;
    }

    pub fn is_infusing(&self) -> bool {
        matches!(self, InfusionTimer::Running { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InfusionTimer::Idle)
    }

    pub fn remaining(&self) -> Option<u32> {
        match self {
            InfusionTimer::Idle => None,
            InfusionTimer::Paused { remaining } | InfusionTimer::Running { remaining } => {
                Some(*remaining)
            }
        }
    }

    /// Tick count with `-1` for idle, the form clients display.
    pub fn as_ticks(&self) -> i64 {
        self.remaining().map(i64::from).unwrap_or(-1)
    }
}
