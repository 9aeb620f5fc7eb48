//! Break phase and pause state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// Coarse phase tag used in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Idle,
    Warning,
    Overlay,
}

/// State that only exists while the overlay is on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub tier: Tier,
    /// Goes to zero or below on the tick that completes the break.
    pub remaining_ms: i64,
    /// True until five quiet seconds have passed.
    pub grace_period: bool,
    pub lock_after_break: bool,
    /// Refreshed while the user keeps typing during grace.
    pub last_input_at: DateTime<Utc>,
}

impl OverlayState {
    pub fn new(tier: Tier, now: DateTime<Utc>) -> Self {
        let remaining_ms = tier.break_duration_ms() as i64;
        Self {
            tier,
            remaining_ms,
            grace_period: true,
            lock_after_break: false,
            last_input_at: now,
        }
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_ms.max(0) as u64 / 1000
    }
}

/// The break lifecycle. Overlay data cannot outlive the overlay phase
/// because it only exists inside the `Overlay` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakPhase {
    Idle,
    Warning {
        tier: Tier,
        started_at: DateTime<Utc>,
    },
    Overlay(OverlayState),
}

impl BreakPhase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            BreakPhase::Idle => PhaseKind::Idle,
            BreakPhase::Warning { .. } => PhaseKind::Warning,
            BreakPhase::Overlay(_) => PhaseKind::Overlay,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, BreakPhase::Idle)
    }

    /// The tier owning the current phase, if any.
    pub fn tier(&self) -> Option<&Tier> {
        match self {
            BreakPhase::Idle => None,
            BreakPhase::Warning { tier, .. } => Some(tier),
            BreakPhase::Overlay(state) => Some(&state.tier),
        }
    }
}

/// Whether counting is suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    NotPaused,
    Until(DateTime<Utc>),
    Indefinite,
}

impl PauseState {
    pub fn is_paused(&self, now: DateTime<Utc>) -> bool {
        match self {
            PauseState::NotPaused => false,
            PauseState::Until(until) => now < *until,
            PauseState::Indefinite => true,
        }
    }

    /// Seconds left on a timed pause, if one is running.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<u64> {
        match self {
            PauseState::Until(until) if now < *until => {
                Some((*until - now).num_seconds().max(0) as u64)
            }
            _ => None,
        }
    }
}
