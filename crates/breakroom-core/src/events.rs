//! Session events.
//!
//! Every observable state change comes out of the session as an
//! [`Event`]. Front ends render from these, the runtime fans them out
//! on its broadcast channel, and the log sink persists the
//! [`Event::BreakLogged`] variants. Each carries the session timestamp
//! it was produced at, so traces replay identically regardless of when
//! a subscriber drains them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::PhaseKind;
use crate::tier::{ScreenType, TierColor, TierId};

/// Kind of entry recorded in the break log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakLogKind {
    /// Break overlay appeared.
    Started,
    /// Countdown ran to zero.
    Completed,
    /// User skipped the break.
    Skipped,
    /// User postponed the break.
    Postponed,
    /// An exception or a merge deferred the break.
    Deferred,
}

impl BreakLogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakLogKind::Started => "started",
            BreakLogKind::Completed => "completed",
            BreakLogKind::Skipped => "skipped",
            BreakLogKind::Postponed => "postponed",
            BreakLogKind::Deferred => "deferred",
        }
    }
}

impl std::fmt::Display for BreakLogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-tier accounting included in a state snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierStatus {
    pub id: TierId,
    pub name: String,
    pub color: TierColor,
    pub elapsed_secs: u64,
    /// Active seconds left before this tier is due. Zero once due.
    pub remaining_secs: u64,
    pub postponed: bool,
}

/// Events raised by the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A break cycle began: warning phase, or directly for immediate breaks.
    BreakStarted {
        tier_id: TierId,
        tier_name: String,
        screen_type: ScreenType,
        break_duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Warning border opacity changed.
    WarningOpacity { value: f64, at: DateTime<Utc> },
    /// The full-screen overlay appeared.
    OverlayStarted {
        tier_id: TierId,
        tier_name: String,
        screen_type: ScreenType,
        break_duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// Grace period ended; input should now be blocked.
    OverlayLocked { at: DateTime<Utc> },
    /// One second of break countdown elapsed.
    OverlayCountdown { remaining_secs: u64, at: DateTime<Utc> },
    /// The break cycle ended, whatever the outcome.
    BreakEnded { at: DateTime<Utc> },
    /// The aggregate exception signal flipped.
    ExceptionStateChanged {
        active: bool,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    /// Counting was suspended. `until` is absent for indefinite pauses.
    Paused {
        until: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    /// Counting resumed, by command or timed-pause expiry.
    Resumed { at: DateTime<Utc> },
    /// The user asked for the screen to lock once this break ended.
    LockScreenRequested { at: DateTime<Utc> },
    /// An entry for the break log. Consumed by the log sink.
    BreakLogged {
        tier_name: String,
        tier_color: TierColor,
        kind: BreakLogKind,
        reason: Option<String>,
        at: DateTime<Utc>,
    },
    /// Full state snapshot for status displays.
    StateSnapshot {
        phase: PhaseKind,
        paused: bool,
        pause_remaining_secs: Option<u64>,
        exception_active: bool,
        exception_reason: Option<String>,
        next_tier_name: Option<String>,
        next_countdown_secs: Option<u64>,
        queued_breaks: usize,
        overlay_remaining_secs: Option<u64>,
        grace_period: Option<bool>,
        tiers: Vec<TierStatus>,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::BreakStarted { at, .. }
            | Event::WarningOpacity { at, .. }
            | Event::OverlayStarted { at, .. }
            | Event::OverlayLocked { at }
            | Event::OverlayCountdown { at, .. }
            | Event::BreakEnded { at }
            | Event::ExceptionStateChanged { at, .. }
            | Event::Paused { at, .. }
            | Event::Resumed { at }
            | Event::LockScreenRequested { at }
            | Event::BreakLogged { at, .. }
            | Event::StateSnapshot { at, .. } => *at,
        }
    }
}
