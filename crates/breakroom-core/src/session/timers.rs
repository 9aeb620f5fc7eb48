//! Named, cancellable timers on one logical timeline.
//!
//! All periodic work in the session is declared here as data. The wheel
//! holds at most one entry per kind, phase-owned entries are swept on
//! every transition out of their phase, and due firings come back in a
//! fixed priority order so an exception poll always lands before the
//! heartbeat sharing its instant.

use chrono::{DateTime, Duration, Utc};

use crate::tier::TierId;

/// Heartbeat period: counter accounting and threshold checks.
pub const HEARTBEAT_MS: u64 = 1_000;
/// Exception poll period.
pub const EXCEPTION_POLL_MS: u64 = 2_000;
/// Warning opacity ramp period.
pub const WARNING_RAMP_MS: u64 = 100;
/// Grace-period idle poll.
pub const GRACE_POLL_MS: u64 = 500;
/// Break countdown period.
pub const BREAK_COUNTDOWN_MS: u64 = 1_000;

/// Timer identities. One live entry per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    ExceptionPoll,
    Heartbeat,
    WarningRamp,
    /// One-shot warning-to-overlay transition, tagged with its tier.
    WarningDeadline,
    GracePoll,
    BreakCountdown,
}

impl TimerKind {
    /// Phase-owned timers die with the phase that armed them.
    pub fn is_phase_timer(self) -> bool {
        matches!(
            self,
            TimerKind::WarningRamp
                | TimerKind::WarningDeadline
                | TimerKind::GracePoll
                | TimerKind::BreakCountdown
        )
    }

    fn priority(self) -> u8 {
        match self {
            TimerKind::ExceptionPoll => 0,
            TimerKind::Heartbeat => 1,
            TimerKind::WarningRamp => 2,
            TimerKind::WarningDeadline => 3,
            TimerKind::GracePoll => 4,
            TimerKind::BreakCountdown => 5,
        }
    }
}

/// A due timer, with the tier tag carried by tagged one-shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Firing {
    pub kind: TimerKind,
    pub tier: Option<TierId>,
}

#[derive(Debug, Clone)]
struct TimerEntry {
    kind: TimerKind,
    due: DateTime<Utc>,
    period_ms: Option<u64>,
    tier: Option<TierId>,
}

/// The session's timer table.
#[derive(Debug, Clone, Default)]
pub struct TimerWheel {
    entries: Vec<TimerEntry>,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a repeating timer. Replaces any existing entry of this kind.
    pub fn arm_periodic(&mut self, kind: TimerKind, now: DateTime<Utc>, period_ms: u64) {
        self.cancel(kind);
        self.entries.push(TimerEntry {
            kind,
            due: now + Duration::milliseconds(period_ms as i64),
            period_ms: Some(period_ms),
            tier: None,
        });
    }

    /// Arm a one-shot timer, optionally tagged with the tier it belongs to.
    pub fn arm_once(&mut self, kind: TimerKind, due: DateTime<Utc>, tier: Option<TierId>) {
        self.cancel(kind);
        self.entries.push(TimerEntry {
            kind,
            due,
            period_ms: None,
            tier,
        });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.entries.retain(|e| e.kind != kind);
    }

    /// Drop every phase-owned timer. Session-lifetime timers survive.
    pub fn cancel_phase_timers(&mut self) {
        self.entries.retain(|e| !e.kind.is_phase_timer());
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Collect due firings in priority order. Periodic entries re-arm
    /// relative to `now`, so a stalled caller gets one coalesced firing
    /// per kind instead of a burst; one-shots are consumed.
    pub fn collect_due(&mut self, now: DateTime<Utc>) -> Vec<Firing> {
        let mut due: Vec<Firing> = Vec::new();
        self.entries.retain_mut(|entry| {
            if entry.due > now {
                return true;
            }
            due.push(Firing {
                kind: entry.kind,
                tier: entry.tier,
            });
            match entry.period_ms {
                Some(period) => {
                    entry.due = now + Duration::milliseconds(period as i64);
                    true
                }
                None => false,
            }
        });
        due.sort_by_key(|f| f.kind.priority());
        due
    }
}
