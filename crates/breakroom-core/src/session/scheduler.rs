//! Break phase transitions.
//!
//! Owns the [`BreakPhase`] and moves it through
//! Idle -> Warning -> Overlay -> Idle. Every transition sweeps the
//! phase timers it leaves behind, and a firing that arrives for a phase
//! or tier that no longer exists is a silent no-op.

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::counters::TierCounters;
use crate::events::{BreakLogKind, Event};
use crate::exceptions::ExceptionState;
use crate::tier::{Tier, TierId};

use super::phase::{BreakPhase, OverlayState};
use super::timers::{TimerKind, TimerWheel, BREAK_COUNTDOWN_MS, GRACE_POLL_MS, WARNING_RAMP_MS};

/// Seconds of no input that end the overlay grace period.
const GRACE_IDLE_SECS: f64 = 5.0;
/// Input within this window refreshes the grace-period input marker.
const GRACE_REFRESH_SECS: f64 = 1.0;
/// Opacity the warning border starts at.
const WARNING_BASE_OPACITY: f64 = 0.25;

enum BreakFinish {
    Completed,
    Skipped,
    Postponed { minutes: u32 },
}

pub struct BreakScheduler {
    phase: BreakPhase,
}

impl Default for BreakScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakScheduler {
    pub fn new() -> Self {
        Self {
            phase: BreakPhase::Idle,
        }
    }

    pub fn phase(&self) -> &BreakPhase {
        &self.phase
    }

    /// A tier hit its threshold. Queues under an active exception,
    /// drops under a live postponement, otherwise starts the warning.
    pub fn threshold_reached(
        &mut self,
        tier: &Tier,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        exception: &ExceptionState,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        if exception.active {
            let mut events = Vec::new();
            if counters.queue(tier.id) {
                let reason = exception
                    .reason
                    .clone()
                    .unwrap_or_else(|| "exception".to_string());
                tracing::info!(tier = %tier.name, %reason, "break deferred");
                events.push(log_event(tier, BreakLogKind::Deferred, Some(reason), now));
            }
            return events;
        }
        if counters.is_postponed(tier.id, now) {
            return Vec::new();
        }
        self.start_warning(tier.clone(), config, wheel, now)
    }

    /// Enter the warning phase: border event, opacity ramp, and the
    /// one-shot deadline that brings up the overlay.
    pub fn start_warning(
        &mut self,
        tier: Tier,
        config: &Config,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        wheel.cancel_phase_timers();
        tracing::info!(tier = %tier.name, "warning started");
        let events = vec![
            break_started_event(&tier, now),
            Event::WarningOpacity {
                value: WARNING_BASE_OPACITY,
                at: now,
            },
        ];
        wheel.arm_periodic(TimerKind::WarningRamp, now, WARNING_RAMP_MS);
        wheel.arm_once(
            TimerKind::WarningDeadline,
            now + Duration::milliseconds(config.warning_duration_ms() as i64),
            Some(tier.id),
        );
        self.phase = BreakPhase::Warning {
            tier,
            started_at: now,
        };
        events
    }

    /// Ramp the warning opacity. No-ops outside the warning phase.
    pub fn ramp_tick(&self, config: &Config, now: DateTime<Utc>) -> Option<Event> {
        let BreakPhase::Warning { started_at, .. } = &self.phase else {
            return None;
        };
        let warning_ms = config.warning_duration_ms().max(1) as f64;
        let elapsed_ms = (now - *started_at).num_milliseconds().max(0) as f64;
        let value = WARNING_BASE_OPACITY
            + (1.0 - WARNING_BASE_OPACITY) * (elapsed_ms / warning_ms).min(1.0);
        Some(Event::WarningOpacity { value, at: now })
    }

    /// The warning deadline fired. Advances only when the phase is
    /// still Warning for the same tier; stale deadlines are dropped.
    pub fn warning_deadline(
        &mut self,
        tier_id: Option<TierId>,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let BreakPhase::Warning { tier, .. } = &self.phase else {
            return Vec::new();
        };
        if tier_id != Some(tier.id) {
            tracing::debug!("stale warning deadline ignored");
            return Vec::new();
        }
        let tier = tier.clone();
        self.start_overlay(tier, wheel, now)
    }

    /// Skip the warning entirely: the take-a-break-now path.
    pub fn start_break_immediately(
        &mut self,
        tier: Tier,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        wheel.cancel_phase_timers();
        let mut events = vec![break_started_event(&tier, now)];
        events.extend(self.start_overlay(tier, wheel, now));
        events
    }

    fn start_overlay(&mut self, tier: Tier, wheel: &mut TimerWheel, now: DateTime<Utc>) -> Vec<Event> {
        wheel.cancel_phase_timers();
        wheel.arm_periodic(TimerKind::GracePoll, now, GRACE_POLL_MS);
        tracing::info!(tier = %tier.name, "overlay started");
        let events = vec![
            overlay_started_event(&tier, now),
            log_event(&tier, BreakLogKind::Started, None, now),
        ];
        self.phase = BreakPhase::Overlay(OverlayState::new(tier, now));
        events
    }

    /// Grace-period poll. Five quiet seconds lock the overlay and start
    /// the countdown; fresh input refreshes the input marker.
    pub fn grace_tick(
        &mut self,
        idle_secs: f64,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let BreakPhase::Overlay(state) = &mut self.phase else {
            return Vec::new();
        };
        if !state.grace_period {
            return Vec::new();
        }
        if idle_secs >= GRACE_IDLE_SECS {
            state.grace_period = false;
            wheel.cancel(TimerKind::GracePoll);
            wheel.arm_periodic(TimerKind::BreakCountdown, now, BREAK_COUNTDOWN_MS);
            tracing::debug!("grace period ended");
            return vec![Event::OverlayLocked { at: now }];
        }
        if idle_secs < GRACE_REFRESH_SECS {
            state.last_input_at = now;
        }
        Vec::new()
    }

    /// One second of countdown. Completes the break at zero.
    pub fn countdown_tick(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        let BreakPhase::Overlay(state) = &mut self.phase else {
            return Vec::new();
        };
        if state.grace_period {
            return Vec::new();
        }
        state.remaining_ms -= BREAK_COUNTDOWN_MS as i64;
        if state.remaining_ms <= 0 {
            return self.finish(config, counters, wheel, now, BreakFinish::Completed);
        }
        vec![Event::OverlayCountdown {
            remaining_secs: state.remaining_secs(),
            at: now,
        }]
    }

    /// User skipped the running break.
    pub fn skip_break(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        self.finish(config, counters, wheel, now, BreakFinish::Skipped)
    }

    /// User postponed the running break by `minutes`.
    pub fn postpone_break(
        &mut self,
        minutes: u32,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        self.finish(config, counters, wheel, now, BreakFinish::Postponed { minutes })
    }

    fn finish(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
        how: BreakFinish,
    ) -> Vec<Event> {
        let BreakPhase::Overlay(state) = &self.phase else {
            return Vec::new();
        };
        let tier = state.tier.clone();
        let lock = state.lock_after_break;

        let mut events = Vec::new();
        match how {
            BreakFinish::Completed => {
                tracing::info!(tier = %tier.name, "break completed");
                events.push(log_event(&tier, BreakLogKind::Completed, None, now));
                counters.cascade_reset(config, &tier);
            }
            BreakFinish::Skipped => {
                tracing::info!(tier = %tier.name, "break skipped");
                events.push(log_event(&tier, BreakLogKind::Skipped, Some("user".into()), now));
                counters.cascade_reset(config, &tier);
            }
            BreakFinish::Postponed { minutes } => {
                tracing::info!(tier = %tier.name, minutes, "break postponed");
                events.push(log_event(
                    &tier,
                    BreakLogKind::Postponed,
                    Some(format!("{minutes} min")),
                    now,
                ));
                // No cascade: the tier comes due again after exactly
                // this many active minutes.
                counters.set_remaining_ms(&tier, u64::from(minutes) * 60_000);
            }
        }

        wheel.cancel_phase_timers();
        self.phase = BreakPhase::Idle;
        events.push(Event::BreakEnded { at: now });
        if lock {
            events.push(Event::LockScreenRequested { at: now });
        }
        events
    }

    /// Cancel any active warning or break without logging an outcome.
    /// Idle is a silent no-op.
    pub fn cancel_current(&mut self, wheel: &mut TimerWheel, now: DateTime<Utc>) -> Vec<Event> {
        if self.phase.is_idle() {
            return Vec::new();
        }
        tracing::info!("break cancelled");
        wheel.cancel_phase_timers();
        self.phase = BreakPhase::Idle;
        vec![Event::BreakEnded { at: now }]
    }

    /// Replay the longest queued break once exceptions clear. The queue
    /// was already vetted, so postponement and exception checks are
    /// deliberately skipped here.
    pub fn exception_ended(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        wheel: &mut TimerWheel,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        match counters.take_longest_queued(config) {
            Some(tier) => {
                tracing::info!(tier = %tier.name, "replaying queued break");
                self.start_warning(tier, config, wheel, now)
            }
            None => Vec::new(),
        }
    }

    /// Only effective while the overlay is shown. Returns whether the
    /// flag was applied.
    pub fn set_lock_after_break(&mut self, lock: bool) -> bool {
        if let BreakPhase::Overlay(state) = &mut self.phase {
            state.lock_after_break = lock;
            return true;
        }
        false
    }
}

fn break_started_event(tier: &Tier, at: DateTime<Utc>) -> Event {
    Event::BreakStarted {
        tier_id: tier.id,
        tier_name: tier.name.clone(),
        screen_type: tier.screen_type,
        break_duration_secs: tier.break_duration_secs,
        at,
    }
}

fn overlay_started_event(tier: &Tier, at: DateTime<Utc>) -> Event {
    Event::OverlayStarted {
        tier_id: tier.id,
        tier_name: tier.name.clone(),
        screen_type: tier.screen_type,
        break_duration_secs: tier.break_duration_secs,
        at,
    }
}

fn log_event(tier: &Tier, kind: BreakLogKind, reason: Option<String>, at: DateTime<Utc>) -> Event {
    Event::BreakLogged {
        tier_name: tier.name.clone(),
        tier_color: tier.color,
        kind,
        reason,
        at,
    }
}
