//! The break session.
//!
//! One owned struct holds every piece of mutable state: counters,
//! phase, pause, exception monitor, and the timer wheel. All periodic
//! work funnels through [`BreakSession::advance`] and all user actions
//! through the command methods, each taking `now` explicitly. There
//! are no internal threads; the caller drives the session, usually via
//! [`crate::runtime::SessionRuntime`].

mod engine;
mod phase;
mod scheduler;
mod timers;

pub use engine::TickEngine;
pub use phase::{BreakPhase, OverlayState, PauseState, PhaseKind};
pub use scheduler::BreakScheduler;
pub use timers::{
    Firing, TimerKind, TimerWheel, BREAK_COUNTDOWN_MS, EXCEPTION_POLL_MS, GRACE_POLL_MS,
    HEARTBEAT_MS, WARNING_RAMP_MS,
};

use chrono::{DateTime, Duration, Utc};

use crate::config::Config;
use crate::counters::TierCounters;
use crate::events::{Event, TierStatus};
use crate::exceptions::{ExceptionEdge, ExceptionMonitor, ExceptionState};
use crate::probe::{ExceptionProbe, IdleSource};
use crate::tier::TierId;

pub struct BreakSession {
    config: Config,
    counters: TierCounters,
    scheduler: BreakScheduler,
    engine: TickEngine,
    monitor: ExceptionMonitor,
    wheel: TimerWheel,
    pause: PauseState,
    idle: Box<dyn IdleSource>,
    probe: Box<dyn ExceptionProbe>,
}

impl BreakSession {
    pub fn new(
        config: Config,
        idle: Box<dyn IdleSource>,
        probe: Box<dyn ExceptionProbe>,
        now: DateTime<Utc>,
    ) -> Self {
        let counters = TierCounters::new(&config);
        let mut wheel = TimerWheel::new();
        wheel.arm_periodic(TimerKind::Heartbeat, now, HEARTBEAT_MS);
        wheel.arm_periodic(TimerKind::ExceptionPoll, now, EXCEPTION_POLL_MS);
        Self {
            config,
            counters,
            scheduler: BreakScheduler::new(),
            engine: TickEngine::new(now),
            monitor: ExceptionMonitor::new(),
            wheel,
            pause: PauseState::NotPaused,
            idle,
            probe,
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> &BreakPhase {
        self.scheduler.phase()
    }

    pub fn pause_state(&self) -> PauseState {
        self.pause
    }

    pub fn exception_state(&self) -> &ExceptionState {
        self.monitor.state()
    }

    pub fn counters(&self) -> &TierCounters {
        &self.counters
    }

    /// Direct counter access for drivers and tests.
    pub fn counters_mut(&mut self) -> &mut TierCounters {
        &mut self.counters
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Event {
        let (overlay_remaining_secs, grace_period) = match self.scheduler.phase() {
            BreakPhase::Overlay(state) => (Some(state.remaining_secs()), Some(state.grace_period)),
            _ => (None, None),
        };
        let tiers = self
            .config
            .tiers
            .iter()
            .map(|tier| TierStatus {
                id: tier.id,
                name: tier.name.clone(),
                color: tier.color,
                elapsed_secs: self.counters.elapsed_ms(tier.id) / 1000,
                remaining_secs: self.counters.remaining_ms(tier).max(0) as u64 / 1000,
                postponed: self.counters.is_postponed(tier.id, now),
            })
            .collect();
        Event::StateSnapshot {
            phase: self.scheduler.phase().kind(),
            paused: self.pause.is_paused(now),
            pause_remaining_secs: self.pause.remaining_secs(now),
            exception_active: self.monitor.state().active,
            exception_reason: self.monitor.state().reason.clone(),
            next_tier_name: self
                .counters
                .next_due_tier(&self.config)
                .map(|t| t.name.clone()),
            next_countdown_secs: self.counters.next_countdown_secs(&self.config),
            queued_breaks: self.counters.queued_len(),
            overlay_remaining_secs,
            grace_period,
            tiers,
            at: now,
        }
    }

    // ── Dispatcher ──────────────────────────────────────────────────

    /// Run every timer due at `now`. The sole entry point for periodic
    /// work; firings dispatch in a fixed priority order.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();
        for firing in self.wheel.collect_due(now) {
            match firing.kind {
                TimerKind::ExceptionPoll => self.poll_exceptions(now, &mut events),
                TimerKind::Heartbeat => self.heartbeat(now, &mut events),
                TimerKind::WarningRamp => {
                    events.extend(self.scheduler.ramp_tick(&self.config, now));
                }
                TimerKind::WarningDeadline => {
                    events.extend(self.scheduler.warning_deadline(firing.tier, &mut self.wheel, now));
                }
                TimerKind::GracePoll => {
                    let idle_secs = self.idle.seconds_since_last_input();
                    events.extend(self.scheduler.grace_tick(idle_secs, &mut self.wheel, now));
                }
                TimerKind::BreakCountdown => {
                    events.extend(self.scheduler.countdown_tick(
                        &self.config,
                        &mut self.counters,
                        &mut self.wheel,
                        now,
                    ));
                }
            }
        }
        events
    }

    fn poll_exceptions(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let Some(edge) = self.monitor.poll(&self.config, self.probe.as_mut()) else {
            return;
        };
        let state = self.monitor.state().clone();
        events.push(Event::ExceptionStateChanged {
            active: state.active,
            reason: state.reason,
            at: now,
        });
        match edge {
            ExceptionEdge::Activated { .. } => {
                // A running warning or break yields to the exception and
                // queues itself for replay.
                let interrupted = self.scheduler.phase().tier().map(|t| t.id);
                if let Some(tier_id) = interrupted {
                    self.counters.queue(tier_id);
                    events.extend(self.scheduler.cancel_current(&mut self.wheel, now));
                }
            }
            ExceptionEdge::Deactivated => {
                events.extend(self.scheduler.exception_ended(
                    &self.config,
                    &mut self.counters,
                    &mut self.wheel,
                    now,
                ));
            }
        }
    }

    fn heartbeat(&mut self, now: DateTime<Utc>, events: &mut Vec<Event>) {
        let idle_secs = self.idle.seconds_since_last_input();
        let (hb_events, due) = self.engine.heartbeat(
            &self.config,
            &mut self.counters,
            &mut self.pause,
            self.scheduler.phase(),
            idle_secs,
            now,
        );
        events.extend(hb_events);
        if let Some(tier) = due {
            events.extend(self.scheduler.threshold_reached(
                &tier,
                &self.config,
                &mut self.counters,
                &mut self.wheel,
                self.monitor.state(),
                now,
            ));
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Start a break immediately, skipping the warning phase. Unknown
    /// tiers are ignored.
    pub fn take_break_now(&mut self, tier_id: TierId, now: DateTime<Utc>) -> Vec<Event> {
        let Some(tier) = self.config.tier(tier_id).cloned() else {
            return Vec::new();
        };
        self.scheduler.start_break_immediately(tier, &mut self.wheel, now)
    }

    /// Run the warning phase on demand, bypassing threshold detection.
    pub fn rehearse_break(&mut self, tier_id: TierId, now: DateTime<Utc>) -> Vec<Event> {
        let Some(tier) = self.config.tier(tier_id).cloned() else {
            return Vec::new();
        };
        self.scheduler.start_warning(tier, &self.config, &mut self.wheel, now)
    }

    pub fn skip_break(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.scheduler
            .skip_break(&self.config, &mut self.counters, &mut self.wheel, now)
    }

    pub fn postpone_break(&mut self, minutes: u32, now: DateTime<Utc>) -> Vec<Event> {
        self.scheduler
            .postpone_break(minutes, &self.config, &mut self.counters, &mut self.wheel, now)
    }

    /// Ask for a screen lock once the current break ends. Returns
    /// whether an overlay was there to take the flag.
    pub fn set_lock_after_break(&mut self, lock: bool) -> bool {
        self.scheduler.set_lock_after_break(lock)
    }

    pub fn pause_for(&mut self, duration_secs: u64, now: DateTime<Utc>) -> Vec<Event> {
        let until = now + Duration::seconds(duration_secs as i64);
        self.pause = PauseState::Until(until);
        tracing::info!(%until, "paused");
        vec![Event::Paused {
            until: Some(until),
            at: now,
        }]
    }

    pub fn pause_indefinitely(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.pause = PauseState::Indefinite;
        tracing::info!("paused indefinitely");
        vec![Event::Paused { until: None, at: now }]
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if self.pause == PauseState::NotPaused {
            return Vec::new();
        }
        self.pause = PauseState::NotPaused;
        vec![Event::Resumed { at: now }]
    }

    /// Hold a tier back until `until`, even once its counter is full.
    pub fn defer_tier_until(&mut self, tier_id: TierId, until: DateTime<Utc>) {
        if self.config.tier(tier_id).is_some() {
            self.counters.defer_until(tier_id, until);
        }
    }

    /// Swap in a new configuration. Any active cycle is cancelled first
    /// since its tier may no longer exist; counters for surviving tiers
    /// carry over.
    pub fn config_changed(&mut self, config: Config, now: DateTime<Utc>) -> Vec<Event> {
        let events = self.scheduler.cancel_current(&mut self.wheel, now);
        self.config = config;
        self.counters.rebuild(&self.config);
        events
    }

    /// The machine just woke from sleep.
    pub fn wake_from_sleep(&mut self, now: DateTime<Utc>) {
        let idle_secs = self.idle.seconds_since_last_input();
        self.engine
            .wake_from_sleep(&self.config, &mut self.counters, idle_secs, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ScriptedInput;

    fn session() -> (BreakSession, ScriptedInput, DateTime<Utc>) {
        let input = ScriptedInput::new();
        let now = Utc::now();
        let session = BreakSession::new(
            Config::default(),
            input.idle_source(),
            input.exception_probe(),
            now,
        );
        (session, input, now)
    }

    #[test]
    fn new_session_arms_the_standing_timers() {
        let (session, _input, _now) = session();
        assert!(session.wheel.is_armed(TimerKind::Heartbeat));
        assert!(session.wheel.is_armed(TimerKind::ExceptionPoll));
        assert!(session.phase().is_idle());
    }

    #[test]
    fn advance_before_anything_is_due_is_silent() {
        let (mut session, _input, now) = session();
        assert!(session.advance(now).is_empty());
        assert!(session
            .advance(now + Duration::milliseconds(500))
            .is_empty());
    }

    #[test]
    fn heartbeat_counts_active_time() {
        let (mut session, _input, now) = session();
        session.advance(now + Duration::seconds(1));
        session.advance(now + Duration::seconds(2));
        let first = session.config().tiers[0].id;
        assert_eq!(session.counters().elapsed_ms(first), 2_000);
    }

    #[test]
    fn take_break_now_with_unknown_tier_is_ignored() {
        let (mut session, _input, now) = session();
        assert!(session.take_break_now(uuid::Uuid::new_v4(), now).is_empty());
        assert!(session.phase().is_idle());
    }

    #[test]
    fn pause_freezes_and_resume_restores() {
        let (mut session, _input, now) = session();
        let events = session.pause_for(3_600, now);
        assert!(matches!(events[0], Event::Paused { until: Some(_), .. }));

        session.advance(now + Duration::seconds(1));
        let first = session.config().tiers[0].id;
        assert_eq!(session.counters().elapsed_ms(first), 0);

        let events = session.resume(now + Duration::seconds(2));
        assert!(matches!(events[0], Event::Resumed { .. }));
        assert!(session.resume(now + Duration::seconds(3)).is_empty());
    }

    #[test]
    fn config_change_while_idle_emits_nothing() {
        let (mut session, _input, now) = session();
        session.advance(now + Duration::seconds(1));
        let survivor = session.config().tiers[0].clone();

        let new_config = Config {
            tiers: vec![survivor.clone()],
            ..Config::default()
        };
        let events = session.config_changed(new_config, now + Duration::seconds(2));
        assert!(events.is_empty());
        assert_eq!(session.counters().elapsed_ms(survivor.id), 1_000);
    }

    #[test]
    fn snapshot_reflects_counters() {
        let (mut session, _input, now) = session();
        session.advance(now + Duration::seconds(1));
        let Event::StateSnapshot {
            phase,
            next_tier_name,
            tiers,
            ..
        } = session.snapshot(now + Duration::seconds(1))
        else {
            panic!("expected a snapshot");
        };
        assert_eq!(phase, PhaseKind::Idle);
        assert_eq!(next_tier_name.as_deref(), Some("Stretch"));
        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0].elapsed_secs, 1);
    }
}
