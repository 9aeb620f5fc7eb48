//! The counting heartbeat.
//!
//! Once per second: account elapsed wall time against the counters,
//! then scan the tier ladder for a threshold crossing. Phase state
//! lives elsewhere; this module only reads it to decide whether
//! counting is frozen.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::counters::TierCounters;
use crate::events::{BreakLogKind, Event};
use crate::tier::{Tier, TierId};

use super::phase::{BreakPhase, PauseState};

/// Largest span one heartbeat may account, in milliseconds. Bigger
/// gaps mean sleep or a stalled process; wake handling covers those.
const MAX_TICK_MS: u64 = 5_000;

#[derive(Debug)]
pub struct TickEngine {
    last_tick: DateTime<Utc>,
    /// Tiers whose merge suppression was already logged this episode.
    merge_logged: HashSet<TierId>,
}

impl TickEngine {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_tick: now,
            merge_logged: HashSet::new(),
        }
    }

    /// One heartbeat. Returns emitted events and the tier that crossed
    /// its threshold, if any.
    pub fn heartbeat(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        pause: &mut PauseState,
        phase: &BreakPhase,
        idle_secs: f64,
        now: DateTime<Utc>,
    ) -> (Vec<Event>, Option<Tier>) {
        let mut events = Vec::new();

        let elapsed_ms = (now - self.last_tick).num_milliseconds().max(0) as u64;
        self.last_tick = now;
        let elapsed_ms = elapsed_ms.min(MAX_TICK_MS);

        // A timed pause clears itself on the first heartbeat past its end.
        if let PauseState::Until(until) = *pause {
            if now >= until {
                *pause = PauseState::NotPaused;
                tracing::info!("timed pause expired");
                events.push(Event::Resumed { at: now });
            }
        }
        if pause.is_paused(now) {
            return (events, None);
        }

        // Counters freeze while a warning or overlay is up.
        if !phase.is_idle() {
            return (events, None);
        }

        if idle_secs < config.idle_threshold_secs as f64 {
            counters.increment(config, elapsed_ms);
        } else {
            counters.unwind(config, elapsed_ms);
        }

        let due = self.scan_thresholds(config, counters, &mut events, now);
        (events, due)
    }

    /// First due tier in configuration order, honoring postponements
    /// and the merge window. At most one tier fires per tick. A merge
    /// suppression is logged once per episode; the flag drops as soon
    /// as the tier stops being suppressed.
    fn scan_thresholds(
        &mut self,
        config: &Config,
        counters: &TierCounters,
        events: &mut Vec<Event>,
        now: DateTime<Utc>,
    ) -> Option<Tier> {
        for tier in &config.tiers {
            if !counters.is_due(tier) {
                self.merge_logged.remove(&tier.id);
                continue;
            }
            if counters.is_postponed(tier.id, now) {
                continue;
            }
            if let Some(target) = counters.merge_target(config, tier) {
                if self.merge_logged.insert(tier.id) {
                    tracing::info!(tier = %tier.name, target = %target.name, "break merged");
                    events.push(Event::BreakLogged {
                        tier_name: tier.name.clone(),
                        tier_color: tier.color,
                        kind: BreakLogKind::Deferred,
                        reason: Some(format!("merged into {}", target.name)),
                        at: now,
                    });
                }
                continue;
            }
            self.merge_logged.remove(&tier.id);
            return Some(tier.clone());
        }
        None
    }

    /// Bulk-unwind after wake when the machine slept past the idle
    /// threshold, then resynchronize the tick origin.
    pub fn wake_from_sleep(
        &mut self,
        config: &Config,
        counters: &mut TierCounters,
        idle_secs: f64,
        now: DateTime<Utc>,
    ) {
        if idle_secs > config.idle_threshold_secs as f64 {
            tracing::info!(idle_secs, "unwinding counters after wake");
            counters.unwind(config, (idle_secs * 1000.0) as u64);
        }
        self.last_tick = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn setup() -> (Config, TierCounters, TickEngine, DateTime<Utc>) {
        let config = Config::default();
        let counters = TierCounters::new(&config);
        let now = Utc::now();
        (config, counters, TickEngine::new(now), now)
    }

    fn tick(
        engine: &mut TickEngine,
        config: &Config,
        counters: &mut TierCounters,
        pause: &mut PauseState,
        idle_secs: f64,
        now: DateTime<Utc>,
    ) -> (Vec<Event>, Option<Tier>) {
        engine.heartbeat(config, counters, pause, &BreakPhase::Idle, idle_secs, now)
    }

    #[test]
    fn active_tick_increments_all_tiers() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 1_000);
        assert_eq!(counters.elapsed_ms(config.tiers[1].id), 1_000);
    }

    #[test]
    fn idle_tick_unwinds() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        counters.increment(&config, 10_000);
        tick(&mut engine, &config, &mut counters, &mut pause, 200.0, now + Duration::seconds(1));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 9_000);
    }

    #[test]
    fn gap_is_clamped_to_five_seconds() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(47));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 5_000);
    }

    #[test]
    fn backwards_clock_jump_counts_nothing() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now - Duration::seconds(30));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 0);
    }

    #[test]
    fn paused_tick_freezes_counters() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::Indefinite;
        let (events, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert!(events.is_empty());
        assert!(due.is_none());
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 0);
    }

    #[test]
    fn expired_timed_pause_clears_and_resumes() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::Until(now + Duration::seconds(10));

        let (events, _) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(5));
        assert!(events.is_empty());
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 0);

        let (events, _) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(11));
        assert!(matches!(events[0], Event::Resumed { .. }));
        assert_eq!(pause, PauseState::NotPaused);
        // Counting resumes on the same tick that cleared the pause.
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 5_000);
    }

    #[test]
    fn non_idle_phase_freezes_counters() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        let phase = BreakPhase::Warning {
            tier: config.tiers[0].clone(),
            started_at: now,
        };
        let (events, due) =
            engine.heartbeat(&config, &mut counters, &mut pause, &phase, 0.0, now + Duration::seconds(1));
        assert!(events.is_empty());
        assert!(due.is_none());
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 0);
    }

    #[test]
    fn first_due_tier_fires_once() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        counters.set_elapsed_ms(config.tiers[0].id, 1_199_500);
        counters.set_elapsed_ms(config.tiers[1].id, 1_199_500);

        let (_, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert_eq!(due.unwrap().name, "Stretch");
    }

    #[test]
    fn postponed_tier_does_not_fire() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        counters.set_elapsed_ms(config.tiers[0].id, 1_300_000);
        counters.defer_until(config.tiers[0].id, now + Duration::minutes(10));

        let (_, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert!(due.is_none());
    }

    #[test]
    fn merge_suppression_logs_once_per_episode() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        // Stretch long due, Walk 250 s away: inside the merge window.
        counters.set_elapsed_ms(config.tiers[0].id, 3_350_000);
        counters.set_elapsed_ms(config.tiers[1].id, 3_350_000);

        let (events, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert!(due.is_none());
        assert!(matches!(
            &events[0],
            Event::BreakLogged { kind: BreakLogKind::Deferred, reason: Some(r), .. }
                if r == "merged into Walk"
        ));

        // Still suppressed: no second log.
        let (events, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(2));
        assert!(due.is_none());
        assert!(events.is_empty());
    }

    #[test]
    fn merge_flag_clears_when_suppression_ends() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        counters.set_elapsed_ms(config.tiers[0].id, 3_350_000);
        counters.set_elapsed_ms(config.tiers[1].id, 3_350_000);
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));

        // Walk's break runs and cascades everything to zero.
        let walk = config.tiers[1].clone();
        counters.cascade_reset(&config, &walk);
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(2));

        // A new suppression episode logs again.
        counters.set_elapsed_ms(config.tiers[0].id, 3_350_000);
        counters.set_elapsed_ms(config.tiers[1].id, 3_350_000);
        let (events, _) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(3));
        assert!(matches!(
            &events[0],
            Event::BreakLogged { kind: BreakLogKind::Deferred, .. }
        ));
    }

    #[test]
    fn suppressed_tier_fires_once_the_window_passes() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        // Walk ends the tick 301 s away, just outside the window.
        counters.set_elapsed_ms(config.tiers[0].id, 1_200_000);
        counters.set_elapsed_ms(config.tiers[1].id, 3_298_000);

        let (_, due) =
            tick(&mut engine, &config, &mut counters, &mut pause, 0.0, now + Duration::seconds(1));
        assert_eq!(due.unwrap().name, "Stretch");
    }

    #[test]
    fn wake_unwinds_only_past_the_threshold() {
        let (config, mut counters, mut engine, now) = setup();
        counters.increment(&config, 600_000);

        // Short nap: below the idle threshold, nothing unwinds.
        engine.wake_from_sleep(&config, &mut counters, 60.0, now + Duration::seconds(60));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 600_000);

        // Long sleep unwinds the whole gap.
        engine.wake_from_sleep(&config, &mut counters, 400.0, now + Duration::seconds(460));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 200_000);
    }

    #[test]
    fn wake_resynchronizes_the_tick_origin() {
        let (config, mut counters, mut engine, now) = setup();
        let mut pause = PauseState::NotPaused;
        let wake_at = now + Duration::seconds(3_600);
        engine.wake_from_sleep(&config, &mut counters, 3_600.0, wake_at);

        // The next heartbeat counts from the wake, not the old tick.
        tick(&mut engine, &config, &mut counters, &mut pause, 0.0, wake_at + Duration::seconds(1));
        assert_eq!(counters.elapsed_ms(config.tiers[0].id), 1_000);
    }
}
