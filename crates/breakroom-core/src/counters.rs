//! Per-tier accounting.
//!
//! Tracks elapsed active time per configured tier in milliseconds,
//! alongside the postponement table and the queued-breaks set. The
//! three move together: a cascade reset clears a tier's counter, its
//! postponement, and its queued entry in one step.
//!
//! This module is pure bookkeeping over [`Config`]. The timer engine
//! decides when to call in; nothing here owns time.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::tier::{Tier, TierId};

#[derive(Debug, Clone, Default)]
pub struct TierCounters {
    elapsed_ms: HashMap<TierId, u64>,
    postponed_until: HashMap<TierId, DateTime<Utc>>,
    queued: BTreeSet<TierId>,
}

impl TierCounters {
    pub fn new(config: &Config) -> Self {
        let mut counters = Self::default();
        counters.rebuild(config);
        counters
    }

    /// Align the key set with the configured tiers: new tiers start at
    /// zero, removed tiers drop all their state, survivors keep counting.
    pub fn rebuild(&mut self, config: &Config) {
        for tier in &config.tiers {
            self.elapsed_ms.entry(tier.id).or_insert(0);
        }
        let valid: BTreeSet<TierId> = config.tiers.iter().map(|t| t.id).collect();
        self.elapsed_ms.retain(|id, _| valid.contains(id));
        self.postponed_until.retain(|id, _| valid.contains(id));
        self.queued.retain(|id| valid.contains(id));
    }

    pub fn increment(&mut self, config: &Config, elapsed_ms: u64) {
        for tier in &config.tiers {
            *self.elapsed_ms.entry(tier.id).or_insert(0) += elapsed_ms;
        }
    }

    /// Wind counters back down, flooring at zero.
    pub fn unwind(&mut self, config: &Config, elapsed_ms: u64) {
        for tier in &config.tiers {
            let entry = self.elapsed_ms.entry(tier.id).or_insert(0);
            *entry = entry.saturating_sub(elapsed_ms);
        }
    }

    /// Elapsed active milliseconds for a tier. Missing entries read as
    /// zero rather than failing the tick.
    pub fn elapsed_ms(&self, id: TierId) -> u64 {
        self.elapsed_ms.get(&id).copied().unwrap_or(0)
    }

    pub fn set_elapsed_ms(&mut self, id: TierId, ms: u64) {
        self.elapsed_ms.insert(id, ms);
    }

    /// Milliseconds of active time left before `tier` is due. Zero or
    /// negative once past the threshold.
    pub fn remaining_ms(&self, tier: &Tier) -> i64 {
        tier.active_interval_ms() as i64 - self.elapsed_ms(tier.id) as i64
    }

    pub fn is_due(&self, tier: &Tier) -> bool {
        self.remaining_ms(tier) <= 0
    }

    /// Rewrite a tier's counter so exactly `remaining_ms` of active
    /// time is left before it triggers again. A remaining value larger
    /// than the interval floors the counter at zero.
    pub fn set_remaining_ms(&mut self, tier: &Tier, remaining_ms: u64) {
        self.elapsed_ms
            .insert(tier.id, tier.active_interval_ms().saturating_sub(remaining_ms));
    }

    /// Zero every tier whose break is no longer than the trigger's, and
    /// clear those tiers' postponements and queued entries. Returns the
    /// ids that were reset.
    pub fn cascade_reset(&mut self, config: &Config, trigger: &Tier) -> Vec<TierId> {
        let mut reset = Vec::new();
        for tier in &config.tiers {
            if tier.break_duration_secs <= trigger.break_duration_secs {
                self.elapsed_ms.insert(tier.id, 0);
                self.postponed_until.remove(&tier.id);
                self.queued.remove(&tier.id);
                reset.push(tier.id);
            }
        }
        reset
    }

    pub fn defer_until(&mut self, id: TierId, until: DateTime<Utc>) {
        self.postponed_until.insert(id, until);
    }

    pub fn is_postponed(&self, id: TierId, now: DateTime<Utc>) -> bool {
        self.postponed_until
            .get(&id)
            .is_some_and(|until| now < *until)
    }

    /// Queue a tier for replay once exceptions clear. Returns whether
    /// it was newly queued.
    pub fn queue(&mut self, id: TierId) -> bool {
        self.queued.insert(id)
    }

    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_queued(&self, id: TierId) -> bool {
        self.queued.contains(&id)
    }

    /// Take the queued tier with the longest break and clear the whole
    /// set. Queued ids no longer in the config drop silently.
    pub fn take_longest_queued(&mut self, config: &Config) -> Option<Tier> {
        let mut longest: Option<&Tier> = None;
        for tier in &config.tiers {
            if !self.queued.contains(&tier.id) {
                continue;
            }
            match longest {
                Some(best) if best.break_duration_secs >= tier.break_duration_secs => {}
                _ => longest = Some(tier),
            }
        }
        let longest = longest.cloned();
        self.queued.clear();
        longest
    }

    /// First tier in configuration order with a strictly longer break
    /// than `base` that comes due within the merge window of `base`.
    /// A longer tier at exactly its threshold still counts, so on the
    /// tick where both cross, the longer break is the one that fires.
    ///
    /// Shared by display and trigger paths so the countdown shown to
    /// the user and the break that actually fires always agree.
    pub fn merge_target<'a>(&self, config: &'a Config, base: &Tier) -> Option<&'a Tier> {
        let window = self.remaining_ms(base).max(0) + config.merge_window_ms() as i64;
        config.tiers.iter().find(|other| {
            if other.break_duration_secs <= base.break_duration_secs {
                return false;
            }
            let remaining = self.remaining_ms(other);
            remaining >= 0 && remaining <= window
        })
    }

    /// The tier whose break comes next, accounting for the merge
    /// window. When every tier is already due, falls back to the
    /// longest break.
    pub fn next_due_tier<'a>(&self, config: &'a Config) -> Option<&'a Tier> {
        let mut nearest: Option<&Tier> = None;
        for tier in &config.tiers {
            let remaining = self.remaining_ms(tier);
            if remaining <= 0 {
                continue;
            }
            match nearest {
                Some(best) if self.remaining_ms(best) <= remaining => {}
                _ => nearest = Some(tier),
            }
        }
        let Some(nearest) = nearest else {
            // All at or past threshold.
            let mut longest: Option<&Tier> = None;
            for tier in &config.tiers {
                match longest {
                    Some(best) if best.break_duration_secs >= tier.break_duration_secs => {}
                    _ => longest = Some(tier),
                }
            }
            return longest;
        };
        self.merge_target(config, nearest).or(Some(nearest))
    }

    /// Seconds of active time until the next break.
    pub fn next_countdown_secs(&self, config: &Config) -> Option<u64> {
        let tier = self.next_due_tier(config)?;
        Some(self.remaining_ms(tier).max(0) as u64 / 1000)
    }
}
