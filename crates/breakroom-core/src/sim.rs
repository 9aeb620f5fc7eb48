//! Deterministic scenario player.
//!
//! Drives a [`BreakSession`] through scripted activity on a virtual
//! clock and records the resulting event trace. Integration tests and
//! the CLI `simulate` command are built on this; no wall clock is read
//! anywhere here.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::events::Event;
use crate::probe::ScriptedInput;
use crate::session::BreakSession;

/// Virtual-time step size. Matches the fastest session timer.
const STEP_MS: i64 = 100;

/// One scripted instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// The user types continuously for `secs`.
    Active { secs: u64 },
    /// Hands off: the reported idle time keeps growing for `secs`.
    Idle { secs: u64 },
    /// The machine sleeps. No timers run during the gap; on wake the
    /// whole gap is reported as idle.
    Sleep { secs: u64 },
    Microphone { on: bool },
    ScreenSharing { on: bool },
    FocusApp { app_id: Option<String> },
    LaunchApp { app_id: String },
    QuitApp { app_id: String },
    /// Immediate break for the named tier.
    TakeBreakNow { tier: String },
    /// On-demand warning phase for the named tier.
    RehearseBreak { tier: String },
    SkipBreak,
    PostponeBreak { minutes: u32 },
    SetLockAfterBreak { lock: bool },
    PauseFor { secs: u64 },
    PauseIndefinitely,
    Resume,
}

/// A named script plus its starting clock and optional configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub config: Option<Config>,
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn new(name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            start,
            config: None,
            steps: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn step(mut self, step: ScenarioStep) -> Self {
        self.steps.push(step);
        self
    }

    /// A full cycle over the default tiers: enough typing to trip the
    /// first tier and ride out its warning, then hands off through the
    /// break.
    pub fn demo(start: DateTime<Utc>) -> Self {
        Self::new("demo", start)
            .step(ScenarioStep::Active { secs: 1240 })
            .step(ScenarioStep::Idle { secs: 30 })
    }

    /// Play the script and collect the trace.
    pub fn run(&self) -> SimReport {
        let config = self.config.clone().unwrap_or_default();
        let input = ScriptedInput::new();
        let mut session = BreakSession::new(
            config,
            input.idle_source(),
            input.exception_probe(),
            self.start,
        );
        let mut now = self.start;
        let mut events = Vec::new();

        for step in &self.steps {
            match step {
                ScenarioStep::Active { secs } => {
                    for _ in 0..substeps(*secs) {
                        input.set_idle_secs(0.0);
                        now += Duration::milliseconds(STEP_MS);
                        events.extend(session.advance(now));
                    }
                }
                ScenarioStep::Idle { secs } => {
                    let mut idle = input.idle_secs();
                    for _ in 0..substeps(*secs) {
                        idle += STEP_MS as f64 / 1000.0;
                        input.set_idle_secs(idle);
                        now += Duration::milliseconds(STEP_MS);
                        events.extend(session.advance(now));
                    }
                }
                ScenarioStep::Sleep { secs } => {
                    now += Duration::seconds(*secs as i64);
                    input.set_idle_secs(*secs as f64);
                    session.wake_from_sleep(now);
                }
                ScenarioStep::Microphone { on } => input.set_microphone(*on),
                ScenarioStep::ScreenSharing { on } => input.set_screen_sharing(*on),
                ScenarioStep::FocusApp { app_id } => input.set_focused_app(app_id.as_deref()),
                ScenarioStep::LaunchApp { app_id } => input.launch_app(app_id),
                ScenarioStep::QuitApp { app_id } => input.quit_app(app_id),
                ScenarioStep::TakeBreakNow { tier } => {
                    if let Some(id) = session.config().tier_by_name(tier).map(|t| t.id) {
                        events.extend(session.take_break_now(id, now));
                    }
                }
                ScenarioStep::RehearseBreak { tier } => {
                    if let Some(id) = session.config().tier_by_name(tier).map(|t| t.id) {
                        events.extend(session.rehearse_break(id, now));
                    }
                }
                ScenarioStep::SkipBreak => events.extend(session.skip_break(now)),
                ScenarioStep::PostponeBreak { minutes } => {
                    events.extend(session.postpone_break(*minutes, now));
                }
                ScenarioStep::SetLockAfterBreak { lock } => {
                    session.set_lock_after_break(*lock);
                }
                ScenarioStep::PauseFor { secs } => events.extend(session.pause_for(*secs, now)),
                ScenarioStep::PauseIndefinitely => {
                    events.extend(session.pause_indefinitely(now));
                }
                ScenarioStep::Resume => events.extend(session.resume(now)),
            }
        }

        let final_snapshot = session.snapshot(now);
        SimReport {
            name: self.name.clone(),
            started: self.start,
            finished: now,
            events,
            final_snapshot,
        }
    }
}

fn substeps(secs: u64) -> u64 {
    secs * (1000 / STEP_MS as u64)
}

/// Trace of one scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimReport {
    pub name: String,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub events: Vec<Event>,
    pub final_snapshot: Event,
}

impl SimReport {
    /// The trace without ramp and countdown ticks, which otherwise
    /// drown out everything else.
    pub fn notable_events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| {
            !matches!(
                e,
                Event::WarningOpacity { .. } | Event::OverlayCountdown { .. }
            )
        })
    }
}
