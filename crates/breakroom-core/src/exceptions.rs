//! Exception aggregation.
//!
//! Microphone, screen sharing, and configured app rules collapse into
//! one boolean with a reason string. The monitor edge-detects that
//! signal between polls; the session reacts to edges, not levels.

use crate::config::{Config, TriggerMode};
use crate::probe::ExceptionProbe;

/// Aggregated exception signal with the first matching reason.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionState {
    pub active: bool,
    pub reason: Option<String>,
}

/// A flip of the aggregate signal between two polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionEdge {
    Activated { reason: Option<String> },
    Deactivated,
}

/// Polls the exception probe and edge-detects transitions.
///
/// Priority order: microphone, then screen sharing, then app rules in
/// configuration order. The first match wins and supplies the reason.
#[derive(Debug, Default)]
pub struct ExceptionMonitor {
    state: ExceptionState,
}

impl ExceptionMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ExceptionState {
        &self.state
    }

    /// Run one poll. Returns an edge when the aggregate signal flipped.
    pub fn poll(
        &mut self,
        config: &Config,
        probe: &mut dyn ExceptionProbe,
    ) -> Option<ExceptionEdge> {
        let mut active = false;
        let mut reason: Option<String> = None;

        if config.auto_exception_microphone && probe.is_microphone_active() {
            active = true;
            reason = Some("microphone".to_string());
        }
        if !active && config.auto_exception_screen_sharing && probe.is_screen_sharing_active() {
            active = true;
            reason = Some("screen sharing".to_string());
        }
        if !active {
            for rule in &config.exception_rules {
                let hit = match rule.trigger {
                    TriggerMode::Focused => probe.is_app_focused(&rule.app_id),
                    TriggerMode::Opened => probe.is_app_running(&rule.app_id),
                };
                if hit {
                    active = true;
                    reason = Some(format!("{} ({})", rule.app_name, rule.trigger));
                    break;
                }
            }
        }

        let was_active = self.state.active;
        self.state = ExceptionState {
            active,
            reason: reason.clone(),
        };

        if active && !was_active {
            tracing::info!(
                reason = reason.as_deref().unwrap_or("unknown"),
                "exception active"
            );
            Some(ExceptionEdge::Activated { reason })
        } else if !active && was_active {
            tracing::info!("exception cleared");
            Some(ExceptionEdge::Deactivated)
        } else {
            None
        }
    }
}
