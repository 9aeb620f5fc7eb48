//! Input and exception probes.
//!
//! The core never talks to the platform directly. Idle time and
//! exception signals come in through these traits, so the session stays
//! deterministic under test and portable across front ends.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

/// Source of the seconds-since-last-input signal.
///
/// Implementations must fail toward activity: when the query cannot be
/// answered, return `0.0` so counters keep accruing instead of silently
/// stalling.
pub trait IdleSource: Send {
    fn seconds_since_last_input(&mut self) -> f64;
}

/// Source of the external conditions that defer breaks.
///
/// Implementations must fail open: when a query cannot be answered,
/// return `false` so a broken probe never leaves breaks deferred.
pub trait ExceptionProbe: Send {
    fn is_microphone_active(&mut self) -> bool;
    fn is_screen_sharing_active(&mut self) -> bool;
    /// Whether `app_id` identifies the frontmost application.
    fn is_app_focused(&mut self, app_id: &str) -> bool;
    /// Whether `app_id` identifies any running application.
    fn is_app_running(&mut self, app_id: &str) -> bool;
}

/// Idle source reporting a fixed value. Useful for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantIdle(pub f64);

impl IdleSource for ConstantIdle {
    fn seconds_since_last_input(&mut self) -> f64 {
        self.0
    }
}

/// Probe that never reports an exception.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExceptions;

impl ExceptionProbe for NoExceptions {
    fn is_microphone_active(&mut self) -> bool {
        false
    }
    fn is_screen_sharing_active(&mut self) -> bool {
        false
    }
    fn is_app_focused(&mut self, _app_id: &str) -> bool {
        false
    }
    fn is_app_running(&mut self, _app_id: &str) -> bool {
        false
    }
}

#[derive(Debug, Default)]
struct ScriptState {
    idle_secs: f64,
    microphone: bool,
    screen_sharing: bool,
    focused_app: Option<String>,
    running_apps: BTreeSet<String>,
}

/// Scriptable probe state shared between a session and its driver.
///
/// Hand the session [`ScriptedInput::idle_source`] and
/// [`ScriptedInput::exception_probe`], then flip signals through the
/// setters while it runs. Simulations and tests are built on this.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle_source(&self) -> Box<dyn IdleSource> {
        Box::new(ScriptedIdle(self.state.clone()))
    }

    pub fn exception_probe(&self) -> Box<dyn ExceptionProbe> {
        Box::new(ScriptedExceptions(self.state.clone()))
    }

    pub fn idle_secs(&self) -> f64 {
        self.state.lock().map(|s| s.idle_secs).unwrap_or(0.0)
    }

    pub fn set_idle_secs(&self, secs: f64) {
        if let Ok(mut state) = self.state.lock() {
            state.idle_secs = secs;
        }
    }

    pub fn set_microphone(&self, on: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.microphone = on;
        }
    }

    pub fn set_screen_sharing(&self, on: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.screen_sharing = on;
        }
    }

    pub fn set_focused_app(&self, app_id: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.focused_app = app_id.map(str::to_string);
        }
    }

    pub fn launch_app(&self, app_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.running_apps.insert(app_id.to_string());
        }
    }

    pub fn quit_app(&self, app_id: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.running_apps.remove(app_id);
            if state.focused_app.as_deref() == Some(app_id) {
                state.focused_app = None;
            }
        }
    }
}

struct ScriptedIdle(Arc<Mutex<ScriptState>>);

impl IdleSource for ScriptedIdle {
    fn seconds_since_last_input(&mut self) -> f64 {
        // Poisoned state reads as active, per the trait contract.
        self.0.lock().map(|s| s.idle_secs).unwrap_or(0.0)
    }
}

struct ScriptedExceptions(Arc<Mutex<ScriptState>>);

impl ExceptionProbe for ScriptedExceptions {
    fn is_microphone_active(&mut self) -> bool {
        self.0.lock().map(|s| s.microphone).unwrap_or(false)
    }

    fn is_screen_sharing_active(&mut self) -> bool {
        self.0.lock().map(|s| s.screen_sharing).unwrap_or(false)
    }

    fn is_app_focused(&mut self, app_id: &str) -> bool {
        self.0
            .lock()
            .map(|s| s.focused_app.as_deref() == Some(app_id))
            .unwrap_or(false)
    }

    fn is_app_running(&mut self, app_id: &str) -> bool {
        self.0
            .lock()
            .map(|s| s.running_apps.contains(app_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_handles_share_state() {
        let input = ScriptedInput::new();
        let mut idle = input.idle_source();
        let mut probe = input.exception_probe();

        assert_eq!(idle.seconds_since_last_input(), 0.0);
        input.set_idle_secs(12.5);
        assert_eq!(idle.seconds_since_last_input(), 12.5);

        assert!(!probe.is_microphone_active());
        input.set_microphone(true);
        assert!(probe.is_microphone_active());
    }

    #[test]
    fn quitting_an_app_drops_its_focus() {
        let input = ScriptedInput::new();
        let mut probe = input.exception_probe();

        input.launch_app("com.example.zoom");
        input.set_focused_app(Some("com.example.zoom"));
        assert!(probe.is_app_running("com.example.zoom"));
        assert!(probe.is_app_focused("com.example.zoom"));

        input.quit_app("com.example.zoom");
        assert!(!probe.is_app_running("com.example.zoom"));
        assert!(!probe.is_app_focused("com.example.zoom"));
    }

    #[test]
    fn constant_probes_report_fixed_values() {
        let mut idle = ConstantIdle(42.0);
        assert_eq!(idle.seconds_since_last_input(), 42.0);
        let mut probe = NoExceptions;
        assert!(!probe.is_screen_sharing_active());
        assert!(!probe.is_app_focused("anything"));
    }
}
