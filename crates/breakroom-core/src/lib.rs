//! # Breakroom Core Library
//!
//! This library provides the core business logic for the Breakroom break
//! reminder. It implements a CLI-first philosophy where all operations are
//! available via a standalone CLI binary, with any GUI shell being a thin
//! layer over the same core library.
//!
//! ## Architecture
//!
//! - **Counters**: Per-tier active-time accounting with idle unwinding,
//!   cascade resets, and merge-window suppression
//! - **Session**: A wall-clock-based phase machine (idle, warning, overlay)
//!   driven by a coalescing timer wheel; the caller periodically invokes
//!   `advance()` for progress updates
//! - **Probes**: Trait seams for idle detection and exception sources
//!   (microphone, screen sharing, configured apps), with scripted fakes
//!   for simulation
//! - **Storage**: TOML-based configuration and a JSON break history log
//!
//! ## Key Components
//!
//! - [`BreakSession`]: Core break state machine
//! - [`SessionRuntime`]: Async driver publishing events over a broadcast
//!   channel
//! - [`TierCounters`]: Elapsed-active accounting per tier
//! - [`Config`]: Application configuration management

pub mod config;
pub mod counters;
pub mod error;
pub mod events;
pub mod exceptions;
pub mod probe;
pub mod runtime;
pub mod session;
pub mod sim;
pub mod storage;
pub mod tier;

pub use config::{Config, ExceptionRule, InputMonitoring, TriggerMode};
pub use counters::TierCounters;
pub use error::{ConfigError, CoreError, LogError, Result};
pub use events::{BreakLogKind, Event, TierStatus};
pub use exceptions::{ExceptionEdge, ExceptionMonitor, ExceptionState};
pub use probe::{ConstantIdle, ExceptionProbe, IdleSource, NoExceptions, ScriptedInput};
pub use runtime::{Command, SessionRuntime};
pub use session::{BreakPhase, BreakSession, OverlayState, PauseState, PhaseKind};
pub use sim::{Scenario, ScenarioStep, SimReport};
pub use storage::{BreakLogEntry, BreakLogStore, ConfigStore};
pub use tier::{ScreenType, Tier, TierColor, TierId};
