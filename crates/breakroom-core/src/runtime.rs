//! Real-time session driver.
//!
//! One tokio task owns the [`BreakSession`]. A 100 ms interval drives
//! [`BreakSession::advance`], commands arrive on an mpsc channel, and
//! events fan out on a broadcast channel. Every mutation happens inside
//! the task, so the session needs no locks; this is also the only
//! place the wall clock is read.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::events::Event;
use crate::session::BreakSession;
use crate::tier::TierId;

/// How often the driving task polls the session's timer wheel.
const DRIVE_INTERVAL_MS: u64 = 100;
/// Buffered commands before senders see backpressure.
const COMMAND_BUFFER: usize = 64;
/// Event backlog per subscriber before it starts lagging.
const EVENT_BUFFER: usize = 256;

/// Commands accepted by a running session.
#[derive(Debug, Clone)]
pub enum Command {
    TakeBreakNow { tier_id: TierId },
    RehearseBreak { tier_id: TierId },
    SkipBreak,
    PostponeBreak { minutes: u32 },
    SetLockAfterBreak { lock: bool },
    PauseFor { duration_secs: u64 },
    PauseIndefinitely,
    Resume,
    DeferTier { tier_id: TierId, until: DateTime<Utc> },
    ConfigChanged(Box<Config>),
    WakeFromSleep,
    /// Publish a state snapshot on the event channel.
    EmitSnapshot,
    Shutdown,
}

pub struct SessionRuntime {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    handle: JoinHandle<()>,
}

impl SessionRuntime {
    /// Move the session into its driving task.
    pub fn spawn(session: BreakSession) -> Self {
        let (commands, mut command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let event_tx = events.clone();

        let handle = tokio::spawn(async move {
            let mut session = session;
            let mut ticker = tokio::time::interval(Duration::from_millis(DRIVE_INTERVAL_MS));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        publish(&event_tx, session.advance(Utc::now()));
                    }
                    command = command_rx.recv() => {
                        let Some(command) = command else { break };
                        if matches!(command, Command::Shutdown) {
                            break;
                        }
                        publish(&event_tx, apply(&mut session, command, Utc::now()));
                    }
                }
            }
            tracing::debug!("session task stopped");
        });

        Self {
            commands,
            events,
            handle,
        }
    }

    /// Queue a command for the session task. Returns false once the
    /// task has stopped.
    pub async fn send(&self, command: Command) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// A sender handle for command producers.
    pub fn commands(&self) -> mpsc::Sender<Command> {
        self.commands.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        let _ = self.handle.await;
    }
}

fn apply(session: &mut BreakSession, command: Command, now: DateTime<Utc>) -> Vec<Event> {
    match command {
        Command::TakeBreakNow { tier_id } => session.take_break_now(tier_id, now),
        Command::RehearseBreak { tier_id } => session.rehearse_break(tier_id, now),
        Command::SkipBreak => session.skip_break(now),
        Command::PostponeBreak { minutes } => session.postpone_break(minutes, now),
        Command::SetLockAfterBreak { lock } => {
            session.set_lock_after_break(lock);
            Vec::new()
        }
        Command::PauseFor { duration_secs } => session.pause_for(duration_secs, now),
        Command::PauseIndefinitely => session.pause_indefinitely(now),
        Command::Resume => session.resume(now),
        Command::DeferTier { tier_id, until } => {
            session.defer_tier_until(tier_id, until);
            Vec::new()
        }
        Command::ConfigChanged(config) => session.config_changed(*config, now),
        Command::WakeFromSleep => {
            session.wake_from_sleep(now);
            Vec::new()
        }
        Command::EmitSnapshot => vec![session.snapshot(now)],
        Command::Shutdown => Vec::new(),
    }
}

fn publish(tx: &broadcast::Sender<Event>, events: Vec<Event>) {
    for event in events {
        // Send only fails with zero subscribers; events are fire-and-forget.
        let _ = tx.send(event);
    }
}
