use breakroom_core::{
    BreakLogEntry, BreakLogStore, BreakSession, ConfigStore, ConstantIdle, Event, NoExceptions,
    SessionRuntime,
};
use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;

pub fn run(duration_secs: Option<u64>, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigStore::new()?.load_or_default();
    let log_store = BreakLogStore::new()?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(async move {
        // No OS probes here: the foreground runner treats the user as
        // continuously active and exception-free.
        let session = BreakSession::new(
            config,
            Box::new(ConstantIdle(0.0)),
            Box::new(NoExceptions),
            Utc::now(),
        );
        let runtime = SessionRuntime::spawn(session);
        let mut events = runtime.subscribe();

        let stop = async {
            match duration_secs {
                Some(secs) => tokio::time::sleep(std::time::Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(stop);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = &mut ctrl_c => break,
                received = events.recv() => {
                    let event = match received {
                        Ok(event) => event,
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    };
                    if let Some(entry) = BreakLogEntry::from_event(&event) {
                        if let Err(e) = log_store.append(entry) {
                            tracing::warn!(error = %e, "failed to persist break log entry");
                        }
                    }
                    let noisy = matches!(
                        event,
                        Event::WarningOpacity { .. } | Event::OverlayCountdown { .. }
                    );
                    if json || !noisy {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                }
            }
        }

        runtime.shutdown().await;
        Ok(())
    })
}
