// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files (after external rotation)

use tokio::sync::watch;

use crate::logger;

/// Signal handler state
pub struct SignalHandler {
    /// Raised once when shutdown is requested
    shutdown: watch::Sender<bool>,
}

impl SignalHandler {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { shutdown }
    }

    /// Receiver that observes the shutdown flag
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Raise the shutdown flag
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn shutdown_requested(&self) -> bool {
        *self.shutdown.borrow()
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Start signal handlers (Unix)
///
/// Registers the handlers up front so registration failures surface at
/// startup, then listens in a background task.
///
/// | Signal  | Action             |
/// |---------|--------------------|
/// | SIGTERM | Graceful stop      |
/// | SIGINT  | Graceful stop      |
/// | SIGUSR1 | Reopen log files   |
#[cfg(unix)]
pub fn start_signal_handler(handler: std::sync::Arc<SignalHandler>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigusr1 = signal(SignalKind::user_defined1())?;

    logger::log_info(&format!(
        "Signal handlers registered (pid {}): SIGTERM/SIGINT stop, SIGUSR1 reopens logs",
        std::process::id()
    ));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    logger::log_info("SIGTERM received, shutting down gracefully");
                    handler.request_shutdown();
                    break;
                }

                _ = sigint.recv() => {
                    logger::log_info("SIGINT received, shutting down gracefully");
                    handler.request_shutdown();
                    break;
                }

                _ = sigusr1.recv() => {
                    match logger::reopen() {
                        Ok(()) => logger::log_info("SIGUSR1 received, log files reopened"),
                        Err(e) => logger::log_error(&format!("Failed to reopen log files: {e}")),
                    }
                }
            }
        }
    });

    Ok(())
}

/// Fallback for other platforms - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(handler: std::sync::Arc<SignalHandler>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("Ctrl+C received, shutting down gracefully");
            handler.request_shutdown();
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_flag_reaches_subscribers() {
        let handler = SignalHandler::new();
        let mut rx = handler.subscribe();
        assert!(!handler.shutdown_requested());

        handler.request_shutdown();

        assert!(handler.shutdown_requested());
        rx.wait_for(|stopping| *stopping).await.unwrap();
    }
}
