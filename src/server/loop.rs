// Server loop module
// Accepts connections until shutdown, then drains active ones

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::{accept_connection, wait_for_shutdown};
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept loop for the document server
///
/// Runs until the shutdown flag is raised, then waits up to
/// `performance.shutdown_timeout` seconds for open connections to finish.
pub async fn run_server(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    let connection_shutdown = shutdown.clone();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            connection_shutdown.clone(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = wait_for_shutdown(&mut shutdown) => {
                break;
            }
        }
    }

    // Stop accepting before draining
    drop(listener);

    let timeout = Duration::from_secs(state.config.performance.shutdown_timeout);
    let remaining = drain_connections(&active_connections, timeout).await;
    logger::log_shutdown_complete(remaining);
}

/// Wait until no connections remain or `timeout` elapses
///
/// Returns the number of connections still open.
pub async fn drain_connections(active_connections: &AtomicUsize, timeout: Duration) -> usize {
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst));

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use crate::store::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_drain_returns_immediately_when_idle() {
        let counter = AtomicUsize::new(0);
        assert_eq!(drain_connections(&counter, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let counter = AtomicUsize::new(2);
        let remaining = drain_connections(&counter, Duration::from_millis(120)).await;
        assert_eq!(remaining, 2);
    }

    #[tokio::test]
    async fn test_serves_request_and_shuts_down() {
        let mut cfg = Config::load_from("definitely-not-a-config-file").unwrap();
        cfg.logging.access_log = false;
        let store = Arc::new(MemoryStore::from_pairs([("ping.json", r#"{"pong":true}"#)]));
        let state = Arc::new(AppState::new(&cfg, store));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server = tokio::spawn(run_server(
            listener,
            state,
            Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        ));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut raw = String::new();
        stream.read_to_string(&mut raw).await.unwrap();

        assert!(raw.starts_with("HTTP/1.1 200 OK"));
        assert!(raw.to_ascii_lowercase().contains("access-control-allow-origin: *"));
        assert!(raw.ends_with(r#"{"pong":true}"#));

        shutdown_tx.send(true).unwrap();
        server.await.unwrap();
    }
}
