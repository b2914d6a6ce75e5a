// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
/// * `shutdown` - Flips to `true` when the server starts shutting down
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
    shutdown: watch::Receiver<bool>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(state),
        Arc::clone(conn_counter),
        shutdown,
    );
}

/// Serve one connection in its own task.
///
/// HTTP/1.1 with keep-alive, bounded by `max(read_timeout, write_timeout)`.
/// On shutdown the connection finishes its in-flight request and closes.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
    mut shutdown: watch::Receiver<bool>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let keep_alive = performance.keep_alive_timeout > 0;
        let timeout_duration =
            Duration::from_secs(std::cmp::max(performance.read_timeout, performance.write_timeout));

        let mut builder = http1::Builder::new();
        builder.keep_alive(keep_alive);

        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handler::handle_request(req, Arc::clone(&service_state), Some(peer_addr))
            }),
        );
        tokio::pin!(conn);

        let served = tokio::time::timeout(timeout_duration, async {
            tokio::select! {
                result = conn.as_mut() => result,
                () = wait_for_shutdown(&mut shutdown) => {
                    conn.as_mut().graceful_shutdown();
                    conn.as_mut().await
                }
            }
        })
        .await;

        match served {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Resolve once the shutdown flag is raised
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stopping| *stopping).await;
}
