use jsonkv_edge::{config, logger, server, store};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path without extension, e.g. `config` for config.toml
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    } else {
        logger::log_info("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    let store = store::open(&cfg.store).await?;
    let listener = server::create_reusable_listener(addr)?;
    let state = Arc::new(config::AppState::new(&cfg, store));

    let signals = Arc::new(server::SignalHandler::new());
    let shutdown = signals.subscribe();
    server::start_signal_handler(Arc::clone(&signals))?;

    logger::log_server_start(&addr, &cfg);

    server::run_server(listener, state, Arc::new(AtomicUsize::new(0)), shutdown).await;
    Ok(())
}
