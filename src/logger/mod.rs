//! Logger module
//!
//! Provides logging utilities for the server including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error, warning and debug logging with a level filter
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use std::str::FromStr;

/// Minimum severity written to the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config.logging.level.parse().unwrap_or_else(|e: String| {
        eprintln!("[WARN] {e}, falling back to info");
        LogLevel::Info
    });
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
        level,
    )
}

/// Reopen log files after rotation
pub fn reopen() -> std::io::Result<()> {
    writer::get().map_or(Ok(()), writer::LogWriter::reopen)
}

fn enabled(level: LogLevel) -> bool {
    writer::get().map_or(level <= LogLevel::Info, |w| level <= w.level())
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("JSON edge server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!(
        "Store: {:?} ({})",
        config.store.backend,
        config
            .store
            .seed_file
            .as_deref()
            .unwrap_or(&config.store.data_dir)
    ));
    write_info(&format!("Key listing: {}", config.content.list_keys_path));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[Connection] Accepted from: {peer_addr}"));
    }
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    if enabled(LogLevel::Warn) {
        write_error(&format!("[WARN] {message}"));
    }
}

pub fn log_info(message: &str) {
    if enabled(LogLevel::Info) {
        write_info(&format!("[INFO] {message}"));
    }
}

pub fn log_debug(message: &str) {
    if enabled(LogLevel::Debug) {
        write_info(&format!("[DEBUG] {message}"));
    }
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown_started(active: usize) {
    write_info(&format!(
        "\n[Shutdown] Stopped accepting connections, {active} still active"
    ));
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write_info("[Shutdown] All connections closed");
    } else {
        write_error(&format!(
            "[Shutdown] Timed out with {remaining} connection(s) still open"
        ));
    }
}
