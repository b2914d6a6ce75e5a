//! Log sinks
//!
//! Access lines go to stdout or an append-mode file, errors to stderr or a
//! second file. Both can be reopened in place after log rotation.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::LogLevel;

static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    Stdout,
    Stderr,
    File(File),
}

/// Pair of sinks shared by every task
pub struct LogWriter {
    /// Access log target
    access: Mutex<LogTarget>,
    /// Error log target
    error: Mutex<LogTarget>,
    access_log_file: Option<String>,
    error_log_file: Option<String>,
    level: LogLevel,
}

impl LogWriter {
    /// Open both sinks, falling back to the standard streams
    fn new(
        access_log_file: Option<&str>,
        error_log_file: Option<&str>,
        level: LogLevel,
    ) -> io::Result<Self> {
        Ok(Self {
            access: Mutex::new(open_target(access_log_file, LogTarget::Stdout)?),
            error: Mutex::new(open_target(error_log_file, LogTarget::Stderr)?),
            access_log_file: access_log_file.map(ToString::to_string),
            error_log_file: error_log_file.map(ToString::to_string),
            level,
        })
    }

    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Write to access log
    pub fn write_access(&self, message: &str) {
        write_to_target(&mut lock(&self.access), message);
    }

    /// Write to error log
    pub fn write_error(&self, message: &str) {
        write_to_target(&mut lock(&self.error), message);
    }

    /// Informational lines share the access sink
    pub fn write_info(&self, message: &str) {
        write_to_target(&mut lock(&self.access), message);
    }

    /// Reopen both log files, picking up files moved away by rotation
    pub fn reopen(&self) -> io::Result<()> {
        let access = open_target(self.access_log_file.as_deref(), LogTarget::Stdout)?;
        let error = open_target(self.error_log_file.as_deref(), LogTarget::Stderr)?;
        *lock(&self.access) = access;
        *lock(&self.error) = error;
        Ok(())
    }
}

fn lock(target: &Mutex<LogTarget>) -> MutexGuard<'_, LogTarget> {
    target.lock().unwrap_or_else(PoisonError::into_inner)
}

fn open_target(path: Option<&str>, fallback: LogTarget) -> io::Result<LogTarget> {
    match path {
        Some(p) => Ok(LogTarget::File(open_log_file(p)?)),
        None => Ok(fallback),
    }
}

/// Append-mode open, creating the file and its parent directory
fn open_log_file(path: &str) -> io::Result<File> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Write one line, ignoring sink errors
fn write_to_target(target: &mut LogTarget, message: &str) {
    match target {
        LogTarget::Stdout => {
            println!("{message}");
        }
        LogTarget::Stderr => {
            eprintln!("{message}");
        }
        LogTarget::File(file) => {
            let _ = writeln!(file, "{message}");
        }
    }
}

/// Install the process-wide writer
///
/// Fails if a log file cannot be opened or a writer is already installed.
pub fn init(
    access_log_file: Option<&str>,
    error_log_file: Option<&str>,
    level: LogLevel,
) -> io::Result<()> {
    let writer = LogWriter::new(access_log_file, error_log_file, level)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_targets_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");

        let writer = LogWriter::new(
            Some(access.to_str().unwrap()),
            Some(error.to_str().unwrap()),
            LogLevel::Info,
        )
        .unwrap();

        writer.write_access("GET /a");
        writer.write_error("[ERROR] boom");

        let rotated = dir.path().join("logs/access.log.1");
        std::fs::rename(&access, &rotated).unwrap();
        writer.reopen().unwrap();
        writer.write_access("GET /b");

        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "GET /a\n");
        assert_eq!(std::fs::read_to_string(&access).unwrap(), "GET /b\n");
        assert_eq!(std::fs::read_to_string(&error).unwrap(), "[ERROR] boom\n");
    }
}
