//! Logging module for traitor
//!
//! Writes a timestamped trace of resolution, location, edits and writes to a
//! log file. Nothing is logged until [`init_logger`] has been called.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::editor::UseChange;
use crate::locate::TypeDeclaration;
use crate::resolver::ResolvedType;

/// Global logger instance
static LOGGER: Mutex<Option<EditLogger>> = Mutex::new(None);

/// Logger for edit operations
pub struct EditLogger {
    file: File,
}

impl EditLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self { file })
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    /// Log a section header
    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        std::env::temp_dir().join(format!("traitor-{}.log", timestamp))
    });

    let logger = EditLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

/// Log a message to the global logger
pub fn log(message: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.log(message);
        }
    }
}

/// Log a section header
pub fn section(title: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            logger.section(title);
        }
    }
}

/// Check if logging is enabled
pub fn is_enabled() -> bool {
    LOGGER.lock().map(|guard| guard.is_some()).unwrap_or(false)
}

pub fn log_resolve(name: &str, resolved: &ResolvedType) {
    log(&format!(
        "Resolved {} `{}` -> {} ({})",
        resolved.kind,
        name,
        resolved.name,
        resolved.path.display()
    ));
}

pub fn log_locate(name: &str, decl: &TypeDeclaration) {
    log(&format!(
        "Located {} `{}`: header line {}, body lines {}-{}",
        decl.kind,
        name,
        decl.header_line + 1,
        decl.body_start + 1,
        decl.body_end + 1
    ));
}

pub fn log_edit(trait_name: &str, change: &UseChange) {
    let outcome = match change {
        UseChange::Inserted { line } => format!("inserted at line {}", line + 1),
        UseChange::AlreadyPresent { line } => format!("already used at line {}", line + 1),
        UseChange::Removed { lines } => format!(
            "removed from line(s) {}",
            lines
                .iter()
                .map(|l| (l + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
        UseChange::Absent => "not used, nothing to remove".to_string(),
    };
    log(&format!("  {}: {}", trait_name, outcome));
}

pub fn log_write(path: &Path, bytes: usize) {
    log(&format!("Wrote {} bytes to {}", bytes, path.display()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_writes_timestamped_lines() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("edit.log");

        let mut logger = EditLogger::new(&path).unwrap();
        logger.section("ADD");
        logger.log("hello");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].ends_with("] ADD"));
        assert!(lines[3].starts_with('['));
        assert!(lines[3].ends_with("] hello"));
    }
}
