//! Backup functionality for safe file modifications
//!
//! Creates a timestamped backup directory before an edited file is written,
//! so the edit can be undone, and re-parses written files on request.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Backup manager for file modifications
pub struct BackupManager {
    /// Directory to store backups
    backup_dir: PathBuf,
    /// Timestamped session directory
    session_dir: Option<PathBuf>,
    /// Whether backups are enabled
    enabled: bool,
}

impl BackupManager {
    pub fn new(backup_dir: PathBuf, enabled: bool) -> Self {
        Self {
            backup_dir,
            session_dir: None,
            enabled,
        }
    }

    /// Create the timestamped session directory (no-op when disabled)
    pub fn init_session(&mut self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let session_dir = self.backup_dir.join(&timestamp);

        fs::create_dir_all(&session_dir)
            .with_context(|| format!("Failed to create backup directory: {}", session_dir.display()))?;

        self.session_dir = Some(session_dir);
        Ok(())
    }

    /// Copy a file into the session before it is modified
    pub fn backup_file(&self, path: &Path) -> Result<Option<PathBuf>> {
        let Some(session_dir) = self.session_dir.as_ref().filter(|_| self.enabled) else {
            return Ok(None);
        };

        // Mirror the file's path below the session directory
        let relative: PathBuf = path
            .components()
            .filter(|c| matches!(c, std::path::Component::Normal(_)))
            .collect();
        let backup_path = session_dir.join(relative);

        if let Some(parent) = backup_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create backup directory: {}", parent.display()))?;
        }

        fs::copy(path, &backup_path).with_context(|| {
            format!("Failed to backup file: {} -> {}", path.display(), backup_path.display())
        })?;

        Ok(Some(backup_path))
    }

    pub fn restore_file(&self, original_path: &Path, backup_path: &Path) -> Result<()> {
        fs::copy(backup_path, original_path).with_context(|| {
            format!(
                "Failed to restore file: {} -> {}",
                backup_path.display(),
                original_path.display()
            )
        })?;
        Ok(())
    }

    /// Session directory path, for reporting
    pub fn session_path(&self) -> Option<&Path> {
        self.session_dir.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Whether a PHP file still parses
pub fn verify_php_file(path: &Path) -> Result<bool> {
    use bumpalo::Bump;
    use mago_database::file::FileId;

    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file for verification: {}", path.display()))?;

    let arena = Bump::new();
    let file_id = FileId::new(path.to_string_lossy().as_ref());
    let (_, parse_error) = mago_syntax::parser::parse_file_content(&arena, file_id, &source);

    Ok(parse_error.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_backup_disabled() {
        let temp = TempDir::new().unwrap();
        let mut manager = BackupManager::new(temp.path().join("backups"), false);
        manager.init_session().unwrap();

        let file = temp.path().join("Foo.php");
        fs::write(&file, "<?php\n").unwrap();

        assert!(!manager.is_enabled());
        assert!(manager.session_path().is_none());
        assert!(manager.backup_file(&file).unwrap().is_none());
        assert!(!temp.path().join("backups").exists());
    }

    #[test]
    fn test_backup_and_restore() {
        let temp = TempDir::new().unwrap();
        let mut manager = BackupManager::new(temp.path().join("backups"), true);

        let file = temp.path().join("src/Foo.php");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "<?php\nclass Foo {}\n").unwrap();

        manager.init_session().unwrap();
        let session = manager.session_path().unwrap().to_path_buf();
        let backup = manager.backup_file(&file).unwrap().unwrap();

        assert!(backup.starts_with(&session));
        assert!(backup.ends_with("src/Foo.php"));

        fs::write(&file, "<?php\nclass Foo {\n    use Bar;\n}\n").unwrap();
        manager.restore_file(&file, &backup).unwrap();

        assert_eq!(fs::read_to_string(&file).unwrap(), "<?php\nclass Foo {}\n");
    }

    #[test]
    fn test_verify_valid_php() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("valid.php");
        fs::write(&file, "<?php\nclass Foo\n{\n    use Bar;\n}\n").unwrap();

        assert!(verify_php_file(&file).unwrap());
    }

    #[test]
    fn test_verify_invalid_php() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("invalid.php");
        fs::write(&file, "<?php\nclass Foo\n{\n    use Bar\n}\n").unwrap();

        assert!(!verify_php_file(&file).unwrap());
    }
}
