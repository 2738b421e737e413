//! Reading and atomically rewriting source files

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TraitorError};

/// Read a whole file. The handle is closed before this returns.
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| TraitorError::io(path, e))
}

/// Replace the file's content as a whole.
///
/// The content goes to a temporary file next to the target, which is flushed
/// to disk and renamed over the target, so readers see either the old or the
/// new content. The original permissions are carried over.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| TraitorError::io(dir, e))?;
    temp.write_all(contents.as_bytes())
        .map_err(|e| TraitorError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| TraitorError::io(temp.path(), e))?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| TraitorError::io(temp.path(), e))?;
    }

    temp.persist(path)
        .map_err(|e| TraitorError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_replaces_content() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Foo.php");
        fs::write(&file, "<?php\nclass Foo {}\n").unwrap();

        write_atomic(&file, "<?php\nclass Foo {\n    use Bar;\n}\n").unwrap();

        assert_eq!(read_source(&file).unwrap(), "<?php\nclass Foo {\n    use Bar;\n}\n");
        // No temporary files left behind
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_source(&temp.path().join("missing.php")).unwrap_err();
        assert!(matches!(err, TraitorError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_write_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Foo.php");
        fs::write(&file, "old").unwrap();
        fs::set_permissions(&file, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&file, "new").unwrap();

        let mode = fs::metadata(&file).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
