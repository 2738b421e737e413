//! Resolver built by scanning directories for PHP files

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use walkdir::WalkDir;

use super::{ResolvedType, TypeIndex, TypeResolver};
use crate::error::Result;

/// Exclude patterns: globs matched against the path or file name, and
/// `dir/` patterns matching any path component
#[derive(Debug, Clone, Default)]
pub struct ExcludeFilter {
    patterns: Vec<String>,
}

impl ExcludeFilter {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");

        for pattern in &self.patterns {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

/// Indexes every type declared under a set of directories
#[derive(Debug, Clone)]
pub struct ScanResolver {
    index: TypeIndex,
    files_scanned: usize,
}

impl ScanResolver {
    pub fn new(roots: &[PathBuf], exclude: &ExcludeFilter) -> Self {
        let files = discover_files(roots, exclude);

        let sources: Vec<(PathBuf, String)> = files
            .par_iter()
            .filter_map(|file| {
                let source = fs::read_to_string(file).ok()?;
                Some((file.clone(), source))
            })
            .collect();

        // Files are sorted, so the first declaration in path order wins
        let mut index = TypeIndex::new();
        for (path, source) in &sources {
            index.index_source(path, source);
        }

        Self {
            index,
            files_scanned: sources.len(),
        }
    }

    pub fn index(&self) -> &TypeIndex {
        &self.index
    }

    pub fn files_scanned(&self) -> usize {
        self.files_scanned
    }
}

impl TypeResolver for ScanResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        self.index.resolve(name)
    }
}

/// All `*.php` files under `roots`, sorted and without excluded paths
pub fn discover_files(roots: &[PathBuf], exclude: &ExcludeFilter) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for root in roots {
        if !root.exists() {
            continue;
        }

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                let relative = e.path().strip_prefix(root).unwrap_or(e.path());
                relative.as_os_str().is_empty() || !exclude.is_excluded(relative)
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() && path.extension().map(|e| e == "php").unwrap_or(false) {
                files.push(path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::TypeKind;
    use tempfile::TempDir;

    #[test]
    fn test_exclude_patterns() {
        let filter = ExcludeFilter::new(vec!["vendor/".to_string(), "*.generated.php".to_string()]);
        assert!(filter.is_excluded(Path::new("vendor/acme/Foo.php")));
        assert!(filter.is_excluded(Path::new("src/vendor/Foo.php")));
        assert!(filter.is_excluded(Path::new("src/Proxy.generated.php")));
        assert!(!filter.is_excluded(Path::new("src/Models/User.php")));
    }

    #[test]
    fn test_scan_indexes_declared_types() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();
        fs::create_dir_all(root.join("src/Traits")).unwrap();
        fs::create_dir_all(root.join("vendor/acme")).unwrap();

        fs::write(
            root.join("src/Traits/Loggable.php"),
            "<?php\nnamespace App\\Traits;\n\ntrait Loggable\n{\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("src/User.php"),
            "<?php\nnamespace App;\n\nclass User\n{\n}\n\ninterface HasName\n{\n}\n",
        )
        .unwrap();
        fs::write(root.join("src/notes.txt"), "class Ignored {}\n").unwrap();
        fs::write(root.join("vendor/acme/Lib.php"), "<?php\nclass Lib {}\n").unwrap();

        let resolver = ScanResolver::new(&[root], &ExcludeFilter::new(vec!["vendor/".to_string()]));

        assert_eq!(resolver.files_scanned(), 2);
        assert_eq!(resolver.index().len(), 3);
        assert_eq!(resolver.resolve("App\\Traits\\Loggable").unwrap().kind, TypeKind::Trait);
        assert_eq!(resolver.resolve("App\\HasName").unwrap().kind, TypeKind::Interface);
        assert!(resolver.resolve("Lib").unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_root_is_skipped() {
        let temp = TempDir::new().unwrap();
        let resolver = ScanResolver::new(&[temp.path().join("nope")], &ExcludeFilter::default());
        assert_eq!(resolver.files_scanned(), 0);
        assert!(resolver.index().is_empty());
    }
}
