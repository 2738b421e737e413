//! Configuration file support for traitor
//!
//! Loads `.traitor.toml` from current directory or parent directories.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use traitor_core::{EditorOptions, ExcludeFilter, IndentStyle};

pub const CONFIG_FILE: &str = ".traitor.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub editor: EditorConfig,
    pub resolver: ResolverConfig,
    pub backup: BackupConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Indentation unit for bodies that give no hint: "    ", "\t", "tab" or a width
    pub indent: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// composer.json to read PSR-4 mappings from (default: searched upward)
    pub composer: Option<PathBuf>,
    /// Also use `autoload-dev` mappings
    pub include_dev: bool,
    /// Directories scanned for declarations PSR-4 cannot find
    pub paths: Vec<PathBuf>,
    /// Glob patterns excluded from scanning
    pub exclude: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            composer: None,
            include_dev: true,
            paths: Vec::new(),
            exclude: vec!["vendor/".to_string()],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Backup directory (default: .traitor-backup)
    pub dir: Option<PathBuf>,
    /// Re-parse edited files and restore them if they no longer parse
    pub verify: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Editor options, the CLI indent taking precedence over the config file
    pub fn editor_options(&self, cli_indent: Option<&str>) -> EditorOptions {
        let indent = cli_indent
            .or(self.editor.indent.as_deref())
            .map(IndentStyle::from_config)
            .unwrap_or_default();
        EditorOptions { indent }
    }

    pub fn exclude_filter(&self) -> ExcludeFilter {
        ExcludeFilter::new(self.resolver.exclude.clone())
    }

    /// Backup directory, relative to `base_dir` unless absolute
    pub fn backup_dir(&self, base_dir: &Path) -> PathBuf {
        let dir = self
            .backup
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".traitor-backup"));
        base_dir.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_config(dir: &Path, content: &str) {
        fs::write(dir.join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn test_load_basic_config() {
        let temp = TempDir::new().unwrap();
        create_config(
            temp.path(),
            r#"
[editor]
indent = "\t"

[resolver]
composer = "app/composer.json"
include_dev = false
paths = ["src", "lib"]
exclude = ["*.generated.php"]

[backup]
enabled = true
dir = "backups"
verify = true

[output]
format = "json"
"#,
        );

        let (config, path) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(config.editor.indent.as_deref(), Some("\t"));
        assert_eq!(config.resolver.composer, Some(PathBuf::from("app/composer.json")));
        assert!(!config.resolver.include_dev);
        assert_eq!(config.resolver.paths, vec![PathBuf::from("src"), PathBuf::from("lib")]);
        assert_eq!(config.resolver.exclude, vec!["*.generated.php".to_string()]);
        assert!(config.backup.enabled);
        assert!(config.backup.verify);
        assert_eq!(config.backup_dir(temp.path()), temp.path().join("backups"));
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.editor_options(None).indent, IndentStyle::Tabs);
    }

    #[test]
    fn test_load_empty_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "");

        let (config, _) = Config::load_from(temp.path().to_path_buf())
            .unwrap()
            .unwrap();

        assert!(config.editor.indent.is_none());
        assert!(config.resolver.include_dev);
        assert_eq!(config.resolver.exclude, vec!["vendor/".to_string()]);
        assert!(!config.backup.enabled);
        assert!(config.output.format.is_none());
        assert_eq!(config.backup_dir(Path::new("/p")), PathBuf::from("/p/.traitor-backup"));
    }

    #[test]
    fn test_load_from_parent_directory() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[output]\nformat = \"diff\"\n");
        let nested = temp.path().join("src/Models");
        fs::create_dir_all(&nested).unwrap();

        let (config, path) = Config::load_from(nested).unwrap().unwrap();
        assert_eq!(path, temp.path().join(CONFIG_FILE));
        assert_eq!(config.output.format.as_deref(), Some("diff"));
    }

    #[test]
    fn test_no_config_found() {
        let temp = TempDir::new().unwrap();
        let result = Config::load_from(temp.path().to_path_buf()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let temp = TempDir::new().unwrap();
        create_config(temp.path(), "[backup]\nenabled = \"maybe\"\n");
        assert!(Config::load_from(temp.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_cli_indent_overrides_config() {
        let config = Config {
            editor: EditorConfig {
                indent: Some("\t".to_string()),
            },
            ..Default::default()
        };

        assert_eq!(config.editor_options(Some("2")).indent, IndentStyle::Spaces(2));
        assert_eq!(Config::default().editor_options(None).indent, IndentStyle::default());
    }
}
