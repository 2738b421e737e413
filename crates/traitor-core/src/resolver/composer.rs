//! Composer.json parsing and PSR-4 resolution

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{ResolvedType, TypeResolver};
use crate::error::{Result, TraitorError};
use crate::locate::declared_types;
use crate::names::{normalize, same_name};

/// Represents a parsed composer.json file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposerJson {
    #[serde(default)]
    pub autoload: AutoloadSection,

    #[serde(default, rename = "autoload-dev")]
    pub autoload_dev: AutoloadSection,
}

/// Autoload configuration section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoloadSection {
    #[serde(default, rename = "psr-4")]
    pub psr4: HashMap<String, Psr4Paths>,
}

/// PSR-4 paths can be a single string or an array of strings
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Psr4Paths {
    Single(String),
    Multiple(Vec<String>),
}

impl Psr4Paths {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Psr4Paths::Single(s) => vec![s.clone()],
            Psr4Paths::Multiple(v) => v.clone(),
        }
    }
}

/// A resolved PSR-4 mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Psr4Mapping {
    /// Namespace prefix without leading `\`, with trailing `\` (empty for the fallback)
    pub namespace_prefix: String,
    pub directories: Vec<PathBuf>,
}

impl ComposerJson {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| TraitorError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| TraitorError::Composer {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Search for a composer.json from `dir` upward
    pub fn find_in_directory(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|ancestor| ancestor.join("composer.json"))
            .find(|candidate| candidate.is_file())
    }

    pub fn get_psr4_mappings(&self, base_dir: &Path, include_dev: bool) -> Vec<Psr4Mapping> {
        let mut sections = vec![&self.autoload];
        if include_dev {
            sections.push(&self.autoload_dev);
        }

        sections
            .into_iter()
            .flat_map(|section| section.psr4.iter())
            .map(|(namespace, paths)| Psr4Mapping {
                namespace_prefix: normalize(namespace).to_string(),
                directories: paths.to_vec().into_iter().map(|p| base_dir.join(p)).collect(),
            })
            .collect()
    }

    pub fn has_autoload(&self) -> bool {
        !self.autoload.psr4.is_empty()
    }
}

/// Resolves names through PSR-4 mappings, confirming the declaration in the file
#[derive(Debug, Clone)]
pub struct Psr4Resolver {
    mappings: Vec<Psr4Mapping>,
}

impl Psr4Resolver {
    pub fn new(mut mappings: Vec<Psr4Mapping>) -> Self {
        // Longest prefix first
        mappings.sort_by(|a, b| b.namespace_prefix.len().cmp(&a.namespace_prefix.len()));
        Self { mappings }
    }

    pub fn from_composer(path: &Path, include_dev: bool) -> Result<Self> {
        let composer = ComposerJson::load(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::new(composer.get_psr4_mappings(base_dir, include_dev)))
    }

    pub fn mappings(&self) -> &[Psr4Mapping] {
        &self.mappings
    }

    /// Files that would hold `name` under each matching mapping
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        let name = normalize(name);
        self.mappings
            .iter()
            .filter_map(|mapping| {
                name.strip_prefix(mapping.namespace_prefix.as_str())
                    .map(|relative| (mapping, relative))
            })
            .flat_map(|(mapping, relative)| {
                let file = format!("{}.php", relative.replace('\\', "/"));
                mapping.directories.iter().map(move |dir| dir.join(&file))
            })
            .collect()
    }
}

impl TypeResolver for Psr4Resolver {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        for candidate in self.candidates(name) {
            if !candidate.is_file() {
                continue;
            }
            let source = fs::read_to_string(&candidate).map_err(|e| TraitorError::io(&candidate, e))?;
            let lines: Vec<&str> = source.split_inclusive('\n').collect();
            if let Some(declared) = declared_types(&lines)
                .into_iter()
                .find(|declared| same_name(&declared.name, name))
            {
                return Ok(ResolvedType {
                    name: declared.name,
                    kind: declared.kind,
                    path: candidate,
                });
            }
        }
        Err(TraitorError::not_found("type", normalize(name)))
    }
}
