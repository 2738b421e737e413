//! Resolving fully qualified type names to their declaring files
//!
//! The editor never needs to know how a name was found. Anything that can
//! answer "which file declares `App\Models\User`, and is it a class, an
//! interface or a trait?" implements [`TypeResolver`]:
//!
//! - [`TypeIndex`]: an in-memory table, filled by hand or by a scan
//! - [`ScanResolver`]: indexes every `*.php` file below some directories
//! - [`Psr4Resolver`]: follows the PSR-4 mappings of a `composer.json`
//! - [`ChainResolver`]: asks several resolvers in turn

pub mod composer;
pub mod scan;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, TraitorError};
use crate::locate::{declared_types, TypeKind};
use crate::names::normalize;

pub use composer::{ComposerJson, Psr4Mapping, Psr4Resolver};
pub use scan::{ExcludeFilter, ScanResolver};

/// A resolved class-like type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedType {
    /// Fully qualified name as declared, without leading `\`
    pub name: String,
    pub kind: TypeKind,
    /// File declaring the type
    pub path: PathBuf,
}

/// Capability to find where a type is declared
pub trait TypeResolver {
    /// Resolve a fully qualified name, failing with `NotFound` when unknown
    fn resolve(&self, name: &str) -> Result<ResolvedType>;
}

impl<R: TypeResolver + ?Sized> TypeResolver for &R {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        (**self).resolve(name)
    }
}

impl<R: TypeResolver + ?Sized> TypeResolver for Box<R> {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        (**self).resolve(name)
    }
}

/// In-memory table of declared types keyed by lowercase fully qualified name
#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    types: HashMap<String, ResolvedType>,
}

impl TypeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type. The first declaration of a name wins; returns false for duplicates.
    pub fn insert(&mut self, resolved: ResolvedType) -> bool {
        let key = normalize(&resolved.name).to_ascii_lowercase();
        if self.types.contains_key(&key) {
            return false;
        }
        self.types.insert(key, resolved);
        true
    }

    /// Index every type declared in `source`, which was read from `path`
    pub fn index_source(&mut self, path: &Path, source: &str) -> usize {
        let lines: Vec<&str> = source.split_inclusive('\n').collect();
        declared_types(&lines)
            .into_iter()
            .filter(|declared| {
                self.insert(ResolvedType {
                    name: declared.name.clone(),
                    kind: declared.kind,
                    path: path.to_path_buf(),
                })
            })
            .count()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedType> {
        self.types.values()
    }
}

impl TypeResolver for TypeIndex {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        self.types
            .get(&normalize(name).to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| TraitorError::not_found("type", normalize(name)))
    }
}

/// Tries each resolver in order; `NotFound` falls through to the next one
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn TypeResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn push(&mut self, resolver: Box<dyn TypeResolver>) {
        self.resolvers.push(resolver);
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl TypeResolver for ChainResolver {
    fn resolve(&self, name: &str) -> Result<ResolvedType> {
        for resolver in &self.resolvers {
            match resolver.resolve(name) {
                Err(e) if e.is_not_found() => continue,
                other => return other,
            }
        }
        Err(TraitorError::not_found("type", normalize(name)))
    }
}
