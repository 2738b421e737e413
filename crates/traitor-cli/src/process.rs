//! Resolver setup and edit application for traitor

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use traitor_core::{
    locate, logging, read_source, used_traits, write_atomic, ChainResolver, ComposerJson,
    EditOutcome, Psr4Resolver, ScanResolver, SourceFile, TraitUsePlan, TraitorError, TypeKind,
    TypeResolver,
};

use crate::backup::{verify_php_file, BackupManager};
use crate::config::Config;
use crate::output::Location;

/// Resolver chain plus a description of each source, for verbose output
pub struct ResolverSetup {
    pub resolver: ChainResolver,
    pub sources: Vec<String>,
}

/// Build the resolver chain: PSR-4 from composer.json first, then scanned directories.
///
/// Without composer.json and without configured paths, `base_dir` itself is scanned.
pub fn build_resolver(config: &Config, base_dir: &Path) -> Result<ResolverSetup> {
    let mut resolver = ChainResolver::new();
    let mut sources = Vec::new();

    let composer = match &config.resolver.composer {
        Some(path) => Some(base_dir.join(path)),
        None => ComposerJson::find_in_directory(base_dir),
    };
    if let Some(path) = composer {
        let psr4 = Psr4Resolver::from_composer(&path, config.resolver.include_dev)
            .with_context(|| format!("Failed to load PSR-4 mappings from {}", path.display()))?;
        sources.push(format!(
            "{} ({} PSR-4 mapping(s))",
            path.display(),
            psr4.mappings().len()
        ));
        resolver = resolver.with(psr4);
    }

    let mut roots: Vec<PathBuf> = config
        .resolver
        .paths
        .iter()
        .map(|p| base_dir.join(p))
        .collect();
    if roots.is_empty() && resolver.is_empty() {
        roots.push(base_dir.to_path_buf());
    }
    if !roots.is_empty() {
        let scan = ScanResolver::new(&roots, &config.exclude_filter());
        sources.push(format!(
            "scan of {} ({} file(s), {} type(s))",
            roots
                .iter()
                .map(|r| r.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            scan.files_scanned(),
            scan.index().len()
        ));
        resolver = resolver.with(scan);
    }

    Ok(ResolverSetup { resolver, sources })
}

/// How an edit is persisted
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteSettings {
    pub dry_run: bool,
    pub verify: bool,
}

/// Compute the edit and, unless this is a dry run, back up and write the file.
///
/// With `verify`, a written file that no longer parses is put back the way it was.
pub fn apply_plan<R: TypeResolver + ?Sized>(
    plan: &TraitUsePlan,
    target: &str,
    kind: Option<TypeKind>,
    resolver: &R,
    settings: WriteSettings,
    backup: &BackupManager,
) -> Result<EditOutcome> {
    let mut outcome = plan.run(target, kind, resolver, false)?;
    if settings.dry_run || !outcome.is_changed() {
        return Ok(outcome);
    }

    let path = outcome.path.clone();
    let backup_path = backup.backup_file(&path)?;
    write_atomic(&path, &outcome.new_source)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;
    logging::log_write(&path, outcome.new_source.len());
    outcome.written = true;

    if settings.verify && !verify_php_file(&path)? {
        match &backup_path {
            Some(backup_path) => backup.restore_file(&path, backup_path)?,
            None => write_atomic(&path, &outcome.old_source)
                .with_context(|| format!("Failed to restore file: {}", path.display()))?,
        }
        logging::log(&format!("Verification failed, restored {}", path.display()));
        bail!(
            "{} no longer parses after the edit, original content restored",
            path.display()
        );
    }

    Ok(outcome)
}

/// Resolve and locate a type, listing the traits its body uses
pub fn locate_type<R: TypeResolver + ?Sized>(
    target: &str,
    kind: Option<TypeKind>,
    resolver: &R,
) -> Result<Location> {
    let resolved = resolver.resolve(target)?;
    logging::log_resolve(target, &resolved);
    if let Some(kind) = kind {
        if resolved.kind != kind {
            return Err(TraitorError::not_found(kind.keyword(), target.trim_start_matches('\\')).into());
        }
    }

    let source = SourceFile::parse(&read_source(&resolved.path)?);
    let decl = locate(source.lines(), &resolved.name, resolved.kind)?;
    logging::log_locate(&resolved.name, &decl);

    Ok(Location {
        traits: used_traits(source.lines(), &decl),
        name: resolved.name,
        kind: resolved.kind,
        path: resolved.path,
        header_line: decl.header_line + 1,
        body_start: decl.body_start + 1,
        body_end: decl.body_end + 1,
    })
}
