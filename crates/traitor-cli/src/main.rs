//! traitor CLI - add and remove PHP trait use statements
//!
//! Commands:
//! - add: Add trait use statements to a class, interface or trait
//! - remove: Remove trait use statements from a class, interface or trait
//! - locate: Show where a type is declared and which traits it uses

mod backup;
mod config;
mod output;
mod process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;

use traitor_core::{logging, TraitUsePlan, TypeKind, TypeResolver};

use backup::BackupManager;
use config::Config;
use output::{OutputFormat, Reporter};
use process::{apply_plan, build_resolver, locate_type, WriteSettings};

#[derive(Parser)]
#[command(name = "traitor")]
#[command(version)]
#[command(about = "Add and remove trait use statements in PHP classes")]
#[command(author = "traitor contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show changes without writing them
    #[arg(long, short = 'n', global = true)]
    dry_run: bool,

    /// Show verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format", global = true)]
    json: bool,

    /// Path to config file (default: auto-detect .traitor.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, global = true)]
    no_config: bool,

    /// Project root used to find composer.json and scan for types (default: config directory or cwd)
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Back up files before writing them
    #[arg(long, global = true)]
    backup: bool,

    /// Re-parse written files and restore them if they no longer parse
    #[arg(long, global = true)]
    verify: bool,

    /// Write a detailed log to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Indentation for bodies that give no hint: a width, "tab", or the literal unit
    #[arg(long, value_name = "INDENT", global = true)]
    indent: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add traits to a type
    Add {
        /// Fully qualified trait names
        #[arg(required = true, value_name = "TRAIT")]
        traits: Vec<String>,

        /// Fully qualified name of the class, interface or trait to edit
        #[arg(long, value_name = "TYPE")]
        to: String,

        /// Require the target to be of this kind: class, interface, trait
        #[arg(long, value_name = "KIND")]
        kind: Option<TypeKind>,
    },

    /// Remove traits from a type
    Remove {
        /// Fully qualified trait names
        #[arg(required = true, value_name = "TRAIT")]
        traits: Vec<String>,

        /// Fully qualified name of the class, interface or trait to edit
        #[arg(long, value_name = "TYPE")]
        from: String,

        /// Require the target to be of this kind: class, interface, trait
        #[arg(long, value_name = "KIND")]
        kind: Option<TypeKind>,
    },

    /// Show where a type is declared and which traits it uses
    Locate {
        /// Fully qualified type name
        #[arg(value_name = "TYPE")]
        name: String,

        /// Require the type to be of this kind: class, interface, trait
        #[arg(long, value_name = "KIND")]
        kind: Option<TypeKind>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    // Load config file
    let (config, config_path) = if cli.no_config {
        (Config::default(), None)
    } else if let Some(config_path) = &cli.config {
        (Config::load_path(config_path)?, Some(config_path.clone()))
    } else {
        match Config::load_from(cli.root.clone().unwrap_or_else(|| cwd.clone()))? {
            Some((cfg, path)) => (cfg, Some(path)),
            None => (Config::default(), None),
        }
    };

    // Determine output format
    let format_name = cli
        .format
        .clone()
        .or_else(|| config.output.format.clone())
        .unwrap_or_else(|| "text".to_string());
    let output_format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::from_str(&format_name).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                format_name
            )
        })?
    };
    let chatty = cli.verbose && output_format == OutputFormat::Text;

    if let Some(log_path) = &cli.log_file {
        let path = logging::init_logger(Some(log_path))
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        if chatty {
            println!("{}: {}", "Logging to".bold(), path.display());
        }
    }

    if chatty {
        if let Some(path) = &config_path {
            println!("{}: {}", "Using config".bold(), path.display());
        }
    }

    let base_dir = cli
        .root
        .clone()
        .or_else(|| {
            config_path
                .as_ref()
                .and_then(|p| p.parent())
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| p.to_path_buf())
        })
        .unwrap_or(cwd);

    let setup = build_resolver(&config, &base_dir)?;
    if chatty {
        for source in &setup.sources {
            println!("{}: {}", "Resolving with".bold(), source);
        }
        println!();
    }

    let mut reporter = Reporter::new(output_format, cli.verbose);

    let mut backup = BackupManager::new(
        config.backup_dir(&base_dir),
        (cli.backup || config.backup.enabled) && !cli.dry_run,
    );

    match &cli.command {
        Commands::Locate { name, kind } => match locate_type(name, *kind, &setup.resolver) {
            Ok(location) => reporter.report_location(location),
            Err(e) => reporter.report_error(name, &format!("{:#}", e)),
        },
        Commands::Add { traits, to, kind } => {
            let plan = TraitUsePlan::add()
                .with_traits(traits.iter().cloned())
                .with_options(config.editor_options(cli.indent.as_deref()));
            backup.init_session()?;
            edit(&cli, &config, &plan, to, *kind, &setup.resolver, &backup, &mut reporter);
        }
        Commands::Remove { traits, from, kind } => {
            let plan = TraitUsePlan::remove()
                .with_traits(traits.iter().cloned())
                .with_options(config.editor_options(cli.indent.as_deref()));
            backup.init_session()?;
            edit(&cli, &config, &plan, from, *kind, &setup.resolver, &backup, &mut reporter);
        }
    }

    // Determine exit code
    let summary = reporter.summary();
    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if cli.dry_run && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    let session = backup.session_path().map(|p| p.to_path_buf());
    reporter.finish(cli.dry_run, session.as_deref());

    Ok(exit_code)
}

#[allow(clippy::too_many_arguments)]
fn edit(
    cli: &Cli,
    config: &Config,
    plan: &TraitUsePlan,
    target: &str,
    kind: Option<TypeKind>,
    resolver: &dyn TypeResolver,
    backup: &BackupManager,
    reporter: &mut Reporter,
) {
    let settings = WriteSettings {
        dry_run: cli.dry_run,
        verify: cli.verify || config.backup.verify,
    };

    match apply_plan(plan, target, kind, resolver, settings, backup) {
        Ok(outcome) if cli.dry_run => reporter.report_check(&outcome),
        Ok(outcome) => reporter.report_fix(&outcome),
        Err(e) => reporter.report_error(target, &format!("{:#}", e)),
    }
}
