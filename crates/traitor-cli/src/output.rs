//! Output formatting for traitor
//!
//! Supports text (colored terminal), JSON and unified diff output formats.

use colored::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use traitor_core::{EditOutcome, Operation, TraitChange, TypeKind, UseChange};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// Result of editing one type
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<TraitChange>,
    pub written: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(outcome: &EditOutcome) -> Self {
        Self {
            target: outcome.target.clone(),
            path: Some(outcome.path.display().to_string()),
            kind: Some(outcome.kind),
            operation: Some(outcome.operation),
            changes: outcome.changes.clone(),
            written: outcome.written,
            error: None,
        }
    }

    pub fn error(target: &str, error: String) -> Self {
        Self {
            target: target.to_string(),
            path: None,
            kind: None,
            operation: None,
            changes: Vec::new(),
            written: false,
            error: Some(error),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.changes.iter().any(|c| c.change.is_modification())
    }
}

/// Where a type is declared and which traits it uses
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    pub name: String,
    pub kind: TypeKind,
    pub path: PathBuf,
    /// 1-based lines
    pub header_line: usize,
    pub body_start: usize,
    pub body_end: usize,
    pub traits: Vec<String>,
}

/// Summary statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub types_processed: usize,
    pub files_with_changes: usize,
    pub total_changes: usize,
    pub errors: usize,
}

/// Full JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
}

/// Reporter for accumulating and outputting results
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    locations: Vec<Location>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            locations: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Report an edit computed in dry-run mode, showing what would change
    pub fn report_check(&mut self, outcome: &EditOutcome) {
        if !self.count(outcome) {
            return;
        }

        match self.format {
            OutputFormat::Text => {
                println!("{}", outcome.path.display().to_string().bold());
                print_diff(&outcome.old_source, &outcome.new_source);
                println!();
                print_changes(&outcome.changes);
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(&outcome.path, &outcome.old_source, &outcome.new_source);
            }
            OutputFormat::Json => {
                // JSON output is handled in finish()
            }
        }
    }

    /// Report an edit after it was written
    pub fn report_fix(&mut self, outcome: &EditOutcome) {
        if !self.count(outcome) {
            return;
        }

        match self.format {
            OutputFormat::Text => {
                println!("{}", outcome.path.display().to_string().bold());
                print_changes(&outcome.changes);
                println!(
                    "  {} Applied {} change(s)",
                    "OK".green(),
                    modifications(&outcome.changes)
                );
                println!();
            }
            OutputFormat::Diff => {
                print_unified_diff(&outcome.path, &outcome.old_source, &outcome.new_source);
            }
            OutputFormat::Json => {}
        }
    }

    /// Report where a type lives
    pub fn report_location(&mut self, location: Location) {
        self.summary.types_processed += 1;

        if self.format != OutputFormat::Json {
            println!(
                "{} {} {}",
                location.kind.to_string().cyan(),
                location.name.bold(),
                format!("({}:{})", location.path.display(), location.header_line).dimmed()
            );
            println!("  body: lines {}-{}", location.body_start, location.body_end);
            if location.traits.is_empty() {
                println!("  traits: {}", "none".dimmed());
            } else {
                for name in &location.traits {
                    println!("  {} {}", "use".green(), name);
                }
            }
        }

        self.locations.push(location);
    }

    /// Report an error for a target
    pub fn report_error(&mut self, target: &str, error: &str) {
        self.summary.types_processed += 1;
        self.summary.errors += 1;

        if self.format != OutputFormat::Json {
            eprintln!("{}: {} - {}", "Error".red(), target, error);
        }

        self.results.push(FileResult::error(target, error.to_string()));
    }

    /// Print final summary/output
    pub fn finish(self, dry_run: bool, backup_session: Option<&Path>) {
        match self.format {
            OutputFormat::Text => {
                if !self.verbose && self.locations.len() == self.summary.types_processed {
                    return;
                }
                println!("{}", "Summary".bold().underline());
                println!("  Types processed: {}", self.summary.types_processed);
                println!("  Files with changes: {}", self.summary.files_with_changes);
                println!("  Total changes: {}", self.summary.total_changes);
                if self.summary.errors > 0 {
                    println!("  Errors: {}", self.summary.errors);
                }
                if let Some(session) = backup_session {
                    println!("  Backup: {}", session.display());
                }

                if dry_run && self.summary.total_changes > 0 {
                    println!();
                    println!("{}", "Run without --dry-run to apply changes".yellow());
                }
            }
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                    locations: self.locations,
                };
                match serde_json::to_string_pretty(&output) {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("{}: {}", "Error".red(), e),
                }
            }
            OutputFormat::Diff => {
                // Patch-compatible output has no summary
            }
        }
    }

    /// Get summary for exit code determination
    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    /// Record an outcome; returns whether it changed anything
    fn count(&mut self, outcome: &EditOutcome) -> bool {
        self.summary.types_processed += 1;
        self.results.push(FileResult::success(outcome));

        if !outcome.is_changed() {
            if self.verbose && self.format == OutputFormat::Text {
                println!("{}: No changes needed", outcome.path.display());
                print_changes(&outcome.changes);
            }
            return false;
        }

        self.summary.files_with_changes += 1;
        self.summary.total_changes += modifications(&outcome.changes);
        true
    }
}

fn modifications(changes: &[TraitChange]) -> usize {
    changes.iter().filter(|c| c.change.is_modification()).count()
}

/// One line per trait
fn print_changes(changes: &[TraitChange]) {
    for change in changes {
        println!("  {}", describe(change));
    }
}

fn describe(change: &TraitChange) -> String {
    match &change.change {
        UseChange::Inserted { line } => format!(
            "{} use {} (line {})",
            "+".green(),
            change.trait_name,
            line + 1
        ),
        UseChange::AlreadyPresent { line } => format!(
            "{} {} already used (line {})",
            "=".dimmed(),
            change.trait_name,
            line + 1
        ),
        UseChange::Removed { lines } => format!(
            "{} use {} ({} statement(s))",
            "-".red(),
            change.trait_name,
            lines.len()
        ),
        UseChange::Absent => format!("{} {} not used", "=".dimmed(), change.trait_name),
    }
}

/// Print a colored diff between old and new content
fn print_diff(old: &str, new: &str) {
    for diff_result in diff::lines(old, new) {
        match diff_result {
            diff::Result::Left(l) => {
                println!("  {}", format!("- {}", l).red());
            }
            diff::Result::Right(r) => {
                println!("  {}", format!("+ {}", r).green());
            }
            diff::Result::Both(_, _) => {}
        }
    }
}

/// Print unified diff format (standard diff -u compatible)
fn print_unified_diff(path: &Path, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(old, new);
    let path_str = path.display().to_string();
    let mut out = format!("--- a/{}\n+++ b/{}\n", path_str, path_str);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        out.push_str(&format!("{}\n", hunk.header()));
        for change in hunk.iter_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => "-",
                ChangeTag::Insert => "+",
                ChangeTag::Equal => " ",
            };
            out.push_str(&format!("{}{}", sign, change));
            if change.missing_newline() {
                out.push('\n');
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(changes: Vec<TraitChange>, old: &str, new: &str) -> EditOutcome {
        EditOutcome {
            target: "App\\Models\\User".to_string(),
            kind: TypeKind::Class,
            path: PathBuf::from("src/Models/User.php"),
            operation: Operation::Add,
            changes,
            old_source: old.to_string(),
            new_source: new.to_string(),
            written: false,
        }
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("Diff"), Some(OutputFormat::Diff));
        assert_eq!(OutputFormat::from_str("xml"), None);
    }

    #[test]
    fn test_file_result_from_outcome() {
        let result = FileResult::success(&outcome(
            vec![TraitChange {
                trait_name: "App\\Loggable".to_string(),
                change: UseChange::Inserted { line: 6 },
            }],
            "a\n",
            "b\n",
        ));
        assert!(result.has_changes());
        assert!(result.error.is_none());

        let error = FileResult::error("App\\Post", "class `App\\Post` not found".to_string());
        assert!(!error.has_changes());
        assert!(error.error.is_some());
    }

    #[test]
    fn test_reporter_counts_only_modifications() {
        let mut reporter = Reporter::new(OutputFormat::Json, false);
        reporter.report_check(&outcome(
            vec![
                TraitChange {
                    trait_name: "A".to_string(),
                    change: UseChange::Inserted { line: 2 },
                },
                TraitChange {
                    trait_name: "B".to_string(),
                    change: UseChange::AlreadyPresent { line: 3 },
                },
            ],
            "old\n",
            "new\n",
        ));
        reporter.report_check(&outcome(vec![], "same\n", "same\n"));
        reporter.report_error("Missing", "not found");

        let summary = reporter.summary();
        assert_eq!(summary.types_processed, 3);
        assert_eq!(summary.files_with_changes, 1);
        assert_eq!(summary.total_changes, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_json_serialization() {
        let output = JsonOutput {
            version: "0.1.0".to_string(),
            summary: Summary {
                types_processed: 1,
                files_with_changes: 1,
                total_changes: 1,
                errors: 0,
            },
            files: vec![FileResult::success(&outcome(
                vec![TraitChange {
                    trait_name: "App\\Loggable".to_string(),
                    change: UseChange::Inserted { line: 6 },
                }],
                "a\n",
                "b\n",
            ))],
            locations: vec![],
        };

        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"kind\":\"class\""));
        assert!(json.contains("\"operation\":\"add\""));
        assert!(json.contains("\"action\":\"inserted\""));
        assert!(!json.contains("locations"));
    }

    #[test]
    fn test_unified_diff() {
        let diff = unified_diff(
            Path::new("Foo.php"),
            "class Foo {\n    public $x;\n}\n",
            "class Foo {\n    use Bar;\n    public $x;\n}\n",
        );
        assert!(diff.starts_with("--- a/Foo.php\n+++ b/Foo.php\n@@"));
        assert!(diff.contains("+    use Bar;\n"));
        assert!(diff.contains(" class Foo {\n"));
    }
}
