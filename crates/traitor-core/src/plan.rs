//! Trait use plans: accumulate traits, then edit the target's file once
//!
//! ```no_run
//! use traitor_core::{TraitUsePlan, TypeIndex};
//!
//! # fn main() -> traitor_core::Result<()> {
//! let resolver = TypeIndex::new();
//! let outcome = TraitUsePlan::add()
//!     .with_trait("App\\Traits\\Loggable")
//!     .with_trait("App\\Traits\\Cacheable")
//!     .to_class("App\\Models\\User", &resolver)?;
//! println!("changed: {}", outcome.is_changed());
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::editor::{insert_use, remove_use, EditorOptions, UseChange};
use crate::error::{Result, TraitorError};
use crate::locate::{locate, TypeKind};
use crate::logging;
use crate::names::normalize;
use crate::persist::{read_source, write_atomic};
use crate::resolver::TypeResolver;
use crate::source::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => write!(f, "add"),
            Operation::Remove => write!(f, "remove"),
        }
    }
}

/// What happened for one trait of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraitChange {
    #[serde(rename = "trait")]
    pub trait_name: String,
    #[serde(flatten)]
    pub change: UseChange,
}

/// Result of running a plan against one type
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub target: String,
    pub kind: TypeKind,
    pub path: PathBuf,
    pub operation: Operation,
    pub changes: Vec<TraitChange>,
    #[serde(skip)]
    pub old_source: String,
    #[serde(skip)]
    pub new_source: String,
    /// Whether the new text was written back
    pub written: bool,
}

impl EditOutcome {
    pub fn is_changed(&self) -> bool {
        self.old_source != self.new_source
    }
}

/// Fold the editor over `traits`, re-locating the body before every step.
///
/// Returns the final text and one change per trait, in order. Nothing is
/// returned on failure, so a multi-trait edit is all-or-nothing.
pub fn edit_source(
    source: &str,
    target: &str,
    kind: TypeKind,
    traits: &[String],
    operation: Operation,
    options: &EditorOptions,
) -> Result<(String, Vec<TraitChange>)> {
    let mut lines = SourceFile::parse(source).into_lines();
    let mut changes = Vec::with_capacity(traits.len());

    for trait_name in traits {
        let decl = locate(&lines, target, kind)?;
        logging::log_locate(target, &decl);

        let (edited, change) = match operation {
            Operation::Add => insert_use(&lines, &decl, trait_name, options),
            Operation::Remove => remove_use(&lines, &decl, trait_name),
        };
        logging::log_edit(trait_name, &change);

        lines = edited;
        changes.push(TraitChange {
            trait_name: trait_name.clone(),
            change,
        });
    }

    Ok((SourceFile::from_lines(lines).to_text(), changes))
}

/// Builder for adding traits to, or removing traits from, a class-like type
#[derive(Debug, Clone)]
pub struct TraitUsePlan {
    operation: Operation,
    traits: Vec<String>,
    options: EditorOptions,
}

impl TraitUsePlan {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            traits: Vec::new(),
            options: EditorOptions::default(),
        }
    }

    pub fn add() -> Self {
        Self::new(Operation::Add)
    }

    pub fn remove() -> Self {
        Self::new(Operation::Remove)
    }

    pub fn with_trait(mut self, name: impl Into<String>) -> Self {
        self.traits.push(name.into());
        self
    }

    pub fn with_traits<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.traits.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_options(mut self, options: EditorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn traits(&self) -> &[String] {
        &self.traits
    }

    /// Compute the outcome without touching the file
    pub fn preview<R: TypeResolver + ?Sized>(&self, target: &str, resolver: &R) -> Result<EditOutcome> {
        self.run(target, None, resolver, false)
    }

    /// Edit whatever kind of type `target` resolves to
    pub fn apply_to<R: TypeResolver + ?Sized>(&self, target: &str, resolver: &R) -> Result<EditOutcome> {
        self.run(target, None, resolver, true)
    }

    pub fn to_class<R: TypeResolver + ?Sized>(&self, target: &str, resolver: &R) -> Result<EditOutcome> {
        self.run(target, Some(TypeKind::Class), resolver, true)
    }

    pub fn to_interface<R: TypeResolver + ?Sized>(&self, target: &str, resolver: &R) -> Result<EditOutcome> {
        self.run(target, Some(TypeKind::Interface), resolver, true)
    }

    /// Resolve, edit and (if `write` is set and the text changed) persist
    pub fn run<R: TypeResolver + ?Sized>(
        &self,
        target: &str,
        expected: Option<TypeKind>,
        resolver: &R,
        write: bool,
    ) -> Result<EditOutcome> {
        if self.traits.is_empty() {
            return Err(TraitorError::NoTraitsSpecified);
        }

        logging::section(&format!(
            "{} {} {}",
            self.operation.to_string().to_uppercase(),
            self.traits.join(", "),
            target
        ));

        let resolved = resolver.resolve(target)?;
        logging::log_resolve(target, &resolved);
        if let Some(kind) = expected {
            if resolved.kind != kind {
                return Err(TraitorError::not_found(kind.keyword(), normalize(target)));
            }
        }

        let traits = self.trait_names(resolver)?;

        let old_source = read_source(&resolved.path)?;
        let (new_source, changes) = edit_source(
            &old_source,
            &resolved.name,
            resolved.kind,
            &traits,
            self.operation,
            &self.options,
        )?;

        let written = write && new_source != old_source;
        if written {
            write_atomic(&resolved.path, &new_source)?;
            logging::log_write(&resolved.path, new_source.len());
        }

        Ok(EditOutcome {
            target: resolved.name,
            kind: resolved.kind,
            path: resolved.path,
            operation: self.operation,
            changes,
            old_source,
            new_source,
            written,
        })
    }

    /// Canonical trait names.
    ///
    /// Adding requires every name to resolve to a declared trait. Removing
    /// falls back to the name as given, so a trait that no longer exists can
    /// still be removed.
    fn trait_names<R: TypeResolver + ?Sized>(&self, resolver: &R) -> Result<Vec<String>> {
        self.traits
            .iter()
            .map(|name| match (self.operation, resolver.resolve(name)) {
                (_, Ok(resolved)) if resolved.kind == TypeKind::Trait => {
                    logging::log_resolve(name, &resolved);
                    Ok(resolved.name)
                }
                (Operation::Add, Ok(_)) => Err(TraitorError::not_found("trait", normalize(name))),
                (Operation::Add, Err(e)) if e.is_not_found() => {
                    Err(TraitorError::not_found("trait", normalize(name)))
                }
                (Operation::Remove, Err(e)) if !e.is_not_found() => Err(e),
                (Operation::Remove, _) => Ok(normalize(name).to_string()),
                (Operation::Add, Err(e)) => Err(e),
            })
            .collect()
    }
}

/// Add `traits` to the type `target`, writing the file once
pub fn add_traits_to_type<I, S, R>(traits: I, target: &str, resolver: &R) -> Result<EditOutcome>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    R: TypeResolver + ?Sized,
{
    TraitUsePlan::add().with_traits(traits).apply_to(target, resolver)
}

/// Remove `traits` from the type `target`, writing the file once
pub fn remove_traits_from_type<I, S, R>(traits: I, target: &str, resolver: &R) -> Result<EditOutcome>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    R: TypeResolver + ?Sized,
{
    TraitUsePlan::remove().with_traits(traits).apply_to(target, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traits(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_fold_groups_traits() {
        let source = "<?php\nclass Foo {\n    public $x;\n}\n";
        let (text, changes) = edit_source(
            source,
            "Foo",
            TypeKind::Class,
            &traits(&["A", "B"]),
            Operation::Add,
            &EditorOptions::default(),
        )
        .unwrap();

        assert_eq!(text, "<?php\nclass Foo {\n    use A;\n    use B;\n    public $x;\n}\n");
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change, UseChange::Inserted { line: 2 });
        assert_eq!(changes[1].change, UseChange::Inserted { line: 3 });
    }

    #[test]
    fn test_fold_single_line_body_round_trip() {
        let source = "<?php\nclass Foo {}\n";
        let (added, changes) = edit_source(
            source,
            "Foo",
            TypeKind::Class,
            &traits(&["A", "B"]),
            Operation::Add,
            &EditorOptions::default(),
        )
        .unwrap();
        assert_eq!(added, "<?php\nclass Foo { use A; use B; }\n");
        assert_eq!(changes[1].change, UseChange::Inserted { line: 1 });

        let (removed, _) = edit_source(
            &added,
            "Foo",
            TypeKind::Class,
            &traits(&["B", "A"]),
            Operation::Remove,
            &EditorOptions::default(),
        )
        .unwrap();
        assert_eq!(removed, source);
    }

    #[test]
    fn test_fold_remove_mixed() {
        let source = "<?php\nclass Foo {\n    use A;\n    use B;\n}\n";
        let (text, changes) = edit_source(
            source,
            "Foo",
            TypeKind::Class,
            &traits(&["A", "C"]),
            Operation::Remove,
            &EditorOptions::default(),
        )
        .unwrap();

        assert_eq!(text, "<?php\nclass Foo {\n    use B;\n}\n");
        assert_eq!(changes[0].change, UseChange::Removed { lines: vec![2] });
        assert_eq!(changes[1].change, UseChange::Absent);
    }

    #[test]
    fn test_fold_missing_type() {
        let err = edit_source(
            "<?php\nclass Foo {}\n",
            "Bar",
            TypeKind::Class,
            &traits(&["A"]),
            Operation::Add,
            &EditorOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_trait_change_json_shape() {
        let change = TraitChange {
            trait_name: "App\\Loggable".to_string(),
            change: UseChange::Inserted { line: 4 },
        };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["trait"], "App\\Loggable");
        assert_eq!(json["action"], "inserted");
        assert_eq!(json["line"], 4);
    }

    #[test]
    fn test_empty_plan_fails_before_resolving() {
        let resolver = crate::resolver::TypeIndex::new();
        let err = TraitUsePlan::add().apply_to("Missing", &resolver).unwrap_err();
        assert!(matches!(err, TraitorError::NoTraitsSpecified));
    }
}
