//! traitor-core: Trait use insertion and removal for PHP source files
//!
//! This crate provides:
//! - `locate()`: Find the body of a class, interface or trait by brace matching
//! - `insert_use()` / `remove_use()`: Line edits on a located body
//! - `TraitUsePlan`: Builder that folds the editor over several traits and writes once
//! - `TypeResolver`: Capability to find a type's declaring file, with
//!   in-memory, directory scan, PSR-4 and chained implementations
//! - `write_atomic()`: Whole-file replacement through a temporary file

pub mod editor;
mod error;
pub mod lexer;
pub mod locate;
pub mod logging;
pub mod names;
pub mod persist;
pub mod plan;
pub mod resolver;
pub mod source;
pub mod whitespace;

pub use editor::{insert_use, remove_use, used_traits, EditorOptions, UseChange};
pub use error::{Result, TraitorError};
pub use locate::{declared_types, locate, DeclaredType, TypeDeclaration, TypeKind};
pub use names::NameContext;
pub use persist::{read_source, write_atomic};
pub use plan::{
    add_traits_to_type, edit_source, remove_traits_from_type, EditOutcome, Operation, TraitChange,
    TraitUsePlan,
};
pub use resolver::{
    ChainResolver, ComposerJson, ExcludeFilter, Psr4Resolver, ResolvedType, ScanResolver,
    TypeIndex, TypeResolver,
};
pub use source::SourceFile;
pub use whitespace::{IndentStyle, LineEnding};
