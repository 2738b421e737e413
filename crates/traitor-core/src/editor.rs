//! Line editor: inserts and removes trait use statements inside a located body
//!
//! Both operations work on the body's top-level statements only, i.e.
//! statements that start exactly one brace level inside the body, wherever
//! they sit on a line. Every line that is not the target of an edit is copied
//! through unchanged, byte for byte.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::lexer::{self, LineInfo};
use crate::locate::{find_close_brace, TypeDeclaration};
use crate::names::{same_name, NameContext};
use crate::source::{indentation, strip_terminator, terminator};
use crate::whitespace::{IndentStyle, LineEnding};

/// Options for lines the editor has to write itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditorOptions {
    /// Indentation unit used when it cannot be inferred from the body
    pub indent: IndentStyle,
}

/// What a single insert or remove did to the file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UseChange {
    /// A statement was inserted at this line (0-based, in the new text)
    Inserted { line: usize },
    /// The trait is already used by the statement starting at this line
    AlreadyPresent { line: usize },
    /// Statements starting at these lines (0-based, in the old text) were removed or shortened
    Removed { lines: Vec<usize> },
    /// The trait was not used, nothing to remove
    Absent,
}

impl UseChange {
    pub fn is_modification(&self) -> bool {
        matches!(self, UseChange::Inserted { .. } | UseChange::Removed { .. })
    }
}

/// A trait use statement found among the body's top-level statements
#[derive(Debug, Clone)]
struct UseStatement {
    /// First and last line of the statement (inclusive)
    start: usize,
    end: usize,
    /// Column where the statement starts in `start`
    start_col: usize,
    /// Column just past the statement in `end`
    end_col: usize,
    /// Byte range of the comma separated names in `start` (single-line statements only)
    names_span: Option<(usize, usize)>,
    /// Names as written
    names: Vec<String>,
    /// Followed by an `{ insteadof / as }` block
    block: bool,
}

#[derive(Debug, Clone)]
enum Member {
    Use(UseStatement),
    Other,
}

fn use_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^use[\s\\]").unwrap())
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\\?[A-Za-z_\x80-\xff][\w\x80-\xff]*(?:\\[A-Za-z_\x80-\xff][\w\x80-\xff]*)*$").unwrap())
}

/// Insert `use <trait>;` into the body, after any use statements already leading it
pub fn insert_use<S: AsRef<str>>(
    lines: &[S],
    decl: &TypeDeclaration,
    trait_name: &str,
    options: &EditorOptions,
) -> (Vec<String>, UseChange) {
    let original: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
    let infos = lexer::scan(&original);
    let context = NameContext::collect(&infos, decl.header_line);
    let members = members(&infos, decl);

    let existing = members.iter().find_map(|member| match member {
        Member::Use(stmt) if names_trait(stmt, &context, trait_name) => Some(stmt.start),
        _ => None,
    });
    if let Some(line) = existing {
        return (original, UseChange::AlreadyPresent { line });
    }

    let spelled = context.spell(trait_name);

    // Right after the leading uses, or right after the opening brace
    let (anchor_line, anchor_col) = members
        .iter()
        .map_while(|member| match member {
            Member::Use(stmt) => Some((stmt.end, stmt.end_col)),
            Member::Other => None,
        })
        .last()
        .unwrap_or((decl.body_start, decl.open_column + 1));

    // Code follows on the same line (`class Foo {}`, `{ use A; }`): stay on that line
    if !infos[anchor_line].code[anchor_col..].trim().is_empty() {
        let line = &original[anchor_line];
        let rest = &line[anchor_col..];
        let gap = if rest.starts_with([' ', '\t']) { "" } else { " " };
        let joined = format!("{} use {};{}{}", &line[..anchor_col], spelled, gap, rest);
        let mut edited = original;
        edited[anchor_line] = joined;
        return (edited, UseChange::Inserted { line: anchor_line });
    }

    let indent = body_indentation(&original, &infos, &members, decl, options);
    let eol = match terminator(&original[anchor_line]) {
        "" => LineEnding::dominant(&original).as_str().to_string(),
        eol => eol.to_string(),
    };

    let mut edited = original;
    edited.insert(anchor_line + 1, format!("{}use {};{}", indent, spelled, eol));

    (edited, UseChange::Inserted { line: anchor_line + 1 })
}

/// Remove every top-level use of the trait from the body
pub fn remove_use<S: AsRef<str>>(
    lines: &[S],
    decl: &TypeDeclaration,
    trait_name: &str,
) -> (Vec<String>, UseChange) {
    let original: Vec<String> = lines.iter().map(|l| l.as_ref().to_string()).collect();
    let infos = lexer::scan(&original);
    let context = NameContext::collect(&infos, decl.header_line);

    let matching: Vec<UseStatement> = members(&infos, decl)
        .into_iter()
        .filter_map(|member| match member {
            // insteadof/as blocks are never rewritten
            Member::Use(stmt) if !stmt.block && names_trait(&stmt, &context, trait_name) => Some(stmt),
            _ => None,
        })
        .collect();

    if matching.is_empty() {
        return (original, UseChange::Absent);
    }

    let mut edited = original;
    let removed: Vec<usize> = matching.iter().map(|stmt| stmt.start).collect();

    // Bottom-up so earlier line indices stay valid
    for stmt in matching.iter().rev() {
        let kept: Vec<&str> = stmt
            .names
            .iter()
            .map(String::as_str)
            .filter(|name| !same_name(&context.resolve(name), trait_name))
            .collect();

        if let Some((names_from, names_to)) = stmt.names_span.filter(|_| !kept.is_empty()) {
            let line = &edited[stmt.start];
            edited[stmt.start] = format!("{}{}{}", &line[..names_from], kept.join(", "), &line[names_to..]);
            continue;
        }

        // Whatever shares the first and last line with the statement stays
        let alone = infos[stmt.start].code[..stmt.start_col].trim().is_empty()
            && infos[stmt.end].code[stmt.end_col..].trim().is_empty();
        let head = &edited[stmt.start][..stmt.start_col];
        let tail = &edited[stmt.end][stmt.end_col..];
        let joined = if kept.is_empty() {
            join_around(head, tail)
        } else {
            format!("{}use {};{}", head, kept.join(", "), tail)
        };

        if kept.is_empty() && (alone || strip_terminator(&joined).trim().is_empty()) {
            edited.drain(stmt.start..=stmt.end);
        } else {
            edited.splice(stmt.start..=stmt.end, [joined]);
        }
    }

    (edited, UseChange::Removed { lines: removed })
}

/// Fully qualified names of every trait the body uses at the top level, in order
pub fn used_traits<S: AsRef<str>>(lines: &[S], decl: &TypeDeclaration) -> Vec<String> {
    let infos = lexer::scan(lines);
    let context = NameContext::collect(&infos, decl.header_line);
    members(&infos, decl)
        .into_iter()
        .filter_map(|member| match member {
            Member::Use(stmt) => Some(stmt.names),
            Member::Other => None,
        })
        .flatten()
        .map(|name| context.resolve(&name))
        .collect()
}

fn names_trait(stmt: &UseStatement, context: &NameContext, trait_name: &str) -> bool {
    stmt.names
        .iter()
        .any(|name| same_name(&context.resolve(name), trait_name))
}

/// Top-level statements of the body, in order, from just past the opening
/// brace up to the closing one. Trivia is skipped.
///
/// Several statements may share a line; the scan resumes right after each
/// use statement, while any other statement ends the scan of its line.
fn members(infos: &[LineInfo], decl: &TypeDeclaration) -> Vec<Member> {
    let mut found = Vec::new();
    let inner = decl.inner_depth();

    let (mut line, mut column) = (decl.body_start, decl.open_column + 1);
    while line <= decl.body_end {
        let info = &infos[line];
        let limit = if line == decl.body_end { decl.close_column } else { info.code.len() };
        let rest = &info.code[column.min(limit)..limit];
        let start_col = column + (rest.len() - rest.trim_start().len());
        if rest.trim().is_empty() || lexer::depth_at(info, start_col) != inner {
            (line, column) = (line + 1, 0);
            continue;
        }

        match use_statement(infos, decl, line, start_col) {
            Some(stmt) => {
                (line, column) = (stmt.end, stmt.end_col);
                found.push(Member::Use(stmt));
            }
            None => {
                (line, column) = (line + 1, 0);
                found.push(Member::Other);
            }
        }
    }

    found
}

/// Parse a trait use statement starting at (`line`, `column`), if there is one
fn use_statement(infos: &[LineInfo], decl: &TypeDeclaration, line: usize, column: usize) -> Option<UseStatement> {
    let code = &infos[line].code;
    let rest = &code[column..];
    let start_col = column + (rest.len() - rest.trim_start().len());
    if !use_keyword_re().is_match(&code[start_col..]) {
        return None;
    }

    // Collect the names up to the first `;` or `{`
    let names_from = start_col + 3;
    let mut names_text = String::new();
    let mut terminator_at = None;
    for (index, info) in infos.iter().enumerate().take(decl.body_end + 1).skip(line) {
        let from = if index == line { names_from } else { 0 };
        let upto = if index == decl.body_end { decl.close_column.max(from) } else { info.code.len() };
        let segment = &info.code[from..upto];
        match segment.find([';', '{']) {
            Some(pos) => {
                names_text.push_str(&segment[..pos]);
                terminator_at = Some((index, from + pos));
                break;
            }
            None => {
                names_text.push_str(segment);
                names_text.push(' ');
            }
        }
    }
    let (mut end, term_col) = terminator_at?;

    let names: Vec<String> = names_text
        .split(',')
        .map(|name| name.trim().to_string())
        .collect();
    if names.is_empty() || names.iter().any(|name| !name_re().is_match(name)) {
        return None;
    }

    let block = infos[end].code[term_col..].starts_with('{');
    let mut end_col = term_col + 1;
    if block {
        let depth = lexer::depth_at(&infos[end], term_col);
        let (close_line, close_col) = find_close_brace(infos, end, term_col, depth)?;
        end = close_line;
        end_col = close_col + 1;
    }

    let names_span = (end == line && !block).then(|| {
        let raw = &code[names_from..term_col];
        let lead = raw.len() - raw.trim_start().len();
        let trail = raw.len() - raw.trim_end().len();
        (names_from + lead, term_col - trail)
    });

    Some(UseStatement {
        start: line,
        end,
        start_col,
        end_col,
        names_span,
        names,
        block,
    })
}

/// Indentation for a new statement: existing uses, then the first member, then brace + one unit
fn body_indentation(
    lines: &[String],
    infos: &[LineInfo],
    members: &[Member],
    decl: &TypeDeclaration,
    options: &EditorOptions,
) -> String {
    let first_use = members.iter().find_map(|member| match member {
        Member::Use(stmt) if stmt.start > decl.body_start => Some(stmt.start),
        _ => None,
    });
    if let Some(line) = first_use {
        return indentation(&lines[line]).to_string();
    }

    let first_member = (decl.body_start + 1..decl.body_end)
        .find(|&line| infos[line].depth == decl.inner_depth() && !strip_terminator(&lines[line]).trim().is_empty());
    if let Some(line) = first_member {
        return indentation(&lines[line]).to_string();
    }

    format!("{}{}", indentation(&lines[decl.body_start]), options.indent.unit())
}

/// Glue what was left and right of a removed statement back into one line
fn join_around(head: &str, tail: &str) -> String {
    let left = head.trim_end_matches([' ', '\t']);
    let right = tail.trim_start_matches([' ', '\t']);
    if left.is_empty() {
        return format!("{}{}", head, right);
    }
    let gap = if strip_terminator(right).is_empty() || (left.ends_with('{') && right.starts_with('}')) {
        ""
    } else {
        " "
    };
    format!("{}{}{}", left, gap, right)
}
