//! Locating class, interface and trait bodies inside a file

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraitorError};
use crate::lexer::{self, LineInfo};
use crate::names::{self, NameContext};

/// Kind of class-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Trait,
}

impl TypeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Interface => "interface",
            TypeKind::Trait => "trait",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "class" => Some(TypeKind::Class),
            "interface" => Some(TypeKind::Interface),
            "trait" => Some(TypeKind::Trait),
            _ => None,
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for TypeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        TypeKind::from_keyword(s.trim())
            .ok_or_else(|| format!("Invalid type kind '{}'. Valid options: class, interface, trait", s))
    }
}

/// A located type and the line range of its body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeDeclaration {
    pub kind: TypeKind,
    /// Simple name as written in the header
    pub name: String,
    /// Line holding the `class Foo` header (0-based)
    pub header_line: usize,
    /// Line holding the opening brace (0-based)
    pub body_start: usize,
    /// Line holding the matching closing brace (0-based)
    pub body_end: usize,
    /// Byte offset of the opening brace in `body_start`
    pub open_column: usize,
    /// Byte offset of the closing brace in `body_end`
    pub close_column: usize,
    /// Brace depth outside the body
    pub depth: usize,
}

impl TypeDeclaration {
    /// Depth at which the body's own statements start
    pub fn inner_depth(&self) -> usize {
        self.depth + 1
    }

    /// Whether the opening and closing braces share a line
    pub fn is_single_line(&self) -> bool {
        self.body_start == self.body_end
    }
}

/// A type declared in a file, with its fully qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub name: String,
    pub kind: TypeKind,
    pub line: usize,
}

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(class|interface|trait)\s+([A-Za-z_\x80-\xff][\w\x80-\xff]*)").unwrap()
    })
}

struct Header {
    kind: TypeKind,
    name: String,
    line: usize,
    end: usize,
}

/// Every named class-like header in the scanned lines, top to bottom
fn headers(infos: &[LineInfo]) -> Vec<Header> {
    let mut found = Vec::new();
    for (line, info) in infos.iter().enumerate() {
        for caps in header_re().captures_iter(&info.code) {
            let (Some(whole), Some(keyword), Some(name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            let before = info.code[..whole.start()].trim_end();
            // `Foo::class`, `$obj->class`, `new class extends Bar`
            if before.ends_with("::") || before.ends_with("->") || before.ends_with('$') {
                continue;
            }
            let preceding_word = before
                .rsplit(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .next()
                .unwrap_or("");
            if preceding_word.eq_ignore_ascii_case("new") {
                continue;
            }
            if ["extends", "implements"]
                .iter()
                .any(|kw| name.as_str().eq_ignore_ascii_case(kw))
            {
                continue;
            }
            let Some(kind) = TypeKind::from_keyword(keyword.as_str()) else {
                continue;
            };
            found.push(Header {
                kind,
                name: name.as_str().to_string(),
                line,
                end: name.end(),
            });
        }
    }
    found
}

/// Locate the body of `type_name` (compared by simple name) declared with `kind`
pub fn locate<S: AsRef<str>>(lines: &[S], type_name: &str, kind: TypeKind) -> Result<TypeDeclaration> {
    let infos = lexer::scan(lines);
    locate_scanned(&infos, type_name, kind)
}

/// Same as [`locate`], reusing an existing lexer pass
pub fn locate_scanned(infos: &[LineInfo], type_name: &str, kind: TypeKind) -> Result<TypeDeclaration> {
    let wanted = names::simple_name(type_name);

    for header in headers(infos) {
        if header.kind != kind || !header.name.eq_ignore_ascii_case(wanted) {
            continue;
        }
        let Some((body_start, open_column)) = find_open_brace(infos, header.line, header.end) else {
            continue;
        };
        let depth = lexer::depth_at(&infos[body_start], open_column);
        let (body_end, close_column) = find_close_brace(infos, body_start, open_column, depth)
            .ok_or_else(|| TraitorError::UnclosedBody {
                name: header.name.clone(),
                line: body_start + 1,
            })?;

        return Ok(TypeDeclaration {
            kind,
            name: header.name,
            header_line: header.line,
            body_start,
            body_end,
            open_column,
            close_column,
            depth,
        });
    }

    Err(TraitorError::not_found(kind.keyword(), type_name))
}

/// Every class, interface and trait declared in the file, with fully qualified names
pub fn declared_types<S: AsRef<str>>(lines: &[S]) -> Vec<DeclaredType> {
    let infos = lexer::scan(lines);
    headers(&infos)
        .into_iter()
        .filter(|header| find_open_brace(&infos, header.line, header.end).is_some())
        .map(|header| {
            let context = NameContext::collect(&infos, header.line);
            let name = match context.namespace() {
                Some(ns) => format!("{}\\{}", ns, header.name),
                None => header.name.clone(),
            };
            DeclaredType {
                name,
                kind: header.kind,
                line: header.line,
            }
        })
        .collect()
}

/// First `{` after the header, unless a `;` ends the statement first
fn find_open_brace(infos: &[LineInfo], line: usize, column: usize) -> Option<(usize, usize)> {
    for (index, info) in infos.iter().enumerate().skip(line) {
        let start = if index == line { column } else { 0 };
        for (offset, c) in info.code[start..].char_indices() {
            match c {
                '{' => return Some((index, start + offset)),
                ';' => return None,
                _ => {}
            }
        }
    }
    None
}

/// The brace closing the one opened at (`line`, `column`), which sits at `depth`
pub(crate) fn find_close_brace(infos: &[LineInfo], line: usize, column: usize, depth: usize) -> Option<(usize, usize)> {
    let mut current = depth + 1;
    for (index, info) in infos.iter().enumerate().skip(line) {
        let start = if index == line { column + 1 } else { 0 };
        for (offset, c) in info.code[start..].char_indices() {
            match c {
                '{' => current += 1,
                '}' => {
                    current -= 1;
                    if current == depth {
                        return Some((index, start + offset));
                    }
                }
                _ => {}
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split_inclusive('\n').collect()
    }

    #[test]
    fn test_locate_simple_class() {
        let src = "class Foo {\n    public $x;\n}\n";
        let decl = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        assert_eq!(decl.header_line, 0);
        assert_eq!(decl.body_start, 0);
        assert_eq!(decl.body_end, 2);
        assert_eq!(decl.open_column, 10);
        assert_eq!(decl.close_column, 0);
        assert_eq!(decl.depth, 0);
        assert!(!decl.is_single_line());
    }

    #[test]
    fn test_locate_psr12_brace_on_next_line() {
        let src = "<?php\n\nnamespace App;\n\nfinal class User extends Model implements Arrayable\n{\n    public function a()\n    {\n    }\n}\n";
        let decl = locate(&lines(src), "App\\User", TypeKind::Class).unwrap();
        assert_eq!(decl.header_line, 4);
        assert_eq!(decl.body_start, 5);
        assert_eq!(decl.body_end, 9);
        assert_eq!(decl.inner_depth(), 1);
    }

    #[test]
    fn test_locate_interface_vs_class() {
        let src = "<?php\nclass Foo {\n}\ninterface Foo {\n}\n";
        let class = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        let interface = locate(&lines(src), "Foo", TypeKind::Interface).unwrap();
        assert_eq!(class.body_start, 1);
        assert_eq!(interface.body_start, 3);
        assert_eq!(interface.kind, TypeKind::Interface);
    }

    #[test]
    fn test_locate_case_insensitive() {
        let src = "<?php\nABSTRACT CLASS foo {\n}\n";
        let decl = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        assert_eq!(decl.name, "foo");
    }

    #[test]
    fn test_not_found() {
        let src = "<?php\nclass Foo {\n}\n";
        let err = locate(&lines(src), "Bar", TypeKind::Class).unwrap_err();
        assert!(matches!(err, TraitorError::NotFound { .. }));
        let err = locate(&lines(src), "Foo", TypeKind::Interface).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unclosed_body() {
        let src = "<?php\nclass Foo {\n    public function a() {\n}\n";
        let err = locate(&lines(src), "Foo", TypeKind::Class).unwrap_err();
        assert!(matches!(err, TraitorError::UnclosedBody { line: 2, .. }));
    }

    #[test]
    fn test_braces_in_strings_and_comments() {
        let src = "<?php\nclass Foo {\n    // }\n    public $a = '}';\n    /* { */\n}\nclass Bar {}\n";
        let decl = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        assert_eq!(decl.body_end, 5);
    }

    #[test]
    fn test_ignores_header_in_comment_and_class_constant() {
        let src = "<?php\n// class Foo { }\n$x = Foo::class;\n$y = new class extends Foo {};\nclass Foo\n{\n}\n";
        let decl = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        assert_eq!(decl.header_line, 4);
        assert_eq!(decl.body_start, 5);
    }

    #[test]
    fn test_single_line_body() {
        let src = "<?php\nclass Foo {}\n";
        let decl = locate(&lines(src), "Foo", TypeKind::Class).unwrap();
        assert!(decl.is_single_line());
        assert_eq!(decl.open_column, 10);
        assert_eq!(decl.close_column, 11);
    }

    #[test]
    fn test_declared_types() {
        let src = "<?php\nnamespace App\\Traits;\n\ntrait Loggable\n{\n}\n\ninterface HasLogs {}\n";
        let types = declared_types(&lines(src));
        assert_eq!(
            types,
            vec![
                DeclaredType {
                    name: "App\\Traits\\Loggable".to_string(),
                    kind: TypeKind::Trait,
                    line: 3,
                },
                DeclaredType {
                    name: "App\\Traits\\HasLogs".to_string(),
                    kind: TypeKind::Interface,
                    line: 7,
                },
            ]
        );
    }

    #[test]
    fn test_type_kind_parse() {
        assert_eq!("class".parse::<TypeKind>(), Ok(TypeKind::Class));
        assert_eq!("Interface".parse::<TypeKind>(), Ok(TypeKind::Interface));
        assert_eq!("trait".parse::<TypeKind>(), Ok(TypeKind::Trait));
        assert!("enum".parse::<TypeKind>().is_err());
        assert_eq!(TypeKind::Interface.to_string(), "interface");
    }
}
