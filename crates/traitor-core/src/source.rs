//! In-memory representation of a source file as terminated lines

use std::fmt;

use crate::whitespace::LineEnding;

/// A source file split into lines, each line keeping its own terminator.
///
/// Joining the lines back together reproduces the original text exactly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceFile {
    lines: Vec<String>,
}

impl SourceFile {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split_inclusive('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_ending(&self) -> LineEnding {
        LineEnding::dominant(&self.lines)
    }

    pub fn to_text(&self) -> String {
        self.lines.concat()
    }
}

impl fmt::Display for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// Strip the line terminator, keeping everything else (including trailing spaces)
pub fn strip_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line)
}

/// The terminator of a line, empty for an unterminated last line
pub fn terminator(line: &str) -> &str {
    &line[strip_terminator(line).len()..]
}

/// Leading spaces and tabs of a line
pub fn indentation(line: &str) -> &str {
    let content = strip_terminator(line);
    let end = content
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(content.len());
    &content[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_preserves_bytes() {
        let text = "<?php\r\nclass Foo {\n    public $x;   \n}";
        let file = SourceFile::parse(text);
        assert_eq!(file.len(), 4);
        assert_eq!(file.lines()[0], "<?php\r\n");
        assert_eq!(file.lines()[3], "}");
        assert_eq!(file.to_text(), text);
        assert_eq!(file.to_string(), text);
    }

    #[test]
    fn test_empty_text() {
        let file = SourceFile::parse("");
        assert!(file.is_empty());
        assert_eq!(file.to_text(), "");
    }

    #[test]
    fn test_terminator_helpers() {
        assert_eq!(strip_terminator("abc\r\n"), "abc");
        assert_eq!(strip_terminator("abc \n"), "abc ");
        assert_eq!(terminator("abc\r\n"), "\r\n");
        assert_eq!(terminator("abc"), "");
    }

    #[test]
    fn test_indentation() {
        assert_eq!(indentation("    use Foo;\n"), "    ");
        assert_eq!(indentation("\t\tuse Foo;\n"), "\t\t");
        assert_eq!(indentation("use Foo;"), "");
        assert_eq!(indentation("   \n"), "   ");
    }
}
