//! Indentation and line ending styles used when a new line has to be written

use serde::{Deserialize, Serialize};

/// Indentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    /// Use spaces for indentation
    Spaces(usize),
    /// Use tabs for indentation
    Tabs,
}

impl Default for IndentStyle {
    fn default() -> Self {
        IndentStyle::Spaces(4)
    }
}

impl IndentStyle {
    /// Get the indentation string for one level
    pub fn unit(&self) -> String {
        match self {
            IndentStyle::Spaces(n) => " ".repeat(*n),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }

    /// Parse a config value such as `"    "`, `"\t"`, `"tab"` or `"2"`
    pub fn from_config(s: &str) -> Self {
        if s == "\t" || s == "\\t" || s.eq_ignore_ascii_case("tab") || s.eq_ignore_ascii_case("tabs") {
            return IndentStyle::Tabs;
        }
        if let Ok(n) = s.trim().parse::<usize>() {
            return IndentStyle::Spaces(if n > 0 { n } else { 4 });
        }
        let spaces = s.chars().filter(|c| *c == ' ').count();
        IndentStyle::Spaces(if spaces > 0 { spaces } else { 4 })
    }
}

/// Line ending style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// Unix-style line endings (LF)
    #[default]
    Lf,
    /// Windows-style line endings (CRLF)
    CrLf,
}

impl LineEnding {
    /// Get the line ending string
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }

    /// Terminator carried by a single line, if any
    pub fn of_line(line: &str) -> Option<LineEnding> {
        if line.ends_with("\r\n") {
            Some(LineEnding::CrLf)
        } else if line.ends_with('\n') {
            Some(LineEnding::Lf)
        } else {
            None
        }
    }

    /// Most common terminator among the lines, LF on a tie or when nothing is terminated
    pub fn dominant<S: AsRef<str>>(lines: &[S]) -> LineEnding {
        let (mut lf, mut crlf) = (0usize, 0usize);
        for line in lines {
            match LineEnding::of_line(line.as_ref()) {
                Some(LineEnding::CrLf) => crlf += 1,
                Some(LineEnding::Lf) => lf += 1,
                None => {}
            }
        }
        if crlf > lf {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}
