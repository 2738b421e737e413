//! Line lexer: blanks out comments and string contents and tracks brace depth
//!
//! The lexer is deliberately shallow. It knows just enough PHP to tell code from
//! literals and comments so that braces and keywords inside them are ignored:
//!
//! - single, double and backtick quoted strings (with backslash escapes)
//! - `//`, `#` and `/* */` comments (`#[` starts an attribute, not a comment)
//! - heredoc and nowdoc bodies
//! - inline HTML after `?>` until the next `<?`
//!
//! Every masked line has exactly the byte length of the original line, so a
//! byte offset found in the masked text is valid in the original.

/// Lexical information about one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    /// Brace depth before the first character of the line
    pub depth: usize,
    /// The line with comment and literal contents replaced by spaces
    pub code: String,
}

impl LineInfo {
    /// Whether the line carries no code at all (blank, comment or literal only)
    pub fn is_trivia(&self) -> bool {
        self.code.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    LineComment,
    BlockComment,
    Heredoc(String),
    Html,
}

/// Scan lines top to bottom, producing one `LineInfo` per line
pub fn scan<S: AsRef<str>>(lines: &[S]) -> Vec<LineInfo> {
    let mut infos = Vec::with_capacity(lines.len());
    let mut state = State::Code;
    let mut depth = 0usize;

    for line in lines {
        let line = line.as_ref();
        let start_depth = depth;
        let mut code = String::with_capacity(line.len());

        if let State::Heredoc(label) = &state {
            if closes_heredoc(line, label) {
                state = State::Code;
            } else {
                blank_into(&mut code, line);
                infos.push(LineInfo {
                    depth: start_depth,
                    code,
                });
                continue;
            }
        }

        let mut i = 0;
        while i < line.len() {
            let rest = &line[i..];
            let Some(c) = rest.chars().next() else {
                break;
            };
            let width = c.len_utf8();

            match &state {
                State::Code => {
                    if c == '\'' || c == '"' || c == '`' {
                        state = State::Quoted(c);
                        code.push(c);
                    } else if rest.starts_with("//") || (c == '#' && !rest.starts_with("#[")) {
                        state = State::LineComment;
                        blank_char(&mut code, c);
                    } else if rest.starts_with("/*") {
                        state = State::BlockComment;
                        code.push_str("  ");
                        i += 2;
                        continue;
                    } else if rest.starts_with("?>") {
                        state = State::Html;
                        code.push_str("?>");
                        i += 2;
                        continue;
                    } else if let Some(label) = heredoc_label(rest) {
                        // Nothing after the opener on this line can hold code we care about
                        code.push_str(rest);
                        state = State::Heredoc(label);
                        break;
                    } else {
                        match c {
                            '{' => depth += 1,
                            '}' => depth = depth.saturating_sub(1),
                            _ => {}
                        }
                        code.push(c);
                    }
                }
                State::Quoted(quote) => {
                    let quote = *quote;
                    if c == '\\' {
                        blank_char(&mut code, c);
                        if let Some(next) = rest[width..].chars().next() {
                            blank_char(&mut code, next);
                            i += width + next.len_utf8();
                            continue;
                        }
                    } else if c == quote {
                        state = State::Code;
                        code.push(c);
                    } else {
                        blank_char(&mut code, c);
                    }
                }
                State::LineComment => {
                    if c == '\n' || c == '\r' {
                        state = State::Code;
                        code.push(c);
                    } else if rest.starts_with("?>") {
                        state = State::Html;
                        code.push_str("?>");
                        i += 2;
                        continue;
                    } else {
                        blank_char(&mut code, c);
                    }
                }
                State::BlockComment => {
                    if rest.starts_with("*/") {
                        state = State::Code;
                        code.push_str("  ");
                        i += 2;
                        continue;
                    }
                    blank_char(&mut code, c);
                }
                State::Heredoc(_) => blank_char(&mut code, c),
                State::Html => {
                    if rest.starts_with("<?") {
                        state = State::Code;
                        code.push_str("<?");
                        i += 2;
                        continue;
                    }
                    blank_char(&mut code, c);
                }
            }
            i += width;
        }

        // A line comment never survives an unterminated final line
        if state == State::LineComment {
            state = State::Code;
        }

        infos.push(LineInfo {
            depth: start_depth,
            code,
        });
    }

    infos
}

/// Brace depth just before byte `column` of a scanned line
pub fn depth_at(info: &LineInfo, column: usize) -> usize {
    let mut depth = info.depth;
    for c in info.code[..column.min(info.code.len())].chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth
}

fn blank_char(code: &mut String, c: char) {
    if c == '\n' || c == '\r' {
        code.push(c);
    } else {
        code.extend(std::iter::repeat(' ').take(c.len_utf8()));
    }
}

fn blank_into(code: &mut String, line: &str) {
    for c in line.chars() {
        blank_char(code, c);
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Label of a heredoc/nowdoc opener (`<<<EOT`, `<<<"EOT"`, `<<<'EOT'`)
fn heredoc_label(rest: &str) -> Option<String> {
    let after = rest.strip_prefix("<<<")?;
    let after = after.trim_start_matches([' ', '\t']);
    let after = after
        .strip_prefix('\'')
        .or_else(|| after.strip_prefix('"'))
        .unwrap_or(after);
    let label: String = after.chars().take_while(|c| is_ident_char(*c)).collect();
    let starts_ok = label
        .chars()
        .next()
        .is_some_and(|c| !c.is_ascii_digit());
    starts_ok.then_some(label)
}

fn closes_heredoc(line: &str, label: &str) -> bool {
    let trimmed = line.trim_start_matches([' ', '\t']);
    match trimmed.strip_prefix(label) {
        Some(after) => !after.chars().next().is_some_and(is_ident_char),
        None => false,
    }
}
