//! Logical-line scanner.
//!
//! Splits source text into logical lines: physical lines joined across
//! open brackets, triple-quoted strings, and backslash continuations.
//! Each logical line keeps its exact bytes, terminators included, so the
//! parser above never has to reconstruct text.

use super::ParseError;

/// One logical line of source.
#[derive(Debug, Clone)]
pub struct LogicalLine {
    /// Verbatim text, including terminator(s). The final line of a file
    /// may lack one.
    pub text: String,
    /// Leading whitespace of the first physical line.
    pub indent: String,
}

impl LogicalLine {
    /// The code part: text without leading whitespace or terminator.
    pub fn code(&self) -> &str {
        self.text.trim_start().trim_end_matches(['\n', '\r'])
    }

    pub fn is_blank_or_comment(&self) -> bool {
        let code = self.code();
        code.is_empty() || code.starts_with('#')
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct StringState {
    delim: char,
    triple: bool,
}

/// Scan source text into logical lines.
pub fn scan(source: &str) -> Result<Vec<LogicalLine>, ParseError> {
    let mut lines = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut line_no = 1;

    while i < chars.len() {
        let start = i;
        let start_line = line_no;
        let mut depth: u32 = 0;
        let mut string: Option<StringState> = None;
        let mut ended = false;

        while i < chars.len() {
            let c = chars[i];
            if let Some(state) = string {
                match c {
                    '\\' => {
                        // Escapes the next character, newlines included.
                        i += 1;
                        if i < chars.len() {
                            if chars[i] == '\n' {
                                line_no += 1;
                            }
                            i += 1;
                        }
                        continue;
                    }
                    '\n' if !state.triple => {
                        // Unterminated single-quoted string; recover at
                        // the end of the physical line.
                        string = None;
                        line_no += 1;
                        i += 1;
                        if depth == 0 {
                            ended = true;
                            break;
                        }
                        continue;
                    }
                    '\n' => {
                        line_no += 1;
                        i += 1;
                        continue;
                    }
                    c if c == state.delim => {
                        if state.triple {
                            if i + 2 < chars.len()
                                && chars[i + 1] == state.delim
                                && chars[i + 2] == state.delim
                            {
                                string = None;
                                i += 3;
                                continue;
                            }
                            // Lone quote inside a triple string.
                            i += 1;
                            continue;
                        }
                        string = None;
                        i += 1;
                        continue;
                    }
                    _ => {
                        i += 1;
                        continue;
                    }
                }
            }

            match c {
                '#' => {
                    // Comment runs to the end of the physical line.
                    while i < chars.len() && chars[i] != '\n' {
                        i += 1;
                    }
                    continue;
                }
                '\'' | '"' => {
                    let triple =
                        i + 2 < chars.len() && chars[i + 1] == c && chars[i + 2] == c;
                    string = Some(StringState { delim: c, triple });
                    i += if triple { 3 } else { 1 };
                    continue;
                }
                '(' | '[' | '{' => {
                    depth += 1;
                    i += 1;
                    continue;
                }
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    i += 1;
                    continue;
                }
                '\\' => {
                    // Explicit line continuation.
                    if i + 1 < chars.len() && chars[i + 1] == '\n' {
                        line_no += 1;
                        i += 2;
                        continue;
                    }
                    if i + 2 < chars.len() && chars[i + 1] == '\r' && chars[i + 2] == '\n' {
                        line_no += 1;
                        i += 3;
                        continue;
                    }
                    i += 1;
                    continue;
                }
                '\n' => {
                    line_no += 1;
                    i += 1;
                    if depth == 0 {
                        ended = true;
                        break;
                    }
                    continue;
                }
                _ => {
                    i += 1;
                    continue;
                }
            }
        }

        if !ended {
            // End of input reached mid-line.
            if let Some(state) = string {
                if state.triple {
                    return Err(ParseError::UnterminatedString { line: start_line });
                }
            }
            if depth > 0 {
                return Err(ParseError::UnterminatedBracket { line: start_line });
            }
        }

        let text: String = chars[start..i].iter().collect();
        let indent: String = text
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        lines.push(LogicalLine { text, indent });
    }

    Ok(lines)
}

/// Detect the dominant line terminator of a file.
pub fn detect_newline(source: &str) -> String {
    match source.find('\n') {
        Some(pos) if pos > 0 && source.as_bytes()[pos - 1] == b'\r' => "\r\n".to_string(),
        Some(_) => "\n".to_string(),
        None => "\n".to_string(),
    }
}
