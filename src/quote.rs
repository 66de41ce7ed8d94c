//! Docstring formatting.
//!
//! `normalize` flattens the leading-indentation noise runtime docstrings
//! carry; `quote` wraps the result in a triple-quoted literal that is
//! safe to splice into a stub regardless of what the text contains.

/// Expand tabs to the next multiple of 8 columns, resetting at line
/// boundaries.
fn expand_tabs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut col = 0usize;
    for c in text.chars() {
        match c {
            '\t' => {
                let fill = 8 - col % 8;
                out.extend(std::iter::repeat(' ').take(fill));
                col += fill;
            }
            '\n' | '\r' => {
                out.push(c);
                col = 0;
            }
            _ => {
                out.push(c);
                col += 1;
            }
        }
    }
    out
}

fn leading_spaces(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ').count()
}

/// Normalize a docstring: strip the first line's leading spaces, remove
/// the common margin from the remaining lines, and drop surrounding
/// blank lines.
pub fn normalize(doc: &str) -> String {
    let expanded = expand_tabs(doc);
    let mut lines: Vec<String> = expanded.split('\n').map(|l| l.to_string()).collect();

    let mut margin = usize::MAX;
    for line in lines.iter().skip(1) {
        let content = line.trim_start_matches(' ');
        if !content.is_empty() {
            margin = margin.min(line.len() - content.len());
        }
    }

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start_matches(' ').to_string();
    }
    if margin != usize::MAX {
        for line in lines.iter_mut().skip(1) {
            let cut = margin.min(leading_spaces(line)).min(line.len());
            *line = line[cut..].to_string();
        }
    }

    while lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }
    while lines.first().map(|l| l.is_empty()).unwrap_or(false) {
        lines.remove(0);
    }

    lines.join("\n")
}

/// Add a prefix to every line that carries non-whitespace content.
fn indent_lines(text: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    loop {
        let (line, remainder) = match rest.find('\n') {
            Some(pos) => (&rest[..=pos], &rest[pos + 1..]),
            None => (rest, ""),
        };
        if !line.trim().is_empty() {
            out.push_str(prefix);
        }
        out.push_str(line);
        if remainder.is_empty() {
            break;
        }
        rest = remainder;
    }
    out
}

/// Quote a docstring as a triple-quoted literal.
///
/// `indent` is the absolute indentation of the statement the literal
/// will live in; it only matters for multi-line text.
pub fn quote(doc: &str, indent: &str) -> String {
    // Control characters cannot survive a plain literal; fall back to a
    // debug-escaped representation. Newlines are fine, they become real
    // line breaks inside the triple quotes.
    let has_unprintable = doc.chars().any(|c| c != '\n' && c.is_control());
    if has_unprintable {
        return format!("{:?}", doc);
    }

    // Escape sequences in the text must not be reinterpreted; switch to
    // a raw literal when any backslash is present.
    let raw = doc.contains('\\');

    let mut doc = doc.to_string();
    if doc.contains('\n') {
        doc = indent_lines(&doc, indent);
        doc = format!("\n{}\n{}", doc, indent);
    } else if doc.ends_with('"') {
        if raw {
            // A raw literal cannot end in its own quote character.
            doc.push(' ');
        } else {
            doc.truncate(doc.len() - 1);
            doc.push_str("\\\"");
        }
    }

    // Neutralize any embedded triple quote so it cannot terminate the
    // literal early.
    if raw {
        doc = doc.replace("\"\"\"", "'''");
    } else {
        doc = doc.replace("\"\"\"", "\\\"\\\"\\\"");
    }

    format!("{}\"\"\"{}\"\"\"", if raw { "r" } else { "" }, doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_plain() {
        assert_eq!(quote("Do a thing.", ""), "\"\"\"Do a thing.\"\"\"");
        // Interior quotes need no treatment.
        assert_eq!(
            quote("He said \"hi\" twice", ""),
            "\"\"\"He said \"hi\" twice\"\"\""
        );
    }

    #[test]
    fn test_quote_trailing_quote() {
        // Normal mode escapes the trailing quote.
        assert_eq!(quote("He said \"hi\"", ""), "\"\"\"He said \"hi\\\"\"\"\"");
        // Raw mode appends a separating space instead.
        assert_eq!(quote("raw \\n \"hi\"", ""), "r\"\"\"raw \\n \"hi\" \"\"\"");
    }

    #[test]
    fn test_quote_multiline_reindents() {
        let doc = "First line.\n\nDetails\\here.";
        let got = quote(doc, "    ");
        assert_eq!(
            got,
            "r\"\"\"\n    First line.\n\n    Details\\here.\n    \"\"\""
        );
    }

    #[test]
    fn test_quote_embedded_triple_quote() {
        assert_eq!(
            quote("has \"\"\" inside", ""),
            "\"\"\"has \\\"\\\"\\\" inside\"\"\""
        );
        assert_eq!(
            quote("raw \\ \"\"\" inside", ""),
            "r\"\"\"raw \\ ''' inside\"\"\""
        );
    }

    #[test]
    fn test_quote_control_character_fallback() {
        let got = quote("bell \u{7} here", "");
        assert_eq!(got, "\"bell \\u{7} here\"");
        // Newlines alone do not trigger the fallback.
        assert!(quote("a\nb", "").starts_with("\"\"\""));
    }

    #[test]
    fn test_normalize_strips_margin() {
        assert_eq!(
            normalize("First.\n        Second.\n        Third."),
            "First.\nSecond.\nThird."
        );
        assert_eq!(normalize("  leading"), "leading");
        assert_eq!(normalize("\n\n  body\n\n"), "body");
    }

    #[test]
    fn test_normalize_keeps_relative_indent() {
        assert_eq!(
            normalize("Usage:\n    run()\n        nested()"),
            "Usage:\nrun()\n    nested()"
        );
    }

    #[test]
    fn test_normalize_expands_tabs() {
        assert_eq!(normalize("a\n\tb"), "a\n        b");
    }
}
