//! Parser for stub source files.
//!
//! Builds the arena tree out of logical lines. Only the statements the
//! enrichment passes care about get structure (`def`/`class` and `if`
//! chains); everything else is kept as verbatim raw lines. Heads,
//! suites, and interstitial blank/comment lines all keep their exact
//! bytes.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::ast::{
    Block, DefKind, DefNode, ElseBranch, IfBranch, IfNode, Node, NodeId, RawLine, Suite, Tree,
};
use super::cond::parse_condition;
use super::lines::{detect_newline, scan, LogicalLine};

/// Errors raised for stub text the scanner cannot make sense of.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unterminated string literal starting on line {line}")]
    UnterminatedString { line: usize },
    #[error("unclosed bracket starting on line {line}")]
    UnterminatedBracket { line: usize },
}

lazy_static! {
    static ref DEF_RE: Regex =
        Regex::new(r"^(?:async\s+)?def\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref CLASS_RE: Regex = Regex::new(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap();
    static ref IF_RE: Regex = Regex::new(r"^if\b").unwrap();
    static ref ELIF_RE: Regex = Regex::new(r"^elif\b").unwrap();
    static ref ELSE_RE: Regex = Regex::new(r"^else\s*(:|$)").unwrap();
}

/// Parse stub source text into a tree.
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    let lines = scan(source)?;
    let mut parser = StubParser {
        lines,
        pos: 0,
        tree: Tree::new(detect_newline(source)),
    };

    while let Some(line) = parser.lines.get(parser.pos) {
        if line.is_blank_or_comment() {
            parser.tree.header.push(line.text.clone());
            parser.pos += 1;
        } else {
            break;
        }
    }

    let body = parser.parse_statements("");
    parser.tree.body = body;

    if let Some(unit) = detect_default_indent(&parser.tree) {
        parser.tree.default_indent = unit;
    }

    Ok(parser.tree)
}

/// Find the first block's indent step to use as the file's indent unit.
fn detect_default_indent(tree: &Tree) -> Option<String> {
    for id in tree.preorder() {
        let (outer, suite) = match tree.node(id) {
            Node::Def(def) => (&def.indent, &def.suite),
            Node::If(chain) => match chain.branches.first() {
                Some(branch) => (&chain.indent, &branch.suite),
                None => continue,
            },
            Node::Raw(_) => continue,
        };
        if let Suite::Block(block) = suite {
            if let Some(step) = block.indent.strip_prefix(outer.as_str()) {
                if !step.is_empty() {
                    return Some(step.to_string());
                }
            }
        }
    }
    None
}

/// Byte offset of the suite colon: the first `:` outside strings,
/// brackets, and comments.
fn suite_colon(text: &str) -> Option<usize> {
    let mut string: Option<(char, bool)> = None;
    let mut depth: u32 = 0;
    let mut iter = text.char_indices().peekable();
    while let Some((idx, c)) = iter.next() {
        if let Some((delim, triple)) = string {
            match c {
                '\\' => {
                    iter.next();
                }
                c if c == delim => {
                    if triple {
                        let bytes = text.as_bytes();
                        if bytes.get(idx + 1) == Some(&(delim as u8))
                            && bytes.get(idx + 2) == Some(&(delim as u8))
                        {
                            string = None;
                            iter.next();
                            iter.next();
                        }
                    } else {
                        string = None;
                    }
                }
                _ => {}
            }
            continue;
        }
        match c {
            '#' => {
                // Comments run to the end of the physical line; the
                // suite colon cannot hide inside one.
                for (_, n) in iter.by_ref() {
                    if n == '\n' {
                        break;
                    }
                }
            }
            '\'' | '"' => {
                let bytes = text.as_bytes();
                let triple =
                    bytes.get(idx + 1) == Some(&(c as u8)) && bytes.get(idx + 2) == Some(&(c as u8));
                if triple {
                    iter.next();
                    iter.next();
                }
                string = Some((c, triple));
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ':' if depth == 0 => return Some(idx),
            _ => {}
        }
    }
    None
}

/// How the text after a suite colon should be treated.
enum HeadSplit {
    /// Head runs through the colon; the rest of the line is the suite.
    Inline { head: String, rest: String },
    /// Whole line is the head; an indented block (or nothing) follows.
    BlockExpected,
    /// No suite colon at all.
    Malformed,
}

fn split_head(text: &str) -> HeadSplit {
    let Some(colon) = suite_colon(text) else {
        return HeadSplit::Malformed;
    };
    let rest = &text[colon + 1..];
    let rest_code = rest.trim_end_matches(['\n', '\r']).trim();
    if rest_code.is_empty() || rest_code.starts_with('#') {
        HeadSplit::BlockExpected
    } else {
        HeadSplit::Inline {
            head: text[..colon + 1].to_string(),
            rest: rest.to_string(),
        }
    }
}

struct StubParser {
    lines: Vec<LogicalLine>,
    pos: usize,
    tree: Tree,
}

impl StubParser {
    /// Parse statements belonging to the block with the given indent.
    ///
    /// A line belongs to the block when its indent extends the block's
    /// indent. Blank/comment runs are held back until the next content
    /// line decides whether they sit inside the block or after it; at
    /// end of input they fall through to the module level.
    fn parse_statements(&mut self, block_indent: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        loop {
            let run_start = self.pos;
            while self
                .lines
                .get(self.pos)
                .map(|l| l.is_blank_or_comment())
                .unwrap_or(false)
            {
                self.pos += 1;
            }

            let Some(line) = self.lines.get(self.pos) else {
                if block_indent.is_empty() {
                    for i in run_start..self.pos {
                        let text = self.lines[i].text.clone();
                        out.push(self.tree.push(Node::Raw(RawLine { text })));
                    }
                } else {
                    self.pos = run_start;
                }
                return out;
            };

            if !line.indent.starts_with(block_indent) {
                self.pos = run_start;
                return out;
            }

            for i in run_start..self.pos {
                let text = self.lines[i].text.clone();
                out.push(self.tree.push(Node::Raw(RawLine { text })));
            }

            let code = line.code();
            if let Some(caps) = CLASS_RE.captures(code) {
                let name = caps[1].to_string();
                out.push(self.parse_def(DefKind::Class, name));
            } else if let Some(caps) = DEF_RE.captures(code) {
                let name = caps[1].to_string();
                out.push(self.parse_def(DefKind::Function, name));
            } else if IF_RE.is_match(code) {
                out.push(self.parse_if());
            } else {
                let text = line.text.clone();
                self.pos += 1;
                out.push(self.tree.push(Node::Raw(RawLine { text })));
            }
        }
    }

    fn parse_def(&mut self, kind: DefKind, name: String) -> NodeId {
        let line = self.lines[self.pos].clone();
        self.pos += 1;
        let (head, suite) = match split_head(&line.text) {
            HeadSplit::Inline { head, rest } => (head, Suite::Inline(rest)),
            HeadSplit::BlockExpected => (line.text.clone(), self.parse_block(&line.indent)),
            HeadSplit::Malformed => (line.text.clone(), Suite::Missing),
        };
        self.tree.push(Node::Def(DefNode {
            kind,
            name,
            indent: line.indent,
            head,
            suite,
        }))
    }

    /// Parse the indented block following a head line.
    fn parse_block(&mut self, parent_indent: &str) -> Suite {
        let mut j = self.pos;
        while self
            .lines
            .get(j)
            .map(|l| l.is_blank_or_comment())
            .unwrap_or(false)
        {
            j += 1;
        }
        let Some(first) = self.lines.get(j) else {
            return Suite::Missing;
        };
        let deeper =
            first.indent.len() > parent_indent.len() && first.indent.starts_with(parent_indent);
        if !deeper {
            return Suite::Missing;
        }
        let block_indent = first.indent.clone();
        let body = self.parse_statements(&block_indent);
        Suite::Block(Block {
            indent: block_indent,
            body,
        })
    }

    fn parse_if(&mut self) -> NodeId {
        let chain_indent = self.lines[self.pos].indent.clone();
        let mut branches = Vec::new();
        let mut orelse = None;
        let mut leading: Vec<String> = Vec::new();

        loop {
            let line = self.lines[self.pos].clone();
            self.pos += 1;

            let keyword_len = if line.code().starts_with("elif") { 4 } else { 2 };
            let (head, suite) = match split_head(&line.text) {
                HeadSplit::Inline { head, rest } => (head, Suite::Inline(rest)),
                HeadSplit::BlockExpected => (line.text.clone(), self.parse_block(&line.indent)),
                HeadSplit::Malformed => (line.text.clone(), Suite::Missing),
            };
            let test_start = line.indent.len() + keyword_len;
            let test_src = match suite_colon(&line.text) {
                Some(colon) if colon > test_start => line.text[test_start..colon].trim().to_string(),
                _ => String::new(),
            };
            let test = parse_condition(&test_src);
            branches.push(IfBranch {
                leading: std::mem::take(&mut leading),
                head,
                test_src,
                test,
                suite,
            });

            // Look ahead for an elif/else continuing this chain.
            let save = self.pos;
            let mut run = Vec::new();
            while self
                .lines
                .get(self.pos)
                .map(|l| l.is_blank_or_comment())
                .unwrap_or(false)
            {
                run.push(self.lines[self.pos].text.clone());
                self.pos += 1;
            }
            match self.lines.get(self.pos) {
                Some(next) if next.indent == chain_indent && ELIF_RE.is_match(next.code()) => {
                    leading = run;
                }
                Some(next) if next.indent == chain_indent && ELSE_RE.is_match(next.code()) => {
                    let line = next.clone();
                    self.pos += 1;
                    let (head, suite) = match split_head(&line.text) {
                        HeadSplit::Inline { head, rest } => (head, Suite::Inline(rest)),
                        HeadSplit::BlockExpected => {
                            (line.text.clone(), self.parse_block(&line.indent))
                        }
                        HeadSplit::Malformed => (line.text.clone(), Suite::Missing),
                    };
                    orelse = Some(ElseBranch {
                        leading: run,
                        head,
                        suite,
                    });
                    break;
                }
                _ => {
                    self.pos = save;
                    break;
                }
            }
        }

        self.tree.push(Node::If(IfNode {
            indent: chain_indent,
            branches,
            orelse,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(source: &str) {
        let tree = parse(source).unwrap();
        assert_eq!(tree.to_source(), source, "round-trip must be exact");
    }

    #[test]
    fn test_roundtrip_simple() {
        roundtrip("import sys\n\ndef f() -> int: ...\n");
    }

    #[test]
    fn test_roundtrip_class_with_methods() {
        roundtrip(
            "class Widget:\n    width: int\n    def resize(self, w: int) -> None: ...\n\n    def hide(self) -> None:\n        ...\n",
        );
    }

    #[test]
    fn test_roundtrip_if_chain() {
        roundtrip(
            "import sys\n\nif sys.version_info >= (3, 9):\n    def f() -> int: ...\nelif sys.platform == \"linux\":\n    def g() -> int: ...\nelse:\n    def h() -> int: ...\n",
        );
    }

    #[test]
    fn test_roundtrip_preserves_oddities() {
        // Comments, blank runs, decorators, multi-line signatures, CRLF.
        roundtrip("#!shebang\r\n\r\nimport sys\r\n\r\n@overload\r\ndef f(\r\n    x: int,\r\n) -> str: ...\r\n");
        roundtrip("def f():\n    ...\n\n\n# trailing comment\n");
        roundtrip("x = 1");
    }

    #[test]
    fn test_roundtrip_docstrings() {
        roundtrip("\"\"\"Module doc.\"\"\"\n\ndef f() -> None:\n    \"\"\"Doc\n    spanning lines.\"\"\"\n    ...\n");
    }

    #[test]
    fn test_def_structure() {
        let tree = parse("class C:\n    def m(self) -> None: ...\n").unwrap();
        let ids = tree.preorder();
        assert_eq!(ids.len(), 2);
        match tree.node(ids[0]) {
            Node::Def(def) => {
                assert_eq!(def.kind, DefKind::Class);
                assert_eq!(def.name, "C");
                assert!(matches!(def.suite, Suite::Block(_)));
            }
            other => panic!("expected class node, got {:?}", other),
        }
        match tree.node(ids[1]) {
            Node::Def(def) => {
                assert_eq!(def.kind, DefKind::Function);
                assert_eq!(def.name, "m");
                assert!(matches!(def.suite, Suite::Inline(_)));
                assert_eq!(def.indent, "    ");
            }
            other => panic!("expected function node, got {:?}", other),
        }
    }

    #[test]
    fn test_if_chain_structure() {
        let tree = parse(
            "if sys.version_info >= (3,):\n    a = 1\nelif sys.platform == 'linux':\n    b = 2\nelse:\n    c = 3\n",
        )
        .unwrap();
        assert_eq!(tree.body.len(), 1);
        match tree.node(tree.body[0]) {
            Node::If(chain) => {
                assert_eq!(chain.branches.len(), 2);
                assert!(chain.orelse.is_some());
                assert_eq!(chain.branches[0].test_src, "sys.version_info >= (3,)");
                assert_eq!(chain.branches[1].test_src, "sys.platform == 'linux'");
            }
            other => panic!("expected if node, got {:?}", other),
        }
    }

    #[test]
    fn test_header_capture() {
        let tree = parse("# comment\n\nimport sys\n").unwrap();
        assert_eq!(tree.header, vec!["# comment\n", "\n"]);
        assert_eq!(tree.body.len(), 1);
    }

    #[test]
    fn test_default_indent_detection() {
        let tree = parse("def f():\n  ...\n").unwrap();
        assert_eq!(tree.default_indent, "  ");
        let tree = parse("x = 1\n").unwrap();
        assert_eq!(tree.default_indent, "    ");
    }

    #[test]
    fn test_multiline_condition() {
        let source = "if (sys.version_info >= (3, 9)\n        and sys.platform == 'linux'):\n    x = 1\n";
        roundtrip(source);
        let tree = parse(source).unwrap();
        match tree.node(tree.body[0]) {
            Node::If(chain) => {
                assert!(matches!(
                    chain.branches[0].test,
                    crate::syntax::CondExpr::And(_, _)
                ));
            }
            other => panic!("expected if node, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_on_unterminated_string() {
        assert!(parse("x = \"\"\"open\n").is_err());
    }
}
