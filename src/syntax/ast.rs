//! Arena-backed syntax tree for stub files.
//!
//! The tree is lossless: every slice of the input is stored verbatim
//! (including indentation and line terminators), so printing a tree that
//! was not rewritten reproduces the input byte-for-byte by construction.
//! Nodes live in an arena and are addressed by `NodeId`; analysis passes
//! keep their annotations in side tables keyed by id instead of mutating
//! the tree.

use std::fmt;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of definition statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Class,
    Function,
}

impl DefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefKind::Class => "class",
            DefKind::Function => "function",
        }
    }
}

impl fmt::Display for DefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One node of the tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A verbatim logical line: anything that is not a definition or a
    /// conditional, stored exactly as read (blank lines, comments,
    /// imports, assignments, decorators, ...).
    Raw(RawLine),
    /// A `class` or `def` statement with its suite.
    Def(DefNode),
    /// An `if`/`elif`/`else` chain.
    If(IfNode),
}

/// A verbatim line, terminator included.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
}

impl RawLine {
    /// True for lines that carry no code: empty or comment-only.
    pub fn is_blank_or_comment(&self) -> bool {
        let code = self.text.trim();
        code.is_empty() || code.starts_with('#')
    }
}

/// A `class` or `def` statement.
#[derive(Debug, Clone)]
pub struct DefNode {
    pub kind: DefKind,
    pub name: String,
    /// Leading whitespace of the head line.
    pub indent: String,
    /// Verbatim text from the start of the head line through the suite
    /// colon (through the end of the line when the suite is a block).
    pub head: String,
    pub suite: Suite,
}

/// The body attached to a definition or conditional branch.
#[derive(Debug, Clone)]
pub enum Suite {
    /// Statements on the head line itself, verbatim from just after the
    /// colon (terminator included).
    Inline(String),
    /// An indented block of nodes.
    Block(Block),
    /// No recoverable body (malformed input); rewrites are a no-op here.
    Missing,
}

/// An indented block.
#[derive(Debug, Clone)]
pub struct Block {
    /// Absolute leading whitespace of the block's statements.
    pub indent: String,
    pub body: Vec<NodeId>,
}

/// An `if` chain: the `if` itself plus any `elif` branches and the
/// trailing `else`.
#[derive(Debug, Clone)]
pub struct IfNode {
    pub indent: String,
    pub branches: Vec<IfBranch>,
    pub orelse: Option<ElseBranch>,
}

/// One `if`/`elif` branch.
#[derive(Debug, Clone)]
pub struct IfBranch {
    /// Verbatim blank/comment lines between the previous branch and this
    /// branch's keyword line. Empty for the first branch.
    pub leading: Vec<String>,
    /// Verbatim head line, keyword through colon (through end of line
    /// when the suite is a block).
    pub head: String,
    /// Source text of the condition, for diagnostics.
    pub test_src: String,
    /// Parsed condition; `Opaque` when the shape is not recognized.
    pub test: CondExpr,
    pub suite: Suite,
}

/// The trailing `else` branch.
#[derive(Debug, Clone)]
pub struct ElseBranch {
    pub leading: Vec<String>,
    pub head: String,
    pub suite: Suite,
}

/// Comparison operators accepted in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl CmpOp {
    /// Apply the operator to an ordering between left and right operands.
    pub fn holds(&self, ord: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            CmpOp::Lt => ord == Less,
            CmpOp::Le => ord != Greater,
            CmpOp::Eq => ord == Equal,
            CmpOp::Ne => ord != Equal,
            CmpOp::Ge => ord != Less,
            CmpOp::Gt => ord == Greater,
        }
    }
}

/// Condition expression over runtime facts.
///
/// Only two comparison families are representable: the runtime version
/// against a small integer tuple, and the runtime platform against a
/// string. Everything else parses to `Opaque`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CondExpr {
    /// `sys.version_info OP (a, b, ...)` with 1-3 integer elements.
    VersionCmp { op: CmpOp, rhs: Vec<u32> },
    /// `sys.platform == "name"` or `!=`.
    PlatformCmp { negated: bool, rhs: String },
    Not(Box<CondExpr>),
    And(Box<CondExpr>, Box<CondExpr>),
    Or(Box<CondExpr>, Box<CondExpr>),
    /// Unrecognized shape; always evaluates to unknown.
    Opaque,
}

/// A parsed stub file.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    /// Verbatim blank/comment lines before the first statement.
    pub header: Vec<String>,
    /// Top-level statements in document order.
    pub body: Vec<NodeId>,
    /// Line terminator used when synthesizing new lines.
    pub newline: String,
    /// Indent unit used when a new block has to be created.
    pub default_indent: String,
}

impl Tree {
    pub fn new(newline: String) -> Self {
        Self {
            nodes: Vec::new(),
            header: Vec::new(),
            body: Vec::new(),
            newline,
            default_indent: "    ".to_string(),
        }
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    /// All node ids in document order (pre-order, depth-first).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &id in &self.body {
            self.collect_preorder(id, &mut out);
        }
        out
    }

    fn collect_preorder(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        match self.node(id) {
            Node::Raw(_) => {}
            Node::Def(def) => self.collect_suite(&def.suite, out),
            Node::If(chain) => {
                for branch in &chain.branches {
                    self.collect_suite(&branch.suite, out);
                }
                if let Some(orelse) = &chain.orelse {
                    self.collect_suite(&orelse.suite, out);
                }
            }
        }
    }

    /// All node ids inside a suite, recursively.
    pub fn collect_suite(&self, suite: &Suite, out: &mut Vec<NodeId>) {
        if let Suite::Block(block) = suite {
            for &id in &block.body {
                self.collect_preorder(id, out);
            }
        }
    }

    /// Serialize the tree back to source text.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
        }
        for &id in &self.body {
            self.print_node(id, &mut out);
        }
        out
    }

    fn print_node(&self, id: NodeId, out: &mut String) {
        match self.node(id) {
            Node::Raw(raw) => out.push_str(&raw.text),
            Node::Def(def) => {
                out.push_str(&def.head);
                self.print_suite(&def.suite, out);
            }
            Node::If(chain) => {
                for branch in &chain.branches {
                    for line in &branch.leading {
                        out.push_str(line);
                    }
                    out.push_str(&branch.head);
                    self.print_suite(&branch.suite, out);
                }
                if let Some(orelse) = &chain.orelse {
                    for line in &orelse.leading {
                        out.push_str(line);
                    }
                    out.push_str(&orelse.head);
                    self.print_suite(&orelse.suite, out);
                }
            }
        }
    }

    fn print_suite(&self, suite: &Suite, out: &mut String) {
        match suite {
            Suite::Inline(text) => out.push_str(text),
            Suite::Block(block) => {
                for &id in &block.body {
                    self.print_node(id, out);
                }
            }
            Suite::Missing => {}
        }
    }
}

/// Does this code start with a plain string literal?
///
/// Used for the "already documented" checks: the first statement of a
/// documented suite is a string-literal expression. Accepts the usual
/// literal prefixes except formatted strings, which are not constants.
pub fn starts_with_string_literal(code: &str) -> bool {
    let code = code.trim_start();
    let mut chars = code.chars();
    let mut prefix = 0;
    loop {
        match chars.next() {
            Some('"') | Some('\'') => return true,
            Some(c) if prefix < 2 && matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U') => {
                prefix += 1;
            }
            _ => return false,
        }
    }
}
