//! Lossless stub syntax: scanner, arena tree, parser, printer.
//!
//! The enrichment passes only need structure for definitions and `if`
//! chains; every other statement is kept as a verbatim line. Printing a
//! tree reproduces the exact input bytes for anything a rewrite did not
//! touch.

mod ast;
mod cond;
mod lines;
mod parse;

pub use ast::{
    starts_with_string_literal, Block, CmpOp, CondExpr, DefKind, DefNode, ElseBranch, IfBranch,
    IfNode, Node, NodeId, RawLine, Suite, Tree,
};
pub use cond::parse_condition;
pub use parse::{parse, ParseError};
