//! Docstring insertion.
//!
//! Splices an already-quoted literal into a declaration's suite or at
//! the top of a module, synthesizing as few lines as possible so every
//! untouched byte survives.

use crate::syntax::{Block, Node, NodeId, RawLine, Suite, Tree};

/// The indentation a docstring inside this definition's body would get.
pub fn doc_indent(tree: &Tree, def_id: NodeId) -> String {
    match tree.node(def_id) {
        Node::Def(def) => match &def.suite {
            Suite::Block(block) => block.indent.clone(),
            Suite::Inline(_) => format!("{}{}", def.indent, tree.default_indent),
            Suite::Missing => String::new(),
        },
        _ => String::new(),
    }
}

/// Does this definition already start with a documentation statement?
pub fn def_has_doc(tree: &Tree, def_id: NodeId) -> bool {
    let def = match tree.node(def_id) {
        Node::Def(def) => def,
        _ => return false,
    };
    match &def.suite {
        Suite::Inline(rest) => crate::syntax::starts_with_string_literal(rest),
        Suite::Block(block) => block
            .body
            .iter()
            .map(|id| tree.node(*id))
            .find(|node| match node {
                Node::Raw(raw) => !raw.is_blank_or_comment(),
                _ => true,
            })
            .map(|node| match node {
                Node::Raw(raw) => crate::syntax::starts_with_string_literal(&raw.text),
                _ => false,
            })
            .unwrap_or(false),
        Suite::Missing => false,
    }
}

/// Does the module already start with a documentation statement?
pub fn module_has_doc(tree: &Tree) -> bool {
    match tree.body.first().map(|id| tree.node(*id)) {
        Some(Node::Raw(raw)) => crate::syntax::starts_with_string_literal(&raw.text),
        _ => false,
    }
}

/// Split an inline suite into its statements at top-level semicolons.
fn split_inline_statements(rest: &str) -> Vec<String> {
    let code = rest.trim_end_matches(['\n', '\r']);
    let mut parts = Vec::new();
    let mut string: Option<char> = None;
    let mut depth: u32 = 0;
    let mut start = 0;
    let mut iter = code.char_indices().peekable();
    while let Some((idx, c)) = iter.next() {
        if let Some(delim) = string {
            match c {
                '\\' => {
                    iter.next();
                }
                c if c == delim => string = None,
                _ => {}
            }
            continue;
        }
        match c {
            '\'' | '"' => string = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '#' => break,
            ';' if depth == 0 => {
                parts.push(code[start..idx].trim().to_string());
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(code[start..].trim().to_string());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Insert a documentation statement at the front of a definition's body.
///
/// Returns false when the body has no shape a statement can be attached
/// to; the declaration is then left untouched.
pub fn insert_def_doc(tree: &mut Tree, def_id: NodeId, literal: &str) -> bool {
    let newline = tree.newline.clone();
    let (def_indent, suite) = match tree.node(def_id) {
        Node::Def(def) => (def.indent.clone(), def.suite.clone()),
        _ => return false,
    };

    match suite {
        Suite::Inline(rest) => {
            // The one-line suite becomes an indented block: the new
            // docstring first, then each original statement on its own
            // line.
            let block_indent = format!("{}{}", def_indent, tree.default_indent);
            let mut body = Vec::new();
            body.push(tree.push(Node::Raw(RawLine {
                text: format!("{}{}{}", block_indent, literal, newline),
            })));
            for statement in split_inline_statements(&rest) {
                body.push(tree.push(Node::Raw(RawLine {
                    text: format!("{}{}{}", block_indent, statement, newline),
                })));
            }
            if let Node::Def(def) = tree.node_mut(def_id) {
                // The head kept everything through the colon; the suite
                // text it carried is replaced by the block.
                def.head.push_str(&newline);
                def.suite = Suite::Block(Block {
                    indent: block_indent,
                    body,
                });
            }
            true
        }
        Suite::Block(block) => {
            let doc_id = tree.push(Node::Raw(RawLine {
                text: format!("{}{}{}", block.indent, literal, newline),
            }));
            if let Node::Def(def) = tree.node_mut(def_id) {
                if let Suite::Block(block) = &mut def.suite {
                    block.body.insert(0, doc_id);
                }
            }
            true
        }
        Suite::Missing => false,
    }
}

/// Insert a module-level documentation statement as the first statement.
pub fn insert_module_doc(tree: &mut Tree, literal: &str) {
    let newline = tree.newline.clone();
    let doc_id = tree.push(Node::Raw(RawLine {
        text: format!("{}{}", literal, newline),
    }));
    let blank_id = tree.push(Node::Raw(RawLine {
        text: newline.clone(),
    }));

    if tree.body.is_empty() {
        tree.body.push(doc_id);
        tree.body.push(blank_id);
    } else {
        tree.body.insert(0, blank_id);
        tree.body.insert(0, doc_id);
    }

    if !tree.header.is_empty() {
        tree.header.push(newline);
    }
}
