//! Scope resolution for declarations.
//!
//! Computes, for every definition node, the chain of enclosing
//! definitions (outer to inner), and turns a chain into a dotted
//! qualified name. Only class scopes contribute segments; reaching the
//! module terminates the walk. A declaration nested inside a function
//! body has no dotted attribute path, so its name is reported
//! unresolvable rather than guessed.

use std::collections::HashMap;

use crate::syntax::{DefKind, Node, NodeId, Suite, Tree};

/// One enclosing definition scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: DefKind,
    pub name: String,
}

/// Enclosing scope chains for every definition node, outer to inner.
pub fn scope_chains(tree: &Tree) -> HashMap<NodeId, Vec<Scope>> {
    let mut chains = HashMap::new();
    let mut stack = Vec::new();
    for &id in &tree.body {
        collect(tree, id, &mut stack, &mut chains);
    }
    chains
}

fn collect(
    tree: &Tree,
    id: NodeId,
    stack: &mut Vec<Scope>,
    chains: &mut HashMap<NodeId, Vec<Scope>>,
) {
    match tree.node(id) {
        Node::Raw(_) => {}
        Node::Def(def) => {
            chains.insert(id, stack.clone());
            stack.push(Scope {
                kind: def.kind,
                name: def.name.clone(),
            });
            collect_suite(tree, &def.suite, stack, chains);
            stack.pop();
        }
        Node::If(chain) => {
            // Conditionals do not open a scope.
            for branch in &chain.branches {
                collect_suite(tree, &branch.suite, stack, chains);
            }
            if let Some(orelse) = &chain.orelse {
                collect_suite(tree, &orelse.suite, stack, chains);
            }
        }
    }
}

fn collect_suite(
    tree: &Tree,
    suite: &Suite,
    stack: &mut Vec<Scope>,
    chains: &mut HashMap<NodeId, Vec<Scope>>,
) {
    if let Suite::Block(block) = suite {
        for &id in &block.body {
            collect(tree, id, stack, chains);
        }
    }
}

/// Dot-join a declaration's qualified name from its enclosing chain.
///
/// Returns `None` when any enclosing scope cannot contribute a segment:
/// a function scope, or a class scope without a recoverable name.
pub fn qualified_name(chain: &[Scope], name: &str) -> Option<String> {
    let mut segments = Vec::with_capacity(chain.len() + 1);
    for scope in chain {
        match scope.kind {
            DefKind::Class if !scope.name.is_empty() => segments.push(scope.name.as_str()),
            _ => return None,
        }
    }
    segments.push(name);
    Some(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn chain_for(source: &str, name: &str) -> Option<Vec<Scope>> {
        let tree = parse(source).unwrap();
        let chains = scope_chains(&tree);
        for id in tree.preorder() {
            if let Node::Def(def) = tree.node(id) {
                if def.name == name {
                    return chains.get(&id).cloned();
                }
            }
        }
        None
    }

    #[test]
    fn test_module_level_function() {
        let chain = chain_for("def f() -> None: ...\n", "f").unwrap();
        assert!(chain.is_empty());
        assert_eq!(qualified_name(&chain, "f").as_deref(), Some("f"));
    }

    #[test]
    fn test_nested_classes() {
        let source = "class Outer:\n    class Inner:\n        def m(self) -> None: ...\n";
        let chain = chain_for(source, "m").unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(
            qualified_name(&chain, "m").as_deref(),
            Some("Outer.Inner.m")
        );
    }

    #[test]
    fn test_conditionals_are_transparent() {
        let source = "class C:\n    if sys.platform == 'linux':\n        def m(self) -> None: ...\n";
        let chain = chain_for(source, "m").unwrap();
        assert_eq!(qualified_name(&chain, "m").as_deref(), Some("C.m"));
    }

    #[test]
    fn test_function_scope_is_unresolvable() {
        let source = "def outer() -> None:\n    def inner() -> None: ...\n";
        let chain = chain_for(source, "inner").unwrap();
        assert_eq!(qualified_name(&chain, "inner"), None);
    }
}
