//! Reachability analysis over `if` chains.
//!
//! Conditions are folded against fixed runtime facts into a three-valued
//! outcome. A definitely-false test kills its own branch; a
//! definitely-true test kills every later branch in the chain without
//! looking at their conditions. Unknown tests leave no marks and the
//! walk descends normally. Marks are kept in a side table keyed by node
//! id and are never retracted within one file.

use std::collections::HashSet;

use crate::runtime::RuntimeFacts;
use crate::syntax::{CondExpr, Node, NodeId, Suite, Tree};

/// Three-valued condition outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Unknown,
}

impl Truth {
    fn known(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

/// Fold a condition against the runtime facts.
pub fn eval_condition(expr: &CondExpr, facts: &RuntimeFacts) -> Truth {
    match expr {
        CondExpr::VersionCmp { op, rhs } => {
            // Lexicographic tuple comparison, with the current version
            // truncated to the literal's arity.
            let arity = rhs.len().min(facts.version.len());
            let current = &facts.version[..arity];
            Truth::known(op.holds(current.cmp(&rhs[..])))
        }
        CondExpr::PlatformCmp { negated, rhs } => {
            Truth::known((facts.platform == *rhs) != *negated)
        }
        CondExpr::Not(inner) => match eval_condition(inner, facts) {
            Truth::True => Truth::False,
            Truth::False => Truth::True,
            Truth::Unknown => Truth::Unknown,
        },
        CondExpr::And(left, right) => {
            match (eval_condition(left, facts), eval_condition(right, facts)) {
                (Truth::Unknown, _) | (_, Truth::Unknown) => Truth::Unknown,
                (l, r) => Truth::known(l == Truth::True && r == Truth::True),
            }
        }
        CondExpr::Or(left, right) => {
            match (eval_condition(left, facts), eval_condition(right, facts)) {
                (Truth::Unknown, _) | (_, Truth::Unknown) => Truth::Unknown,
                (l, r) => Truth::known(l == Truth::True || r == Truth::True),
            }
        }
        CondExpr::Opaque => Truth::Unknown,
    }
}

/// Side table of statically-dead nodes.
#[derive(Debug, Default)]
pub struct ReachabilityMap {
    dead: HashSet<NodeId>,
}

impl ReachabilityMap {
    /// Walk a tree and mark everything proven dead under the facts.
    pub fn analyze(tree: &Tree, facts: &RuntimeFacts) -> Self {
        let mut map = ReachabilityMap::default();
        for id in tree.preorder() {
            let chain = match tree.node(id) {
                Node::If(chain) => chain,
                _ => continue,
            };
            // A chain inside an already-dead region needs no second look.
            if map.is_dead(id) {
                continue;
            }

            for (index, branch) in chain.branches.iter().enumerate() {
                match eval_condition(&branch.test, facts) {
                    Truth::False => {
                        map.mark_suite(tree, &branch.suite);
                    }
                    Truth::True => {
                        for later in &chain.branches[index + 1..] {
                            map.mark_suite(tree, &later.suite);
                        }
                        if let Some(orelse) = &chain.orelse {
                            map.mark_suite(tree, &orelse.suite);
                        }
                        break;
                    }
                    Truth::Unknown => {
                        tracing::warn!(
                            "encountered unsupported condition: {}",
                            branch.test_src
                        );
                    }
                }
            }
        }
        map
    }

    pub fn is_dead(&self, id: NodeId) -> bool {
        self.dead.contains(&id)
    }

    fn mark_suite(&mut self, tree: &Tree, suite: &Suite) {
        let mut ids = Vec::new();
        tree.collect_suite(suite, &mut ids);
        self.dead.extend(ids);
    }

    #[cfg(test)]
    pub fn dead_count(&self) -> usize {
        self.dead.len()
    }
}
