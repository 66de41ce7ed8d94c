//! Static analysis passes over parsed stubs.
//!
//! Both passes are side-table producers: they read the tree and return
//! maps keyed by node id, leaving the tree untouched.
//!
//! - `reach`: folds version/platform conditions and marks dead branches
//! - `scope`: computes enclosing scope chains and qualified names

mod reach;
mod scope;

pub use reach::{eval_condition, ReachabilityMap, Truth};
pub use scope::{qualified_name, scope_chains, Scope};
