//! Stubfill - adds runtime docstrings to type stubs.
//!
//! Stubfill walks a tree of stub files, loads each corresponding module
//! through a symbol provider, and inserts the docstring every
//! undocumented declaration carries at runtime. Declarations guarded by
//! version or platform checks that are statically dead for the target
//! runtime are never touched, and neither is any byte of existing
//! formatting.
//!
//! # Architecture
//!
//! - `syntax`: lossless parser/printer for the stub subset
//! - `analysis`: reachability folding and scope resolution side tables
//! - `runtime`: symbol-provider capability interface and the manifest
//!   adapter
//! - `select`: picks the applicable documentation text per declaration
//! - `quote`: formats text as a safe triple-quoted literal
//! - `rewrite`: splices literals into suites and module tops
//! - `engine`: file discovery, the per-file pipeline, parallel driving
//! - `cli` / `logger`: command surface and verbosity plumbing

pub mod analysis;
pub mod cli;
pub mod engine;
pub mod logger;
pub mod quote;
pub mod rewrite;
pub mod runtime;
pub mod select;
pub mod syntax;

pub use engine::{Engine, EnrichConfig, OutputMode, RunSummary, StubFile};
pub use runtime::{
    DocValue, LoadError, ManifestProvider, ResolvedSymbol, RuntimeFacts, SymbolFacts, SymbolKind,
    SymbolProvider,
};
pub use syntax::{parse, ParseError, Tree};
