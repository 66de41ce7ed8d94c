//! Live-symbol provider interface.
//!
//! The enrichment engine never introspects a runtime directly; it talks
//! to a `SymbolProvider` in terms of a small closed set of capability
//! tags and documentation-slot shapes. `ManifestProvider` is the
//! shipping adapter, reading per-module manifests dumped from a live
//! runtime.

mod manifest;

pub use manifest::ManifestProvider;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading a module's symbols.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("module {0} not found")]
    NotFound(String),
    #[error("malformed manifest for {module}: {reason}")]
    Malformed { module: String, reason: String },
    #[error("could not read manifest for {module}: {source}")]
    Io {
        module: String,
        #[source]
        source: std::io::Error,
    },
}

/// Capability tag of a live symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolKind {
    /// Callable: plain function, method, builtin routine, wrapper.
    Routine,
    /// Attribute whose access runs managed behavior.
    DataDescriptor,
    Class,
    /// Anything else: a plain value.
    Instance,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Routine => "routine",
            SymbolKind::DataDescriptor => "data-descriptor",
            SymbolKind::Class => "class",
            SymbolKind::Instance => "instance",
        }
    }
}

/// The observable shape of a documentation slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocValue {
    /// Resolved text.
    Text(String),
    /// The slot holds an unresolved data descriptor, not text.
    Descriptor,
    /// The slot holds some other non-text value; carries its type name
    /// for diagnostics.
    Other(String),
}

impl DocValue {
    /// The text, if this slot resolved to text.
    pub fn text(&self) -> Option<&str> {
        match self {
            DocValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Capability snapshot of one live symbol.
#[derive(Debug, Clone)]
pub struct SymbolFacts {
    pub kind: SymbolKind,
    /// The symbol's own documentation slot, as attribute access sees it.
    pub doc: Option<DocValue>,
    /// The raw documentation slot of the symbol's runtime type.
    pub type_doc: Option<DocValue>,
    /// Whether the runtime can locate the symbol's implementation
    /// source.
    pub has_source: bool,
    /// Whether this is the runtime's universal root object type.
    pub is_root_type: bool,
}

impl SymbolFacts {
    pub fn is_routine(&self) -> bool {
        self.kind == SymbolKind::Routine
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.kind == SymbolKind::DataDescriptor
    }

    pub fn is_class(&self) -> bool {
        self.kind == SymbolKind::Class
    }

    pub fn is_instance(&self) -> bool {
        self.kind == SymbolKind::Instance
    }
}

/// Result of resolving a qualified name against a loaded module.
#[derive(Debug, Clone)]
pub struct ResolvedSymbol {
    /// The object the final segment was looked up on.
    pub owner: SymbolFacts,
    /// The symbol itself, as attribute access sees it.
    pub symbol: SymbolFacts,
    /// The undescriptored entry for the final segment in the owner's own
    /// namespace; `None` when the attribute is inherited.
    pub raw_entry: Option<SymbolFacts>,
}

/// Fixed facts about the live runtime, used for reachability folding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RuntimeFacts {
    /// Version components, most significant first.
    pub version: Vec<u32>,
    pub platform: String,
}

/// Reflective access to a live runtime's symbols.
///
/// Implementations must be cheap to query per declaration: `resolve` is
/// called once per stub declaration and results are intentionally not
/// cached by callers, because raw-namespace lookups are scope-specific.
pub trait SymbolProvider: Send + Sync {
    /// Load a module. Idempotent: one real load per module path, no
    /// matter how often it is called.
    fn load(&self, module_path: &str) -> Result<(), LoadError>;

    /// Capability snapshot of the module object itself.
    fn module_facts(&self, module_path: &str) -> Option<SymbolFacts>;

    /// Walk a dotted name from the module root. `None` when any segment
    /// is missing.
    fn resolve(&self, module_path: &str, qualname: &str) -> Option<ResolvedSymbol>;

    /// Documentation of a constructor/allocator hook on the runtime's
    /// root object type, used to filter inherited boilerplate.
    fn root_hook_doc(&self, member: &str) -> Option<String>;

    /// Whether the module is built into the runtime.
    fn is_builtin(&self, module_path: &str) -> bool;

    /// Version/platform facts of the live runtime, if the provider knows
    /// them.
    fn runtime_facts(&self) -> Option<RuntimeFacts>;
}
