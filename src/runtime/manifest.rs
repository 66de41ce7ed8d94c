//! Manifest-backed symbol provider.
//!
//! A manifest directory holds one JSON file per importable module
//! (`os.path` -> `os.path.json`), dumped from the live runtime by an
//! introspection helper, plus an optional `runtime.json` with the
//! runtime's version/platform facts. Loads are cached process-wide; a
//! module is read and decoded at most once per run.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Deserialize;

use super::{
    DocValue, LoadError, ResolvedSymbol, RuntimeFacts, SymbolFacts, SymbolKind, SymbolProvider,
};

/// A documentation slot as serialized in a manifest: plain text, or a
/// marker object for the unresolved shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DocEntry {
    Text(String),
    Marker {
        descriptor: bool,
    },
    Typed {
        #[serde(rename = "type")]
        type_name: String,
    },
}

impl DocEntry {
    fn to_value(&self) -> DocValue {
        match self {
            DocEntry::Text(t) => DocValue::Text(t.clone()),
            DocEntry::Marker { descriptor: true } => DocValue::Descriptor,
            DocEntry::Marker { descriptor: false } => DocValue::Other("object".to_string()),
            DocEntry::Typed { type_name } => DocValue::Other(type_name.clone()),
        }
    }
}

fn default_kind() -> SymbolKind {
    SymbolKind::Instance
}

/// One symbol in a manifest, as attribute access sees it.
#[derive(Debug, Clone, Deserialize)]
struct SymbolRecord {
    #[serde(default = "default_kind")]
    kind: SymbolKind,
    #[serde(default)]
    doc: Option<DocEntry>,
    #[serde(default)]
    type_doc: Option<DocEntry>,
    #[serde(default)]
    has_source: bool,
    #[serde(default)]
    root_type: bool,
    /// The attribute exists on the owner only through inheritance; it
    /// has no entry in the owner's own namespace.
    #[serde(default)]
    inherited: bool,
    /// The undescriptored namespace entry, when it differs from the
    /// attribute-access view (a property and the value it computes).
    #[serde(default)]
    raw: Option<Box<SymbolRecord>>,
    #[serde(default)]
    members: BTreeMap<String, SymbolRecord>,
}

impl SymbolRecord {
    fn facts(&self) -> SymbolFacts {
        SymbolFacts {
            kind: self.kind,
            doc: self.doc.as_ref().map(DocEntry::to_value),
            type_doc: self.type_doc.as_ref().map(DocEntry::to_value),
            has_source: self.has_source,
            is_root_type: self.root_type,
        }
    }
}

/// Top level of a module manifest file.
#[derive(Debug, Clone, Deserialize)]
struct ModuleManifest {
    #[serde(default)]
    builtin: bool,
    #[serde(flatten)]
    root: SymbolRecord,
}

/// `SymbolProvider` over a directory of module manifests.
pub struct ManifestProvider {
    dir: PathBuf,
    runtime: Option<RuntimeFacts>,
    cache: RwLock<HashMap<String, Arc<ModuleManifest>>>,
}

impl ManifestProvider {
    /// Open a manifest directory. Reads `runtime.json` eagerly when
    /// present; module manifests are read on demand.
    pub fn new<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            anyhow::bail!("manifest path {:?} is not a directory", dir);
        }
        let runtime_path = dir.join("runtime.json");
        let runtime = if runtime_path.exists() {
            let text = std::fs::read_to_string(&runtime_path)?;
            Some(
                serde_json::from_str(&text)
                    .map_err(|e| anyhow::anyhow!("malformed {}: {}", runtime_path.display(), e))?,
            )
        } else {
            None
        };
        Ok(Self {
            dir,
            runtime,
            cache: RwLock::new(HashMap::new()),
        })
    }

    fn loaded(&self, module_path: &str) -> Result<Arc<ModuleManifest>, LoadError> {
        {
            let cache = self.cache.read().unwrap();
            if let Some(manifest) = cache.get(module_path) {
                return Ok(manifest.clone());
            }
        }

        let path = self.dir.join(format!("{}.json", module_path));
        if !path.exists() {
            return Err(LoadError::NotFound(module_path.to_string()));
        }
        let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            module: module_path.to_string(),
            source,
        })?;
        let manifest: ModuleManifest =
            serde_json::from_str(&text).map_err(|e| LoadError::Malformed {
                module: module_path.to_string(),
                reason: e.to_string(),
            })?;
        let manifest = Arc::new(manifest);

        let mut cache = self.cache.write().unwrap();
        Ok(cache
            .entry(module_path.to_string())
            .or_insert(manifest)
            .clone())
    }
}

impl SymbolProvider for ManifestProvider {
    fn load(&self, module_path: &str) -> Result<(), LoadError> {
        self.loaded(module_path).map(|_| ())
    }

    fn module_facts(&self, module_path: &str) -> Option<SymbolFacts> {
        self.loaded(module_path).ok().map(|m| m.root.facts())
    }

    fn resolve(&self, module_path: &str, qualname: &str) -> Option<ResolvedSymbol> {
        let manifest = self.loaded(module_path).ok()?;
        let mut owner = &manifest.root;
        let mut current = &manifest.root;
        for segment in qualname.split('.') {
            owner = current;
            current = owner.members.get(segment)?;
        }
        let raw_entry = if current.inherited {
            None
        } else {
            match &current.raw {
                Some(raw) => Some(raw.facts()),
                None => Some(current.facts()),
            }
        };
        Some(ResolvedSymbol {
            owner: owner.facts(),
            symbol: current.facts(),
            raw_entry,
        })
    }

    fn root_hook_doc(&self, member: &str) -> Option<String> {
        let builtins = self.loaded("builtins").ok()?;
        let root = builtins.root.members.get("object")?;
        let hook = root.members.get(member)?;
        match hook.doc.as_ref()?.to_value() {
            DocValue::Text(t) => Some(t),
            _ => None,
        }
    }

    fn is_builtin(&self, module_path: &str) -> bool {
        self.loaded(module_path)
            .map(|m| m.builtin)
            .unwrap_or(false)
    }

    fn runtime_facts(&self) -> Option<RuntimeFacts> {
        self.runtime.clone()
    }
}
