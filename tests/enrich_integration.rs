//! Integration tests for the full enrichment pipeline.
//!
//! These tests drive the engine over the testdata fixtures end to end:
//! discovery, reachability, selection, rewriting, and both commit modes.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use stubfill::runtime::{LoadError, ResolvedSymbol, RuntimeFacts, SymbolFacts, SymbolProvider};
use stubfill::{Engine, EnrichConfig, ManifestProvider, OutputMode};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn facts() -> RuntimeFacts {
    RuntimeFacts {
        version: vec![3, 12, 0],
        platform: "linux".to_string(),
    }
}

fn config(input: &Path, output: OutputMode) -> EnrichConfig {
    EnrichConfig {
        input_dirs: vec![input.to_path_buf()],
        output,
        builtins_only: false,
        if_needed: false,
        facts: facts(),
        progress: false,
    }
}

fn copy_tree(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_tree(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

fn manifest_provider() -> ManifestProvider {
    ManifestProvider::new(testdata_path().join("manifest")).expect("manifest dir should open")
}

const EXPECTED_CORE: &str = r#""""Core widgets."""

import sys

def make(name: str) -> Widget:
    """
    Create a widget.

    Names must be unique.
    """
    ...

class Widget:
    """A rectangular widget."""
    width: int
    def resize(self, w: int) -> None:
        """Resize in place."""
        ...
    def __init__(self, name: str) -> None: ...

if sys.version_info >= (4, 0):
    def future_only() -> None: ...

def documented() -> None:
    """Kept as written."""
"#;

const EXPECTED_INIT: &str = r#""""Demo package."""

from demopkg.core import Widget as Widget

__version__: str
"#;

#[test]
fn test_in_place_enrichment() {
    let temp = TempDir::new().unwrap();
    copy_tree(&testdata_path().join("stubs"), temp.path());

    let engine = Engine::new(
        config(temp.path(), OutputMode::InPlace),
        Box::new(manifest_provider()),
    );
    let summary = engine.run().unwrap();

    assert_eq!(summary.files, 3);
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.skipped, 0);

    let core = fs::read_to_string(temp.path().join("demopkg/core.pyi")).unwrap();
    assert_eq!(core, EXPECTED_CORE);

    let init = fs::read_to_string(temp.path().join("demopkg/__init__.pyi")).unwrap();
    assert_eq!(init, EXPECTED_INIT);
}

#[test]
fn test_fully_documented_stub_is_unchanged() {
    let temp = TempDir::new().unwrap();
    copy_tree(&testdata_path().join("stubs"), temp.path());
    let original = fs::read_to_string(temp.path().join("demopkg/complete.pyi")).unwrap();

    let engine = Engine::new(
        config(temp.path(), OutputMode::InPlace),
        Box::new(manifest_provider()),
    );
    engine.run().unwrap();

    let after = fs::read_to_string(temp.path().join("demopkg/complete.pyi")).unwrap();
    assert_eq!(after, original, "documented stub must survive byte-for-byte");
}

#[test]
fn test_second_run_is_idempotent() {
    let temp = TempDir::new().unwrap();
    copy_tree(&testdata_path().join("stubs"), temp.path());

    let engine = Engine::new(
        config(temp.path(), OutputMode::InPlace),
        Box::new(manifest_provider()),
    );
    engine.run().unwrap();

    let core = fs::read_to_string(temp.path().join("demopkg/core.pyi")).unwrap();
    let init = fs::read_to_string(temp.path().join("demopkg/__init__.pyi")).unwrap();

    let engine = Engine::new(
        config(temp.path(), OutputMode::InPlace),
        Box::new(manifest_provider()),
    );
    let summary = engine.run().unwrap();
    assert_eq!(summary.processed, 3);

    assert_eq!(
        fs::read_to_string(temp.path().join("demopkg/core.pyi")).unwrap(),
        core
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("demopkg/__init__.pyi")).unwrap(),
        init
    );
}

#[test]
fn test_output_dir_mode_mirrors_tree() {
    let out = TempDir::new().unwrap();
    let stubs = testdata_path().join("stubs");
    let original = fs::read_to_string(stubs.join("demopkg/core.pyi")).unwrap();

    let engine = Engine::new(
        config(&stubs, OutputMode::OutputDir(out.path().to_path_buf())),
        Box::new(manifest_provider()),
    );
    let summary = engine.run().unwrap();
    assert_eq!(summary.processed, 3);

    let mirrored = fs::read_to_string(out.path().join("demopkg/core.pyi")).unwrap();
    assert_eq!(mirrored, EXPECTED_CORE);

    // The input tree is untouched in mirrored mode.
    assert_eq!(
        fs::read_to_string(stubs.join("demopkg/core.pyi")).unwrap(),
        original
    );
}

/// Provider that records every symbol resolution and answers nothing.
struct SpyProvider {
    calls: Arc<Mutex<Vec<String>>>,
}

impl SymbolProvider for SpyProvider {
    fn load(&self, _: &str) -> Result<(), LoadError> {
        Ok(())
    }
    fn module_facts(&self, _: &str) -> Option<SymbolFacts> {
        None
    }
    fn resolve(&self, _: &str, qualname: &str) -> Option<ResolvedSymbol> {
        self.calls.lock().unwrap().push(qualname.to_string());
        None
    }
    fn root_hook_doc(&self, _: &str) -> Option<String> {
        None
    }
    fn is_builtin(&self, _: &str) -> bool {
        false
    }
    fn runtime_facts(&self) -> Option<RuntimeFacts> {
        None
    }
}

#[test]
fn test_dead_branch_declarations_are_never_queried() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("guarded.pyi"),
        "import sys\n\nif sys.version_info >= (4, 0):\n    def future_only() -> None: ...\n\ndef present() -> None: ...\n",
    )
    .unwrap();

    let calls = Arc::new(Mutex::new(Vec::new()));
    let engine = Engine::new(
        config(temp.path(), OutputMode::InPlace),
        Box::new(SpyProvider {
            calls: calls.clone(),
        }),
    );
    engine.run().unwrap();

    let calls = calls.lock().unwrap();
    assert!(calls.contains(&"present".to_string()));
    assert!(
        !calls.contains(&"future_only".to_string()),
        "declarations under a dead branch must never reach the provider"
    );
}

#[test]
fn test_unloadable_module_skips_only_that_file() {
    let input = TempDir::new().unwrap();
    fs::write(input.path().join("known.pyi"), "def f() -> None: ...\n").unwrap();
    fs::write(input.path().join("ghost.pyi"), "def g() -> None: ...\n").unwrap();

    let manifests = TempDir::new().unwrap();
    fs::write(
        manifests.path().join("known.json"),
        r#"{"members": {"f": {"kind": "routine", "doc": "F doc."}}}"#,
    )
    .unwrap();

    let engine = Engine::new(
        config(input.path(), OutputMode::InPlace),
        Box::new(ManifestProvider::new(manifests.path()).unwrap()),
    );
    let summary = engine.run().unwrap();

    assert_eq!(summary.files, 2);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);

    let known = fs::read_to_string(input.path().join("known.pyi")).unwrap();
    assert_eq!(known, "def f() -> None:\n    \"\"\"F doc.\"\"\"\n    ...\n");

    // The unloadable module's stub is untouched.
    let ghost = fs::read_to_string(input.path().join("ghost.pyi")).unwrap();
    assert_eq!(ghost, "def g() -> None: ...\n");
}

#[test]
fn test_collect_rejects_missing_input_dir() {
    let engine = Engine::new(
        config(Path::new("/nonexistent/stubs"), OutputMode::InPlace),
        Box::new(manifest_provider()),
    );
    assert!(engine.run().is_err());
}
