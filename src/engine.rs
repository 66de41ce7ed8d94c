//! Enrichment engine: discovers stub files and drives the per-file
//! pipeline.
//!
//! Each file is independent: parse, fold reachability, walk the
//! declarations, splice in documentation, serialize, commit. Files are
//! fanned out over a worker pool; a failure in one file is logged and
//! never affects another. A file is committed atomically or not at all.

use std::fs;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::analysis::{qualified_name, scope_chains, ReachabilityMap};
use crate::quote::{normalize, quote};
use crate::rewrite::{def_has_doc, doc_indent, insert_def_doc, insert_module_doc, module_has_doc};
use crate::runtime::{RuntimeFacts, SymbolProvider};
use crate::select::{select, select_module};
use crate::syntax::{parse, Node, Tree};

/// The stub file suffix.
pub const STUB_SUFFIX: &str = "pyi";

/// Modules that are jokes to import and never worth enriching.
const IGNORE_MODULES: &[&str] = &["antigravity", "this"];

/// Where rewritten stubs go.
#[derive(Debug, Clone)]
pub enum OutputMode {
    /// Atomically replace each input file.
    InPlace,
    /// Recreate the relative paths under a separate root.
    OutputDir(PathBuf),
}

/// Engine configuration, explicit and immutable for a run.
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub input_dirs: Vec<PathBuf>,
    pub output: OutputMode,
    /// Only process modules built into the runtime.
    pub builtins_only: bool,
    /// Only attach documentation when the symbol's implementation source
    /// is unavailable.
    pub if_needed: bool,
    /// Facts the reachability pass folds conditions against.
    pub facts: RuntimeFacts,
    /// Show a progress bar on a terminal.
    pub progress: bool,
}

/// One stub file queued for processing.
#[derive(Debug, Clone)]
pub struct StubFile {
    /// Dotted module path the stub describes.
    pub module_path: String,
    /// Absolute (or input-relative) location on disk.
    pub path: PathBuf,
    /// Path under the output root in mirrored mode.
    pub rel_path: PathBuf,
}

/// Aggregated results of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunSummary {
    /// Files queued for processing.
    pub files: usize,
    /// Files fully processed and committed.
    pub processed: usize,
    /// Files skipped on load/parse/write failure.
    pub skipped: usize,
    /// Docstrings inserted across all files.
    pub docs_added: usize,
}

#[derive(Debug, Clone, Copy)]
struct FileReport {
    committed: bool,
    added: usize,
}

pub struct Engine {
    config: EnrichConfig,
    provider: Box<dyn SymbolProvider>,
}

impl Engine {
    pub fn new(config: EnrichConfig, provider: Box<dyn SymbolProvider>) -> Self {
        Self { config, provider }
    }

    /// Discover stub files under the configured input directories.
    ///
    /// Fails only on configuration errors (an input path that is not a
    /// directory); unreadable entries inside a tree are logged and
    /// skipped.
    pub fn collect(&self) -> anyhow::Result<Vec<StubFile>> {
        let mut queue = Vec::new();

        for input_dir in &self.config.input_dirs {
            if !input_dir.is_dir() {
                anyhow::bail!("input path {:?} is not a directory", input_dir);
            }

            // When the input directory is itself a package, its name is
            // part of every module path under it.
            let is_package = input_dir.join("__init__.py").exists()
                || input_dir.join("__init__.pyi").exists();
            let root_name = if is_package {
                root_dir_name(input_dir)
            } else {
                None
            };

            for entry in WalkDir::new(input_dir).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        tracing::warn!("cannot walk {}: {}", input_dir.display(), e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let path = entry.path();
                let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
                if ext != STUB_SUFFIX {
                    continue;
                }
                let rel = match path.strip_prefix(input_dir) {
                    Ok(rel) => rel,
                    Err(_) => continue,
                };

                let Some(module_path) = module_path_for(rel, root_name.as_deref()) else {
                    tracing::warn!("cannot derive a module path for {}", path.display());
                    continue;
                };

                if IGNORE_MODULES.contains(&module_path.as_str()) {
                    continue;
                }
                if self.config.builtins_only && !self.provider.is_builtin(&module_path) {
                    continue;
                }

                let rel_path = match &root_name {
                    Some(root) => Path::new(root).join(rel),
                    None => rel.to_path_buf(),
                };
                queue.push(StubFile {
                    module_path,
                    path: path.to_path_buf(),
                    rel_path,
                });
            }
        }

        queue.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(queue)
    }

    /// Process every discovered stub file.
    pub fn run(&self) -> anyhow::Result<RunSummary> {
        let queue = self.collect()?;

        let bar = if self.config.progress && std::io::stderr().is_terminal() {
            let bar = ProgressBar::new(queue.len() as u64);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let reports: Vec<FileReport> = queue
            .par_iter()
            .map(|stub| {
                bar.set_message(stub.module_path.clone());
                let report = self.process_file(stub);
                bar.inc(1);
                report
            })
            .collect();
        bar.finish_and_clear();

        let mut summary = RunSummary {
            files: queue.len(),
            ..Default::default()
        };
        for report in reports {
            if report.committed {
                summary.processed += 1;
                summary.docs_added += report.added;
            } else {
                summary.skipped += 1;
            }
        }
        Ok(summary)
    }

    fn process_file(&self, stub: &StubFile) -> FileReport {
        let skipped = FileReport {
            committed: false,
            added: 0,
        };

        if let Err(e) = self.provider.load(&stub.module_path) {
            tracing::warn!("could not load {}: {}", stub.module_path, e);
            return skipped;
        }

        let source = match fs::read_to_string(&stub.path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("could not read {}: {}", stub.path.display(), e);
                return skipped;
            }
        };

        let mut tree = match parse(&source) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("could not parse {}: {}", stub.path.display(), e);
                return skipped;
            }
        };

        tracing::info!("processing {}", stub.path.display());
        let added = self.enrich_tree(&mut tree, &stub.module_path);

        if let Err(e) = self.commit(stub, &tree.to_source()) {
            tracing::error!("could not write {}: {}", stub.path.display(), e);
            return skipped;
        }

        FileReport {
            committed: true,
            added,
        }
    }

    /// Run the enrichment passes over one parsed tree.
    fn enrich_tree(&self, tree: &mut Tree, module_path: &str) -> usize {
        let marks = ReachabilityMap::analyze(tree, &self.config.facts);
        let chains = scope_chains(tree);
        let mut added = 0;

        for id in tree.preorder() {
            let (kind, name) = match tree.node(id) {
                Node::Def(def) => (def.kind, def.name.clone()),
                _ => continue,
            };
            if marks.is_dead(id) {
                continue;
            }

            let Some(qualname) = chains
                .get(&id)
                .and_then(|chain| qualified_name(chain, &name))
            else {
                tracing::trace!("no dotted path for {} in {}", name, module_path);
                continue;
            };

            if def_has_doc(tree, id) {
                tracing::trace!("docstring for {} already exists, skipping", qualname);
                continue;
            }

            let Some(resolved) = self.provider.resolve(module_path, &qualname) else {
                tracing::trace!("cannot find {}", qualname);
                continue;
            };

            if self.config.if_needed && resolved.symbol.has_source {
                continue;
            }

            let Some(doc) = select(self.provider.as_ref(), &resolved, kind, &qualname, &name)
            else {
                tracing::trace!("could not find documentation for {}", qualname);
                continue;
            };
            let doc = normalize(&doc);
            if doc.is_empty() {
                tracing::trace!("could not find documentation for {}", qualname);
                continue;
            }

            let literal = quote(&doc, &doc_indent(tree, id));
            tracing::trace!("documentation for {}:\n{}", qualname, literal);
            if insert_def_doc(tree, id, &literal) {
                added += 1;
            }
        }

        added += self.enrich_module(tree, module_path);
        added
    }

    fn enrich_module(&self, tree: &mut Tree, module_path: &str) -> usize {
        if module_has_doc(tree) {
            tracing::trace!("docstring for {} already exists, skipping", module_path);
            return 0;
        }
        let Some(facts) = self.provider.module_facts(module_path) else {
            return 0;
        };
        if self.config.if_needed && facts.has_source {
            return 0;
        }
        let Some(doc) = select_module(&facts, module_path) else {
            tracing::trace!("could not find documentation for {}", module_path);
            return 0;
        };
        let doc = normalize(&doc);
        if doc.is_empty() {
            return 0;
        }
        let literal = quote(&doc, "");
        tracing::trace!("documentation for {}:\n{}", module_path, literal);
        insert_module_doc(tree, &literal);
        1
    }

    /// Write the rewritten stub to its destination.
    fn commit(&self, stub: &StubFile, text: &str) -> anyhow::Result<()> {
        match &self.config.output {
            OutputMode::InPlace => {
                let parent = stub.path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = stub
                    .path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(STUB_SUFFIX);
                let mut tmp = tempfile::Builder::new()
                    .prefix(&format!("{}.", file_name))
                    .tempfile_in(parent)?;
                tmp.write_all(text.as_bytes())?;
                tmp.flush()?;
                let permissions = fs::metadata(&stub.path)?.permissions();
                fs::set_permissions(tmp.path(), permissions)?;
                tmp.persist(&stub.path).map_err(|e| e.error)?;
            }
            OutputMode::OutputDir(dir) => {
                let out = dir.join(&stub.rel_path);
                if let Some(parent) = out.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&out, text)?;
            }
        }
        Ok(())
    }
}

/// The directory name to prepend when the input root is a package.
fn root_dir_name(dir: &Path) -> Option<String> {
    if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
        if name != ".." {
            return Some(name.to_string());
        }
    }
    // The spelling hides the name ("." or a trailing ".."); resolve it.
    let resolved = dir.canonicalize().ok()?;
    resolved
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}

/// Derive a dotted module path from a stub's relative path.
fn module_path_for(rel: &Path, root_name: Option<&str>) -> Option<String> {
    let mut segments: Vec<String> = Vec::new();
    if let Some(root) = root_name {
        segments.push(root.to_string());
    }
    for component in rel.components() {
        segments.push(component.as_os_str().to_str()?.to_string());
    }
    let file = segments.pop()?;
    let stem = file.strip_suffix(".pyi")?;
    if stem != "__init__" {
        segments.push(stem.to_string());
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}
