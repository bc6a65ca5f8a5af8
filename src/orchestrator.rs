//! Top-level entry: resolve the working file set, drive each file through
//! its processor, and optionally persist the results.

use std::fs;

use anyhow::{Context, Result};
use log::debug;

use crate::engine::Engine;
use crate::engine::registry::{ProcessorRegistry, ProcessorSpec, TaskDecl, TaskHandle};
use crate::error::InlineError;
use crate::options::{FileSelector, InlineOptions};
use crate::resolver::FileRecord;
use crate::utils::normalize_path;

/// Owns the processor registry across runs. Each call to [`inline`]
/// creates a fresh engine (and cache), so no state leaks between runs.
///
/// [`inline`]: Inliner::inline
#[derive(Default)]
pub struct Inliner {
    registry: ProcessorRegistry,
}

impl Inliner {
    #[must_use]
    pub fn new() -> Self {
        Inliner::default()
    }

    /// Register (or replace) a processor for a semantic type name. Custom
    /// types are enabled per run through `InlineOptions::extra`.
    pub fn register_processor(&mut self, type_name: impl Into<String>, spec: ProcessorSpec) {
        self.registry.register(type_name, spec);
    }

    /// Append a custom task to a type. It runs after the built-in tasks.
    pub fn add_task(&mut self, type_name: impl Into<String>, task: TaskDecl) -> TaskHandle {
        self.registry.add_task(type_name, task)
    }

    /// Remove a previously added task. Returns whether it was found.
    pub fn remove_task(&mut self, handle: &TaskHandle) -> bool {
        self.registry.remove_task(handle)
    }

    /// Run one inline pass. Returns the processed records in selector
    /// order; top-level targets are never compressed. When `output` is set,
    /// each result is written under `root/output/<relative path>`.
    ///
    /// # Errors
    ///
    /// Fails only on an unreadable root or an output write failure; every
    /// per-reference problem degrades to leaving the reference as written.
    pub fn inline(&self, options: &InlineOptions) -> Result<Vec<FileRecord>> {
        if !options.root.is_dir() {
            return Err(InlineError::InvalidRoot(options.root.clone()).into());
        }

        let mut engine = Engine::new(&self.registry, options);
        let mut records = collect_targets(&mut engine, options);

        for file in &mut records {
            file.disable_compress = true;
            debug!("begin inline run for {}", file.path);
            engine.process(file, options);
        }

        if let Some(output) = &options.output {
            let out_dir = options.root.join(output);
            for file in &records {
                let out_path = out_dir.join(&file.path);
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("creating {}", parent.display()))?;
                }
                debug!("write {}", out_path.display());
                fs::write(&out_path, file.data.as_bytes())
                    .with_context(|| format!("writing {}", out_path.display()))?;
            }
        }

        Ok(records)
    }
}

/// Resolve the working file set: literal content selectors become records
/// directly (and seed the cache); matchers run against the virtual file
/// map's keys when one was supplied, otherwise against a sorted walk of
/// the root tree. Matches keep selector order and are deduplicated.
fn collect_targets(engine: &mut Engine<'_>, options: &InlineOptions) -> Vec<FileRecord> {
    let mut matchable: Vec<String> = Vec::new();
    if options
        .files
        .iter()
        .any(|sel| matches!(sel, FileSelector::Match(_)))
    {
        if options.file_map.is_empty() {
            matchable = walk_root(options);
        } else {
            matchable = engine.cached_paths();
            matchable.sort();
        }
    }

    let mut records = Vec::new();
    let mut taken: Vec<String> = Vec::new();
    for selector in &options.files {
        match selector {
            FileSelector::Content { path, data } => {
                let rel = normalize_path(path);
                engine.seed(rel.clone(), data.clone());
                if let Some(record) = engine.read_target(&rel, options) {
                    records.push(record);
                    taken.push(rel);
                }
            }
            FileSelector::Match(matcher) => {
                for path in &matchable {
                    if taken.iter().any(|t| t == path) || !matcher.matches(path) {
                        continue;
                    }
                    debug!("target match: {path}");
                    if let Some(record) = engine.read_target(path, options) {
                        records.push(record);
                        taken.push(path.clone());
                    }
                }
            }
        }
    }
    records
}

fn walk_root(options: &InlineOptions) -> Vec<String> {
    let mut paths = Vec::new();
    let walker = walkdir::WalkDir::new(&options.root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file());
    for entry in walker {
        if let Ok(relative) = entry.path().strip_prefix(&options.root) {
            paths.push(normalize_path(&relative.to_string_lossy()));
        }
    }
    paths
}

/// Convenience wrapper running one pass with the built-in processors.
///
/// # Errors
///
/// Same failure surface as [`Inliner::inline`].
pub fn inline(options: &InlineOptions) -> Result<Vec<FileRecord>> {
    Inliner::new().inline(options)
}
