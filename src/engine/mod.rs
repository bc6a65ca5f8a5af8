//! The task engine: type dispatch, sequential task application, the
//! compression decision, and the recursive reference resolver.
//!
//! An [`Engine`] is created at the start of one `inline()` run and dropped
//! at its end. It owns the run's read cache and the in-flight path stack
//! that keeps reference cycles from recursing forever.

pub mod registry;

use std::path::Path;

use log::{debug, warn};

use crate::error::InlineError;
use crate::options::{InlineOptions, PathRewrite};
use crate::resolver::{FileCache, FileData, FileRecord};
use crate::utils::{classify, dirname, file_ext, is_local_path, join_relative};

use registry::ProcessorRegistry;

/// Trims a reference and splits off its query string and fragment. The
/// fragment starts at the first `#`; the query sits between `?` and the
/// fragment, matching url parsing conventions.
fn split_reference(reference: &str) -> (&str, Option<&str>) {
    let reference = reference.trim();
    let without_hash = match reference.find('#') {
        Some(idx) => &reference[..idx],
        None => reference,
    };
    match without_hash.find('?') {
        Some(idx) => (&without_hash[..idx], Some(&without_hash[idx + 1..])),
        None => (without_hash, None),
    }
}

/// Looks up the inline-trigger parameter in a raw query string. Returns
/// `Some(value)` when present; an empty value means "opted in, no directory
/// override".
fn trigger_param(query: &str, param_name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == param_name)
        .map(|(_, value)| value.into_owned())
}

pub struct Engine<'r> {
    registry: &'r ProcessorRegistry,
    cache: FileCache,
    /// Normalized paths currently being processed, outermost first.
    in_flight: Vec<String>,
}

impl<'r> Engine<'r> {
    #[must_use]
    pub fn new(registry: &'r ProcessorRegistry, options: &InlineOptions) -> Self {
        Engine {
            registry,
            cache: FileCache::seeded(&options.file_map),
            in_flight: Vec::new(),
        }
    }

    /// The cached paths, for target matching against a virtual file map.
    pub fn cached_paths(&self) -> Vec<String> {
        self.cache.paths().cloned().collect()
    }

    /// Read a root-relative path through the run cache.
    pub fn read_target(&mut self, path: &str, options: &InlineOptions) -> Option<FileRecord> {
        self.cache.read(path, &options.root)
    }

    /// Seed the cache with literal content supplied by the caller.
    pub fn seed(&mut self, path: String, data: Vec<u8>) {
        self.cache.insert(path, data);
    }

    /// The semantic type a file dispatches to: an explicit fragment kind
    /// first, then the options' extension overrides, then the built-in
    /// classification table.
    fn type_name_for(file: &FileRecord, options: &InlineOptions) -> Option<String> {
        if let Some(kind) = &file.kind_override {
            return Some(kind.clone());
        }
        let ext = file_ext(&file.path).to_ascii_lowercase();
        if let Some(mapped) = options.processor.get(&ext) {
            return Some(mapped.clone());
        }
        classify(&file.path).map(|kind| kind.as_str().to_string())
    }

    /// Run a file through its processor: apply every enabled task in order,
    /// then decide compression. Files with no processor pass through
    /// unchanged. A failing task or compressor is logged and its rewrite
    /// discarded; the run never aborts on one file's account.
    pub fn process(&mut self, file: &mut FileRecord, options: &InlineOptions) {
        let registry = self.registry;

        let Some(type_name) = Self::type_name_for(file, options) else {
            debug!("no processor type for {}", file.path);
            return;
        };
        let Some(spec) = registry.get(&type_name) else {
            debug!("no processor registered for type {type_name} ({})", file.path);
            return;
        };

        self.in_flight.push(file.path.clone());
        let tasks = spec.tasks.iter().chain(registry.custom_tasks(&type_name));
        for task in tasks {
            if !(task.enabled)(file, options) {
                continue;
            }
            match (task.run)(self, file, options) {
                Ok(rewritten) => file.data = FileData::Text(rewritten),
                Err(err) => warn!("task failed for {}: {err:#}", file.path),
            }
        }
        self.in_flight.pop();

        self.apply_compression(file, &type_name, options);
    }

    fn apply_compression(&self, file: &mut FileRecord, type_name: &str, options: &InlineOptions) {
        if file.disable_compress || file.compressed || file.encoded {
            return;
        }
        let Some(config) = options.compress_config(type_name) else {
            return;
        };
        if !config.enabled {
            return;
        }
        if options
            .ignore_compress_files
            .iter()
            .any(|matcher| matcher.matches(&file.path))
        {
            debug!("compression exempted for {}", file.path);
            return;
        }

        file.compressed = true;
        let result = match &config.custom {
            Some(custom) => custom(&file.data.to_text(), &config.options),
            None => match self.registry.get(type_name).and_then(|s| s.compress.as_ref()) {
                Some(builtin) => builtin(file, config),
                None => return,
            },
        };
        match result {
            Ok(compressed) => file.data = FileData::Text(compressed),
            Err(err) => {
                let err = InlineError::Compress {
                    path: file.path.clone(),
                    message: format!("{err:#}"),
                };
                warn!("{err}");
            }
        }
    }

    /// Resolve a reference found in `current` into a fully inlined file.
    ///
    /// Returns `None`, leaving the caller to keep the original reference
    /// text, when the reference is remote, not opted in, unreadable, or
    /// currently being processed further up the stack.
    pub fn resolve_reference(
        &mut self,
        reference: &str,
        current: &FileRecord,
        options: &InlineOptions,
    ) -> Option<FileRecord> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }

        let (path, hook_dir) = match &options.inline_path_resolver {
            Some(resolver) => {
                let PathRewrite { path, directory } = resolver(reference, current)?;
                (path, directory)
            }
            None => (reference.to_string(), None),
        };
        if !is_local_path(&path) {
            return None;
        }

        let (pathname, query) = split_reference(&path);
        let trigger = query.and_then(|q| trigger_param(q, &options.inline_param_name));
        if !options.inline_all && trigger.is_none() {
            return None;
        }

        // The hook's directory wins over the trigger parameter's value.
        let base_dir = hook_dir
            .or(trigger.filter(|dir| !dir.is_empty()))
            .unwrap_or_else(|| dirname(current.context_path()).to_string());
        let rel = join_relative(&base_dir, pathname);

        if self.in_flight.iter().any(|active| *active == rel) {
            warn!(
                "reference cycle: {rel} is already being inlined (from {})",
                current.path
            );
            return None;
        }

        debug!("inline {rel} (referenced by {})", current.context_path());
        let mut file = self.cache.read(&rel, &options.root)?;
        self.process(&mut file, options);
        Some(file)
    }

    /// Process an embedded fragment (a style or script block) in place and
    /// return it. References inside the fragment resolve against the owning
    /// file's directory.
    pub fn resolve_fragment(
        &mut self,
        owner: &FileRecord,
        kind: &str,
        data: String,
        options: &InlineOptions,
    ) -> FileRecord {
        let mut fragment = FileRecord::fragment(owner, kind, data);
        self.process(&mut fragment, options);
        fragment
    }

    /// Resolve a reference from a stylesheet context: vector graphics are
    /// forced into data-URI form, whatever the ambient source-mode setting.
    pub fn resolve_resource(
        &mut self,
        reference: &str,
        current: &FileRecord,
        options: &InlineOptions,
    ) -> Option<FileRecord> {
        match &options.svg {
            Some(svg) if svg.use_source => {
                let mut overridden = options.clone();
                if let Some(svg) = overridden.svg.as_mut() {
                    svg.use_source = false;
                }
                self.resolve_reference(reference, current, &overridden)
            }
            _ => self.resolve_reference(reference, current, options),
        }
    }
}
