//! File records and the run-scoped content cache.
//!
//! Reads are read-through: the first access to a path pulls bytes from the
//! virtual file map or from disk under the run's root, and every later
//! access within the same run reuses those bytes. The cache lives and dies
//! with one `inline()` call.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::warn;

use crate::error::InlineError;
use crate::utils::normalize_path;

/// File content, kept as raw bytes until a text task needs it.
#[derive(Debug, Clone)]
pub enum FileData {
    Text(String),
    Bytes(Vec<u8>),
}

impl FileData {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileData::Text(text) => text.as_bytes(),
            FileData::Bytes(bytes) => bytes,
        }
    }

    /// View as text, lossily for non-UTF-8 bytes.
    #[must_use]
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            FileData::Text(text) => Cow::Borrowed(text),
            FileData::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

/// One file (or embedded fragment) flowing through the pipeline. Created by
/// the resolver, rewritten in place by tasks, dropped when the run ends.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub data: FileData,
    /// Byte size of the originally read content; the size-limit gates for
    /// binary assets test against this, not the current (possibly rewritten)
    /// content.
    pub size: u64,
    /// Normalized path relative to the run root.
    pub path: String,
    pub full_path: PathBuf,
    /// Path of the enclosing file when this record is an embedded fragment
    /// (a style or script block inside markup) with no path of its own.
    pub owner_path: Option<String>,
    /// Explicit type name for fragments, bypassing extension classification.
    pub kind_override: Option<String>,
    pub compressed: bool,
    pub disable_compress: bool,
    /// Set once the content has been replaced by its inlined form (data URI
    /// or raw vector source). Splicing callers must leave the original
    /// reference text alone when this is unset.
    pub encoded: bool,
}

impl FileRecord {
    fn new(data: FileData, size: u64, path: String, full_path: PathBuf) -> Self {
        FileRecord {
            data,
            size,
            path,
            full_path,
            owner_path: None,
            kind_override: None,
            compressed: false,
            disable_compress: false,
            encoded: false,
        }
    }

    /// Build a record for an embedded fragment owned by another file.
    #[must_use]
    pub fn fragment(owner: &FileRecord, kind: &str, data: String) -> Self {
        let size = data.len() as u64;
        let mut record = FileRecord::new(
            FileData::Text(data),
            size,
            owner.path.clone(),
            owner.full_path.clone(),
        );
        record.owner_path = Some(owner.path.clone());
        record.kind_override = Some(kind.to_string());
        record
    }

    /// The path references inside this file resolve against: the owner's
    /// for fragments, its own otherwise.
    #[must_use]
    pub fn context_path(&self) -> &str {
        self.owner_path.as_deref().unwrap_or(&self.path)
    }
}

/// Run-scoped path to bytes cache.
#[derive(Debug, Default)]
pub struct FileCache {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl FileCache {
    /// Seed the cache from a virtual file map, normalizing the keys.
    #[must_use]
    pub fn seeded(file_map: &HashMap<String, Vec<u8>>) -> Self {
        let entries = file_map
            .iter()
            .map(|(path, data)| (normalize_path(path), Arc::new(data.clone())))
            .collect();
        FileCache { entries }
    }

    /// Iterate the cached paths; target matching runs against these when a
    /// virtual file map was supplied.
    pub fn paths(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn insert(&mut self, path: String, data: Vec<u8>) {
        self.entries.insert(path, Arc::new(data));
    }

    /// Read a root-relative path through the cache. A failed disk read is
    /// logged and reported as `None`; the caller degrades to leaving the
    /// reference untouched.
    pub fn read(&mut self, relative_path: &str, root: &Path) -> Option<FileRecord> {
        let rel = normalize_path(relative_path);
        let full_path = root.join(&rel);

        let bytes = match self.entries.get(&rel) {
            Some(bytes) => Arc::clone(bytes),
            None => match std::fs::read(&full_path) {
                Ok(bytes) => {
                    let bytes = Arc::new(bytes);
                    self.entries.insert(rel.clone(), Arc::clone(&bytes));
                    bytes
                }
                Err(source) => {
                    let err = InlineError::Read {
                        path: rel.clone(),
                        source,
                    };
                    warn!("{err}: {}", full_path.display());
                    return None;
                }
            },
        };

        let size = bytes.len() as u64;
        Some(FileRecord::new(
            FileData::Bytes(bytes.as_ref().clone()),
            size,
            rel,
            full_path,
        ))
    }
}
