//! Shared fixture helper: a temp directory tree acting as the inline root.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;

pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Fixture {
            dir: TempDir::new().expect("create fixture dir"),
        }
    }

    pub fn write(&self, path: &str, content: impl AsRef<[u8]>) -> &Self {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).expect("create fixture subdir");
        }
        fs::write(full, content.as_ref()).expect("write fixture file");
        self
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.dir.path().join(path)).expect("read fixture file")
    }
}
