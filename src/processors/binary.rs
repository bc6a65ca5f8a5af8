//! Image and font processors: a single data-URI conversion task, gated by
//! the type's enable flag and optional byte-size limit.

use std::sync::Arc;

use crate::engine::Engine;
use crate::engine::registry::{ProcessorSpec, TaskDecl};
use crate::options::InlineOptions;
use crate::patterns::to_data_uri;
use crate::resolver::FileRecord;

/// A file of exactly `limit` bytes is still inlined; one byte over is not.
pub(crate) fn within_limit(file: &FileRecord, limit: Option<u64>) -> bool {
    limit.is_none_or(|limit| file.size <= limit)
}

/// Replace the content with its data URI and mark the record encoded so
/// splicing callers know the conversion actually happened.
pub(crate) fn data_uri_task(
    _engine: &mut Engine<'_>,
    file: &mut FileRecord,
    _options: &InlineOptions,
) -> anyhow::Result<String> {
    let uri = to_data_uri(&file.path, file.data.as_bytes());
    file.encoded = true;
    Ok(uri)
}

pub fn img_spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![TaskDecl::new(
            Arc::new(|file: &FileRecord, options: &InlineOptions| {
                options
                    .img
                    .as_ref()
                    .is_some_and(|img| within_limit(file, img.limit))
            }),
            Arc::new(data_uri_task),
        )],
        compress: None,
    }
}

pub fn font_spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![TaskDecl::new(
            Arc::new(|file: &FileRecord, options: &InlineOptions| {
                options
                    .font
                    .as_ref()
                    .is_some_and(|font| within_limit(file, font.limit))
            }),
            Arc::new(data_uri_task),
        )],
        compress: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{FileCache, FileData};
    use std::collections::HashMap;
    use std::path::Path;

    fn record(path: &str, bytes: &[u8]) -> FileRecord {
        let mut file_map = HashMap::new();
        file_map.insert(path.to_string(), bytes.to_vec());
        FileCache::seeded(&file_map)
            .read(path, Path::new("."))
            .unwrap()
    }

    #[test]
    fn test_limit_boundary() {
        let file = record("a.png", &[0u8; 16]);
        assert!(within_limit(&file, None));
        assert!(within_limit(&file, Some(16)));
        assert!(!within_limit(&file, Some(15)));
    }

    #[test]
    fn test_data_uri_task_marks_encoded() {
        let registry = crate::engine::registry::ProcessorRegistry::with_builtins();
        let options = InlineOptions::default();
        let mut engine = Engine::new(&registry, &options);

        let mut file = record("x/logo.png", b"abc");
        let out = data_uri_task(&mut engine, &mut file, &options).unwrap();
        assert_eq!(out, "data:image/png;base64,YWJj");
        assert!(file.encoded);
    }
}
