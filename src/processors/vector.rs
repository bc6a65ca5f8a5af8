//! Vector graphics processor. Data-URI mode converts like any binary
//! asset; source mode leaves the markup for the referencing task to splice
//! raw, with compression delegated to the whitespace-collapsing hook.

use std::sync::LazyLock;
use std::sync::Arc;

use regex::Regex;

use crate::engine::registry::{ProcessorSpec, TaskDecl};
use crate::options::InlineOptions;
use crate::resolver::FileRecord;

use super::binary::{data_uri_task, within_limit};

/// Whitespace runs between adjacent tags.
static INTER_TAG_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("INTER_TAG_WS: hardcoded regex is valid"));

fn compress_markup(text: &str) -> String {
    INTER_TAG_WS.replace_all(text.trim(), "><").into_owned()
}

pub fn spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![TaskDecl::new(
            Arc::new(|file: &FileRecord, options: &InlineOptions| {
                options
                    .svg
                    .as_ref()
                    .is_some_and(|svg| !svg.use_source && within_limit(file, svg.limit))
            }),
            Arc::new(data_uri_task),
        )],
        compress: Some(Arc::new(
            |file: &FileRecord, _: &crate::options::CompressConfig| {
                Ok(compress_markup(&file.data.to_text()))
            },
        )),
    }
}
