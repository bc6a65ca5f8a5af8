//! Script processor: `document.write('<script src=...>')` statements and
//! the `__inline("path")` marker syntax.

use std::sync::Arc;

use log::debug;

use crate::engine::Engine;
use crate::engine::registry::{ProcessorSpec, TaskDecl};
use crate::options::InlineOptions;
use crate::patterns::{CUSTOM_INLINE, DOCUMENT_WRITE, attr_regexp, replace_all_fancy, text_to_js};
use crate::resolver::FileRecord;

pub fn spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.js.is_some()),
                Arc::new(document_write_task),
            ),
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| {
                    o.js.as_ref().is_some_and(|js| js.custom)
                }),
                Arc::new(custom_inline_task),
            ),
        ],
        compress: Some(Arc::new(
            |file: &FileRecord, _: &crate::options::CompressConfig| {
                Ok(compress(&file.data.to_text()))
            },
        )),
    }
}

/// Replace `document.write('<script src=...>')` statements with the
/// referenced script's content, dropping the write wrapper entirely.
/// Matches inside JS comments are emitted unchanged.
fn document_write_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let src_attr = attr_regexp("src");

    Ok(DOCUMENT_WRITE
        .replace_all(&text, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                return caps[0].to_string();
            }
            let markup = &caps[2];
            let Some(src) = src_attr.captures(markup).map(|c| c[2].to_string()) else {
                return caps[0].to_string();
            };
            debug!("inline document.write: {src}");
            match engine.resolve_reference(&src, file, options) {
                Some(res) => res.data.to_text().into_owned(),
                None => caps[0].to_string(),
            }
        })
        .into_owned())
}

/// Give a marker path the inline-trigger parameter when it lacks one, so
/// markers always qualify regardless of the ambient opt-in setting.
fn mark_inline(path: &str, param_name: &str) -> String {
    match path.split_once('?') {
        Some((_, query)) => {
            let present = url::form_urlencoded::parse(query.as_bytes())
                .any(|(key, _)| key == param_name);
            if present {
                path.to_string()
            } else {
                format!("{path}&{param_name}")
            }
        }
        None => format!("{path}?{param_name}"),
    }
}

/// Expand `__inline("path")` markers. With an assignment prefix the
/// resolved content becomes a quoted multi-line JS string expression;
/// standalone markers splice the raw content.
fn custom_inline_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();

    Ok(replace_all_fancy(&CUSTOM_INLINE, &text, |caps| {
        let prefix = caps.get(1).map_or("", |m| m.as_str());
        let path = mark_inline(&caps[3], &options.inline_param_name);
        debug!("inline marker: {path}");
        match engine.resolve_reference(&path, file, options) {
            Some(res) => {
                let content = res.data.to_text();
                if prefix.is_empty() {
                    content.into_owned()
                } else {
                    format!("{prefix}{}", text_to_js(&content))
                }
            }
            None => caps[0].to_string(),
        }
    }))
}

fn compress(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.trim_start().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
