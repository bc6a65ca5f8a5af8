//! Stylesheet processor: embedded resource references (`url()`, filter
//! `src=`, `image-set`) and `@import` splicing, plus the rebase strategies
//! applied when a stylesheet's content moves into another file.

use std::sync::{Arc, LazyLock};

use log::debug;
use regex::Regex;

use crate::engine::Engine;
use crate::engine::registry::{ProcessorSpec, TaskDecl};
use crate::options::{InlineOptions, RebaseMode, RebaseTools};
use crate::patterns::{CSS_IMAGE_SET, CSS_IMPORT, CSS_SRC, CSS_URL, replace_all_fancy};
use crate::resolver::FileRecord;
use crate::utils::{
    dirname, is_font_path, is_img_path, is_local_path, is_svg_path, join_relative, rebase_path,
};

/// One quoted candidate inside an `image-set(...)` body. Group 1: the
/// quote, group 2: the reference.
static IMAGE_SET_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(['"])([^'"]+)['"]"#).expect("IMAGE_SET_CANDIDATE: hardcoded regex is valid")
});

/// Block comments, stripped by the built-in compressor.
static CSS_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/\*[\s\S]*?\*/").expect("CSS_COMMENT: hardcoded regex is valid")
});

pub fn spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![
            TaskDecl::new(
                Arc::new(|_file: &FileRecord, options: &InlineOptions| {
                    options.img.is_some() || options.font.is_some() || options.svg.is_some()
                }),
                Arc::new(resource_task),
            ),
            TaskDecl::new(
                Arc::new(|_file: &FileRecord, options: &InlineOptions| options.css.is_some()),
                Arc::new(import_task),
            ),
        ],
        compress: Some(Arc::new(
            |file: &FileRecord, _: &crate::options::CompressConfig| {
                Ok(compress(&file.data.to_text()))
            },
        )),
    }
}

/// Whether a reference points at a binary asset type that is both
/// classified and enabled. The query/fragment suffix is ignored for
/// classification.
fn eligible_resource(url: &str, options: &InlineOptions) -> bool {
    let pathname = url.split(['?', '#']).next().unwrap_or(url);
    (options.img.is_some() && is_img_path(pathname))
        || (options.font.is_some() && is_font_path(pathname))
        || (options.svg.is_some() && is_svg_path(pathname))
}

/// Inline image/font/vector references found in the stylesheet text.
/// Vector targets always come back as data URIs here, whatever the ambient
/// source-mode setting says.
fn resource_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();

    // url(...) references
    let pass = CSS_URL
        .replace_all(&text, |caps: &regex::Captures| {
            let url = caps[1].trim();
            if !eligible_resource(url, options) {
                return caps[0].to_string();
            }
            debug!("stylesheet resource: {url}");
            match engine.resolve_resource(url, file, options) {
                Some(res) if res.encoded => format!("url({})", res.data.to_text()),
                _ => caps[0].to_string(),
            }
        })
        .into_owned();

    // filter src= references
    let pass = replace_all_fancy(&CSS_SRC, &pass, |caps| {
        let quote = &caps[1];
        let url = caps[2].trim();
        if !eligible_resource(url, options) {
            return caps[0].to_string();
        }
        match engine.resolve_resource(url, file, options) {
            Some(res) if res.encoded => {
                format!("src={quote}{}{quote}", res.data.to_text())
            }
            _ => caps[0].to_string(),
        }
    });

    // image-set(...) candidate lists written without url()
    let pass = CSS_IMAGE_SET
        .replace_all(&pass, |caps: &regex::Captures| {
            let body = &caps[1];
            let rewritten = IMAGE_SET_CANDIDATE.replace_all(body, |c: &regex::Captures| {
                let quote = &c[1];
                let url = c[2].trim();
                if !eligible_resource(url, options) {
                    return c[0].to_string();
                }
                match engine.resolve_resource(url, file, options) {
                    Some(res) if res.encoded => {
                        format!("{quote}{}{quote}", res.data.to_text())
                    }
                    _ => c[0].to_string(),
                }
            });
            caps[0].replacen(body, &rewritten, 1)
        })
        .into_owned();

    Ok(pass)
}

/// Splice `@import`ed stylesheets in place, wrapping in a media-query
/// block when the import declared one.
fn import_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let out = CSS_IMPORT
        .replace_all(&text, |caps: &regex::Captures| {
            let url = caps[1].trim();
            let media = caps[2].trim();
            debug!("import: {url}");
            match engine.resolve_reference(url, file, options) {
                Some(res) => {
                    let data = rebase_stylesheet(&res, file, options);
                    if media.is_empty() {
                        data
                    } else {
                        format!("@media {media} {{{data}}}")
                    }
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned();
    Ok(out)
}

/// Rewrite the local url references of a stylesheet that is being spliced
/// into `target`, per the configured rebase strategy.
pub(crate) fn rebase_stylesheet(
    file: &FileRecord,
    target: &FileRecord,
    options: &InlineOptions,
) -> String {
    let data = file.data.to_text().into_owned();
    let Some(css) = &options.css else {
        return data;
    };
    if !css.rebase.enabled() {
        return data;
    }

    let rebase = &css.rebase;
    CSS_URL
        .replace_all(&data, |caps: &regex::Captures| {
            let url = caps[1].trim();
            if !is_local_path(url) {
                return caps[0].to_string();
            }
            if let Some(ignore) = &rebase.ignore {
                if ignore(url) {
                    return caps[0].to_string();
                }
            }
            let rewritten = match &rebase.mode {
                RebaseMode::Disabled => return caps[0].to_string(),
                RebaseMode::Relative => rebase_path(url, &file.path, &target.path),
                RebaseMode::Absolute => {
                    format!("/{}", join_relative(dirname(&file.path), url))
                }
                RebaseMode::Custom(custom) => {
                    match custom(url, &file.path, &target.path, &RebaseTools) {
                        Some(rewritten) => rewritten,
                        None => return caps[0].to_string(),
                    }
                }
            };
            debug!("rebase {url} -> {rewritten} ({} into {})", file.path, target.path);
            format!("url({rewritten})")
        })
        .into_owned()
}

fn compress(text: &str) -> String {
    let stripped = CSS_COMMENT.replace_all(text, "");
    stripped
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim_start().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_strips_comments_and_blanks() {
        let css = "/* banner\n   comment */\n.a { color: red; }\n\n.b { top: 0; }  \n";
        assert_eq!(compress(css), ".a { color: red; }\n.b { top: 0; }");
    }

    #[test]
    fn test_eligible_resource_respects_disabled_types() {
        let mut options = InlineOptions::default();
        assert!(eligible_resource("a.png?_inline", &options));
        assert!(eligible_resource("f.woff", &options));
        assert!(!eligible_resource("a.css", &options));

        options.img = None;
        assert!(!eligible_resource("a.png?_inline", &options));
    }
}
