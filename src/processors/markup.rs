//! Markup processor: vector objects, images, stylesheets (links and style
//! blocks), nested document imports, and scripts. Scans are single-pass
//! with explicit comment skipping; anything matched inside an HTML comment
//! is emitted unchanged.

use std::sync::Arc;

use log::debug;

use crate::engine::Engine;
use crate::engine::registry::{ProcessorSpec, TaskDecl};
use crate::options::InlineOptions;
use crate::patterns::{
    IMG, LINK, OBJECT, SCRIPT, STYLE, attr_regexp, has_attr_value, replace_all_fancy,
};
use crate::resolver::FileRecord;
use crate::utils::is_svg_path;

use super::style::rebase_stylesheet;

pub fn spec() -> ProcessorSpec {
    ProcessorSpec {
        tasks: vec![
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.svg.is_some()),
                Arc::new(svg_object_task),
            ),
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.img.is_some()),
                Arc::new(img_task),
            ),
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.css.is_some()),
                Arc::new(style_task),
            ),
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.html.is_some()),
                Arc::new(import_task),
            ),
            TaskDecl::new(
                Arc::new(|_f: &FileRecord, o: &InlineOptions| o.js.is_some()),
                Arc::new(script_task),
            ),
        ],
        compress: Some(Arc::new(
            |file: &FileRecord, _: &crate::options::CompressConfig| {
                Ok(compress(&file.data.to_text()))
            },
        )),
    }
}

fn use_source(options: &InlineOptions) -> bool {
    options.svg.as_ref().is_some_and(|svg| svg.use_source)
}

fn pathname(reference: &str) -> &str {
    reference.split(['?', '#']).next().unwrap_or(reference)
}

/// `<object data=...>` / `<embed>` elements pointing at vector graphics:
/// rewrite the `data` attribute to the data URI, or replace the whole
/// element with the raw markup in source mode.
fn svg_object_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let data_attr = attr_regexp("data");

    Ok(replace_all_fancy(&OBJECT, &text, |caps| {
        let open_tag = &caps[1];
        let rest = &caps[3];
        let Some(attr_caps) = data_attr.captures(open_tag) else {
            return caps[0].to_string();
        };
        let target = attr_caps[2].to_string();
        if !is_svg_path(pathname(&target)) {
            return caps[0].to_string();
        }
        let Some(res) = engine.resolve_reference(&target, file, options) else {
            return caps[0].to_string();
        };
        if res.encoded {
            let rewritten = data_attr.replace(open_tag, |c: &regex::Captures| {
                format!("{}=\"{}\"", &c[1], res.data.to_text())
            });
            format!("{rewritten}{rest}")
        } else if use_source(options) {
            res.data.to_text().into_owned()
        } else {
            caps[0].to_string()
        }
    }))
}

/// `<img src=...>`: rewrite `src` to the data URI, or replace the whole
/// tag with raw markup when the target is a vector graphic in source mode.
fn img_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let src_attr = attr_regexp("src");

    Ok(IMG
        .replace_all(&text, |caps: &regex::Captures| {
            let start = &caps[1];
            let attrs = &caps[2];
            let Some(src_caps) = src_attr.captures(attrs) else {
                return caps[0].to_string();
            };
            let src = src_caps[2].to_string();
            debug!("inline img: {src}");
            let Some(res) = engine.resolve_reference(&src, file, options) else {
                return caps[0].to_string();
            };
            if res.encoded {
                let rewritten = src_attr.replace(attrs, |c: &regex::Captures| {
                    format!("{}=\"{}\"", &c[1], res.data.to_text())
                });
                format!("{start}{rewritten}>")
            } else if is_svg_path(pathname(&src)) && use_source(options) {
                res.data.to_text().into_owned()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned())
}

/// Inline `<style>` bodies as embedded stylesheet fragments, then turn
/// `<link rel=stylesheet>` elements into `<style>` blocks, preserving a
/// `media` attribute and applying the rebase policy.
fn style_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();

    let pass = STYLE
        .replace_all(&text, |caps: &regex::Captures| {
            let fragment = engine.resolve_fragment(file, "css", caps[2].to_string(), options);
            format!("{}{}{}", &caps[1], fragment.data.to_text(), &caps[3])
        })
        .into_owned();

    let href_attr = attr_regexp("href");
    let media_attr = attr_regexp("media");
    let out = LINK
        .replace_all(&pass, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                return caps[0].to_string();
            }
            let link = &caps[0];
            if !has_attr_value(link, "rel", "stylesheet") {
                return link.to_string();
            }
            let Some(href) = href_attr.captures(link).map(|c| c[2].to_string()) else {
                return link.to_string();
            };
            debug!("inline link stylesheet: {href}");
            match engine.resolve_reference(&href, file, options) {
                Some(res) => {
                    let media = media_attr
                        .captures(link)
                        .map(|c| format!(" media=\"{}\"", &c[2]))
                        .unwrap_or_default();
                    let data = rebase_stylesheet(&res, file, options);
                    format!("<style{media}>{data}</style>")
                }
                None => link.to_string(),
            }
        })
        .into_owned();

    Ok(out)
}

/// `<link rel=import>`: splice the referenced document in place of the
/// link element.
fn import_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let href_attr = attr_regexp("href");

    Ok(LINK
        .replace_all(&text, |caps: &regex::Captures| {
            if caps.get(1).is_some() {
                return caps[0].to_string();
            }
            let link = &caps[0];
            if !has_attr_value(link, "rel", "import") {
                return link.to_string();
            }
            let Some(href) = href_attr.captures(link).map(|c| c[2].to_string()) else {
                return link.to_string();
            };
            match engine.resolve_reference(&href, file, options) {
                Some(res) => res.data.to_text().into_owned(),
                None => link.to_string(),
            }
        })
        .into_owned())
}

/// `<script src=...>` elements inline the referenced script (dropping the
/// `src` attribute); script bodies are processed as embedded fragments so
/// `document.write` and marker expansion apply inside them.
fn script_task(
    engine: &mut Engine<'_>,
    file: &mut FileRecord,
    options: &InlineOptions,
) -> anyhow::Result<String> {
    let text = file.data.to_text().into_owned();
    let src_attr = attr_regexp("src");

    Ok(replace_all_fancy(&SCRIPT, &text, |caps| {
        if caps.get(1).is_some() {
            return caps[0].to_string();
        }
        let start = &caps[2];
        let attrs = &caps[3];
        let body = &caps[4];
        let end = &caps[5];

        match src_attr.captures(attrs) {
            Some(src_caps) => {
                let src = src_caps[2].to_string();
                debug!("inline script: {src}");
                match engine.resolve_reference(&src, file, options) {
                    Some(res) => {
                        let stripped = src_attr.replace(attrs, "");
                        format!("{start}{stripped}{}{end}", res.data.to_text())
                    }
                    None => caps[0].to_string(),
                }
            }
            None => {
                let fragment = engine.resolve_fragment(file, "js", body.to_string(), options);
                format!("{start}{attrs}{}{end}", fragment.data.to_text())
            }
        }
    }))
}

fn compress(text: &str) -> String {
    text.lines().map(str::trim).collect::<Vec<_>>().join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_joins_trimmed_lines() {
        let html = "<html>\n    <body>\r\n        <p>hi</p>\n    </body>\n</html>";
        assert_eq!(compress(html), "<html><body><p>hi</p></body></html>");
    }
}
