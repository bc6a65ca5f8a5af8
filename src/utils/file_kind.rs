//! Extension based asset classification.

use super::path_utils::file_ext;

/// Built-in asset categories. Custom processor types registered at runtime
/// are addressed by name and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Html,
    Css,
    Js,
    Img,
    Font,
    Svg,
}

impl AssetKind {
    /// The type name used as a registry key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Html => "html",
            AssetKind::Css => "css",
            AssetKind::Js => "js",
            AssetKind::Img => "img",
            AssetKind::Font => "font",
            AssetKind::Svg => "svg",
        }
    }
}

const HTML_EXTS: &[&str] = &["html", "xhtml", "htm", "tpl"];
const CSS_EXTS: &[&str] = &["css", "styl", "less", "sass", "scss"];
const JS_EXTS: &[&str] = &["js", "coffee", "ts", "dart"];
const IMG_EXTS: &[&str] = &["png", "jpg", "gif", "webp", "bmp"];
const FONT_EXTS: &[&str] = &["ttf", "otf", "woff", "eot"];
const SVG_EXTS: &[&str] = &["svg"];

fn ext_matches(exts: &[&str], path: &str) -> bool {
    let ext = file_ext(path).to_ascii_lowercase();
    exts.contains(&ext.as_str())
}

/// Classify a path by its extension, case-insensitively.
#[must_use]
pub fn classify(path: &str) -> Option<AssetKind> {
    let ext = file_ext(path).to_ascii_lowercase();
    let ext = ext.as_str();
    if HTML_EXTS.contains(&ext) {
        Some(AssetKind::Html)
    } else if CSS_EXTS.contains(&ext) {
        Some(AssetKind::Css)
    } else if JS_EXTS.contains(&ext) {
        Some(AssetKind::Js)
    } else if IMG_EXTS.contains(&ext) {
        Some(AssetKind::Img)
    } else if FONT_EXTS.contains(&ext) {
        Some(AssetKind::Font)
    } else if SVG_EXTS.contains(&ext) {
        Some(AssetKind::Svg)
    } else {
        None
    }
}

#[must_use]
pub fn is_img_path(path: &str) -> bool {
    ext_matches(IMG_EXTS, path)
}

#[must_use]
pub fn is_font_path(path: &str) -> bool {
    ext_matches(FONT_EXTS, path)
}

#[must_use]
pub fn is_svg_path(path: &str) -> bool {
    ext_matches(SVG_EXTS, path)
}
