//! Run configuration for the inliner.
//!
//! An [`InlineOptions`] tree is read-only for the duration of a run. When a
//! nested resolution needs different behavior (a stylesheet context forcing
//! vector graphics into data-URI form, for instance), the engine clones the
//! tree and mutates the clone; the ambient options are never touched.
//! Function-valued fields live behind `Arc` so the clone stays cheap.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::resolver::FileRecord;
use crate::utils::{dirname, is_local_path, join_relative, normalize_path, rebase_path};

/// Caller-supplied compressor: receives the content and the opaque
/// per-type compress options, returns the compressed content.
pub type CompressFn = Arc<dyn Fn(&str, &serde_json::Value) -> anyhow::Result<String> + Send + Sync>;

/// Custom rebase strategy: `(url, source_path, target_path, tools)` to the
/// rewritten reference, or `None` to keep the reference as written.
pub type RebaseFn =
    Arc<dyn Fn(&str, &str, &str, &RebaseTools) -> Option<String> + Send + Sync>;

/// Predicate exempting individual urls from rebasing (template
/// placeholders and the like).
pub type RebaseIgnoreFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Custom reference-resolution hook: maps the reference text found in a
/// document (plus the file it was found in) to the path to inline, with an
/// optional base-directory override. Returning `None` skips inlining.
pub type PathResolverFn =
    Arc<dyn Fn(&str, &FileRecord) -> Option<PathRewrite> + Send + Sync>;

/// Result of a [`PathResolverFn`]: the reference to resolve and, when set,
/// the directory it should be resolved against instead of the referencing
/// file's own directory.
#[derive(Debug, Clone)]
pub struct PathRewrite {
    pub path: String,
    pub directory: Option<String>,
}

impl PathRewrite {
    /// A rewrite that keeps the default base directory.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        PathRewrite {
            path: path.into(),
            directory: None,
        }
    }
}

/// Path helpers handed to custom rebase strategies.
pub struct RebaseTools;

impl RebaseTools {
    #[must_use]
    pub fn is_local(&self, url: &str) -> bool {
        is_local_path(url)
    }

    /// Resolve a reference against the directory of the given file path.
    #[must_use]
    pub fn resolve(&self, url: &str, refer_file: &str) -> String {
        join_relative(dirname(refer_file), url)
    }

    /// The default relative rebase.
    #[must_use]
    pub fn rebase(&self, url: &str, refer_file: &str, target_file: &str) -> String {
        rebase_path(url, refer_file, target_file)
    }
}

/// How url references inside an inlined stylesheet are rewritten.
#[derive(Clone, Default)]
pub enum RebaseMode {
    /// Leave references as written.
    #[default]
    Disabled,
    /// Rewrite relative to the destination file's directory.
    Relative,
    /// Rewrite to a root-absolute path.
    Absolute,
    /// Caller-supplied strategy.
    Custom(RebaseFn),
}

/// Rebase policy for stylesheet references.
#[derive(Clone, Default)]
pub struct RebaseConfig {
    pub mode: RebaseMode,
    pub ignore: Option<RebaseIgnoreFn>,
}

impl RebaseConfig {
    #[must_use]
    pub fn relative() -> Self {
        RebaseConfig {
            mode: RebaseMode::Relative,
            ignore: None,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        !matches!(self.mode, RebaseMode::Disabled)
    }
}

/// Compression switch for one asset type. Disabled by default; `options`
/// is opaque and only interpreted by a caller-supplied `custom` compressor.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    pub enabled: bool,
    pub options: serde_json::Value,
    #[serde(skip)]
    pub custom: Option<CompressFn>,
}

impl CompressConfig {
    #[must_use]
    pub fn enabled() -> Self {
        CompressConfig {
            enabled: true,
            ..CompressConfig::default()
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImgOptions {
    /// Inline only files of at most this many bytes.
    pub limit: Option<u64>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontOptions {
    pub limit: Option<u64>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SvgOptions {
    /// Splice the raw markup instead of a data URI. Stylesheet contexts
    /// always use data URIs regardless of this flag.
    pub use_source: bool,
    pub limit: Option<u64>,
    /// Only applies in source mode; data URIs are never compressed.
    pub compress: CompressConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CssOptions {
    pub compress: CompressConfig,
    #[serde(skip)]
    pub rebase: RebaseConfig,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsOptions {
    pub compress: CompressConfig,
    /// Enable `__inline("path")` marker expansion.
    pub custom: bool,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlOptions {
    pub compress: CompressConfig,
}

/// Options for a custom-registered processor type.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomTypeOptions {
    pub compress: CompressConfig,
    pub limit: Option<u64>,
}

/// Matches file paths for target selection and compression exemption.
/// Slash-free glob patterns match against the basename, so `"*.min.css"`
/// exempts minified stylesheets anywhere in the tree.
#[derive(Clone)]
pub enum PathMatcher {
    Exact(String),
    Pattern(glob::Pattern),
    Regex(regex::Regex),
}

impl PathMatcher {
    pub fn glob(pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(PathMatcher::Pattern(glob::Pattern::new(pattern)?))
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize_path(path);
        match self {
            PathMatcher::Exact(expected) => normalize_path(expected) == path,
            PathMatcher::Pattern(pattern) => {
                if pattern.as_str().contains('/') {
                    pattern.matches(&path)
                } else {
                    let basename = path.rsplit('/').next().unwrap_or(&path);
                    pattern.matches(basename)
                }
            }
            PathMatcher::Regex(re) => re.is_match(&path),
        }
    }
}

/// One entry of the target file set: either a matcher applied to the root
/// tree (or the virtual file map), or literal in-memory content.
#[derive(Clone)]
pub enum FileSelector {
    Match(PathMatcher),
    Content { path: String, data: Vec<u8> },
}

impl FileSelector {
    pub fn glob(pattern: &str) -> Result<Self, glob::PatternError> {
        Ok(FileSelector::Match(PathMatcher::glob(pattern)?))
    }

    #[must_use]
    pub fn exact(path: impl Into<String>) -> Self {
        FileSelector::Match(PathMatcher::Exact(path.into()))
    }

    #[must_use]
    pub fn content(path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        FileSelector::Content {
            path: path.into(),
            data: data.into(),
        }
    }
}

/// Configuration for one inline run. All six built-in types are enabled by
/// default; set a type's field to `None` to disable it entirely.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InlineOptions {
    /// Directory all relative paths resolve under.
    pub root: PathBuf,
    /// Target file selection, in result order.
    #[serde(skip)]
    pub files: Vec<FileSelector>,
    /// Virtual files, keyed by root-relative path. Seeds the run's cache;
    /// when non-empty, target matching runs against these keys instead of
    /// walking the root.
    pub file_map: HashMap<String, Vec<u8>>,
    /// Output directory relative to `root`. `None` keeps results in memory.
    pub output: Option<PathBuf>,
    /// Extension to type-name overrides, e.g. `"mustache" -> "html"`.
    pub processor: HashMap<String, String>,
    #[serde(skip)]
    pub inline_path_resolver: Option<PathResolverFn>,
    /// Inline every local reference instead of only opted-in ones.
    pub inline_all: bool,
    /// Query parameter that opts a reference in. Its value, when non-empty,
    /// overrides the base directory the reference resolves against.
    pub inline_param_name: String,
    #[serde(skip)]
    pub ignore_compress_files: Vec<PathMatcher>,
    pub img: Option<ImgOptions>,
    pub font: Option<FontOptions>,
    pub svg: Option<SvgOptions>,
    pub css: Option<CssOptions>,
    pub js: Option<JsOptions>,
    pub html: Option<HtmlOptions>,
    /// Options for custom-registered types, keyed by type name.
    pub extra: HashMap<String, CustomTypeOptions>,
}

impl Default for InlineOptions {
    fn default() -> Self {
        InlineOptions {
            root: PathBuf::from("."),
            files: Vec::new(),
            file_map: HashMap::new(),
            output: None,
            processor: HashMap::new(),
            inline_path_resolver: None,
            inline_all: false,
            inline_param_name: "_inline".to_string(),
            ignore_compress_files: Vec::new(),
            img: Some(ImgOptions::default()),
            font: Some(FontOptions::default()),
            svg: Some(SvgOptions::default()),
            css: Some(CssOptions::default()),
            js: Some(JsOptions::default()),
            html: Some(HtmlOptions::default()),
            extra: HashMap::new(),
        }
    }
}

impl InlineOptions {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        InlineOptions {
            root: root.into(),
            ..InlineOptions::default()
        }
    }

    #[must_use]
    pub fn with_files(mut self, files: Vec<FileSelector>) -> Self {
        self.files = files;
        self
    }

    #[must_use]
    pub fn with_file_map(mut self, file_map: HashMap<String, Vec<u8>>) -> Self {
        self.file_map = file_map;
        self
    }

    #[must_use]
    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    #[must_use]
    pub fn with_inline_all(mut self, inline_all: bool) -> Self {
        self.inline_all = inline_all;
        self
    }

    #[must_use]
    pub fn with_inline_param_name(mut self, name: impl Into<String>) -> Self {
        self.inline_param_name = name.into();
        self
    }

    #[must_use]
    pub fn with_path_resolver(mut self, resolver: PathResolverFn) -> Self {
        self.inline_path_resolver = Some(resolver);
        self
    }

    /// The compress switch for a type name, when that type carries one.
    #[must_use]
    pub fn compress_config(&self, type_name: &str) -> Option<&CompressConfig> {
        match type_name {
            "css" => self.css.as_ref().map(|o| &o.compress),
            "js" => self.js.as_ref().map(|o| &o.compress),
            "html" => self.html.as_ref().map(|o| &o.compress),
            "svg" => self.svg.as_ref().map(|o| &o.compress),
            "img" | "font" => None,
            other => self.extra.get(other).map(|o| &o.compress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_all_types() {
        let options = InlineOptions::default();
        assert!(options.img.is_some());
        assert!(options.font.is_some());
        assert!(options.svg.is_some());
        assert!(options.css.is_some());
        assert!(options.js.is_some());
        assert!(options.html.is_some());
        assert_eq!(options.inline_param_name, "_inline");
        assert!(!options.inline_all);
    }

    #[test]
    fn test_matcher_basename_globs() {
        let matcher = PathMatcher::glob("*.min.css").unwrap();
        assert!(matcher.matches("deep/nested/app.min.css"));
        assert!(!matcher.matches("deep/nested/app.css"));

        let anchored = PathMatcher::glob("vendor/**/*.js").unwrap();
        assert!(anchored.matches("vendor/a/b/c.js"));
        assert!(!anchored.matches("src/a.js"));
    }

    #[test]
    fn test_matcher_exact_normalizes() {
        let matcher = PathMatcher::Exact("a/./b.css".to_string());
        assert!(matcher.matches("a/b.css"));
    }

    #[test]
    fn test_rebase_tools() {
        let tools = RebaseTools;
        assert!(tools.is_local("a/b.png"));
        assert!(!tools.is_local("http://x/a.png"));
        assert_eq!(tools.resolve("../a.png", "css/main.css"), "a.png");
        assert_eq!(tools.rebase("a.png", "x/s.css", "y/p.html"), "../x/a.png");
    }
}
