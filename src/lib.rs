//! Recursive static-asset inlining.
//!
//! Given a set of host documents, `inline_assets` scans them for references
//! to local stylesheets, scripts, images, fonts, vector graphics and nested
//! markup fragments, resolves each reference (recursively inlining the
//! referenced file first), and splices the result back in as a base64 data
//! URI or as raw source. The output is a self-contained document with no
//! external local dependencies.
//!
//! References opt in through a query parameter (`_inline` by default):
//!
//! ```html
//! <link href="css/main.css?_inline" rel="stylesheet" />
//! <img src="img/logo.png?_inline" />
//! ```
//!
//! or everything local is inlined when [`InlineOptions::inline_all`] is set.
//!
//! ```no_run
//! use inline_assets::{FileSelector, InlineOptions, inline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let options = InlineOptions::new("site")
//!     .with_files(vec![FileSelector::glob("*.html")?])
//!     .with_inline_all(true);
//! for file in inline(&options)? {
//!     println!("{}: {} bytes", file.path, file.data.as_bytes().len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Scanning is pattern-based, not a full parse: well-formed documents are
//! rewritten reliably, pathological markup may not be. Remote references
//! (scheme or protocol-relative) are always left untouched.

pub mod engine;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod patterns;
pub mod processors;
pub mod resolver;
pub mod utils;

pub use engine::Engine;
pub use engine::registry::{
    EnableFn, ProcessorCompressFn, ProcessorRegistry, ProcessorSpec, TaskDecl, TaskFn, TaskHandle,
};
pub use error::InlineError;
pub use options::{
    CompressConfig, CompressFn, CssOptions, CustomTypeOptions, FileSelector, FontOptions,
    HtmlOptions, ImgOptions, InlineOptions, JsOptions, PathMatcher, PathResolverFn, PathRewrite,
    RebaseConfig, RebaseFn, RebaseMode, RebaseTools, SvgOptions,
};
pub use orchestrator::{Inliner, inline};
pub use resolver::{FileData, FileRecord};
pub use utils::AssetKind;
