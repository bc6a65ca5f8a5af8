//! Path and file-type utilities shared across the inlining pipeline.

pub mod file_kind;
pub mod path_utils;

pub use file_kind::{AssetKind, classify, is_font_path, is_img_path, is_svg_path};
pub use path_utils::{
    dirname, file_ext, is_local_path, join_relative, normalize_path, rebase_path,
};
