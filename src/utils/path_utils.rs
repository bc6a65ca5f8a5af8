//! Pure path algebra: local/remote classification, normalization, joining
//! and rebasing of the relative references found inside documents.
//!
//! All paths handled here are forward-slash strings relative to the run's
//! root directory. Query strings and fragments travel along as opaque path
//! suffixes; normalization only folds `.`/`..` segments and separators.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Matches a URL scheme prefix (`http:`, `data:`, `chrome-extension:`, ...).
static SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z][a-z0-9+\-.]+:").expect("SCHEME_RE: hardcoded regex is valid")
});

/// A path is remote when it carries a scheme prefix or is protocol-relative
/// (`//cdn.example.com/...`). Everything else, including bare relative and
/// absolute-without-scheme paths, is local and eligible for inlining.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    !(path.starts_with("//") || SCHEME_RE.is_match(path))
}

/// Extension of a path, without the leading dot. Empty when there is none.
#[must_use]
pub fn file_ext(path: &str) -> &str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => &name[idx + 1..],
        _ => "",
    }
}

/// Directory part of a path, `.` when there is none.
#[must_use]
pub fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// Normalize a path to forward slashes, folding `.` and `..` segments.
/// Leading `..` segments of a relative path are preserved (there is nothing
/// to fold them into).
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for seg in unified.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(&"..")) || (parts.is_empty() && !absolute) {
                    parts.push("..");
                } else {
                    parts.pop();
                }
            }
            seg => parts.push(seg),
        }
    }

    let mut joined = parts.join("/");
    if absolute {
        joined.insert(0, '/');
    }
    if joined.is_empty() {
        joined.push('.');
    }
    joined
}

/// Join a reference against a directory and normalize the result.
#[must_use]
pub fn join_relative(dir: &str, path: &str) -> String {
    if dir.is_empty() || dir == "." {
        return normalize_path(path);
    }
    normalize_path(&format!("{dir}/{path}"))
}

/// Rewrite `url`, originally written relative to `refer_file`'s directory,
/// so that it resolves to the same file from `target_file`'s directory.
///
/// Any query string or fragment on `url` is preserved verbatim since it is
/// carried through the join as ordinary path text.
#[must_use]
pub fn rebase_path(url: &str, refer_file: &str, target_file: &str) -> String {
    let refer_dir = dirname(refer_file);
    let target_dir = dirname(target_file);

    let relative = pathdiff::diff_paths(Path::new(refer_dir), Path::new(target_dir));
    match relative {
        Some(rel) => {
            let rel = rel.to_string_lossy().replace('\\', "/");
            join_relative(&rel, url)
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_path_detection() {
        assert!(is_local_path("a/b.css"));
        assert!(is_local_path("../img/logo.png"));
        assert!(is_local_path("/assets/app.js"));
        assert!(!is_local_path("//cdn.example.com/app.js"));
        assert!(!is_local_path("http://example.com/a.css"));
        assert!(!is_local_path("HTTPS://example.com/a.css"));
        assert!(!is_local_path("data:image/png;base64,xxxx"));
    }

    #[test]
    fn test_file_ext() {
        assert_eq!(file_ext("a/b/main.less"), "less");
        assert_eq!(file_ext("archive.tar.gz"), "gz");
        assert_eq!(file_ext("no-extension"), "");
        assert_eq!(file_ext("trailing."), "");
        assert_eq!(file_ext("dir.v2/readme"), "");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("a//b/./c"), "a/b/c");
        assert_eq!(normalize_path("a/b/../c.png"), "a/c.png");
        assert_eq!(normalize_path("../x/y"), "../x/y");
        assert_eq!(normalize_path(r"win\style\a.css"), "win/style/a.css");
        assert_eq!(normalize_path("/a/../b"), "/b");
    }

    #[test]
    fn test_join_relative() {
        assert_eq!(join_relative("x", "a/b.png"), "x/a/b.png");
        assert_eq!(join_relative("x/y", "../b.png"), "x/b.png");
        assert_eq!(join_relative(".", "b.png"), "b.png");
    }

    #[test]
    fn test_rebase_round_trip() {
        // url(a/b.png) in x/style.css, inlined into y/page.html: the rebased
        // reference must still point at x/a/b.png when resolved from y/.
        let rebased = rebase_path("a/b.png", "x/style.css", "y/page.html");
        assert_eq!(rebased, "../x/a/b.png");
        assert_eq!(join_relative(dirname("y/page.html"), &rebased), "x/a/b.png");
    }

    #[test]
    fn test_rebase_keeps_query() {
        let rebased = rebase_path(
            "../fonts/icomoon.eot?-c0lvak",
            "css/font.css",
            "page.html",
        );
        assert_eq!(rebased, "fonts/icomoon.eot?-c0lvak");
    }
}
