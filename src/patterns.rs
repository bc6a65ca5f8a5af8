//! Extraction pattern library plus the small text helpers built on it.
//!
//! Every pattern is a lazily compiled static whose doc comment states the
//! capture-group contract the processors rely on. Patterns that need
//! backreferences or lookarounds are compiled with `fancy_regex`; the rest
//! use the plain `regex` engine.
//!
//! Scanning patterns over markup and scripts carry the source's comment
//! syntax as a leading alternation in capture group 1: when group 1 matches,
//! the processor must emit the match unchanged so commented-out references
//! are never rewritten.

use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;

/// `url(...)` values in stylesheets. Group 1: the reference (quotes and
/// surrounding whitespace stripped, query/fragment kept).
pub static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\s*\(\s*['"]?\s*([^'")]+)\s*['"]?\s*\)"#)
        .expect("CSS_URL: hardcoded regex is valid")
});

/// `@import` statements, with or without `url()`. Group 1: the stylesheet
/// reference; group 2: the trailing media-query text before `;`.
pub static CSS_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\s*\(\s*)?['"]?\s*([^'")]+)\s*['"]?(?:\s*\))?([^;]*);"#)
        .expect("CSS_IMPORT: hardcoded regex is valid")
});

/// `src=` values in filter expressions (IE AlphaImageLoader). Group 1: the
/// quote character, group 2: the reference. Needs a backreference.
pub static CSS_SRC: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(r#"\bsrc\s*=\s*('|")([^'"\s)]+)\1"#)
        .expect("CSS_SRC: hardcoded regex is valid")
});

/// `image-set(...)` bodies written without `url()`. Group 1: the quoted
/// candidate list up to the closing paren.
pub static CSS_IMAGE_SET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"image-set\(\s*(['"][\s\S]*?)\)"#)
        .expect("CSS_IMAGE_SET: hardcoded regex is valid")
});

/// `<link ...>` elements. Group 1: an HTML comment when the match is inside
/// one (emit unchanged); otherwise group 0 is the whole element including an
/// optional closing `</link>`.
pub static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<!--[\s\S]*?)(?:-->|$)|<link\s+[^>]+?/?>(?:\s*</link>)?"#)
        .expect("LINK: hardcoded regex is valid")
});

/// `<img ...>` elements. Group 1: the opening `<img` plus following
/// whitespace; group 2: the attribute text.
pub static IMG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\s*)(\s[^>]+?)/?>"#).expect("IMG: hardcoded regex is valid")
});

/// `<object>`/`<embed>` elements with bodies. Group 1: the opening tag,
/// group 2: the tag name, group 3: body plus closing tag. Needs a
/// backreference on the tag name.
pub static OBJECT: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(r#"(?i)(<(object|embed)(?:\s+[^>]*?>|>))([\s\S]*?</\2>)"#)
        .expect("OBJECT: hardcoded regex is valid")
});

/// `<style>` elements. Group 1: opening tag, group 2: body, group 3:
/// closing tag.
pub static STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<style(?:\s+[^>]*?>|>))([\s\S]*?)(</style>)"#)
        .expect("STYLE: hardcoded regex is valid")
});

/// `<script>` elements, skipping HTML comments. Group 1: comment text when
/// inside one (emit unchanged); otherwise group 2: leading text plus
/// `<script`, group 3: attribute text with `>`, group 4: body, group 5:
/// closing tag. Needs lookarounds.
pub static SCRIPT: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(
        r#"(?i)(<!--[\s\S]*?)(?:-->|$)|(?=[^'"\s])(\s*<script)(\s+[^>]*?>|>)([\s\S]*?)(</script>\s*)"#,
    )
    .expect("SCRIPT: hardcoded regex is valid")
});

/// `document.write('...')` statements, skipping JS comments. Group 1:
/// comment text when inside one (emit unchanged); group 2: the written
/// string body.
pub static DOCUMENT_WRITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"((?:/\*[\s\S]*?\*/)|(?://[^\n]*))|document\.write\s*\(\s*['"]([\s\S]+?)['"]\s*\)\s*;?"#)
        .expect("DOCUMENT_WRITE: hardcoded regex is valid")
});

/// `__inline("path")` markers, optionally on the right of an assignment.
/// Group 1: the assignment prefix (` = `) when present, group 2: the quote
/// (possibly escaped), group 3: the path. Needs a backreference.
pub static CUSTOM_INLINE: LazyLock<fancy_regex::Regex> = LazyLock::new(|| {
    fancy_regex::Regex::new(r#"(\s*=\s*)?['"]?__inline\((\\?['"])([^'"]+)\2\)['"]?"#)
        .expect("CUSTOM_INLINE: hardcoded regex is valid")
});

/// Build a pattern extracting the value of one HTML attribute. Group 1:
/// leading whitespace plus the attribute name, group 2: the value.
pub fn attr_regexp(attr_name: &str) -> Regex {
    Regex::new(&format!(
        r#"(?i)(\s+{}\s*)=\s*['"]([^'"]+)['"]"#,
        regex::escape(attr_name)
    ))
    .expect("attr_regexp: escaped attribute pattern is valid")
}

/// Whether a tag's attribute text contains `name="value"`.
#[must_use]
pub fn has_attr_value(attr_str: &str, attr_name: &str, attr_value: &str) -> bool {
    let pattern = format!(
        r#"(?i)\s*{}\s*=\s*['"]{}['"]"#,
        regex::escape(attr_name),
        regex::escape(attr_value)
    );
    Regex::new(&pattern)
        .expect("has_attr_value: escaped attribute pattern is valid")
        .is_match(attr_str)
}

/// Replace every occurrence of `url` in `source`, but only where it is
/// preceded by a reference delimiter or the start of the text. Keeps other
/// text containing the url as a substring untouched.
#[must_use]
pub fn replace_url(source: &str, url: &str, replacement: &str) -> String {
    if url.is_empty() || url == replacement {
        return source.to_string();
    }
    let pattern = format!(r#"(['"(\s,]|^){}"#, regex::escape(url));
    let re = Regex::new(&pattern).expect("replace_url: escaped url pattern is valid");
    re.replace_all(source, |caps: &regex::Captures| {
        format!("{}{}", &caps[1], replacement)
    })
    .into_owned()
}

/// Encode file content as a base64 data URI, guessing the media type from
/// the path.
#[must_use]
pub fn to_data_uri(path: &str, content: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{};base64,{}", mime, BASE64.encode(content))
}

/// Encode text as a JS string expression: one quoted literal per line,
/// joined with `+`, quotes and backslashes escaped. Blank rows after the
/// first are dropped so the expression stays readable.
#[must_use]
pub fn text_to_js(data: &str) -> String {
    let escaped = data.replace('\\', "\\\\").replace('\'', "\\'");
    let content = format!("\n{escaped}");

    let mut rows = Vec::new();
    for (index, row) in content
        .split('\n')
        .map(|r| r.strip_suffix('\r').unwrap_or(r))
        .enumerate()
    {
        let row = row.trim_end();
        if index == 0 || !row.trim_start().is_empty() {
            let indent_len = row.len() - row.trim_start().len();
            rows.push(format!("{}'{}'", &row[..indent_len], &row[indent_len..]));
        }
    }

    rows.join("\n    + ")
}

/// `replace_all` for `fancy_regex` patterns: the crate's iterator yields
/// `Result` per match, so replacement is a manual splice loop. A match that
/// fails to evaluate (backtracking limit) is kept as-is.
pub fn replace_all_fancy<F>(re: &fancy_regex::Regex, text: &str, mut replace: F) -> String
where
    F: FnMut(&fancy_regex::Captures) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in re.captures_iter(text) {
        let Ok(caps) = caps else { break };
        let whole = caps.get(0).expect("capture 0 always present");
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replace(&caps));
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn css_urls(text: &str) -> Vec<String> {
        CSS_URL
            .captures_iter(text)
            .map(|c| c[1].to_string())
            .collect()
    }

    #[test]
    fn test_css_url_extraction() {
        assert_eq!(css_urls(r#"url("a/b.png")"#), vec!["a/b.png"]);
        assert_eq!(
            css_urls("background: url(\"a/b.png\"); \r\n background: url( c/d.png?23#sd )"),
            vec!["a/b.png", "c/d.png?23#sd "]
        );
    }

    #[test]
    fn test_css_import_extraction() {
        let css = "@import url('import/a.css');\n@import \"import/b.css\" screen and (min-width: 100px);";
        let items: Vec<(String, String)> = CSS_IMPORT
            .captures_iter(css)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect();
        assert_eq!(items[0].0, "import/a.css");
        assert_eq!(items[1].0, "import/b.css");
        assert_eq!(items[1].1.trim(), "screen and (min-width: 100px)");
    }

    #[test]
    fn test_css_src_extraction() {
        let css = "filter: progid:DXImageTransform.Microsoft.AlphaImageLoader(src='img/bg.png');";
        let caps = CSS_SRC.captures(css).unwrap().unwrap();
        assert_eq!(&caps[2], "img/bg.png");
    }

    #[test]
    fn test_link_skips_comments() {
        let html = "<!-- <link href=\"a.css\" rel=\"stylesheet\" /> -->\n<link href=\"b.css\" rel=\"stylesheet\" />";
        let links: Vec<String> = LINK
            .captures_iter(html)
            .filter(|c| c.get(1).is_none())
            .map(|c| c[0].to_string())
            .collect();
        assert_eq!(links, vec!["<link href=\"b.css\" rel=\"stylesheet\" />"]);
    }

    #[test]
    fn test_style_extraction() {
        let html = "<style >\n  body{width: 100%;}\n</style>";
        let caps = STYLE.captures(html).unwrap();
        assert_eq!(&caps[1], "<style >");
        assert_eq!(&caps[2], "\n  body{width: 100%;}\n");
        assert_eq!(&caps[3], "</style>");
    }

    #[test]
    fn test_script_extraction_skips_comments() {
        let html = "<!-- <script src=\"a.js\"></script> -->\n<script src=\"b.js\"></script>";
        let mut srcs = Vec::new();
        for caps in SCRIPT.captures_iter(html) {
            let caps = caps.unwrap();
            if caps.get(1).is_some() {
                continue;
            }
            srcs.push(caps[3].to_string());
        }
        assert_eq!(srcs, vec![" src=\"b.js\">"]);
    }

    #[test]
    fn test_document_write_skips_comments() {
        let js = "// document.write('<script src=\"a.js\"></script>');\ndocument.write('<script src=\"b.js\"></script>');";
        let mut bodies = Vec::new();
        for caps in DOCUMENT_WRITE.captures_iter(js) {
            if caps.get(1).is_some() {
                continue;
            }
            bodies.push(caps[2].to_string());
        }
        assert_eq!(bodies, vec!["<script src=\"b.js\"></script>"]);
    }

    #[test]
    fn test_custom_inline_marker() {
        let js = "var tpl = '__inline(\"a/b.tpl\")';\n__inline('c.js');";
        let mut items = Vec::new();
        for caps in CUSTOM_INLINE.captures_iter(js) {
            let caps = caps.unwrap();
            items.push((caps.get(1).is_some(), caps[3].to_string()));
        }
        assert_eq!(items, vec![(true, "a/b.tpl".into()), (false, "c.js".into())]);
    }

    #[test]
    fn test_attr_regexp() {
        let re = attr_regexp("src");
        let caps = re.captures("<img  src=\"a.png\" alt=\"x\">").unwrap();
        assert_eq!(&caps[2], "a.png");
        assert!(attr_regexp("href").captures("<link SRC='a'>").is_none());
    }

    #[test]
    fn test_has_attr_value() {
        assert!(has_attr_value(" rel=\"stylesheet\" href=\"a\"", "rel", "stylesheet"));
        assert!(!has_attr_value(" rel=\"import\"", "rel", "stylesheet"));
    }

    #[test]
    fn test_replace_url_respects_delimiters() {
        let out = replace_url("url(a.png) b/a.png 'a.png'", "a.png", "DATA");
        assert_eq!(out, "url(DATA) b/a.png 'DATA'");
    }

    #[test]
    fn test_to_data_uri() {
        let uri = to_data_uri("x/logo.png", b"abc");
        assert_eq!(uri, "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_text_to_js() {
        let out = text_to_js("<b>hi</b>");
        assert_eq!(out, "''\n    + '<b>hi</b>'");

        // the quote opens after each row's original indentation
        let out = text_to_js("a'b\n\n  c\\d");
        assert_eq!(out, concat!("''", "\n    + ", "'a\\'b'", "\n    + ", "  'c\\\\d'"));
    }
}
