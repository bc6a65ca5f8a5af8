//! End-to-end markup inlining scenarios.

mod common;

use common::Fixture;
use inline_assets::{CompressConfig, FileSelector, InlineOptions, inline};

fn options_for(fixture: &Fixture, files: Vec<FileSelector>) -> InlineOptions {
    InlineOptions::new(fixture.root()).with_files(files)
}

#[test]
fn img_src_becomes_data_uri() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<html><body><img src=\"img/dot.png?_inline\" alt=\"dot\"></body></html>",
        )
        .write("img/dot.png", b"PNGDATA");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(data.contains("<img src=\"data:image/png;base64,UE5HREFUQQ==\" alt=\"dot\">"));
}

#[test]
fn missing_img_reference_is_left_untouched() {
    let fixture = Fixture::new();
    fixture.write("page.html", "<img src=\"gone.png?_inline\">");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    assert_eq!(result[0].data.to_text(), "<img src=\"gone.png?_inline\">");
}

#[test]
fn link_stylesheet_becomes_style_block_preserving_media() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<link rel=\"stylesheet\" media=\"screen\" href=\"css/a.css?_inline\">",
        )
        .write("css/a.css", ".a { top: 0; }");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    assert_eq!(
        result[0].data.to_text(),
        "<style media=\"screen\">.a { top: 0; }</style>"
    );
}

#[test]
fn commented_out_references_are_skipped() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            concat!(
                "<!-- <link rel=\"stylesheet\" href=\"css/a.css?_inline\"> -->\n",
                "<link rel=\"stylesheet\" href=\"css/a.css?_inline\">\n",
                "<!-- <script src=\"app.js?_inline\"></script> -->\n",
            ),
        )
        .write("css/a.css", ".a {}")
        .write("app.js", "var a = 1;");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(data.contains("<!-- <link rel=\"stylesheet\" href=\"css/a.css?_inline\"> -->"));
    assert!(data.contains("<style>.a {}</style>"));
    assert!(data.contains("<!-- <script src=\"app.js?_inline\"></script> -->"));
}

#[test]
fn style_block_content_is_processed_as_stylesheet() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<style>\n@import url('css/a.css?_inline');\n</style>",
        )
        .write("css/a.css", ".a { top: 0; }");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(!data.contains("@import"));
    assert!(data.contains(".a { top: 0; }"));
}

#[test]
fn script_src_is_inlined_and_attribute_stripped() {
    let fixture = Fixture::new();
    fixture
        .write("page.html", "<body>\n<script src=\"js/app.js?_inline\"></script>\n</body>")
        .write("js/app.js", "var app = 1;");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(data.contains("<script>var app = 1;</script>"));
    assert!(!data.contains("src="));
}

#[test]
fn script_block_document_write_is_expanded() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<body>\n<script>\ndocument.write('<script src=\"js/dep.js?_inline\"><\\/script>');\n</script>\n</body>",
        )
        .write("js/dep.js", "var dep = 1;");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(data.contains("var dep = 1;"));
    assert!(!data.contains("document.write"));
}

#[test]
fn link_import_splices_nested_document() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<body><link rel=\"import\" href=\"parts/widget.html?_inline\"></body>",
        )
        .write("parts/widget.html", "<div>widget</div>");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    assert_eq!(
        result[0].data.to_text(),
        "<body><div>widget</div></body>"
    );
}

#[test]
fn svg_object_data_uri_mode_rewrites_attribute() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<object data=\"icon.svg?_inline\" type=\"image/svg+xml\"></object>",
        )
        .write("icon.svg", "<svg><path /></svg>");

    let result = inline(&options_for(&fixture, vec![FileSelector::exact("page.html")])).unwrap();

    let data = result[0].data.to_text();
    assert!(data.starts_with("<object data=\"data:image/svg+xml;base64,"));
    assert!(data.ends_with("</object>"));
}

#[test]
fn svg_img_source_mode_replaces_whole_tag() {
    let fixture = Fixture::new();
    fixture
        .write("page.html", "<p><img src=\"icon.svg?_inline\" alt=\"i\"></p>")
        .write("icon.svg", "<svg>\n    <path />\n</svg>");

    let mut options = options_for(&fixture, vec![FileSelector::exact("page.html")]);
    {
        let svg = options.svg.as_mut().unwrap();
        svg.use_source = true;
        svg.compress = CompressConfig::enabled();
    }
    let result = inline(&options).unwrap();

    assert_eq!(result[0].data.to_text(), "<p><svg><path /></svg></p>");
}

#[test]
fn disabled_img_type_keeps_reference() {
    let fixture = Fixture::new();
    fixture
        .write("page.html", "<img src=\"dot.png?_inline\">")
        .write("dot.png", b"PNGDATA");

    let mut options = options_for(&fixture, vec![FileSelector::exact("page.html")]);
    options.img = None;
    let result = inline(&options).unwrap();

    assert_eq!(result[0].data.to_text(), "<img src=\"dot.png?_inline\">");
}

#[test]
fn nested_markup_compresses_but_top_level_does_not() {
    let fixture = Fixture::new();
    fixture
        .write(
            "page.html",
            "<body>\n    <link rel=\"import\" href=\"parts/w.html?_inline\">\n</body>",
        )
        .write("parts/w.html", "<div>\n    <span>w</span>\n</div>");

    let mut options = options_for(&fixture, vec![FileSelector::exact("page.html")]);
    options.html.as_mut().unwrap().compress = CompressConfig::enabled();
    let result = inline(&options).unwrap();

    let data = result[0].data.to_text();
    // nested document collapsed, enclosing page kept its line structure
    assert!(data.contains("<div><span>w</span></div>"));
    assert!(data.contains("<body>\n"));
}
