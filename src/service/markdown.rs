//! Markdown to HTML rendering.

use pulldown_cmark::{Options, Parser, html};

/// Render Markdown to a standalone HTML document.
///
/// Input is decoded as UTF-8 with invalid sequences replaced, so this
/// never fails. Tables, strikethrough, task lists and footnotes are
/// enabled.
pub fn render(markdown: &[u8]) -> String {
    let source = String::from_utf8_lossy(markdown);

    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);

    let parser = Parser::new_ext(&source, options);
    let mut body = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n{}</body>\n</html>\n",
        body
    )
}
