use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").expect("date pattern compiles"));

/// Visible text of an element: every text node trimmed, blanks dropped,
/// inner whitespace runs collapsed, pieces joined by single spaces.
pub fn extract_text(node: ElementRef) -> String {
    collapse_text(node.text())
}

/// Text nodes of an element trimmed and glued together with no separator.
/// `<td>15/03/2024<span>(F)</span></td>` reads `15/03/2024(F)`.
pub fn extract_stripped_text(node: ElementRef) -> String {
    node.text().map(str::trim).collect()
}

/// Same as [`extract_text`] for a markup fragment such as the ones the search
/// endpoint embeds in its JSON.
pub fn strip_html(fragment: &str) -> String {
    let fragment = Html::parse_fragment(fragment);
    collapse_text(fragment.root_element().text())
}

fn collapse_text<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `DD/MM/YYYY` occurrence in `text`.
pub fn find_first_date(text: &str) -> Option<&str> {
    DATE_PATTERN.find(text).map(|m| m.as_str())
}

/// Absolute form of `href` as seen from `base`. Absolute hrefs pass through.
pub fn get_html_link_to_page(base: &Url, href: &str) -> Option<String> {
    base.join(href).ok().map(String::from)
}
