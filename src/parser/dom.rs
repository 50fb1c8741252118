//! Thin query layer over `scraper`: find by tag, find by class attribute,
//! read text, read attributes. Selectors are compiled once.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub static PARAGRAPH_ANCHOR: LazyLock<Selector> = LazyLock::new(|| tag_within("p", "a"));
pub static CELL_ANCHOR: LazyLock<Selector> = LazyLock::new(|| tag_within("td", "a"));
pub static FORM: LazyLock<Selector> = LazyLock::new(|| by_class("div", "ann_form"));
pub static FORM_TABLE: LazyLock<Selector> =
    LazyLock::new(|| by_class("div", "ann_form_table_basic"));
pub static ROW: LazyLock<Selector> = LazyLock::new(|| by_tag("tr"));
pub static HEADER_CELL: LazyLock<Selector> = LazyLock::new(|| by_tag("th"));
pub static DATA_CELL: LazyLock<Selector> = LazyLock::new(|| by_tag("td"));

pub fn by_tag(tag: &str) -> Selector {
    Selector::parse(tag).unwrap()
}

pub fn tag_within(outer: &str, inner: &str) -> Selector {
    Selector::parse(&format!("{outer} {inner}")).unwrap()
}

/// Exact match on the whole `class` attribute, not on one class token.
pub fn by_class(tag: &str, class: &str) -> Selector {
    Selector::parse(&format!(r#"{tag}[class="{class}"]"#)).unwrap()
}

pub fn document(html: &str) -> Html {
    Html::parse_document(html)
}

pub fn fragment(markup: &str) -> Html {
    Html::parse_fragment(markup)
}

/// Concatenated text of every descendant text node.
pub fn text(element: ElementRef) -> String {
    element.text().collect()
}

pub fn trimmed_text(element: ElementRef) -> String {
    text(element).trim().to_string()
}

/// Concatenated text of every `selector` match below `element`.
pub fn joined_text(element: ElementRef, selector: &Selector) -> String {
    element.select(selector).map(text).collect()
}

/// Attribute value, treating an empty value like a missing one.
pub fn attr<'a>(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_match_is_exact() {
        let html = fragment(
            r#"<div class="ann_form">a</div><div class="ann_form wide">b</div><div class="ann_form_table_basic">c</div>"#,
        );
        let hits: Vec<String> = html.select(&FORM).map(text).collect();
        assert_eq!(hits, vec!["a"]);
    }

    #[test]
    fn joined_text_concatenates_in_order() {
        let html = fragment("<table><tr><td>1 </td><td>2</td></tr></table>");
        let row = html.select(&ROW).next().unwrap();
        assert_eq!(joined_text(row, &DATA_CELL), "1 2");
    }

    #[test]
    fn empty_attribute_is_absent() {
        let html = fragment(r#"<p><a href="">x</a><a href="y">y</a><a>z</a></p>"#);
        let hrefs: Vec<Option<&str>> = html.select(&PARAGRAPH_ANCHOR).map(|a| attr(a, "href")).collect();
        assert_eq!(hrefs, vec![None, Some("y"), None]);
    }
}
