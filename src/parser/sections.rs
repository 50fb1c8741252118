use scraper::{ElementRef, Html};
use tracing::warn;

use super::dom::FORM_TABLE;

pub const SECTION_COUNT: usize = 5;
pub const SECTION_NAMES: [&str; SECTION_COUNT] = ["A", "B", "C", "D", "E"];

/// Form sections A–E in document order. Slots past the last container are
/// `None`; containers past the fifth are ignored.
pub fn split_sections(form: &Html) -> [Option<ElementRef<'_>>; SECTION_COUNT] {
    let mut slots = [None; SECTION_COUNT];
    let mut found = 0;

    for table in form.select(&FORM_TABLE) {
        if found < SECTION_COUNT {
            slots[found] = Some(table);
        }
        found += 1;
    }

    if found != SECTION_COUNT {
        warn!(
            found,
            expected = SECTION_COUNT,
            "unexpected number of form sections"
        );
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::{fragment, trimmed_text};

    fn tables(n: usize) -> String {
        (0..n)
            .map(|i| format!(r#"<div class="ann_form_table_basic"><p>{i}</p></div>"#))
            .collect()
    }

    #[test]
    fn five_in_order() {
        let html = fragment(&tables(5));
        let slots = split_sections(&html);
        let texts: Vec<String> = slots.iter().map(|s| trimmed_text(s.unwrap())).collect();
        assert_eq!(texts, vec!["0", "1", "2", "3", "4"]);
    }

    #[test]
    fn short_document_leaves_tail_empty() {
        let html = fragment(&tables(2));
        let slots = split_sections(&html);
        assert!(slots[0].is_some() && slots[1].is_some());
        assert!(slots[2..].iter().all(Option::is_none));
    }

    #[test]
    fn extra_containers_are_ignored() {
        let html = fragment(&tables(7));
        let slots = split_sections(&html);
        assert_eq!(trimmed_text(slots[4].unwrap()), "4");
    }

    #[test]
    fn other_classes_do_not_count() {
        let html = fragment(r#"<div class="ann_form_table_basic wide">x</div><div class="ann_form_table">y</div>"#);
        assert!(split_sections(&html).iter().all(Option::is_none));
    }
}
