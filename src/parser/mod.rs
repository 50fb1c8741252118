pub mod dom;
pub mod extract;
pub mod record;
pub mod sections;

use scraper::ElementRef;
use tracing::debug;

use record::{DisclosureRecord, SectionOutcome};
use sections::SECTION_NAMES;

/// Form markup → record. Sections absent from the markup come back as
/// [`SectionOutcome::Missing`].
pub fn parse_disclosure(markup: &str) -> DisclosureRecord {
    let form = dom::fragment(markup);
    let [a, b, c, d, e] = sections::split_sections(&form);

    DisclosureRecord {
        discloser: section(a, 0, |s| extract::details::extract(s).into()),
        expenses: section(b, 1, |s| extract::summary::extract(s).into()),
        funding: section(c, 2, |s| extract::summary::extract(s).into()),
        itemized_expenses: section(d, 3, extract::itemized::extract),
        itemized_funding: section(e, 4, extract::itemized::extract),
    }
}

fn section<T>(
    slot: Option<ElementRef>,
    index: usize,
    parse: impl FnOnce(ElementRef) -> SectionOutcome<T>,
) -> SectionOutcome<T> {
    let Some(element) = slot else {
        debug!(section = SECTION_NAMES[index], "section missing");
        return SectionOutcome::Missing;
    };
    let outcome = parse(element);
    if let SectionOutcome::Malformed(reason) = &outcome {
        debug!(section = SECTION_NAMES[index], %reason, "section malformed");
    }
    outcome
}
