use scraper::ElementRef;
use tracing::debug;

use crate::parser::dom::{ROW, DATA_CELL};
use crate::parser::record::{Itemization, SectionOutcome};

/// Sections D and E. Their row layout is not mapped yet, so the outcome
/// says so explicitly instead of returning an empty value.
pub fn extract(section: ElementRef) -> SectionOutcome<Itemization> {
    debug!(
        rows = section.select(&ROW).count(),
        cells = section.select(&DATA_CELL).count(),
        "itemized section left unparsed"
    );
    SectionOutcome::NotImplemented
}
