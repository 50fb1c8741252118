use scraper::ElementRef;

use crate::parser::dom::{self, DATA_CELL};
use crate::parser::record::{DiscloserDetails, ParseError};

const CELLS: usize = 6;

/// Section A: six cells in fixed order. The fifth cell is not carried over.
pub fn extract(section: ElementRef) -> Result<DiscloserDetails, ParseError> {
    let cells: Vec<String> = section.select(&DATA_CELL).map(dom::trimmed_text).collect();

    let [name, title, party, district, _, support_group]: [String; CELLS] =
        cells.try_into().map_err(|cells: Vec<String>| ParseError::CellCount {
            expected: CELLS,
            found: cells.len(),
        })?;

    Ok(DiscloserDetails {
        name,
        title,
        party,
        district,
        support_group,
    })
}
