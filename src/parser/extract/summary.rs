use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use crate::parser::dom::{self, DATA_CELL, HEADER_CELL, ROW};
use crate::parser::record::{ParseError, Summary, SummaryEntry};

static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"eur|\s").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+\.?\d*|\.\d+)$").unwrap());

/// Sections B and C: one entry per row in form order, later labels
/// overwrite earlier ones in place. A row without a `th` is keyed `""`.
pub fn extract(section: ElementRef) -> Result<Summary, ParseError> {
    let mut summary = Summary::new();

    for row in section.select(&ROW) {
        let label = dom::joined_text(row, &HEADER_CELL).trim().to_string();
        if label.is_empty() {
            debug!("summary row without a label");
        }
        let cell = dom::joined_text(row, &DATA_CELL);
        let entry = SummaryEntry {
            amount: parse_amount(&cell),
            currency: parse_currency(&cell),
        };
        if summary.insert(label.clone(), entry).is_some() {
            debug!(%label, "repeated summary label, keeping the last row");
        }
    }

    if summary.is_empty() {
        return Err(ParseError::EmptySummary);
    }
    Ok(summary)
}

/// `"1 234,56\n eur"` → `1234.56`. A cell that is blank once `eur` and
/// whitespace are gone is 0; anything else that is not a plain decimal is
/// NaN.
pub fn parse_amount(cell: &str) -> f64 {
    let decimal = cell.trim().replacen(',', ".", 1);
    let cleaned = NOISE_RE.replace_all(&decimal, "");
    if cleaned.is_empty() {
        return 0.0;
    }
    if !AMOUNT_RE.is_match(&cleaned) {
        return f64::NAN;
    }
    cleaned.parse().unwrap_or(f64::NAN)
}

/// Last line of the cell.
pub fn parse_currency(cell: &str) -> Option<String> {
    cell.trim()
        .split('\n')
        .last()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}
