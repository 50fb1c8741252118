use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Why a section could not be turned into a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} table cells, found {found}")]
    CellCount { expected: usize, found: usize },
    #[error("summary table has no rows")]
    EmptySummary,
}

/// Outcome of one form section slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum SectionOutcome<T> {
    Parsed(T),
    /// The document has fewer section containers than this slot needs.
    Missing,
    NotImplemented,
    Malformed(String),
}

impl<T> SectionOutcome<T> {
    pub fn parsed(&self) -> Option<&T> {
        match self {
            SectionOutcome::Parsed(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ParseError>> for SectionOutcome<T> {
    fn from(result: Result<T, ParseError>) -> Self {
        match result {
            Ok(v) => SectionOutcome::Parsed(v),
            Err(e) => SectionOutcome::Malformed(e.to_string()),
        }
    }
}

/// Section A.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscloserDetails {
    pub name: String,
    pub title: String,
    pub party: String,
    pub district: String,
    pub support_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    /// NaN when the cell is not a plain decimal amount; serialised as `null`.
    pub amount: f64,
    pub currency: Option<String>,
}

/// Sections B (expenses) and C (funding), keyed by row label in form order.
pub type Summary = IndexMap<String, SummaryEntry>;

/// Sections D and E have no parsed shape yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Itemization {}

#[derive(Debug, Clone, Serialize)]
pub struct DisclosureRecord {
    #[serde(rename = "A")]
    pub discloser: SectionOutcome<DiscloserDetails>,
    #[serde(rename = "B")]
    pub expenses: SectionOutcome<Summary>,
    #[serde(rename = "C")]
    pub funding: SectionOutcome<Summary>,
    #[serde(rename = "D")]
    pub itemized_expenses: SectionOutcome<Itemization>,
    #[serde(rename = "E")]
    pub itemized_funding: SectionOutcome<Itemization>,
}

/// One line of output.
#[derive(Debug, Clone, Serialize)]
pub struct DisclosureEntry {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub record: DisclosureRecord,
}
