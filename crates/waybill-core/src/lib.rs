pub mod backend;
pub mod tables;
pub mod text;
pub mod validate;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use tables::{country_code, find_country, month_number};
pub use text::{collapse_whitespace, normalize_tracking_id, parse_decimal, parse_weight_pair};
pub use validate::validate;

/// One page of already-extracted invoice text. Page numbers are 1-based.
#[derive(Debug, Clone)]
pub struct Page {
    pub number: usize,
    pub text: String,
}

/// Contiguous text attributed to a single shipment.
///
/// Anchored at the first occurrence of a distinct tracking number. Text
/// regions opened by a *repeated* occurrence of an already-seen tracking
/// number (cost/summary page echoes) are folded into the block that owns
/// that identifier, so a shipment's cost rows on later pages end up in the
/// same block as its header lines.
#[derive(Debug, Clone)]
pub struct ShipmentBlock {
    pub text: String,
    /// Page where the block's anchor was found.
    pub first_page: usize,
}

/// Raw (untyped) address fields for one party of a shipment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParty {
    /// Address lines as they appeared in the block, label stripped.
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    /// Country text as matched in the block; resolution to ISO-2 happens in
    /// the validator.
    pub country: Option<String>,
}

/// One raw cost row. The amount keeps its source form (decimal comma,
/// thousands dots) until validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCostRow {
    pub amount: String,
    pub category: String,
    pub currency: Option<String>,
}

/// Partial field assignments produced by the extractors for one block.
///
/// Each extractor writes only its own fields, so merging two sets is a plain
/// union and the extractors can run in any order.
#[derive(Debug, Clone, Default)]
pub struct RawFieldSet {
    pub identifier: Option<String>,
    pub date: Option<String>,
    pub service: Option<String>,
    pub sender: Option<RawParty>,
    pub receiver: Option<RawParty>,
    pub gross_weight: Option<String>,
    pub chargeable_weight: Option<String>,
    pub package_count: Option<String>,
    pub costs: Vec<RawCostRow>,
    /// Invoice-level currency (e.g. from a "Gesamtkosten CHF" line); used as
    /// fallback when no cost row carries its own currency.
    pub currency: Option<String>,
}

impl RawFieldSet {
    /// Union with another partial set. Extractors touch disjoint fields, so
    /// an already-set field is never overwritten.
    pub fn merge(&mut self, other: RawFieldSet) {
        self.identifier = self.identifier.take().or(other.identifier);
        self.date = self.date.take().or(other.date);
        self.service = self.service.take().or(other.service);
        self.sender = self.sender.take().or(other.sender);
        self.receiver = self.receiver.take().or(other.receiver);
        self.gross_weight = self.gross_weight.take().or(other.gross_weight);
        self.chargeable_weight = self.chargeable_weight.take().or(other.chargeable_weight);
        self.package_count = self.package_count.take().or(other.package_count);
        self.costs.extend(other.costs);
        self.currency = self.currency.take().or(other.currency);
    }
}

/// Validated address for one party. `country` is ISO 3166-1 alpha-2;
/// `country_raw` always keeps the source text, including when resolution
/// failed (`country: None`).
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub lines: Vec<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub country_raw: Option<String>,
}

/// Validated cost row. Zero amounts are meaningful and retained.
#[derive(Debug, Clone, PartialEq)]
pub struct CostRow {
    pub amount: f64,
    pub category: String,
    pub currency: Option<String>,
}

/// The validated, typed record for one shipment. Every optional field is
/// either a well-typed value or `None` — never an empty string.
#[derive(Debug, Clone)]
pub struct ShipmentRecord {
    pub identifier: String,
    /// ISO-8601 `YYYY-MM-DD`.
    pub date: Option<String>,
    pub service: Option<String>,
    pub sender: Option<Party>,
    pub receiver: Option<Party>,
    pub gross_weight: Option<f64>,
    pub chargeable_weight: Option<f64>,
    pub package_count: Option<u32>,
    pub costs: Vec<CostRow>,
    pub currency: Option<String>,
    pub first_page: usize,
}

/// A field that degraded to `None` (or a document-level condition) during
/// extraction. Warnings are a side channel; they never abort a document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionWarning {
    /// Identifier of the affected shipment, if one was known at that point.
    pub identifier: Option<String>,
    pub field: &'static str,
    pub detail: String,
}

impl ExtractionWarning {
    pub fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            identifier: None,
            field,
            detail: detail.into(),
        }
    }

    pub fn for_shipment(
        identifier: &str,
        field: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            identifier: Some(identifier.to_string()),
            field,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.identifier {
            Some(id) => write!(f, "{}: {}: {}", id, self.field, self.detail),
            None => write!(f, "{}: {}", self.field, self.detail),
        }
    }
}
