//! Field extractors: one module per field family, all behind the same
//! contract. Keeping one extractor per family (instead of a monolithic
//! branching parser) isolates failure — a service line the service extractor
//! cannot read never affects weight or cost extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{RawFieldSet, ShipmentBlock};

pub mod cost;
pub mod date;
pub mod identifier;
pub mod location;
pub mod service;
pub mod weight;

pub use cost::CostExtractor;
pub use date::DateExtractor;
pub use identifier::IdentifierExtractor;
pub use location::LocationExtractor;
pub use service::ServiceExtractor;
pub use weight::WeightExtractor;

/// Contract shared by all field extractors.
///
/// Given a block, return the partial field assignments this extractor is
/// responsible for. Absence is represented in the returned set, never raised.
/// Extractors write disjoint fields, so the pipeline can merge their outputs
/// in any order.
pub trait FieldExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet;
}

/// Cost-table rows carry at least two adjacent amount columns
/// ("748,40 374,25 374,15"). Several extractors use this to keep tariff
/// numbers out of address and weight parsing.
static AMOUNT_PAIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+[.,]\d{2}\s+\d+[.,]\d{2}").unwrap());

pub(crate) fn is_amount_pair_line(line: &str) -> bool {
    AMOUNT_PAIR_RE.is_match(line)
}
