use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{
    RawFieldSet, ShipmentBlock,
    text::{fix_ocr_confusables, normalize_tracking_id},
};

use super::FieldExtractor;

/// Strict UPS pattern. UPS defines 1Z + 16 chars (18 total) but OCR may
/// distort the length.
static UPS_STRICT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b1Z[0-9A-Z]{8,20}\b").unwrap());

/// UPS with possible OCR errors in the prefix: IZ, lZ, 1z, iZ.
static UPS_LOOSE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[1Iil][Zz][0-9A-Z]{8,20}\b").unwrap());

/// Generic fallback for non-UPS identifiers.
static GENERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z0-9]{8,25}\b").unwrap());

/// Lines near these keywords may carry a fallback identifier.
const ID_KEYWORDS: &[&str] = &[
    "paketnummer",
    "frachtbrief",
    "tracking",
    "waybill",
    "awb",
    "referenz",
    "sendung",
    "shipment",
    "consignment",
];

/// Shipment identifier extraction, strongest pattern first:
/// 1. strict UPS `1Z` match — the first one in block order is authoritative,
///    even when the identifier repeats later in the block (cost-page echoes);
/// 2. OCR-loose UPS match, line by line, after confusable fixing;
/// 3. keyword-near generic candidates, strongly filtered;
/// 4. filtered generic candidates anywhere in the block.
pub struct IdentifierExtractor;

impl FieldExtractor for IdentifierExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        RawFieldSet {
            identifier: find_identifier(&block.text),
            ..Default::default()
        }
    }
}

fn find_identifier(text: &str) -> Option<String> {
    if let Some(m) = UPS_STRICT_RE.find(text) {
        return Some(normalize_tracking_id(m.as_str()));
    }

    for line in text.lines() {
        let fixed = fix_ocr_confusables(line);
        if let Some(m) = UPS_LOOSE_RE.find(&fixed) {
            return Some(normalize_tracking_id(m.as_str()));
        }
    }

    for line in text.lines() {
        let low = line.to_lowercase();
        if ID_KEYWORDS.iter().any(|kw| low.contains(kw)) {
            let fixed = fix_ocr_confusables(line);
            if let Some(candidate) = first_plausible(&fixed) {
                return Some(candidate);
            }
        }
    }

    let fixed = fix_ocr_confusables(text);
    first_plausible(&fixed)
}

fn first_plausible(text: &str) -> Option<String> {
    GENERIC_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|c| is_plausible(c))
        .map(normalize_tracking_id)
}

/// Reject frequent false positives: short digit runs (ZIPs, amounts),
/// zero-padded invoice numbers, package-summary fragments.
fn is_plausible(candidate: &str) -> bool {
    if candidate.len() < 8 {
        return false;
    }
    if candidate.chars().all(|c| c.is_ascii_digit()) && candidate.len() < 10 {
        return false;
    }
    if candidate.starts_with("000") {
        return false;
    }
    if candidate.contains("PKG") || candidate.contains("PACKAGE") {
        return false;
    }
    true
}
