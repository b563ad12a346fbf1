use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{RawCostRow, RawFieldSet, ShipmentBlock};

use super::FieldExtractor;

/// One tariff row: description followed by two or more German-formatted
/// amount columns ("Transport 748,40 374,25 374,15"). Rows missing the
/// Basic/Net sub-columns do not match and are omitted, not zero-defaulted.
static ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<desc>[A-Za-zÄÖÜäöüß0-9().,/ -]+?)\s+(?P<cols>(?:\d{1,3}(?:\.\d{3})*,\d{1,2}\s+)+\d{1,3}(?:\.\d{3})*,\d{1,2})$",
    )
    .unwrap()
});

/// Invoice-level currency: "Gesamtkosten CHF 317,40".
static INVOICE_CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Gesamtkosten\s+([A-Z]{3})").unwrap());

static INLINE_CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(CHF|EUR|USD|GBP)\b").unwrap());

/// Invoice totals and package summaries are not shipment cost rows.
const SKIP_KEYWORDS: &[&str] = &[
    "gesamtkosten",
    "gesamtbetrag",
    "anzahl",
    "package",
    "rabatt (gesamt)",
    "rabattzusammenfassung",
];

/// Raw descriptions mapped onto canonical cost categories. Order matters:
/// more specific keys come before keys they contain ("benzinzuschlag"
/// before "zuschlag").
const CATEGORY_MAP: &[(&str, &str)] = &[
    ("dritte partei transport", "Freight"),
    ("transport", "Freight"),
    ("benzinzuschlag", "Fuel"),
    ("diesel", "Fuel"),
    ("maut", "Toll"),
    ("toll", "Toll"),
    ("verzollung", "Customs"),
    ("zoll", "Customs"),
    ("customs", "Customs"),
    ("handling", "Handling"),
    ("lager", "Storage"),
    ("storage", "Storage"),
    ("versicherung", "Insurance"),
    ("insurance", "Insurance"),
    ("rabatt", "Discount"),
    ("discount", "Discount"),
    ("surcharge", "Surcharge"),
    ("gebühr", "Surcharge"),
    ("zuschlag", "Surcharge"),
];

const CATEGORY_MIN_RATIO: f64 = 0.70;

/// Line-item cost extraction: parse repeating tariff rows, detect currency,
/// normalize categories, and drop duplicate rows. Explicit `0,00` rows are
/// kept — a zero charge is data.
pub struct CostExtractor;

impl FieldExtractor for CostExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        let invoice_currency = INVOICE_CURRENCY_RE
            .captures(&block.text)
            .map(|caps| caps[1].to_uppercase());

        let mut costs = Vec::new();
        let mut seen = HashSet::new();

        for raw_line in block.text.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }
            let low = line.to_lowercase();
            if SKIP_KEYWORDS.iter().any(|kw| low.contains(kw)) {
                continue;
            }
            let Some(caps) = ROW_RE.captures(line) else {
                continue;
            };

            let desc = caps["desc"].trim();
            if desc.is_empty() {
                continue;
            }
            // The rightmost column is the net amount for the row
            let amount = caps["cols"]
                .split_whitespace()
                .last()
                .unwrap_or_default()
                .to_string();
            let currency = INLINE_CURRENCY_RE
                .captures(line)
                .map(|c| c[1].to_uppercase());
            let category = normalize_category(desc);

            if seen.insert((category.clone(), amount.clone(), currency.clone())) {
                costs.push(RawCostRow {
                    amount,
                    category,
                    currency,
                });
            }
        }

        RawFieldSet {
            costs,
            currency: invoice_currency,
            ..Default::default()
        }
    }
}

/// Best fuzzy category for a row description; unmatched descriptions are
/// kept raw rather than dropped.
fn normalize_category(desc: &str) -> String {
    let low = desc.to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for (key, category) in CATEGORY_MAP {
        let score = rapidfuzz::fuzz::partial_ratio(key.chars(), low.chars());
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((*category, score));
        }
    }
    match best {
        Some((category, score)) if score >= CATEGORY_MIN_RATIO => category.to_string(),
        _ => desc.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> RawFieldSet {
        let block = ShipmentBlock {
            text: text.to_string(),
            first_page: 1,
        };
        CostExtractor.extract(&block)
    }

    #[test]
    fn basic_rows_with_category_normalization() {
        let fields = extract("Transport 748,40 374,25 374,15\nBenzinzuschlag 5,00 4,50\n");
        assert_eq!(fields.costs.len(), 2);
        assert_eq!(fields.costs[0].category, "Freight");
        assert_eq!(fields.costs[0].amount, "374,15", "rightmost column is the amount");
        assert_eq!(fields.costs[1].category, "Fuel");
        assert_eq!(fields.costs[1].amount, "4,50");
    }

    #[test]
    fn zero_amount_rows_are_kept() {
        let fields = extract("Maut 0,00 0,00\n");
        assert_eq!(fields.costs.len(), 1);
        assert_eq!(fields.costs[0].amount, "0,00");
        assert_eq!(fields.costs[0].category, "Toll");
    }

    #[test]
    fn single_column_rows_are_omitted() {
        // a row missing its Basic sub-column is omitted, not zero-defaulted
        let fields = extract("Transport 374,15\n");
        assert!(fields.costs.is_empty());
    }

    #[test]
    fn invoice_totals_are_skipped() {
        let fields = extract("Gesamtkosten CHF 317,40\nAnzahl WW Express Saver 2,00 2,00\n");
        assert!(fields.costs.is_empty());
        assert_eq!(fields.currency.as_deref(), Some("CHF"));
    }

    #[test]
    fn inline_currency_is_attached_to_the_row() {
        let fields = extract("Transport CHF 100,00 90,00\n");
        assert_eq!(fields.costs.len(), 1);
        assert_eq!(fields.costs[0].currency.as_deref(), Some("CHF"));
    }

    #[test]
    fn duplicate_rows_are_dropped() {
        let fields = extract("Transport 100,00 90,00\nTransport 100,00 90,00\n");
        assert_eq!(fields.costs.len(), 1);
    }

    #[test]
    fn german_thousands_amounts() {
        let fields = extract("Dritte Partei Transport 1.234,56 1.200,00\n");
        assert_eq!(fields.costs.len(), 1);
        assert_eq!(fields.costs[0].amount, "1.200,00");
        assert_eq!(fields.costs[0].category, "Freight");
    }

    #[test]
    fn unknown_description_keeps_raw_category() {
        let fields = extract("Sondertarif XL 12,00 10,00\n");
        assert_eq!(fields.costs.len(), 1);
        assert_eq!(fields.costs[0].category, "Sondertarif XL");
    }

    #[test]
    fn rows_in_block_encounter_order() {
        let fields = extract("Maut 1,00 1,00\nTransport 2,00 2,00\n");
        assert_eq!(fields.costs[0].category, "Toll");
        assert_eq!(fields.costs[1].category, "Freight");
    }
}
