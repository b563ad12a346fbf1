use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{RawFieldSet, ShipmentBlock, text::parse_decimal};

use super::{FieldExtractor, is_amount_pair_line};

/// UPS service lines carry "count weight" pairs: "1 2,0", "2 9,5".
static COUNT_WEIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+)\s+(\d+[.,]\d+)\b").unwrap());

static SERVICE_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(WW|TB|Express|Worldwide|Package|PKG)\b").unwrap());

static TRACKING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b1Z[0-9A-Z]{8,20}\b").unwrap());

/// "<n> PKG" style package counts.
static PKG_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:PKGS?|Packages)\b").unwrap());

/// Explicit package keywords: "Pakete: 3", "pieces 2".
static PACKAGE_KW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:pakete|pieces|stück|stk|packages|pkgs?|colis)[:,]?\s*(\d+)").unwrap());

static WEIGHT_KW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(gross|brutto|actual weight|gewicht|weight|chargeable|rechnungsgewicht)").unwrap()
});

/// Keywords marking the billed (chargeable) weight rather than the gross one.
static CHARGEABLE_KW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(chargeable|berechnet|frachtpflichtig|rechnungsgewicht)").unwrap());

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[.,]?\d*").unwrap());

/// The UPS compound form: "Gewicht/Container 6,0/5,5".
static GEWICHT_CONTAINER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)gewicht\s*/\s*container\s*(\S.*)").unwrap());

/// Weight and package-count extraction.
///
/// Cost-table rows are dropped first so tariff amounts (748,40 …) are never
/// mistaken for weights. Values are kept as raw strings; typing happens in
/// the validator.
pub struct WeightExtractor;

impl FieldExtractor for WeightExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        let lines: Vec<&str> = block
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !is_amount_pair_line(l))
            .collect();

        let mut gross: Option<String> = None;
        let mut chargeable: Option<String> = None;
        let mut count: Option<String> = None;

        // Service/tracking line quick parse: "1Z… WW Express Saver 1 2,0"
        for line in &lines {
            if TRACKING_RE.is_match(line) || SERVICE_LINE_RE.is_match(line) {
                if let Some(caps) = COUNT_WEIGHT_RE.captures(line) {
                    count.get_or_insert_with(|| caps[1].to_string());
                    if parse_decimal(&caps[2]).is_some() {
                        gross.get_or_insert_with(|| caps[2].to_string());
                    }
                }
                if count.is_none()
                    && let Some(caps) = PKG_COUNT_RE.captures(line)
                {
                    count = Some(caps[1].to_string());
                }
            }
        }

        // Explicit package/piece keywords override the quick parse
        for line in &lines {
            if let Some(caps) = PACKAGE_KW_RE.captures(line) {
                count = Some(caps[1].to_string());
            }
        }

        // Keyword-labelled weight lines: the last number on the line is the value
        for line in &lines {
            if WEIGHT_KW_RE.is_match(line)
                && let Some(m) = NUMBER_RE.find_iter(line).last()
                && parse_decimal(m.as_str()).is_some()
            {
                if CHARGEABLE_KW_RE.is_match(line) {
                    chargeable = Some(m.as_str().to_string());
                } else if gross.is_none() {
                    gross = Some(m.as_str().to_string());
                }
            }
        }

        // Compound "Gewicht/Container 6,0/5,5": first value gross, second
        // chargeable; a single scalar is gross only.
        for line in &lines {
            if let Some(caps) = GEWICHT_CONTAINER_RE.captures(line) {
                let rest = caps[1].trim();
                match rest.split_once('/') {
                    Some((first, second)) => {
                        if parse_decimal(first).is_some() {
                            gross = Some(first.trim().to_string());
                        }
                        let second = second
                            .trim()
                            .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
                        if parse_decimal(second).is_some() {
                            chargeable = Some(second.to_string());
                        }
                    }
                    None => {
                        if gross.is_none() && parse_decimal(rest).is_some() {
                            gross = Some(rest.to_string());
                        }
                    }
                }
            }
        }

        RawFieldSet {
            gross_weight: gross,
            chargeable_weight: chargeable,
            package_count: count,
            ..Default::default()
        }
    }
}
