use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{RawFieldSet, ShipmentBlock, text::collapse_whitespace};

use super::FieldExtractor;

/// Canonical UPS service names. Extracted text is normalized onto this set.
const CANONICAL: &[&str] = &[
    "Express",
    "Express Saver",
    "Express Plus",
    "Express Worldwide",
    "Expedited",
    "Standard",
    "Worldwide",
    "Domestic",
];

/// Service mentions: "WW Express Saver", "TB Standard", bare "Express ...".
static SERVICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:(?:WW|TB)\s+[A-Za-z][A-Za-z\ ]{2,24}) |
        (?:Express(?:\s+(?:Saver|Plus|Worldwide|Domestic))?) |
        (?:Expedited|Standard|Worldwide|Domestic)
        ",
    )
    .unwrap()
});

/// Fuzzy-match thresholds, on rapidfuzz's 0..1 ratio scale.
const NORMALIZE_MIN_RATIO: f64 = 0.70;
const FUZZY_MIN_RATIO: f64 = 0.85;

/// Service type extraction in three passes: pattern match, fuzzy match
/// against the canonical set, then a first-word keyword fallback. Unmatched
/// text yields absence, never an error.
pub struct ServiceExtractor;

impl FieldExtractor for ServiceExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        RawFieldSet {
            service: find_service(&block.text),
            ..Default::default()
        }
    }
}

fn find_service(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    let low = text.to_lowercase();

    if let Some(m) = SERVICE_RE.find(&text)
        && let Some(canonical) = normalize(m.as_str())
    {
        return Some(canonical);
    }

    // Fuzzy pass: catches OCR-damaged mentions ("Exqress Saver")
    for canonical in CANONICAL {
        let score = rapidfuzz::fuzz::partial_ratio(canonical.to_lowercase().chars(), low.chars());
        if score > FUZZY_MIN_RATIO {
            return Some((*canonical).to_string());
        }
    }

    // Keyword fallback: "sent using Express service" style narrative
    CANONICAL
        .iter()
        .find(|canonical| {
            let first_word = canonical.split_whitespace().next().unwrap_or("");
            low.contains(&first_word.to_lowercase())
        })
        .map(|canonical| (*canonical).to_string())
}

/// Map an extracted mention onto the canonical set by best full-ratio match;
/// "WW Express Saver" → "Express Saver", "TB Standard" → "Standard".
fn normalize(raw: &str) -> Option<String> {
    let raw = raw.trim().to_lowercase();
    let mut best: Option<(&str, f64)> = None;
    for canonical in CANONICAL {
        let score = rapidfuzz::fuzz::ratio(raw.chars(), canonical.to_lowercase().chars());
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((*canonical, score));
        }
    }

    best.filter(|&(_, score)| score >= NORMALIZE_MIN_RATIO)
        .map(|(canonical, _)| canonical.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> Option<String> {
        let block = ShipmentBlock {
            text: text.to_string(),
            first_page: 1,
        };
        ServiceExtractor.extract(&block).service
    }

    #[test]
    fn ww_express_saver_normalizes() {
        assert_eq!(
            extract("1Z999AA10123456784 WW Express Saver 1 2,0"),
            Some("Express Saver".into())
        );
    }

    #[test]
    fn tb_standard_normalizes() {
        assert_eq!(extract("TB Standard Sendung"), Some("Standard".into()));
    }

    #[test]
    fn case_insensitive_match() {
        assert_eq!(extract("EXPRESS WORLDWIDE"), Some("Express Worldwide".into()));
    }

    #[test]
    fn narrative_mention_is_found() {
        assert_eq!(
            extract("This shipment was sent using the Expedited service."),
            Some("Expedited".into())
        );
    }

    #[test]
    fn unmatched_text_is_absence() {
        assert_eq!(extract("Gewicht/Container 6,0/5,5"), None);
    }
}
