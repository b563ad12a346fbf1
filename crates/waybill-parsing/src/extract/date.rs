use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{RawFieldSet, ShipmentBlock, tables::month_number};

use super::FieldExtractor;

/// Textual dates, German or English: "27.Nov", "02. Dezember 2025", "1 Mär 25".
static TEXTUAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(\d{1,2})[.\-/]?\s*([A-Za-zÄÖÜäöü]{3,12})\.?,?\s*(\d{2,4})?\b").unwrap()
});

/// Numeric day-first dates: 27.11.2025, 27/11/25.
static NUMERIC_DMY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[./-](\d{1,2})[./-](\d{2,4})\b").unwrap());

/// Numeric year-first dates: 2025-11-27.
static NUMERIC_YMD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})[./-](\d{1,2})[./-](\d{1,2})\b").unwrap());

/// Shipment date extraction.
///
/// Collects textual and numeric candidates across the block, normalizes
/// month names through the shared table, expands two-digit years with the
/// invoice year's century, and keeps the earliest calendar-valid candidate —
/// on UPS invoices the shipment date precedes the billing dates. The output
/// is a raw `DD.MM.YYYY` string; the validator finalizes it to ISO-8601.
pub struct DateExtractor {
    invoice_year: Option<i32>,
}

impl DateExtractor {
    pub fn new(invoice_year: Option<i32>) -> Self {
        Self { invoice_year }
    }
}

impl FieldExtractor for DateExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        RawFieldSet {
            date: self
                .best_candidate(&block.text)
                .map(|d| d.format("%d.%m.%Y").to_string()),
            ..Default::default()
        }
    }
}

impl DateExtractor {
    fn best_candidate(&self, text: &str) -> Option<NaiveDate> {
        let mut candidates = Vec::new();

        for caps in TEXTUAL_RE.captures_iter(text) {
            let Ok(day) = caps[1].parse::<u32>() else {
                continue;
            };
            let Some(month) = month_number(&caps[2]) else {
                continue;
            };
            let year = match caps.get(3) {
                Some(y) => self.fix_year(y.as_str()),
                None => self.invoice_year,
            };
            if let Some(year) = year
                && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            {
                candidates.push(date);
            }
        }

        for caps in NUMERIC_DMY_RE.captures_iter(text) {
            let (day, month) = (caps[1].parse::<u32>(), caps[2].parse::<u32>());
            if let (Ok(day), Ok(month), Some(year)) = (day, month, self.fix_year(&caps[3]))
                && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            {
                candidates.push(date);
            }
        }

        for caps in NUMERIC_YMD_RE.captures_iter(text) {
            let parts = (
                caps[1].parse::<i32>(),
                caps[2].parse::<u32>(),
                caps[3].parse::<u32>(),
            );
            if let (Ok(year), Ok(month), Ok(day)) = parts
                && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
            {
                candidates.push(date);
            }
        }

        candidates.into_iter().min()
    }

    /// Expand a two-digit year using the invoice year's century
    /// (fallback: 2000s). Four-digit years pass through.
    fn fix_year(&self, raw: &str) -> Option<i32> {
        let year: i32 = raw.parse().ok()?;
        if year >= 1900 {
            return Some(year);
        }
        if (0..100).contains(&year) {
            return Some(match self.invoice_year {
                Some(invoice) => invoice / 100 * 100 + year,
                None => 2000 + year,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_with_year(text: &str, invoice_year: Option<i32>) -> Option<String> {
        let block = ShipmentBlock {
            text: text.to_string(),
            first_page: 1,
        };
        DateExtractor::new(invoice_year).extract(&block).date
    }

    #[test]
    fn numeric_german_date() {
        assert_eq!(
            extract_with_year("Versanddatum 27.11.2025", None),
            Some("27.11.2025".into())
        );
    }

    #[test]
    fn textual_german_month() {
        assert_eq!(
            extract_with_year("02. Dezember 2025", None),
            Some("02.12.2025".into())
        );
    }

    #[test]
    fn truncated_ups_date_uses_invoice_year() {
        assert_eq!(
            extract_with_year("27.Nov", Some(2025)),
            Some("27.11.2025".into())
        );
    }

    #[test]
    fn truncated_date_without_invoice_year_is_absent() {
        assert_eq!(extract_with_year("27.Nov", None), None);
    }

    #[test]
    fn two_digit_year_expansion() {
        assert_eq!(
            extract_with_year("27/11/25", Some(2025)),
            Some("27.11.2025".into())
        );
        // no invoice year: 2000s assumed
        assert_eq!(extract_with_year("27/11/25", None), Some("27.11.2025".into()));
    }

    #[test]
    fn iso_date_is_recognized() {
        assert_eq!(
            extract_with_year("shipped 2025-11-27 reference", None),
            Some("27.11.2025".into())
        );
    }

    #[test]
    fn earliest_candidate_wins() {
        let text = "Versand 25.11.2025\nRechnungslauf 30.11.2025";
        assert_eq!(extract_with_year(text, None), Some("25.11.2025".into()));
    }

    #[test]
    fn invalid_calendar_dates_are_skipped() {
        assert_eq!(extract_with_year("31.02.2025", None), None);
    }

    #[test]
    fn ocr_garbled_month_still_resolves() {
        assert_eq!(
            extract_with_year("27. Novernber 2025", None),
            Some("27.11.2025".into())
        );
    }

    #[test]
    fn no_date_is_absence() {
        assert_eq!(extract_with_year("Gewicht/Container 6,0/5,5", None), None);
    }
}
