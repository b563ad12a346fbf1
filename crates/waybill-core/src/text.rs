//! Shared text normalization helpers used by the extractors and validator.
//!
//! Pure functions applied on demand, not a pipeline stage.

/// Values at or above this are never plausible weights or amounts on a
/// parcel invoice; they are OCR artifacts or concatenated digits.
const PLAUSIBLE_MAX: f64 = 1e7;

/// Collapse runs of whitespace (including line breaks) into single spaces
/// and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a decimal-comma numeric string into a float.
///
/// `"2,5"` → 2.5, `"1.234,56"` → 1234.56 (dots are thousands separators when
/// a comma is present), `"6.0"` → 6.0. A bare trailing comma denotes a whole
/// number: `"82,"` → 82.0. Non-numeric residue yields `None`, as do
/// implausibly large values.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let cleaned = if s.contains(',') {
        // German form: drop thousands dots, comma becomes the decimal point.
        // "82," becomes "82." which parses as 82.0.
        s.replace('.', "").replace(',', ".")
    } else {
        s.to_string()
    };
    let value: f64 = cleaned.parse().ok()?;
    (value < PLAUSIBLE_MAX).then_some(value)
}

/// Parse a compound weight pair like `"12,5/12,0 D"`.
///
/// The first value is the gross weight, the second the chargeable weight.
/// An optional trailing unit/flag letter is stripped and ignored. A single
/// scalar yields `(gross, None)`.
pub fn parse_weight_pair(raw: &str) -> (Option<f64>, Option<f64>) {
    let trimmed = raw
        .trim()
        .trim_end_matches(|c: char| c.is_alphabetic() || c.is_whitespace());
    match trimmed.split_once('/') {
        Some((gross, chargeable)) => (parse_decimal(gross), parse_decimal(chargeable)),
        None => (parse_decimal(trimmed), None),
    }
}

/// Replace characters OCR commonly confuses inside identifiers:
/// `O`/`o` → `0`, `I`/`l` → `1`.
pub fn fix_ocr_confusables(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'O' | 'o' => '0',
            'I' | 'l' => '1',
            other => other,
        })
        .collect()
}

/// Canonicalize a tracking identifier: strip non-alphanumeric noise, map a
/// misread leading `I`/`i`/`l` back to `1`, and uppercase.
pub fn normalize_tracking_id(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    let mut chars = cleaned.chars();
    let normalized = match chars.next() {
        Some('I') | Some('i') | Some('l') => format!("1{}", chars.as_str()),
        _ => cleaned,
    };
    normalized.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_basic() {
        assert_eq!(parse_decimal("2,5"), Some(2.5));
        assert_eq!(parse_decimal("6.0"), Some(6.0));
        assert_eq!(parse_decimal("374,15"), Some(374.15));
    }

    #[test]
    fn decimal_zero_is_kept() {
        assert_eq!(parse_decimal("0,00"), Some(0.0));
    }

    #[test]
    fn german_thousands_separator() {
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("12.345.678,90"), None, "above plausibility cap");
    }

    #[test]
    fn bare_trailing_comma_is_a_whole_number() {
        // Documented policy: the comma is a decimal separator with no
        // fractional digits, so the value is kept.
        assert_eq!(parse_decimal("82,"), Some(82.0));
    }

    #[test]
    fn non_numeric_residue_is_none() {
        assert_eq!(parse_decimal("abc"), None);
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("  "), None);
    }

    #[test]
    fn weight_pair_with_trailing_flag() {
        assert_eq!(parse_weight_pair("12,5/12,0 D"), (Some(12.5), Some(12.0)));
        assert_eq!(parse_weight_pair("6,0/5,5"), (Some(6.0), Some(5.5)));
    }

    #[test]
    fn weight_pair_single_scalar_is_gross_only() {
        assert_eq!(parse_weight_pair("7,5"), (Some(7.5), None));
        assert_eq!(parse_weight_pair("7,5 kg"), (Some(7.5), None));
    }

    #[test]
    fn tracking_id_normalization() {
        assert_eq!(normalize_tracking_id("1Z999AA10123456784"), "1Z999AA10123456784");
        assert_eq!(normalize_tracking_id("lZ999AA10123456784"), "1Z999AA10123456784");
        assert_eq!(normalize_tracking_id("IZ 999-AA1 0123456784"), "1Z999AA10123456784");
    }

    #[test]
    fn ocr_confusables() {
        assert_eq!(fix_ocr_confusables("lZ9O"), "1Z90");
    }

    #[test]
    fn whitespace_collapse() {
        assert_eq!(collapse_whitespace("  a \n b\t c  "), "a b c");
    }
}
