//! Fixed lookup tables: German/English month names and country names.
//!
//! Process-wide immutable data, built once and never mutated.

use once_cell::sync::Lazy;
use regex::Regex;

/// Month names and common abbreviations (lowercase), German and English.
const MONTHS: &[(&str, u32)] = &[
    ("januar", 1),
    ("jan", 1),
    ("january", 1),
    ("februar", 2),
    ("feb", 2),
    ("february", 2),
    ("märz", 3),
    ("maerz", 3),
    ("mrz", 3),
    ("mär", 3),
    ("mar", 3),
    ("march", 3),
    ("april", 4),
    ("apr", 4),
    ("mai", 5),
    ("may", 5),
    ("juni", 6),
    ("jun", 6),
    ("june", 6),
    ("juli", 7),
    ("jul", 7),
    ("july", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("oktober", 10),
    ("okt", 10),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("dezember", 12),
    ("dez", 12),
    ("december", 12),
    ("dec", 12),
];

/// Country names (lowercase) mapped to ISO 3166-1 alpha-2 codes.
/// Includes long official forms like "volksrepublik china".
const COUNTRIES: &[(&str, &str)] = &[
    ("deutschland", "DE"),
    ("bundesrepublik deutschland", "DE"),
    ("germany", "DE"),
    ("schweiz", "CH"),
    ("switzerland", "CH"),
    ("volksrepublik china", "CN"),
    ("china", "CN"),
    ("hong kong", "HK"),
    ("hongkong", "HK"),
    ("österreich", "AT"),
    ("austria", "AT"),
    ("italien", "IT"),
    ("italy", "IT"),
    ("polen", "PL"),
    ("poland", "PL"),
    ("frankreich", "FR"),
    ("france", "FR"),
    ("spanien", "ES"),
    ("spain", "ES"),
    ("niederlande", "NL"),
    ("netherlands", "NL"),
    ("belgien", "BE"),
    ("belgium", "BE"),
    ("tschechien", "CZ"),
    ("czech republic", "CZ"),
    ("dänemark", "DK"),
    ("denmark", "DK"),
    ("schweden", "SE"),
    ("sweden", "SE"),
    ("vereinigtes königreich", "GB"),
    ("grossbritannien", "GB"),
    ("großbritannien", "GB"),
    ("united kingdom", "GB"),
    ("vereinigte staaten", "US"),
    ("united states", "US"),
    ("usa", "US"),
    ("singapur", "SG"),
    ("singapore", "SG"),
    ("japan", "JP"),
    ("türkei", "TR"),
    ("turkey", "TR"),
];

/// Matches any known country name, longest alternative first so that
/// "VOLKSREPUBLIK CHINA" wins over the embedded "CHINA".
static COUNTRY_RE: Lazy<Regex> = Lazy::new(|| {
    let mut names: Vec<&str> = COUNTRIES.iter().map(|(name, _)| *name).collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).unwrap()
});

/// Resolve a month name to its number, tolerating OCR slippage.
///
/// Tries an exact lookup first, then 3-letter and 2-letter prefix matches
/// ("dezemeber" → 12, "jaui" → 1). `0` is treated as a misread `o` before
/// matching ("N0v" → 11).
pub fn month_number(raw: &str) -> Option<u32> {
    let name = raw.to_lowercase().replace('.', "").replace('0', "o");
    if name.is_empty() {
        return None;
    }

    if let Some(&(_, number)) = MONTHS.iter().find(|(key, _)| *key == name) {
        return Some(number);
    }

    let prefix = |s: &str, n: usize| s.chars().take(n).collect::<String>();

    let p3 = prefix(&name, 3);
    if let Some(&(_, number)) = MONTHS.iter().find(|(key, _)| prefix(key, 3) == p3) {
        return Some(number);
    }

    let p2 = prefix(&name, 2);
    MONTHS
        .iter()
        .find(|(key, _)| prefix(key, 2) == p2)
        .map(|&(_, number)| number)
}

/// Resolve raw country text to an ISO-2 code.
///
/// Accepts either a bare country name or a longer string containing one.
pub fn country_code(raw: &str) -> Option<&'static str> {
    let normalized = crate::text::collapse_whitespace(&raw.to_lowercase());
    if let Some(&(_, code)) = COUNTRIES.iter().find(|(name, _)| *name == normalized) {
        return Some(code);
    }
    find_country(raw).map(|(_, code)| code)
}

/// Locate a known country name inside free text.
///
/// Returns the matched substring in its source casing together with the
/// ISO-2 code, so callers can both preserve the raw text and strip it from
/// the surrounding address.
pub fn find_country(text: &str) -> Option<(String, &'static str)> {
    let m = COUNTRY_RE.find(text)?;
    let matched = m.as_str();
    let key = crate::text::collapse_whitespace(&matched.to_lowercase());
    COUNTRIES
        .iter()
        .find(|(name, _)| *name == key)
        .map(|&(_, code)| (matched.to_string(), code))
}
