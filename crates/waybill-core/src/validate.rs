//! Final normalization pass: raw field sets become typed [`ShipmentRecord`]s.
//!
//! Validation is total — malformed values degrade to `None` with a recorded
//! warning, never an error. A single bad field never blocks the rest of the
//! shipment.

use chrono::NaiveDate;

use crate::{
    CostRow, ExtractionWarning, Party, RawFieldSet, RawParty, ShipmentRecord, tables,
    text::parse_decimal,
};

/// Date formats the extractors are allowed to hand over.
const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d", "%d/%m/%Y", "%d %B %Y"];

/// Validate one merged field set into the final record.
///
/// The identifier is expected to be present (the pipeline skips blocks
/// without one); every other field degrades to `None` when empty or
/// malformed, with a warning on the side channel.
pub fn validate(raw: RawFieldSet, first_page: usize) -> (ShipmentRecord, Vec<ExtractionWarning>) {
    let mut warnings = Vec::new();
    let identifier = raw.identifier.and_then(clean_str).unwrap_or_default();

    let date = raw.date.and_then(clean_str).and_then(|d| {
        let parsed = parse_date(&d);
        if parsed.is_none() {
            warnings.push(ExtractionWarning::for_shipment(
                &identifier,
                "date",
                format!("unrecognized date {:?}", d),
            ));
        }
        parsed
    });

    let gross_weight = clean_float(raw.gross_weight, "gross_weight", &identifier, &mut warnings);
    let chargeable_weight = clean_float(
        raw.chargeable_weight,
        "chargeable_weight",
        &identifier,
        &mut warnings,
    );

    let package_count = raw.package_count.and_then(clean_str).and_then(|v| {
        let parsed = v.parse::<u32>().ok();
        if parsed.is_none() {
            warnings.push(ExtractionWarning::for_shipment(
                &identifier,
                "package_count",
                format!("not an integer: {:?}", v),
            ));
        }
        parsed
    });

    let mut costs = Vec::new();
    for row in raw.costs {
        match parse_decimal(&row.amount) {
            Some(amount) => costs.push(CostRow {
                amount,
                category: row.category,
                currency: row.currency.and_then(clean_str),
            }),
            None => warnings.push(ExtractionWarning::for_shipment(
                &identifier,
                "costs",
                format!("unparsable amount {:?} ({})", row.amount, row.category),
            )),
        }
    }

    let currency = shipment_currency(raw.currency, &costs, &identifier, &mut warnings);

    let sender = raw
        .sender
        .and_then(|p| resolve_party(p, "sender", &identifier, &mut warnings));
    let receiver = raw
        .receiver
        .and_then(|p| resolve_party(p, "receiver", &identifier, &mut warnings));

    if !warnings.is_empty() {
        tracing::debug!(
            identifier = %identifier,
            degraded = warnings.len(),
            "fields degraded during validation"
        );
    }

    let record = ShipmentRecord {
        identifier,
        date: date.map(|d| d.format("%Y-%m-%d").to_string()),
        service: raw.service.and_then(clean_str),
        sender,
        receiver,
        gross_weight,
        chargeable_weight,
        package_count,
        costs,
        currency,
        first_page,
    };
    (record, warnings)
}

/// Trimmed string, or `None` when nothing is left. "0" is kept — a zero is
/// data, not absence.
fn clean_str(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn clean_float(
    value: Option<String>,
    field: &'static str,
    identifier: &str,
    warnings: &mut Vec<ExtractionWarning>,
) -> Option<f64> {
    let raw = value.and_then(clean_str)?;
    let parsed = parse_decimal(&raw);
    if parsed.is_none() {
        warnings.push(ExtractionWarning::for_shipment(
            identifier,
            field,
            format!("not a number: {:?}", raw),
        ));
    }
    parsed
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Resolve raw address fields into a [`Party`].
///
/// Country text goes through the fixed table; unresolved text is preserved
/// in `country_raw` with a `None` code rather than dropped.
fn resolve_party(
    raw: RawParty,
    field: &'static str,
    identifier: &str,
    warnings: &mut Vec<ExtractionWarning>,
) -> Option<Party> {
    if raw == RawParty::default() {
        return None;
    }

    let country_raw = raw.country.and_then(clean_str);
    let country = country_raw.as_deref().and_then(tables::country_code);
    if let Some(ref text) = country_raw
        && country.is_none()
    {
        warnings.push(ExtractionWarning::for_shipment(
            identifier,
            field,
            format!("unresolved country {:?}", text),
        ));
    }

    Some(Party {
        lines: raw.lines,
        city: raw.city.and_then(clean_str),
        zip: raw.zip.and_then(clean_str),
        country: country.map(str::to_string),
        country_raw,
    })
}

/// Pick the shipment currency from the cost rows.
///
/// Most frequent wins; ties resolve in first-seen order; disagreement is
/// flagged as a warning. The invoice-level currency is the fallback when no
/// row carries one.
fn shipment_currency(
    invoice_currency: Option<String>,
    costs: &[CostRow],
    identifier: &str,
    warnings: &mut Vec<ExtractionWarning>,
) -> Option<String> {
    let mut order: Vec<&str> = Vec::new();
    for cur in costs.iter().filter_map(|row| row.currency.as_deref()) {
        if !order.contains(&cur) {
            order.push(cur);
        }
    }

    if order.is_empty() {
        return invoice_currency.and_then(clean_str);
    }

    if order.len() > 1 {
        warnings.push(ExtractionWarning::for_shipment(
            identifier,
            "currency",
            format!("cost rows disagree on currency: {}", order.join(", ")),
        ));
    }

    let count = |cur: &str| {
        costs
            .iter()
            .filter(|row| row.currency.as_deref() == Some(cur))
            .count()
    };
    let mut best = order[0];
    for cur in &order[1..] {
        if count(cur) > count(best) {
            best = cur;
        }
    }
    Some(best.to_string())
}
