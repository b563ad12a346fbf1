//! Serde views over the core record types.
//!
//! The core types stay serde-free; these borrow the validated records and
//! pin the JSON field names consumed by downstream billing systems.

use serde::Serialize;

use waybill_core::{CostRow, Party, ShipmentRecord};

#[derive(Serialize)]
pub struct ShipmentJson<'a> {
    pub identifier: &'a str,
    pub invoice_page: usize,
    pub shipment_date: Option<&'a str>,
    pub shipment_type: Option<&'a str>,
    pub sender: Option<PartyJson<'a>>,
    pub receiver: Option<PartyJson<'a>>,
    pub gross_weight: Option<f64>,
    pub chargeable_weight: Option<f64>,
    pub package_count: Option<u32>,
    pub costs: Vec<CostJson<'a>>,
    pub currency: Option<&'a str>,
}

#[derive(Serialize)]
pub struct PartyJson<'a> {
    pub lines: &'a [String],
    pub city: Option<&'a str>,
    pub zip: Option<&'a str>,
    /// ISO 3166-1 alpha-2, or null when the raw text did not resolve.
    pub country: Option<&'a str>,
    pub country_raw: Option<&'a str>,
}

#[derive(Serialize)]
pub struct CostJson<'a> {
    pub amount: f64,
    pub category: &'a str,
    pub currency: Option<&'a str>,
}

impl<'a> From<&'a ShipmentRecord> for ShipmentJson<'a> {
    fn from(record: &'a ShipmentRecord) -> Self {
        Self {
            identifier: &record.identifier,
            invoice_page: record.first_page,
            shipment_date: record.date.as_deref(),
            shipment_type: record.service.as_deref(),
            sender: record.sender.as_ref().map(PartyJson::from),
            receiver: record.receiver.as_ref().map(PartyJson::from),
            gross_weight: record.gross_weight,
            chargeable_weight: record.chargeable_weight,
            package_count: record.package_count,
            costs: record.costs.iter().map(CostJson::from).collect(),
            currency: record.currency.as_deref(),
        }
    }
}

impl<'a> From<&'a Party> for PartyJson<'a> {
    fn from(party: &'a Party) -> Self {
        Self {
            lines: &party.lines,
            city: party.city.as_deref(),
            zip: party.zip.as_deref(),
            country: party.country.as_deref(),
            country_raw: party.country_raw.as_deref(),
        }
    }
}

impl<'a> From<&'a CostRow> for CostJson<'a> {
    fn from(row: &'a CostRow) -> Self {
        Self {
            amount: row.amount,
            category: &row.category,
            currency: row.currency.as_deref(),
        }
    }
}
