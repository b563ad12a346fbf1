use std::path::Path;

use thiserror::Error;

pub mod types;

pub use types::{CostJson, PartyJson, ShipmentJson};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Render one invoice's shipment records as a single JSON document: an array
/// of shipment objects. Absent fields serialize as explicit `null`s.
pub fn render_json(
    records: &[waybill_core::ShipmentRecord],
    pretty: bool,
) -> Result<String, ExportError> {
    let report: Vec<ShipmentJson<'_>> = records.iter().map(ShipmentJson::from).collect();
    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    Ok(json)
}

/// Write one invoice's shipment records to `path` as JSON.
pub fn export_json(
    records: &[waybill_core::ShipmentRecord],
    path: &Path,
    pretty: bool,
) -> Result<(), ExportError> {
    let json = render_json(records, pretty)?;
    std::fs::write(path, json)?;
    Ok(())
}
