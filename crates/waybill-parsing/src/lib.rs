use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

pub mod extract;
pub mod segment;

pub use extract::{
    CostExtractor, DateExtractor, FieldExtractor, IdentifierExtractor, LocationExtractor,
    ServiceExtractor, WeightExtractor,
};
pub use segment::segment;
// Re-export domain types from core (canonical definitions live there)
pub use waybill_core::{
    BackendError, ExtractionWarning, Page, PdfBackend, RawFieldSet, ShipmentBlock, ShipmentRecord,
};

/// Result of extracting one invoice document.
#[derive(Debug, Clone)]
pub struct InvoiceExtraction {
    /// Validated shipment records, in document order.
    pub shipments: Vec<ShipmentRecord>,
    /// Fields that degraded to null, skipped blocks, and document-level
    /// conditions. Never fatal.
    pub warnings: Vec<ExtractionWarning>,
}

/// First plausible invoice year anywhere in the document; used to expand
/// two-digit years in shipment dates.
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(20\d{2})\b").unwrap());

/// Drives the full extraction for one document:
/// segment → six field extractors per block → merge → validate.
///
/// Stateless and deterministic: re-running on identical input yields
/// identical output. Blocks are independent — a degraded field in one
/// shipment never affects the others.
#[derive(Debug, Default)]
pub struct InvoiceExtractor;

impl InvoiceExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, pages: &[Page]) -> InvoiceExtraction {
        let mut shipments = Vec::new();
        let mut warnings = Vec::new();

        let blocks = segment(pages);
        if blocks.is_empty() {
            tracing::info!("no tracking identifiers found, document yields no shipments");
            warnings.push(ExtractionWarning::new(
                "document",
                "no shipments extracted: no tracking identifiers found",
            ));
            return InvoiceExtraction {
                shipments,
                warnings,
            };
        }

        let invoice_year = infer_invoice_year(pages);
        let extractors: Vec<Box<dyn FieldExtractor>> = vec![
            Box::new(IdentifierExtractor),
            Box::new(DateExtractor::new(invoice_year)),
            Box::new(ServiceExtractor),
            Box::new(LocationExtractor),
            Box::new(WeightExtractor),
            Box::new(CostExtractor),
        ];

        for block in &blocks {
            let mut raw = RawFieldSet::default();
            for extractor in &extractors {
                raw.merge(extractor.extract(block));
            }

            if raw.identifier.is_none() {
                tracing::warn!(page = block.first_page, "skipping block without identifier");
                warnings.push(ExtractionWarning::new(
                    "identifier",
                    format!("block on page {} has no identifier", block.first_page),
                ));
                continue;
            }

            let (record, mut record_warnings) = waybill_core::validate(raw, block.first_page);
            warnings.append(&mut record_warnings);
            shipments.push(record);
        }

        tracing::info!(
            shipments = shipments.len(),
            warnings = warnings.len(),
            "invoice extraction complete"
        );
        InvoiceExtraction {
            shipments,
            warnings,
        }
    }
}

/// Extract shipment records from a PDF invoice using the given backend for
/// page-text extraction.
pub fn extract_invoice(
    pdf_path: &Path,
    backend: &dyn PdfBackend,
) -> Result<InvoiceExtraction, BackendError> {
    let pages = backend.extract_pages(pdf_path)?;
    Ok(InvoiceExtractor::new().extract(&pages))
}

fn infer_invoice_year(pages: &[Page]) -> Option<i32> {
    pages
        .iter()
        .find_map(|page| YEAR_RE.captures(&page.text))
        .and_then(|caps| caps[1].parse().ok())
}
