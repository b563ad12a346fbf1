use std::io::Write;

use owo_colors::OwoColorize;

use waybill_parsing::InvoiceExtraction;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the per-invoice extraction summary: shipment count and the
/// warning side-channel (degraded fields, skipped blocks).
pub fn print_summary(
    w: &mut dyn Write,
    file_name: &str,
    extraction: &InvoiceExtraction,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w, "Extracting shipments from {}...", file_name)?;

    match extraction.shipments.len() {
        0 => {
            let msg = "No shipments extracted";
            if color.enabled() {
                writeln!(w, "{}", msg.yellow())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
        n => writeln!(w, "Found {} shipment{}", n, if n == 1 { "" } else { "s" })?,
    }

    if !extraction.warnings.is_empty() {
        writeln!(w)?;
        for warning in &extraction.warnings {
            let line = format!("warning: {}", warning);
            if color.enabled() {
                writeln!(w, "{}", line.yellow())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
    }
    writeln!(w)?;
    Ok(())
}
