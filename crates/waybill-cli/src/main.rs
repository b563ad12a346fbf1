use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod output;

use output::ColorMode;

/// Extract structured shipment records from a UPS invoice PDF.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the PDF invoice
    #[arg(short, long)]
    input: PathBuf,

    /// Directory for the JSON output
    #[arg(short, long)]
    output: PathBuf,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only print the output path, no summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let color = ColorMode(!cli.no_color);

    if !cli.input.exists() {
        anyhow::bail!("File not found: {}", cli.input.display());
    }

    let backend = waybill_pdf_mupdf::MupdfBackend::new();
    let extraction = waybill_parsing::extract_invoice(&cli.input, &backend)
        .with_context(|| format!("failed to extract {}", cli.input.display()))?;

    let file_name = cli
        .input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| cli.input.display().to_string());

    if !cli.quiet {
        let mut stdout = std::io::stdout();
        output::print_summary(&mut stdout, &file_name, &extraction, color)?;
    }

    std::fs::create_dir_all(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    let stem = cli
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "invoice".to_string());
    let out_path = cli.output.join(format!("{}_extracted.json", stem));

    waybill_reporting::export_json(&extraction.shipments, &out_path, cli.pretty)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    println!("Extraction complete -> {}", out_path.display());
    Ok(())
}
