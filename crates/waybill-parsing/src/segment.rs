use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{Page, ShipmentBlock, text::normalize_tracking_id};

/// Primary anchor: UPS `1Z` tracking numbers. UPS defines 1Z + 16 chars but
/// OCR may distort the length, so 8–20 trailing chars are accepted and the
/// identifier is normalized afterwards.
static TRACKING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b1Z[0-9A-Z]{8,20}\b").unwrap());

/// Fallback anchor for documents where OCR mangled every `1Z` prefix
/// (`IZ`, `lZ`, `1z`). Only consulted when the primary pattern matches
/// nowhere in the document.
static TRACKING_FALLBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[1Iil][Zz][0-9A-Z]{8,20}\b").unwrap());

/// Invoice boilerplate that repeats on every page and must not end up
/// inside shipment blocks.
static INVOICE_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(Rechnung|Invoice|Kunden-?Nr|Rechnungsdatum|Lieferant)").unwrap());

/// Page footer noise.
static FOOTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(Seite\s+\d+|Page\s+\d+)").unwrap());

/// Split concatenated page text into per-shipment blocks.
///
/// Every first occurrence of a distinct tracking number anchors a new block.
/// Each tracking match opens a text span that runs to the next match (any
/// identifier) or end of document; the span is attributed to the block that
/// owns the span's identifier, so repeated occurrences on cost/summary pages
/// fold their surrounding text back into the original shipment instead of
/// starting a spurious block. Text before the first match is discarded.
///
/// Zero matches under both patterns yield an empty sequence — the document
/// simply contributes no shipments.
pub fn segment(pages: &[Page]) -> Vec<ShipmentBlock> {
    let lines = noise_filtered_lines(pages);

    let primary_hit = lines.iter().any(|(_, line)| TRACKING_RE.is_match(line));
    let re: &Regex = if primary_hit {
        &TRACKING_RE
    } else {
        &TRACKING_FALLBACK_RE
    };

    struct BlockAcc {
        first_page: usize,
        lines: Vec<String>,
    }

    let mut blocks: Vec<BlockAcc> = Vec::new();
    let mut owner_of: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for (page, line) in &lines {
        if let Some(m) = re.find(line) {
            let id = normalize_tracking_id(m.as_str());
            current = Some(match owner_of.get(&id) {
                // Repeat on a later page: fold the following span into the
                // block that owns this identifier.
                Some(&idx) => idx,
                None => {
                    let idx = blocks.len();
                    blocks.push(BlockAcc {
                        first_page: *page,
                        lines: Vec::new(),
                    });
                    owner_of.insert(id, idx);
                    idx
                }
            });
        }
        // Lines before the first anchor have no owner and are discarded.
        if let Some(idx) = current {
            blocks[idx].lines.push(line.to_string());
        }
    }

    tracing::debug!(
        pages = pages.len(),
        blocks = blocks.len(),
        fallback = !primary_hit,
        "segmented invoice text"
    );

    blocks
        .into_iter()
        .map(|acc| ShipmentBlock {
            text: acc.lines.join("\n"),
            first_page: acc.first_page,
        })
        .collect()
}

/// Trimmed, non-empty lines in page order with header/footer noise removed.
/// A noise-looking line is kept anyway if it contains a tracking match —
/// an anchor must never be lost to filtering.
fn noise_filtered_lines(pages: &[Page]) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    for page in pages {
        for line in page.text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let noise = INVOICE_HEADER_RE.is_match(line) || FOOTER_RE.is_match(line);
            if noise && !TRACKING_RE.is_match(line) && !TRACKING_FALLBACK_RE.is_match(line) {
                continue;
            }
            lines.push((page.number, line.to_string()));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: usize, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn no_tracking_numbers_yields_empty_sequence() {
        let pages = vec![page(1, "Rechnungsdatum 27.11.2025\nGesamtbetrag 120,00\n")];
        assert!(segment(&pages).is_empty());
    }

    #[test]
    fn preamble_before_first_anchor_is_discarded() {
        let pages = vec![page(
            1,
            "narrative preamble text\nmore preamble\n1Z999AA10123456784 WW Express Saver\nGewicht/Container 6,0/5,5\n",
        )];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].text.contains("preamble"));
        assert!(blocks[0].text.contains("Gewicht/Container"));
    }

    #[test]
    fn one_block_per_distinct_identifier() {
        let pages = vec![page(
            1,
            "1Z999AA10123456784 first\nsome lines\n1Z888BB20987654321 second\nmore lines\n",
        )];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].text.contains("some lines"));
        assert!(blocks[1].text.contains("more lines"));
    }

    #[test]
    fn repeated_identifier_folds_into_owning_block() {
        // Cost page echo: the repeat must not start a new block, and the
        // cost rows that follow it belong to the original shipment.
        let pages = vec![
            page(1, "1Z999AA10123456784 WW Express Saver\nVersender: HAMBURG 20095 DEUTSCHLAND\n"),
            page(2, "1Z888BB20987654321 TB Standard\n"),
            page(
                3,
                "1Z999AA10123456784\nTransport 100,00 90,00\nBenzinzuschlag 5,00 4,50\n",
            ),
        ];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 2, "echo must not create a third block");
        assert!(blocks[0].text.contains("Transport 100,00"));
        assert!(!blocks[1].text.contains("Transport 100,00"));
    }

    #[test]
    fn shipment_may_span_pages() {
        let pages = vec![
            page(1, "1Z999AA10123456784 WW Express\naddress line\n"),
            page(2, "continuation without any anchor\n"),
        ];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.contains("continuation"));
        assert_eq!(blocks[0].first_page, 1);
    }

    #[test]
    fn three_identifiers_across_six_pages_in_first_seen_order() {
        let pages = vec![
            page(1, "cover page, no shipments\n"),
            page(2, "1Z999AA10111111111 alpha\n"),
            page(3, "1Z999AA10222222222 beta\n"),
            page(4, "1Z999AA10333333333 gamma\n"),
            page(5, "1Z999AA10111111111 echo alpha\n"),
            page(6, "1Z999AA10222222222 echo beta\n"),
        ];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].text.contains("alpha"));
        assert!(blocks[1].text.contains("beta"));
        assert!(blocks[2].text.contains("gamma"));
        assert_eq!(blocks[0].first_page, 2);
        assert!(blocks[0].text.contains("echo alpha"));
    }

    #[test]
    fn fallback_pattern_used_when_no_primary_match() {
        let pages = vec![page(1, "IZ999AA10123456784 OCR-mangled shipment\ndetails\n")];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].text.contains("details"));
    }

    #[test]
    fn header_and_footer_noise_is_dropped() {
        let pages = vec![page(
            1,
            "UPS Rechnung Nr. 123\nSeite 1\n1Z999AA10123456784 WW Express\nGewicht 2,0\nPage 1 of 3\n",
        )];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].text.contains("Rechnung"));
        assert!(!blocks[0].text.contains("Seite"));
        assert!(blocks[0].text.contains("Gewicht 2,0"));
    }

    #[test]
    fn anchor_on_a_noisy_line_is_never_lost() {
        let pages = vec![page(1, "Rechnung 1Z999AA10123456784\nGewicht 2,0\n")];
        let blocks = segment(&pages);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn segmentation_is_idempotent() {
        let pages = vec![page(
            1,
            "1Z999AA10123456784 a\nx\n1Z888BB20987654321 b\ny\n1Z999AA10123456784 echo\nz\n",
        )];
        let first = segment(&pages);
        let second = segment(&pages);
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.first_page, b.first_page);
        }
    }
}
