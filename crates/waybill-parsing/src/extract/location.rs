use once_cell::sync::Lazy;
use regex::Regex;

use waybill_core::{
    RawFieldSet, RawParty, ShipmentBlock,
    tables::find_country,
    text::collapse_whitespace,
};

use super::{FieldExtractor, is_amount_pair_line};

/// Address labels, inline ("Versender: OBERSCHLEISSHEIM 85764 DEUTSCHLAND")
/// or as a bare label line starting a multi-line address.
static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(versender|absender|shipper|empf[aä]nger|receiver|consignee)\s*:\s*(.*)$")
        .unwrap()
});

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{3,7})\b").unwrap());

/// Lines that terminate an address block: tariff tables, summaries, weights.
static END_MARKERS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(Transport|Zuschlag|Package|Anzahl|Gebühr|Rabatt|Tarife|Gesamt|Service|Beschreibung|MWST|Basic|Gewicht)",
    )
    .unwrap()
});

const SENDER_LABELS: &[&str] = &["versender", "absender", "shipper"];
const RECEIVER_LABELS: &[&str] = &["empfänger", "empfanger", "receiver", "consignee"];

/// Sender/receiver address extraction.
///
/// Collects the labelled address block (inline or multi-line), then splits
/// it into zip, country, and city. The country is located via the shared
/// table but stored as raw text — ISO resolution is the validator's job.
/// If no table entry matches and the block ends in a lone word long enough
/// to be a country name, that word is kept as the (unresolved) country.
pub struct LocationExtractor;

impl FieldExtractor for LocationExtractor {
    fn extract(&self, block: &ShipmentBlock) -> RawFieldSet {
        let lines: Vec<&str> = block
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        RawFieldSet {
            sender: parse_party(collect_block(&lines, SENDER_LABELS)),
            receiver: parse_party(collect_block(&lines, RECEIVER_LABELS)),
            ..Default::default()
        }
    }
}

/// Gather the address lines following (or inline with) one party's label.
fn collect_block(lines: &[&str], labels: &[&str]) -> Vec<String> {
    let mut collecting = false;
    let mut block = Vec::new();

    for line in lines {
        if let Some(caps) = LABEL_RE.captures(line) {
            let tag = caps[1].to_lowercase();
            if labels.contains(&tag.as_str()) {
                collecting = true;
                let content = caps[2].trim();
                if !content.is_empty() {
                    block.push(content.to_string());
                }
            } else if collecting {
                // the other party's label ends this address
                break;
            }
            continue;
        }
        if collecting {
            if END_MARKERS_RE.is_match(line) || is_amount_pair_line(line) {
                break;
            }
            block.push(line.to_string());
        }
    }
    block
}

fn parse_party(block: Vec<String>) -> Option<RawParty> {
    if block.is_empty() {
        return None;
    }

    let joined = collapse_whitespace(&block.join(" "));
    let zip = ZIP_RE.captures(&joined).map(|caps| caps[1].to_string());

    let (country_raw, country_iso) = match find_country(&joined) {
        Some((raw, code)) => (Some(raw), Some(code)),
        None => (trailing_country_candidate(&block).map(str::to_string), None),
    };

    // City: prefer the line carrying the zip ("85764 OBERSCHLEISSHEIM"),
    // else the whole joined address; then drop zip and country text.
    let city_source = match (&zip, block.len()) {
        (Some(z), n) if n > 1 => block
            .iter()
            .find(|line| line.contains(z.as_str()))
            .cloned()
            .unwrap_or_else(|| joined.clone()),
        _ => joined.clone(),
    };
    let mut city_text = city_source;
    if let Some(z) = &zip {
        city_text = city_text.replace(z.as_str(), " ");
    }
    if let Some(raw) = &country_raw {
        let raw_re = Regex::new(&format!("(?i){}", regex::escape(raw))).unwrap();
        city_text = raw_re.replace_all(&city_text, " ").into_owned();
    }
    city_text = city_text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();
    let city_text = collapse_whitespace(&city_text);

    let city = if city_text.is_empty() {
        // Hong Kong invoices often carry no city line at all
        (country_iso == Some("HK")).then(|| "HONG KONG".to_string())
    } else {
        Some(city_text)
    };

    Some(RawParty {
        lines: block,
        city,
        zip,
        country: country_raw,
    })
}

/// A lone alphabetic word on the block's last line is likely a country name
/// the table does not know; keep it raw so it is not silently dropped.
fn trailing_country_candidate(block: &[String]) -> Option<&str> {
    if block.len() < 2 {
        return None;
    }
    let last = block.last()?.trim();
    let lone_word = !last.contains(char::is_whitespace);
    (lone_word && last.chars().count() >= 4 && last.chars().all(char::is_alphabetic))
        .then_some(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(text: &str) -> RawFieldSet {
        let block = ShipmentBlock {
            text: text.to_string(),
            first_page: 1,
        };
        LocationExtractor.extract(&block)
    }

    #[test]
    fn inline_sender_address() {
        let fields = extract("1Z999AA10123456784 WW Express\nVersender: OBERSCHLEISSHEIM 85764 DEUTSCHLAND\n");
        let sender = fields.sender.unwrap();
        assert_eq!(sender.city.as_deref(), Some("OBERSCHLEISSHEIM"));
        assert_eq!(sender.zip.as_deref(), Some("85764"));
        assert_eq!(sender.country.as_deref(), Some("DEUTSCHLAND"));
    }

    #[test]
    fn multiline_receiver_address() {
        let text = "Empfänger:\nACME GMBH\nMUSTERSTRASSE 5\n85764 OBERSCHLEISSHEIM\nDEUTSCHLAND\nTransport 100,00 90,00\n";
        let fields = extract(text);
        let receiver = fields.receiver.unwrap();
        assert_eq!(receiver.city.as_deref(), Some("OBERSCHLEISSHEIM"));
        assert_eq!(receiver.zip.as_deref(), Some("85764"));
        assert_eq!(receiver.country.as_deref(), Some("DEUTSCHLAND"));
        assert_eq!(receiver.lines.len(), 4, "cost row must not join the address");
    }

    #[test]
    fn sender_and_receiver_are_distinguished() {
        let text = "Versender: HAMBURG 20095 DEUTSCHLAND\nEmpfänger: SHENZHEN 518000 VOLKSREPUBLIK CHINA\n";
        let fields = extract(text);
        assert_eq!(fields.sender.unwrap().city.as_deref(), Some("HAMBURG"));
        let receiver = fields.receiver.unwrap();
        assert_eq!(receiver.city.as_deref(), Some("SHENZHEN"));
        assert_eq!(receiver.country.as_deref(), Some("VOLKSREPUBLIK CHINA"));
    }

    #[test]
    fn hong_kong_without_city_defaults_to_hong_kong() {
        let fields = extract("Empfänger: HONGKONG\n");
        let receiver = fields.receiver.unwrap();
        assert_eq!(receiver.city.as_deref(), Some("HONG KONG"));
        assert_eq!(receiver.country.as_deref(), Some("HONGKONG"));
    }

    #[test]
    fn unknown_trailing_country_is_kept_raw() {
        let text = "Versender:\nSOME COMPANY\n12345 SOMEWHERE\nNARNIA\n";
        let fields = extract(text);
        let sender = fields.sender.unwrap();
        assert_eq!(sender.country.as_deref(), Some("NARNIA"));
        assert_eq!(sender.city.as_deref(), Some("SOMEWHERE"));
    }

    #[test]
    fn absent_labels_yield_no_parties() {
        let fields = extract("1Z999AA10123456784 WW Express\nGewicht 2,0\n");
        assert!(fields.sender.is_none());
        assert!(fields.receiver.is_none());
    }

    #[test]
    fn address_block_stops_at_cost_rows() {
        let text = "Versender: HAMBURG 20095 DEUTSCHLAND\n748,40 374,25\nnoise\n";
        let fields = extract(text);
        let sender = fields.sender.unwrap();
        assert_eq!(sender.lines.len(), 1);
    }
}
