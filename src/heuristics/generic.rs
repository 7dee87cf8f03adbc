// src/heuristics/generic.rs

use super::ExtractedBlData;
use super::cascade::{Cascade, compile};
use super::containers::extract_containers;
use super::numeric::{parse_count, parse_numeric};
use super::vocab::{
    PACKAGING_UNITS, canonical_packaging, canonical_port, find_country, normalize_currency,
};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt::Debug;
use tracing::{debug, trace};

/// Main extraction entry point: one label-anchored cascade per field.
pub fn extract(text: &str, default_currency: &str) -> ExtractedBlData {
    let text = normalize(text);
    let text = text.as_str();

    let bl_number = run(&BL_NUMBER, text).unwrap_or_default();

    let consignee = capture_block(text, &CONSIGNEE_LABELS);
    let (client_name, client_address) = split_block(&consignee);

    let shipper = capture_block(text, &SHIPPER_LABELS);
    let (supplier_name, _) = split_block(&shipper);
    let supplier_country = find_country(&shipper.join("\n")).unwrap_or_default();

    let packaging_hit = run(&PACKAGING, text);
    let package_count = run(&PACKAGE_COUNT, text)
        .or_else(|| packaging_hit.as_ref().map(|(count, _)| *count))
        .unwrap_or(0);
    let packaging = packaging_hit
        .map(|(_, unit)| canonical_packaging(&unit))
        .unwrap_or_default();

    let (cif_value, cif_currency) = match run(&CIF_VALUE, text) {
        Some(cif) => (cif.value, cif.currency),
        None => (0.0, None),
    };
    let cif_currency = cif_currency
        .or_else(|| run(&CURRENCY, text))
        .unwrap_or_else(|| default_currency.to_string());

    let containers = extract_containers(text, &bl_number);

    let data = ExtractedBlData {
        vessel_name: run(&VESSEL, text).unwrap_or_default(),
        voyage_number: run(&VOYAGE, text).unwrap_or_default(),
        port_of_loading: run(&PORT_OF_LOADING, text).unwrap_or_default(),
        port_of_discharge: run(&PORT_OF_DISCHARGE, text)
            .map(|port| canonical_port(&port))
            .unwrap_or_default(),
        client_name,
        client_address,
        supplier_name,
        supplier_country,
        description: run(&DESCRIPTION, text).unwrap_or_default(),
        hs_code: run(&HS_CODE, text).unwrap_or_default(),
        packaging,
        package_count,
        gross_weight: run(&GROSS_WEIGHT, text).unwrap_or(0.0),
        net_weight: run(&NET_WEIGHT, text).unwrap_or(0.0),
        cif_value,
        cif_currency,
        containers,
        bl_number,
    };

    let (filled, total) = data.coverage();
    debug!(
        filled,
        total,
        bl_number = %data.bl_number,
        containers = data.containers.len(),
        "BL extraction result"
    );
    data
}

fn run<T: Debug>(cascade: &Cascade<T>, text: &str) -> Option<T> {
    let value = cascade.first_match(text);
    trace!(field = cascade.field(), value = ?value, "Cascade evaluated");
    value
}

/// Line endings to `\n`, non-breaking spaces to plain spaces.
fn normalize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{a0}', " ")
}

// ---------------------------------------------------------------------------
// Shared pattern fragments
// ---------------------------------------------------------------------------

/// A numeral in either locale; space-grouped thousands are allowed.
const NUM: &str = r"([0-9]{1,3}(?: [0-9]{3})+(?:[.,][0-9]+)?|[0-9][0-9.,]*[0-9]|[0-9])";

/// A currency mention next to an amount.
const CUR: &str = r"US\$|\$|€|EUROS?|[A-Z]{3}";

fn pattern(template: &str) -> String {
    template.replace("<NUM>", NUM).replace("<CUR>", CUR)
}

/// Start of a line that opens another section of the document.
static SECTION_LABEL: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(
        r"(?i)^(?:ALSO\s+NOTIFY|NOTIFY|NOTIFIER|PARTIE\s+[AÀ]\s+NOTIFIER|PORT\s+(?:OF|DE)\b|PLACE\s+OF|LIEU\s+DE|(?:OCEAN\s+)?VESSEL|NAVIRE|VOYAGE|GOODS|MARCHANDISES|DESCRIPTION|MARKS|MARQUES|CONTAINER|CONTENEUR|FREIGHT|FRET|SHIPPER|EXP[EÉ]DITEUR|CHARGEUR|CONSIGNEE|DESTINATAIRE|PRE-?\s?CARRIAGE|B/L\b|BILL\s+OF\s+LADING|FORWARDING|DELIVERY|NUMBER\s+OF|NOMBRE\s+DE|GROSS|POIDS|SAID\s+TO|BOOKING)",
    )
});

fn is_section_label(line: &str) -> bool {
    SECTION_LABEL
        .as_ref()
        .is_some_and(|re| re.is_match(line.trim_start()))
}

/// Three or more spaces, or a tab, separate layout columns.
static COLUMN_GAP: Lazy<Option<Regex>> = Lazy::new(|| compile(r" {3,}|\t"));

static VOYAGE_SUFFIX: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?i)\s+(?:V\.|VOY\.?|VOYAGE)\s*[A-Z0-9\-/]*$"));

fn first_column(line: &str) -> &str {
    match COLUMN_GAP.as_ref().and_then(|re| re.find(line)) {
        Some(m) => &line[..m.start()],
        None => line,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tidy a captured line: first layout column, single spaces, no stray
/// punctuation at the ends. Labels are not values.
fn clean_value(raw: &str) -> Option<String> {
    let column = first_column(raw.trim());
    let value = collapse_whitespace(column);
    let value = value
        .trim_matches(|c: char| matches!(c, ':' | ';' | ',' | '-') || c.is_whitespace())
        .to_string();
    if value.is_empty() || is_section_label(&value) {
        None
    } else {
        Some(value)
    }
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

fn line_value(caps: &Captures<'_>) -> Option<String> {
    clean_value(caps.get(1)?.as_str())
}

/// The text on the line below a label, starting at the label's column.
/// Group 1 is everything left of the label, group 2 the next line.
fn aligned_below(caps: &Captures<'_>) -> Option<String> {
    let column = caps.get(1)?.as_str().chars().count();
    let below: Vec<char> = caps.get(2)?.as_str().chars().collect();
    if column >= below.len() {
        return None;
    }
    // Step back to the start of a word cut by the label's column.
    let mut start = column;
    while start > 0 && !below[start - 1].is_whitespace() {
        start -= 1;
    }
    let rest: String = below[start..].iter().collect();
    clean_value(&rest)
}

/// Vessel names often carry the voyage: "MSC ANNA V.123W".
fn strip_voyage(value: String) -> Option<String> {
    let trimmed = match VOYAGE_SUFFIX.as_ref() {
        Some(re) => re.replace(&value, "").trim().to_string(),
        None => value,
    };
    (!trimmed.is_empty()).then_some(trimmed)
}

fn vessel_value(caps: &Captures<'_>) -> Option<String> {
    strip_voyage(line_value(caps)?)
}

fn vessel_aligned(caps: &Captures<'_>) -> Option<String> {
    strip_voyage(aligned_below(caps)?)
}

/// Identifier token: upper-cased, must carry a digit.
fn id_token(caps: &Captures<'_>) -> Option<String> {
    id_from(caps.get(1)?.as_str())
}

fn id_token_2(caps: &Captures<'_>) -> Option<String> {
    id_from(caps.get(2)?.as_str())
}

fn id_from(raw: &str) -> Option<String> {
    let token = raw.trim().trim_end_matches(['-', '/']).to_uppercase();
    token
        .chars()
        .any(|c| c.is_ascii_digit())
        .then_some(token)
}

fn hs_digits(caps: &Captures<'_>) -> Option<String> {
    let code: String = caps.get(1)?.as_str().chars().filter(|c| *c != ' ').collect();
    (!code.is_empty()).then_some(code)
}

fn weight(caps: &Captures<'_>) -> Option<f64> {
    let value = parse_numeric(caps.get(1)?.as_str());
    (value > 0.0).then_some(value)
}

fn count(caps: &Captures<'_>) -> Option<u32> {
    let value = parse_count(caps.get(1)?.as_str());
    (value > 0).then_some(value)
}

fn packaging(caps: &Captures<'_>) -> Option<(u32, String)> {
    let count = parse_count(caps.get(1)?.as_str());
    let unit = caps.get(2)?.as_str().to_string();
    (count > 0).then_some((count, unit))
}

#[derive(Debug)]
struct CifCapture {
    value: f64,
    currency: Option<String>,
}

/// Groups: 1 bracketed currency, 2 leading currency, 3 amount, 4 trailing
/// currency.
fn cif(caps: &Captures<'_>) -> Option<CifCapture> {
    let value = parse_numeric(caps.get(3)?.as_str());
    if value <= 0.0 {
        return None;
    }
    let currency = [1, 2, 4]
        .into_iter()
        .filter_map(|idx| caps.get(idx))
        .find_map(|m| normalize_currency(m.as_str()));
    Some(CifCapture { value, currency })
}

fn currency(caps: &Captures<'_>) -> Option<String> {
    normalize_currency(caps.get(1)?.as_str())
}

// ---------------------------------------------------------------------------
// Scalar field cascades
// ---------------------------------------------------------------------------

static BL_NUMBER: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("bl_number")
        .rule(
            r"(?i)\b(?:B/L|BL|BILL\s+OF\s+LADING)\s*(?:NUMBER|NO\.?|N[O°º]\.?|#)\s*[:.]?\s*([A-Z0-9][A-Z0-9\-/]{5,24})",
            id_token,
        )
        .rule(
            r"(?i)\bCONNAISSEMENT\s*(?:NUM[EÉ]RO|N[O°º]\.?)?\s*[:.]?\s*([A-Z0-9][A-Z0-9\-/]{5,24})",
            id_token,
        )
        .rule(
            r"\b((?:MEDU|MSCU|MAEU|MSKU|CMAU|CMDU|HLCU|COSU|OOLU|EGLV|ONEY|GRIU|SAFM|ZIMU|HDMU|YMLU|PCIU|SUDU)[0-9]{7})\b",
            id_token,
        )
        .rule(r"(?i)\bB/?L\s*[:#]\s*([A-Z0-9][A-Z0-9\-/]{5,24})", id_token)
});

/// "VESSEL / VOYAGE: MSC ANNA / 123W": group 1 vessel, group 2 voyage.
const VESSEL_AND_VOYAGE: &str = r"(?i)\b(?:VESSEL|NAVIRE)\s*(?:&|/|AND|ET)\s*VOY(?:AGE)?\.?(?:\s*(?:NUMBER|NO\.?|N[O°º]\.?))?[ \t]*[:.]?\s*([A-Z][A-Z0-9 .\-]*?)[ \t]*(?:/|\bV(?:OY)?\.)[ \t]*([A-Z0-9][A-Z0-9\-]{1,11})\b";

fn combined_vessel(caps: &Captures<'_>) -> Option<String> {
    line_value(caps)
}

static VESSEL: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("vessel_name")
        .rule(VESSEL_AND_VOYAGE, combined_vessel)
        .rule(
            r"(?im)\b(?:OCEAN\s+)?VESSEL(?:\s+NAME)?[ \t]*[:.][ \t]*([^\n/]+)",
            vessel_value,
        )
        .rule(
            r"(?im)^([^\n]*?)\b(?:OCEAN[ \t]+)?VESSEL(?:[ \t]+NAME)?\b[^\n]*\n([^\n]*)",
            vessel_aligned,
        )
        .rule(
            r"(?im)\b(?:NOM\s+DU\s+)?NAVIRE[ \t]*[:.][ \t]*([^\n/]+)",
            vessel_value,
        )
        .rule(r"(?m)\bM/V[ \t]+([A-Z][A-Z0-9 \-]{2,40})", vessel_value)
});

static VOYAGE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("voyage_number")
        .rule(VESSEL_AND_VOYAGE, id_token_2)
        .rule(
            r"(?i)\bVOY(?:AGE)?\.?(?:[ \t]*(?:NUMBER|NO\.?|N[O°º]\.?))?[ \t]*[:.#]?\s*([A-Z0-9][A-Z0-9\-/]{1,11})\b",
            id_token,
        )
        .rule(
            r"(?i)\bN[O°º]\.?\s+(?:DE\s+)?VOYAGE\s*[:.]?\s*([A-Z0-9][A-Z0-9\-/]{1,11})\b",
            id_token,
        )
        .rule(
            r"(?m)\b(?:M/V|VESSEL|NAVIRE)\b[^\n]*?[ \t]V\.?[ \t]*([0-9][A-Z0-9]{1,10})\b",
            id_token,
        )
});

static PORT_OF_LOADING: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("port_of_loading")
        .rule(
            r"(?im)\bPORT[ \t]+OF[ \t]+LOADING\b[ \t]*[:.]?[ \t]*([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)^([^\n]*?)\bPORT[ \t]+OF[ \t]+LOADING\b[^\n]*\n([^\n]*)",
            aligned_below,
        )
        .rule(
            r"(?im)\b(?:PORT|LIEU)[ \t]+DE[ \t]+CHARGEMENT\b[ \t]*[:.]?[ \t]*([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)^([^\n]*?)\b(?:PORT|LIEU)[ \t]+DE[ \t]+CHARGEMENT\b[^\n]*\n([^\n]*)",
            aligned_below,
        )
        .rule(
            r"(?im)\b(?:LOADING[ \t]+PORT|P\.?O\.?L\.?)[ \t]*:[ \t]*([^\n]+)",
            line_value,
        )
});

static PORT_OF_DISCHARGE: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("port_of_discharge")
        .rule(
            r"(?im)\bPORT[ \t]+OF[ \t]+DISCHARGE\b[ \t]*[:.]?[ \t]*([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)^([^\n]*?)\bPORT[ \t]+OF[ \t]+DISCHARGE\b[^\n]*\n([^\n]*)",
            aligned_below,
        )
        .rule(
            r"(?im)\bPORT[ \t]+DE[ \t]+D[EÉ](?:CHARGEMENT|BARQUEMENT)\b[ \t]*[:.]?[ \t]*([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)^([^\n]*?)\bPORT[ \t]+DE[ \t]+D[EÉ](?:CHARGEMENT|BARQUEMENT)\b[^\n]*\n([^\n]*)",
            aligned_below,
        )
        .rule(
            r"(?im)\b(?:DISCHARG(?:E|ING)[ \t]+PORT|P\.?O\.?D\.?)[ \t]*:[ \t]*([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)\b(?:PLACE[ \t]+OF[ \t]+DELIVERY|LIEU[ \t]+DE[ \t]+LIVRAISON|FINAL[ \t]+DESTINATION)\b[ \t]*[:.]?[ \t]*([^\n]+)",
            line_value,
        )
});

static DESCRIPTION: Lazy<Cascade<String>> = Lazy::new(|| {
    const LABEL: &str = r"(?:DESCRIPTION[ \t]+OF[ \t]+(?:THE[ \t]+)?GOODS|DESCRIPTION[ \t]+OF[ \t]+PACKAGES[ \t]+AND[ \t]+GOODS|D[EÉ]SIGNATION[ \t]+DES[ \t]+MARCHANDISES|NATURE[ \t]+(?:OF[ \t]+GOODS|DES[ \t]+MARCHANDISES))";
    Cascade::new("description")
        .rule(
            &format!(r"(?im)\b{LABEL}\b[ \t]*[:.]?[ \t]*([^\n]+)"),
            line_value,
        )
        .rule(
            &format!(r"(?im)^([^\n]*?)\b{LABEL}\b[^\n]*\n([^\n]*)"),
            aligned_below,
        )
        .rule(
            r"(?im)\b(?:SAID[ \t]+TO[ \t]+CONTAIN|S\.T\.C\.?|STC)\b[ \t]*[:.]?[ \t]*(?:\n[ \t]*)?([^\n]+)",
            line_value,
        )
        .rule(
            r"(?im)^[ \t]*(?:GOODS|COMMODITY|MARCHANDISES?|DESCRIPTION)[ \t]*:[ \t]*([^\n]+)",
            line_value,
        )
});

static HS_CODE: Lazy<Cascade<String>> = Lazy::new(|| {
    const CODE: &str = r"([0-9]{4}(?:[. ]?[0-9]{2}){0,3})\b";
    Cascade::new("hs_code")
        .rule(
            &format!(
                r"(?i)\b(?:H\.?S\.?(?:[ \t]*(?:CODE|TARIFF(?:[ \t]+CODE)?))?|HARMONI[SZ]ED[ \t]+(?:SYSTEM[ \t]+)?CODE|CODE[ \t]+(?:SH|HS|TARIFAIRE|DOUANIER)|NOMENCLATURE(?:[ \t]+DOUANI[EÈ]RE)?)[ \t]*(?:NO\.?|N[O°º]\.?)?[ \t]*[:.#]?[ \t]*{CODE}"
            ),
            hs_digits,
        )
        .rule(
            &format!(r"(?i)\b(?:TARIFF|NCM|HTS|SH)[ \t]*(?:CODE|NO\.?)?[ \t]*[:#][ \t]*{CODE}"),
            hs_digits,
        )
});

static GROSS_WEIGHT: Lazy<Cascade<f64>> = Lazy::new(|| {
    Cascade::new("gross_weight")
        .rule(
            &pattern(
                r"(?i)\b(?:GROSS\s+WEIGHT|GROSS\s+WT\.?|G\.\s?W\.?|POIDS\s+BRUT(?:\s+TOTAL)?)(?:\s*\((?:KGS?|KILOS?)\))?\s*[:.]?\s*(?:KGS?\.?\s*)?<NUM>",
            ),
            weight,
        )
        .rule(
            &pattern(r"(?i)<NUM>\s*(?:KGS|KG|KILOS?|KILOGRAMM?ES?|KILOGRAMS?)\b"),
            weight,
        )
});

static NET_WEIGHT: Lazy<Cascade<f64>> = Lazy::new(|| {
    Cascade::new("net_weight").rule(
        &pattern(
            r"(?i)\b(?:NET\s+WEIGHT|NET\s+WT\.?|N\.\s?W\.?|POIDS\s+NET)(?:\s*\((?:KGS?|KILOS?)\))?\s*[:.]?\s*(?:KGS?\.?\s*)?<NUM>",
        ),
        weight,
    )
});

static PACKAGE_COUNT: Lazy<Cascade<u32>> = Lazy::new(|| {
    Cascade::new("package_count").rule(
        r"(?i)\b(?:(?:TOTAL\s+)?(?:NUMBER|NO\.?)\s+OF\s+(?:PACKAGES|PKGS|PIECES)|TOTAL\s+(?:PACKAGES|PKGS)|NOMBRE\s+(?:TOTAL\s+)?DE\s+COLIS|NBRE\s+(?:DE\s+)?COLIS)\s*[:.]?\s*([0-9]{1,3}(?:[,. ][0-9]{3})+|[0-9]+)",
        count,
    )
});

static PACKAGING: Lazy<Cascade<(u32, String)>> = Lazy::new(|| {
    Cascade::new("packaging").rule(
        &format!(r"(?i)\b([0-9]{{1,3}}(?:[,.][0-9]{{3}})+|[0-9]+)\s*({PACKAGING_UNITS})\b"),
        packaging,
    )
});

static CIF_VALUE: Lazy<Cascade<CifCapture>> = Lazy::new(|| {
    const AMOUNT: &str =
        r"\s*(?:\(\s*(<CUR>)\s*\))?\s*[:.=]?\s*(<CUR>)?\s*<NUM>(?:[ \t]*(<CUR>))?";
    Cascade::new("cif_value")
        .rule(
            &pattern(&format!(
                r"(?i)\b(?:CIF\s+VALUE|VALUE\s+CIF|VALEUR\s+CIF|CIF\s+AMOUNT|MONTANT\s+CIF|TOTAL\s+CIF|CIF)\b{AMOUNT}"
            )),
            cif,
        )
        .rule(
            &pattern(&format!(
                r"(?i)\b(?:INVOICE\s+VALUE|VALEUR\s+(?:DE\s+LA\s+)?FACTURE|DECLARED\s+VALUE|VALEUR\s+D[EÉ]CLAR[EÉ]E|TOTAL\s+VALUE|VALEUR\s+TOTALE)\b{AMOUNT}"
            )),
            cif,
        )
});

static CURRENCY: Lazy<Cascade<String>> = Lazy::new(|| {
    Cascade::new("cif_currency").rule(
        &pattern(r"(?i)\b(?:CURRENCY|DEVISE|MONNAIE)\s*[:.]?\s*(<CUR>)"),
        currency,
    )
});

// ---------------------------------------------------------------------------
// Party blocks
// ---------------------------------------------------------------------------

static CONSIGNEE_LABELS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^[ \t]*(?:CONSIGNEE|DESTINATAIRE)\b",
        r"(?i)\b(?:CONSIGNEE|DESTINATAIRE)\b",
    ]
    .into_iter()
    .filter_map(compile)
    .collect()
});

static SHIPPER_LABELS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^[ \t]*(?:SHIPPER|EXP[EÉ]DITEUR|CHARGEUR)\b",
        r"(?i)\b(?:SHIPPER|EXP[EÉ]DITEUR|CHARGEUR)\b",
    ]
    .into_iter()
    .filter_map(compile)
    .collect()
});

/// What may follow a party label on its own line before the party itself:
/// "/EXPORTER", "(COMPLETE NAME AND ADDRESS)", ":".
static LABEL_TAIL: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"(?i)^(?:\s*/\s*[A-Z]+|\s*\([^)\n]*\)|\s*[:.\-])*\s*"));

const MAX_BLOCK_LINES: usize = 6;

/// Lines of a party block: the remainder of the label line, then following
/// lines until the next section label. Label regexes are tried in order and
/// the first one yielding a non-empty block wins.
fn capture_block(text: &str, labels: &[Regex]) -> Vec<String> {
    labels
        .iter()
        .filter_map(|label| label.find(text))
        .map(|m| block_after(&text[m.end()..]))
        .find(|lines| !lines.is_empty())
        .unwrap_or_default()
}

fn block_after(rest: &str) -> Vec<String> {
    let mut lines = Vec::new();

    for (idx, raw) in rest.lines().enumerate() {
        let line = if idx == 0 {
            match LABEL_TAIL.as_ref() {
                Some(re) => re.replace(raw, "").into_owned(),
                None => raw.to_string(),
            }
        } else {
            raw.to_string()
        };
        let line = line.trim();

        if is_section_label(line) {
            // Label-line remainder that is itself a header: skip it, keep going.
            if idx == 0 {
                continue;
            }
            break;
        }

        let value = collapse_whitespace(first_column(line));
        if !value.is_empty() {
            lines.push(value);
        }
        if lines.len() >= MAX_BLOCK_LINES {
            break;
        }
    }

    lines
}

/// First line is the party name, the rest its address.
fn split_block(lines: &[String]) -> (String, String) {
    match lines.split_first() {
        Some((name, address)) => (name.clone(), address.join(", ")),
        None => (String::new(), String::new()),
    }
}
