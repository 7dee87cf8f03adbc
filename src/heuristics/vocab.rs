// src/heuristics/vocab.rs
//
// Fixed vocabularies: packaging units, port aliases, countries, currencies.

use super::cascade::compile;
use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Packaging
// ---------------------------------------------------------------------------

/// Unit word (upper case, singular and plural, English and French) to the
/// canonical label of its family.
const PACKAGING_SYNONYMS: &[(&str, &str)] = &[
    ("BAG", "Sac"),
    ("BAGS", "Sac"),
    ("SACK", "Sac"),
    ("SACKS", "Sac"),
    ("SAC", "Sac"),
    ("SACS", "Sac"),
    ("CARTON", "Carton"),
    ("CARTONS", "Carton"),
    ("CTN", "Carton"),
    ("CTNS", "Carton"),
    ("PALLET", "Palette"),
    ("PALLETS", "Palette"),
    ("PALETTE", "Palette"),
    ("PALETTES", "Palette"),
    ("PLT", "Palette"),
    ("PLTS", "Palette"),
    ("BALE", "Balle"),
    ("BALES", "Balle"),
    ("BALLE", "Balle"),
    ("BALLES", "Balle"),
    ("DRUM", "Fût"),
    ("DRUMS", "Fût"),
    ("FUT", "Fût"),
    ("FUTS", "Fût"),
    ("FÛT", "Fût"),
    ("FÛTS", "Fût"),
    ("ROLL", "Rouleau"),
    ("ROLLS", "Rouleau"),
    ("ROULEAU", "Rouleau"),
    ("ROULEAUX", "Rouleau"),
    ("PIECE", "Pièce"),
    ("PIECES", "Pièce"),
    ("PCS", "Pièce"),
    ("PIÈCE", "Pièce"),
    ("PIÈCES", "Pièce"),
    ("BUNDLE", "Fagot"),
    ("BUNDLES", "Fagot"),
    ("FAGOT", "Fagot"),
    ("FAGOTS", "Fagot"),
    ("BOTTE", "Fagot"),
    ("BOTTES", "Fagot"),
];

/// Alternation of every unit word the packaging pattern recognizes. Longer
/// forms come first so the regex prefers `BAGS` over `BAG`.
pub const PACKAGING_UNITS: &str = "BAGS?|SACKS?|SACS?|CARTONS?|CTNS?|PALLETS?|PALETTES?|PLTS?|\
BALES?|BALLES?|DRUMS?|F[UÛ]TS?|ROLLS?|ROULEAUX|ROULEAU|PIECES?|PI[EÈ]CES?|PCS|\
BUNDLES?|FAGOTS?|BOTTES?|PACKAGES?|PKGS?|COLIS";

/// Map a matched unit word to its family label. Unknown words come back
/// upper-cased and otherwise unchanged.
pub fn canonical_packaging(unit: &str) -> String {
    let upper = unit.trim().to_uppercase();
    PACKAGING_SYNONYMS
        .iter()
        .find(|(word, _)| *word == upper)
        .map(|(_, label)| label.to_string())
        .unwrap_or(upper)
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

static PORT_ALIASES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [(
        "CONAKRY",
        r"(?i)\b(?:[CK]ONA[KC]R[YI]|GN\s?CKY)\b",
    )]
    .into_iter()
    .filter_map(|(canonical, pattern)| compile(pattern).map(|re| (canonical, re)))
    .collect()
});

/// Replace a port capture that mentions a known alias with its canonical
/// spelling; anything else is returned as captured.
pub fn canonical_port(raw: &str) -> String {
    PORT_ALIASES
        .iter()
        .find(|(_, re)| re.is_match(raw))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or_else(|| raw.to_string())
}

// ---------------------------------------------------------------------------
// Countries
// ---------------------------------------------------------------------------

const COUNTRIES: &[(&str, &str)] = &[
    ("Chine", r"CHINA|CHINE|P\.?\s?R\.?\s?C\.?"),
    ("Inde", r"INDIA|INDE"),
    ("Turquie", r"TURKEY|T[UÜ]RK[Iİ]YE|TURQUIE"),
    (
        "Émirats arabes unis",
        r"UNITED\s+ARAB\s+EMIRATES|[EÉ]MIRATS\s+ARABES\s+UNIS|U\.A\.E|UAE|DUBAI",
    ),
    ("France", r"FRANCE"),
    ("Belgique", r"BELGIUM|BELGIQUE"),
    ("Pays-Bas", r"NETHERLANDS|HOLLAND|PAYS[\s-]BAS"),
    ("Espagne", r"SPAIN|ESPAGNE"),
    ("Italie", r"ITALY|ITALIE"),
    ("Allemagne", r"GERMANY|ALLEMAGNE"),
    ("Brésil", r"BRAZIL|BR[EÉ]SIL"),
    ("Thaïlande", r"THAILAND|THA[IÏ]LANDE"),
    ("Viêt Nam", r"VIET\s?NAM"),
    ("Malaisie", r"MALAYSIA|MALAISIE"),
    ("Indonésie", r"INDONESIA|INDON[EÉ]SIE"),
    ("Pakistan", r"PAKISTAN"),
    ("États-Unis", r"UNITED\s+STATES|U\.S\.A|USA|[EÉ]TATS[\s-]UNIS"),
    ("Maroc", r"MOROCCO|MAROC"),
    ("Sénégal", r"SENEGAL|S[EÉ]N[EÉ]GAL"),
    ("Côte d'Ivoire", r"IVORY\s+COAST|C[OÔ]TE\s+D['’]\s?IVOIRE"),
    ("Ghana", r"GHANA"),
    ("Nigeria", r"NIGERIA"),
    ("Japon", r"JAPAN|JAPON"),
    ("Corée du Sud", r"SOUTH\s+KOREA|KOREA|COR[EÉ]E\s+DU\s+SUD"),
];

static COUNTRY_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    COUNTRIES
        .iter()
        .filter_map(|(name, aliases)| {
            compile(&format!(r"(?i)\b(?:{aliases})\b")).map(|re| (*name, re))
        })
        .collect()
});

/// Find a known country in an address block. When several appear, the one
/// mentioned last wins, since addresses end with the country line.
pub fn find_country(block: &str) -> Option<String> {
    COUNTRY_PATTERNS
        .iter()
        .filter_map(|(name, re)| re.find_iter(block).last().map(|m| (m.start(), *name)))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, name)| name.to_string())
}

// ---------------------------------------------------------------------------
// Currencies
// ---------------------------------------------------------------------------

const CURRENCIES: &[&str] = &[
    "USD", "EUR", "GNF", "XOF", "CNY", "GBP", "AED", "INR", "TRY", "JPY",
];

/// Normalize a currency mention to a known ISO code.
pub fn normalize_currency(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let code = match upper.as_str() {
        "US$" | "$" | "USD" => "USD",
        "€" | "EUR" | "EURO" | "EUROS" => "EUR",
        "RMB" => "CNY",
        other => CURRENCIES.iter().copied().find(|c| *c == other)?,
    };
    Some(code.to_string())
}

/// Whether a string is usable as a currency code: exactly three ASCII
/// upper-case letters.
pub fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase())
}
