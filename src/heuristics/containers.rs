// src/heuristics/containers.rs

use super::cascade::compile;
use super::{ContainerRecord, ContainerType};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// ISO 6346 shape: owner code + category letter, six-digit serial, check
/// digit. A dash before the check digit is tolerated and dropped.
static CONTAINER_NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| compile(r"\b([A-Z]{4})([0-9]{6})-?([0-9])\b"));

static SEAL_NUMBER: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(
        r"(?i)\b(?:SEALS?|SCELL[EÉ]S?|PLOMBS?)\b(?:\s*(?:NUMBER|NO\.?|N[O°º]\.?|#))?\s*[:.#]?\s*([A-Z0-9][A-Z0-9\-]{3,19})",
    )
});

static CONTAINER_TYPE: Lazy<Option<Regex>> = Lazy::new(|| {
    compile(
        r"(?i)(?:\b|X)(20|40)\s*(?:'|’|FT\.?|FEET|PIEDS)?\s*-?\s*(HIGH\s*CUBE\s*REEFER|HC\s*RF|HCRF|HR|RH|HIGH\s*CUBE|HC|HQ|REEFER|RF|DRY\s*VAN|DRY|DV|DC|GP|STD|STANDARD)\b",
    )
});

/// Container numbers in order of first appearance, without duplicates.
pub fn scan_container_numbers(text: &str) -> Vec<String> {
    let Some(re) = CONTAINER_NUMBER.as_ref() else {
        return Vec::new();
    };
    let mut numbers: Vec<String> = Vec::new();
    for cap in re.captures_iter(text) {
        let number = format!("{}{}{}", &cap[1], &cap[2], &cap[3]);
        if !numbers.contains(&number) {
            numbers.push(number);
        }
    }
    numbers
}

fn looks_like_container(token: &str) -> bool {
    CONTAINER_NUMBER
        .as_ref()
        .is_some_and(|re| re.find(token).is_some_and(|m| m.len() == token.len()))
}

/// Seal numbers in order of appearance. A token must carry a digit and must
/// not itself be a container number (tables often read "CONTAINER / SEAL").
pub fn scan_seal_numbers(text: &str) -> Vec<String> {
    let Some(re) = SEAL_NUMBER.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .map(|cap| cap[1].to_uppercase())
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
        .filter(|token| !looks_like_container(token))
        .collect()
}

/// Container types in order of appearance (repeats kept, one per mention).
pub fn scan_container_types(text: &str) -> Vec<ContainerType> {
    let Some(re) = CONTAINER_TYPE.as_ref() else {
        return Vec::new();
    };
    re.captures_iter(text)
        .filter_map(|cap| ContainerType::from_size_and_qualifier(&cap[1], &cap[2]))
        .collect()
}

/// 4-letter carrier prefix of a BL number, if it has one.
fn carrier_prefix(bl_number: &str) -> Option<&str> {
    let prefix = bl_number.get(..4)?;
    prefix
        .chars()
        .all(|c| c.is_ascii_uppercase())
        .then_some(prefix)
}

/// Build the container list.
///
/// Numbers, seals and types are scanned independently and paired by list
/// index. The i-th number gets the i-th seal (or an empty seal) and the i-th
/// type; when there is no type at that index it gets the first type found
/// anywhere, or [`ContainerType::default`] when none was found. This assumes
/// the document lists all three in the same order, which holds for common
/// layouts only.
pub fn extract_containers(text: &str, bl_number: &str) -> Vec<ContainerRecord> {
    let excluded = carrier_prefix(bl_number);
    let numbers: Vec<String> = scan_container_numbers(text)
        .into_iter()
        .filter(|n| excluded.is_none_or(|prefix| !n.starts_with(prefix)))
        .collect();
    let seals = scan_seal_numbers(text);
    let types = scan_container_types(text);

    debug!(
        containers = numbers.len(),
        seals = seals.len(),
        types = types.len(),
        excluded_prefix = ?excluded,
        "Container scan"
    );

    zip_containers(numbers, &seals, &types)
}

/// Positional zip with the fallback policy described on [`extract_containers`].
pub fn zip_containers(
    numbers: Vec<String>,
    seals: &[String],
    types: &[ContainerType],
) -> Vec<ContainerRecord> {
    let fallback_type = types.first().copied().unwrap_or_default();

    numbers
        .into_iter()
        .enumerate()
        .map(|(idx, number)| ContainerRecord {
            number,
            container_type: types.get(idx).copied().unwrap_or(fallback_type),
            seal_number: seals.get(idx).cloned().unwrap_or_default(),
            gross_weight: 0.0,
            package_count: 0,
        })
        .collect()
}
