// src/heuristics/mod.rs

mod cascade;
pub mod containers;
mod generic;
pub mod numeric;
pub mod vocab;

use crate::config::ExtractionConfig;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

pub use numeric::{parse_count, parse_numeric};

/// Container size/type codes the pipeline can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ContainerType {
    #[serde(rename = "20DV")]
    Dry20,
    #[serde(rename = "40DV")]
    Dry40,
    #[default]
    #[serde(rename = "40HC")]
    HighCube40,
    #[serde(rename = "20RF")]
    Reefer20,
    #[serde(rename = "40RF")]
    Reefer40,
    #[serde(rename = "40HR")]
    HighCubeReefer40,
}

impl ContainerType {
    pub fn code(self) -> &'static str {
        match self {
            ContainerType::Dry20 => "20DV",
            ContainerType::Dry40 => "40DV",
            ContainerType::HighCube40 => "40HC",
            ContainerType::Reefer20 => "20RF",
            ContainerType::Reefer40 => "40RF",
            ContainerType::HighCubeReefer40 => "40HR",
        }
    }

    /// Map a size ("20"/"40") and a free-text qualifier ("HC", "REEFER",
    /// "DRY VAN", ...) to a type. Returns `None` for combinations that do not
    /// exist, such as a 20' high cube.
    pub fn from_size_and_qualifier(size: &str, qualifier: &str) -> Option<Self> {
        let q: String = qualifier
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();

        let high_cube_reefer = matches!(q.as_str(), "HIGHCUBEREEFER" | "HCRF" | "HR" | "RH");
        let high_cube = matches!(q.as_str(), "HIGHCUBE" | "HC" | "HQ");
        let reefer = matches!(q.as_str(), "REEFER" | "RF");
        let dry = matches!(
            q.as_str(),
            "DRYVAN" | "DRY" | "DV" | "DC" | "GP" | "STD" | "STANDARD"
        );

        match size.trim() {
            "20" if dry => Some(ContainerType::Dry20),
            "20" if reefer || high_cube_reefer => Some(ContainerType::Reefer20),
            "40" if dry => Some(ContainerType::Dry40),
            "40" if high_cube => Some(ContainerType::HighCube40),
            "40" if reefer => Some(ContainerType::Reefer40),
            "40" if high_cube_reefer => Some(ContainerType::HighCubeReefer40),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One physical container referenced by the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecord {
    pub number: String,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub seal_number: String,
    /// Always 0 here; per-container figures are left for manual entry.
    pub gross_weight: f64,
    /// Always 0 here; see `gross_weight`.
    pub package_count: u32,
}

/// All structured data we can extract from a Bill of Lading transcript.
///
/// Every field is always present; a field the document did not yield keeps
/// its default (empty string, zero, or the default currency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedBlData {
    pub bl_number: String,
    pub vessel_name: String,
    pub voyage_number: String,
    pub port_of_loading: String,
    pub port_of_discharge: String,
    pub client_name: String,
    pub client_address: String,
    pub supplier_name: String,
    pub supplier_country: String,
    pub description: String,
    pub hs_code: String,
    pub packaging: String,
    pub package_count: u32,
    pub gross_weight: f64,
    pub net_weight: f64,
    pub cif_value: f64,
    pub cif_currency: String,
    pub containers: Vec<ContainerRecord>,
}

pub const DEFAULT_CURRENCY: &str = "USD";

impl Default for ExtractedBlData {
    fn default() -> Self {
        Self::empty(DEFAULT_CURRENCY)
    }
}

impl ExtractedBlData {
    /// All-defaults record with the given baseline currency.
    pub fn empty(currency: &str) -> Self {
        Self {
            bl_number: String::new(),
            vessel_name: String::new(),
            voyage_number: String::new(),
            port_of_loading: String::new(),
            port_of_discharge: String::new(),
            client_name: String::new(),
            client_address: String::new(),
            supplier_name: String::new(),
            supplier_country: String::new(),
            description: String::new(),
            hs_code: String::new(),
            packaging: String::new(),
            package_count: 0,
            gross_weight: 0.0,
            net_weight: 0.0,
            cif_value: 0.0,
            cif_currency: currency.to_string(),
            containers: Vec::new(),
        }
    }

    /// How many scalar fields were filled (out of the scalar ones, currency
    /// excluded since it always has a value).
    pub fn coverage(&self) -> (usize, usize) {
        let total = 16;
        let filled = [
            !self.bl_number.is_empty(),
            !self.vessel_name.is_empty(),
            !self.voyage_number.is_empty(),
            !self.port_of_loading.is_empty(),
            !self.port_of_discharge.is_empty(),
            !self.client_name.is_empty(),
            !self.client_address.is_empty(),
            !self.supplier_name.is_empty(),
            !self.supplier_country.is_empty(),
            !self.description.is_empty(),
            !self.hs_code.is_empty(),
            !self.packaging.is_empty(),
            self.package_count > 0,
            self.gross_weight > 0.0,
            self.net_weight > 0.0,
            self.cif_value > 0.0,
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, total)
    }
}

/// Extract structured BL data from a transcript with the stock baseline
/// currency.
pub fn extract_bl(text: &str) -> ExtractedBlData {
    generic::extract(text, DEFAULT_CURRENCY)
}

/// Extract structured BL data using the configured baseline currency. A
/// configured currency that is not a 3-letter code falls back to USD.
pub fn extract_bl_with(text: &str, config: &ExtractionConfig) -> ExtractedBlData {
    let currency = config.default_currency.trim().to_uppercase();
    if vocab::is_currency_code(&currency) {
        generic::extract(text, &currency)
    } else {
        tracing::warn!(configured = %config.default_currency, "Invalid default currency, using USD");
        generic::extract(text, DEFAULT_CURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mapping() {
        assert_eq!(ContainerType::from_size_and_qualifier("40", "HC"), Some(ContainerType::HighCube40));
        assert_eq!(ContainerType::from_size_and_qualifier("40", "high cube"), Some(ContainerType::HighCube40));
        assert_eq!(ContainerType::from_size_and_qualifier("20", "GP"), Some(ContainerType::Dry20));
        assert_eq!(ContainerType::from_size_and_qualifier("40", "DRY VAN"), Some(ContainerType::Dry40));
        assert_eq!(ContainerType::from_size_and_qualifier("20", "REEFER"), Some(ContainerType::Reefer20));
        assert_eq!(ContainerType::from_size_and_qualifier("40", "RF"), Some(ContainerType::Reefer40));
        assert_eq!(ContainerType::from_size_and_qualifier("40", "HC RF"), Some(ContainerType::HighCubeReefer40));
        assert_eq!(ContainerType::from_size_and_qualifier("20", "HC"), None);
        assert_eq!(ContainerType::from_size_and_qualifier("45", "HC"), None);
    }

    #[test]
    fn type_codes_match_serialization() {
        for t in [
            ContainerType::Dry20,
            ContainerType::Dry40,
            ContainerType::HighCube40,
            ContainerType::Reefer20,
            ContainerType::Reefer40,
            ContainerType::HighCubeReefer40,
        ] {
            assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{}\"", t.code()));
        }
        assert_eq!(ContainerType::default(), ContainerType::HighCube40);
    }

    #[test]
    fn defaults_are_total() {
        let data = ExtractedBlData::default();
        assert_eq!(data.cif_currency, "USD");
        assert_eq!(data.coverage(), (0, 16));
        assert!(data.containers.is_empty());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let mut data = ExtractedBlData::default();
        data.bl_number = "MEDU1234567".to_string();
        data.containers.push(ContainerRecord {
            number: "TGHU7654321".to_string(),
            container_type: ContainerType::Dry20,
            seal_number: String::new(),
            gross_weight: 0.0,
            package_count: 0,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["blNumber"], "MEDU1234567");
        assert_eq!(json["cifCurrency"], "USD");
        assert_eq!(json["containers"][0]["type"], "20DV");
        assert_eq!(json["containers"][0]["sealNumber"], "");
    }

    #[test]
    fn missing_fields_deserialize_to_defaults() {
        let data: ExtractedBlData = serde_json::from_str(r#"{"blNumber":"X"}"#).unwrap();
        assert_eq!(data.bl_number, "X");
        assert_eq!(data.cif_currency, "USD");
    }

    #[test]
    fn configured_currency_is_validated() {
        let cfg = ExtractionConfig {
            default_currency: "gnf".to_string(),
        };
        assert_eq!(extract_bl_with("", &cfg).cif_currency, "GNF");
        let cfg = ExtractionConfig {
            default_currency: "FRANCS".to_string(),
        };
        assert_eq!(extract_bl_with("", &cfg).cif_currency, "USD");
    }
}
