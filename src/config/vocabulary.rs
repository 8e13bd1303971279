// src/config/vocabulary.rs
//! Portal wording the extractors match against.
//!
//! Everything here tracks the portal's Hungarian UI text. When the site
//! rewords a heading or the registry adds a legal form, ship a new
//! vocabulary file instead of touching the matching code.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::utils::AppError;

pub const DEFAULT_VOCABULARY_VERSION: &str = "2024-e-beszamolo";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub version: String,
    /// Legal-form suffixes stripped before comparing company names.
    /// Matched case-insensitively with an optional trailing period.
    pub legal_suffixes: Vec<String>,
    /// Lowercase fragments marking header/subtotal rows inside statement tables.
    pub header_labels: Vec<String>,
    /// Column header identifying the search results table.
    pub results_header: String,
    pub balance_sheet_heading: String,
    pub income_statement_heading: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            version: DEFAULT_VOCABULARY_VERSION.to_string(),
            legal_suffixes: [
                "Nyrt",
                "Zrt",
                "Kft",
                "Bt",
                "Kkt",
                "Rt",
                "Szövetkezet",
                "Egyesülés",
                "Alapítvány",
                "Egyesület",
                "Korlátolt Felelősségű Társaság",
                "Zártkörűen Működő Részvénytársaság",
                "Nyilvánosan Működő Részvénytársaság",
                "Betéti Társaság",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            header_labels: [
                "sorszám",
                "előző üzleti év",
                "tételsor elnevezése",
                "lezárt üzleti év",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            results_header: "Cégnév".to_string(),
            balance_sheet_heading: "MÉRLEGE".to_string(),
            income_statement_heading: "EREDMÉNYKIMUTATÁS".to_string(),
        }
    }
}

impl Vocabulary {
    /// Loads a vocabulary from a JSON file. Fields missing from the file keep their defaults.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let vocabulary: Vocabulary = serde_json::from_str(&raw).map_err(|e| {
            AppError::Config(format!("Invalid vocabulary file {}: {}", path.display(), e))
        })?;
        tracing::info!("Loaded vocabulary version {} from {}", vocabulary.version, path.display());
        Ok(vocabulary)
    }
}
