// src/portal/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::extractors::names::NameNormalizer;

pub const TAX_ID_DIGITS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchKind {
    Name,
    #[serde(alias = "taxNumber")]
    TaxId,
}

/// What the search form is filled with. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriterion {
    kind: SearchKind,
    value: String,
}

impl SearchCriterion {
    /// Keeps the first eight digits of a tax number, dropping dashes and other separators.
    pub fn tax_id(raw: &str) -> Self {
        let value: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(TAX_ID_DIGITS)
            .collect();
        Self { kind: SearchKind::TaxId, value }
    }

    /// Stores the company name with its legal-form suffix removed.
    pub fn name(raw: &str, normalizer: &NameNormalizer) -> Self {
        Self { kind: SearchKind::Name, value: normalizer.strip_legal_suffix(raw) }
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_tax_id(&self) -> bool {
        self.kind == SearchKind::TaxId
    }
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SearchKind::Name => write!(f, "name '{}'", self.value),
            SearchKind::TaxId => write!(f, "tax number {}", self.value),
        }
    }
}

/// One row of the search results listing, as chosen by the candidate matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultCandidate {
    pub row_index: usize,
    pub merged_name_count: usize,
    pub is_exact_match: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRow {
    pub line_code: String,
    pub label: String,
    pub previous_year_value: f64,
    pub amendment_value: f64,
    pub target_year_value: f64,
}

/// Statement rows in document order; the order is part of the accounting structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub rows: Vec<FinancialRow>,
}

impl FinancialStatement {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, line_code: &str) -> Option<&FinancialRow> {
        self.rows.iter().find(|r| r.line_code == line_code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Huf,
    Eur,
    Usd,
}

impl Currency {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "HUF" => Some(Self::Huf),
            "EUR" => Some(Self::Eur),
            "USD" => Some(Self::Usd),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::Huf => "HUF",
            Self::Eur => "EUR",
            Self::Usd => "USD",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Thousand,
    Million,
}

impl Unit {
    /// Maps the portal's `ezer` / `millió` labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_lowercase().as_str() {
            "ezer" => Some(Self::Thousand),
            "millió" => Some(Self::Million),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thousand => f.write_str("thousand"),
            Self::Million => f.write_str("million"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyFinancialReport {
    pub company_name: String,
    pub registration_number: String,
    pub tax_number: String,
    pub headquarter: String,
    /// The fiscal year the caller asked for.
    pub year: i32,
    pub previous_year: i32,
    pub target_year: i32,
    pub currency: Currency,
    pub unit: Unit,
    pub filing_date: String,
    pub income_statement: FinancialStatement,
    pub balance_sheet: FinancialStatement,
    pub extracted_at: DateTime<Utc>,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Vocabulary;

    #[test]
    fn tax_id_keeps_eight_digits() {
        let criterion = SearchCriterion::tax_id("10537914-4-44");
        assert_eq!(criterion.value(), "10537914");
        assert!(criterion.is_tax_id());
    }

    #[test]
    fn name_criterion_is_suffix_stripped() {
        let normalizer = NameNormalizer::new(&Vocabulary::default());
        let criterion = SearchCriterion::name("OTP Bank Nyrt.", &normalizer);
        assert_eq!(criterion.kind(), SearchKind::Name);
        assert_eq!(criterion.value(), "OTP Bank");
    }

    #[test]
    fn unit_and_currency_labels() {
        assert_eq!(Unit::from_label("millió"), Some(Unit::Million));
        assert_eq!(Unit::from_label("ezer"), Some(Unit::Thousand));
        assert_eq!(Unit::from_label("darab"), None);
        assert_eq!(Currency::from_code("EUR"), Some(Currency::Eur));
        assert_eq!(serde_json::to_string(&Currency::Huf).unwrap(), "\"HUF\"");
        assert_eq!(serde_json::to_string(&Unit::Thousand).unwrap(), "\"thousand\"");
    }
}
