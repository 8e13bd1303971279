// src/extractors/statements.rs
//! Statement tables and metadata of an opened report page.
//!
//! The portal renders the balance sheet (`MÉRLEGE`) and the income statement
//! (`EREDMÉNYKIMUTATÁS`) as plain HTML tables with no stable ids. Tables are
//! recognised by their heading text and rows by their three-digit line code.
//! Column counts vary: five-column rows carry an amendment column between
//! the previous and the current year, other layouts only guarantee that the
//! previous year is the third cell and the current year the last.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::Vocabulary;
use crate::extractors::amount::parse_amount;
use crate::extractors::identity::capture;
use crate::extractors::text::{cell_text, document_text, visible_text};
use crate::portal::models::{Currency, FinancialRow, FinancialStatement, Unit};

const MIN_CELLS: usize = 3;
const FULL_LAYOUT_CELLS: usize = 5;

// --- CSS Selectors (Lazy Static) ---
static TABLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table").expect("Failed to compile TABLE_SELECTOR")
});
static BODY_ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody tr").expect("Failed to compile BODY_ROW_SELECTOR")
});

// --- Regex Patterns for Text Matching (Lazy Static) ---
static LINE_CODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{3}\.?$").expect("Failed to compile LINE_CODE_RE")
});
static PERIOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{4})\.\s*január\s*\d{1,2}\.\s*[-–]\s*(\d{4})\.\s*december\s*\d{1,2}\.")
        .expect("Failed to compile PERIOD_RE")
});
static FILING_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Elfogadás időpontja:\s*(\d{4}\.\s*\p{L}+\s*\d{1,2}\.?)")
        .expect("Failed to compile FILING_DATE_RE")
});
static CURRENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Pénznem:\s*(HUF|EUR|USD)").expect("Failed to compile CURRENCY_RE")
});
static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Pénzegység:\s*(ezer|millió)").expect("Failed to compile UNIT_RE")
});
static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"A cég elnevezése:\s*([^\n\t]+)").expect("Failed to compile NAME_RE")
});
static REGISTRATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Nyilvántartási száma?:\s*(\d{2}-\d{2}-\d{6})").expect("Failed to compile REGISTRATION_RE")
});
static TAX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Adószáma?:\s*([\d-]+)").expect("Failed to compile TAX_RE")
});
static HEADQUARTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Székhely:\s*([^\n]+)").expect("Failed to compile HEADQUARTER_RE")
});

/// Everything read from a report page. Identity fields here are fallbacks for the company page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedStatements {
    pub company_name: String,
    pub registration_number: String,
    pub tax_number: String,
    pub headquarter: String,
    pub filing_date: String,
    pub currency: Currency,
    pub unit: Unit,
    /// Zero when the page carries no period marker.
    pub previous_year: i32,
    pub target_year: i32,
    pub income_statement: FinancialStatement,
    pub balance_sheet: FinancialStatement,
}

impl ExtractedStatements {
    pub fn has_rows(&self) -> bool {
        !self.income_statement.is_empty() || !self.balance_sheet.is_empty()
    }
}

/// Extracts metadata and both statements from a report page.
pub fn extract_statements(document: &Html, vocabulary: &Vocabulary) -> ExtractedStatements {
    let text = document_text(document);

    let (previous_year, target_year) = PERIOD_RE
        .captures(&text)
        .and_then(|caps| caps.get(2)?.as_str().parse::<i32>().ok())
        .map(|target| (target - 1, target))
        .unwrap_or_else(|| {
            tracing::warn!("Report page has no fiscal period marker");
            (0, 0)
        });

    let currency = Currency::from_code(&capture(&CURRENCY_RE, &text)).unwrap_or_default();
    let unit = Unit::from_label(&capture(&UNIT_RE, &text)).unwrap_or_default();

    let balance_sheet = extract_statement(document, &vocabulary.balance_sheet_heading, vocabulary);
    let income_statement = extract_statement(document, &vocabulary.income_statement_heading, vocabulary);
    tracing::info!(
        "Extracted {} balance sheet rows and {} income statement rows (period {})",
        balance_sheet.len(),
        income_statement.len(),
        target_year
    );

    ExtractedStatements {
        company_name: capture(&NAME_RE, &text),
        registration_number: capture(&REGISTRATION_RE, &text),
        tax_number: capture(&TAX_RE, &text),
        headquarter: capture(&HEADQUARTER_RE, &text),
        filing_date: capture(&FILING_DATE_RE, &text),
        currency,
        unit,
        previous_year,
        target_year,
        income_statement,
        balance_sheet,
    }
}

/// Rows of every table whose text contains `heading`.
/// A row nested inside several matching tables is read once, by the innermost one.
fn extract_statement(document: &Html, heading: &str, vocabulary: &Vocabulary) -> FinancialStatement {
    let token = heading.to_uppercase();
    let tables: Vec<ElementRef> = document
        .select(&TABLE_SELECTOR)
        .filter(|table| visible_text(*table).to_uppercase().contains(&token))
        .collect();
    let table_ids: HashSet<_> = tables.iter().map(|t| t.id()).collect();
    tracing::debug!("{} table(s) classified as '{}'", tables.len(), heading);

    let mut statement = FinancialStatement::default();
    for table in &tables {
        for row in table.select(&BODY_ROW_SELECTOR) {
            let reader = row
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|a| table_ids.contains(&a.id()));
            if reader.map(|r| r.id()) != Some(table.id()) {
                continue;
            }
            if let Some(parsed) = parse_row(row, vocabulary) {
                statement.rows.push(parsed);
            }
        }
    }
    statement
}

fn parse_row(row: ElementRef, vocabulary: &Vocabulary) -> Option<FinancialRow> {
    let cells: Vec<String> = row
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .map(cell_text)
        .collect();
    if cells.len() < MIN_CELLS {
        return None;
    }

    let row_text = visible_text(row).to_lowercase();
    if vocabulary.header_labels.iter().any(|label| row_text.contains(&label.to_lowercase())) {
        return None;
    }

    let parsed = row_from_cells(&cells);
    if parsed.is_none() {
        tracing::trace!("Skipping row without line code: {:?}", cells.first());
    }
    parsed
}

/// Turns the text cells of one statement row into a typed row.
pub fn row_from_cells<S: AsRef<str>>(cells: &[S]) -> Option<FinancialRow> {
    if cells.len() < MIN_CELLS {
        return None;
    }
    let code = cells[0].as_ref().trim();
    let label = cells[1].as_ref().trim();
    if !LINE_CODE_RE.is_match(code) || label.is_empty() {
        return None;
    }

    let (previous_year_value, amendment_value, target_year_value) = if cells.len() == FULL_LAYOUT_CELLS {
        (
            parse_amount(cells[2].as_ref()),
            parse_amount(cells[3].as_ref()),
            parse_amount(cells[4].as_ref()),
        )
    } else {
        (parse_amount(cells[2].as_ref()), 0.0, parse_amount(cells[cells.len() - 1].as_ref()))
    };

    Some(FinancialRow {
        line_code: code.trim_end_matches('.').to_string(),
        label: label.to_string(),
        previous_year_value,
        amendment_value,
        target_year_value,
    })
}
