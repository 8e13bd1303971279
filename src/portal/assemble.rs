// src/portal/assemble.rs
use chrono::{DateTime, Utc};

use crate::extractors::identity::CompanyIdentity;
use crate::extractors::statements::ExtractedStatements;
use crate::portal::models::CompanyFinancialReport;

/// Where and when a report was read, plus what the caller searched for.
#[derive(Debug, Clone)]
pub struct Provenance {
    pub requested_year: i32,
    /// The name as the caller typed it, before suffix stripping.
    pub original_name: Option<String>,
    pub search_value: String,
    pub source_url: String,
    pub extracted_at: DateTime<Utc>,
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Merges the company page and report page extractions.
/// Company page values win; the report page fills gaps.
pub fn assemble_report(
    company: CompanyIdentity,
    report: ExtractedStatements,
    provenance: Provenance,
) -> CompanyFinancialReport {
    let company_name = first_non_empty(&[
        &company.company_name,
        &report.company_name,
        provenance.original_name.as_deref().unwrap_or_default(),
        &provenance.search_value,
    ]);
    let year = provenance.requested_year;

    CompanyFinancialReport {
        company_name,
        registration_number: first_non_empty(&[&company.registration_number, &report.registration_number]),
        tax_number: first_non_empty(&[&company.tax_number, &report.tax_number]),
        headquarter: first_non_empty(&[&company.headquarter, &report.headquarter]),
        year,
        previous_year: if report.previous_year != 0 { report.previous_year } else { year - 1 },
        target_year: if report.target_year != 0 { report.target_year } else { year },
        currency: report.currency,
        unit: report.unit,
        filing_date: report.filing_date,
        income_statement: report.income_statement,
        balance_sheet: report.balance_sheet,
        extracted_at: provenance.extracted_at,
        source_url: provenance.source_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portal::models::{Currency, FinancialRow, FinancialStatement};

    fn provenance(original_name: Option<&str>) -> Provenance {
        Provenance {
            requested_year: 2023,
            original_name: original_name.map(str::to_string),
            search_value: "Minta".to_string(),
            source_url: "https://portal.test/beszamolo/1".to_string(),
            extracted_at: Utc::now(),
        }
    }

    fn statements() -> ExtractedStatements {
        ExtractedStatements {
            company_name: "MINTA KFT. (beszámoló)".to_string(),
            registration_number: "01-09-000001".to_string(),
            tax_number: "11111111-2-41".to_string(),
            headquarter: "Győr".to_string(),
            currency: Currency::Eur,
            balance_sheet: FinancialStatement {
                rows: vec![FinancialRow {
                    line_code: "001".to_string(),
                    label: "Eszközök".to_string(),
                    previous_year_value: 1.0,
                    amendment_value: 0.0,
                    target_year_value: 2.0,
                }],
            },
            ..ExtractedStatements::default()
        }
    }

    #[test]
    fn company_page_values_win() {
        let company = CompanyIdentity {
            company_name: "MINTA KFT.".to_string(),
            registration_number: String::new(),
            tax_number: "22222222-2-42".to_string(),
            headquarter: "  ".to_string(),
        };
        let report = assemble_report(company, statements(), provenance(Some("Minta Kft.")));

        assert_eq!(report.company_name, "MINTA KFT.");
        assert_eq!(report.tax_number, "22222222-2-42");
        assert_eq!(report.registration_number, "01-09-000001");
        assert_eq!(report.headquarter, "Győr");
        assert_eq!(report.currency, Currency::Eur);
        assert_eq!(report.balance_sheet.len(), 1);
        assert_eq!(report.source_url, "https://portal.test/beszamolo/1");
    }

    #[test]
    fn name_falls_back_to_original_search_string() {
        let report = assemble_report(
            CompanyIdentity::default(),
            ExtractedStatements::default(),
            provenance(Some("Minta Kft.")),
        );
        assert_eq!(report.company_name, "Minta Kft.");

        let report = assemble_report(CompanyIdentity::default(), ExtractedStatements::default(), provenance(None));
        assert_eq!(report.company_name, "Minta");
    }

    #[test]
    fn missing_period_falls_back_to_requested_year() {
        let report = assemble_report(CompanyIdentity::default(), statements(), provenance(None));
        assert_eq!((report.year, report.previous_year, report.target_year), (2023, 2022, 2023));
    }
}
