// src/export.rs
use std::io::Write;

use clap::ValueEnum;

use crate::extractors::amount::format_amount;
use crate::portal::models::{CompanyFinancialReport, FinancialStatement};
use crate::utils::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

pub fn write_report<W: Write>(
    report: &CompanyFinancialReport,
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Json => write_json(report, writer),
        ExportFormat::Csv => write_csv(report, writer),
    }
}

/// Pretty-printed report, the same shape the result event carries.
pub fn write_json<W: Write>(report: &CompanyFinancialReport, mut writer: W) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Semicolon separated sheet: a metadata block, then one section per statement.
/// Amounts keep the portal's number format so spreadsheets in the source locale read them as numbers.
pub fn write_csv<W: Write>(report: &CompanyFinancialReport, writer: W) -> Result<(), ExportError> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_writer(writer);

    let metadata = [
        ("Cégnév", report.company_name.clone()),
        ("Cégjegyzékszám", report.registration_number.clone()),
        ("Adószám", report.tax_number.clone()),
        ("Székhely", report.headquarter.clone()),
        ("Üzleti év", report.year.to_string()),
        ("Pénznem", report.currency.to_string()),
        ("Pénzegység", report.unit.to_string()),
        ("Elfogadás időpontja", report.filing_date.clone()),
        ("Forrás", report.source_url.clone()),
        ("Kinyerve", report.extracted_at.to_rfc3339()),
    ];
    for (key, value) in &metadata {
        out.write_record([*key, value.as_str()])?;
    }

    write_section(&mut out, "MÉRLEG", &report.balance_sheet, report)?;
    write_section(&mut out, "EREDMÉNYKIMUTATÁS", &report.income_statement, report)?;

    out.flush()?;
    Ok(())
}

fn write_section<W: Write>(
    out: &mut csv::Writer<W>,
    title: &str,
    statement: &FinancialStatement,
    report: &CompanyFinancialReport,
) -> Result<(), ExportError> {
    out.write_record([title])?;
    out.write_record([
        "Sorszám".to_string(),
        "Tételsor".to_string(),
        report.previous_year.to_string(),
        "Módosítás".to_string(),
        report.target_year.to_string(),
    ])?;
    for row in &statement.rows {
        out.write_record([
            row.line_code.clone(),
            row.label.clone(),
            format_amount(row.previous_year_value),
            format_amount(row.amendment_value),
            format_amount(row.target_year_value),
        ])?;
    }
    tracing::debug!("Wrote {} rows for {}", statement.len(), title);
    Ok(())
}
