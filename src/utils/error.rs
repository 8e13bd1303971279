// src/utils/error.rs
use std::time::Duration;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum PageError {
    #[error("Browser command failed: {0}")]
    Browser(String),

    #[error("No element matches selector: {0}")]
    ElementNotFound(String),

    #[error("Browser worker task failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error: {0}")]
    Http(reqwest::StatusCode),

    #[error("Missing provisioning credentials: {0}")]
    MissingCredentials(String),

    #[error("Failed to parse provisioning response: {0}")]
    Parse(String),

    #[error("Could not connect to browser session: {0}")]
    Connect(String),
}

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("No matching company found for {0}")]
    NotFound(String),

    #[error("No report filed for fiscal year {year}. {}", available_years_text(.available_years))]
    YearUnavailable { year: i32, available_years: Vec<i32> },

    #[error("Timed out waiting for {0}")]
    NavigationTimeout(String),

    #[error("Report page contained no recognizable statement rows")]
    ExtractionEmpty,

    #[error("Report covers fiscal year {found}, but {requested} was requested")]
    PeriodMismatch { requested: i32, found: i32 },

    #[error("Run exceeded its time budget of {0:?}")]
    BudgetExceeded(Duration),

    #[error("Browser page error: {0}")]
    Page(#[from] PageError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

fn available_years_text(years: &[i32]) -> String {
    if years.is_empty() {
        return "No reports are available".to_string();
    }
    let listed: Vec<String> = years.iter().map(|y| y.to_string()).collect();
    format!("Available years: {}", listed.join(", "))
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Session provisioning failed: {0}")]
    Session(#[from] SessionError),

    #[error("Extraction failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_unavailable_lists_years() {
        let err = ScrapeError::YearUnavailable { year: 2024, available_years: vec![2023, 2022] };
        assert_eq!(err.to_string(), "No report filed for fiscal year 2024. Available years: 2023, 2022");
    }

    #[test]
    fn year_unavailable_without_any_reports() {
        let err = ScrapeError::YearUnavailable { year: 2024, available_years: vec![] };
        assert!(err.to_string().ends_with("No reports are available"));
    }
}
