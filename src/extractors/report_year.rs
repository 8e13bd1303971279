// src/extractors/report_year.rs
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::extractors::text::visible_text;

static CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.balance-container").expect("Failed to compile CONTAINER_SELECTOR")
});
static REPORT_LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a.view-obr-balance-link").expect("Failed to compile REPORT_LINK_SELECTOR")
});
// A year directly followed by the year-end date marks the covered period;
// a bare year can also be part of the filing date.
static YEAR_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|\D)(\d{4})\.\s*december\s*31").expect("Failed to compile YEAR_END_RE")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLink {
    pub data_code: String,
    /// CSS selector addressing this link on the live page.
    pub selector: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLookup {
    Found(ReportLink),
    /// Distinct fiscal years the company did file, newest first.
    Missing { available_years: Vec<i32> },
}

/// Finds the filed report covering `requested_year` on a company page.
pub fn find_report_link(document: &Html, requested_year: i32) -> ReportLookup {
    let mut years = BTreeSet::new();

    for container in document.select(&CONTAINER_SELECTOR) {
        let text = visible_text(container);
        let entry_years: Vec<i32> = YEAR_END_RE
            .captures_iter(&text)
            .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
            .collect();
        years.extend(entry_years.iter().copied());

        if !entry_years.contains(&requested_year) {
            continue;
        }
        let Some(link) = container.select(&REPORT_LINK_SELECTOR).next() else {
            tracing::warn!("Entry for {} has no report link, continuing search", requested_year);
            continue;
        };
        let data_code = match link.value().attr("data-code") {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            _ => {
                tracing::warn!("Report link for {} has no data-code attribute", requested_year);
                continue;
            }
        };
        let selector = format!(r#"a.view-obr-balance-link[data-code="{}"]"#, data_code);
        tracing::info!("Found report for {} (data-code {})", requested_year, data_code);
        return ReportLookup::Found(ReportLink { data_code, selector });
    }

    let available_years: Vec<i32> = years.into_iter().rev().collect();
    tracing::info!("No report for {}; available years: {:?}", requested_year, available_years);
    ReportLookup::Missing { available_years }
}
