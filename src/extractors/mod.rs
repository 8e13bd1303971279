// src/extractors/mod.rs
//! Pure extraction over parsed page snapshots. Nothing here touches a live browser.
pub mod amount;
pub mod candidates;
pub mod identity;
pub mod names;
pub mod report_year;
pub mod statements;
pub mod text;

// Re-export key extraction types for convenience
pub use amount::{format_amount, parse_amount};
pub use candidates::{collect_result_rows, link_ordinal, select_candidate, ResultRow};
pub use identity::{extract_company_identity, CompanyIdentity};
pub use names::NameNormalizer;
pub use report_year::{find_report_link, ReportLink, ReportLookup};
pub use statements::{extract_statements, ExtractedStatements};
