// src/portal/mod.rs
//! Everything that talks to the live portal through a remote browser.
pub mod assemble;
pub mod driver;
pub mod models;
pub mod page;
pub mod scrape;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use driver::{Driver, ExtractionRequest, NavState};
pub use models::{CompanyFinancialReport, SearchCriterion, SearchKind};
pub use scrape::{ScrapeEvent, ScrapeRequest, Scraper, DEFAULT_YEAR};
pub use session::{BrowserbaseProvider, PortalSession, SessionHandle, SessionProvider};
