// src/portal/scrape.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::{ScraperConfig, Vocabulary};
use crate::extractors::names::NameNormalizer;
use crate::portal::driver::{Driver, ExtractionRequest};
use crate::portal::models::{CompanyFinancialReport, SearchCriterion, SearchKind};
use crate::portal::session::{PortalSession, SessionProvider};
use crate::utils::error::ScrapeError;
use crate::utils::html_debug::SnapshotDumper;

/// Fiscal year used when a request names none.
pub const DEFAULT_YEAR: i32 = 2024;

fn default_year() -> i32 {
    DEFAULT_YEAR
}

/// A caller's request, as received from the CLI or a JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub search_type: SearchKind,
    pub search_value: String,
    #[serde(default = "default_year")]
    pub year: i32,
}

/// Progress reported while a run is under way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScrapeEvent {
    #[serde(rename_all = "camelCase")]
    LiveView { session_id: String, live_view_url: String },
    Result {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Box<CompanyFinancialReport>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl ScrapeEvent {
    fn from_outcome(outcome: &Result<CompanyFinancialReport, ScrapeError>) -> Self {
        match outcome {
            Ok(report) => Self::Result { success: true, data: Some(Box::new(report.clone())), error: None },
            Err(e) => Self::Result { success: false, data: None, error: Some(e.to_string()) },
        }
    }
}

pub struct Scraper<P: SessionProvider> {
    provider: P,
    config: ScraperConfig,
    vocabulary: Vocabulary,
    normalizer: NameNormalizer,
    snapshots: Option<SnapshotDumper>,
}

impl<P: SessionProvider> Scraper<P> {
    pub fn new(provider: P, config: ScraperConfig, vocabulary: Vocabulary) -> Self {
        let normalizer = NameNormalizer::new(&vocabulary);
        let snapshots = config.debug_dir.as_ref().and_then(|dir| match SnapshotDumper::new(dir) {
            Ok(dumper) => Some(dumper),
            Err(e) => {
                tracing::warn!("Debug snapshots disabled, cannot use {}: {}", dir.display(), e);
                None
            }
        });
        tracing::debug!("Using vocabulary {}", vocabulary.version);
        Self { provider, config, vocabulary, normalizer, snapshots }
    }

    /// Fetches a report by tax number on an already connected session.
    pub async fn scrape_by_identifier(
        &self,
        session: &mut PortalSession,
        identifier: &str,
        year: i32,
    ) -> Result<CompanyFinancialReport, ScrapeError> {
        let request = ExtractionRequest { criterion: SearchCriterion::tax_id(identifier), year, original_name: None };
        self.extract(session, &request).await
    }

    /// Fetches a report by company name on an already connected session.
    pub async fn scrape_by_name(
        &self,
        session: &mut PortalSession,
        name: &str,
        year: i32,
    ) -> Result<CompanyFinancialReport, ScrapeError> {
        let request = ExtractionRequest {
            criterion: SearchCriterion::name(name, &self.normalizer),
            year,
            original_name: Some(name.to_string()),
        };
        self.extract(session, &request).await
    }

    async fn extract(
        &self,
        session: &mut PortalSession,
        request: &ExtractionRequest,
    ) -> Result<CompanyFinancialReport, ScrapeError> {
        Driver::new(session, &self.config, &self.vocabulary, &self.normalizer)
            .with_snapshots(self.snapshots.as_ref())
            .run(request)
            .await
    }

    async fn dispatch(
        &self,
        session: &mut PortalSession,
        request: &ScrapeRequest,
    ) -> Result<CompanyFinancialReport, ScrapeError> {
        match request.search_type {
            SearchKind::TaxId => self.scrape_by_identifier(session, &request.search_value, request.year).await,
            SearchKind::Name => self.scrape_by_name(session, &request.search_value, request.year).await,
        }
    }

    /// Full run: provision a browser, report its live view, extract within the
    /// time budget, report the outcome, then hold, close and release.
    pub async fn run(
        &self,
        request: &ScrapeRequest,
        events: &UnboundedSender<ScrapeEvent>,
    ) -> Result<CompanyFinancialReport, ScrapeError> {
        let handle = match self.provider.create_session().await {
            Ok(handle) => handle,
            Err(e) => return finish(events, Err(e.into())),
        };
        emit(events, ScrapeEvent::LiveView {
            session_id: handle.session_id.clone(),
            live_view_url: handle.live_view_url.clone(),
        });

        let outcome = match self.provider.connect(&handle).await {
            Ok(page) => {
                let mut session = PortalSession::new(handle.clone(), page);
                let outcome = match tokio::time::timeout(self.config.run_budget, self.dispatch(&mut session, request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ScrapeError::BudgetExceeded(self.config.run_budget)),
                };
                let outcome = finish(events, outcome);

                hold(self.config.hold_open).await;
                if let Err(e) = session.close().await {
                    tracing::warn!("Failed to close browser page: {}", e);
                }
                outcome
            }
            Err(e) => finish(events, Err(e.into())),
        };

        if let Err(e) = self.provider.close_session(&handle.session_id).await {
            tracing::warn!("Failed to release session {}: {}", handle.session_id, e);
        }
        outcome
    }
}

fn emit(events: &UnboundedSender<ScrapeEvent>, event: ScrapeEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Event receiver dropped");
    }
}

fn finish(
    events: &UnboundedSender<ScrapeEvent>,
    outcome: Result<CompanyFinancialReport, ScrapeError>,
) -> Result<CompanyFinancialReport, ScrapeError> {
    match &outcome {
        Ok(report) => tracing::info!(
            "Extracted {} ({} balance sheet rows, {} income statement rows)",
            report.company_name,
            report.balance_sheet.len(),
            report.income_statement.len()
        ),
        Err(e) => tracing::error!("Run failed: {}", e),
    }
    emit(events, ScrapeEvent::from_outcome(&outcome));
    outcome
}

async fn hold(period: Duration) {
    if !period.is_zero() {
        tracing::info!("Holding session open for {:?}", period);
        tokio::time::sleep(period).await;
    }
}
