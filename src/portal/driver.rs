// src/portal/driver.rs
//! Drives one search through the portal: form, optional terms gate, results
//! listing, company page, report page. Every page is read from a serialized
//! snapshot; parsed documents never live across an `.await`.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use scraper::Html;

use crate::config::{ScraperConfig, Vocabulary};
use crate::extractors::candidates::{collect_result_rows, link_ordinal, select_candidate, RESULT_LINK_SELECTOR, RESULT_READY_SELECTOR};
use crate::extractors::identity::{extract_company_identity, CompanyIdentity};
use crate::extractors::names::NameNormalizer;
use crate::extractors::report_year::{find_report_link, ReportLink, ReportLookup};
use crate::extractors::statements::{extract_statements, ExtractedStatements};
use crate::portal::assemble::{assemble_report, Provenance};
use crate::portal::models::{CompanyFinancialReport, ResultCandidate, SearchCriterion, SearchKind};
use crate::portal::session::PortalSession;
use crate::utils::error::ScrapeError;
use crate::utils::html_debug::SnapshotDumper;

const TAX_ID_FIELD: &str = "input#firmTaxNumber";
const NAME_FIELD: &str = "input#firmName";
const SUBMIT_BUTTON: &str = "button#btnSubmit";
const TERMS_CHECKBOX: &str = "#acceptCheck";
const TERMS_CONFIRM_TEXT: &str = "Tovább";
/// Report entries of a company page; absent for companies that never filed.
const COMPANY_READY_SELECTOR: &str = "div.balance-container";
const REPORT_READY_SELECTOR: &str = "table";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Init,
    FormSubmitted,
    TermsGate,
    ResultsReady,
    CompanyPageOpen,
    ReportLinkResolved,
    ReportPageOpen,
    Extracted,
    Failed,
}

impl fmt::Display for NavState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One company and fiscal year to fetch.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub criterion: SearchCriterion,
    pub year: i32,
    /// The name exactly as supplied, used as a last-resort company name.
    pub original_name: Option<String>,
}

pub struct Driver<'a> {
    session: &'a mut PortalSession,
    config: &'a ScraperConfig,
    vocabulary: &'a Vocabulary,
    normalizer: &'a NameNormalizer,
    snapshots: Option<&'a SnapshotDumper>,
    history: Vec<NavState>,
}

impl<'a> Driver<'a> {
    pub fn new(
        session: &'a mut PortalSession,
        config: &'a ScraperConfig,
        vocabulary: &'a Vocabulary,
        normalizer: &'a NameNormalizer,
    ) -> Self {
        Self {
            session,
            config,
            vocabulary,
            normalizer,
            snapshots: None,
            history: vec![NavState::Init],
        }
    }

    pub fn with_snapshots(mut self, dumper: Option<&'a SnapshotDumper>) -> Self {
        self.snapshots = dumper;
        self
    }

    pub fn state(&self) -> NavState {
        self.history.last().copied().unwrap_or(NavState::Init)
    }

    /// Every state visited so far, starting with `Init`.
    pub fn history(&self) -> &[NavState] {
        &self.history
    }

    /// Runs the whole navigation. A failure leaves the driver in `Failed` and yields no report.
    pub async fn run(&mut self, request: &ExtractionRequest) -> Result<CompanyFinancialReport, ScrapeError> {
        tracing::info!("Extracting {} report for {}", request.year, request.criterion);
        match self.drive(request).await {
            Ok(report) => {
                self.transition(NavState::Extracted);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("Extraction failed in state {}: {}", self.state(), e);
                self.transition(NavState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: NavState) {
        tracing::debug!("Navigation: {} -> {}", self.state(), next);
        self.history.push(next);
    }

    async fn drive(&mut self, request: &ExtractionRequest) -> Result<CompanyFinancialReport, ScrapeError> {
        let criterion = &request.criterion;

        self.session.page().goto(&self.config.search_url()).await?;
        self.settle("search page").await?;
        self.submit_search(criterion).await?;
        self.transition(NavState::FormSubmitted);

        if !self.session.terms_accepted {
            self.pass_terms_gate(criterion).await?;
        }

        let ready = self
            .session
            .page()
            .wait_for(RESULT_READY_SELECTOR, self.config.results_timeout)
            .await?;
        if !ready {
            tracing::warn!("No results listing appeared for {}", criterion);
            return Err(ScrapeError::NotFound(criterion.to_string()));
        }
        self.transition(NavState::ResultsReady);

        let html = self.snapshot("results").await?;
        let (candidate, ordinal) = choose_result(&html, criterion, self.normalizer, self.vocabulary)
            .ok_or_else(|| ScrapeError::NotFound(criterion.to_string()))?;
        tracing::info!(
            "Opening result row {} ({} merged names, exact: {})",
            candidate.row_index,
            candidate.merged_name_count,
            candidate.is_exact_match
        );
        self.session.page().click_nth(RESULT_LINK_SELECTOR, ordinal).await?;
        self.settle("company page").await?;
        let company_ready = self
            .session
            .page()
            .wait_for(COMPANY_READY_SELECTOR, self.config.page_ready_timeout)
            .await?;

        let html = self.snapshot("company").await?;
        // A company without filings has no report entries, but it is no longer the results listing either.
        if !company_ready && shows_result_rows(&html, self.vocabulary) {
            tracing::warn!("Still on the results listing after opening row {}", candidate.row_index);
            return Err(ScrapeError::NavigationTimeout("company page".to_string()));
        }
        self.transition(NavState::CompanyPageOpen);
        let (identity, lookup) = read_company_page(&html, request.year);
        let link = match lookup {
            ReportLookup::Found(link) => link,
            ReportLookup::Missing { available_years } => {
                return Err(ScrapeError::YearUnavailable { year: request.year, available_years });
            }
        };
        self.transition(NavState::ReportLinkResolved);
        tracing::info!("Opening report {}", link.data_code);
        self.open_report(&link).await?;
        self.transition(NavState::ReportPageOpen);

        let html = self.snapshot("report").await?;
        let statements = extract_statements(&Html::parse_document(&html), self.vocabulary);
        check_statements(&statements, request.year)?;

        let source_url = self.session.page().url().await?;
        Ok(assemble_report(
            identity,
            statements,
            Provenance {
                requested_year: request.year,
                original_name: request.original_name.clone(),
                search_value: criterion.value().to_string(),
                source_url,
                extracted_at: Utc::now(),
            },
        ))
    }

    async fn submit_search(&self, criterion: &SearchCriterion) -> Result<(), ScrapeError> {
        let field = match criterion.kind() {
            SearchKind::TaxId => TAX_ID_FIELD,
            SearchKind::Name => NAME_FIELD,
        };
        let page = self.session.page();
        page.fill(field, criterion.value()).await?;
        page.click(SUBMIT_BUTTON).await?;
        Ok(())
    }

    /// Accepts the terms of use if the portal asks, then repeats the search once.
    async fn pass_terms_gate(&mut self, criterion: &SearchCriterion) -> Result<(), ScrapeError> {
        let page = self.session.page();
        if !page.wait_for(TERMS_CHECKBOX, self.config.terms_gate_timeout).await? {
            return Ok(());
        }
        self.transition(NavState::TermsGate);
        tracing::info!("Accepting portal terms of use");

        let page = self.session.page();
        page.click(TERMS_CHECKBOX).await?;
        pause(self.config.gate_click_delay).await;
        if !page.click_with_text("button", TERMS_CONFIRM_TEXT).await? {
            return Err(ScrapeError::NavigationTimeout("terms confirmation button".to_string()));
        }
        self.session.terms_accepted = true;
        pause(self.config.post_gate_delay).await;

        self.submit_search(criterion).await?;
        self.transition(NavState::FormSubmitted);
        Ok(())
    }

    async fn open_report(&self, link: &ReportLink) -> Result<(), ScrapeError> {
        let page = self.session.page();
        page.click(&link.selector).await?;
        self.settle("report page").await?;
        if !page.wait_for(REPORT_READY_SELECTOR, self.config.page_ready_timeout).await? {
            tracing::warn!("Report {} never rendered a table", link.data_code);
            return Err(ScrapeError::NavigationTimeout("report page".to_string()));
        }
        Ok(())
    }

    async fn settle(&self, what: &str) -> Result<(), ScrapeError> {
        self.session
            .page()
            .wait_for_settle()
            .await
            .map_err(|e| {
                tracing::warn!("{} did not settle: {}", what, e);
                ScrapeError::NavigationTimeout(what.to_string())
            })?;
        pause(self.config.settle_delay).await;
        Ok(())
    }

    async fn snapshot(&self, label: &str) -> Result<String, ScrapeError> {
        let html = self.session.page().content().await?;
        if let Some(dumper) = self.snapshots {
            dumper.dump(label, &html);
        }
        Ok(html)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn choose_result(
    html: &str,
    criterion: &SearchCriterion,
    normalizer: &NameNormalizer,
    vocabulary: &Vocabulary,
) -> Option<(ResultCandidate, usize)> {
    let document = Html::parse_document(html);
    let rows = collect_result_rows(&document, vocabulary);
    let candidate = select_candidate(&rows, criterion, normalizer)?;
    let ordinal = link_ordinal(&document, candidate.row_index, vocabulary)?;
    Some((candidate, ordinal))
}

fn shows_result_rows(html: &str, vocabulary: &Vocabulary) -> bool {
    !collect_result_rows(&Html::parse_document(html), vocabulary).is_empty()
}

fn read_company_page(html: &str, year: i32) -> (CompanyIdentity, ReportLookup) {
    let document = Html::parse_document(html);
    (extract_company_identity(&document), find_report_link(&document, year))
}

fn check_statements(statements: &ExtractedStatements, year: i32) -> Result<(), ScrapeError> {
    if !statements.has_rows() {
        return Err(ScrapeError::ExtractionEmpty);
    }
    if statements.target_year != 0 && statements.target_year != year {
        return Err(ScrapeError::PeriodMismatch { requested: year, found: statements.target_year });
    }
    Ok(())
}
