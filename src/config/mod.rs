// src/config/mod.rs
pub mod vocabulary;

use std::path::PathBuf;
use std::time::Duration;

use crate::utils::error::SessionError;

pub use vocabulary::Vocabulary;

pub const DEFAULT_BASE_URL: &str = "https://e-beszamolo.im.gov.hu";
pub const DEFAULT_SEARCH_PATH: &str = "/oldal/beszamolo_kereses";
pub const DEFAULT_BROWSERBASE_API_URL: &str = "https://api.browserbase.com/v1";

/// Timing and location settings for one extraction run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub search_path: String,
    /// How long the results listing may take to render before the search counts as empty.
    pub results_timeout: Duration,
    /// How long the company and report pages may take to show their content after a click.
    pub page_ready_timeout: Duration,
    /// How long to look for the terms gate after a submission.
    pub terms_gate_timeout: Duration,
    /// Extra pause after a navigation settles, for late client-side rendering.
    pub settle_delay: Duration,
    pub post_gate_delay: Duration,
    /// Pause between ticking the consent checkbox and confirming it.
    pub gate_click_delay: Duration,
    /// Keep the session alive this long after the result so a live viewer sees the final page.
    pub hold_open: Duration,
    /// Wall-clock budget for driving one run.
    pub run_budget: Duration,
    pub debug_dir: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            results_timeout: Duration::from_secs(15),
            page_ready_timeout: Duration::from_secs(15),
            terms_gate_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_millis(1000),
            post_gate_delay: Duration::from_millis(2000),
            gate_click_delay: Duration::from_millis(300),
            hold_open: Duration::from_secs(5),
            run_budget: Duration::from_secs(60),
            debug_dir: None,
        }
    }
}

impl ScraperConfig {
    pub fn search_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.search_path)
    }

    /// No delays, for driving scripted pages in tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            results_timeout: Duration::ZERO,
            page_ready_timeout: Duration::ZERO,
            terms_gate_timeout: Duration::ZERO,
            settle_delay: Duration::ZERO,
            post_gate_delay: Duration::ZERO,
            gate_click_delay: Duration::ZERO,
            hold_open: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Credentials for the Browserbase session provisioning API.
#[derive(Debug, Clone)]
pub struct BrowserbaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub api_url: String,
}

impl BrowserbaseConfig {
    /// Reads `BROWSERBASE_API_KEY`, `BROWSERBASE_PROJECT_ID` and optionally `BROWSERBASE_API_URL`.
    pub fn from_env() -> Result<Self, SessionError> {
        let api_key = std::env::var("BROWSERBASE_API_KEY")
            .map_err(|_| SessionError::MissingCredentials("BROWSERBASE_API_KEY is not set".to_string()))?;
        let project_id = std::env::var("BROWSERBASE_PROJECT_ID")
            .map_err(|_| SessionError::MissingCredentials("BROWSERBASE_PROJECT_ID is not set".to_string()))?;
        let api_url = std::env::var("BROWSERBASE_API_URL")
            .unwrap_or_else(|_| DEFAULT_BROWSERBASE_API_URL.to_string());
        tracing::debug!("Using Browserbase API at {}", api_url);

        Ok(Self { api_key, project_id, api_url })
    }
}
