// src/portal/session.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use serde_json::json;

use crate::config::BrowserbaseConfig;
use crate::portal::page::{BrowserPage, ChromePage};
use crate::utils::error::{PageError, SessionError};

const API_KEY_HEADER: &str = "X-BB-API-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A provisioned remote browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub session_id: String,
    /// DevTools websocket URL used to drive the browser.
    pub connect_url: String,
    /// Human-viewable live view of the browser.
    pub live_view_url: String,
}

/// Creates and releases remote browser sessions.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Provisions a session. On error no remote session is left running.
    async fn create_session(&self) -> Result<SessionHandle, SessionError>;

    /// Opens a controllable page in a created session.
    async fn connect(&self, handle: &SessionHandle) -> Result<Box<dyn BrowserPage>, SessionError> {
        let connect_url = handle.connect_url.clone();
        let page = tokio::task::spawn_blocking(move || ChromePage::connect(&connect_url))
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))??;
        Ok(Box::new(page))
    }

    async fn close_session(&self, session_id: &str) -> Result<(), SessionError>;
}

/// The per-run browser session: one page, one consent state.
pub struct PortalSession {
    pub handle: SessionHandle,
    page: Box<dyn BrowserPage>,
    /// Set once the portal's terms gate has been accepted in this session.
    pub terms_accepted: bool,
}

impl PortalSession {
    pub fn new(handle: SessionHandle, page: Box<dyn BrowserPage>) -> Self {
        Self { handle, page, terms_accepted: false }
    }

    pub fn page(&self) -> &dyn BrowserPage {
        self.page.as_ref()
    }

    pub async fn close(&self) -> Result<(), PageError> {
        self.page.close().await
    }
}

// --- Browserbase API models ---
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedSession {
    id: String,
    connect_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDebugInfo {
    debugger_fullscreen_url: String,
}

/// Session provisioning through the Browserbase REST API.
pub struct BrowserbaseProvider {
    config: BrowserbaseConfig,
    http: reqwest::Client,
}

impl BrowserbaseProvider {
    pub fn new(config: BrowserbaseConfig) -> Result<Self, SessionError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, http })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, SessionError> {
        let status = response.status();
        if !status.is_success() {
            tracing::error!("Browserbase returned HTTP {} for {}", status, response.url());
            return Err(SessionError::Http(status));
        }
        Ok(response)
    }

    async fn live_view_url(&self, session_id: &str) -> Result<String, SessionError> {
        let response = self
            .http
            .get(self.endpoint(&format!("sessions/{}/debug", session_id)))
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await?;
        let debug_info: SessionDebugInfo = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| SessionError::Parse(e.to_string()))?;
        tracing::info!("Live view URL: {}", debug_info.debugger_fullscreen_url);
        Ok(debug_info.debugger_fullscreen_url)
    }
}

#[async_trait]
impl SessionProvider for BrowserbaseProvider {
    async fn create_session(&self) -> Result<SessionHandle, SessionError> {
        let body = json!({
            "projectId": self.config.project_id,
            "browserSettings": {
                "fingerprint": {
                    "browsers": ["chrome"],
                    "devices": ["desktop"],
                    "operatingSystems": ["windows"],
                },
                "viewport": { "width": 1280, "height": 720 },
            },
        });

        let response = self
            .http
            .post(self.endpoint("sessions"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await?;
        let created: CreatedSession = Self::checked(response)
            .await?
            .json()
            .await
            .map_err(|e| SessionError::Parse(e.to_string()))?;
        tracing::info!("Browser session created: {}", created.id);

        // The session exists remotely from here on; release it if the handle cannot be completed.
        let live_view_url = match self.live_view_url(&created.id).await {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Live view lookup failed for session {}: {}", created.id, e);
                if let Err(release_err) = self.close_session(&created.id).await {
                    tracing::warn!("Failed to release session {}: {}", created.id, release_err);
                }
                return Err(e);
            }
        };

        Ok(SessionHandle {
            session_id: created.id,
            connect_url: created.connect_url,
            live_view_url,
        })
    }

    async fn close_session(&self, session_id: &str) -> Result<(), SessionError> {
        let body = json!({
            "projectId": self.config.project_id,
            "status": "REQUEST_RELEASE",
        });
        let response = self
            .http
            .post(self.endpoint(&format!("sessions/{}", session_id)))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await?;
        Self::checked(response).await?;
        tracing::info!("Browser session {} released", session_id);
        Ok(())
    }
}
