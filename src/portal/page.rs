// src/portal/page.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, Tab};

use crate::utils::error::{PageError, SessionError};

/// The handful of browser operations the navigation driver needs.
///
/// Selectors are plain CSS. Implementations wait for navigations they
/// trigger only as far as the underlying protocol does; the driver calls
/// [`BrowserPage::wait_for_settle`] explicitly after each page change.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), PageError>;

    /// Replaces the value of an input field.
    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError>;

    async fn click(&self, selector: &str) -> Result<(), PageError>;

    /// Clicks the `index`-th element (document order) matching `selector`.
    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError>;

    /// Clicks the first element matching `selector` whose text contains `text`.
    /// Returns `false` when there is no such element.
    async fn click_with_text(&self, selector: &str, text: &str) -> Result<bool, PageError>;

    /// Waits up to `timeout` for `selector` to appear. `false` means it never did.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, PageError>;

    /// Waits for the current navigation to finish.
    async fn wait_for_settle(&self) -> Result<(), PageError>;

    /// Serialized DOM of the current page.
    async fn content(&self) -> Result<String, PageError>;

    async fn url(&self) -> Result<String, PageError>;

    async fn close(&self) -> Result<(), PageError>;
}

fn browser_error(e: impl std::fmt::Display) -> PageError {
    PageError::Browser(e.to_string())
}

/// A tab of a Chrome instance reached over the DevTools protocol.
pub struct ChromePage {
    // Dropping the browser handle closes the DevTools connection.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Connects to a remote browser's DevTools websocket and takes its first tab.
    /// Blocking; call from a blocking-capable context.
    pub fn connect(ws_url: &str) -> Result<Self, SessionError> {
        let browser = Browser::connect(ws_url.to_string())
            .map_err(|e| SessionError::Connect(e.to_string()))?;
        let existing = browser.get_tabs().lock().ok().and_then(|tabs| tabs.first().cloned());
        let tab = match existing {
            Some(tab) => tab,
            None => browser.new_tab().map_err(|e| SessionError::Connect(e.to_string()))?,
        };
        tracing::info!("Connected to remote browser");
        Ok(Self { _browser: browser, tab })
    }

    /// Runs a DevTools call on the blocking pool so the async run is never stalled.
    async fn with_tab<T, F>(&self, op: F) -> Result<T, PageError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> Result<T, PageError> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || op(&tab))
            .await
            .map_err(|e| PageError::Worker(e.to_string()))?
    }
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        tracing::debug!("Navigating to {}", url);
        let url = url.to_string();
        self.with_tab(move |tab| {
            tab.navigate_to(&url).map_err(browser_error)?;
            tab.wait_until_navigated().map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        let (selector, value) = (selector.to_string(), value.to_string());
        self.with_tab(move |tab| {
            let input = tab
                .find_element(&selector)
                .map_err(|_| PageError::ElementNotFound(selector.clone()))?;
            input
                .call_js_fn("function() { this.value = ''; }", vec![], false)
                .map_err(browser_error)?;
            input.click().map_err(browser_error)?;
            input.type_into(&value).map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            let element = tab
                .find_element(&selector)
                .map_err(|_| PageError::ElementNotFound(selector.clone()))?;
            element.click().map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            let elements = tab
                .find_elements(&selector)
                .map_err(|_| PageError::ElementNotFound(selector.clone()))?;
            let element = elements
                .get(index)
                .ok_or_else(|| PageError::ElementNotFound(format!("{} (#{})", selector, index)))?;
            element.click().map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn click_with_text(&self, selector: &str, text: &str) -> Result<bool, PageError> {
        let (selector, text) = (selector.to_string(), text.to_string());
        self.with_tab(move |tab| {
            let Ok(elements) = tab.find_elements(&selector) else {
                return Ok(false);
            };
            for element in &elements {
                let inner = element.get_inner_text().unwrap_or_default();
                if inner.contains(&text) {
                    element.click().map_err(browser_error)?;
                    return Ok(true);
                }
            }
            Ok(false)
        })
        .await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool, PageError> {
        let selector = selector.to_string();
        self.with_tab(move |tab| {
            Ok(tab.wait_for_element_with_custom_timeout(&selector, timeout).is_ok())
        })
        .await
    }

    async fn wait_for_settle(&self) -> Result<(), PageError> {
        self.with_tab(|tab| {
            tab.wait_until_navigated().map_err(browser_error)?;
            Ok(())
        })
        .await
    }

    async fn content(&self) -> Result<String, PageError> {
        self.with_tab(|tab| tab.get_content().map_err(browser_error)).await
    }

    async fn url(&self) -> Result<String, PageError> {
        self.with_tab(|tab| Ok(tab.get_url())).await
    }

    async fn close(&self) -> Result<(), PageError> {
        self.with_tab(|tab| {
            tab.close(false).map_err(browser_error)?;
            Ok(())
        })
        .await
    }
}
