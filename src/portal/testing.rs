// src/portal/testing.rs
//! Scripted stand-ins for the live portal, used by driver and run tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use crate::portal::page::BrowserPage;
use crate::portal::session::{SessionHandle, SessionProvider};
use crate::utils::error::{PageError, SessionError};

pub const SEARCH_PAGE: &str = r#"<html><body><form>
    <input id="firmName"><input id="firmTaxNumber"><button id="btnSubmit">Keresés</button>
    </form></body></html>"#;

pub const GATE_PAGE: &str = r#"<html><body><div class="modal">
    <input type="checkbox" id="acceptCheck"> Elfogadom a felhasználási feltételeket
    <button>Tovább</button></div></body></html>"#;

pub const EMPTY_RESULTS: &str = r#"<html><body><p>Nincs találat</p></body></html>"#;

/// A results listing where each entry is one row of stacked names.
pub fn results_page(rows: &[&[&str]]) -> String {
    let body: String = rows
        .iter()
        .map(|names| format!(r##"<tr><td><a href="#">{}</a></td><td>Budapest</td></tr>"##, names.join("<br>")))
        .collect();
    format!(
        "<html><body><table><thead><tr><th>Cégnév</th><th>Székhely</th></tr></thead><tbody>{}</tbody></table></body></html>",
        body
    )
}

/// A company detail page listing reports for the given fiscal years.
pub fn company_page(name: &str, years: &[i32]) -> String {
    let entries: String = years
        .iter()
        .map(|y| {
            format!(
                r##"<div class="balance-container"><a class="view-obr-balance-link" data-code="R{y}" href="#">Megtekintés</a>
                   <span>Közzétéve: {next}. május 28.</span><span>{y}. január 01. - {y}. december 31.</span></div>"##,
                y = y,
                next = y + 1
            )
        })
        .collect();
    format!(
        "<html><body><div>Cég neve: {}</div><div>Cégjegyzékszáma: 01-09-123456</div>\
         <div>Adószám: 12345678-2-41</div><div>Székhely: 1111 Budapest, Fő utca 1.</div>{}</body></html>",
        name, entries
    )
}

/// A report page with a small balance sheet and income statement for `year`.
pub fn report_page(year: i32) -> String {
    format!(
        r#"<html><body>
        <div>A cég elnevezése: MINTA GYÁRTÓ KFT.</div>
        <div>Elfogadás időpontja: {next}. május 28.</div>
        <div>Pénznem: HUF</div><div>Pénzegység: ezer</div>
        <h2>{year}. január 01. - {year}. december 31. IDŐSZAKRA VONATKOZÓ</h2>
        <table><caption>MÉRLEGE</caption><tbody>
          <tr><td>Sorszám</td><td>Tételsor elnevezése</td><td>Előző üzleti év</td><td>Módosítás</td><td>Tárgyév</td></tr>
          <tr><td>001.</td><td>A. Befektetett eszközök</td><td>1.234</td><td>0</td><td>1.500</td></tr>
          <tr><td>015.</td><td>FORRÁSOK ÖSSZESEN</td><td>2.000</td><td>0</td><td>2.500</td></tr>
        </tbody></table>
        <table><caption>EREDMÉNYKIMUTATÁS</caption><tbody>
          <tr><td>001.</td><td>Értékesítés nettó árbevétele</td><td>10.000</td><td>12.000</td></tr>
        </tbody></table>
        </body></html>"#,
        year = year,
        next = year + 1
    )
}

pub const REPORT_URL: &str = "https://portal.test/beszamolo/megtekint";

/// Mutable state of the fake portal, shared between the page and the test.
#[derive(Debug, Default)]
pub struct PortalScript {
    pub gate_enabled: bool,
    pub results: String,
    pub company: String,
    pub report: String,
    /// Every settle wait reports a failed navigation.
    pub settle_fails: bool,
    /// Settle waits never complete.
    pub hang_on_settle: bool,
    /// Clicks on result rows and report links are swallowed without navigating.
    pub stall_result_click: bool,
    pub stall_report_click: bool,

    pub current: String,
    pub url: String,
    pub filled: Vec<(String, String)>,
    pub submissions: usize,
    pub gate_checked: bool,
    pub gate_passed: bool,
    pub gate_shown: usize,
    pub opened_result: Option<usize>,
    pub closed: bool,
}

impl PortalScript {
    pub fn new(results: String, company: String, report: String) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self { results, company, report, ..Self::default() }))
    }
}

fn select_count(html: &str, selector: &str) -> Result<usize, PageError> {
    let selector = Selector::parse(selector).map_err(|e| PageError::Browser(format!("{:?}", e)))?;
    Ok(Html::parse_document(html).select(&selector).count())
}

pub struct FakePage {
    pub script: Arc<Mutex<PortalScript>>,
}

impl FakePage {
    fn state(&self) -> std::sync::MutexGuard<'_, PortalScript> {
        self.script.lock().unwrap()
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn goto(&self, url: &str) -> Result<(), PageError> {
        let mut s = self.state();
        s.current = SEARCH_PAGE.to_string();
        s.url = url.to_string();
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), PageError> {
        let mut s = self.state();
        if select_count(&s.current, selector)? == 0 {
            return Err(PageError::ElementNotFound(selector.to_string()));
        }
        s.filled.push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), PageError> {
        let mut s = self.state();
        if select_count(&s.current, selector)? == 0 {
            return Err(PageError::ElementNotFound(selector.to_string()));
        }
        match selector {
            "button#btnSubmit" => {
                s.submissions += 1;
                if s.gate_enabled && !s.gate_passed {
                    s.gate_shown += 1;
                    s.current = GATE_PAGE.to_string();
                } else {
                    s.current = s.results.clone();
                }
            }
            "#acceptCheck" => s.gate_checked = true,
            link if link.starts_with("a.view-obr-balance-link") => {
                if s.stall_report_click {
                    return Ok(());
                }
                s.current = s.report.clone();
                s.url = REPORT_URL.to_string();
            }
            other => return Err(PageError::Browser(format!("unscripted click on {}", other))),
        }
        Ok(())
    }

    async fn click_nth(&self, selector: &str, index: usize) -> Result<(), PageError> {
        let mut s = self.state();
        if select_count(&s.current, selector)? <= index {
            return Err(PageError::ElementNotFound(format!("{} (#{})", selector, index)));
        }
        if s.stall_result_click {
            return Ok(());
        }
        s.opened_result = Some(index);
        s.current = s.company.clone();
        s.url = "https://portal.test/ceg".to_string();
        Ok(())
    }

    async fn click_with_text(&self, selector: &str, text: &str) -> Result<bool, PageError> {
        let mut s = self.state();
        if selector == "button" && text == "Tovább" && s.current == GATE_PAGE && s.gate_checked {
            s.gate_passed = true;
            s.current = SEARCH_PAGE.to_string();
            return Ok(true);
        }
        Ok(false)
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool, PageError> {
        let s = self.state();
        Ok(select_count(&s.current, selector)? > 0)
    }

    async fn wait_for_settle(&self) -> Result<(), PageError> {
        let (fails, hangs) = {
            let s = self.state();
            (s.settle_fails, s.hang_on_settle)
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(PageError::Browser("navigation did not settle".to_string()));
        }
        Ok(())
    }

    async fn content(&self) -> Result<String, PageError> {
        Ok(self.state().current.clone())
    }

    async fn url(&self) -> Result<String, PageError> {
        Ok(self.state().url.clone())
    }

    async fn close(&self) -> Result<(), PageError> {
        self.state().closed = true;
        Ok(())
    }
}

pub fn fake_handle() -> SessionHandle {
    SessionHandle {
        session_id: "sess-1".to_string(),
        connect_url: "ws://fake".to_string(),
        live_view_url: "https://live.test/sess-1".to_string(),
    }
}

/// Hands out [`FakePage`]s over one script and records released sessions.
pub struct FakeProvider {
    pub script: Arc<Mutex<PortalScript>>,
    pub released: Arc<Mutex<Vec<String>>>,
    pub fail_connect: bool,
}

impl FakeProvider {
    pub fn new(script: Arc<Mutex<PortalScript>>) -> Self {
        Self { script, released: Arc::new(Mutex::new(Vec::new())), fail_connect: false }
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    async fn create_session(&self) -> Result<SessionHandle, SessionError> {
        Ok(fake_handle())
    }

    async fn connect(&self, _handle: &SessionHandle) -> Result<Box<dyn BrowserPage>, SessionError> {
        if self.fail_connect {
            return Err(SessionError::Connect("scripted failure".to_string()));
        }
        Ok(Box::new(FakePage { script: Arc::clone(&self.script) }))
    }

    async fn close_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.released.lock().unwrap().push(session_id.to_string());
        Ok(())
    }
}
