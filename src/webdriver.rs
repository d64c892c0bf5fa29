use async_trait::async_trait;
use fantoccini::elements::Element as WdElement;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::driver::{Connector, DriverResult, Element, Page};
use crate::errors::DriverError;
use crate::types::LocatorQuery;

/// Supported browser types
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrowserType {
    /// Mozilla Firefox
    Firefox,
    /// Google Chrome/Chromium
    Chrome,
}

impl std::str::FromStr for BrowserType {
    type Err = anyhow::Error;

    /// Parse browser type from string (case-insensitive)
    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "firefox" => Ok(BrowserType::Firefox),
            "chrome" | "chromium" => Ok(BrowserType::Chrome),
            _ => anyhow::bail!("Unsupported browser: {}", s),
        }
    }
}

impl BrowserType {
    /// Standard WebDriver URL for this browser type
    pub fn get_webdriver_url(&self) -> String {
        match self {
            BrowserType::Firefox => "http://localhost:4444".to_string(),
            BrowserType::Chrome => "http://localhost:9515".to_string(),
        }
    }

    fn driver_name(&self) -> &'static str {
        match self {
            BrowserType::Firefox => "geckodriver",
            BrowserType::Chrome => "chromedriver",
        }
    }
}

impl From<CmdError> for DriverError {
    fn from(err: CmdError) -> Self {
        let msg = err.to_string();
        match &err {
            CmdError::NoSuchElement(_) => DriverError::NoSuchElement(msg),
            CmdError::Standard(wd) => classify_w3c_error(wd.error(), msg),
            _ => DriverError::Other(msg),
        }
    }
}

/// Map a W3C WebDriver error code onto [`DriverError`]
fn classify_w3c_error(code: &str, msg: String) -> DriverError {
    match code {
        "no such element" => DriverError::NoSuchElement(msg),
        "stale element reference" => DriverError::StaleElement(msg),
        "element click intercepted" => DriverError::ClickIntercepted(msg),
        "invalid session id" | "session not created" => DriverError::Connection(msg),
        _ => DriverError::Other(msg),
    }
}

/// Browser session driven over the WebDriver protocol
pub struct Browser {
    client: Client,
    browser_type: BrowserType,
    /// Chrome user-data-dir, removed when the browser is dropped
    _profile_dir: Option<TempDir>,
}

impl Browser {
    /// Start a new browser session as described by `config`
    pub async fn new(config: &SessionConfig) -> DriverResult<Self> {
        let browser_type = config.browser;
        let webdriver_url = config.webdriver_url();
        info!("Connecting to {:?} WebDriver", browser_type);

        if !Self::is_webdriver_running(&webdriver_url).await {
            let driver_name = browser_type.driver_name();
            return Err(DriverError::Connection(format!(
                "Cannot connect to {} WebDriver at {}.\n\
                Please ensure {} is running:\n\
                  For Firefox: geckodriver --port 4444\n\
                  For Chrome: chromedriver --port 9515",
                driver_name, webdriver_url, driver_name
            )));
        }

        let mut caps = serde_json::Map::new();
        let mut profile_dir = None;
        let vp = config.viewport;

        match browser_type {
            BrowserType::Firefox => {
                let mut args = Vec::new();
                if config.headless {
                    args.push("--headless".to_string());
                }
                args.push(format!("--width={}", vp.width));
                args.push(format!("--height={}", vp.height));

                caps.insert("moz:firefoxOptions".to_string(), json!({ "args": args }));
            }
            BrowserType::Chrome => {
                let mut args = vec!["--no-sandbox".to_string()];
                if config.headless {
                    args.push("--headless=new".to_string());
                    // Disable GPU for headless
                    args.push("--disable-gpu".to_string());
                    // Prevent shared memory issues
                    args.push("--disable-dev-shm-usage".to_string());
                }
                args.push(format!("--window-size={},{}", vp.width, vp.height));

                // Each session gets its own profile so parallel runs don't collide
                let dir = tempfile::Builder::new()
                    .prefix("formprobe-chrome-")
                    .tempdir()
                    .map_err(|e| DriverError::Other(format!("Failed to create profile dir: {}", e)))?;
                args.push(format!("--user-data-dir={}", dir.path().display()));
                profile_dir = Some(dir);

                caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
            }
        }

        debug!("Connecting to WebDriver at {}", webdriver_url);
        let client = ClientBuilder::rustls()
            .capabilities(caps)
            .connect(&webdriver_url)
            .await
            .map_err(|e| DriverError::Connection(format!("Failed to connect to WebDriver: {}", e)))?;

        Ok(Browser {
            client,
            browser_type,
            _profile_dir: profile_dir,
        })
    }

    async fn is_webdriver_running(url: &str) -> bool {
        let status_url = format!("{}/status", url.trim_end_matches('/'));

        match reqwest::get(&status_url).await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Page for Browser {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> DriverResult<()> {
        info!("Navigating to {}", url);
        self.client.goto(url).await?;

        // Wait for the document to finish loading (max 2 seconds)
        for _ in 0..20 {
            match self
                .client
                .execute("return document.readyState === 'complete';", vec![])
                .await
            {
                Ok(value) if value.as_bool() == Some(true) => break,
                _ => tokio::time::sleep(std::time::Duration::from_millis(100)).await,
            }
        }
        Ok(())
    }

    async fn find_all(&self, query: &LocatorQuery) -> DriverResult<Vec<WebElement>> {
        let xpath = query.to_xpath();
        let elements = self.client.find_all(Locator::XPath(&xpath)).await?;
        Ok(elements.into_iter().map(WebElement).collect())
    }

    async fn set_viewport(&self, width: u32, height: u32) -> DriverResult<()> {
        debug!("Setting viewport to {}x{}", width, height);
        self.client.set_window_size(width, height).await?;
        Ok(())
    }

    async fn close_session(&self) -> DriverResult<()> {
        debug!("Closing {:?} session", self.browser_type);
        self.client.clone().close().await?;
        Ok(())
    }
}

/// Element handle inside a [`Browser`] session
pub struct WebElement(WdElement);

#[async_trait]
impl Element for WebElement {
    async fn is_displayed(&self) -> DriverResult<bool> {
        Ok(self.0.is_displayed().await?)
    }

    async fn attribute(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.0.attr(name).await?)
    }

    async fn property(&self, name: &str) -> DriverResult<Option<String>> {
        Ok(self.0.prop(name).await?)
    }

    async fn text(&self) -> DriverResult<String> {
        Ok(self.0.text().await?)
    }

    async fn clear(&self) -> DriverResult<()> {
        Ok(self.0.clear().await?)
    }

    async fn send_keys(&self, text: &str) -> DriverResult<()> {
        Ok(self.0.send_keys(text).await?)
    }

    async fn click(&self) -> DriverResult<()> {
        Ok(self.0.click().await?)
    }

    async fn is_selected(&self) -> DriverResult<bool> {
        Ok(self.0.is_selected().await?)
    }

    async fn parent(&self) -> DriverResult<Self> {
        Ok(WebElement(self.0.find(Locator::XPath("./..")).await?))
    }
}

/// Opens a fresh WebDriver session per scenario
#[derive(Debug, Default, Clone, Copy)]
pub struct WebDriverConnector;

#[async_trait]
impl Connector for WebDriverConnector {
    type Page = Browser;

    async fn connect(&self, config: &SessionConfig) -> DriverResult<Browser> {
        Browser::new(config).await
    }
}
