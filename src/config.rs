//! Explicit configuration passed into sessions, waiters and the radio
//! disambiguator. Nothing here is read from global state.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;

use crate::types::ViewportSize;
use crate::webdriver::BrowserType;

/// Page every default scenario runs against
pub const DEFAULT_TARGET_URL: &str = "https://app.cloudqa.io/home/AutomationPracticeForm";

pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_secs(2);

/// How a browser session is created and where it starts
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub browser: BrowserType,
    /// Explicit WebDriver endpoint; the browser's standard port when unset
    pub webdriver_url: Option<String>,
    pub headless: bool,
    pub viewport: ViewportSize,
    pub target_url: String,
    /// Pause after navigation so client-side rendering can finish
    pub load_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            browser: BrowserType::Chrome,
            webdriver_url: None,
            headless: true,
            viewport: ViewportSize::default(),
            target_url: DEFAULT_TARGET_URL.to_string(),
            load_delay: DEFAULT_LOAD_DELAY,
        }
    }
}

impl SessionConfig {
    pub fn webdriver_url(&self) -> String {
        self.webdriver_url
            .clone()
            .unwrap_or_else(|| self.browser.get_webdriver_url())
    }

    /// Reject target URLs that cannot be navigated to
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.target_url)
            .map_err(|e| anyhow::anyhow!("Invalid target URL '{}': {}", self.target_url, e))?;
        Ok(())
    }
}

/// Polling parameters for [`crate::waiter::Waiter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        WaitConfig {
            timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Tokens that disqualify a radio candidate when resolving another token.
///
/// Lexical only: resolving `male` must reject evidence mentioning `female`
/// because the former is a substring of the latter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictTable {
    pairs: BTreeMap<String, Vec<String>>,
}

impl Default for ConflictTable {
    fn default() -> Self {
        let mut table = ConflictTable::empty();
        table.insert("male", "female");
        table
    }
}

impl ConflictTable {
    pub fn empty() -> Self {
        ConflictTable {
            pairs: BTreeMap::new(),
        }
    }

    /// Register `conflict` as disqualifying for `token` (both lowercased)
    pub fn insert(&mut self, token: &str, conflict: &str) {
        let conflicts = self.pairs.entry(token.to_lowercase()).or_default();
        let conflict = conflict.to_lowercase();
        if !conflicts.contains(&conflict) {
            conflicts.push(conflict);
        }
    }

    /// Parse a `TOKEN=CONFLICT` pair as given on the command line
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let Some((token, conflict)) = pair.split_once('=') else {
            anyhow::bail!("Invalid conflict pair '{}'. Use TOKEN=CONFLICT", pair);
        };
        let (token, conflict) = (token.trim(), conflict.trim());
        if token.is_empty() || conflict.is_empty() {
            anyhow::bail!("Invalid conflict pair '{}'. Use TOKEN=CONFLICT", pair);
        }
        self.insert(token, conflict);
        Ok(())
    }

    /// Conflicting tokens for `token`, lowercased
    pub fn conflicts_for(&self, token: &str) -> &[String] {
        self.pairs
            .get(&token.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct RadioConfig {
    pub settle_delay: Duration,
    pub conflicts: ConflictTable,
}

impl RadioConfig {
    pub fn new(settle_delay: Duration, conflicts: ConflictTable) -> Self {
        RadioConfig {
            settle_delay,
            conflicts,
        }
    }
}

/// Everything a scenario run needs
#[derive(Debug, Clone)]
pub struct Config {
    pub session: SessionConfig,
    pub wait: WaitConfig,
    pub radio: RadioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            session: SessionConfig::default(),
            wait: WaitConfig::default(),
            radio: RadioConfig::new(DEFAULT_SETTLE_DELAY, ConflictTable::default()),
        }
    }
}
