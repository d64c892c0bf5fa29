//! # formprobe
#![allow(clippy::uninlined_format_args)]
//!
//! Resilient element location for WebDriver form tests.
//!
//! Given a human-readable label ("First Name", "Email") formprobe finds the
//! matching control on a page whose markup you don't control, waiting for
//! late rendering and ignoring hidden or stale matches. Radio buttons are
//! picked by token ("male") with exclusion of conflicting tokens ("female").
//!
//! ## CLI Usage
//!
//! ```bash
//! # Start a WebDriver first
//! chromedriver --port 9515
//!
//! # Run the built-in scenarios against the practice form
//! formprobe run
//!
//! # Run a single scenario, JSON report
//! formprobe run --only gender_radio --format json
//!
//! # Fill a field by its label and verify the value
//! formprobe fill "First Name" "Ananya"
//!
//! # Select a radio by token, with an extra conflicting pair
//! formprobe select-radio male --conflict man=woman
//!
//! # Show which lookup strategy finds a label
//! formprobe resolve "Email"
//!
//! # Other page, Firefox, visible window
//! formprobe --url "https://example.com/form" --browser firefox --no-headless run
//! ```
//!
//! ## Lookup Order
//!
//! 1. `<label>` containing the text, then the next input/textarea/select
//! 2. input/textarea/select whose placeholder or aria-label contains the text
//! 3. any element containing the text, then the next input/select/textarea
//!
//! Each strategy is polled for up to the wait timeout (5 s by default).
//! Only when all three come up empty is [`ProbeError::FieldNotFound`] raised.
//!
//! ## Library Usage
//!
//! ```no_run
//! use formprobe::{Config, FieldResolver, RadioDisambiguator, Session, Waiter, WebDriverConnector};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let mut session = Session::setup(&WebDriverConnector, &config.session).await?;
//!
//! if let Some(page) = session.page() {
//!     FieldResolver::new(page, Waiter::new(config.wait))
//!         .fill_field("First Name", "Ananya")
//!         .await?;
//!     RadioDisambiguator::new(page, config.radio.clone())
//!         .select_radio_by_token("male")
//!         .await?;
//! }
//!
//! session.teardown().await;
//! # Ok(())
//! # }
//! ```

/// Explicit session, wait and radio configuration
pub mod config;

/// Browser driver boundary traits
pub mod driver;

/// Error types and exit codes
pub mod errors;

/// Radio button disambiguation by token
pub mod radio;

/// Label-to-field resolution
pub mod resolver;

/// Scenario definitions and runner
pub mod scenario;

/// Scoped browser sessions
pub mod session;

/// Ordered lookup strategies
pub mod strategy;

/// Query and viewport types
pub mod types;

/// Polling with timeout
pub mod waiter;

/// WebDriver implementation of the driver boundary
pub mod webdriver;

#[cfg(test)]
pub(crate) mod fake_page;

pub use config::{Config, ConflictTable, RadioConfig, SessionConfig, WaitConfig};
pub use driver::{Connector, Element, Page};
pub use errors::{DriverError, ErrorKind, ProbeError};
pub use radio::{RadioDisambiguator, RadioSelection};
pub use resolver::FieldResolver;
pub use scenario::{RunReport, Scenario, Step, default_suite, run_suite};
pub use session::Session;
pub use strategy::{Strategy, StrategyChain};
pub use types::{LocatorQuery, OutputFormat, QueryKind, ViewportSize};
pub use waiter::{WaitOutcome, Waiter};
pub use webdriver::{Browser, BrowserType, WebDriverConnector};
