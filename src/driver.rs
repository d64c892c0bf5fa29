//! Boundary to the browser automation driver.
//!
//! Everything above this module talks to the page only through [`Page`]
//! and [`Element`]. The WebDriver adapter lives in [`crate::webdriver`].

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::errors::DriverError;
use crate::types::LocatorQuery;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A single DOM node inside a page session.
///
/// Handles go stale when the page re-renders; every method may then
/// return [`DriverError::StaleElement`].
#[async_trait]
pub trait Element: Send + Sync + Sized {
    async fn is_displayed(&self) -> DriverResult<bool>;

    /// Markup attribute as written in the document
    async fn attribute(&self, name: &str) -> DriverResult<Option<String>>;

    /// Live DOM property (e.g. the current `value` of an input)
    async fn property(&self, name: &str) -> DriverResult<Option<String>>;

    /// Rendered text of the element and its descendants
    async fn text(&self) -> DriverResult<String>;

    async fn clear(&self) -> DriverResult<()>;

    async fn send_keys(&self, text: &str) -> DriverResult<()>;

    async fn click(&self) -> DriverResult<()>;

    async fn is_selected(&self) -> DriverResult<bool>;

    /// Immediate parent element
    async fn parent(&self) -> DriverResult<Self>;
}

/// An active browser session (the page handle)
#[async_trait]
pub trait Page: Send + Sync {
    type Element: Element;

    async fn navigate(&self, url: &str) -> DriverResult<()>;

    /// All matches in document order; empty when nothing matches
    async fn find_all(&self, query: &LocatorQuery) -> DriverResult<Vec<Self::Element>>;

    /// First match in document order, or [`DriverError::NoSuchElement`]
    async fn find_first(&self, query: &LocatorQuery) -> DriverResult<Self::Element> {
        self.find_all(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NoSuchElement(query.to_xpath()))
    }

    async fn set_viewport(&self, width: u32, height: u32) -> DriverResult<()>;

    /// Terminate the browser session
    async fn close_session(&self) -> DriverResult<()>;
}

/// Opens fresh, independent page sessions
#[async_trait]
pub trait Connector: Send + Sync {
    type Page: Page;

    async fn connect(&self, config: &SessionConfig) -> DriverResult<Self::Page>;
}
