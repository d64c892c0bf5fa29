use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::driver::{Connector, Page};
use crate::errors::ProbeError;

/// A page session owned by exactly one scenario.
///
/// Created by [`Session::setup`] and released by [`Session::teardown`],
/// which is safe to call any number of times and never fails.
pub struct Session<P: Page> {
    page: Option<P>,
}

impl<P: Page> Session<P> {
    /// Open a page, size the viewport and load the target URL.
    ///
    /// If anything after connecting fails, the page is closed before the
    /// error is returned.
    pub async fn setup<C>(connector: &C, config: &SessionConfig) -> Result<Self, ProbeError>
    where
        C: Connector<Page = P>,
    {
        let page = connector.connect(config).await?;
        let mut session = Session { page: Some(page) };

        if let Err(e) = session.prepare(config).await {
            session.teardown().await;
            return Err(e);
        }
        Ok(session)
    }

    async fn prepare(&self, config: &SessionConfig) -> Result<(), ProbeError> {
        let Some(page) = self.page.as_ref() else {
            return Ok(());
        };

        let vp = config.viewport;
        // Best-effort: some drivers refuse window resizing in headless mode
        if let Err(e) = page.set_viewport(vp.width, vp.height).await {
            debug!("Note: Could not set window size: {}", e);
        }

        page.navigate(&config.target_url).await?;
        if !config.load_delay.is_zero() {
            debug!("Waiting {:?} for the page to render", config.load_delay);
            sleep(config.load_delay).await;
        }
        info!("Session ready at {}", config.target_url);
        Ok(())
    }

    /// The live page, or `None` once torn down
    pub fn page(&self) -> Option<&P> {
        self.page.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.page.is_some()
    }

    /// Close the browser session. Later calls do nothing; close errors
    /// are logged and swallowed.
    pub async fn teardown(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match page.close_session().await {
            Ok(()) => debug!("Session closed"),
            Err(e) => warn!("Failed to close session cleanly: {}", e),
        }
    }
}

impl<P: Page> Drop for Session<P> {
    fn drop(&mut self) {
        if self.page.is_some() {
            warn!("Session dropped without teardown; browser may be left running");
        }
    }
}
