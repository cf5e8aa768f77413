//! Explicit test session context.
//!
//! Scenario steps receive the browser, the element finder, the configuration,
//! and the poller as one explicit value instead of capturing them from an
//! enclosing scope. The helpers here are the step vocabulary a navigation
//! scenario needs: wait for an element keyed by test id, click it, poll the
//! URL for an expected fragment.

use crate::config::Config;
use crate::driver::{BrowserDriver, ElementLocator};
use crate::locator::{ElementHandle, Selector};
use crate::policy::RetryPolicy;
use crate::poller::RetryPoller;
use crate::result::{EsperarError, EsperarResult};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Bundled collaborators for one test scenario
pub struct TestSession {
    driver: Arc<dyn BrowserDriver>,
    locator: Arc<dyn ElementLocator>,
    config: Config,
    poller: RetryPoller,
}

impl std::fmt::Debug for TestSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSession")
            .field("config", &self.config)
            .field("poller", &self.poller)
            .finish_non_exhaustive()
    }
}

impl TestSession {
    /// Create a session; the poller's default policy comes from config
    /// (`timeouts.try`, `timeouts.poll_interval`)
    #[must_use]
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        locator: Arc<dyn ElementLocator>,
        config: Config,
    ) -> Self {
        let poller = RetryPoller::with_policy(
            RetryPolicy::new()
                .with_timeout(config.try_timeout_ms())
                .with_interval(config.poll_interval_ms()),
        );
        Self {
            driver,
            locator,
            config,
            poller,
        }
    }

    /// Attach a cancellation token so an aborted run stops waiting promptly
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.poller = self.poller.with_cancellation(cancel);
        self
    }

    /// The session's retry poller
    #[must_use]
    pub const fn poller(&self) -> &RetryPoller {
        &self.poller
    }

    /// The session's configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Navigate to a named application
    pub async fn navigate_to_app(&self, name: &str) -> EsperarResult<()> {
        info!(app = name, "navigating to app");
        self.driver.navigate_to_app(name).await
    }

    /// Current URL of the active page
    pub async fn current_url(&self) -> EsperarResult<String> {
        self.driver.current_url().await
    }

    /// Hover over a located element
    pub async fn hover(&self, element: &ElementHandle) -> EsperarResult<()> {
        debug!(element = %element.id, "hovering");
        self.driver.move_mouse_to(element).await
    }

    /// Poll until an element with the given test id exists
    pub async fn wait_for_test_subject(&self, test_id: &str) -> EsperarResult<()> {
        let locator = Arc::clone(&self.locator);
        let policy = self.poller.policy().clone();
        let description = format!("test subject {test_id} to exist");
        self.poller
            .wait_for(
                &description,
                move || {
                    let locator = Arc::clone(&locator);
                    let test_id = test_id.to_string();
                    async move { locator.exists(&test_id).await.unwrap_or(false) }
                },
                &policy,
            )
            .await
    }

    /// Wait for an element by test id, then click it
    pub async fn click_test_subject(&self, test_id: &str) -> EsperarResult<()> {
        self.wait_for_test_subject(test_id).await?;
        debug!(test_id, "clicking");
        self.locator.click(test_id).await
    }

    /// Click a previously located element
    pub async fn click_element(&self, element: &ElementHandle) -> EsperarResult<()> {
        debug!(element = %element.id, "clicking");
        self.locator.click_element(element).await
    }

    /// Find all elements matching a selector within the configured find budget
    pub async fn find_all(&self, selector: &Selector) -> EsperarResult<Vec<ElementHandle>> {
        let timeout = Duration::from_millis(self.config.find_timeout_ms());
        self.locator.find_all(selector, timeout).await
    }

    /// Find the element at `index` among a selector's matches and assert its
    /// visible text
    pub async fn expect_visible_text(
        &self,
        selector: &Selector,
        index: usize,
        expected: &str,
    ) -> EsperarResult<ElementHandle> {
        let matches = self.find_all(selector).await?;
        let element = matches
            .get(index)
            .ok_or_else(|| EsperarError::ElementNotFound {
                selector: format!("{selector}[{index}]"),
            })?;
        let text = element.visible_text().unwrap_or_default();
        if text == expected {
            Ok(element.clone())
        } else {
            Err(EsperarError::probe(format!(
                "expected {selector}[{index}] to read {expected:?}, got {text:?}"
            )))
        }
    }

    /// Poll the current URL until it contains `fragment`, returning the URL
    pub async fn wait_for_url_fragment(
        &self,
        fragment: &str,
        timeout_ms: u64,
    ) -> EsperarResult<String> {
        let driver = Arc::clone(&self.driver);
        self.poller
            .try_for_time(timeout_ms, move || {
                let driver = Arc::clone(&driver);
                let fragment = fragment.to_string();
                async move {
                    let url = driver.current_url().await?;
                    info!(%url, "jumped to url");
                    if url.contains(&fragment) {
                        Ok(url)
                    } else {
                        Err(EsperarError::probe(format!(
                            "url {url:?} does not contain {fragment:?}"
                        )))
                    }
                }
            })
            .await
    }
}
