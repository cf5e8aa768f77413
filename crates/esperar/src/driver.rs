//! Collaborator traits for the system under test.
//!
//! The poller consumes a browser and an element finder through these narrow
//! interfaces; real implementations (CDP, WebDriver) live outside this crate.
//! Probes close over these traits, so retry semantics are testable against
//! the scripted implementations in [`crate::mock`].

use crate::locator::{ElementHandle, Selector};
use crate::result::EsperarResult;
use async_trait::async_trait;
use std::time::Duration;

/// Browser-level operations a test scenario needs
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to a named application (e.g., "code")
    async fn navigate_to_app(&self, name: &str) -> EsperarResult<()>;

    /// Current URL of the active page
    async fn current_url(&self) -> EsperarResult<String>;

    /// Move the mouse over an element (to trigger hover UI)
    async fn move_mouse_to(&self, element: &ElementHandle) -> EsperarResult<()>;
}

/// Element lookup and interaction
#[async_trait]
pub trait ElementLocator: Send + Sync {
    /// Find all elements matching a selector, waiting up to `timeout`
    async fn find_all(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> EsperarResult<Vec<ElementHandle>>;

    /// Whether an element with the given test id currently exists
    async fn exists(&self, test_id: &str) -> EsperarResult<bool>;

    /// Click the element with the given test id
    async fn click(&self, test_id: &str) -> EsperarResult<()>;

    /// Click a previously located element
    async fn click_element(&self, element: &ElementHandle) -> EsperarResult<()>;
}
