//! Scripted mock collaborators.
//!
//! Retry semantics are exercised against the actual poller loop, not a model
//! of it: these mocks implement the [`crate::driver`] traits with scripted
//! timelines (elements that appear after N polls, URLs that change after N
//! lookups) so tests can assert exact attempt counts deterministically.

use crate::driver::{BrowserDriver, ElementLocator};
use crate::locator::{ElementHandle, Selector};
use crate::result::{EsperarError, EsperarResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

// =============================================================================
// MOCK BROWSER
// =============================================================================

#[derive(Debug, Default)]
struct BrowserState {
    current_url: String,
    /// URL that becomes current after N more `current_url` lookups
    pending_url: Option<(String, u32)>,
    navigations: Vec<String>,
    hovers: Vec<String>,
}

/// Browser driver with a scripted URL timeline and recorded interactions
#[derive(Debug, Default)]
pub struct MockBrowser {
    state: Mutex<BrowserState>,
}

impl MockBrowser {
    /// Create a mock browser with an empty URL
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current URL immediately
    pub async fn set_url(&self, url: impl Into<String>) {
        self.state.lock().await.current_url = url.into();
    }

    /// Script a URL that becomes current after `polls` more lookups
    pub async fn set_url_after_polls(&self, url: impl Into<String>, polls: u32) {
        self.state.lock().await.pending_url = Some((url.into(), polls));
    }

    /// Apps navigated to, in order
    pub async fn navigations(&self) -> Vec<String> {
        self.state.lock().await.navigations.clone()
    }

    /// Element ids hovered over, in order
    pub async fn hovers(&self) -> Vec<String> {
        self.state.lock().await.hovers.clone()
    }
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn navigate_to_app(&self, name: &str) -> EsperarResult<()> {
        let mut state = self.state.lock().await;
        state.current_url = format!("/app/{name}");
        state.navigations.push(name.to_string());
        Ok(())
    }

    async fn current_url(&self) -> EsperarResult<String> {
        let mut state = self.state.lock().await;
        if let Some((url, remaining)) = state.pending_url.take() {
            if remaining == 0 {
                state.current_url = url;
            } else {
                state.pending_url = Some((url, remaining - 1));
            }
        }
        Ok(state.current_url.clone())
    }

    async fn move_mouse_to(&self, element: &ElementHandle) -> EsperarResult<()> {
        self.state.lock().await.hovers.push(element.id.clone());
        Ok(())
    }
}

// =============================================================================
// SCRIPTED LOCATOR
// =============================================================================

#[derive(Debug)]
struct ScriptedElement {
    element: ElementHandle,
    /// Polls of the owning selector before the element is reported
    appears_after: u32,
}

#[derive(Debug, Default)]
struct LocatorState {
    /// Scripted elements keyed by selector description
    elements: HashMap<String, Vec<ScriptedElement>>,
    /// Poll counts keyed by selector description
    polls: HashMap<String, u32>,
    clicks: Vec<String>,
}

/// Element locator whose elements become visible after a scripted number of
/// polls
#[derive(Debug, Default)]
pub struct ScriptedLocator {
    state: Mutex<LocatorState>,
}

impl ScriptedLocator {
    /// Create an empty scripted locator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script an element for a selector, visible after `appears_after` polls
    pub async fn script(&self, selector: &Selector, element: ElementHandle, appears_after: u32) {
        let mut state = self.state.lock().await;
        state
            .elements
            .entry(selector.describe())
            .or_default()
            .push(ScriptedElement {
                element,
                appears_after,
            });
    }

    /// Script an immediately-present element addressed by test id
    pub async fn script_test_subject(&self, test_id: &str) {
        self.script(
            &Selector::test_id(test_id),
            ElementHandle::new(test_id, "div"),
            0,
        )
        .await;
    }

    /// Remove all scripted elements for a selector (simulates deletion)
    pub async fn clear(&self, selector: &Selector) {
        let mut state = self.state.lock().await;
        let _ = state.elements.remove(&selector.describe());
    }

    /// Test ids clicked, in order
    pub async fn clicks(&self) -> Vec<String> {
        self.state.lock().await.clicks.clone()
    }

    /// Number of times a selector has been polled
    pub async fn poll_count(&self, selector: &Selector) -> u32 {
        self.state
            .lock()
            .await
            .polls
            .get(&selector.describe())
            .copied()
            .unwrap_or(0)
    }

    fn visible_matches(state: &mut LocatorState, key: &str) -> Vec<ElementHandle> {
        let polls = {
            let entry = state.polls.entry(key.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        state
            .elements
            .get(key)
            .map(|scripted| {
                scripted
                    .iter()
                    .filter(|s| polls > s.appears_after)
                    .map(|s| s.element.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ElementLocator for ScriptedLocator {
    async fn find_all(
        &self,
        selector: &Selector,
        _timeout: Duration,
    ) -> EsperarResult<Vec<ElementHandle>> {
        let mut state = self.state.lock().await;
        Ok(Self::visible_matches(&mut state, &selector.describe()))
    }

    async fn exists(&self, test_id: &str) -> EsperarResult<bool> {
        let mut state = self.state.lock().await;
        let key = Selector::test_id(test_id).describe();
        Ok(!Self::visible_matches(&mut state, &key).is_empty())
    }

    async fn click(&self, test_id: &str) -> EsperarResult<()> {
        let mut state = self.state.lock().await;
        let key = Selector::test_id(test_id).describe();
        if Self::visible_matches(&mut state, &key).is_empty() {
            return Err(EsperarError::ElementNotFound {
                selector: key,
            });
        }
        state.clicks.push(test_id.to_string());
        Ok(())
    }

    async fn click_element(&self, element: &ElementHandle) -> EsperarResult<()> {
        let mut state = self.state.lock().await;
        state.clicks.push(element.id.clone());
        Ok(())
    }
}
