//! Selectors and element handles for the collaborator seam.
//!
//! The poller itself never touches the DOM; probes do, through the narrow
//! interfaces in [`crate::driver`]. These are the value types that cross that
//! seam.
//!
//! Test-id selectors are the first-class way to address elements. Raw CSS
//! stays expressible (legacy suites key off syntax-highlighter class names),
//! but it couples the test to a styling implementation detail.

use serde::{Deserialize, Serialize};

/// Selector for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., "button.primary")
    Css(String),
    /// Test ID selector (data-test-subj attribute)
    TestId(String),
    /// Text content selector
    Text(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create a text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Human-readable description for error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Css(s) => format!("css={s}"),
            Self::TestId(id) => format!("test-id={id}"),
            Self::Text(t) => format!("text={t}"),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Handle to a located element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element
    pub id: String,
    /// Element tag name
    pub tag_name: String,
    /// Element text content, if any
    pub text_content: Option<String>,
    /// Whether the element is currently rendered
    pub visible: bool,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            visible: true,
        }
    }

    /// Set the text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    /// Mark the element as not rendered
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Text content if the element is visible
    #[must_use]
    pub fn visible_text(&self) -> Option<&str> {
        if self.visible {
            self.text_content.as_deref()
        } else {
            None
        }
    }
}
