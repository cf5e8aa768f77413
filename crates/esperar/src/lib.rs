//! Esperar: polling-based retry primitive for flaky-UI test synchronization
//!
//! Esperar (Spanish: "to wait") turns the ad hoc timeout literals scattered
//! through UI test suites into one reusable primitive: a [`RetryPoller`] that
//! invokes a caller-supplied probe until it succeeds or a deadline elapses,
//! sleeping between attempts and preserving the last failure for diagnostics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     ESPERAR Architecture                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐     ┌─────────────┐     ┌───────────────────┐   │
//! │   │ Scenario   │     │ RetryPoller │     │ Collaborators     │   │
//! │   │ steps      │────►│ probe loop  │────►│ BrowserDriver     │   │
//! │   │ (session)  │     │ + policy    │     │ ElementLocator    │   │
//! │   └────────────┘     └─────────────┘     └───────────────────┘   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use esperar::{EsperarError, RetryPolicy, RetryPoller};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let poller = RetryPoller::new();
//! let policy = RetryPolicy::new().with_timeout(5000).with_interval(500);
//!
//! let value = poller
//!     .retry_until(
//!         || async {
//!             // probe the application under test here
//!             Ok::<_, EsperarError>(42)
//!         },
//!         &policy,
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(value, 42);
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod driver;
mod locator;
mod policy;
mod poller;
mod result;
mod session;

/// Scripted mock collaborators for exercising retry behavior without a
/// browser
pub mod mock;

pub use config::Config;
pub use driver::{BrowserDriver, ElementLocator};
pub use locator::{ElementHandle, Selector};
pub use policy::{
    Backoff, RetryPolicy, DEFAULT_FIND_TIMEOUT_MS, DEFAULT_RETRY_INTERVAL_MS,
    DEFAULT_RETRY_TIMEOUT_MS,
};
pub use poller::{try_for_time, RetryPoller};
pub use result::{EsperarError, EsperarResult};
pub use session::TestSession;
