//! Browser session abstraction.
//!
//! Scrape sources drive a live page only through [`BrowserSession`], so the
//! page flow can be exercised against a scripted session in tests and a
//! real Chrome instance in production.

#[cfg(feature = "browser")]
mod chrome;

#[cfg(feature = "browser")]
pub use chrome::{find_chrome, ChromeSession};

use anyhow::Result;
use async_trait::async_trait;

/// The page operations a scrape source is allowed to perform.
///
/// Every call acts on the single page the session owns. Failures (missing
/// selector, navigation error) are returned as errors; implementations do
/// not retry.
#[async_trait]
pub trait BrowserSession: Send {
    async fn navigate_to(&mut self, url: &str) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Type text into whichever element currently has focus.
    async fn type_into_focused(&mut self, text: &str) -> Result<()>;

    /// Block until the in-flight navigation completes.
    async fn wait_for_navigation(&mut self) -> Result<()>;

    /// Whether any element matches `selector`.
    async fn exists(&mut self, selector: &str) -> Result<bool>;

    /// Inner HTML of the first element matching `selector`, if there is one.
    async fn query_selector_html(&mut self, selector: &str) -> Result<Option<String>>;

    /// Evaluate a JavaScript expression in the page and return its JSON value.
    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value>;
}

/// Render `value` as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    // JSON strings are valid JS string literals.
    serde_json::Value::String(value.to_string()).to_string()
}
