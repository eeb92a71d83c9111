//! Chrome DevTools-backed browser session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::input::InsertTextParams;
use chromiumoxide::cdp::js_protocol::runtime::EventConsoleApiCalled;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::debug;

use super::{js_string, BrowserSession};
use crate::config::BrowserSettings;

/// A single Chrome page driven over the DevTools protocol.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    console_task: JoinHandle<()>,
}

impl ChromeSession {
    /// Launch Chrome/Chromium and open a blank page.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome_path = match &settings.chrome_executable {
            Some(path) => path.clone(),
            None => find_chrome().context(
                "Chrome/Chromium not found. Install Chrome or set browser.chrome_executable.",
            )?,
        };

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !settings.headless {
            builder = builder.with_head().viewport(None);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser page")?;
        let console_task = forward_console(&page).await?;

        Ok(Self {
            browser,
            page,
            handler_task,
            console_task,
        })
    }

    /// Close the browser. Dropping the session without calling this still
    /// stops the background tasks but leaves the process to exit on its own.
    pub async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .context("Failed to close browser")?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.console_task.abort();
        self.handler_task.abort();
    }
}

/// Mirror the page's console output into debug logs.
async fn forward_console(page: &Page) -> Result<JoinHandle<()>> {
    let mut events = page
        .event_listener::<EventConsoleApiCalled>()
        .await
        .context("Failed to subscribe to console events")?;

    Ok(tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let text = event
                .args
                .iter()
                .map(|arg| match (&arg.value, &arg.description) {
                    (Some(serde_json::Value::String(s)), _) => s.clone(),
                    (Some(value), _) => value.to_string(),
                    (None, Some(description)) => description.clone(),
                    (None, None) => String::new(),
                })
                .collect::<Vec<_>>()
                .join(" ");
            debug!(target: "pcmc_scrape::page_console", "{text}");
        }
    }))
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate_to(&mut self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {selector}"))?;
        element
            .click()
            .await
            .with_context(|| format!("Failed to click {selector}"))?;
        Ok(())
    }

    async fn type_into_focused(&mut self, text: &str) -> Result<()> {
        self.page
            .execute(InsertTextParams::new(text))
            .await
            .context("Failed to type into focused field")?;
        Ok(())
    }

    async fn wait_for_navigation(&mut self) -> Result<()> {
        self.page
            .wait_for_navigation()
            .await
            .context("Navigation did not complete")?;
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool> {
        let expression = format!("document.querySelector({}) !== null", js_string(selector));
        Ok(self.evaluate(&expression).await?.as_bool().unwrap_or(false))
    }

    async fn query_selector_html(&mut self, selector: &str) -> Result<Option<String>> {
        let expression = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerHTML : null; }})()",
            js_string(selector)
        );
        Ok(self
            .evaluate(&expression)
            .await?
            .as_str()
            .map(str::to_string))
    }

    async fn evaluate(&mut self, expression: &str) -> Result<serde_json::Value> {
        let result = self
            .page
            .evaluate(expression.to_string())
            .await
            .context("Failed to evaluate script in page")?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }
}

/// Find Chrome/Chromium executable.
pub fn find_chrome() -> Option<PathBuf> {
    for name in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    candidates
        .iter()
        .map(Path::new)
        .find(|candidate| candidate.exists())
        .map(Path::to_path_buf)
}
