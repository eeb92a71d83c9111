//! PC Mastercard online banking scrape source.
//!
//! Signs in (answering the security question when the site asks for it),
//! reads the current balance, then selects each statement cycle in turn and
//! snapshots its transaction table for the extractor.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::browser::{js_string, BrowserSession};
use crate::credentials::PcmcCredentials;
use crate::extract::{CycleRowSource, IncrementalExtractor};
use crate::models::{RawRow, Transaction};

use super::{ScrapeResult, ScrapeSource};

pub const LOGIN_URL: &str = "https://online.pcmastercard.ca/PCB_Consumer/Login.do";

/// CSS selectors for the pages the source walks through.
pub mod selectors {
    pub const USERNAME_FIELD: &str = r#"input[name="username"]"#;
    pub const PASSWORD_FIELD: &str = r#"input[name="password"]"#;
    pub const SIGN_ON_BUTTON: &str = r#"#content > div.module-login.module.clearfix > div.module-content > form > div.actions.group.clearfix > div:nth-child(2) > input[type="submit"]"#;
    pub const SECURITY_ANSWER_FIELD: &str =
        r#"form[name="secondaryUserAuthForm"] input[name="hintanswer"]"#;
    pub const SECURITY_SUBMIT_BUTTON: &str = r#"input[type="submit"][name="submitNext"]"#;
    pub const CURRENT_BALANCE: &str = "#main > div > div.sidebar.column > div.module-make-payment.module.hide-on-mobile.clearfix > div > div.value > span";
    pub const CYCLE_OPTIONS: &str =
        r#"form[name="transHistoryForm"] select[name="cycleDate"] option"#;
    pub const CYCLE_SELECT_BOX: &str = r#"form[name="transHistoryForm"] a.selectBox"#;
    pub const TRANSACTION_ROWS: &str = r#"table[id="sortTable"] > tbody > tr"#;
}

/// Dropdown entry for a statement cycle.
pub fn cycle_option_selector(cycle: &str) -> String {
    format!(r#"body > ul.selectBox-dropdown-menu > li > a[rel="{cycle}"]"#)
}

/// Script listing the statement cycle option values (null for placeholders).
pub fn cycle_options_script() -> String {
    format!(
        "Array.from(document.querySelectorAll({})).map((option) => option.getAttribute('value'))",
        js_string(selectors::CYCLE_OPTIONS)
    )
}

/// Script snapshotting the transaction table as cell texts per row.
pub fn transaction_rows_script() -> String {
    format!(
        "Array.from(document.querySelectorAll({})).map((row) => Array.from(row.querySelectorAll('td')).map((cell) => cell.innerText))",
        js_string(selectors::TRANSACTION_ROWS)
    )
}

/// Scrape source for the PC Mastercard site.
pub struct PcMastercardSource<S> {
    session: S,
    credentials: PcmcCredentials,
    extractor: IncrementalExtractor,
}

impl<S: BrowserSession> PcMastercardSource<S> {
    pub fn new(session: S, credentials: PcmcCredentials, extractor: IncrementalExtractor) -> Self {
        Self {
            session,
            credentials,
            extractor,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn into_session(self) -> S {
        self.session
    }

    pub fn extractor(&self) -> &IncrementalExtractor {
        &self.extractor
    }

    async fn log_in(&mut self) -> Result<()> {
        let session = &mut self.session;

        session.navigate_to(LOGIN_URL).await?;

        session.click(selectors::USERNAME_FIELD).await?;
        session
            .type_into_focused(self.credentials.username())
            .await?;

        session.click(selectors::PASSWORD_FIELD).await?;
        session
            .type_into_focused(self.credentials.password())
            .await?;

        session.click(selectors::SIGN_ON_BUTTON).await?;
        session
            .wait_for_navigation()
            .await
            .context("Sign-on did not complete")?;

        // The security question only appears on some sign-ins.
        if session.exists(selectors::SECURITY_ANSWER_FIELD).await? {
            debug!("Answering security question");
            session.click(selectors::SECURITY_ANSWER_FIELD).await?;
            session
                .type_into_focused(self.credentials.security_answer())
                .await?;
            session.click(selectors::SECURITY_SUBMIT_BUTTON).await?;
            session
                .wait_for_navigation()
                .await
                .context("Security question step did not complete")?;
        }

        Ok(())
    }

    async fn read_balance(&mut self) -> Result<String> {
        self.session
            .query_selector_html(selectors::CURRENT_BALANCE)
            .await?
            .with_context(|| format!("Balance element not found: {}", selectors::CURRENT_BALANCE))
    }

    async fn statement_cycles(&mut self) -> Result<Vec<String>> {
        let value = self.session.evaluate(&cycle_options_script()).await?;
        let options: Vec<Option<String>> =
            serde_json::from_value(value).context("Unexpected statement cycle list")?;
        Ok(options.into_iter().map(Option::unwrap_or_default).collect())
    }

    /// Run the full sign-in and statement walk.
    pub async fn scrape_transactions(&mut self) -> Result<Vec<Transaction>> {
        debug!("Initiating transaction download");
        self.log_in().await?;
        info!("Successfully logged in");

        let balance = self.read_balance().await?;
        debug!("Current balance is: {balance}");
        self.extractor.set_remaining_balance(balance);

        let cycles = self.statement_cycles().await?;
        debug!(count = cycles.len(), "Found statement cycles");

        let mut pager = CyclePager {
            session: &mut self.session,
        };
        self.extractor.run_full_scrape(&cycles, &mut pager).await
    }
}

/// Selects statement cycles in the live page and snapshots their rows.
struct CyclePager<'a, S> {
    session: &'a mut S,
}

#[async_trait]
impl<'a, S: BrowserSession> CycleRowSource for CyclePager<'a, S> {
    async fn fetch_rows(&mut self, cycle: &str) -> Result<Vec<RawRow>> {
        self.session.click(selectors::CYCLE_SELECT_BOX).await?;
        self.session.click(&cycle_option_selector(cycle)).await?;
        self.session.wait_for_navigation().await?;

        let value = self.session.evaluate(&transaction_rows_script()).await?;
        serde_json::from_value(value).context("Unexpected transaction table snapshot")
    }
}

#[async_trait]
impl<S: BrowserSession> ScrapeSource for PcMastercardSource<S> {
    fn name(&self) -> &str {
        "pcmc"
    }

    async fn scrape(&mut self) -> Result<ScrapeResult> {
        let transactions = self.scrape_transactions().await?;
        Ok(ScrapeResult {
            transactions,
            high_water_mark: self.extractor.high_water_mark(),
            remaining_balance: self.extractor.remaining_balance().to_string(),
        })
    }
}
