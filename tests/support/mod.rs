#![allow(dead_code)]

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use pcmc_scrape::browser::BrowserSession;
use pcmc_scrape::sync::pcmc::{
    cycle_option_selector, cycle_options_script, selectors, transaction_rows_script,
};
use serde_json::Value;

/// A fake PC Mastercard site driven through the browser session contract.
///
/// Every call is recorded in `calls` so tests can assert the exact order
/// of page interactions.
#[derive(Debug, Clone)]
pub struct ScriptedSession {
    pub calls: Vec<String>,
    pub ask_security_question: bool,
    pub balance: Option<String>,
    /// Option values as the `<select>` lists them (`None` for placeholders).
    pub cycle_options: Vec<Option<String>>,
    pub rows: HashMap<String, Vec<Vec<String>>>,
    pub fail_navigation_for: Option<String>,
    selected_cycle: Option<String>,
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            ask_security_question: false,
            balance: Some("$1,234.56".to_string()),
            cycle_options: Vec::new(),
            rows: HashMap::new(),
            fail_navigation_for: None,
            selected_cycle: None,
        }
    }
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_security_question(mut self) -> Self {
        self.ask_security_question = true;
        self
    }

    pub fn without_balance(mut self) -> Self {
        self.balance = None;
        self
    }

    pub fn with_placeholder_cycle(mut self) -> Self {
        self.cycle_options.push(None);
        self
    }

    /// Add a statement cycle whose table rows are `(date, merchant, amount)`.
    pub fn with_cycle(mut self, cycle: &str, rows: &[(&str, &str, &str)]) -> Self {
        self.cycle_options.push(Some(cycle.to_string()));
        let table = rows
            .iter()
            .map(|(date, merchant, amount)| {
                vec![
                    "\u{a0}".to_string(),
                    date.to_string(),
                    merchant.to_string(),
                    amount.to_string(),
                ]
            })
            .collect();
        self.rows.insert(cycle.to_string(), table);
        self
    }

    /// Prepend a header row to a cycle's table.
    pub fn with_header_row(mut self, cycle: &str) -> Self {
        if let Some(table) = self.rows.get_mut(cycle) {
            table.insert(
                0,
                vec![
                    String::new(),
                    "Transaction Date".to_string(),
                    "Description".to_string(),
                    "Amount".to_string(),
                ],
            );
        }
        self
    }

    pub fn failing_navigation_for(mut self, cycle: &str) -> Self {
        self.fail_navigation_for = Some(cycle.to_string());
        self
    }

    pub fn row_fetches(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| c.strip_prefix("evaluate:rows:"))
            .map(str::to_string)
            .collect()
    }

    fn known_cycle(&self, selector: &str) -> Option<String> {
        self.rows
            .keys()
            .find(|cycle| cycle_option_selector(cycle) == selector)
            .cloned()
    }
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn navigate_to(&mut self, url: &str) -> Result<()> {
        self.calls.push(format!("navigate:{url}"));
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.calls.push(format!("click:{selector}"));
        if selector.starts_with("body > ul.selectBox-dropdown-menu") {
            match self.known_cycle(selector) {
                Some(cycle) => self.selected_cycle = Some(cycle),
                None => anyhow::bail!("Element not found: {selector}"),
            }
        }
        Ok(())
    }

    async fn type_into_focused(&mut self, text: &str) -> Result<()> {
        self.calls.push(format!("type:{text}"));
        Ok(())
    }

    async fn wait_for_navigation(&mut self) -> Result<()> {
        self.calls.push("wait".to_string());
        if let (Some(failing), Some(selected)) = (&self.fail_navigation_for, &self.selected_cycle) {
            if failing == selected {
                anyhow::bail!("navigation timed out");
            }
        }
        Ok(())
    }

    async fn exists(&mut self, selector: &str) -> Result<bool> {
        self.calls.push(format!("exists:{selector}"));
        Ok(selector == selectors::SECURITY_ANSWER_FIELD && self.ask_security_question)
    }

    async fn query_selector_html(&mut self, selector: &str) -> Result<Option<String>> {
        self.calls.push(format!("html:{selector}"));
        if selector == selectors::CURRENT_BALANCE {
            Ok(self.balance.clone())
        } else {
            Ok(None)
        }
    }

    async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        if expression == cycle_options_script() {
            self.calls.push("evaluate:cycles".to_string());
            return Ok(serde_json::to_value(&self.cycle_options)?);
        }
        if expression == transaction_rows_script() {
            let cycle = self.selected_cycle.clone().unwrap_or_default();
            self.calls.push(format!("evaluate:rows:{cycle}"));
            let table = self.rows.get(&cycle).cloned().unwrap_or_default();
            return Ok(serde_json::to_value(table)?);
        }
        anyhow::bail!("unexpected script: {expression}")
    }
}
