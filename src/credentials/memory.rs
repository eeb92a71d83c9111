//! In-memory credential store for testing.

use std::collections::HashMap;

use anyhow::Result;
use secrecy::SecretString;

use super::CredentialStore;

#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    values: HashMap<String, String>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: &str) -> Result<Option<SecretString>> {
        Ok(self.values.get(key).cloned().map(SecretString::from))
    }

    fn describe(&self, key: &str) -> String {
        format!("memory:{key}")
    }
}
