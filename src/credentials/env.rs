//! Environment-variable credential backend.

use anyhow::{Context, Result};
use secrecy::SecretString;

use super::CredentialStore;

/// Prefix of the environment variables the PC Mastercard credentials are
/// read from.
pub const ENV_PREFIX: &str = "PCMC_PLUGIN_";

/// Reads credentials from `PCMC_PLUGIN_<KEY>` variables.
///
/// The key is upper-cased with underscores removed, so `security_answer`
/// maps to `PCMC_PLUGIN_SECURITYANSWER`.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvCredentialStore {
    pub fn new() -> Self {
        Self::with_prefix(ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Name of the variable holding `key`.
    pub fn var_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        format!("{}{suffix}", self.prefix)
    }
}

impl CredentialStore for EnvCredentialStore {
    fn get(&self, key: &str) -> Result<Option<SecretString>> {
        let name = self.var_name(key);
        match std::env::var(&name) {
            Ok(value) => Ok(Some(SecretString::from(value))),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {name}")),
        }
    }

    fn describe(&self, key: &str) -> String {
        format!("${}", self.var_name(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_keys_to_plugin_variables() {
        let store = EnvCredentialStore::new();
        assert_eq!(store.var_name("username"), "PCMC_PLUGIN_USERNAME");
        assert_eq!(store.var_name("password"), "PCMC_PLUGIN_PASSWORD");
        assert_eq!(
            store.var_name("security_answer"),
            "PCMC_PLUGIN_SECURITYANSWER"
        );
    }

    #[test]
    fn missing_variable_is_none() -> Result<()> {
        let store = EnvCredentialStore::with_prefix("PCMC_SCRAPE_TEST_UNSET_");
        assert!(store.get("username")?.is_none());
        Ok(())
    }
}
