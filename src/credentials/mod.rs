//! Credential lookup and resolution.
//!
//! Credentials come from the `[pcmc]` section of the config file first and
//! fall back to a [`CredentialStore`] (by default the process environment).
//! Resolution happens once, before a scrape source is built, so nothing
//! downstream ever reads the environment.

mod env;
mod memory;
mod resolve;

pub use env::EnvCredentialStore;
pub use memory::MemoryCredentialStore;
pub use resolve::{describe_sources, resolve_credentials, CredentialField, PcmcCredentials};

use anyhow::Result;
use secrecy::SecretString;

/// A read-only key-value source of credentials.
///
/// Keys are the logical field names (`username`, `password`,
/// `security_answer`); each backend maps them to its own locations.
pub trait CredentialStore: Send + Sync {
    /// Retrieve a credential by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    /// Returns `Err` if there was an error accessing the backend.
    fn get(&self, key: &str) -> Result<Option<SecretString>>;

    /// Where this store looks for `key`, for diagnostics.
    fn describe(&self, key: &str) -> String;
}
