use std::fmt;

use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

use crate::config::PcmcConfig;
use crate::error::ConfigurationError;

use super::CredentialStore;

/// The three values needed to sign in.
#[derive(Clone)]
pub struct PcmcCredentials {
    username: SecretString,
    password: SecretString,
    security_answer: SecretString,
}

impl fmt::Debug for PcmcCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcmcCredentials").finish_non_exhaustive()
    }
}

impl PcmcCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        security_answer: impl Into<String>,
    ) -> Self {
        Self {
            username: SecretString::from(username.into()),
            password: SecretString::from(password.into()),
            security_answer: SecretString::from(security_answer.into()),
        }
    }

    pub fn username(&self) -> &str {
        self.username.expose_secret()
    }

    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    pub fn security_answer(&self) -> &str {
        self.security_answer.expose_secret()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Username,
    Password,
    SecurityAnswer,
}

impl CredentialField {
    pub const ALL: [CredentialField; 3] = [
        CredentialField::Username,
        CredentialField::Password,
        CredentialField::SecurityAnswer,
    ];

    /// Key in the `[pcmc]` config section and in credential stores.
    pub fn key(self) -> &'static str {
        match self {
            CredentialField::Username => "username",
            CredentialField::Password => "password",
            CredentialField::SecurityAnswer => "security_answer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CredentialField::Username => "username",
            CredentialField::Password => "password",
            CredentialField::SecurityAnswer => "security answer",
        }
    }

    pub fn env_var(self) -> &'static str {
        match self {
            CredentialField::Username => "PCMC_PLUGIN_USERNAME",
            CredentialField::Password => "PCMC_PLUGIN_PASSWORD",
            CredentialField::SecurityAnswer => "PCMC_PLUGIN_SECURITYANSWER",
        }
    }

    fn configured_value(self, section: &PcmcConfig) -> Option<&str> {
        let value = match self {
            CredentialField::Username => section.username.as_deref(),
            CredentialField::Password => section.password.as_deref(),
            CredentialField::SecurityAnswer => section.security_answer.as_deref(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn missing(self) -> ConfigurationError {
        ConfigurationError::MissingCredential {
            field: self.label(),
            config_key: self.key(),
            env_var: self.env_var(),
        }
    }
}

fn lookup(
    field: CredentialField,
    section: &PcmcConfig,
    fallback: &dyn CredentialStore,
) -> Result<Option<SecretString>> {
    if let Some(value) = field.configured_value(section) {
        return Ok(Some(SecretString::from(value.to_string())));
    }
    Ok(fallback
        .get(field.key())?
        .filter(|v| !v.expose_secret().trim().is_empty()))
}

/// Resolve every credential from the config section, falling back to
/// `fallback` for any that are unset or blank.
///
/// The first missing field is reported as a [`ConfigurationError`].
pub fn resolve_credentials(
    section: &PcmcConfig,
    fallback: &dyn CredentialStore,
) -> Result<PcmcCredentials> {
    let resolve = |field: CredentialField| -> Result<SecretString> {
        lookup(field, section, fallback)?.ok_or_else(|| field.missing().into())
    };

    Ok(PcmcCredentials {
        username: resolve(CredentialField::Username)?,
        password: resolve(CredentialField::Password)?,
        security_answer: resolve(CredentialField::SecurityAnswer)?,
    })
}

/// Where each credential would be taken from, without exposing values.
pub fn describe_sources(
    section: &PcmcConfig,
    fallback: &dyn CredentialStore,
) -> Result<Vec<(CredentialField, Option<String>)>> {
    CredentialField::ALL
        .iter()
        .map(|&field| {
            let source = if field.configured_value(section).is_some() {
                Some("config file".to_string())
            } else if lookup(field, section, fallback)?.is_some() {
                Some(fallback.describe(field.key()))
            } else {
                None
            };
            Ok((field, source))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryCredentialStore;

    fn full_store() -> MemoryCredentialStore {
        MemoryCredentialStore::new()
            .with("username", "env-user")
            .with("password", "env-pass")
            .with("security_answer", "env-answer")
    }

    #[test]
    fn config_values_take_precedence() -> Result<()> {
        let section = PcmcConfig {
            username: Some("cfg-user".to_string()),
            ..PcmcConfig::default()
        };
        let creds = resolve_credentials(&section, &full_store())?;
        assert_eq!(creds.username(), "cfg-user");
        assert_eq!(creds.password(), "env-pass");
        assert_eq!(creds.security_answer(), "env-answer");
        Ok(())
    }

    #[test]
    fn blank_config_value_falls_back() -> Result<()> {
        let section = PcmcConfig {
            password: Some("   ".to_string()),
            ..PcmcConfig::default()
        };
        let creds = resolve_credentials(&section, &full_store())?;
        assert_eq!(creds.password(), "env-pass");
        Ok(())
    }

    #[test]
    fn missing_everywhere_is_a_configuration_error() {
        let store = MemoryCredentialStore::new()
            .with("username", "u")
            .with("password", "p");
        let err = resolve_credentials(&PcmcConfig::default(), &store).unwrap_err();
        let config_err = err
            .downcast_ref::<ConfigurationError>()
            .expect("expected a configuration error");
        assert_eq!(
            config_err,
            &ConfigurationError::MissingCredential {
                field: "security answer",
                config_key: "security_answer",
                env_var: "PCMC_PLUGIN_SECURITYANSWER",
            }
        );
    }

    #[test]
    fn first_missing_field_is_reported() {
        let err = resolve_credentials(&PcmcConfig::default(), &MemoryCredentialStore::new())
            .unwrap_err();
        assert!(err.to_string().contains("No username configured"));
        assert!(err.to_string().contains("PCMC_PLUGIN_USERNAME"));
    }

    #[test]
    fn debug_output_hides_values() {
        let creds = PcmcCredentials::new("user", "hunter2", "fido");
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn sources_name_config_store_or_nothing() -> Result<()> {
        let section = PcmcConfig {
            username: Some("cfg-user".to_string()),
            ..PcmcConfig::default()
        };
        let store = MemoryCredentialStore::new().with("password", "p");
        let sources = describe_sources(&section, &store)?;
        assert_eq!(
            sources,
            vec![
                (CredentialField::Username, Some("config file".to_string())),
                (CredentialField::Password, Some("memory:password".to_string())),
                (CredentialField::SecurityAnswer, None),
            ]
        );
        Ok(())
    }
}
