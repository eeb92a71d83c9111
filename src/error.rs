use thiserror::Error;

/// Configuration problems detected before any browser work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error(
        "No {field} configured: set \"{config_key}\" in the [pcmc] section of your config file or the {env_var} environment variable"
    )]
    MissingCredential {
        field: &'static str,
        config_key: &'static str,
        env_var: &'static str,
    },

    #[error("Unknown timezone {value:?}: expected an IANA name such as \"America/Toronto\"")]
    InvalidTimezone { value: String },
}
