//! API credentials that never leak into logs.

use secrecy::{ExposeSecret, SecretString};

use super::AdapterError;

/// A secret API key.
///
/// `Debug` and `Display` print `[REDACTED]`; the raw value is only
/// reachable through [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            name,
        }
    }

    /// Load from an environment variable; unset or blank is a configuration error
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, AdapterError> {
        Self::from_lookup(env_var, name, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(env_var: &str, name: &'static str, lookup: F) -> Result<Self, AdapterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(env_var) {
            Some(value) if !value.trim().is_empty() => Ok(Self::new(value.trim(), name)),
            _ => Err(AdapterError::NotConfigured(format!(
                "{} not set: configure the '{}' environment variable",
                name, env_var
            ))),
        }
    }

    /// Raw secret, for building request headers only
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn name(&self) -> &str {
        self.name
    }
}

impl std::fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredential")
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl std::fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: [REDACTED]", self.name)
    }
}
