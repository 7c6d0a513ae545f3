//! API credentials for the model and search providers.
//!
//! Both keys are read once at startup. A missing key fails fast, before the
//! HTTP listener binds or the chat prompt opens, and the error names every
//! missing variable at once.

pub mod env;

use secrecy::SecretString;

use buddy_types::config::ConfigError;

use self::env::read_env_secret;

/// Environment variable holding the Groq API key.
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";

/// Environment variable holding the Tavily API key.
pub const TAVILY_API_KEY: &str = "TAVILY_API_KEY";

/// Resolved provider credentials.
pub struct ApiCredentials {
    pub llm: SecretString,
    pub search: SecretString,
}

impl ApiCredentials {
    /// Read both keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(read_env_secret)
    }

    /// Resolve both keys through `lookup`, reporting every missing one.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<SecretString>,
    ) -> Result<Self, ConfigError> {
        let llm = lookup(GROQ_API_KEY);
        let search = lookup(TAVILY_API_KEY);

        match (llm, search) {
            (Some(llm), Some(search)) => Ok(Self { llm, search }),
            (llm, search) => {
                let mut missing = Vec::new();
                if llm.is_none() {
                    missing.push(GROQ_API_KEY.to_string());
                }
                if search.is_none() {
                    missing.push(TAVILY_API_KEY.to_string());
                }
                Err(ConfigError::MissingCredentials(missing))
            }
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("llm", &"[REDACTED]")
            .field("search", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<SecretString> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).map(|v| SecretString::from(v.clone()))
    }

    #[test]
    fn test_both_keys_present() {
        let creds = ApiCredentials::from_lookup(lookup_from(&[
            (GROQ_API_KEY, "gsk-1"),
            (TAVILY_API_KEY, "tvly-1"),
        ]))
        .unwrap();
        assert_eq!(creds.llm.expose_secret(), "gsk-1");
        assert_eq!(creds.search.expose_secret(), "tvly-1");
    }

    #[test]
    fn test_missing_keys_are_all_reported() {
        let err = ApiCredentials::from_lookup(lookup_from(&[])).unwrap_err();
        match err {
            ConfigError::MissingCredentials(missing) => {
                assert_eq!(missing, vec![GROQ_API_KEY, TAVILY_API_KEY]);
            }
            other => panic!("expected MissingCredentials, got {other:?}"),
        }
    }

    #[test]
    fn test_single_missing_key() {
        let err =
            ApiCredentials::from_lookup(lookup_from(&[(GROQ_API_KEY, "gsk-1")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variable(s): TAVILY_API_KEY"
        );
    }

    #[test]
    fn test_debug_redacts_keys() {
        let creds = ApiCredentials::from_lookup(lookup_from(&[
            (GROQ_API_KEY, "gsk-secret"),
            (TAVILY_API_KEY, "tvly-secret"),
        ]))
        .unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("gsk-secret"));
        assert!(!debug.contains("tvly-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
