//! Environment variable secret lookup.

use secrecy::SecretString;

/// Read `key` from the process environment.
///
/// Unset, blank, and non-Unicode values are all treated as absent, since a
/// secret must be a non-empty string. Surrounding whitespace is trimmed.
pub fn read_env_secret(key: &str) -> Option<SecretString> {
    match std::env::var(key) {
        Ok(val) if !val.trim().is_empty() => Some(SecretString::from(val.trim().to_string())),
        Ok(_) => None,
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => None,
    }
}
