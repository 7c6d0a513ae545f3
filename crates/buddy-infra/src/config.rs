//! Configuration loader for Buddy.
//!
//! Reads a TOML file (`buddy.toml` by default) and deserializes it into
//! [`BuddyConfig`]. Falls back to defaults when the file is missing or
//! malformed.

use std::path::Path;

use buddy_types::config::BuddyConfig;

/// Config file used when neither `--config` nor `BUDDY_CONFIG` is given.
pub const DEFAULT_CONFIG_FILE: &str = "buddy.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "BUDDY_CONFIG";

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`BuddyConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_config(path: &Path) -> BuddyConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return BuddyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return BuddyConfig::default();
        }
    };

    match toml::from_str::<BuddyConfig>(&content) {
        Ok(config) => {
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            BuddyConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(DEFAULT_CONFIG_FILE)).await;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.max_iterations, 10);
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("buddy.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 8080
allowed_origins = ["http://localhost:3000"]

[llm]
models = ["llama-3.1-8b-instant", "llama-3.3-70b-versatile"]
max_iterations = 4

[assistant]
persona = "You are a terse assistant."
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.llm.models.len(), 2);
        assert_eq!(config.llm.max_iterations, 4);
        assert_eq!(
            config.assistant.persona.as_deref(),
            Some("You are a terse assistant.")
        );
        assert_eq!(config.memory.ttl_secs, 86_400);
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("buddy.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.models.len(), 4);
    }

    #[tokio::test]
    async fn load_config_wrong_types_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("buddy.toml");
        tokio::fs::write(&path, "[server]\nport = \"not a number\"\n")
            .await
            .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 3000);
    }
}
