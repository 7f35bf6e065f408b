//! Configuration file discovery and layered loading.
//!
//! Settings are merged from built-in defaults, an optional TOML file and
//! `HEDWIG_*` environment variables, in that order of precedence:
//!
//! ```toml
//! [http]
//! timeout_seconds = 30
//!
//! [retry]
//! max_attempts = 2
//!
//! [sources]
//! disabled = ["crossref"]
//! mailto = "you@example.org"
//!
//! [logging]
//! level = "debug"
//! format = "json"
//! ```
//!
//! Nested keys use a double underscore in the environment, for example
//! `HEDWIG_HTTP__TIMEOUT_SECONDS=10` or `HEDWIG_SOURCES__DISABLED=arxiv,crossref`.

use std::path::{Path, PathBuf};

use super::Config;

const ENV_PREFIX: &str = "HEDWIG";
const LOCAL_CONFIG_FILE: &str = "hedwig.toml";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Locate a config file: `./hedwig.toml`, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("hedwig").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Load and validate configuration.
///
/// An explicit `path` must exist; without one the discovered file is used
/// when present.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let file = match path {
        Some(path) if !path.is_file() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };

    let mut builder = config::Config::builder();
    if let Some(file) = &file {
        tracing::debug!(path = %file.display(), "Loading config file");
        builder = builder.add_source(config::File::from(file.as_path()));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("sources.disabled")
                .try_parsing(true),
        )
        .build()?;

    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let toml_content = r#"
[http]
timeout_seconds = 12
user_agent = "test-agent"

[retry]
max_attempts = 4
initial_delay_ms = 100

[sources]
disabled = ["crossref"]
mailto = "team@example.org"
openalex_url = "http://localhost:9000"

[search]
default_max_results = 20

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(Some(&path)).unwrap();

        assert_eq!(config.http.timeout_seconds, 12);
        assert_eq!(config.http.connect_timeout_seconds, 10);
        assert_eq!(config.http.user_agent, "test-agent");
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.initial_delay_ms, 100);
        assert_eq!(config.retry.max_delay_ms, 4000);
        assert_eq!(config.sources.disabled, vec!["crossref".to_string()]);
        assert_eq!(config.sources.mailto.as_deref(), Some("team@example.org"));
        assert_eq!(
            config.sources.openalex_url.as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(config.search.default_max_results, 20);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.sources.mailto = Some("saved@example.org".to_string());
        config.retry.max_total_seconds = 20;

        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/hedwig.toml");
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_config_file_fails_validation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "[sources]\ndisabled = [\"scopus\"]\n").unwrap();

        let result = load_config(Some(&path));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
