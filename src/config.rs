use serde::Deserialize;
use std::path::Path;
use crate::error::{Result, SrtError};

/// Looked up in the current directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "srt-translate.toml";

pub const DEFAULT_API_KEY_ENV: &str = "DEEPL_API_KEY";

fn default_target_languages() -> Vec<String> {
    vec!["EN-GB".to_string()]
}

fn default_check_quota() -> bool {
    true
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub deepl: DeeplConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateConfig {
    /// Languages to translate into, one output file each
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,
    /// Source language of the input; empty lets the provider decide
    #[serde(default)]
    pub source_language: String,
    /// Refuse to start when the provider quota cannot cover the whole file
    #[serde(default = "default_check_quota")]
    pub check_quota: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeeplConfig {
    /// API base URL; empty picks the free or pro endpoint from the key
    #[serde(default)]
    pub endpoint: String,
    /// Environment variable holding the API key when no key file is given
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            target_languages: default_target_languages(),
            source_language: String::new(),
            check_quota: default_check_quota(),
        }
    }
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SrtError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&content)?)
    }
}

/// Read the DeepL API key from `keyfile` if given, otherwise from `env_var`.
pub fn resolve_api_key(keyfile: Option<&Path>, env_var: &str) -> Result<String> {
    let key = match keyfile {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| {
                SrtError::Config(format!(
                    "Failed to read API key file {}: {}",
                    path.display(),
                    e
                ))
            })?
            .trim()
            .to_string(),
        None => std::env::var(env_var).unwrap_or_default().trim().to_string(),
    };

    if key.is_empty() {
        return Err(SrtError::Config(format!(
            "No API key for DeepL. Please provide a file that contains the API key \
             or set the {} environment variable to the key",
            env_var
        )));
    }

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.translate.target_languages, vec!["EN-GB".to_string()]);
        assert!(config.translate.check_quota);
        assert_eq!(config.deepl.api_key_env, "DEEPL_API_KEY");
        assert_eq!(config.deepl.timeout_secs, 60);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            "[translate]\ntarget_languages = [\"DE\", \"FR\"]\ncheck_quota = false\n",
        )
        .unwrap();
        assert_eq!(config.translate.target_languages, vec!["DE", "FR"]);
        assert!(!config.translate.check_quota);
        assert_eq!(config.translate.source_language, "");
        assert_eq!(config.deepl.timeout_secs, 60);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[translate]\nsource_language = \"EN\"\n\n[deepl]\nendpoint = \"http://localhost:3000\"\n",
        )
        .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.translate.source_language, "EN");
        assert_eq!(loaded.deepl.endpoint, "http://localhost:3000");
    }

    #[test]
    fn test_invalid_file_is_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[translate\n").unwrap();
        assert!(matches!(Config::from_file(&path), Err(SrtError::Toml(_))));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::from_file(&missing), Err(SrtError::Config(_))));
    }

    #[test]
    fn test_api_key_from_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deepl.key");
        std::fs::write(&path, "  secret-key:fx\n").unwrap();
        let key = resolve_api_key(Some(&path), "SRT_TRANSLATE_TEST_UNUSED").unwrap();
        assert_eq!(key, "secret-key:fx");
    }

    #[test]
    fn test_api_key_missing() {
        let err = resolve_api_key(None, "SRT_TRANSLATE_TEST_DEFINITELY_UNSET").unwrap_err();
        assert!(err.to_string().contains("No API key for DeepL"));

        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.key");
        std::fs::write(&empty, "\n").unwrap();
        assert!(resolve_api_key(Some(&empty), "SRT_TRANSLATE_TEST_DEFINITELY_UNSET").is_err());
        assert!(resolve_api_key(Some(&dir.path().join("missing.key")), "X").is_err());
    }
}
