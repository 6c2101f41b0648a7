//! Runtime configuration.
//!
//! Settings come from an optional TOML file; every field has a default, so
//! an absent file means "use the public provider endpoints with the default
//! models". Credentials are never stored in the file: each provider section
//! names the environment variable its key is read from.
//!
//! ```toml
//! request_timeout_secs = 300
//!
//! [openai]
//! model = "gpt-5"
//!
//! [deepseek]
//! api_key_env = "DEEPSEEK_API_KEY"
//! base_url = "https://api.deepseek.com"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::backend::{deepseek, gemini, openai, redact, BackendKind};
use crate::error::Result;
use crate::PipelineError;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Per-request HTTP timeout in seconds. `0` disables the timeout.
    pub request_timeout_secs: u64,

    /// Reject normalized requirements longer than this many bytes.
    /// Unset means no limit.
    pub max_input_bytes: Option<usize>,

    pub openai: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 300,
            max_input_bytes: None,
            openai: ProviderConfig::defaults_for(BackendKind::ChatGpt),
            deepseek: ProviderConfig::defaults_for(BackendKind::DeepSeek),
            gemini: ProviderConfig::defaults_for(BackendKind::Gemini),
        }
    }
}

/// `[openai]`, `[deepseek]` and `[gemini]` sections.
///
/// Fields missing from a section fall back to that provider's defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub model: String,
    pub base_url: String,
}

/// Same shape as [`ProviderConfig`] with every field optional, for merging.
#[derive(Debug, Default, Deserialize)]
struct PartialProviderConfig {
    api_key_env: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

impl ProviderConfig {
    /// Built-in defaults for a provider.
    pub fn defaults_for(kind: BackendKind) -> Self {
        let (env, model, base_url) = match kind {
            BackendKind::ChatGpt => (
                "OPENAI_API_KEY",
                openai::DEFAULT_MODEL,
                openai::DEFAULT_BASE_URL,
            ),
            BackendKind::DeepSeek => (
                "DEEPSEEK_API_KEY",
                deepseek::DEFAULT_MODEL,
                deepseek::DEFAULT_BASE_URL,
            ),
            BackendKind::Gemini => (
                "GEMINI_API_KEY",
                gemini::DEFAULT_MODEL,
                gemini::DEFAULT_BASE_URL,
            ),
        };
        Self {
            api_key_env: env.to_string(),
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn merged(kind: BackendKind, partial: PartialProviderConfig) -> Self {
        let defaults = Self::defaults_for(kind);
        Self {
            api_key_env: partial.api_key_env.unwrap_or(defaults.api_key_env),
            model: partial.model.unwrap_or(defaults.model),
            base_url: partial.base_url.unwrap_or(defaults.base_url),
        }
    }
}

/// Raw file shape; provider sections are merged over per-provider defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    request_timeout_secs: Option<u64>,
    max_input_bytes: Option<usize>,
    openai: PartialProviderConfig,
    deepseek: PartialProviderConfig,
    gemini: PartialProviderConfig,
}

impl AppConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    let msg = format!("failed to read {}: {}", path.display(), e);
                    PipelineError::InvalidConfig(msg)
                })?;
                let config = Self::from_toml(&content).map_err(|e| match e {
                    PipelineError::InvalidConfig(msg) => {
                        PipelineError::InvalidConfig(format!("{}: {}", path.display(), msg))
                    }
                    other => other,
                })?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| PipelineError::InvalidConfig(e.to_string()))?;
        let defaults = Self::default();
        Ok(Self {
            request_timeout_secs: raw
                .request_timeout_secs
                .unwrap_or(defaults.request_timeout_secs),
            max_input_bytes: raw.max_input_bytes,
            openai: ProviderConfig::merged(BackendKind::ChatGpt, raw.openai),
            deepseek: ProviderConfig::merged(BackendKind::DeepSeek, raw.deepseek),
            gemini: ProviderConfig::merged(BackendKind::Gemini, raw.gemini),
        })
    }

    /// Settings for one provider.
    pub fn provider(&self, kind: BackendKind) -> &ProviderConfig {
        match kind {
            BackendKind::ChatGpt => &self.openai,
            BackendKind::DeepSeek => &self.deepseek,
            BackendKind::Gemini => &self.gemini,
        }
    }

    /// The HTTP timeout, or `None` when disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// The three provider API keys, resolved once at startup.
///
/// A missing key is not an error here; it only matters when its backend is
/// first used.
#[derive(Clone, Default)]
pub struct Credentials {
    pub openai: Option<String>,
    pub deepseek: Option<String>,
    pub gemini: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |k: &Option<String>| k.as_deref().map(redact);
        f.debug_struct("Credentials")
            .field("openai", &mask(&self.openai))
            .field("deepseek", &mask(&self.deepseek))
            .field("gemini", &mask(&self.gemini))
            .finish()
    }
}

impl Credentials {
    /// Read each key from the environment variable named in `config`.
    /// Empty values count as missing.
    pub fn from_env(config: &AppConfig) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Resolve keys through an arbitrary lookup (environment, secret store, test map).
    pub fn from_lookup<F>(config: &AppConfig, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let resolve = |kind: BackendKind| {
            lookup(&config.provider(kind).api_key_env).filter(|v| !v.trim().is_empty())
        };
        let creds = Self {
            openai: resolve(BackendKind::ChatGpt),
            deepseek: resolve(BackendKind::DeepSeek),
            gemini: resolve(BackendKind::Gemini),
        };
        for kind in BackendKind::ALL {
            if creds.get(kind).is_none() {
                tracing::debug!(
                    backend = kind.display_name(),
                    env = %config.provider(kind).api_key_env,
                    "no credential configured"
                );
            }
        }
        creds
    }

    pub fn get(&self, kind: BackendKind) -> Option<&str> {
        match kind {
            BackendKind::ChatGpt => self.openai.as_deref(),
            BackendKind::DeepSeek => self.deepseek.as_deref(),
            BackendKind::Gemini => self.gemini.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.max_input_bytes, None);
        assert_eq!(config.openai.model, "gpt-5");
        assert_eq!(config.deepseek.base_url, "https://api.deepseek.com");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
    }

    #[test]
    fn test_partial_section_keeps_provider_defaults() {
        let config = AppConfig::from_toml(
            r#"
            request_timeout_secs = 0
            max_input_bytes = 65536

            [gemini]
            model = "gemini-2.5-flash"
            "#,
        )
        .unwrap();

        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.max_input_bytes, Some(65536));
        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.gemini.api_key_env, "GEMINI_API_KEY");
        assert_eq!(config.gemini.base_url, gemini::DEFAULT_BASE_URL);
        assert_eq!(config.openai, ProviderConfig::defaults_for(BackendKind::ChatGpt));
    }

    #[test]
    fn test_invalid_toml() {
        let err = AppConfig::from_toml("request_timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[deepseek]\nbase_url = \"http://localhost:8080\"").unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.deepseek.base_url, "http://localhost:8080");
        assert_eq!(config.deepseek.model, "deepseek-chat");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_load_without_path_is_default() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_credentials_from_lookup() {
        let mut config = AppConfig::default();
        config.deepseek.api_key_env = "MY_DS_KEY".into();
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai-123456"),
            ("MY_DS_KEY", "sk-ds"),
            ("GEMINI_API_KEY", "   "),
        ]
        .into_iter()
        .collect();

        let creds = Credentials::from_lookup(&config, |name| env.get(name).map(|v| v.to_string()));
        assert_eq!(creds.get(BackendKind::ChatGpt), Some("sk-openai-123456"));
        assert_eq!(creds.get(BackendKind::DeepSeek), Some("sk-ds"));
        assert_eq!(creds.get(BackendKind::Gemini), None);
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials {
            openai: Some("sk-openai-secret-value".into()),
            ..Default::default()
        };
        let debug_output = format!("{:?}", creds);
        assert!(!debug_output.contains("secret-value"));
        assert!(debug_output.contains("sk-ope***"));
    }
}
