//! Secrets configuration
//!
//! API credentials live in a TOML file with one table per service:
//!
//! ```toml
//! [alpha_vantage]
//! api_key = "..."
//!
//! [openai]
//! api_key = "..."
//! model = "gpt-4o-mini"
//!
//! [bespoke_labs]
//! api_key = "..."
//!
//! [chroma]
//! url = "http://localhost:8000"
//! ```
//!
//! Environment variables override values from the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Locations searched when no secrets file is given explicitly
pub const DEFAULT_SECRETS_PATHS: &[&str] = &["secrets.toml", ".streamlit/secrets.toml"];

/// Errors raised while loading secrets
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A table holding a single API key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeySection {
    pub api_key: Option<String>,
}

/// OpenAI (or OpenAI-compatible) settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub embedding_model: Option<String>,
}

/// Chroma server location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChromaSection {
    pub url: Option<String>,
    pub tenant: Option<String>,
    pub database: Option<String>,
}

/// Credentials and endpoints for every external service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Secrets {
    pub alpha_vantage: ApiKeySection,
    pub openai: OpenAiSection,
    pub bespoke_labs: ApiKeySection,
    pub chroma: ChromaSection,
}

impl Secrets {
    /// Parse secrets from TOML text
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read secrets from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load secrets and apply environment overrides
    ///
    /// An explicit path must exist. Without one, the first existing file in
    /// [`DEFAULT_SECRETS_PATHS`] is used; if none exists only the
    /// environment is consulted.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut secrets = match path {
            Some(path) => Self::from_file(path)?,
            None => match DEFAULT_SECRETS_PATHS
                .iter()
                .map(Path::new)
                .find(|p| p.is_file())
            {
                Some(found) => {
                    tracing::debug!("Loading secrets from {}", found.display());
                    Self::from_file(found)?
                }
                None => Self::default(),
            },
        };
        secrets.apply_env(|name| std::env::var(name).ok());
        Ok(secrets)
    }

    /// Override fields from environment-style lookups; empty values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let overrides: [(&str, &mut Option<String>); 9] = [
            ("ALPHA_VANTAGE_API_KEY", &mut self.alpha_vantage.api_key),
            ("OPENAI_API_KEY", &mut self.openai.api_key),
            ("OPENAI_API_BASE", &mut self.openai.api_base),
            ("OPENAI_MODEL", &mut self.openai.model),
            ("OPENAI_EMBEDDING_MODEL", &mut self.openai.embedding_model),
            ("BESPOKE_API_KEY", &mut self.bespoke_labs.api_key),
            ("CHROMA_URL", &mut self.chroma.url),
            ("CHROMA_TENANT", &mut self.chroma.tenant),
            ("CHROMA_DATABASE", &mut self.chroma.database),
        ];

        for (name, slot) in overrides {
            if let Some(value) = get(name) {
                *slot = Some(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"
[alpha_vantage]
api_key = "av-file"

[openai]
api_key = "sk-file"
model = "gpt-4o-mini"

[bespoke_labs]
api_key = "bl-file"
"#;

    #[test]
    fn test_parse_sections() {
        let secrets = Secrets::from_toml_str(SAMPLE, Path::new("inline")).unwrap();
        assert_eq!(secrets.alpha_vantage.api_key.as_deref(), Some("av-file"));
        assert_eq!(secrets.openai.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(secrets.bespoke_labs.api_key.as_deref(), Some("bl-file"));
        assert_eq!(secrets.chroma, ChromaSection::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut secrets = Secrets::from_toml_str(SAMPLE, Path::new("inline")).unwrap();
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("CHROMA_URL", "http://chroma:8000"),
            ("BESPOKE_API_KEY", "  "),
        ]
        .into_iter()
        .collect();

        secrets.apply_env(|name| env.get(name).map(|v| (*v).to_string()));

        assert_eq!(secrets.openai.api_key.as_deref(), Some("sk-env"));
        assert_eq!(secrets.chroma.url.as_deref(), Some("http://chroma:8000"));
        // Blank values do not clobber the file
        assert_eq!(secrets.bespoke_labs.api_key.as_deref(), Some("bl-file"));
        assert_eq!(secrets.alpha_vantage.api_key.as_deref(), Some("av-file"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let secrets = Secrets::from_file(file.path()).unwrap();
        assert_eq!(secrets.openai.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Secrets::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let err = Secrets::from_toml_str("[openai\napi_key = 1", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
