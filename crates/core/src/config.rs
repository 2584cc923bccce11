//! Configuration management for askdoc.
//!
//! Configuration is merged from multiple sources, lowest precedence first:
//! built-in defaults, an optional YAML config file (`askdoc.yaml`),
//! environment variables, and command-line flags applied by the caller
//! through [`AppConfig::with_overrides`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Application-wide configuration.
///
/// Carries the generative and embedding provider selection plus the
/// chunking parameters the retrieval pipeline runs with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file path, when one was given
    pub config_file: Option<PathBuf>,

    /// Generative provider (e.g., "ollama", "openai")
    pub provider: String,

    /// Generative model identifier
    pub model: String,

    /// Embedding provider (e.g., "ollama", "openai", "mock")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Dimensionality of embedding vectors
    pub embedding_dim: usize,

    /// Endpoint override for the generative provider
    pub endpoint: Option<String>,

    /// Endpoint override for the embedding provider
    pub embedding_endpoint: Option<String>,

    /// API key for remote providers
    pub api_key: Option<String>,

    /// Maximum chunk length in characters
    pub max_chunk_chars: usize,

    /// Overlap between consecutive chunks in characters
    pub overlap_chars: usize,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose flag (raises logging to debug)
    pub verbose: bool,

    /// Suppress ANSI colors
    pub no_color: bool,
}

/// On-disk layout of the YAML config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSection>,
    embedding: Option<EmbeddingSection>,
    chunking: Option<ChunkingSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
    endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChunkingSection {
    #[serde(rename = "maxChars")]
    max_chars: Option<usize>,
    #[serde(rename = "overlapChars")]
    overlap_chars: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            embedding_provider: "ollama".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            endpoint: None,
            embedding_endpoint: None,
            api_key: None,
            max_chunk_chars: 1000,
            overlap_chars: 200,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Assemble configuration from defaults, config file, and environment.
    ///
    /// Environment variables:
    /// - `ASKDOC_CONFIG`: Path to config file
    /// - `ASKDOC_PROVIDER`: Generative provider
    /// - `ASKDOC_MODEL`: Generative model identifier
    /// - `ASKDOC_EMBEDDING_PROVIDER`: Embedding provider
    /// - `ASKDOC_EMBEDDING_MODEL`: Embedding model identifier
    /// - `ASKDOC_API_KEY`: API key (falls back to `OPENAI_API_KEY`)
    /// - `RUST_LOG`: Log filter
    /// - `NO_COLOR`: Suppress ANSI colors
    ///
    /// An explicitly passed `config_file` wins over `ASKDOC_CONFIG`.
    pub fn load(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        config.config_file = config_file
            .or_else(|| std::env::var("ASKDOC_CONFIG").ok().map(PathBuf::from));

        // Load from YAML config file if present
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("askdoc.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment wins over the config file
        if let Ok(provider) = std::env::var("ASKDOC_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("ASKDOC_MODEL") {
            config.model = model;
        }

        if let Ok(provider) = std::env::var("ASKDOC_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(model) = std::env::var("ASKDOC_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.api_key = std::env::var("ASKDOC_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Fold a YAML config file into this configuration.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
        }

        if let Some(embedding) = config_file.embedding {
            if let Some(provider) = embedding.provider {
                result.embedding_provider = provider;
            }
            if let Some(model) = embedding.model {
                result.embedding_model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                result.embedding_dim = dimensions;
            }
            if embedding.endpoint.is_some() {
                result.embedding_endpoint = embedding.endpoint;
            }
        }

        if let Some(chunking) = config_file.chunking {
            if let Some(max_chars) = chunking.max_chars {
                result.max_chunk_chars = max_chars;
            }
            if let Some(overlap) = chunking.overlap_chars {
                result.overlap_chars = overlap;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply command-line overrides; flags win over both the
    /// environment and the config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        embedding_provider: Option<String>,
        embedding_model: Option<String>,
        endpoint: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(provider) = embedding_provider {
            self.embedding_provider = provider;
        }

        if let Some(model) = embedding_model {
            self.embedding_model = model;
        }

        if endpoint.is_some() {
            self.endpoint = endpoint;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // --verbose implies debug-level logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the API key for remote providers.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key.clone()
    }

    /// Validate configuration for the active providers.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["openai", "ollama"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        let known_embedding_providers = ["openai", "ollama", "mock"];
        if !known_embedding_providers.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                known_embedding_providers.join(", ")
            )));
        }

        if self.provider == "openai" && self.api_key.is_none() {
            return Err(AppError::Config(
                "OpenAI provider requires an API key. Set ASKDOC_API_KEY or OPENAI_API_KEY."
                    .to_string(),
            ));
        }

        if self.overlap_chars >= self.max_chunk_chars {
            return Err(AppError::Config(format!(
                "overlap_chars ({}) must be smaller than max_chunk_chars ({})",
                self.overlap_chars, self.max_chunk_chars
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.embedding_provider, "ollama");
        assert_eq!(config.embedding_dim, 768);
        assert_eq!(config.max_chunk_chars, 1000);
        assert_eq!(config.overlap_chars, 200);
        assert!(!config.verbose);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("openai".to_string()),
            Some("gpt-4o-mini".to_string()),
            Some("mock".to_string()),
            None,
            None,
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "openai");
        assert_eq!(overridden.model, "gpt-4o-mini");
        assert_eq!(overridden.embedding_provider, "mock");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let config = AppConfig {
            provider: "unknown".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_openai_requires_key() {
        let config = AppConfig {
            provider: "openai".to_string(),
            api_key: None,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AppConfig {
            provider: "openai".to_string(),
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_overlap_bounds() {
        let config = AppConfig {
            max_chunk_chars: 100,
            overlap_chars: 100,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_yaml_sections() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o-mini
embedding:
  provider: openai
  model: text-embedding-3-small
  dimensions: 1536
chunking:
  maxChars: 800
  overlapChars: 120
logging:
  level: debug
"#;
        let parsed: ConfigFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.llm.as_ref().unwrap().provider.as_deref(), Some("openai"));
        assert_eq!(parsed.embedding.as_ref().unwrap().dimensions, Some(1536));
        assert_eq!(parsed.chunking.as_ref().unwrap().max_chars, Some(800));
        assert_eq!(parsed.logging.as_ref().unwrap().level.as_deref(), Some("debug"));
    }
}
