//! Configuration management

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

/// Embedding dimension of the Azure OpenAI ada-002 / text-embedding-3-small family
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Azure OpenAI embedding endpoint settings
#[derive(Debug, Clone, Default)]
pub struct AzureOpenAiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub api_version: Option<String>,
    pub embedding_deployment: Option<String>,
}

impl AzureOpenAiConfig {
    /// Names of settings that are unset or blank
    pub fn missing(&self) -> Vec<&'static str> {
        let fields = [
            ("AZURE_OPENAI_ENDPOINT", &self.endpoint),
            ("AZURE_OPENAI_API_KEY", &self.api_key),
            ("AZURE_OPENAI_API_VERSION", &self.api_version),
            ("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME", &self.embedding_deployment),
        ];

        fields
            .iter()
            .filter(|(_, v)| v.as_deref().map(str::trim).unwrap_or("").is_empty())
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite customer database path
    pub db_path: PathBuf,

    /// How long a connection waits on a locked database
    pub busy_timeout: Duration,

    /// Deadline for a whole tool call
    pub tool_timeout: Duration,

    /// Embedding endpoint (all optional; stub embeddings when incomplete)
    pub azure: AzureOpenAiConfig,

    /// HTTP timeout for embedding requests
    pub embedding_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("contoso.db"),
            busy_timeout: Duration::from_millis(5000),
            tool_timeout: Duration::from_secs(30),
            azure: AzureOpenAiConfig::default(),
            embedding_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let db_path = std::env::var("CONTOSO_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let busy_timeout = env_parse("CONTOSO_DB_BUSY_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.busy_timeout);

        let tool_timeout = env_parse("CONTOSO_TOOL_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.tool_timeout);

        let embedding_timeout = env_parse("CONTOSO_EMBEDDING_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.embedding_timeout);

        let azure = AzureOpenAiConfig {
            endpoint: std::env::var("AZURE_OPENAI_ENDPOINT").ok(),
            api_key: std::env::var("AZURE_OPENAI_API_KEY").ok(),
            api_version: std::env::var("AZURE_OPENAI_API_VERSION").ok(),
            embedding_deployment: std::env::var("AZURE_OPENAI_EMBEDDING_DEPLOYMENT_NAME").ok(),
        };

        Ok(Self {
            db_path,
            busy_timeout,
            tool_timeout,
            azure,
            embedding_timeout,
        })
    }

    /// Override the database path (CLI `--db`)
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

fn env_parse(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
