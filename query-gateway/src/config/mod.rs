use secrecy::{ExposeSecret, SecretString};
use service_core::config::{self as core_config, get_env, get_env_parsed};
use service_core::error::AppError;
use std::path::PathBuf;
use std::time::Duration;

/// Default answer model, kept small for latency.
const DEFAULT_LLM_MODEL: &str = "gpt-4.1-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_KNOWLEDGE_BASE_PATH: &str = "data/knowledge_base.txt";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub llm: LlmConfig,
    pub rag: RagConfig,
    pub sessions: SessionConfig,
}

/// Which text generation backend answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Gemini,
    Mock,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Gemini => "gemini",
            LlmProvider::Mock => "mock",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Unknown LLM_PROVIDER '{}', expected one of: openai, gemini, mock",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// `None` leaves the adapter uninitialized and the service degraded.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub embedding_model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .filter(|k| !k.is_empty())
    }
}

/// Retrieval backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorStoreKind {
    /// In-process lexical index over the knowledge base chunks.
    Memory,
}

#[derive(Debug, Clone)]
pub struct RagConfig {
    pub knowledge_base_path: PathBuf,
    pub vector_store: VectorStoreKind,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub history_turns: usize,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 0 disables the capacity bound.
    pub max_sessions: usize,
    /// `None` disables idle reaping.
    pub idle_timeout: Option<Duration>,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        let provider: LlmProvider = get_env("LLM_PROVIDER", Some("openai"), false)?.parse()?;

        // Provider-specific key names are accepted as fallbacks.
        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| match provider {
                LlmProvider::OpenAi => std::env::var("OPENAI_API_KEY"),
                LlmProvider::Gemini => std::env::var("GOOGLE_API_KEY"),
                LlmProvider::Mock => Err(std::env::VarError::NotPresent),
            })
            .ok()
            .filter(|k| !k.is_empty());

        if is_prod && api_key.is_none() && provider != LlmProvider::Mock {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "LLM_API_KEY is required in production but not set"
            )));
        }

        let vector_store = match get_env("VECTOR_STORE", Some("memory"), false)?
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" | "in-memory" | "inmemory" => VectorStoreKind::Memory,
            other => {
                tracing::warn!(
                    vector_store = %other,
                    "Unsupported vector store backend, falling back to in-memory index"
                );
                VectorStoreKind::Memory
            }
        };

        let idle_secs: u64 = get_env_parsed("SESSION_IDLE_TIMEOUT_SECS", 0)?;

        let config = GatewayConfig {
            common: common_config,
            llm: LlmConfig {
                provider,
                api_key: api_key.map(SecretString::new),
                model: get_env("LLM_MODEL", Some(DEFAULT_LLM_MODEL), false)?,
                embedding_model: get_env(
                    "EMBEDDING_MODEL",
                    Some(DEFAULT_EMBEDDING_MODEL),
                    false,
                )?,
                base_url: get_env("LLM_BASE_URL", Some(DEFAULT_OPENAI_BASE_URL), false)?,
                timeout: Duration::from_secs(get_env_parsed("LLM_TIMEOUT_SECS", 120)?),
            },
            rag: RagConfig {
                knowledge_base_path: PathBuf::from(get_env(
                    "KNOWLEDGE_BASE_PATH",
                    Some(DEFAULT_KNOWLEDGE_BASE_PATH),
                    false,
                )?),
                vector_store,
                chunk_size: get_env_parsed("RAG_CHUNK_SIZE", 512)?,
                chunk_overlap: get_env_parsed("RAG_CHUNK_OVERLAP", 50)?,
                top_k: get_env_parsed("RAG_TOP_K", 3)?,
                history_turns: get_env_parsed("RAG_HISTORY_TURNS", 5)?,
            },
            sessions: SessionConfig {
                max_sessions: get_env_parsed("SESSION_MAX_SESSIONS", 0)?,
                idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.rag.chunk_size == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RAG_CHUNK_SIZE must be greater than zero"
            )));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RAG_CHUNK_OVERLAP ({}) must be smaller than RAG_CHUNK_SIZE ({})",
                self.rag.chunk_overlap,
                self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RAG_TOP_K must be greater than zero"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_names() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!(" mock ".parse::<LlmProvider>().unwrap(), LlmProvider::Mock);
        assert!("llama".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let llm = LlmConfig {
            provider: LlmProvider::OpenAi,
            api_key: Some(SecretString::new(String::new())),
            model: DEFAULT_LLM_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
        };
        assert!(llm.api_key().is_none());
    }
}
