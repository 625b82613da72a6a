use config::{Config as ConfigLoader, ConfigError, Environment, File};
use masa_llm::ProviderType;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub support: SupportConfig,
    #[serde(default)]
    pub shopify: ShopifyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub chat: ChatConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub llm_api_key: String,
    #[serde(skip)]
    pub mistral_api_key: String,
    #[serde(skip)]
    pub pinecone_api_key: String,
    #[serde(skip)]
    pub mongodb_uri: String,
    #[serde(skip)]
    pub shopify_access_token: String,
    #[serde(skip)]
    pub support_email_user: String,
    #[serde(skip)]
    pub support_email_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec![
                "https://masamadremonterrey.com".to_string(),
                "https://www.masamadremonterrey.com".to_string(),
                "https://account.masamadremonterrey.com".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderType,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Anthropic,
            model: masa_llm::anthropic::DEFAULT_ANTHROPIC_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 512,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: masa_llm::embeddings::MISTRAL_EMBED_MODEL.to_string(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub index_host: String,
    pub top_k: usize,
    pub relevance_threshold: f32,
    pub api_version: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_host: String::new(),
            top_k: masa_search::DEFAULT_TOP_K,
            relevance_threshold: masa_search::DEFAULT_RELEVANCE_THRESHOLD,
            api_version: masa_search::pinecone::DEFAULT_PINECONE_API_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub max_exchanges: usize,
    pub max_chars: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_exchanges: 5,
            max_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub database: String,
    /// Session cap for the in-memory backend
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_max_sessions() -> usize {
    masa_persist::DEFAULT_MAX_SESSIONS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            database: "masa_madre_chatbot".to_string(),
            max_sessions: default_max_sessions(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupportConfig {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub email: EmailConfig,
}

/// SMTP delivery of new tickets. Login credentials come from
/// `SUPPORT_EMAIL_USER` / `SUPPORT_EMAIL_PASSWORD`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    /// Also write to the customer when the contact info holds an email
    #[serde(default = "default_true")]
    pub send_confirmation: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: String::new(),
            smtp_port: default_smtp_port(),
            sender: String::new(),
            recipient: String::new(),
            send_confirmation: true,
        }
    }
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        [&self.smtp_server, &self.sender, &self.recipient]
            .iter()
            .all(|v| !v.trim().is_empty())
    }
}

fn default_smtp_port() -> u16 {
    587
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopifyConfig {
    #[serde(default)]
    pub store_url: String,
    pub api_version: String,
    pub storefront_url: String,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            store_url: String::new(),
            api_version: masa_search::catalog::DEFAULT_SHOPIFY_API_VERSION.to_string(),
            storefront_url: "masamadremonterrey.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    pub welcome_message: String,
    /// Replaces the built-in assistant template when set
    #[serde(default)]
    pub prompt_template_path: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: "¡Hola! Soy tu asistente de panadería especializado en masa madre. ¿En qué puedo ayudarte hoy?".to_string(),
            prompt_template_path: None,
        }
    }
}

/// Short environment variables mapped onto nested keys.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("SERVER_REQUEST_TIMEOUT_SECS", "server.request_timeout_secs"),
    ("CORS_ENABLED", "cors.enabled"),
    ("LLM_PROVIDER", "llm.provider"),
    ("LLM_MODEL", "llm.model"),
    ("LLM_TEMPERATURE", "llm.temperature"),
    ("LLM_MAX_TOKENS", "llm.max_tokens"),
    ("LLM_BASE_URL", "llm.base_url"),
    ("SEARCH_INDEX_HOST", "search.index_host"),
    ("SEARCH_TOP_K", "search.top_k"),
    ("SEARCH_RELEVANCE_THRESHOLD", "search.relevance_threshold"),
    ("STORAGE_BACKEND", "storage.backend"),
    ("STORAGE_DATABASE", "storage.database"),
    ("STORAGE_MAX_SESSIONS", "storage.max_sessions"),
    ("SUPPORT_EMAIL_SMTP_SERVER", "support.email.smtp_server"),
    ("SUPPORT_EMAIL_SMTP_PORT", "support.email.smtp_port"),
    ("SUPPORT_EMAIL_SENDER", "support.email.sender"),
    ("SUPPORT_EMAIL_RECIPIENT", "support.email.recipient"),
    ("SHOPIFY_STORE_URL", "shopify.store_url"),
    ("SHOPIFY_STOREFRONT_URL", "shopify.storefront_url"),
    ("LOG_LEVEL", "logging.level"),
    ("LOG_FORMAT", "logging.format"),
];

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set, default "dev")
    /// 3. `MASA_<SECTION>__<KEY>` variables
    /// 4. Short variables (`SERVER_PORT`, `LLM_MODEL`, `CORS_ORIGINS`, ...)
    pub fn load() -> Result<Self, ConfigError> {
        let mut cfg = Self::load_settings()?;
        cfg.load_secrets()?;
        Ok(cfg)
    }

    /// Same layering as [`Config::load`] without reading any credentials
    pub fn load_settings() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("MASA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            builder = builder.set_override("cors.origins", split_list(&origins))?;
        }
        // Many hosts inject PORT
        if std::env::var("SERVER_PORT").is_err() {
            builder = builder.set_override_option("server.port", std::env::var("PORT").ok())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        let llm_key_var = match self.llm.provider {
            ProviderType::Anthropic => "ANTHROPIC_API_KEY",
            ProviderType::OpenAI => "OPENAI_API_KEY",
        };
        self.llm_api_key = required_env(llm_key_var)?;
        self.mistral_api_key = required_env("MISTRAL_API_KEY")?;
        self.pinecone_api_key = required_env("PINECONE_API_KEY")?;

        if self.storage.backend == StorageBackend::Mongodb {
            self.mongodb_uri = required_env("MONGODB_URI")?;
        }
        self.shopify_access_token = std::env::var("SHOPIFY_ACCESS_TOKEN").unwrap_or_default();

        if let Ok(url) = std::env::var("SUPPORT_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.support.webhook_url = Some(url);
            }
        }
        self.support_email_user = std::env::var("SUPPORT_EMAIL_USER").unwrap_or_default();
        self.support_email_password = std::env::var("SUPPORT_EMAIL_PASSWORD").unwrap_or_default();

        if self.search.index_host.trim().is_empty() {
            return Err(ConfigError::Message(
                "search.index_host (or SEARCH_INDEX_HOST) is required".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn required_env(var: &str) -> Result<String, ConfigError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::Message(format!("{} environment variable is required", var)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
