//! Settings for the Yaseen answering service.
//!
//! Settings are assembled once at process start from, in increasing
//! precedence:
//! - Built-in defaults
//! - An optional YAML file (`YASEEN_CONFIG` or `--config`)
//! - Environment variables (a local `.env` file is loaded first if present)
//! - Command-line flags
//!
//! After loading, settings are immutable and shared by reference.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_PINECONE_API_KEY: &str = "PINECONE_API_KEY";
pub const ENV_INDEX_NAME: &str = "PINECONE_INDEX_NAME";
pub const ENV_NAMESPACE: &str = "PINECONE_NAMESPACE";
pub const ENV_MODERATION_ENABLED: &str = "MODERATION_ENABLED";
pub const ENV_CONFIDENCE_THRESHOLD: &str = "CONFIDENCE_THRESHOLD";
pub const ENV_DEBUG: &str = "YASEEN_DEBUG";
pub const ENV_LEGACY_DEBUG: &str = "FASTAPI_DEBUG";
pub const ENV_CONFIG: &str = "YASEEN_CONFIG";
pub const ENV_TOP_K: &str = "YASEEN_TOP_K";
pub const ENV_PERSONA: &str = "YASEEN_PERSONA";
pub const ENV_GENERATION_PROVIDER: &str = "YASEEN_GENERATION_PROVIDER";
pub const ENV_GENERATION_MODEL: &str = "YASEEN_GENERATION_MODEL";
pub const ENV_EMBEDDING_MODEL: &str = "YASEEN_EMBEDDING_MODEL";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

pub const DEFAULT_INDEX_NAME: &str = "islamic-kb";
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const KNOWN_GENERATION_PROVIDERS: [&str; 2] = ["openai", "ollama"];

/// A credential that never shows up in logs or debug output.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the raw value, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if self.is_empty() { "<unset>" } else { "***" })
    }
}

/// Completion service settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    /// Provider name ("openai" or "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom endpoint
    pub endpoint: Option<String>,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature; kept low to stay close to the retrieved context
    pub temperature: f32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: None,
            max_tokens: 512,
            temperature: 0.2,
            timeout_secs: 30,
        }
    }
}

/// Embedding service settings.
///
/// Must describe the same model the corpus was ingested with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    /// Credential for generation, embedding and moderation
    pub openai_api_key: Secret,

    /// Credential for the vector index service
    pub pinecone_api_key: Secret,

    /// Base URL for the OpenAI-compatible API
    pub openai_base_url: String,

    /// Name of the vector index holding the corpus
    pub index_name: String,

    /// Optional namespace inside the index
    pub namespace: Option<String>,

    /// Number of passages to retrieve per query
    pub top_k: usize,

    /// Whether input is screened by the moderation service
    pub moderation_enabled: bool,

    /// Moderation model identifier
    pub moderation_model: String,

    /// Minimum retrieval similarity required to call the generator
    pub confidence_threshold: f32,

    pub generation: GenerationSettings,

    pub embedding: EmbeddingSettings,

    /// Optional persona YAML overriding the built-in persona
    pub persona_file: Option<PathBuf>,

    /// YAML file the settings were merged from, if any
    pub config_file: Option<PathBuf>,

    /// Debug mode (enables debug logging)
    pub debug: bool,

    /// Log level override
    pub log_level: Option<String>,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: Secret::default(),
            pinecone_api_key: Secret::default(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            namespace: None,
            top_k: DEFAULT_TOP_K,
            moderation_enabled: true,
            moderation_model: "text-moderation-latest".to_string(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            generation: GenerationSettings::default(),
            embedding: EmbeddingSettings::default(),
            persona_file: None,
            config_file: None,
            debug: false,
            log_level: None,
            no_color: false,
            json_logs: false,
        }
    }
}

/// Settings file structure. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    index: Option<IndexSection>,
    moderation: Option<ModerationSection>,
    confidence: Option<ConfidenceSection>,
    generation: Option<GenerationSection>,
    embedding: Option<EmbeddingSection>,
    persona: Option<String>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexSection {
    name: Option<String>,
    namespace: Option<String>,
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ModerationSection {
    enabled: Option<bool>,
    model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfidenceSection {
    threshold: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSection {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EmbeddingSection {
    provider: Option<String>,
    model: Option<String>,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first when present;
    /// variables already set in the environment win over it.
    ///
    /// # Example
    /// ```no_run
    /// use yaseen_core::config::Settings;
    ///
    /// let settings = Settings::load(None).expect("Failed to load settings");
    /// println!("Index: {}", settings.index_name);
    /// ```
    pub fn load(config_file: Option<&Path>) -> AppResult<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment overrides from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => {
                return Err(AppError::Config(format!("Failed to read .env file: {}", e)));
            }
        }

        Self::from_lookup(config_file, |key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    ///
    /// Keys the lookup returns but this function does not know are ignored.
    pub fn from_lookup<F>(config_file: Option<&Path>, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        let config_path = config_file
            .map(Path::to_path_buf)
            .or_else(|| lookup(ENV_CONFIG).map(PathBuf::from));

        if let Some(path) = config_path {
            settings.merge_yaml(&path)?;
            settings.config_file = Some(path);
        }

        settings.apply_env(&lookup)?;
        settings.validate()?;

        Ok(settings)
    }

    /// Merge a YAML settings file into this configuration.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: SettingsFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(index) = file.index {
            if let Some(name) = index.name {
                self.index_name = name;
            }
            if index.namespace.is_some() {
                self.namespace = index.namespace;
            }
            if let Some(top_k) = index.top_k {
                self.top_k = top_k;
            }
        }

        if let Some(moderation) = file.moderation {
            if let Some(enabled) = moderation.enabled {
                self.moderation_enabled = enabled;
            }
            if let Some(model) = moderation.model {
                self.moderation_model = model;
            }
        }

        if let Some(threshold) = file.confidence.and_then(|c| c.threshold) {
            self.confidence_threshold = threshold;
        }

        if let Some(generation) = file.generation {
            let target = &mut self.generation;
            if let Some(provider) = generation.provider {
                target.provider = provider;
            }
            if let Some(model) = generation.model {
                target.model = model;
            }
            if generation.endpoint.is_some() {
                target.endpoint = generation.endpoint;
            }
            if let Some(max_tokens) = generation.max_tokens {
                target.max_tokens = max_tokens;
            }
            if let Some(temperature) = generation.temperature {
                target.temperature = temperature;
            }
            if let Some(timeout) = generation.timeout_secs {
                target.timeout_secs = timeout;
            }
        }

        if let Some(embedding) = file.embedding {
            if let Some(provider) = embedding.provider {
                self.embedding.provider = provider;
            }
            if let Some(model) = embedding.model {
                self.embedding.model = model;
            }
            if let Some(dimensions) = embedding.dimensions {
                self.embedding.dimensions = dimensions;
            }
        }

        if let Some(persona) = file.persona {
            self.persona_file = Some(PathBuf::from(persona));
        }

        if let Some(logging) = file.logging {
            if logging.level.is_some() {
                self.log_level = logging.level;
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(json) = logging.json {
                self.json_logs = json;
            }
        }

        Ok(())
    }

    /// Apply environment variables on top of the current values.
    fn apply_env<F>(&mut self, lookup: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_OPENAI_API_KEY) {
            self.openai_api_key = Secret::new(key);
        }
        if let Some(key) = lookup(ENV_PINECONE_API_KEY) {
            self.pinecone_api_key = Secret::new(key);
        }
        if let Some(url) = lookup(ENV_OPENAI_BASE_URL) {
            self.openai_base_url = url;
        }
        if let Some(name) = lookup(ENV_INDEX_NAME) {
            self.index_name = name;
        }
        if let Some(namespace) = lookup(ENV_NAMESPACE) {
            self.namespace = Some(namespace).filter(|ns| !ns.trim().is_empty());
        }
        if let Some(raw) = lookup(ENV_TOP_K) {
            self.top_k = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a positive integer, got '{}'", ENV_TOP_K, raw))
            })?;
        }
        if let Some(raw) = lookup(ENV_MODERATION_ENABLED) {
            self.moderation_enabled = parse_bool(ENV_MODERATION_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CONFIDENCE_THRESHOLD) {
            self.confidence_threshold = raw.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a number in [0, 1], got '{}'",
                    ENV_CONFIDENCE_THRESHOLD, raw
                ))
            })?;
        }
        if let Some(raw) = lookup(ENV_LEGACY_DEBUG) {
            self.debug = parse_bool(ENV_LEGACY_DEBUG, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DEBUG) {
            self.debug = parse_bool(ENV_DEBUG, &raw)?;
        }
        if let Some(path) = lookup(ENV_PERSONA) {
            self.persona_file = Some(PathBuf::from(path));
        }
        if let Some(provider) = lookup(ENV_GENERATION_PROVIDER) {
            self.generation.provider = provider.to_lowercase();
        }
        if let Some(model) = lookup(ENV_GENERATION_MODEL) {
            self.generation.model = model;
        }
        if let Some(model) = lookup(ENV_EMBEDDING_MODEL) {
            self.embedding.model = model;
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the settings.
    ///
    /// Flags take precedence over environment variables and the YAML file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        debug: bool,
        no_color: bool,
        json_logs: bool,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if debug {
            self.debug = true;
        }

        if no_color {
            self.no_color = true;
        }

        if json_logs {
            self.json_logs = true;
        }

        self
    }

    /// Log filter to initialize tracing with.
    ///
    /// An explicit level wins; otherwise debug mode means "debug".
    pub fn effective_log_level(&self) -> Option<String> {
        self.log_level
            .clone()
            .or_else(|| self.debug.then(|| "debug".to_string()))
    }

    /// Validate the assembled settings.
    pub fn validate(&self) -> AppResult<()> {
        if self.openai_api_key.is_empty() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                ENV_OPENAI_API_KEY
            )));
        }

        if self.pinecone_api_key.is_empty() {
            return Err(AppError::Config(format!(
                "API key not found in environment variable: {}",
                ENV_PINECONE_API_KEY
            )));
        }

        if self.index_name.trim().is_empty() {
            return Err(AppError::Config("Vector index name cannot be empty".to_string()));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(AppError::Config(format!(
                "Confidence threshold must be in [0, 1], got {}",
                self.confidence_threshold
            )));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("top_k must be at least 1".to_string()));
        }

        let provider = self.generation.provider.as_str();
        if !KNOWN_GENERATION_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown generation provider: {}. Supported: {}",
                provider,
                KNOWN_GENERATION_PROVIDERS.join(", ")
            )));
        }

        if self.generation.max_tokens == 0 {
            return Err(AppError::Config("max_tokens must be at least 1".to_string()));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be in [0, 2], got {}",
                self.generation.temperature
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a boolean the way environment files usually spell them.
fn parse_bool(key: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.entry(ENV_OPENAI_API_KEY.to_string())
            .or_insert_with(|| "sk-test".to_string());
        map.entry(ENV_PINECONE_API_KEY.to_string())
            .or_insert_with(|| "pc-test".to_string());
        map
    }

    fn load(vars: HashMap<String, String>) -> AppResult<Settings> {
        Settings::from_lookup(None, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = load(env(&[])).unwrap();
        assert_eq!(settings.index_name, "islamic-kb");
        assert_eq!(settings.confidence_threshold, 0.25);
        assert_eq!(settings.top_k, 5);
        assert!(settings.moderation_enabled);
        assert!(!settings.debug);
        assert_eq!(settings.generation.model, "gpt-4o-mini");
        assert_eq!(settings.generation.max_tokens, 512);
        assert_eq!(settings.embedding.dimensions, 1536);
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let vars: HashMap<String, String> = HashMap::new();
        let err = Settings::from_lookup(None, |key| vars.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains(ENV_OPENAI_API_KEY));

        let mut vars = HashMap::new();
        vars.insert(ENV_OPENAI_API_KEY.to_string(), "sk".to_string());
        let err = Settings::from_lookup(None, |key| vars.get(key).cloned()).unwrap_err();
        assert!(err.to_string().contains(ENV_PINECONE_API_KEY));
    }

    #[test]
    fn test_threshold_must_be_in_unit_interval() {
        assert!(load(env(&[(ENV_CONFIDENCE_THRESHOLD, "1.5")])).is_err());
        assert!(load(env(&[(ENV_CONFIDENCE_THRESHOLD, "-0.1")])).is_err());
        assert!(load(env(&[(ENV_CONFIDENCE_THRESHOLD, "abc")])).is_err());

        let settings = load(env(&[(ENV_CONFIDENCE_THRESHOLD, "0.4")])).unwrap();
        assert_eq!(settings.confidence_threshold, 0.4);
    }

    #[test]
    fn test_boolean_flags() {
        let settings = load(env(&[(ENV_MODERATION_ENABLED, "false")])).unwrap();
        assert!(!settings.moderation_enabled);

        let settings = load(env(&[(ENV_MODERATION_ENABLED, "OFF"), (ENV_DEBUG, "1")])).unwrap();
        assert!(!settings.moderation_enabled);
        assert!(settings.debug);

        let settings = load(env(&[(ENV_LEGACY_DEBUG, "true")])).unwrap();
        assert!(settings.debug);

        assert!(load(env(&[(ENV_MODERATION_ENABLED, "maybe")])).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let settings = load(env(&[("VITE_API_URL", "http://localhost:8000")])).unwrap();
        assert_eq!(settings.index_name, DEFAULT_INDEX_NAME);
    }

    #[test]
    fn test_secrets_are_redacted() {
        let settings = load(env(&[(ENV_OPENAI_API_KEY, "sk-very-secret")])).unwrap();
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("sk-very-secret"));

        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("sk-very-secret"));
        assert_eq!(settings.openai_api_key.expose(), "sk-very-secret");
    }

    #[test]
    fn test_yaml_merge_then_env_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("yaseen.yaml");
        std::fs::write(
            &path,
            r#"
index:
  name: from-yaml
  topK: 8
confidence:
  threshold: 0.5
generation:
  provider: ollama
  model: llama3.2
  maxTokens: 256
logging:
  level: warn
"#,
        )
        .unwrap();

        let vars = env(&[(ENV_INDEX_NAME, "from-env")]);
        let settings = Settings::from_lookup(Some(&path), |key| vars.get(key).cloned()).unwrap();

        assert_eq!(settings.index_name, "from-env");
        assert_eq!(settings.top_k, 8);
        assert_eq!(settings.confidence_threshold, 0.5);
        assert_eq!(settings.generation.provider, "ollama");
        assert_eq!(settings.generation.max_tokens, 256);
        assert_eq!(settings.log_level, Some("warn".to_string()));
        assert_eq!(settings.config_file, Some(path));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(load(env(&[(ENV_GENERATION_PROVIDER, "gguf")])).is_err());
    }

    #[test]
    fn test_with_overrides() {
        let settings = load(env(&[])).unwrap().with_overrides(None, true, true, false);
        assert!(settings.debug);
        assert!(settings.no_color);
        assert_eq!(settings.effective_log_level(), Some("debug".to_string()));

        let settings = settings.with_overrides(Some("trace".to_string()), false, false, true);
        assert_eq!(settings.effective_log_level(), Some("trace".to_string()));
        assert!(settings.json_logs);
    }
}
