//! Ascent configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agents::AgentRole;
use crate::llm::LlmError;

/// Main Ascent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider profiles and role bindings
    pub llm: LlmConfig,

    /// Conversation workflow tuning
    pub workflow: WorkflowConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,

    /// Export destination
    pub exports: ExportsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// The week range must be non-empty and ideation must ask for at least
    /// one idea per theme. Every role must be bound to a known profile, and
    /// every profile in use must have its API key variable set.
    pub fn validate(&self) -> Result<()> {
        let workflow = &self.workflow;
        if workflow.min_weeks > workflow.max_weeks {
            return Err(eyre::eyre!(
                "workflow.min-weeks ({}) is greater than workflow.max-weeks ({})",
                workflow.min_weeks,
                workflow.max_weeks
            ));
        }
        if workflow.ideas_per_theme == 0 {
            return Err(eyre::eyre!("workflow.ideas-per-theme must be at least 1"));
        }
        for role in AgentRole::ALL {
            let profile = self.llm.profile_for(role)?;
            if std::env::var(&profile.api_key_env).is_err() {
                return Err(eyre::eyre!(
                    "LLM API key not found for role {}. Set the {} environment variable.",
                    role,
                    profile.api_key_env
                ));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .ascent.yml
        let local_config = PathBuf::from(".ascent.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ascent/ascent.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ascent").join("ascent.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialised
    ///
    /// Errors are ignored here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM configuration: named provider profiles plus a static role binding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider profiles keyed by name
    pub profiles: BTreeMap<String, LlmProfile>,

    /// Which profile serves which agent role
    pub roles: RoleBindings,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("gemini".to_string(), LlmProfile::gemini());
        profiles.insert("groq".to_string(), LlmProfile::groq());
        Self {
            profiles,
            roles: RoleBindings::default(),
        }
    }
}

impl LlmConfig {
    /// Resolve the profile bound to a role
    pub fn profile_for(&self, role: AgentRole) -> Result<&LlmProfile> {
        let name = self.roles.profile_name(role);
        self.profiles
            .get(name)
            .ok_or_else(|| eyre::eyre!("Role {} is bound to unknown LLM profile '{}'", role, name))
    }
}

/// A single provider/model endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmProfile {
    /// Provider name ("openai", "gemini" or "groq"; all OpenAI-compatible)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the `/chat/completions` path is appended)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmProfile {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmProfile {
    /// Gemini through Google's OpenAI-compatible endpoint
    pub fn gemini() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
        }
    }

    /// Llama 3.1 on Groq
    pub fn groq() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            max_tokens: 4096,
            timeout_ms: 60_000,
        }
    }

    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String, LlmError> {
        std::env::var(&self.api_key_env).map_err(|_| LlmError::MissingApiKey(self.api_key_env.clone()))
    }
}

/// Static binding of agent roles to profile names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleBindings {
    pub strategist: String,
    pub ideator: String,
    pub ghostwriter: String,
    pub reviewer: String,
    pub summarizer: String,
    pub titler: String,
}

impl Default for RoleBindings {
    fn default() -> Self {
        Self {
            strategist: "gemini".to_string(),
            ideator: "groq".to_string(),
            ghostwriter: "gemini".to_string(),
            reviewer: "gemini".to_string(),
            summarizer: "gemini".to_string(),
            titler: "groq".to_string(),
        }
    }
}

impl RoleBindings {
    pub fn profile_name(&self, role: AgentRole) -> &str {
        match role {
            AgentRole::Strategist => &self.strategist,
            AgentRole::Ideator => &self.ideator,
            AgentRole::Ghostwriter => &self.ghostwriter,
            AgentRole::Reviewer => &self.reviewer,
            AgentRole::Summarizer => &self.summarizer,
            AgentRole::Titler => &self.titler,
        }
    }
}

/// Conversation workflow tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Retry policy for strategy generation
    #[serde(rename = "strategy-retry")]
    pub strategy_retry: RetryConfig,

    /// Platform used when the user never names one
    #[serde(rename = "default-platform")]
    pub default_platform: String,

    /// Shortest accepted plan, in weeks
    #[serde(rename = "min-weeks")]
    pub min_weeks: u32,

    /// Longest accepted plan, in weeks
    #[serde(rename = "max-weeks")]
    pub max_weeks: u32,

    /// Ideas requested per theme during ideation
    #[serde(rename = "ideas-per-theme")]
    pub ideas_per_theme: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            strategy_retry: RetryConfig::default(),
            default_platform: "LinkedIn".to_string(),
            min_weeks: 1,
            max_weeks: 52,
            ideas_per_theme: 3,
        }
    }
}

/// Bounded retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `{name}.pmt` overrides before the embedded set
    pub dir: Option<PathBuf>,
}

/// Export destination
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportsConfig {
    /// Directory where strategy and draft exports are written
    pub dir: PathBuf,
}

impl Default for ExportsConfig {
    fn default() -> Self {
        Self { dir: PathBuf::from(".") }
    }
}
