//! storyforge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main storyforge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion model provider configuration
    pub llm: LlmConfig,

    /// Issue tracker configuration
    pub tracker: TrackerConfig,

    /// Session and transcript configuration
    pub session: SessionConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Check that the model API key is available
    ///
    /// Call this before any command that talks to the model so it fails fast
    /// with a clear message.
    pub fn validate_llm(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.llm.provider == "azure" && self.llm.deployment.is_empty() {
            return Err(eyre::eyre!("llm.deployment must be set for the azure provider"));
        }
        Ok(())
    }

    /// Check that tracker credentials are available
    pub fn validate_tracker(&self) -> Result<()> {
        if self.tracker.base_url.is_empty() {
            return Err(eyre::eyre!("tracker.base-url is not configured"));
        }
        for var in [&self.tracker.username_env, &self.tracker.api_token_env] {
            if std::env::var(var).is_err() {
                return Err(eyre::eyre!("Tracker credential not found. Set the {} environment variable.", var));
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

        // Try project-local config: .storyforge.yml
        let local_config = PathBuf::from(".storyforge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/storyforge/storyforge.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("storyforge").join("storyforge.yml");
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

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Completion model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("azure" or "openai")
    pub provider: String,

    /// API base URL (Azure resource endpoint or OpenAI host)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Azure deployment name
    pub deployment: String,

    /// Azure API version query parameter
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Model identifier (sent to OpenAI, ignored by Azure deployments)
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds; transport default when unset
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Retries for transient failures (network, 408, 5xx)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Sampling used for interview turns
    pub conversation: SamplingConfig,

    /// Sampling used for plan extraction
    pub extraction: SamplingConfig,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).context(format!("{} is not set", self.api_key_env))
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "azure".to_string(),
            base_url: "https://example.openai.azure.com/".to_string(),
            deployment: String::new(),
            api_version: "2024-02-15-preview".to_string(),
            model: "gpt-4o".to_string(),
            api_key_env: "AZURE_OPENAI_API_KEY".to_string(),
            timeout_ms: None,
            max_retries: 2,
            conversation: SamplingConfig {
                max_tokens: 300,
                temperature: None,
                top_p: None,
                json_mode: false,
            },
            extraction: SamplingConfig {
                max_tokens: 1500,
                temperature: None,
                top_p: None,
                json_mode: true,
            },
        }
    }
}

/// Per-stage sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    pub temperature: Option<f32>,

    #[serde(rename = "top-p")]
    pub top_p: Option<f32>,

    /// Ask the provider for a JSON object response
    #[serde(rename = "json-mode")]
    pub json_mode: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1000,
            temperature: None,
            top_p: None,
            json_mode: false,
        }
    }
}

/// Issue tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Tracker base URL, e.g. https://example.atlassian.net
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// REST API version path segment
    #[serde(rename = "api-version")]
    pub api_version: String,

    /// Environment variable containing the tracker username
    #[serde(rename = "username-env")]
    pub username_env: String,

    /// Environment variable containing the tracker API token
    #[serde(rename = "api-token-env")]
    pub api_token_env: String,

    /// Project type for newly created projects
    #[serde(rename = "project-type-key")]
    pub project_type_key: String,

    /// Account that leads newly created projects
    #[serde(rename = "lead-account-id")]
    pub lead_account_id: Option<String>,

    /// Issue type names used for each plan level
    #[serde(rename = "issue-types")]
    pub issue_types: IssueTypeNames,

    /// Request timeout in milliseconds; transport default when unset
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_version: "2".to_string(),
            username_env: "JIRA_USERNAME".to_string(),
            api_token_env: "JIRA_API_TOKEN".to_string(),
            project_type_key: "software".to_string(),
            lead_account_id: None,
            issue_types: IssueTypeNames::default(),
            timeout_ms: None,
        }
    }
}

/// Tracker issue type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueTypeNames {
    pub epic: String,
    pub story: String,
    pub subtask: String,
}

impl Default for IssueTypeNames {
    fn default() -> Self {
        Self {
            epic: "Epic".to_string(),
            story: "Story".to_string(),
            subtask: "Sub-task".to_string(),
        }
    }
}

/// Session and transcript configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where generated transcripts are written; disabled when unset
    #[serde(rename = "transcript-path")]
    pub transcript_path: Option<PathBuf>,

    /// Extra directory searched for prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Additional instruction appended to the interviewer prompt
    #[serde(rename = "custom-instruction")]
    pub custom_instruction: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transcript_path: Some(PathBuf::from("project_requirements.md")),
            prompts_dir: None,
            custom_instruction: None,
        }
    }
}
