/// Runtime configuration for the model provider client.
///
/// Resolved through a three-layer precedence chain (highest wins):
///
/// 1. Built-in defaults (Gemini Flash against the public endpoint).
/// 2. JSON config file: `~/.mlboard/config.json`
///    ```json
///    { "llm": { "model": "gemini-2.0-flash", "timeout_ms": 30000 } }
///    ```
/// 3. Environment variables: `MLBOARD_MODEL`, `MLBOARD_BASE_URL`,
///    `MLBOARD_TIMEOUT_MS`, and `MLBOARD_API_KEY` (falling back to
///    `GEMINI_API_KEY`, which the provider's own tooling sets).
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

/// Default Generative Language API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for both flows.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default timeout in milliseconds for provider requests.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Public config struct
// ---------------------------------------------------------------------------

/// Fully resolved provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model name (e.g. `"gemini-2.0-flash"`).
    pub model: String,
    /// API base URL.
    pub base_url: String,
    /// API key. `None` means unset — requests will fail until one is
    /// provided, and `health` reports it.
    pub api_key: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl LlmConfig {
    /// Load the provider config using the precedence chain:
    /// built-in defaults → JSON config file → environment variables.
    pub fn load() -> Self {
        let mut config = Self::default();

        // Layer 2: override from JSON config file
        if let Some(file_cfg) = FileConfig::load()
            && let Some(llm) = file_cfg.llm
        {
            llm.apply_to(&mut config);
        }

        // Layer 3: override from environment variables (highest precedence)
        Self::apply_env_overrides(&mut config);

        config
    }

    /// Apply environment-variable overrides.
    fn apply_env_overrides(config: &mut Self) {
        if let Ok(val) = std::env::var("MLBOARD_MODEL")
            && !val.is_empty()
        {
            config.model = val;
        }

        if let Ok(val) = std::env::var("MLBOARD_BASE_URL")
            && !val.is_empty()
        {
            config.base_url = val;
        }

        if let Ok(val) = std::env::var("MLBOARD_TIMEOUT_MS")
            && let Ok(ms) = val.parse::<u64>()
        {
            config.timeout_ms = ms;
        }

        if let Ok(val) = std::env::var("MLBOARD_API_KEY")
            && !val.is_empty()
        {
            config.api_key = Some(val);
        } else if let Ok(val) = std::env::var("GEMINI_API_KEY")
            && !val.is_empty()
        {
            config.api_key = Some(val);
        }
    }
}

// ---------------------------------------------------------------------------
// JSON config file schema
// ---------------------------------------------------------------------------

/// Top-level JSON config file schema (`~/.mlboard/config.json`).
#[derive(Debug, Deserialize)]
struct FileConfig {
    llm: Option<FileLlm>,
}

/// Provider section inside the JSON config file.
///
/// All fields are optional — only present values override the defaults.
#[derive(Debug, Deserialize)]
struct FileLlm {
    model: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_ms: Option<u64>,
}

impl FileLlm {
    /// Merge file-level overrides into an [`LlmConfig`].
    fn apply_to(&self, config: &mut LlmConfig) {
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ref key) = self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
    }
}

impl FileConfig {
    /// Attempt to load the config from `~/.mlboard/config.json`.
    /// Returns `None` if the file doesn't exist or is malformed.
    fn load() -> Option<Self> {
        let path = config_file_path()?;
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }
}

/// Resolve the path to the JSON config file: `~/.mlboard/config.json`.
fn config_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mlboard").join("config.json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
