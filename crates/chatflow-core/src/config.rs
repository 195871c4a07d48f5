//! Chat client configuration

/// Default completion endpoint (OpenAI-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

/// System instruction prepended to every turn.
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Per-turn request configuration.
///
/// The sampling parameters are fixed configuration constants, not computed
/// per request.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub base_url: String,
    pub system_instruction: String,
    pub temperature: f64,
    pub max_completion_tokens: u32,
    pub top_p: f64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            temperature: 0.6,
            max_completion_tokens: 4096,
            top_p: 0.95,
        }
    }
}

impl ChatConfig {
    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the system instruction
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }
}
