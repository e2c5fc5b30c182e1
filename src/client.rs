use serde_json::Value;

/// Sampling configuration for the model-assisted parser.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Temperature. Kept near zero so extraction is reproducible.
    pub temperature: f64,

    /// Maximum tokens to generate. Six short fields fit comfortably.
    pub max_tokens: u32,

    /// Ask the provider for JSON-only output (`format: json` on Ollama,
    /// `response_format` on OpenAI-compatible servers).
    pub json_mode: bool,

    /// Custom options merged into the Ollama options object.
    pub options: Option<Value>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 256,
            json_mode: false,
            options: None,
        }
    }
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub fn with_options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.temperature, 0.1);
        assert_eq!(config.max_tokens, 256);
        assert!(!config.json_mode);
        assert!(config.options.is_none());
    }

    #[test]
    fn test_llm_config_builder() {
        let config = LlmConfig::default()
            .with_temperature(0.0)
            .with_max_tokens(128)
            .with_json_mode(true)
            .with_options(json!({"seed": 7}));
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.max_tokens, 128);
        assert!(config.json_mode);
        assert_eq!(config.options.unwrap()["seed"], 7);
    }
}
