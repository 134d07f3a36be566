//! Text generation seam.

/// Hosted model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Sampling temperature used for every flow.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// One prompt sent to a language model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Anything that turns a prompt into text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, request: &GenerationRequest) -> crate::Result<String>;
}
