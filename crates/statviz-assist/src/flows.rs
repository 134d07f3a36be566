//! User-facing assistant flows.
//!
//! Every flow builds a prompt, makes one generation call and returns plain
//! text. Generation failures are logged and replaced by an apology so the
//! caller always has something to show; only invalid inputs surface as
//! errors.

use std::time::Instant;

use statviz_model::{AnalysisResult, DesignResult};

use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::prompts::{
    FrbdSummaryInput, RbdSummaryInput, explanation_prompt, frbd_summary_prompt,
    guidance_prompt, rbd_summary_prompt, results_digest,
};
use crate::provider::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationRequest, TextGenerator};

/// Shown in place of an explanation or summary that could not be generated.
pub const FALLBACK_APOLOGY: &str = "Sorry, I couldn't generate an explanation at this time.";

/// Shown in place of a guide answer that could not be generated.
pub const GUIDE_APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Model settings applied to every flow.
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

pub struct Assistant {
    generator: Box<dyn TextGenerator>,
    knowledge: KnowledgeBase,
    settings: AssistantSettings,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Assistant {
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self {
            generator,
            knowledge: KnowledgeBase::default(),
            settings: AssistantSettings::default(),
        }
    }

    #[must_use]
    pub fn with_knowledge(mut self, knowledge: KnowledgeBase) -> Self {
        self.knowledge = knowledge;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: AssistantSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    fn generate_or(&self, flow: &'static str, prompt: String, apology: &str) -> String {
        let start = Instant::now();
        let request = GenerationRequest::new(prompt)
            .with_model(self.settings.model.clone())
            .with_temperature(self.settings.temperature);
        match self.generator.generate(&request) {
            Ok(text) => {
                tracing::info!(
                    flow,
                    model = %request.model,
                    chars = text.len(),
                    duration_ms = start.elapsed().as_millis(),
                    "generation complete"
                );
                text
            }
            Err(error) => {
                tracing::warn!(flow, %error, "generation failed");
                apology.to_string()
            }
        }
    }

    /// Explain already-rendered results.
    pub fn explain(&self, results: &str, analysis_type: &str) -> String {
        self.generate_or(
            "explain",
            explanation_prompt(results, analysis_type),
            FALLBACK_APOLOGY,
        )
    }

    /// Explain an analysis result, with optional user context.
    pub fn explain_result(
        &self,
        result: &AnalysisResult,
        analysis_type: &str,
        context: Option<&str>,
    ) -> String {
        self.explain(&results_digest(result, context), analysis_type)
    }

    /// Answer a statistics question from the knowledge base only.
    pub fn answer_question(&self, question: &str) -> String {
        self.generate_or(
            "guide",
            guidance_prompt(question.trim(), self.knowledge.text()),
            GUIDE_APOLOGY,
        )
    }

    pub fn summarize_rbd(&self, input: &RbdSummaryInput) -> Result<String> {
        let prompt = rbd_summary_prompt(input)?;
        Ok(self.generate_or("rbd_summary", prompt, FALLBACK_APOLOGY))
    }

    pub fn summarize_frbd(&self, input: &FrbdSummaryInput) -> Result<String> {
        let prompt = frbd_summary_prompt(input)?;
        Ok(self.generate_or("frbd_summary", prompt, FALLBACK_APOLOGY))
    }

    /// Summarize an RBD service response.
    pub fn summarize_rbd_result(&self, result: &DesignResult) -> Result<String> {
        self.summarize_rbd(&RbdSummaryInput::from_design(result)?)
    }

    /// Summarize an FRBD service response.
    pub fn summarize_frbd_result(&self, result: &DesignResult) -> Result<String> {
        self.summarize_frbd(&FrbdSummaryInput::from_design(result)?)
    }
}
