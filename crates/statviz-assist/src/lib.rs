//! Natural-language assistance for StatViz.
//!
//! Prompts are built in [`prompts`], sent through a [`TextGenerator`]
//! (normally [`GeminiGenerator`]) and wrapped into the user-facing flows of
//! [`Assistant`].

pub mod error;
pub mod flows;
pub mod gemini;
pub mod knowledge;
pub mod prompts;
pub mod provider;

pub use error::{AssistError, Result};
pub use flows::{Assistant, AssistantSettings, FALLBACK_APOLOGY, GUIDE_APOLOGY};
pub use gemini::{GEMINI_API_URL, GeminiGenerator};
pub use knowledge::{DEFAULT_FILES, DEFAULT_KNOWLEDGE, KnowledgeBase};
pub use prompts::{
    FrbdSummaryInput, NO_CONTEXT, RbdSummaryInput, explanation_prompt, format_results_with_letters,
    frbd_summary_prompt, guidance_prompt, rbd_summary_prompt, results_digest,
};
pub use provider::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, GenerationRequest, TextGenerator};
