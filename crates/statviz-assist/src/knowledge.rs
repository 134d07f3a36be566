//! Documents the guidance flow is allowed to answer from.

use std::fs;
use std::path::Path;

/// Built-in guide used when no knowledge directory is configured.
pub const DEFAULT_KNOWLEDGE: &str = include_str!("../knowledge/statistical_methods.md");

/// Markdown files read from a knowledge directory, in order.
pub const DEFAULT_FILES: [&str; 3] = [
    "Guide_statistics_1.md",
    "common_mistakes_statistics.md",
    "common_statistical_tools.md",
];

const SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    text: String,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::from_text(DEFAULT_KNOWLEDGE)
    }
}

impl KnowledgeBase {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read `files` from `dir` and join them.
    ///
    /// Unreadable files are logged and skipped. When nothing could be read
    /// the built-in guide is used instead.
    pub fn from_dir<S: AsRef<str>>(dir: &Path, files: &[S]) -> Self {
        let documents: Vec<String> = files
            .iter()
            .filter_map(|name| {
                let path = dir.join(name.as_ref());
                match fs::read_to_string(&path) {
                    Ok(text) => Some(text),
                    Err(error) => {
                        tracing::warn!(path = %path.display(), %error, "skipping knowledge file");
                        None
                    }
                }
            })
            .collect();

        if documents.is_empty() {
            tracing::warn!(dir = %dir.display(), "no knowledge files read, using built-in guide");
            return Self::default();
        }
        tracing::debug!(documents = documents.len(), "knowledge base loaded");
        Self {
            text: documents.join(SEPARATOR),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
