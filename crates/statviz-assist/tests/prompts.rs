use std::fs;

use statviz_assist::{KnowledgeBase, explanation_prompt, results_digest};
use statviz_model::{AnalysisResult, AnalysisType};

#[test]
fn failure_digest() {
    let result = AnalysisResult::failure(AnalysisType::Anova, "backend down", "HTTP 500");
    insta::assert_snapshot!(results_digest(&result, None), @r#"
    Analysis Title: Error: ANOVA Failed
    Key Statistics: {"details":"HTTP 500","error":"Failed to fetch results from the analysis backend."}
    Summary Table: Error
    backend down

    User context: No additional context provided.
    "#);
}

#[test]
fn explanation_prompt_layout() {
    insta::assert_snapshot!(explanation_prompt("F = 4.2", "ANOVA"), @r"
    You are an AI assistant that explains statistical results in a way that is easy to understand for people who are new to statistics.

    You will be provided with the statistical results and the type of analysis that was performed.

    Based on this information, generate an explanation of the statistical results that is clear, concise, and easy to understand.

    Statistical Results:
    F = 4.2

    Type of Analysis:
    ANOVA

    Explanation:
    ");
}

#[test]
fn knowledge_dir_skips_missing_files() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("a.md"), "# A").expect("write a");
    fs::write(dir.path().join("c.md"), "# C").expect("write c");

    let kb = KnowledgeBase::from_dir(dir.path(), &["a.md", "b.md", "c.md"]);

    assert_eq!(kb.text(), "# A\n\n---\n\n# C");
}

#[test]
fn knowledge_dir_without_files_falls_back_to_builtin() {
    let dir = tempfile::tempdir().expect("temp dir");
    let kb = KnowledgeBase::from_dir(dir.path(), &statviz_assist::DEFAULT_FILES);
    assert_eq!(kb, KnowledgeBase::default());
}
