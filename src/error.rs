//! Error types surfaced by the judge pipeline

use thiserror::Error;

/// Errors a caller of the pipeline can act on.
///
/// Per-test-case outcomes (wrong answer, time limit, ...) are not errors;
/// they travel as [`Verdict`](crate::verdict::Verdict) values. These variants
/// cover the conditions that abort judging before a verdict exists.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(i64),

    #[error("Problem not found: {0}")]
    ProblemNotFound(i64),
}
