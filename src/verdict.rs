//! Verdict tags produced while judging

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SubmissionStatus;

/// Judgment for a single test-case execution.
///
/// The first non-`Accepted` verdict in a submission's test-case loop becomes
/// the submission's final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    SystemError,
}

impl Verdict {
    /// Short result code stored on the submission ("AC", "WA", ...)
    pub fn result_code(&self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::MemoryLimitExceeded => "MLE",
            Verdict::RuntimeError => "RE",
            Verdict::CompilationError => "CE",
            Verdict::SystemError => "SE",
        }
    }

    /// Terminal submission status this verdict maps to
    pub fn to_status(&self) -> SubmissionStatus {
        match self {
            Verdict::Accepted => SubmissionStatus::Accepted,
            Verdict::WrongAnswer => SubmissionStatus::WrongAnswer,
            Verdict::TimeLimitExceeded => SubmissionStatus::TimeLimitExceeded,
            Verdict::MemoryLimitExceeded => SubmissionStatus::MemoryLimitExceeded,
            Verdict::RuntimeError => SubmissionStatus::RuntimeError,
            Verdict::CompilationError => SubmissionStatus::CompilationError,
            Verdict::SystemError => SubmissionStatus::SystemError,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Accepted => "ACCEPTED",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Verdict::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Verdict::RuntimeError => "RUNTIME_ERROR",
            Verdict::CompilationError => "COMPILATION_ERROR",
            Verdict::SystemError => "SYSTEM_ERROR",
        };
        write!(f, "{}", s)
    }
}
