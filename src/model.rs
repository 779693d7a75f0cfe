//! Core data model for submissions, problems, and test cases

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a submission.
///
/// `Pending` and `Running` are transient; the remaining seven states are
/// terminal. A submission is terminal exactly when `completed_at` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Running,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    MemoryLimitExceeded,
    RuntimeError,
    CompilationError,
    SystemError,
}

impl SubmissionStatus {
    /// Whether this status is terminal (no further transitions)
    pub fn is_final(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending | SubmissionStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Running => "RUNNING",
            SubmissionStatus::Accepted => "ACCEPTED",
            SubmissionStatus::WrongAnswer => "WRONG_ANSWER",
            SubmissionStatus::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            SubmissionStatus::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            SubmissionStatus::RuntimeError => "RUNTIME_ERROR",
            SubmissionStatus::CompilationError => "COMPILATION_ERROR",
            SubmissionStatus::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One submitted solution and everything judging records about it.
///
/// Created externally in `Pending`; mutated only by the judge engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub user_id: i64,
    pub problem_id: i64,
    pub contest_id: Option<i64>,
    pub code: String,
    pub language: String,
    pub status: SubmissionStatus,
    /// Short result code ("AC", "WA", ...) set once judging finishes
    pub result: Option<String>,
    pub score: i32,
    /// Max wall-clock time over passed test cases, in milliseconds
    pub execution_time_ms: Option<u32>,
    /// Never populated by the current executor; kept for the stored schema
    pub memory_used_mb: Option<u32>,
    pub error_message: Option<String>,
    pub test_cases_passed: i32,
    pub total_test_cases: i32,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Submission {
    /// Create a fresh submission in `Pending`, timestamped now
    pub fn new(
        id: i64,
        user_id: i64,
        problem_id: i64,
        code: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id,
            problem_id,
            contest_id: None,
            code: code.into(),
            language: language.into(),
            status: SubmissionStatus::Pending,
            result: None,
            score: 0,
            execution_time_ms: None,
            memory_used_mb: None,
            error_message: None,
            test_cases_passed: 0,
            total_test_cases: 0,
            submitted_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_contest(mut self, contest_id: i64) -> Self {
        self.contest_id = Some(contest_id);
        self
    }
}

/// Judging-relevant slice of a problem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    /// Per-test-case time limit in milliseconds
    pub time_limit_ms: u32,
    pub memory_limit_mb: u32,
}

impl Problem {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            time_limit_ms: 1000,
            memory_limit_mb: 256,
        }
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u32) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }
}

/// One test case of a problem, immutable during judging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub problem_id: i64,
    pub input: String,
    pub expected_output: String,
    pub points: i32,
    /// Evaluation order within the problem; drives the short-circuit policy
    pub display_order: i32,
    pub is_sample: bool,
}

impl TestCase {
    pub fn new(
        id: i64,
        problem_id: i64,
        input: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            id,
            problem_id,
            input: input.into(),
            expected_output: expected_output.into(),
            points: 10,
            display_order: 0,
            is_sample: false,
        }
    }

    pub fn with_points(mut self, points: i32) -> Self {
        self.points = points;
        self
    }

    pub fn with_display_order(mut self, display_order: i32) -> Self {
        self.display_order = display_order;
        self
    }
}
