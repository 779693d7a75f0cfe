//! Submission persistence boundary
//!
//! The judge owns no database. Hosts hand the engine an implementation of
//! [`SubmissionStore`]; [`MemoryStore`] backs tests and single-process
//! setups that do not need durability.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::model::{Problem, Submission, TestCase};

/// Persistence boundary for submissions, problems, and test cases.
///
/// Each `save_submission` is expected to be atomic for that row. Test cases
/// come back ordered by display order.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Load a submission by id
    async fn get_submission(&self, id: i64) -> Result<Option<Submission>>;

    /// Load a problem together with its test cases, ordered by display order
    async fn get_problem_with_test_cases(
        &self,
        problem_id: i64,
    ) -> Result<Option<(Problem, Vec<TestCase>)>>;

    /// Persist the submission row
    async fn save_submission(&self, submission: &Submission) -> Result<()>;
}

/// In-memory store backed by mutex-guarded maps
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    submissions: HashMap<i64, Submission>,
    problems: HashMap<i64, Problem>,
    test_cases: HashMap<i64, Vec<TestCase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a submission
    pub async fn insert_submission(&self, submission: Submission) {
        let mut inner = self.inner.lock().await;
        inner.submissions.insert(submission.id, submission);
    }

    /// Seed a problem and its test cases
    pub async fn insert_problem(&self, problem: Problem, test_cases: Vec<TestCase>) {
        let mut inner = self.inner.lock().await;
        inner.test_cases.insert(problem.id, test_cases);
        inner.problems.insert(problem.id, problem);
    }
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    async fn get_submission(&self, id: i64) -> Result<Option<Submission>> {
        let inner = self.inner.lock().await;
        Ok(inner.submissions.get(&id).cloned())
    }

    async fn get_problem_with_test_cases(
        &self,
        problem_id: i64,
    ) -> Result<Option<(Problem, Vec<TestCase>)>> {
        let inner = self.inner.lock().await;
        let problem = match inner.problems.get(&problem_id) {
            Some(problem) => problem.clone(),
            None => return Ok(None),
        };
        let mut test_cases = inner.test_cases.get(&problem_id).cloned().unwrap_or_default();
        test_cases.sort_by_key(|tc| tc.display_order);
        Ok(Some((problem, test_cases)))
    }

    async fn save_submission(&self, submission: &Submission) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.submissions.insert(submission.id, submission.clone());
        Ok(())
    }
}
