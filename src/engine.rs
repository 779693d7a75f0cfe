//! Per-submission judging state machine
//!
//! Turns one queued submission id into a terminal status: loads the
//! submission, runs its problem's test cases in display order through the
//! executor, validates outputs, and persists the aggregated verdict. Stops
//! at the first failing test case; a compilation failure is terminal for
//! the whole loop.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use crate::error::JudgeError;
use crate::executor::{ExecutionRequest, Executor};
use crate::languages::LanguageRegistry;
use crate::model::SubmissionStatus;
use crate::store::SubmissionStore;
use crate::validator;
use crate::verdict::Verdict;

/// Orchestrates the full test-case loop for one submission
pub struct JudgeEngine {
    store: Arc<dyn SubmissionStore>,
    executor: Arc<dyn Executor>,
    languages: Arc<LanguageRegistry>,
}

impl JudgeEngine {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        executor: Arc<dyn Executor>,
        languages: Arc<LanguageRegistry>,
    ) -> Self {
        Self {
            store,
            executor,
            languages,
        }
    }

    /// Judge one submission end to end.
    ///
    /// Never fails: any error is absorbed into a best-effort SYSTEM_ERROR
    /// update on the submission, so a worker survives any single bad
    /// submission.
    pub async fn process(&self, submission_id: i64) {
        if let Err(e) = self.try_process(submission_id).await {
            error!("Error processing submission {}: {:#}", submission_id, e);
            self.mark_system_error(submission_id, &format!("{:#}", e))
                .await;
        }
    }

    async fn try_process(&self, submission_id: i64) -> Result<()> {
        let mut submission = self
            .store
            .get_submission(submission_id)
            .await
            .context("Failed to load submission")?
            .ok_or(JudgeError::SubmissionNotFound(submission_id))?;

        // Visible to status polling before any test case runs
        submission.status = SubmissionStatus::Running;
        self.store
            .save_submission(&submission)
            .await
            .context("Failed to mark submission running")?;

        let (problem, test_cases) = self
            .store
            .get_problem_with_test_cases(submission.problem_id)
            .await
            .context("Failed to load problem")?
            .ok_or(JudgeError::ProblemNotFound(submission.problem_id))?;

        if test_cases.is_empty() {
            self.mark_system_error(submission_id, "No test cases found")
                .await;
            return Ok(());
        }

        let lang_config = self.languages.config_for(&submission.language)?;

        let total = test_cases.len();
        let mut verdict = Verdict::Accepted;
        let mut total_score = 0;
        let mut passed_count = 0;
        let mut max_execution_time = 0u32;

        for (i, test_case) in test_cases.iter().enumerate() {
            info!(
                "Submission {}: Running test case {}/{}",
                submission_id,
                i + 1,
                total
            );

            let mut request = ExecutionRequest::new(
                submission_id,
                &submission.code,
                &lang_config.source_file,
                &lang_config.run_command,
            )
            .with_input(&test_case.input)
            .with_time_limit_ms(problem.time_limit_ms);
            if let Some(compile_command) = &lang_config.compile_command {
                request = request.with_compile_command(compile_command);
            }

            let exec_result = self.executor.execute(&request).await;

            if !exec_result.success {
                // Execution failed (TLE, MLE, RE, CE, or system error)
                verdict = exec_result.verdict.unwrap_or(Verdict::SystemError);
                submission.error_message = exec_result.error_message;
                break;
            }

            let validation = validator::validate(
                exec_result.stdout.as_deref(),
                Some(&test_case.expected_output),
            );

            if validation.passed {
                total_score += test_case.points;
                passed_count += 1;
                if let Some(time) = exec_result.execution_time_ms {
                    max_execution_time = max_execution_time.max(time);
                }
            } else {
                verdict = Verdict::WrongAnswer;
                break;
            }
        }

        submission.score = total_score;
        submission.test_cases_passed = passed_count;
        submission.total_test_cases = total as i32;
        submission.execution_time_ms = Some(max_execution_time);
        submission.completed_at = Some(Utc::now());

        if verdict == Verdict::Accepted && passed_count == total as i32 {
            submission.status = SubmissionStatus::Accepted;
            submission.result = Some("AC".to_string());
        } else if verdict == Verdict::Accepted {
            // No failure recorded, yet not every case passed
            submission.status = SubmissionStatus::SystemError;
            submission.result = Some("SE".to_string());
        } else {
            submission.status = verdict.to_status();
            submission.result = Some(verdict.result_code().to_string());
        }

        self.store
            .save_submission(&submission)
            .await
            .context("Failed to save judged submission")?;

        info!(
            "Submission {} completed with verdict: {}, passed: {}/{}",
            submission_id, submission.status, passed_count, total
        );

        Ok(())
    }

    /// Best-effort terminal SYSTEM_ERROR update; failures here are logged
    /// only, never propagated
    pub(crate) async fn mark_system_error(&self, submission_id: i64, message: &str) {
        let mut submission = match self.store.get_submission(submission_id).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                error!(
                    "Failed to update submission {} status: submission not found",
                    submission_id
                );
                return;
            }
            Err(e) => {
                error!("Failed to update submission {} status: {:#}", submission_id, e);
                return;
            }
        };

        submission.status = SubmissionStatus::SystemError;
        submission.error_message = Some(message.to_string());
        submission.completed_at = Some(Utc::now());

        if let Err(e) = self.store.save_submission(&submission).await {
            error!("Failed to update submission {} status: {:#}", submission_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ExecutionResult;
    use crate::model::{Problem, Submission, TestCase};
    use crate::store::MemoryStore;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex;

    /// Executor fed from a script of pre-programmed results
    struct MockExecutor {
        results: Mutex<VecDeque<ExecutionResult>>,
        calls: AtomicUsize,
    }

    impl MockExecutor {
        fn scripted(results: Vec<ExecutionResult>) -> Arc<Self> {
            Arc::new(Self {
                results: Mutex::new(results.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Executor for MockExecutor {
        async fn execute(&self, _request: &ExecutionRequest) -> ExecutionResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| {
                    ExecutionResult::failure(Verdict::SystemError).with_error("script exhausted")
                })
        }
    }

    /// Four ordered test cases worth 10 points each, expecting "ok1".."ok4"
    fn four_cases() -> Vec<TestCase> {
        (1..=4)
            .map(|i| {
                TestCase::new(i, 100, format!("in{}", i), format!("ok{}", i))
                    .with_display_order(i as i32)
            })
            .collect()
    }

    async fn engine_with(
        results: Vec<ExecutionResult>,
        test_cases: Vec<TestCase>,
    ) -> (JudgeEngine, Arc<MemoryStore>, Arc<MockExecutor>) {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_submission(Submission::new(1, 10, 100, "print(1)", "python"))
            .await;
        store.insert_problem(Problem::new(100), test_cases).await;

        let executor = MockExecutor::scripted(results);
        let languages = Arc::new(LanguageRegistry::from_embedded().unwrap());
        let engine = JudgeEngine::new(store.clone(), executor.clone(), languages);
        (engine, store, executor)
    }

    #[tokio::test]
    async fn test_all_pass_is_accepted() {
        let results = (1..=4)
            .map(|i| ExecutionResult::success(format!("ok{}", i), i * 50))
            .collect();
        let (engine, store, executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::Accepted);
        assert_eq!(submission.result.as_deref(), Some("AC"));
        assert_eq!(submission.score, 40);
        assert_eq!(submission.test_cases_passed, 4);
        assert_eq!(submission.total_test_cases, 4);
        assert_eq!(submission.execution_time_ms, Some(200));
        assert!(submission.error_message.is_none());
        assert!(submission.completed_at.is_some());
        assert!(submission.status.is_final());
        assert_eq!(executor.calls(), 4);
    }

    #[tokio::test]
    async fn test_first_case_tle_short_circuits() {
        let results = vec![ExecutionResult::failure(Verdict::TimeLimitExceeded).with_time(2000)];
        let (engine, store, executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::TimeLimitExceeded);
        assert_eq!(submission.result.as_deref(), Some("TLE"));
        assert_eq!(submission.test_cases_passed, 0);
        assert_eq!(submission.score, 0);
        // A timeout carries no diagnostic text, and no case passed
        assert!(submission.error_message.is_none());
        assert_eq!(submission.execution_time_ms, Some(0));
        assert!(submission.completed_at.is_some());
        // No further test cases after the failure
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_wrong_answer_on_third_of_four() {
        let results = vec![
            ExecutionResult::success("ok1", 30),
            ExecutionResult::success("ok2", 40),
            ExecutionResult::success("bogus", 20),
            ExecutionResult::success("ok4", 10),
        ];
        let (engine, store, executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::WrongAnswer);
        assert_eq!(submission.result.as_deref(), Some("WA"));
        assert_eq!(submission.score, 20);
        assert_eq!(submission.test_cases_passed, 2);
        assert_eq!(submission.total_test_cases, 4);
        assert_eq!(submission.execution_time_ms, Some(40));
        // The fourth case never runs
        assert_eq!(executor.calls(), 3);
    }

    #[tokio::test]
    async fn test_compilation_error_is_terminal() {
        let results = vec![ExecutionResult::failure(Verdict::CompilationError)
            .with_error("main.cpp:3: expected ';'")];
        let (engine, store, executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::CompilationError);
        assert_eq!(submission.result.as_deref(), Some("CE"));
        assert_eq!(submission.test_cases_passed, 0);
        assert_eq!(submission.total_test_cases, 4);
        assert_eq!(
            submission.error_message.as_deref(),
            Some("main.cpp:3: expected ';'")
        );
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_runtime_error_mid_loop() {
        let results = vec![
            ExecutionResult::success("ok1", 25),
            ExecutionResult::failure(Verdict::RuntimeError)
                .with_error("segmentation fault")
                .with_time(12),
        ];
        let (engine, store, executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::RuntimeError);
        assert_eq!(submission.result.as_deref(), Some("RE"));
        assert_eq!(submission.score, 10);
        assert_eq!(submission.test_cases_passed, 1);
        // Max time tracks passed cases only
        assert_eq!(submission.execution_time_ms, Some(25));
        assert_eq!(submission.error_message.as_deref(), Some("segmentation fault"));
        assert_eq!(executor.calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_submission_is_harmless() {
        let (engine, store, executor) = engine_with(vec![], four_cases()).await;

        engine.process(999).await;

        assert!(store.get_submission(999).await.unwrap().is_none());
        assert_eq!(executor.calls(), 0);
        // The seeded submission is untouched
        let other = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(other.status, SubmissionStatus::Pending);
    }

    #[tokio::test]
    async fn test_no_test_cases_is_system_error() {
        let (engine, store, executor) = engine_with(vec![], vec![]).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::SystemError);
        assert_eq!(submission.error_message.as_deref(), Some("No test cases found"));
        assert!(submission.completed_at.is_some());
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_language_is_system_error() {
        let (engine, store, executor) = engine_with(vec![], four_cases()).await;
        store
            .insert_submission(Submission::new(2, 10, 100, "DISPLAY 'HI'", "cobol"))
            .await;

        engine.process(2).await;

        let submission = store.get_submission(2).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::SystemError);
        assert!(submission
            .error_message
            .as_deref()
            .unwrap()
            .contains("Unsupported language: cobol"));
        assert!(submission.completed_at.is_some());
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn test_executor_system_error_maps_to_se() {
        let results =
            vec![ExecutionResult::failure(Verdict::SystemError).with_error("docker unavailable")];
        let (engine, store, _executor) = engine_with(results, four_cases()).await;

        engine.process(1).await;

        let submission = store.get_submission(1).await.unwrap().unwrap();
        assert_eq!(submission.status, SubmissionStatus::SystemError);
        assert_eq!(submission.result.as_deref(), Some("SE"));
        assert_eq!(submission.error_message.as_deref(), Some("docker unavailable"));
    }
}
