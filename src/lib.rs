//! Sandboxed execution pipeline for judging programming-contest submissions.
//!
//! A submission flows through three stages:
//!
//! 1. [`SubmissionQueue`] admits the submission id into a bounded FIFO
//!    queue and hands it to one of a fixed pool of worker tasks.
//! 2. [`JudgeEngine`] loads the submission and its problem's test cases,
//!    then runs each case through an [`Executor`] until one fails.
//! 3. [`DockerExecutor`] compiles and runs the code inside a locked-down
//!    Docker container and reports one [`ExecutionResult`] per run.
//!
//! Outputs are compared under the whitespace-normalizing rules in
//! [`validator`], and the aggregate lands back in the [`SubmissionStore`]
//! as a terminal [`SubmissionStatus`] plus a short result code.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use contest_judge::{
//!     DockerExecutor, JudgeConfig, JudgeEngine, LanguageRegistry, MemoryStore, Problem,
//!     Submission, SubmissionQueue, TestCase,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(JudgeConfig::from_env());
//!
//!     let store = Arc::new(MemoryStore::new());
//!     store
//!         .insert_problem(Problem::new(1), vec![TestCase::new(1, 1, "2 3", "5")])
//!         .await;
//!     store
//!         .insert_submission(Submission::new(
//!             1,
//!             7,
//!             1,
//!             "print(sum(map(int, input().split())))",
//!             "python",
//!         ))
//!         .await;
//!
//!     let languages = Arc::new(LanguageRegistry::from_embedded()?);
//!     let executor = Arc::new(DockerExecutor::new(config.clone())?);
//!     let engine = Arc::new(JudgeEngine::new(store.clone(), executor, languages));
//!
//!     let queue = SubmissionQueue::new(engine, &config);
//!     queue.start().await;
//!     queue.enqueue(1).await;
//!
//!     tokio::signal::ctrl_c().await?;
//!     queue.stop().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod languages;
pub mod model;
pub mod queue;
pub mod store;
pub mod validator;
pub mod verdict;

pub use config::{DockerConfig, JudgeConfig};
pub use engine::JudgeEngine;
pub use error::JudgeError;
pub use executor::{DockerExecutor, ExecutionRequest, ExecutionResult, Executor};
pub use languages::{LanguageConfig, LanguageRegistry};
pub use model::{Problem, Submission, SubmissionStatus, TestCase};
pub use queue::SubmissionQueue;
pub use store::{MemoryStore, SubmissionStore};
pub use validator::{validate, ValidationResult};
pub use verdict::Verdict;
