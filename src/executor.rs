//! Sandboxed execution of untrusted code via the Docker CLI
//!
//! One `execute` call covers the whole lifecycle for a single test case:
//! workspace setup, source/input writes, optional compile, run, cleanup.
//! The workspace is removed on every exit path, panics included.
//!
//! The executor does NOT:
//! - Compare outputs or decide pass/fail
//! - Know about problems, scores, or test-case ordering

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, warn};

use crate::config::JudgeConfig;
use crate::verdict::Verdict;

/// Wall-clock allowance on top of the time limit for process teardown
const RUN_GRACE_MS: u64 = 1000;

/// Exit code the container runtime reports when its memory controller
/// SIGKILLs the process
const OOM_EXIT_CODE: i32 = 137;

/// One unit of work for the executor: run this code against this input
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub submission_id: i64,
    pub code: String,
    pub source_file: String,
    pub input: String,
    pub compile_command: Option<String>,
    pub run_command: String,
    pub time_limit_ms: u32,
}

impl ExecutionRequest {
    pub fn new(
        submission_id: i64,
        code: impl Into<String>,
        source_file: impl Into<String>,
        run_command: impl Into<String>,
    ) -> Self {
        Self {
            submission_id,
            code: code.into(),
            source_file: source_file.into(),
            input: String::new(),
            compile_command: None,
            run_command: run_command.into(),
            time_limit_ms: 1000,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    pub fn with_compile_command(mut self, compile_command: impl Into<String>) -> Self {
        self.compile_command = Some(compile_command.into());
        self
    }

    pub fn with_time_limit_ms(mut self, time_limit_ms: u32) -> Self {
        self.time_limit_ms = time_limit_ms;
        self
    }
}

/// Outcome of executing one request
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub stdout: Option<String>,
    pub verdict: Option<Verdict>,
    pub error_message: Option<String>,
    pub execution_time_ms: Option<u32>,
}

impl ExecutionResult {
    pub fn success(stdout: impl Into<String>, execution_time_ms: u32) -> Self {
        Self {
            success: true,
            stdout: Some(stdout.into()),
            verdict: None,
            error_message: None,
            execution_time_ms: Some(execution_time_ms),
        }
    }

    pub fn failure(verdict: Verdict) -> Self {
        Self {
            success: false,
            stdout: None,
            verdict: Some(verdict),
            error_message: None,
            execution_time_ms: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_time(mut self, execution_time_ms: u32) -> Self {
        self.execution_time_ms = Some(execution_time_ms);
        self
    }
}

/// Executor boundary, so the engine can run against a mock in tests
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run one request to completion. Infallible by contract: unexpected
    /// failures come back as a `SystemError`-tagged result, never as a panic
    /// or error the caller must handle.
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult;
}

/// Executor backed by `docker run`.
///
/// Every invocation is ephemeral (`--rm`), offline by default, memory and
/// CPU capped, with the per-submission workspace bind-mounted as the
/// container's working directory.
pub struct DockerExecutor {
    config: Arc<JudgeConfig>,
}

impl DockerExecutor {
    /// Create the executor, ensuring the workspace root exists
    pub fn new(config: Arc<JudgeConfig>) -> Result<Self> {
        std::fs::create_dir_all(&config.temp_dir).with_context(|| {
            format!(
                "Failed to create workspace root {}",
                config.temp_dir.display()
            )
        })?;
        Ok(Self { config })
    }

    async fn run_request(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        let workspace = Workspace::create(&self.config.temp_dir, request.submission_id).await?;

        workspace.write_file(&request.source_file, &request.code).await?;
        workspace.write_file("input.txt", &request.input).await?;

        if let Some(compile_command) = &request.compile_command {
            if let Some(failure) = self.compile(&workspace, compile_command).await? {
                return Ok(failure);
            }
        }

        self.run(&workspace, request).await
    }

    /// Run the compile command. `Some(result)` is a compilation failure,
    /// terminal for the submission's whole test-case loop.
    async fn compile(
        &self,
        workspace: &Workspace,
        compile_command: &str,
    ) -> Result<Option<ExecutionResult>> {
        debug!("Compiling with: {}", compile_command);

        let deadline = Duration::from_millis(self.config.compile_time_limit_ms as u64);
        let output = match self.invoke(workspace, compile_command, deadline).await? {
            Some(output) => output,
            None => {
                return Ok(Some(
                    ExecutionResult::failure(Verdict::CompilationError)
                        .with_error("Compilation timeout"),
                ));
            }
        };

        if output.status.success() {
            return Ok(None);
        }

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let message = combined.trim().to_string();
        let message = if message.is_empty() {
            format!(
                "Compilation failed with exit code {}",
                output.status.code().unwrap_or(-1)
            )
        } else {
            message
        };

        Ok(Some(
            ExecutionResult::failure(Verdict::CompilationError).with_error(message),
        ))
    }

    /// Run the submission against the request's input under its time limit
    async fn run(
        &self,
        workspace: &Workspace,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult> {
        let shell_command = format!("{} < input.txt", request.run_command);
        let deadline = Duration::from_millis(request.time_limit_ms as u64 + RUN_GRACE_MS);

        let started = Instant::now();
        let output = self.invoke(workspace, &shell_command, deadline).await?;
        let elapsed_ms = started.elapsed().as_millis() as u32;

        let output = match output {
            Some(output) => output,
            None => {
                return Ok(ExecutionResult::failure(Verdict::TimeLimitExceeded)
                    .with_time(elapsed_ms));
            }
        };

        match output.status.code().unwrap_or(-1) {
            0 => Ok(ExecutionResult::success(
                String::from_utf8_lossy(&output.stdout),
                elapsed_ms,
            )),
            OOM_EXIT_CODE => {
                Ok(ExecutionResult::failure(Verdict::MemoryLimitExceeded).with_time(elapsed_ms))
            }
            _ => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                Ok(ExecutionResult::failure(Verdict::RuntimeError)
                    .with_error(stderr)
                    .with_time(elapsed_ms))
            }
        }
    }

    /// Invoke `docker run` with the given shell command.
    /// `Ok(None)` means the deadline passed and the process was killed.
    async fn invoke(
        &self,
        workspace: &Workspace,
        shell_command: &str,
        deadline: Duration,
    ) -> Result<Option<std::process::Output>> {
        let args = self.docker_args(workspace.path(), shell_command);
        debug!("Running docker with args: {:?}", args);

        let child = Command::new("docker")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context("Failed to spawn docker")?;

        match tokio::time::timeout(deadline, child.wait_with_output()).await {
            Ok(output) => {
                let output = output.context("Failed to wait for docker")?;
                Ok(Some(output))
            }
            // Dropping the future drops the child, which kills the process
            Err(_) => Ok(None),
        }
    }

    /// Argument vector for one `docker run` invocation
    fn docker_args(&self, workspace: &Path, shell_command: &str) -> Vec<String> {
        let docker = &self.config.docker;
        vec![
            "run".to_string(),
            "--rm".to_string(),
            format!("--network={}", docker.network_mode),
            format!("--memory={}", docker.memory_limit),
            format!("--cpus={}", docker.cpu_limit),
            "-v".to_string(),
            format!("{}:/workspace", workspace.display()),
            "-w".to_string(),
            "/workspace".to_string(),
            docker.image.clone(),
            "sh".to_string(),
            "-c".to_string(),
            shell_command.to_string(),
        ]
    }
}

#[async_trait]
impl Executor for DockerExecutor {
    async fn execute(&self, request: &ExecutionRequest) -> ExecutionResult {
        match self.run_request(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    "Execution error for submission {}: {:#}",
                    request.submission_id, e
                );
                ExecutionResult::failure(Verdict::SystemError).with_error(format!("{:#}", e))
            }
        }
    }
}

/// Per-submission scratch directory, removed when dropped
struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// Create the directory, replacing any stale one left by a previous
    /// run of the same submission id
    async fn create(root: &Path, submission_id: i64) -> Result<Self> {
        let dir = root.join(format!("submission_{}", submission_id));
        if dir.exists() {
            debug!("Replacing stale workspace {}", dir.display());
            tokio::fs::remove_dir_all(&dir).await.with_context(|| {
                format!("Failed to remove stale workspace {}", dir.display())
            })?;
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create workspace {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        &self.dir
    }

    async fn write_file(&self, name: &str, content: &str) -> Result<()> {
        let path = self.dir.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean up workspace {}: {}", self.dir.display(), e);
            }
        }
    }
}
