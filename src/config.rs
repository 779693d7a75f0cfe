//! Judge configuration
//!
//! Defaults match the shipped sandbox image; every field can be overridden
//! through a `JUDGE_*` environment variable.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// Container settings applied to every sandbox invocation
#[derive(Debug, Clone)]
pub struct DockerConfig {
    /// Image the compile and run commands execute in
    pub image: String,
    /// Memory limit passed to `--memory` (e.g. "256m")
    pub memory_limit: String,
    /// CPU share passed to `--cpus`
    pub cpu_limit: f64,
    /// Network mode passed to `--network`; "none" cuts the container off
    pub network_mode: String,
}

impl Default for DockerConfig {
    fn default() -> Self {
        Self {
            image: "judge-env:latest".to_string(),
            memory_limit: "256m".to_string(),
            cpu_limit: 1.0,
            network_mode: "none".to_string(),
        }
    }
}

/// Top-level configuration for the judging pipeline
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    pub docker: DockerConfig,
    /// Root under which per-submission workspaces are created
    pub temp_dir: PathBuf,
    /// Number of concurrent judge workers
    pub worker_threads: usize,
    /// Admission queue capacity
    pub queue_capacity: usize,
    /// Compile time limit in milliseconds
    pub compile_time_limit_ms: u32,
    /// How long `enqueue` blocks on a full queue before giving up
    pub enqueue_timeout_ms: u64,
    /// Worker poll timeout; bounds how fast workers observe shutdown
    pub poll_interval_ms: u64,
    /// How long `stop` waits for workers to drain
    pub shutdown_grace_ms: u64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            docker: DockerConfig::default(),
            temp_dir: PathBuf::from("/tmp/judge"),
            worker_threads: 4,
            queue_capacity: 100,
            compile_time_limit_ms: 30_000,
            enqueue_timeout_ms: 5_000,
            poll_interval_ms: 1_000,
            shutdown_grace_ms: 10_000,
        }
    }
}

impl JudgeConfig {
    /// Build a config from `JUDGE_*` environment variables, falling back to
    /// the defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            docker: DockerConfig {
                image: env_string("JUDGE_DOCKER_IMAGE", defaults.docker.image),
                memory_limit: env_string("JUDGE_MEMORY_LIMIT", defaults.docker.memory_limit),
                cpu_limit: env_parse("JUDGE_CPU_LIMIT", defaults.docker.cpu_limit),
                network_mode: env_string("JUDGE_NETWORK_MODE", defaults.docker.network_mode),
            },
            temp_dir: PathBuf::from(env_string(
                "JUDGE_TEMP_DIR",
                defaults.temp_dir.to_string_lossy().into_owned(),
            )),
            worker_threads: env_parse("JUDGE_WORKER_THREADS", defaults.worker_threads).max(1),
            queue_capacity: env_parse("JUDGE_QUEUE_CAPACITY", defaults.queue_capacity).max(1),
            compile_time_limit_ms: env_parse(
                "JUDGE_COMPILE_TIME_LIMIT_MS",
                defaults.compile_time_limit_ms,
            ),
            enqueue_timeout_ms: env_parse("JUDGE_ENQUEUE_TIMEOUT_MS", defaults.enqueue_timeout_ms),
            poll_interval_ms: env_parse("JUDGE_POLL_INTERVAL_MS", defaults.poll_interval_ms),
            shutdown_grace_ms: env_parse("JUDGE_SHUTDOWN_GRACE_MS", defaults.shutdown_grace_ms),
        }
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn env_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Invalid value for {}: {:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = JudgeConfig::default();
        assert_eq!(config.docker.image, "judge-env:latest");
        assert_eq!(config.docker.memory_limit, "256m");
        assert_eq!(config.docker.cpu_limit, 1.0);
        assert_eq!(config.docker.network_mode, "none");
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/judge"));
        assert_eq!(config.worker_threads, 4);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.compile_time_limit_ms, 30_000);
        assert_eq!(config.enqueue_timeout(), Duration::from_secs(5));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_env_overrides() {
        // This is the only test that touches JUDGE_* variables, so it does
        // all its mutation in one place and cleans up afterwards.
        env::set_var("JUDGE_DOCKER_IMAGE", "judge-env:v2");
        env::set_var("JUDGE_CPU_LIMIT", "2.5");
        env::set_var("JUDGE_WORKER_THREADS", "0");
        env::set_var("JUDGE_QUEUE_CAPACITY", "not-a-number");

        let config = JudgeConfig::from_env();
        assert_eq!(config.docker.image, "judge-env:v2");
        assert_eq!(config.docker.cpu_limit, 2.5);
        // Zero workers would deadlock the queue; clamped up
        assert_eq!(config.worker_threads, 1);
        // Unparsable values fall back to the default
        assert_eq!(config.queue_capacity, 100);

        env::remove_var("JUDGE_DOCKER_IMAGE");
        env::remove_var("JUDGE_CPU_LIMIT");
        env::remove_var("JUDGE_WORKER_THREADS");
        env::remove_var("JUDGE_QUEUE_CAPACITY");
    }
}
