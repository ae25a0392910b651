//! The validated configuration shared by every remote routine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{error::RunnerError, sweep::HostPool};

/// Everything a remote routine needs to know about where and as whom to run. Built once at
/// startup; nothing downstream reads the environment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// The user to log in as on every host.
    pub user: String,

    /// Hosts are `{host_prefix}{i}` for `i` in `first_host..last_host`.
    pub host_prefix: String,
    pub first_host: usize,
    pub last_host: usize,

    /// Worker threads for fan-out; `None` for one per task.
    pub jobs: Option<usize>,

    /// Where the benchmark sources live (the working directory of the build).
    pub source_dir: PathBuf,

    /// Where run directories are created.
    pub results_root: PathBuf,
}

impl RunConfig {
    /// Pick the user: an explicit value wins, then the value of `$USER` as passed in `env_user`.
    /// Having neither is a configuration error.
    pub fn resolve_user(
        explicit: Option<&str>,
        env_user: Option<String>,
    ) -> Result<String, RunnerError> {
        explicit
            .map(str::to_owned)
            .or(env_user)
            .filter(|user| !user.trim().is_empty())
            .ok_or_else(|| {
                RunnerError::Config("USER environment variable is not set (or pass --user)".into())
            })
    }

    /// Check the values that can be wrong independent of any sweep.
    pub fn validate(&self) -> Result<(), RunnerError> {
        if self.host_prefix.is_empty() {
            return Err(RunnerError::Config("the host prefix is empty".into()));
        }
        if self.first_host >= self.last_host {
            return Err(RunnerError::Config(format!(
                "empty host range {}..{}",
                self.first_host, self.last_host
            )));
        }
        if self.jobs == Some(0) {
            return Err(RunnerError::Config("--jobs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn host_pool(&self) -> HostPool {
        HostPool::numbered(&self.host_prefix, self.first_host..self.last_host)
    }
}

#[cfg(test)]
pub(crate) fn test_config(results_root: &std::path::Path) -> RunConfig {
    RunConfig {
        user: "alice".into(),
        host_prefix: "bbchain".into(),
        first_host: 2,
        last_host: 30,
        jobs: Some(4),
        source_dir: ".".into(),
        results_root: results_root.into(),
    }
}
