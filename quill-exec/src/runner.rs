use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use quill_core::config::RunnerConfig;

use crate::error::{RunError, StrategyError};
use crate::language::{Language, lookup_language};
use crate::local::LocalStrategy;
use crate::outcome::RunOutcome;
use crate::remote::RemoteStrategy;
use crate::strategy::ExecutionStrategy;

/// Picks a strategy for each run: remote first, local when the remote
/// service fails and the local strategy handles the language.
#[derive(Clone)]
pub struct Executor {
    remote: Arc<dyn ExecutionStrategy>,
    local: Arc<dyn ExecutionStrategy>,
}

impl Executor {
    pub fn new(remote: Arc<dyn ExecutionStrategy>, local: Arc<dyn ExecutionStrategy>) -> Self {
        Self { remote, local }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            Arc::new(RemoteStrategy::from_config(config)),
            Arc::new(LocalStrategy::from_config(config)),
        )
    }

    /// Run `source`, rejecting unsupported languages before anything is sent.
    pub async fn execute(&self, language: &str, source: &str) -> Result<RunOutcome, RunError> {
        let language = lookup_language(language)?;
        Ok(self.execute_language(language, source).await)
    }

    pub async fn execute_language(&self, language: &Language, source: &str) -> RunOutcome {
        let remote_err = match self.remote.execute(source, language).await {
            Ok(result) => return result.into_outcome(),
            Err(e) => e,
        };

        if !self.local.supports(language) {
            warn!("Remote run of {} failed: {}", language.name, remote_err);
            return RunOutcome::Failed(remediation(&remote_err));
        }

        info!(
            "Remote run of {} failed ({}), running locally",
            language.name, remote_err
        );
        match self.local.execute(source, language).await {
            Ok(result) => result.into_outcome(),
            Err(e) => {
                warn!("Local run failed: {}", e);
                RunOutcome::Failed(format!("Error:\n{}", e))
            }
        }
    }
}

fn remediation(err: &StrategyError) -> String {
    format!(
        "Error: Unable to execute code.\n{}\n\nNote: To enable code execution, configure an API key for the remote execution service (runner.api_key or QUILL_RUNNER__API_KEY).",
        err
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
}

/// Run control for one code block on a page.
///
/// Only one run may be in flight per instance; separate instances share
/// nothing and can run at the same time.
pub struct CodeRunner {
    executor: Executor,
    language: String,
    source: String,
    state: Mutex<RunState>,
}

/// Puts the runner back to `Idle` if a run is dropped before it settles.
struct InFlight<'a> {
    runner: &'a CodeRunner,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.runner.lock_state() = RunState::Idle;
        }
    }
}

impl CodeRunner {
    pub fn new(executor: Executor, language: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            executor,
            language: language.into(),
            source: source.into(),
            state: Mutex::new(RunState::Idle),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RunState {
        *self.lock_state()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute the block's code.
    ///
    /// Returns [`RunError::AlreadyRunning`] without doing anything if a run is
    /// in flight, and [`RunError::Unsupported`] before any network call when
    /// the language cannot be executed.
    pub async fn run(&self) -> Result<RunOutcome, RunError> {
        let language = lookup_language(&self.language)?;

        {
            let mut state = self.lock_state();
            if *state == RunState::Running {
                return Err(RunError::AlreadyRunning);
            }
            *state = RunState::Running;
        }
        let mut guard = InFlight {
            runner: self,
            settled: false,
        };

        let outcome = self.executor.execute_language(language, &self.source).await;

        *self.lock_state() = if outcome.is_success() {
            RunState::Succeeded
        } else {
            RunState::Failed
        };
        guard.settled = true;

        Ok(outcome)
    }

    /// Return to `Idle` once the result has been shown.
    pub fn acknowledge(&self) {
        let mut state = self.lock_state();
        if *state != RunState::Running {
            *state = RunState::Idle;
        }
    }
}
