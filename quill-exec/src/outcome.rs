use serde::{Deserialize, Serialize};

/// Shown when a run finishes without printing anything.
pub const NO_OUTPUT: &str = "No output";

/// What a single run produced. At most one field is ever set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    stdout: Option<String>,
    stderr: Option<String>,
    compile_error: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl RunResult {
    /// Keep the first non-empty field in the order stdout, stderr, compile output.
    pub fn from_fields(
        stdout: Option<String>,
        stderr: Option<String>,
        compile_error: Option<String>,
    ) -> Self {
        if let Some(out) = non_empty(stdout) {
            Self::stdout(out)
        } else if let Some(err) = non_empty(stderr) {
            Self::stderr(err)
        } else if let Some(err) = non_empty(compile_error) {
            Self::compile_error(err)
        } else {
            Self::default()
        }
    }

    pub fn stdout(out: impl Into<String>) -> Self {
        Self {
            stdout: Some(out.into()),
            ..Self::default()
        }
    }

    pub fn stderr(err: impl Into<String>) -> Self {
        Self {
            stderr: Some(err.into()),
            ..Self::default()
        }
    }

    pub fn compile_error(err: impl Into<String>) -> Self {
        Self {
            compile_error: Some(err.into()),
            ..Self::default()
        }
    }

    pub fn get_stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    pub fn get_stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    pub fn get_compile_error(&self) -> Option<&str> {
        self.compile_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none() && self.compile_error.is_none()
    }

    pub fn into_outcome(self) -> RunOutcome {
        match self {
            RunResult {
                stdout: Some(out), ..
            } => RunOutcome::Succeeded(out),
            RunResult {
                stderr: Some(err), ..
            } => RunOutcome::Failed(format!("Error:\n{}", err)),
            RunResult {
                compile_error: Some(err),
                ..
            } => RunOutcome::Failed(format!("Compilation Error:\n{}", err)),
            _ => RunOutcome::Succeeded(NO_OUTPUT.to_string()),
        }
    }
}

/// Text to display under a code block once a run settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "output", rename_all = "lowercase")]
pub enum RunOutcome {
    Succeeded(String),
    Failed(String),
}

impl RunOutcome {
    pub fn output(&self) -> &str {
        match self {
            RunOutcome::Succeeded(out) | RunOutcome::Failed(out) => out,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Succeeded(_))
    }
}
