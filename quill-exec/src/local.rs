//! JavaScript runs without the remote service.
//!
//! Each run gets a fresh Node process with nothing but `PATH` in its
//! environment. The harness drops `require`, `module` and `process` from the
//! host global, then evaluates the snippet in a `vm` context built on a
//! null-prototype object. Its `console` is defined by a bootstrap script run
//! inside that context, so no host-realm object is reachable from the
//! snippet. Promise callbacks and unhandled rejections are collected before
//! the report is written.
//!
//! The vm timeout stops runaway synchronous code; the process is killed if it
//! outlives the grace period on top of that.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use quill_core::config::RunnerConfig;

use crate::error::StrategyError;
use crate::language::{JAVASCRIPT, Language};
use crate::outcome::RunResult;
use crate::strategy::ExecutionStrategy;

const TIMEOUT_ENV: &str = "QUILL_SANDBOX_TIMEOUT_MS";
const KILL_GRACE: Duration = Duration::from_secs(2);

const SANDBOX_SCRIPT: &str = r#"
const vm = require('vm');
const proc = process;
for (const name of ['require', 'module', 'exports', '__filename', '__dirname', 'process', 'Buffer']) {
    delete globalThis[name];
}

const BOOTSTRAP = `(() => {
    const logs = [];
    let error = null;
    const stringify = JSON.stringify;
    const describe = (e) => {
        try {
            return (e && e.message !== undefined) ? String(e.message) : String(e);
        } catch (_) {
            return 'Uncaught exception';
        }
    };
    const capture = (...args) => {
        logs.push(args.map((arg) =>
            typeof arg === 'object' ? stringify(arg, null, 2) : String(arg)
        ).join(' '));
    };
    globalThis.console = { log: capture, info: capture, warn: capture, error: capture };
    return {
        fail(e) { if (error === null) error = describe(e); },
        report() { return stringify({ logs, error }); },
    };
})()`;

let source = '';
let hooks = null;
let reported = false;

const fail = (e) => {
    if (hooks === null) return;
    hooks.fail(e instanceof Error ? String(e.message) : e);
};

proc.on('unhandledRejection', fail);
proc.on('uncaughtException', fail);
proc.on('beforeExit', () => {
    if (reported) return;
    reported = true;
    let report;
    try {
        report = hooks === null ? undefined : hooks.report();
    } catch (_) {
        report = undefined;
    }
    proc.stdout.write(typeof report === 'string' ? report : '{"logs":[],"error":"Sandbox produced no report"}');
});

proc.stdin.setEncoding('utf8');
proc.stdin.on('data', (chunk) => { source += chunk; });
proc.stdin.on('end', () => {
    const timeout = Number(proc.env.QUILL_SANDBOX_TIMEOUT_MS) || 5000;
    const context = vm.createContext(Object.create(null));
    hooks = vm.runInContext(BOOTSTRAP, context, { timeout });
    try {
        vm.runInContext(source, context, { timeout, filename: 'snippet.js' });
    } catch (e) {
        fail(e);
    }
});
"#;

#[derive(Debug, Deserialize)]
struct SandboxReport {
    logs: Vec<String>,
    error: Option<String>,
}

impl SandboxReport {
    fn into_result(self) -> RunResult {
        match self.error {
            Some(message) => RunResult::stderr(message),
            None if self.logs.is_empty() => RunResult::default(),
            None => RunResult::stdout(self.logs.join("\n")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalStrategy {
    node_binary: String,
    timeout: Duration,
}

impl LocalStrategy {
    pub fn new(node_binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            node_binary: node_binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        Self::new(
            &config.node_binary,
            Duration::from_millis(config.local_timeout_ms),
        )
    }
}

#[async_trait]
impl ExecutionStrategy for LocalStrategy {
    async fn execute(&self, source: &str, language: &Language) -> Result<RunResult, StrategyError> {
        if !self.supports(language) {
            return Err(StrategyError::Unhandled(language.display));
        }

        debug!("Running snippet locally with {}", self.node_binary);
        let mut command = Command::new(&self.node_binary);
        command
            .arg("-e")
            .arg(SANDBOX_SCRIPT)
            .env_clear()
            .env(TIMEOUT_ENV, self.timeout.as_millis().to_string());
        // Version-manager shims resolve the real interpreter through PATH
        if let Some(path) = std::env::var_os("PATH") {
            command.env("PATH", path);
        }

        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StrategyError::Sandbox("stdin unavailable".into()))?;
        stdin.write_all(source.as_bytes()).await?;
        drop(stdin);

        let limit = self.timeout + KILL_GRACE;
        let output = tokio::time::timeout(limit, child.wait_with_output())
            .await
            .map_err(|_| StrategyError::Timeout(self.timeout))??;

        // A written report wins over the exit status
        match serde_json::from_slice::<SandboxReport>(&output.stdout) {
            Ok(report) => Ok(report.into_result()),
            Err(_) if !output.status.success() => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(StrategyError::Sandbox(stderr.trim().to_string()))
            }
            Err(e) => Err(StrategyError::Sandbox(format!(
                "unreadable sandbox report: {}",
                e
            ))),
        }
    }

    fn supports(&self, language: &Language) -> bool {
        language.name == JAVASCRIPT.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::lookup_language;

    fn node_available() -> bool {
        std::process::Command::new("node")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn strategy() -> LocalStrategy {
        LocalStrategy::new("node", Duration::from_millis(1000))
    }

    #[test]
    fn test_report_mapping() {
        let report = SandboxReport {
            logs: vec!["a".into(), "b".into()],
            error: None,
        };
        assert_eq!(report.into_result(), RunResult::stdout("a\nb"));

        let report = SandboxReport {
            logs: vec!["ignored".into()],
            error: Some("x is not defined".into()),
        };
        assert_eq!(report.into_result(), RunResult::stderr("x is not defined"));

        let report = SandboxReport {
            logs: vec![],
            error: None,
        };
        assert!(report.into_result().is_empty());
    }

    #[test]
    fn test_only_javascript_is_supported() {
        let local = strategy();
        assert!(local.supports(lookup_language("javascript").unwrap()));
        assert!(!local.supports(lookup_language("python").unwrap()));
    }

    #[tokio::test]
    async fn test_missing_interpreter() {
        let local = LocalStrategy::new("/no/such/node-binary", Duration::from_millis(100));
        let err = local
            .execute("console.log(1)", JAVASCRIPT)
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_captures_console() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute("console.log('hi', 2); console.log({a: 1})", JAVASCRIPT)
            .await
            .unwrap();
        assert_eq!(result.get_stdout(), Some("hi 2\n{\n  \"a\": 1\n}"));
    }

    #[tokio::test]
    async fn test_thrown_error_is_captured() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute("throw new Error('boom')", JAVASCRIPT)
            .await
            .unwrap();
        assert_eq!(result.get_stderr(), Some("boom"));
    }

    #[tokio::test]
    async fn test_no_host_access() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute("require('fs')", JAVASCRIPT)
            .await
            .unwrap();
        assert_eq!(result.get_stderr(), Some("require is not defined"));
    }

    #[tokio::test]
    async fn test_host_realm_is_unreachable() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute(
                "console.log(this.constructor.constructor('return typeof process')());\n\
                 console.log(console.log.constructor('return typeof require')());",
                JAVASCRIPT,
            )
            .await
            .unwrap();
        assert_eq!(result.get_stdout(), Some("undefined\nundefined"));

        let result = strategy()
            .execute(
                "const r = this.constructor.constructor('return require')();\n\
                 console.log(r('fs').readFileSync('/etc/hostname', 'utf8').length > 0);",
                JAVASCRIPT,
            )
            .await
            .unwrap();
        assert_eq!(result.get_stdout(), None);
        assert!(result.get_stderr().is_some());
    }

    #[tokio::test]
    async fn test_promise_callbacks_are_captured() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute("Promise.resolve().then(() => console.log('micro'));", JAVASCRIPT)
            .await
            .unwrap();
        assert_eq!(result.get_stdout(), Some("micro"));
    }

    #[tokio::test]
    async fn test_unhandled_rejection_is_reported() {
        if !node_available() {
            return;
        }
        let result = strategy()
            .execute(
                "console.log('before'); Promise.reject(new Error('late'));",
                JAVASCRIPT,
            )
            .await
            .unwrap();
        assert_eq!(result.get_stderr(), Some("late"));
    }

    #[tokio::test]
    async fn test_infinite_loop_is_stopped() {
        if !node_available() {
            return;
        }
        let result = strategy().execute("while (true) {}", JAVASCRIPT).await.unwrap();
        assert!(result.get_stderr().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn test_silent_snippet() {
        if !node_available() {
            return;
        }
        let result = strategy().execute("let x = 1 + 1;", JAVASCRIPT).await.unwrap();
        assert!(result.is_empty());
    }
}
