use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use quill_core::config::RunnerConfig;

use crate::error::StrategyError;
use crate::language::Language;
use crate::outcome::RunResult;
use crate::strategy::ExecutionStrategy;

const SUBMISSIONS_PATH: &str = "/submissions?base64_encoded=false&wait=true";

#[derive(Debug, Serialize)]
struct Submission<'a> {
    source_code: &'a str,
    language_id: u32,
    stdin: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmissionResult {
    #[serde(default)]
    stdout: Option<String>,
    #[serde(default)]
    stderr: Option<String>,
    #[serde(default)]
    compile_output: Option<String>,
}

/// Runs code on a Judge0-compatible service and waits for the verdict.
///
/// No client-side timeout is applied; the request lasts as long as the
/// service takes to answer.
#[derive(Debug, Clone)]
pub struct RemoteStrategy {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    api_host: Option<String>,
}

impl RemoteStrategy {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: None,
            api_host: None,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Self {
        let mut remote = Self::new(&config.endpoint);
        remote.api_key = config.api_key.clone().filter(|k| !k.is_empty());
        remote.api_host = config.api_host.clone().filter(|h| !h.is_empty());
        remote
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ExecutionStrategy for RemoteStrategy {
    async fn execute(&self, source: &str, language: &Language) -> Result<RunResult, StrategyError> {
        let url = format!("{}{}", self.endpoint, SUBMISSIONS_PATH);
        debug!("Submitting {} snippet to {}", language.name, url);

        let mut request = self.client.post(&url).json(&Submission {
            source_code: source,
            language_id: language.id,
            stdin: "",
        });
        if let Some(key) = &self.api_key {
            request = request.header("X-RapidAPI-Key", key);
        }
        if let Some(host) = &self.api_host {
            request = request.header("X-RapidAPI-Host", host);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Execution service answered {}", status);
            return Err(StrategyError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let result: SubmissionResult =
            serde_json::from_str(&body).map_err(|e| StrategyError::Malformed(e.to_string()))?;

        Ok(RunResult::from_fields(
            result.stdout,
            result.stderr,
            result.compile_output,
        ))
    }
}
