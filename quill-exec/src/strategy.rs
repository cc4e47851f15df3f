use async_trait::async_trait;

use crate::error::StrategyError;
use crate::language::Language;
use crate::outcome::RunResult;

/// One way of turning source code into a [`RunResult`].
#[async_trait]
pub trait ExecutionStrategy: Send + Sync {
    async fn execute(&self, source: &str, language: &Language) -> Result<RunResult, StrategyError>;

    /// Whether this strategy can run `language` at all.
    fn supports(&self, _language: &Language) -> bool {
        true
    }
}
