use anyhow::Result;
use clap::ArgMatches;
use config::{Config as ConfigBuilder, Environment, File};
use quill_core::config::{EditorConfig, PreviewConfig, RunnerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "quill.toml";

/// Complete configuration that merges CLI args, env vars, config files, and defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QuillConfig {
    pub serve: ServeConfig,
    pub editor: EditorConfig,
    pub preview: PreviewConfig,
    pub runner: RunnerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServeConfig {
    /// Host for dev server
    pub host: String,
    /// Port for dev server
    pub port: u16,
    /// Open browser automatically
    pub open: bool,
    /// Directory served next to the preview page
    pub assets: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
            assets: None,
        }
    }
}

impl QuillConfig {
    /// Load configuration with cascading precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables (QUILL_*)
    /// 3. Configuration file
    /// 4. Defaults (lowest priority)
    pub fn load(args: &ArgMatches) -> Result<Self> {
        let config_file = arg::<String>(args, "config")
            .cloned()
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = ConfigBuilder::builder();

        builder = builder.add_source(ConfigBuilder::try_from(&Self::default())?);

        if Path::new(&config_file).exists() {
            debug!("Reading configuration from {}", config_file);
            builder = builder.add_source(File::from(Path::new(&config_file)));
        }

        // QUILL_RUNNER__API_KEY -> runner.api_key
        builder = builder.add_source(
            Environment::with_prefix("QUILL")
                .prefix_separator("_")
                .separator("__"),
        );

        // Only the flags defined for the running subcommand are present
        if let Some(host) = arg::<String>(args, "host") {
            builder = builder.set_override("serve.host", host.as_str())?;
        }
        if let Some(port) = arg::<u16>(args, "port") {
            builder = builder.set_override("serve.port", i64::from(*port))?;
        }
        if arg::<bool>(args, "open").copied().unwrap_or(false) {
            builder = builder.set_override("serve.open", true)?;
        }
        if let Some(assets) = arg::<String>(args, "assets") {
            builder = builder.set_override("serve.assets", assets.as_str())?;
        }
        if let Some(theme) = arg::<String>(args, "theme") {
            builder = builder.set_override("preview.syntax_theme", theme.as_str())?;
        }
        if let Some(endpoint) = arg::<String>(args, "endpoint") {
            builder = builder.set_override("runner.endpoint", endpoint.as_str())?;
        }

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}

fn arg<'a, T: Clone + Send + Sync + 'static>(args: &'a ArgMatches, id: &str) -> Option<&'a T> {
    args.try_get_one::<T>(id).ok().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{Arg, ArgAction, Command, value_parser};

    fn command() -> Command {
        Command::new("test")
            .arg(Arg::new("config").long("config").value_name("FILE"))
            .arg(Arg::new("host").long("host"))
            .arg(Arg::new("port").long("port").value_parser(value_parser!(u16)))
            .arg(Arg::new("open").long("open").action(ArgAction::SetTrue))
    }

    #[test]
    fn test_default_config() {
        let config = QuillConfig::default();
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.serve.host, "127.0.0.1");
        assert_eq!(config.editor.ad_slot, "YOUR_AD_SLOT_ID");
        assert_eq!(config.runner, RunnerConfig::default());
    }

    #[test]
    fn test_cli_args_override() {
        let matches = command()
            .try_get_matches_from(vec!["test", "--port", "4000", "--open"])
            .unwrap();

        let config = QuillConfig::load(&matches).unwrap();
        assert_eq!(config.serve.port, 4000);
        assert!(config.serve.open);
        // Should still have defaults for non-overridden values
        assert_eq!(config.serve.host, "127.0.0.1");
        assert_eq!(config.runner.local_timeout_ms, 5000);
    }

    #[test]
    fn test_file_then_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(
            &path,
            r#"
            [serve]
            port = 8080
            host = "0.0.0.0"

            [editor]
            ad_slot = "1234567890"

            [runner]
            node_binary = "/opt/node/bin/node"
            "#,
        )
        .unwrap();

        let matches = command()
            .try_get_matches_from(vec![
                "test",
                "--config",
                path.to_str().unwrap(),
                "--host",
                "localhost",
            ])
            .unwrap();

        let config = QuillConfig::load(&matches).unwrap();
        assert_eq!(config.serve.port, 8080);
        assert_eq!(config.serve.host, "localhost");
        assert_eq!(config.editor.ad_slot, "1234567890");
        assert_eq!(config.editor.default_language, "javascript");
        assert_eq!(config.runner.node_binary, "/opt/node/bin/node");
    }
}
