use anyhow::Result;
use clap::{Arg, Command};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cmd;
mod config;

fn cli() -> Command {
    Command::new("quill")
        .about("Compose, preview and run rich blog content")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file")
                .global(true),
        )
        .subcommand(cmd::insert::make_subcommand())
        .subcommand(cmd::preview::make_subcommand())
        .subcommand(cmd::run::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("insert", args)) => cmd::insert::execute(args)?,
        Some(("preview", args)) => cmd::preview::execute(args)?,
        Some(("run", args)) => {
            if !cmd::run::execute(args).await? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(("serve", args)) => cmd::serve::execute(args).await?,
        _ => return Ok(ExitCode::FAILURE),
    }

    Ok(ExitCode::SUCCESS)
}
