use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use quill_exec::Executor;
use std::io::Read;

use crate::config::QuillConfig;

pub fn make_subcommand() -> Command {
    Command::new("run")
        .about("Execute a code snippet the way an interactive block would")
        .arg(
            Arg::new("language")
                .value_name("LANG")
                .help("Language of the snippet, e.g. python or javascript")
                .required(true),
        )
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("Source file (reads stdin when omitted)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the outcome as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .value_name("URL")
                .help("Remote execution service base URL"),
        )
}

/// Returns whether the run succeeded.
pub async fn execute(args: &ArgMatches) -> Result<bool> {
    let config = QuillConfig::load(args)?;
    let language = args
        .get_one::<String>("language")
        .context("missing language")?;

    let source = match args.get_one::<String>("file") {
        Some(file) => {
            std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let executor = Executor::from_config(&config.runner);
    let outcome = executor.execute(language, &source).await?;

    if args.get_flag("json") {
        println!("{}", serde_json::to_string(&outcome)?);
    } else if outcome.is_success() {
        println!("{}", outcome.output());
    } else {
        eprintln!("{}", outcome.output());
    }

    Ok(outcome.is_success())
}
