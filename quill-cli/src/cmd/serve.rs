use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command, value_parser};
use quill_dev_server::{LiveServer, LiveServerConfig};
use quill_exec::Executor;
use std::path::PathBuf;

use crate::config::QuillConfig;

pub fn make_subcommand() -> Command {
    Command::new("serve")
        .about("Preview a document with live reload and runnable code blocks")
        .arg(
            Arg::new("document")
                .value_name("DOC")
                .help("Document file to preview")
                .required(true),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Port to serve on")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("Host to bind to"),
        )
        .arg(
            Arg::new("assets")
                .short('a')
                .long("assets")
                .value_name("DIR")
                .help("Directory served alongside the page"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("NAME")
                .help("Syntax highlighting theme"),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open browser automatically")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn execute(args: &ArgMatches) -> Result<()> {
    let config = QuillConfig::load(args)?;
    let document = PathBuf::from(
        args.get_one::<String>("document")
            .context("missing document path")?,
    );

    let server_config = LiveServerConfig {
        host: config.serve.host.clone(),
        port: config.serve.port,
        document,
        assets: config.serve.assets.as_ref().map(PathBuf::from),
        open: config.serve.open,
        title: config.preview.title.clone(),
        syntax_theme: config.preview.syntax_theme.clone(),
        stylesheets: vec![],
    };

    LiveServer::new(server_config, Executor::from_config(&config.runner))
        .run()
        .await
}
