use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use quill_core::{Highlighter, PageContext, PageRenderer, render};
use std::path::{Path, PathBuf};

use crate::config::QuillConfig;

pub fn make_subcommand() -> Command {
    Command::new("preview")
        .about("Render a document to a standalone HTML page")
        .arg(
            Arg::new("document")
                .value_name("DOC")
                .help("Document file to render")
                .required_unless_present("list-themes"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Where to write the page (default: <DOC>.preview.html)"),
        )
        .arg(
            Arg::new("theme")
                .short('t')
                .long("theme")
                .value_name("NAME")
                .help("Syntax highlighting theme"),
        )
        .arg(
            Arg::new("stylesheet")
                .long("stylesheet")
                .value_name("HREF")
                .help("Stylesheet to link from the page")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("templates")
                .long("templates")
                .value_name("DIR")
                .help("Directory of Tera templates; its page.html replaces the built-in page"),
        )
        .arg(
            Arg::new("list-themes")
                .long("list-themes")
                .help("Print the available syntax themes and exit")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("document"),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    if args.get_flag("list-themes") {
        for name in theme_names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = QuillConfig::load(args)?;
    let document = PathBuf::from(
        args.get_one::<String>("document")
            .context("missing document path")?,
    );
    let output = args
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output(&document));

    let markup = std::fs::read_to_string(&document)
        .with_context(|| format!("reading {}", document.display()))?;

    let highlighter = Highlighter::new(&config.preview.syntax_theme);
    let rendered = render(&highlighter, &markup);

    let stylesheets = args
        .get_many::<String>("stylesheet")
        .map(|sheets| sheets.cloned().collect())
        .unwrap_or_default();

    let renderer = match args.get_one::<String>("templates") {
        Some(dir) => PageRenderer::from_glob(&format!("{}/**/*.html", dir))
            .with_context(|| format!("loading templates from {}", dir))?,
        None => PageRenderer::new()?,
    };

    renderer.render_to_file(
        &PageContext {
            title: &config.preview.title,
            content: &rendered.html,
            run_endpoint: None,
            stylesheets,
        },
        &output,
    )?;

    println!(
        "Rendered {} ({} code blocks, {} runnable) to {}",
        document.display(),
        rendered.code.len(),
        rendered.runnable().count(),
        output.display()
    );

    Ok(())
}

fn theme_names() -> Vec<&'static str> {
    let mut names = Highlighter::theme_names();
    names.sort_unstable();
    names
}

fn default_output(document: &Path) -> PathBuf {
    document.with_extension("preview.html")
}
