use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, value_parser};
use quill_core::config::EditorConfig;
use quill_core::{Alignment, ContentBlock, ImageLayout, append, insert_at};
use std::path::PathBuf;

use crate::config::QuillConfig;

pub fn make_subcommand() -> Command {
    Command::new("insert")
        .about("Insert a content block into a document")
        .arg(
            Arg::new("document")
                .value_name("DOC")
                .help("Document file to edit (created if missing)")
                .required(true),
        )
        .arg(
            Arg::new("image")
                .long("image")
                .value_name("URL")
                .help("Insert an image block"),
        )
        .arg(
            Arg::new("video")
                .long("video")
                .value_name("URL")
                .help("Insert a YouTube embed"),
        )
        .arg(
            Arg::new("code")
                .long("code")
                .value_name("FILE")
                .help("Insert a code block with the contents of FILE"),
        )
        .arg(
            Arg::new("ad")
                .long("ad")
                .help("Insert an ad placeholder")
                .action(ArgAction::SetTrue),
        )
        .group(
            ArgGroup::new("block")
                .args(["image", "video", "code", "ad"])
                .required(true),
        )
        .arg(Arg::new("caption").long("caption").requires("image"))
        .arg(
            Arg::new("layout")
                .long("layout")
                .help("full, float-left, float-right or side-by-side")
                .requires("image"),
        )
        .arg(
            Arg::new("align")
                .long("align")
                .help("left, center or right")
                .requires("image"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .help("Image width in percent, 20 to 100")
                .value_parser(value_parser!(u32))
                .requires("image"),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .requires("code"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .help("Make the code block runnable")
                .action(ArgAction::SetTrue)
                .requires("code"),
        )
        .arg(
            Arg::new("slot")
                .long("slot")
                .value_name("ID")
                .help("Ad slot id")
                .requires("ad"),
        )
        .arg(
            Arg::new("cursor")
                .long("cursor")
                .value_name("OFFSET")
                .help("Byte offset to insert at instead of appending")
                .value_parser(value_parser!(usize)),
        )
}

pub fn execute(args: &ArgMatches) -> Result<()> {
    let config = QuillConfig::load(args)?;
    let document = PathBuf::from(
        args.get_one::<String>("document")
            .context("missing document path")?,
    );

    let block = block_from_args(args, &config.editor)?;
    let fragment = block.serialize();

    let current = if document.exists() {
        std::fs::read_to_string(&document)
            .with_context(|| format!("reading {}", document.display()))?
    } else {
        String::new()
    };

    let updated = match args.get_one::<usize>("cursor") {
        Some(&cursor) => insert_at(&current, cursor, &fragment)?,
        None => append(&current, &fragment)?,
    };

    std::fs::write(&document, updated)
        .with_context(|| format!("writing {}", document.display()))?;
    println!("Inserted {} block into {}", kind(&block), document.display());

    Ok(())
}

fn block_from_args(args: &ArgMatches, editor: &EditorConfig) -> Result<ContentBlock> {
    if let Some(url) = args.get_one::<String>("image") {
        let layout = match args.get_one::<String>("layout") {
            Some(layout) => layout.parse::<ImageLayout>()?,
            None => ImageLayout::default(),
        };
        let alignment = args
            .get_one::<String>("align")
            .map(|a| a.parse::<Alignment>())
            .transpose()?;
        let width = args
            .get_one::<u32>("width")
            .copied()
            .unwrap_or(editor.default_image_width);
        let caption = args.get_one::<String>("caption").map(String::as_str);

        return Ok(ContentBlock::image(url, caption, layout, alignment, width)?);
    }

    if let Some(url) = args.get_one::<String>("video") {
        return Ok(ContentBlock::video(url)?);
    }

    if let Some(file) = args.get_one::<String>("code") {
        let source =
            std::fs::read_to_string(file).with_context(|| format!("reading {}", file))?;
        let language = args
            .get_one::<String>("language")
            .unwrap_or(&editor.default_language);
        let interactive = args.get_flag("interactive");
        return Ok(ContentBlock::code(language, &source, interactive)?);
    }

    if args.get_flag("ad") {
        let slot = args
            .get_one::<String>("slot")
            .map(String::as_str)
            .unwrap_or(editor.ad_slot.as_str());
        return Ok(ContentBlock::ad(Some(slot)));
    }

    bail!("no block to insert")
}

fn kind(block: &ContentBlock) -> &'static str {
    match block {
        ContentBlock::Image { .. } => "image",
        ContentBlock::Video { .. } => "video",
        ContentBlock::Code {
            interactive: true, ..
        } => "interactive code",
        ContentBlock::Code { .. } => "code",
        ContentBlock::Ad { .. } => "ad",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(argv: &[&str]) -> ArgMatches {
        let mut full = vec!["insert"];
        full.extend_from_slice(argv);
        make_subcommand().try_get_matches_from(full).unwrap()
    }

    #[test]
    fn test_image_flags() {
        let args = matches(&[
            "post.html",
            "--image",
            " https://cdn.example.com/a.png ",
            "--layout",
            "float-left",
            "--width",
            "5",
        ]);
        let block = block_from_args(&args, &EditorConfig::default()).unwrap();

        assert_eq!(
            block,
            ContentBlock::Image {
                url: "https://cdn.example.com/a.png".into(),
                caption: None,
                layout: ImageLayout::FloatLeft,
                alignment: None,
                width_percent: 20,
            }
        );
    }

    #[test]
    fn test_bad_video_url() {
        let args = matches(&["post.html", "--video", "https://vimeo.com/12345"]);
        let err = block_from_args(&args, &EditorConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid YouTube URL"));
    }

    #[test]
    fn test_ad_uses_configured_slot() {
        let editor = EditorConfig {
            ad_slot: "1234567890".into(),
            ..EditorConfig::default()
        };
        let block = block_from_args(&matches(&["post.html", "--ad"]), &editor).unwrap();
        assert!(block.serialize().contains("data-ad-slot=\"1234567890\""));
    }

    #[test]
    fn test_one_block_kind_required() {
        let err = make_subcommand()
            .try_get_matches_from(["insert", "post.html", "--ad", "--video", "x"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);

        assert!(
            make_subcommand()
                .try_get_matches_from(["insert", "post.html"])
                .is_err()
        );
    }

    #[test]
    fn test_append_and_cursor_insert() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("post.html");
        let snippet = dir.path().join("hello.py");
        std::fs::write(&doc, "<p>Intro</p>").unwrap();
        std::fs::write(&snippet, "print('hi')").unwrap();
        let doc_arg = doc.to_str().unwrap();

        execute(&matches(&[
            doc_arg,
            "--code",
            snippet.to_str().unwrap(),
            "--language",
            "Python",
            "--interactive",
        ]))
        .unwrap();

        let content = std::fs::read_to_string(&doc).unwrap();
        assert!(content.starts_with("<p>Intro</p>\n\n<div class=\"blog-code-interactive\""));
        assert!(content.ends_with("\n\n"));
        assert!(content.contains("data-language=\"python\""));

        execute(&matches(&[doc_arg, "--ad", "--cursor", "0"])).unwrap();
        let content = std::fs::read_to_string(&doc).unwrap();
        assert!(content.starts_with("\n\n<div class=\"google-ad-placeholder\""));
        assert!(content.contains("<p>Intro</p>"));
    }

    #[test]
    fn test_invalid_block_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("post.html");
        std::fs::write(&doc, "<p>Intro</p>").unwrap();

        let result = execute(&matches(&[doc.to_str().unwrap(), "--image", "   "]));
        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&doc).unwrap(), "<p>Intro</p>");
    }
}
