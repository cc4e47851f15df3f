use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::extract::extract_video_id;

pub const MIN_IMAGE_WIDTH: u32 = 20;
pub const MAX_IMAGE_WIDTH: u32 = 100;

/// Slot identifier used when an ad block does not name one.
pub const DEFAULT_AD_SLOT: &str = "YOUR_AD_SLOT_ID";

const DEFAULT_IMAGE_ALT: &str = "Blog image";

/// Languages the editor lets an author tag a code block with.
pub const EDITOR_LANGUAGES: [&str; 14] = [
    "javascript",
    "python",
    "java",
    "cpp",
    "c",
    "csharp",
    "php",
    "ruby",
    "go",
    "rust",
    "html",
    "css",
    "sql",
    "bash",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    EmptyField(&'static str),
    InvalidVideoUrl(String),
    UnknownLanguage(String),
    UnknownLayout(String),
    UnknownAlignment(String),
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockError::EmptyField(field) => write!(f, "Missing required field: {}", field),
            BlockError::InvalidVideoUrl(url) => write!(f, "Invalid YouTube URL: {}", url),
            BlockError::UnknownLanguage(lang) => write!(
                f,
                "Unknown code language '{}', expected one of: {}",
                lang,
                EDITOR_LANGUAGES.join(", ")
            ),
            BlockError::UnknownLayout(layout) => write!(
                f,
                "Unknown image layout '{}', expected full, float-left, float-right or side-by-side",
                layout
            ),
            BlockError::UnknownAlignment(align) => write!(
                f,
                "Unknown image alignment '{}', expected left, center or right",
                align
            ),
        }
    }
}

impl std::error::Error for BlockError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageLayout {
    #[default]
    Full,
    FloatLeft,
    FloatRight,
    SideBySide,
}

impl FromStr for ImageLayout {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(ImageLayout::Full),
            "float-left" => Ok(ImageLayout::FloatLeft),
            "float-right" => Ok(ImageLayout::FloatRight),
            "side-by-side" => Ok(ImageLayout::SideBySide),
            other => Err(BlockError::UnknownLayout(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl FromStr for Alignment {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" => Ok(Alignment::Left),
            "center" => Ok(Alignment::Center),
            "right" => Ok(Alignment::Right),
            other => Err(BlockError::UnknownAlignment(other.to_string())),
        }
    }
}

/// A structured unit of authored content.
///
/// Blocks are built through the validating constructors ([`ContentBlock::image`],
/// [`ContentBlock::video`], [`ContentBlock::code`], [`ContentBlock::ad`]).
/// Deserialization goes through the same constructors, so a block read from
/// JSON or TOML is rejected exactly when the constructor would reject it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase", try_from = "RawBlock")]
pub enum ContentBlock {
    Image {
        url: String,
        caption: Option<String>,
        layout: ImageLayout,
        alignment: Option<Alignment>,
        width_percent: u32,
    },
    Video {
        source_url: String,
        extracted_id: String,
    },
    Code {
        language: String,
        source: String,
        interactive: bool,
    },
    Ad {
        slot_id: Option<String>,
    },
}

/// Wire shape of a block before validation. A stored `extracted_id` is
/// ignored and derived again from the URL.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum RawBlock {
    Image {
        url: String,
        #[serde(default)]
        caption: Option<String>,
        #[serde(default)]
        layout: ImageLayout,
        #[serde(default)]
        alignment: Option<Alignment>,
        #[serde(default = "default_width")]
        width_percent: u32,
    },
    Video {
        source_url: String,
    },
    Code {
        language: String,
        source: String,
        #[serde(default)]
        interactive: bool,
    },
    Ad {
        #[serde(default)]
        slot_id: Option<String>,
    },
}

fn default_width() -> u32 {
    MAX_IMAGE_WIDTH
}

impl TryFrom<RawBlock> for ContentBlock {
    type Error = BlockError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        match raw {
            RawBlock::Image {
                url,
                caption,
                layout,
                alignment,
                width_percent,
            } => ContentBlock::image(&url, caption.as_deref(), layout, alignment, width_percent),
            RawBlock::Video { source_url } => ContentBlock::video(&source_url),
            RawBlock::Code {
                language,
                source,
                interactive,
            } => ContentBlock::code(&language, &source, interactive),
            RawBlock::Ad { slot_id } => Ok(ContentBlock::ad(slot_id.as_deref())),
        }
    }
}

impl ContentBlock {
    /// Build an image block. Widths outside `[20, 100]` are clamped.
    pub fn image(
        url: &str,
        caption: Option<&str>,
        layout: ImageLayout,
        alignment: Option<Alignment>,
        width_percent: u32,
    ) -> Result<Self, BlockError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(BlockError::EmptyField("url"));
        }

        Ok(ContentBlock::Image {
            url: url.to_string(),
            caption: caption
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(String::from),
            layout,
            alignment,
            width_percent: clamp_width(width_percent),
        })
    }

    pub fn video(source_url: &str) -> Result<Self, BlockError> {
        let source_url = source_url.trim();
        if source_url.is_empty() {
            return Err(BlockError::EmptyField("url"));
        }

        let extracted_id = extract_video_id(source_url)
            .ok_or_else(|| BlockError::InvalidVideoUrl(source_url.to_string()))?;

        Ok(ContentBlock::Video {
            source_url: source_url.to_string(),
            extracted_id,
        })
    }

    pub fn code(language: &str, source: &str, interactive: bool) -> Result<Self, BlockError> {
        if source.is_empty() {
            return Err(BlockError::EmptyField("source"));
        }

        let language = language.trim().to_lowercase();
        if !EDITOR_LANGUAGES.contains(&language.as_str()) {
            return Err(BlockError::UnknownLanguage(language));
        }

        Ok(ContentBlock::Code {
            language,
            source: source.to_string(),
            interactive,
        })
    }

    pub fn ad(slot_id: Option<&str>) -> Self {
        ContentBlock::Ad {
            slot_id: slot_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
        }
    }

    pub fn is_runnable(&self) -> bool {
        matches!(
            self,
            ContentBlock::Code {
                interactive: true,
                ..
            }
        )
    }

    /// Produce the markup fragment persisted for this block.
    pub fn serialize(&self) -> String {
        match self {
            ContentBlock::Image {
                url,
                caption,
                layout,
                alignment,
                width_percent,
            } => serialize_image(
                url,
                caption.as_deref(),
                *layout,
                alignment.unwrap_or_default(),
                clamp_width(*width_percent),
            ),
            ContentBlock::Video { extracted_id, .. } => serialize_video(extracted_id),
            ContentBlock::Code {
                language,
                source,
                interactive,
            } => {
                if *interactive {
                    serialize_interactive_code(language, source)
                } else {
                    serialize_static_code(language, source)
                }
            }
            ContentBlock::Ad { slot_id } => {
                serialize_ad(slot_id.as_deref().unwrap_or(DEFAULT_AD_SLOT))
            }
        }
    }
}

pub fn clamp_width(width: u32) -> u32 {
    width.clamp(MIN_IMAGE_WIDTH, MAX_IMAGE_WIDTH)
}

/// Escape text for embedding in markup: `& < > " '` and nothing else.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn image_element(url: &str, caption: Option<&str>, style: Option<String>) -> String {
    let alt = escape_html(caption.unwrap_or(DEFAULT_IMAGE_ALT));
    let style = style
        .map(|s| format!(" style=\"{}\"", s))
        .unwrap_or_default();
    format!("<img src=\"{}\" alt=\"{}\"{} />", escape_html(url), alt, style)
}

fn caption_element(caption: Option<&str>) -> String {
    caption
        .map(|c| format!("<p class=\"image-caption\">{}</p>", escape_html(c)))
        .unwrap_or_default()
}

fn serialize_image(
    url: &str,
    caption: Option<&str>,
    layout: ImageLayout,
    alignment: Alignment,
    width: u32,
) -> String {
    match layout {
        ImageLayout::Full => format!(
            "<div class=\"blog-image blog-image-full\" style=\"text-align: {};\">\n    {}\n    {}\n</div>",
            alignment.as_str(),
            image_element(url, caption, Some(format!("max-width: {}%;", width))),
            caption_element(caption),
        ),
        ImageLayout::FloatLeft | ImageLayout::FloatRight => {
            let side = if layout == ImageLayout::FloatLeft {
                "left"
            } else {
                "right"
            };
            format!(
                "<div class=\"blog-image blog-image-float-{}\" style=\"width: {}%;\">\n    {}\n    {}\n</div>\n<div class=\"blog-float-text\">\n    <p>Add your text here - it will wrap around the image!</p>\n</div>\n<div style=\"clear: both;\"></div>",
                side,
                width,
                image_element(url, caption, None),
                caption_element(caption),
            )
        }
        ImageLayout::SideBySide => format!(
            "<div class=\"blog-image-grid\">\n    <div class=\"blog-image-grid-item\">\n        {}\n        {}\n    </div>\n    <div class=\"blog-image-grid-item\">\n        <p><strong>Add content here!</strong></p>\n        <p>You can put text, another image, or any content beside the image.</p>\n    </div>\n</div>",
            image_element(url, caption, None),
            caption_element(caption),
        ),
    }
}

fn serialize_video(id: &str) -> String {
    format!(
        "<div class=\"blog-youtube\">\n    <iframe\n        width=\"100%\"\n        height=\"400\"\n        src=\"https://www.youtube.com/embed/{}\"\n        frameborder=\"0\"\n        allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\"\n        allowfullscreen>\n    </iframe>\n</div>",
        escape_html(id)
    )
}

fn serialize_static_code(language: &str, source: &str) -> String {
    let language = escape_html(language);
    format!(
        "<div class=\"blog-code-block\">\n    <div class=\"code-header\">\n        <span class=\"code-language\">{0}</span>\n        <button class=\"copy-code-btn\" onclick=\"copyCode(this)\">Copy</button>\n    </div>\n    <pre><code class=\"language-{0}\">{1}</code></pre>\n</div>",
        language,
        escape_html(source)
    )
}

fn serialize_interactive_code(language: &str, source: &str) -> String {
    let language = escape_html(language);
    format!(
        "<div class=\"blog-code-interactive\" data-language=\"{0}\">\n    <div class=\"code-editor\">\n        <pre><code class=\"language-{0}\">{1}</code></pre>\n    </div>\n    <button class=\"run-code-btn\" onclick=\"runCode(this)\">▶ Run Code</button>\n    <div class=\"code-output\">\n        <div class=\"output-header\">Output:</div>\n        <pre class=\"output-content\"></pre>\n    </div>\n</div>",
        language,
        escape_html(source)
    )
}

fn serialize_ad(slot: &str) -> String {
    format!(
        "<div class=\"google-ad-placeholder\">\n    <div class=\"ad-content\">\n        <p class=\"ad-label\">Advertisement</p>\n        <div class=\"ad-slot\" data-ad-slot=\"{}\"></div>\n    </div>\n</div>",
        escape_html(slot)
    )
}
