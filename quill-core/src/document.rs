use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::ContentBlock;

/// Blank line placed on both sides of an inserted fragment.
pub const SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    EmptyFragment,
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::EmptyFragment => write!(f, "Refusing to insert an empty fragment"),
        }
    }
}

impl std::error::Error for AssembleError {}

/// Append a fragment to the end of a document, surrounded by blank lines.
///
/// Prior content is kept byte for byte.
pub fn append(doc: &str, fragment: &str) -> Result<String, AssembleError> {
    if fragment.trim().is_empty() {
        return Err(AssembleError::EmptyFragment);
    }

    let mut out = String::with_capacity(doc.len() + fragment.len() + 2 * SEPARATOR.len());
    out.push_str(doc);
    out.push_str(SEPARATOR);
    out.push_str(fragment);
    out.push_str(SEPARATOR);
    Ok(out)
}

/// Insert a fragment at a byte offset (the editor cursor).
///
/// Offsets past the end insert at the end; offsets inside a multi-byte
/// character move back to the start of that character.
pub fn insert_at(doc: &str, cursor: usize, fragment: &str) -> Result<String, AssembleError> {
    if fragment.trim().is_empty() {
        return Err(AssembleError::EmptyFragment);
    }

    let mut at = cursor.min(doc.len());
    while !doc.is_char_boundary(at) {
        at -= 1;
    }

    let (head, tail) = doc.split_at(at);
    let mut out = append(head, fragment)?;
    out.push_str(tail);
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Segment {
    /// Author-written markup, kept verbatim.
    Text(String),
    Block(ContentBlock),
}

/// An ordered sequence of free text and blocks.
///
/// The persisted form is a single markup string ([`Document::to_markup`]);
/// structure is not recoverable from it, only its rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted content.
    pub fn from_markup(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let mut doc = Self::new();
        if !markup.is_empty() {
            doc.segments.push(Segment::Text(markup));
        }
        doc
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.segments.push(Segment::Text(text.into()));
    }

    pub fn push_block(&mut self, block: ContentBlock) {
        self.segments.push(Segment::Block(block));
    }

    /// Insert a segment before `index`; indexes past the end append.
    pub fn insert(&mut self, index: usize, segment: Segment) {
        let index = index.min(self.segments.len());
        self.segments.insert(index, segment);
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn blocks(&self) -> impl Iterator<Item = &ContentBlock> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Block(b) => Some(b),
            Segment::Text(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Block(block) => {
                    out.push_str(SEPARATOR);
                    out.push_str(&block.serialize());
                    out.push_str(SEPARATOR);
                }
            }
        }
        out
    }
}
