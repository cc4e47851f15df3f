pub mod block;
pub mod config;
pub mod document;
pub mod extract;
pub mod popup;
pub mod preview;
pub mod progress;
pub mod template;

// Re-export main types
pub use block::{Alignment, BlockError, ContentBlock, ImageLayout, escape_html};
pub use document::{AssembleError, Document, Segment, append, insert_at};
pub use extract::extract_video_id;
pub use preview::{CodeFragment, Highlighter, Rendered, render};
pub use template::{PageContext, PageRenderer, TemplateError};
