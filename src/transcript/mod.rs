//! Transcript text processing
//!
//! Everything a strategy extracts passes through `normalize` before it is returned,
//! and caption files are flattened by `parse_vtt` first.

pub mod normalize;
pub mod vtt;

pub use normalize::{
    clean_text, format_paragraphs, normalize, remove_timestamps, MIN_TRANSCRIPT_CHARS,
    SENTENCES_PER_PARAGRAPH,
};
pub use vtt::parse_vtt;
