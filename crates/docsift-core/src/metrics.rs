//! Structural text metrics: paragraphs, words, characters.
//!
//! # Rules
//!
//! - **Words** are maximal runs of non-whitespace.
//! - **Paragraphs** are the segments between blank lines (`\n\n`) that are
//!   non-empty once trimmed. Text without a blank line is one paragraph.
//! - **Characters** are Unicode code points, not bytes.
//!
//! # Example
//!
//! ```rust
//! use docsift_core::metrics::TextMetrics;
//!
//! let m = TextMetrics::compute("Hello world.\n\nSecond paragraph here");
//! assert_eq!(m.words, 5);
//! assert_eq!(m.paragraphs, 2);
//! assert_eq!(m.characters, 35);
//! ```

use serde::{Deserialize, Serialize};

/// Counts computed for one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TextMetrics {
    pub paragraphs: u64,
    pub words: u64,
    pub characters: u64,
}

impl TextMetrics {
    pub fn compute(text: &str) -> Self {
        Self {
            paragraphs: paragraphs(text),
            words: words(text),
            characters: characters(text),
        }
    }
}

/// Number of whitespace-delimited tokens.
pub fn words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Number of non-blank segments separated by a blank line.
pub fn paragraphs(text: &str) -> u64 {
    let unified;
    let text = if text.contains('\r') {
        unified = text.replace("\r\n", "\n");
        unified.as_str()
    } else {
        text
    };

    text.split("\n\n")
        .filter(|segment| !segment.trim().is_empty())
        .count() as u64
}

/// Number of Unicode code points.
pub fn characters(text: &str) -> u64 {
    text.chars().count() as u64
}
