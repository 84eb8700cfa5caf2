//! Deterministic overlapping windows over file content.

use crate::error::{RagError, Result};

/// Window geometry, measured in characters. `overlap` must be strictly
/// smaller than `size` or windowing would never advance.
#[derive(Debug, Clone, Copy)]
pub struct ChunkConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            size: 800,
            overlap: 200,
        }
    }
}

/// Split `text` into overlapping windows.
///
/// Windows start at 0 and advance by `size - overlap`; the final window is
/// clipped to the text's end. Mid-text windows ending close to a line break
/// (past 80% of the window) are trimmed back to it so chunks tend to end on
/// whole lines. Whitespace-only windows are dropped.
///
/// # Errors
///
/// `RagError::ChunkConfig` when `size` is zero or `overlap >= size`.
pub fn chunk_text(text: &str, config: &ChunkConfig) -> Result<Vec<String>> {
    if config.size == 0 {
        return Err(RagError::ChunkConfig("window size must be positive".to_owned()));
    }
    if config.overlap >= config.size {
        return Err(RagError::ChunkConfig(format!(
            "overlap {} must be smaller than window size {}",
            config.overlap, config.size
        )));
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= config.size {
        return Ok(vec![text.to_owned()]);
    }

    let step = config.size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.size).min(chars.len());
        let window = &chars[start..end];

        let mut cut = window.len();
        if end < chars.len()
            && let Some(pos) = window.iter().rposition(|c| *c == '\n')
            && pos >= window.len() * 4 / 5
        {
            cut = pos;
        }

        let chunk: String = window[..cut].iter().collect();
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }
    Ok(chunks)
}
