//! Character-window text chunker.
//!
//! Splits a section's body text into retrieval-sized chunks. Splitting
//! prefers paragraph boundaries, then line boundaries, then sentence
//! boundaries, and only hard-splits when a single piece still exceeds the
//! window. Adjacent chunks share a small character overlap so that phrases
//! straddling a boundary stay retrievable.

use crate::models::{Chunk, ChunkMeta, DocType};

/// Target chunk size in characters.
pub const CHUNK_CHARS: usize = 280;

/// Characters of trailing context carried into the next chunk.
pub const CHUNK_OVERLAP: usize = 40;

/// Boundary preference, coarsest first.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", ". "];

/// Split one section's text into chunk texts.
///
/// Returns an empty list for blank input. Each piece is trimmed; order
/// follows the source text.
pub fn chunk_section_text(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    split_recursive(text.trim(), 0)
}

/// Attach metadata to a section's chunk texts.
///
/// `chunk_id` restarts at 0 for every section, so ids are stable within a
/// section but not unique across documents.
pub fn chunk_section(doc_type: DocType, section: &str, text: &str) -> Vec<Chunk> {
    chunk_section_text(text)
        .into_iter()
        .enumerate()
        .map(|(i, chunk_text)| Chunk {
            text: chunk_text,
            meta: ChunkMeta {
                doc_type,
                section: Some(section.to_string()),
                chunk_id: i as i64,
            },
        })
        .collect()
}

fn split_recursive(text: &str, sep_index: usize) -> Vec<String> {
    if text.chars().count() <= CHUNK_CHARS {
        let trimmed = text.trim();
        return if trimmed.is_empty() {
            Vec::new()
        } else {
            vec![trimmed.to_string()]
        };
    }

    if sep_index >= SEPARATORS.len() {
        return hard_split(text);
    }

    let sep = SEPARATORS[sep_index];
    let parts: Vec<&str> = text.split(sep).collect();
    if parts.len() == 1 {
        // Separator absent at this level; try a finer one.
        return split_recursive(text, sep_index + 1);
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut buf = String::new();
    // True while `buf` holds only overlap carried from the previous chunk.
    let mut buf_is_tail = false;

    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let part_len = part.chars().count();

        if part_len > CHUNK_CHARS {
            if !buf.is_empty() && !buf_is_tail {
                chunks.push(std::mem::take(&mut buf));
            }
            buf.clear();
            buf_is_tail = false;
            chunks.extend(split_recursive(part, sep_index + 1));
            continue;
        }

        let joined_len = if buf.is_empty() {
            part_len
        } else {
            buf.chars().count() + sep.len() + part_len
        };

        if joined_len > CHUNK_CHARS && !buf.is_empty() && !buf_is_tail {
            let tail = overlap_tail(&buf);
            chunks.push(std::mem::take(&mut buf));
            // Carry the tail only when it leaves room for the next part.
            if !tail.is_empty()
                && tail.chars().count() + 1 + part_len <= CHUNK_CHARS + CHUNK_OVERLAP
            {
                buf = tail;
                buf_is_tail = true;
            }
        }

        if buf.is_empty() {
            buf.push_str(part);
        } else {
            buf.push_str(if buf_is_tail { " " } else { sep });
            buf.push_str(part);
        }
        buf_is_tail = false;
    }

    if !buf.trim().is_empty() {
        chunks.push(buf.trim().to_string());
    }

    chunks
}

/// Last [`CHUNK_OVERLAP`] characters of a chunk, snapped forward to a word
/// boundary so the carried context starts on a whole word.
fn overlap_tail(chunk: &str) -> String {
    let chars: Vec<char> = chunk.chars().collect();
    if chars.len() <= CHUNK_OVERLAP {
        return String::new();
    }
    let tail: String = chars[chars.len() - CHUNK_OVERLAP..].iter().collect();
    match tail.find(' ') {
        Some(pos) => tail[pos..].trim().to_string(),
        None => tail,
    }
}

/// No separator fits; cut at the window size, preferring a space boundary.
fn hard_split(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + CHUNK_CHARS).min(chars.len());
        let window: String = chars[start..end].iter().collect();

        let cut = if end < chars.len() {
            window.rfind(' ').map(|p| p + 1).unwrap_or(window.len())
        } else {
            window.len()
        };

        let piece = window[..cut].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        // `cut` is a byte offset into `window`; convert back to chars
        let advanced = window[..cut].chars().count().max(1);
        start += advanced;
    }

    chunks
}
