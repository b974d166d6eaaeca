use crate::error::ChunkError;
use crate::loader::PageRecord;
use uuid::Uuid;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Split boundaries tried in priority order before a hard character cut.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters carried over from the tail of the previous chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "chunk_overlap {} must be smaller than chunk_size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// A bounded text window ready for embedding. `chunk_id` is derived from
/// the content alone, so identical content always maps to the same id.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub source_id: String,
    pub chunk_id: String,
}

pub fn chunk_id_for(content: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, content.as_bytes()).to_string()
}

/// Splits every page into overlapping windows of at most
/// `config.chunk_size` characters. Empty pages produce no chunks.
pub fn split_pages(pages: &[PageRecord], config: ChunkingConfig) -> Result<Vec<Chunk>, ChunkError> {
    config.validate()?;

    let mut chunks = Vec::new();
    for page in pages {
        for piece in split_text(&page.text, config) {
            if piece.trim().is_empty() {
                continue;
            }
            chunks.push(Chunk {
                chunk_id: chunk_id_for(&piece),
                content: piece,
                source_id: page.source_id.clone(),
            });
        }
    }

    Ok(chunks)
}

/// Windows the text, preferring to break at a paragraph, line, sentence,
/// or word boundary near the end of each window before falling back to a
/// hard character cut. Each window after the first starts
/// `config.chunk_overlap` characters before the end of the previous one.
fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= config.chunk_size {
        if text.is_empty() {
            return Vec::new();
        }
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = (start + config.chunk_size).min(chars.len());
        let end = if hard_end == chars.len() {
            hard_end
        } else {
            find_break(&chars, start, hard_end)
        };

        pieces.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(config.chunk_overlap).max(start + 1);
    }

    pieces
}

/// Scans backward from the window's hard end for the highest-priority
/// separator. Never shrinks the window below half its size, so progress
/// stays bounded regardless of separator placement.
fn find_break(chars: &[char], start: usize, hard_end: usize) -> usize {
    let floor = start + (hard_end - start) / 2;

    for separator in SEPARATORS {
        let sep: Vec<char> = separator.chars().collect();
        if hard_end - start < sep.len() {
            continue;
        }

        let mut pos = hard_end - sep.len();
        while pos > floor {
            if chars[pos..pos + sep.len()] == sep[..] {
                return pos + sep.len();
            }
            pos -= 1;
        }
    }

    hard_end
}
