use crate::error::LoadError;
use lopdf::Document;
use std::io::Write;
use tempfile::NamedTempFile;

/// Extracted text of one PDF page.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub text: String,
    pub page_number: u32,
    pub source_id: String,
}

pub trait PdfLoader {
    fn load_pages(&self, bytes: &[u8], source_id: &str) -> Result<Vec<PageRecord>, LoadError>;
}

#[derive(Debug, Default)]
pub struct LopdfLoader;

impl PdfLoader for LopdfLoader {
    /// Writes the uploaded bytes to a scratch file, parses the document,
    /// and returns one record per page in page order. A page whose text
    /// cannot be extracted yields an empty-text record instead of failing
    /// the whole document; only an unreadable document is an error. The
    /// scratch file is removed on every exit path when it drops.
    fn load_pages(&self, bytes: &[u8], source_id: &str) -> Result<Vec<PageRecord>, LoadError> {
        let mut scratch = NamedTempFile::new()?;
        scratch.write_all(bytes)?;
        scratch.flush()?;

        let document = Document::load(scratch.path())
            .map_err(|error| LoadError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_number, _page_id) in document.get_pages() {
            let text = document.extract_text(&[page_number]).unwrap_or_default();
            pages.push(PageRecord {
                text,
                page_number,
                source_id: source_id.to_string(),
            });
        }

        Ok(pages)
    }
}
