use std::sync::Arc;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("invalid PDF: {0}")]
    InvalidPdf(String),
    #[error("page {page} is out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("render scale must be a positive finite value, got {0}")]
    InvalidScale(f32),
    #[error("{0}")]
    Worker(String),
    #[error("invalid worker source: {0:?}")]
    InvalidWorkerSrc(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

impl RgbaFrame {
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels_to_vec(&self) -> Vec<u8> {
        self.pixels.as_ref().to_vec()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// A PDF rendering library. `open` takes ownership of the buffer it is given.
pub trait PdfEngine: Send + Sync {
    fn name(&self) -> &str;
    fn open(&self, bytes: Vec<u8>) -> EngineResult<Box<dyn PdfDocument>>;
}

/// A decoded document. Page numbers are 1-indexed.
pub trait PdfDocument: Send {
    fn page_count(&self) -> usize;
    fn page_size(&self, page_number: usize) -> EngineResult<PageSize>;
    fn render_page(&self, page_number: usize, scale: f32) -> EngineResult<RgbaFrame>;
}
