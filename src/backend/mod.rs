use std::sync::Arc;

mod hayro;
mod traits;

pub use hayro::{HayroDocument, HayroEngine};
pub use traits::{EngineError, EngineResult, PageSize, PdfDocument, PdfEngine, RgbaFrame};

pub fn default_engine() -> EngineResult<Arc<dyn PdfEngine>> {
    Ok(Arc::new(HayroEngine::new()) as Arc<dyn PdfEngine>)
}
