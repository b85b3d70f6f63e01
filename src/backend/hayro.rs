use std::sync::Arc;

use hayro::hayro_interpret::InterpreterSettings;
use hayro::hayro_interpret::util::PageExt;
use hayro::hayro_syntax::Pdf;
use hayro::hayro_syntax::page::Page;
use hayro::vello_cpu::color::palette::css::WHITE;
use hayro::{RenderSettings, render};

use super::traits::{EngineError, EngineResult, PageSize, PdfDocument, PdfEngine, RgbaFrame};

const PDF_HEADER: &[u8] = b"%PDF-";

#[derive(Debug, Default)]
pub struct HayroEngine;

impl HayroEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for HayroEngine {
    fn name(&self) -> &str {
        "hayro"
    }

    fn open(&self, bytes: Vec<u8>) -> EngineResult<Box<dyn PdfDocument>> {
        HayroDocument::from_bytes(bytes).map(|doc| Box::new(doc) as Box<dyn PdfDocument>)
    }
}

pub struct HayroDocument {
    pdf: Pdf,
}

impl HayroDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> EngineResult<Self> {
        if !bytes.starts_with(PDF_HEADER) {
            return Err(EngineError::InvalidPdf(
                "input is not a valid PDF header".to_string(),
            ));
        }

        let pdf = Pdf::new(Arc::new(bytes))
            .map_err(|_| EngineError::InvalidPdf("failed to parse document structure".to_string()))?;
        Ok(Self { pdf })
    }

    fn page(&self, page_number: usize) -> EngineResult<&Page<'_>> {
        let count = self.page_count();
        page_number
            .checked_sub(1)
            .and_then(|index| self.pdf.pages().get(index))
            .ok_or(EngineError::PageOutOfRange {
                page: page_number,
                count,
            })
    }
}

impl PdfDocument for HayroDocument {
    fn page_count(&self) -> usize {
        self.pdf.pages().len()
    }

    fn page_size(&self, page_number: usize) -> EngineResult<PageSize> {
        let (width, height) = self.page(page_number)?.render_dimensions();
        Ok(PageSize { width, height })
    }

    fn render_page(&self, page_number: usize, scale: f32) -> EngineResult<RgbaFrame> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EngineError::InvalidScale(scale));
        }
        let page = self.page(page_number)?;

        let render_settings = RenderSettings {
            x_scale: scale,
            y_scale: scale,
            bg_color: WHITE,
            ..Default::default()
        };
        let interpreter_settings = InterpreterSettings::default();
        let pixmap = render(page, &interpreter_settings, &render_settings);

        Ok(RgbaFrame {
            width: pixmap.width() as u32,
            height: pixmap.height() as u32,
            pixels: pixmap.data_as_u8_slice().to_vec().into(),
        })
    }
}
