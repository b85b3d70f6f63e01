//! In-process PDF fixtures and fakes for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{EngineError, EngineResult, PageSize, PdfDocument, PdfEngine, RgbaFrame};
use crate::host::HostEnvironment;

#[derive(Debug, Clone, Copy)]
pub(crate) struct FakeHost {
    capable: bool,
}

impl FakeHost {
    pub(crate) fn capable() -> Self {
        Self { capable: true }
    }

    pub(crate) fn detached() -> Self {
        Self { capable: false }
    }
}

impl HostEnvironment for FakeHost {
    fn is_render_capable(&self) -> bool {
        self.capable
    }
}

/// Engine whose documents have fixed page sizes. Renders produce
/// `ceil(size * scale)` frames unless a frame size is forced.
pub(crate) struct FakeEngine {
    page_size: PageSize,
    page_count: usize,
    frame_size: Option<(u32, u32)>,
    panic_on_open: bool,
    open_failures: Mutex<VecDeque<EngineError>>,
    opens: AtomicUsize,
    opened_lengths: Mutex<Vec<usize>>,
}

impl FakeEngine {
    pub(crate) fn new(width: f32, height: f32) -> Self {
        Self {
            page_size: PageSize { width, height },
            page_count: 1,
            frame_size: None,
            panic_on_open: false,
            open_failures: Mutex::new(VecDeque::new()),
            opens: AtomicUsize::new(0),
            opened_lengths: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_page_count(mut self, page_count: usize) -> Self {
        self.page_count = page_count;
        self
    }

    pub(crate) fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.frame_size = Some((width, height));
        self
    }

    pub(crate) fn with_open_failures(self, failures: Vec<EngineError>) -> Self {
        *self.open_failures.lock().expect("fake lock") = failures.into();
        self
    }

    pub(crate) fn panicking_on_open(mut self) -> Self {
        self.panic_on_open = true;
        self
    }

    pub(crate) fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub(crate) fn opened_lengths(&self) -> Vec<usize> {
        self.opened_lengths.lock().expect("fake lock").clone()
    }
}

impl PdfEngine for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    fn open(&self, bytes: Vec<u8>) -> EngineResult<Box<dyn PdfDocument>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.opened_lengths
            .lock()
            .expect("fake lock")
            .push(bytes.len());
        if self.panic_on_open {
            panic!("fake engine panic");
        }
        if let Some(err) = self.open_failures.lock().expect("fake lock").pop_front() {
            return Err(err);
        }
        Ok(Box::new(FakeDocument {
            page_size: self.page_size,
            page_count: self.page_count,
            frame_size: self.frame_size,
        }))
    }
}

struct FakeDocument {
    page_size: PageSize,
    page_count: usize,
    frame_size: Option<(u32, u32)>,
}

impl PdfDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page_number: usize) -> EngineResult<PageSize> {
        if page_number == 0 || page_number > self.page_count {
            return Err(EngineError::PageOutOfRange {
                page: page_number,
                count: self.page_count,
            });
        }
        Ok(self.page_size)
    }

    fn render_page(&self, page_number: usize, scale: f32) -> EngineResult<RgbaFrame> {
        self.page_size(page_number)?;
        let (width, height) = self.frame_size.unwrap_or((
            (self.page_size.width * scale).ceil() as u32,
            (self.page_size.height * scale).ceil() as u32,
        ));
        let pixels: Arc<[u8]> = [40_u8, 80, 120, 255]
            .repeat(width as usize * height as usize)
            .into();
        Ok(RgbaFrame {
            width,
            height,
            pixels,
        })
    }
}

pub(crate) fn build_pdf(width: f32, height: f32, page_texts: &[&str]) -> Vec<u8> {
    let page_streams: Vec<String> = if page_texts.is_empty() {
        vec![String::new()]
    } else {
        page_texts
            .iter()
            .map(|text| {
                let escaped = escape_literal_string(text);
                format!("BT /F1 14 Tf 36 {} Td ({escaped}) Tj ET", height / 2.0)
            })
            .collect()
    };

    let page_count = page_streams.len();
    let page_ids: Vec<usize> = (0..page_count).map(|i| 4 + i * 2).collect();

    let mut objects = vec!["<< /Type /Catalog /Pages 2 0 R >>".to_string()];
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");
    objects.push(format!(
        "<< /Type /Pages /Kids [{kids}] /Count {page_count} >>"
    ));
    objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string());

    for (index, stream) in page_streams.iter().enumerate() {
        let content_id = 5 + index * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {width} {height}] /Resources << /Font << /F1 3 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ));
    }

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (index, object) in objects.iter().enumerate() {
        offsets.push(bytes.len());
        bytes.extend_from_slice(format!("{} 0 obj\n{object}\nendobj\n", index + 1).as_bytes());
    }

    let xref_start = bytes.len();
    bytes.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    bytes.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        bytes.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    bytes.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_start}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );

    bytes
}

fn escape_literal_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}
