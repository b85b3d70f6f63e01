use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::task::{JoinError, spawn_blocking};
use tracing::debug;

use crate::backend::{EngineError, EngineResult, PdfDocument, PdfEngine, RgbaFrame};
use crate::worker::WorkerOptions;

mod loader;

pub use loader::{EngineFactory, LibraryLoader};

/// A loaded rendering library: the engine plus its worker settings.
///
/// With an active worker source, engine calls run on the blocking pool and
/// take ownership of the buffers handed to them. Without one they run on
/// the calling task.
pub struct RenderLibrary {
    engine: Arc<dyn PdfEngine>,
    worker: WorkerOptions,
}

impl RenderLibrary {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            engine,
            worker: WorkerOptions::new(),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub fn worker(&self) -> &WorkerOptions {
        &self.worker
    }

    pub async fn open_document(&self, bytes: Vec<u8>) -> EngineResult<Box<dyn PdfDocument>> {
        match self.worker.active_src() {
            Some(src) => {
                debug!(worker = %src, bytes = bytes.len(), "opening document on render worker");
                let engine = Arc::clone(&self.engine);
                spawn_blocking(move || engine.open(bytes))
                    .await
                    .map_err(|err| worker_terminated(&src, err))?
            }
            None => run_inline(|| self.engine.open(bytes)),
        }
    }

    pub async fn render_page(
        &self,
        document: Box<dyn PdfDocument>,
        page_number: usize,
        scale: f32,
    ) -> EngineResult<RgbaFrame> {
        match self.worker.active_src() {
            Some(src) => spawn_blocking(move || document.render_page(page_number, scale))
                .await
                .map_err(|err| worker_terminated(&src, err))?,
            None => run_inline(|| document.render_page(page_number, scale)),
        }
    }
}

fn worker_terminated(src: &str, err: JoinError) -> EngineError {
    EngineError::Worker(format!(
        "render worker {src} terminated before returning the transferred buffer: {err}"
    ))
}

fn run_inline<T>(op: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
    catch_unwind(AssertUnwindSafe(op)).unwrap_or_else(|payload| {
        Err(EngineError::InvalidPdf(format!(
            "engine panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
