//! Page-one PDF to PNG conversion.
//!
//! [`Converter::convert_to_image`] never fails outright: every problem ends
//! up in [`ConversionResult::error`], and a result carries either a file and
//! an object URL or an error, never both.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

use crate::blob::{ObjectUrlRegistry, PngFile};
use crate::config::{Config, RenderConfig};
use crate::error::AppError;
use crate::host::NOT_IN_RUNTIME;
use crate::library::LibraryLoader;
use crate::perf::ConversionTimings;
use crate::source::SourceDocument;

mod encode;
mod naming;
mod recovery;
mod scale;
mod surface;


pub use encode::{EncodeError, PngSurfaceEncoder, SurfaceEncoder, decode_data_url, encode_png};
pub use naming::png_file_name;
pub use recovery::{OpenedDocument, is_worker_transfer_error, open_with_recovery};
pub use scale::{Viewport, compute_render_scale, target_viewport};
pub use surface::{MAX_SURFACE_PIXELS, RasterSurface};

pub const FIRST_PAGE: usize = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("{0}")]
    Environment(String),
    #[error("Failed to create image blob")]
    Encoding,
    #[error("Failed to convert PDF: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    image_url: String,
    file: Option<PngFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ConversionResult {
    pub fn success(image_url: String, file: PngFile) -> Self {
        Self {
            image_url,
            file: Some(file),
            error: None,
        }
    }

    pub fn failure(error: &ConversionError) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.to_string()),
        }
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn file(&self) -> Option<&PngFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.file.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Finished(ConversionResult),
    Canceled,
}

struct Canceled;

// `C` is `Infallible` when the caller cannot cancel.
enum Interrupt<C> {
    Canceled(C),
    Failed(ConversionError),
}

impl<C> From<ConversionError> for Interrupt<C> {
    fn from(err: ConversionError) -> Self {
        Self::Failed(err)
    }
}

fn failed(err: impl Display) -> ConversionError {
    ConversionError::Failed(err.to_string())
}

pub struct Converter {
    loader: Arc<LibraryLoader>,
    urls: Arc<ObjectUrlRegistry>,
    encoder: Arc<dyn SurfaceEncoder>,
    render: RenderConfig,
}

impl Converter {
    pub fn new(loader: Arc<LibraryLoader>, urls: Arc<ObjectUrlRegistry>) -> Self {
        Self {
            loader,
            urls,
            encoder: Arc::new(PngSurfaceEncoder::default()),
            render: RenderConfig::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(LibraryLoader::from_config(config)),
            Arc::new(ObjectUrlRegistry::new(config.host.origin.clone())),
        )
        .with_encoder(Arc::new(PngSurfaceEncoder::new(config.encode.blob_api)))
        .with_render_config(config.render)
    }

    pub fn with_encoder(mut self, encoder: Arc<dyn SurfaceEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn with_render_config(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn loader(&self) -> &Arc<LibraryLoader> {
        &self.loader
    }

    pub fn urls(&self) -> &Arc<ObjectUrlRegistry> {
        &self.urls
    }

    pub async fn convert_to_image(&self, source: &SourceDocument) -> ConversionResult {
        match self.run(source, || Ok::<(), Infallible>(())).await {
            Ok(result) => result,
            Err(Interrupt::Failed(err)) => self.report_failure(source, &err),
        }
    }

    pub async fn convert_cancellable(
        &self,
        source: &SourceDocument,
        cancel: &CancelToken,
    ) -> ConversionOutcome {
        let checkpoint = || {
            if cancel.is_canceled() {
                Err(Canceled)
            } else {
                Ok(())
            }
        };
        match self.run(source, checkpoint).await {
            Ok(result) => ConversionOutcome::Finished(result),
            Err(Interrupt::Failed(err)) => {
                ConversionOutcome::Finished(self.report_failure(source, &err))
            }
            Err(Interrupt::Canceled(Canceled)) => {
                debug!(source = source.name(), "conversion canceled");
                ConversionOutcome::Canceled
            }
        }
    }

    fn report_failure(&self, source: &SourceDocument, err: &ConversionError) -> ConversionResult {
        warn!(source = source.name(), error = %err, "conversion failed");
        ConversionResult::failure(err)
    }

    async fn run<C>(
        &self,
        source: &SourceDocument,
        checkpoint: impl Fn() -> Result<(), C>,
    ) -> Result<ConversionResult, Interrupt<C>> {
        if !self.loader.host().is_render_capable() {
            return Err(ConversionError::Environment(NOT_IN_RUNTIME.to_string()).into());
        }

        debug!(
            source = source.name(),
            media_type = source.media_type(),
            bytes = source.len(),
            "converting document"
        );
        let mut timings = ConversionTimings::default();
        checkpoint().map_err(Interrupt::Canceled)?;
        let started = Instant::now();
        let library = self.loader.load().await.map_err(|err| match err {
            AppError::Environment(message) => ConversionError::Environment(message),
            other => failed(other),
        })?;
        timings.record_load(started.elapsed());

        let buffer = source.to_buffer();
        checkpoint().map_err(Interrupt::Canceled)?;
        let started = Instant::now();
        let opened = open_with_recovery(&library, &buffer).await.map_err(failed)?;
        timings.record_open(started.elapsed(), opened.attempts);
        let document = opened.document;

        if document.page_count() < FIRST_PAGE {
            return Err(failed("document has no pages").into());
        }
        let page = document.page_size(FIRST_PAGE).map_err(failed)?;
        let viewport = target_viewport(page, &self.render);
        let (width, height) = viewport.surface_size();
        let mut surface = RasterSurface::allocate(width, height).map_err(failed)?;
        surface.enable_smoothing();

        checkpoint().map_err(Interrupt::Canceled)?;
        let started = Instant::now();
        let frame = library
            .render_page(document, FIRST_PAGE, viewport.scale)
            .await
            .map_err(failed)?;
        surface.paint(&frame).map_err(failed)?;
        timings.record_render(started.elapsed());

        checkpoint().map_err(Interrupt::Canceled)?;
        let started = Instant::now();
        let bytes = self.encode(surface).await?;
        timings.record_encode(started.elapsed());

        let file = PngFile::new(png_file_name(source.name()), bytes);
        let image_url = self.urls.create(file.blob().clone());
        info!(
            source = source.name(),
            output = file.name(),
            width,
            height,
            scale = viewport.scale,
            bytes = file.bytes().len(),
            "converted first page"
        );
        debug!(?timings, total_ms = timings.total_ms(), "conversion timings");
        Ok(ConversionResult::success(image_url, file))
    }

    async fn encode(&self, surface: RasterSurface) -> Result<Vec<u8>, ConversionError> {
        let encoder = Arc::clone(&self.encoder);
        spawn_blocking(move || encode_png(encoder.as_ref(), &surface))
            .await
            .map_err(failed)?
            .ok_or(ConversionError::Encoding)
    }
}
