use tracing::warn;

use crate::backend::{EngineResult, PdfDocument};
use crate::library::RenderLibrary;
use crate::source::SourceBuffer;

const WORKER_TRANSFER_MARKERS: [&str; 4] = ["worker", "postmessage", "detached", "transfer"];

/// Whether an engine failure came from handing the buffer to the render
/// worker. Matches on message text; keep every marker here.
pub fn is_worker_transfer_error(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    WORKER_TRANSFER_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}

pub struct OpenedDocument {
    pub document: Box<dyn PdfDocument>,
    pub attempts: u32,
}

/// Opens a document from a fresh copy of `buffer`. A worker transfer failure
/// disables the worker for the whole library and retries once on the
/// calling task with another fresh copy.
pub async fn open_with_recovery(
    library: &RenderLibrary,
    buffer: &SourceBuffer,
) -> EngineResult<OpenedDocument> {
    let first_error = match library.open_document(buffer.fresh_copy()).await {
        Ok(document) => {
            return Ok(OpenedDocument {
                document,
                attempts: 1,
            });
        }
        Err(err) => err,
    };

    let message = first_error.to_string();
    if !is_worker_transfer_error(&message) {
        return Err(first_error);
    }

    warn!(error = %message, "render worker lost the document buffer, retrying without worker");
    library.worker().disable_worker();
    let document = library.open_document(buffer.fresh_copy()).await?;
    Ok(OpenedDocument {
        document,
        attempts: 2,
    })
}
