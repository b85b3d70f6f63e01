use tokio::runtime::Handle;

use crate::error::{AppError, AppResult};

pub const NOT_IN_RUNTIME: &str = "Not running inside a tokio runtime";
pub const RENDERING_UNAVAILABLE: &str = "rendering is only available inside a tokio runtime";

pub trait HostEnvironment: Send + Sync {
    fn is_render_capable(&self) -> bool;

    fn ensure_render_capable(&self) -> AppResult<()> {
        if self.is_render_capable() {
            Ok(())
        } else {
            Err(AppError::environment(RENDERING_UNAVAILABLE))
        }
    }
}

/// Render work is dispatched onto the blocking pool of the current tokio
/// runtime, so a runtime handle must be reachable from the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioHost;

impl HostEnvironment for TokioHost {
    fn is_render_capable(&self) -> bool {
        Handle::try_current().is_ok()
    }
}
