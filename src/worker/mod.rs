use std::sync::{PoisonError, RwLock};

use crate::backend::{EngineError, EngineResult};

mod resolver;

pub use resolver::{ResolveError, WORKER_FILENAME, WorkerResolver};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct WorkerState {
    src: Option<String>,
    disabled: bool,
}

/// Library-wide worker settings shared by every conversion using the
/// library. Once disabled the worker stays off for the life of the library.
#[derive(Debug, Default)]
pub struct WorkerOptions {
    state: RwLock<WorkerState>,
}

impl WorkerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_worker_src(&self, src: &str) -> EngineResult<()> {
        if src.trim().is_empty() || src.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(EngineError::InvalidWorkerSrc(src.to_string()));
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.src = Some(src.to_string());
        Ok(())
    }

    pub fn clear_and_disable(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.src = None;
        state.disabled = true;
    }

    pub fn disable_worker(&self) {
        self.clear_and_disable();
    }

    pub fn is_disabled(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .disabled
    }

    pub fn worker_src(&self) -> Option<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .src
            .clone()
    }

    pub fn active_src(&self) -> Option<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.disabled { None } else { state.src.clone() }
    }
}
