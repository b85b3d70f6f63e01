use tracing::{debug, warn};
use url::{ParseError, Url};

use crate::config::Config;

pub const WORKER_FILENAME: &str = "render.worker.js";

const BUILD_WORKER_SRC: Option<&str> = option_env!("RPV_WORKER_SRC");

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no bundled worker source")]
    NoBundledSource,
    #[error("base path is not set")]
    NoBasePath,
    #[error("invalid base path {base:?}: {source}")]
    InvalidBasePath {
        base: String,
        #[source]
        source: ParseError,
    },
    #[error("invalid origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: ParseError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResolver {
    bundled: Option<String>,
    base_path: Option<String>,
    origin: String,
}

impl WorkerResolver {
    pub fn new(bundled: Option<String>, base_path: Option<String>, origin: impl Into<String>) -> Self {
        Self {
            bundled,
            base_path,
            origin: origin.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let bundled =
            non_empty(&config.worker.src).or_else(|| BUILD_WORKER_SRC.and_then(non_empty));
        Self::new(
            bundled,
            non_empty(&config.host.base_path),
            config.host.origin.clone(),
        )
    }

    pub fn from_bundled(&self) -> Result<String, ResolveError> {
        self.bundled
            .as_deref()
            .and_then(non_empty)
            .ok_or(ResolveError::NoBundledSource)
    }

    pub fn from_base_path(&self) -> Result<String, ResolveError> {
        let base = self
            .base_path
            .as_deref()
            .map(str::trim)
            .filter(|base| !base.is_empty())
            .ok_or(ResolveError::NoBasePath)?;
        let origin = self.origin_url()?;

        // A base path names a directory, so `/app` and `/app/` are the same.
        let directory = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };
        let invalid = |source| ResolveError::InvalidBasePath {
            base: base.to_string(),
            source,
        };
        let worker = origin
            .join(&directory)
            .and_then(|directory| directory.join(WORKER_FILENAME))
            .map_err(invalid)?;
        Ok(worker.into())
    }

    pub fn from_origin(&self) -> Result<String, ResolveError> {
        let worker = self
            .origin_url()?
            .join(WORKER_FILENAME)
            .map_err(|source| ResolveError::InvalidOrigin {
                origin: self.origin.clone(),
                source,
            })?;
        Ok(worker.into())
    }

    pub fn try_resolve(&self) -> Result<String, ResolveError> {
        self.from_bundled()
            .or_else(|_| self.from_base_path())
            .or_else(|err| {
                debug!(error = %err, "worker base path unusable, resolving against origin");
                self.from_origin()
            })
    }

    pub fn resolve(&self) -> String {
        self.try_resolve().unwrap_or_else(|err| {
            warn!(error = %err, "worker source resolution failed, using root-relative path");
            format!("/{WORKER_FILENAME}")
        })
    }

    fn origin_url(&self) -> Result<Url, ResolveError> {
        Url::parse(self.origin.trim()).map_err(|source| ResolveError::InvalidOrigin {
            origin: self.origin.clone(),
            source,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
