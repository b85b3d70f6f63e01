use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::OnceCell;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use crate::backend::{EngineResult, PdfEngine, default_engine};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::host::{HostEnvironment, TokioHost};
use crate::worker::WorkerResolver;

use super::RenderLibrary;

pub type EngineFactory = Arc<dyn Fn() -> EngineResult<Arc<dyn PdfEngine>> + Send + Sync>;

/// Loads the render library once and hands out the shared handle.
///
/// Callers arriving while a load is in flight wait for that load instead of
/// starting another. A failed load is not cached.
pub struct LibraryLoader {
    host: Arc<dyn HostEnvironment>,
    resolver: WorkerResolver,
    factory: EngineFactory,
    worker_enabled: bool,
    library: OnceCell<Arc<RenderLibrary>>,
    load_attempts: AtomicUsize,
}

impl LibraryLoader {
    pub fn new(
        host: Arc<dyn HostEnvironment>,
        resolver: WorkerResolver,
        factory: EngineFactory,
    ) -> Self {
        Self {
            host,
            resolver,
            factory,
            worker_enabled: true,
            library: OnceCell::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let factory: EngineFactory = Arc::new(default_engine);
        Self::new(
            Arc::new(TokioHost),
            WorkerResolver::from_config(config),
            factory,
        )
        .with_worker_enabled(config.worker.enabled)
    }

    pub fn with_worker_enabled(mut self, enabled: bool) -> Self {
        self.worker_enabled = enabled;
        self
    }

    pub fn host(&self) -> &Arc<dyn HostEnvironment> {
        &self.host
    }

    pub async fn load(&self) -> AppResult<Arc<RenderLibrary>> {
        self.host.ensure_render_capable()?;
        let library = self
            .library
            .get_or_try_init(|| self.load_library())
            .await?;
        Ok(Arc::clone(library))
    }

    pub fn loaded(&self) -> Option<Arc<RenderLibrary>> {
        self.library.get().cloned()
    }

    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    async fn load_library(&self) -> AppResult<Arc<RenderLibrary>> {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        let factory = Arc::clone(&self.factory);
        let engine = spawn_blocking(move || factory())
            .await
            .map_err(|err| AppError::environment(format!("render library load was interrupted: {err}")))??;

        let library = RenderLibrary::new(engine);
        self.configure_worker(&library);
        info!(
            engine = library.engine_name(),
            worker = ?library.worker().active_src(),
            "render library loaded"
        );
        Ok(Arc::new(library))
    }

    fn configure_worker(&self, library: &RenderLibrary) {
        if !self.worker_enabled {
            library.worker().clear_and_disable();
            return;
        }

        let src = self.resolver.resolve();
        if let Err(err) = library.worker().set_worker_src(&src) {
            warn!(error = %err, "worker source rejected, rendering on the calling task");
            library.worker().clear_and_disable();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures_util::future::join_all;

    use super::{EngineFactory, LibraryLoader};
    use crate::backend::{EngineError, EngineResult, PdfEngine};
    use crate::error::AppError;
    use crate::host::RENDERING_UNAVAILABLE;
    use crate::test_support::{FakeEngine, FakeHost};
    use crate::worker::{WORKER_FILENAME, WorkerResolver};

    fn origin_resolver() -> WorkerResolver {
        WorkerResolver::new(None, None, "https://resumes.example.com")
    }

    fn counting_factory(calls: Arc<AtomicUsize>) -> EngineFactory {
        Arc::new(move || -> EngineResult<Arc<dyn PdfEngine>> {
            calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(25));
            Ok(Arc::new(FakeEngine::new(612.0, 792.0)) as Arc<dyn PdfEngine>)
        })
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_loads_share_one_library() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = Arc::new(LibraryLoader::new(
            Arc::new(FakeHost::capable()),
            origin_resolver(),
            counting_factory(Arc::clone(&calls)),
        ));

        let handles = (0..8).map(|_| {
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { loader.load().await })
        });
        let libraries: Vec<_> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("task should join").expect("load should succeed"))
            .collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.load_attempts(), 1);
        for library in &libraries[1..] {
            assert!(Arc::ptr_eq(&libraries[0], library));
        }

        let again = loader.load().await.expect("cached load");
        assert!(Arc::ptr_eq(&libraries[0], &again));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn load_sets_resolved_worker_source() {
        let loader = LibraryLoader::new(
            Arc::new(FakeHost::capable()),
            origin_resolver(),
            counting_factory(Arc::new(AtomicUsize::new(0))),
        );

        let library = loader.load().await.expect("load");
        assert_eq!(
            library.worker().active_src(),
            Some(format!("https://resumes.example.com/{WORKER_FILENAME}"))
        );
    }

    #[tokio::test]
    async fn rejected_worker_source_degrades_to_inline_rendering() {
        let resolver = WorkerResolver::new(
            Some("https://cdn.example.com/render worker.js".to_string()),
            None,
            "https://resumes.example.com",
        );
        let loader = LibraryLoader::new(
            Arc::new(FakeHost::capable()),
            resolver,
            counting_factory(Arc::new(AtomicUsize::new(0))),
        );

        let library = loader.load().await.expect("load should still succeed");
        assert!(library.worker().is_disabled());
        assert_eq!(library.worker().worker_src(), None);
    }

    #[tokio::test]
    async fn disabled_worker_config_starts_degraded() {
        let loader = LibraryLoader::new(
            Arc::new(FakeHost::capable()),
            origin_resolver(),
            counting_factory(Arc::new(AtomicUsize::new(0))),
        )
        .with_worker_enabled(false);

        let library = loader.load().await.expect("load");
        assert_eq!(library.worker().active_src(), None);
    }

    #[tokio::test]
    async fn load_fails_outside_render_capable_host() {
        let calls = Arc::new(AtomicUsize::new(0));
        let loader = LibraryLoader::new(
            Arc::new(FakeHost::detached()),
            origin_resolver(),
            counting_factory(Arc::clone(&calls)),
        );

        let err = loader.load().await.err().expect("detached host should fail");
        assert!(matches!(err, AppError::Environment(message) if message == RENDERING_UNAVAILABLE));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(loader.loaded().is_none());
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let factory_calls = Arc::clone(&calls);
        let factory: EngineFactory = Arc::new(move || -> EngineResult<Arc<dyn PdfEngine>> {
            if factory_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EngineError::InvalidPdf("engine data missing".to_string()))
            } else {
                Ok(Arc::new(FakeEngine::new(612.0, 792.0)) as Arc<dyn PdfEngine>)
            }
        });
        let loader = LibraryLoader::new(Arc::new(FakeHost::capable()), origin_resolver(), factory);

        assert!(matches!(loader.load().await, Err(AppError::Engine(_))));
        assert!(loader.load().await.is_ok());
        assert_eq!(loader.load_attempts(), 2);
    }
}
