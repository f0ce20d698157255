//! Asynchronous front end to the rotation pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RotateConfig;
use crate::error::RotateError;
use crate::pipeline::{PipelineContext, RotatedOutput, RotationRequest, RotationState, RotationTask};
use crate::source::{ContentResolver, FileContentResolver, RemoteFetcher, SourceOpener};
use crate::storage::{sweep_directories, CacheDirectories, DiskSpaceProbe, SpaceProbe, SweepReport};

struct Shared {
    config: RotateConfig,
    opener: SourceOpener,
    context: PipelineContext,
}

/// Rotates images in the background and writes the results to a cache root.
///
/// Each request runs as its own task; decoding, resampling and file I/O run
/// on tokio's blocking pool. Requests share nothing except the cache
/// directories.
///
/// # Example
///
/// ```ignore
/// let rotator = ImageRotator::builder(RotateConfig::from_env()?).build()?;
/// let output = rotator.rotate("file:///photos/cat.jpg", 90.0).await?;
/// println!("{}", output.uri());
/// ```
#[derive(Clone)]
pub struct ImageRotator {
    shared: Arc<Shared>,
    runtime: Handle,
}

/// Builder for [`ImageRotator`].
pub struct ImageRotatorBuilder {
    config: RotateConfig,
    resolver: Option<Arc<dyn ContentResolver>>,
    probe: Option<Arc<dyn SpaceProbe>>,
    runtime: Option<Handle>,
}

impl ImageRotatorBuilder {
    /// Serve local URIs with a custom resolver instead of [`FileContentResolver`].
    pub fn content_resolver<R>(mut self, resolver: R) -> Self
    where
        R: ContentResolver + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Replace [`DiskSpaceProbe`] for cache root selection.
    pub fn space_probe<P>(mut self, probe: P) -> Self
    where
        P: SpaceProbe + 'static,
    {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Spawn work on this runtime instead of the current one.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Validate the config and start the rotator.
    ///
    /// Kicks off a sweep of both cache roots when `sweep_on_start` is set.
    pub fn build(self) -> Result<ImageRotator, RotateError> {
        self.config
            .validate()
            .map_err(|e| RotateError::InvalidArgument(e.to_string()))?;

        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()?,
        };
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(FileContentResolver));
        let probe = self.probe.unwrap_or_else(|| Arc::new(DiskSpaceProbe));

        let fetcher = RemoteFetcher::new(self.config.connect_timeout())?;
        let opener = SourceOpener::new(resolver, fetcher);
        let context = PipelineContext::new(&self.config, probe);
        let rotator = ImageRotator {
            shared: Arc::new(Shared {
                config: self.config,
                opener,
                context,
            }),
            runtime,
        };

        if rotator.shared.config.sweep_on_start {
            // Detached; rotations do not wait for it
            drop(rotator.sweep());
        }
        Ok(rotator)
    }
}

impl ImageRotator {
    pub fn builder(config: RotateConfig) -> ImageRotatorBuilder {
        ImageRotatorBuilder {
            config,
            resolver: None,
            probe: None,
            runtime: None,
        }
    }

    /// Rotator with default collaborators on the current runtime.
    pub fn new(config: RotateConfig) -> Result<Self, RotateError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &RotateConfig {
        &self.shared.config
    }

    pub fn cache_directories(&self) -> &CacheDirectories {
        &self.shared.context.cache
    }

    /// Rotate `source` by `angle` degrees clockwise in the background.
    ///
    /// Arguments are checked before anything is spawned; a rejected request
    /// returns the error and fires neither callback. Otherwise exactly one
    /// callback fires: `on_success` with the `file://` location of the
    /// output, or `on_error` with a message.
    ///
    /// # Arguments
    ///
    /// * `source` - `file://`, `content://` or remote URL
    /// * `angle` - Rotation in degrees (positive = clockwise), any finite value
    pub fn rotate_image<S, E>(
        &self,
        source: &str,
        angle: f64,
        on_success: S,
        on_error: E,
    ) -> Result<JoinHandle<()>, RotateError>
    where
        S: FnOnce(String) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        let request = RotationRequest::new(source, angle)?;
        let shared = Arc::clone(&self.shared);
        let runtime = self.runtime.clone();

        Ok(self.runtime.spawn(async move {
            match run_isolated(&runtime, shared, request).await {
                Ok(output) => on_success(output.uri()),
                Err(err) => on_error(err.to_string()),
            }
        }))
    }

    /// Rotate `source` by `angle` degrees clockwise and wait for the result.
    pub async fn rotate(&self, source: &str, angle: f64) -> Result<RotatedOutput, RotateError> {
        let request = RotationRequest::new(source, angle)?;
        run_isolated(&self.runtime, Arc::clone(&self.shared), request).await
    }

    /// Delete leftover output files from both cache roots.
    ///
    /// Files handed out by earlier rotations are deleted too, as are the
    /// outputs of rotations still in flight if they land first.
    pub fn sweep(&self) -> JoinHandle<SweepReport> {
        let roots: Vec<PathBuf> = self
            .cache_directories()
            .roots()
            .map(|p| p.to_path_buf())
            .collect();
        let prefix = self.shared.config.temp_file_prefix.clone();

        self.runtime
            .spawn_blocking(move || sweep_directories(roots.iter().map(PathBuf::as_path), &prefix))
    }

    /// Teardown sweep. Hosts call this when they are done with the outputs.
    pub fn shutdown(&self) -> JoinHandle<SweepReport> {
        info!("shutting down image rotator");
        self.sweep()
    }
}

impl std::fmt::Debug for ImageRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRotator")
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

/// Run a request on its own task so a panic in host code (a
/// [`ContentResolver`], say) still ends in an error.
async fn run_isolated(
    runtime: &Handle,
    shared: Arc<Shared>,
    request: RotationRequest,
) -> Result<RotatedOutput, RotateError> {
    let source = request.source.clone();
    match runtime.spawn(run(shared, request)).await {
        Ok(result) => result,
        Err(join_error) => {
            error!(uri = %source, error = %join_error, "rotation task aborted");
            Err(RotateError::Worker(join_error.to_string()))
        }
    }
}

async fn run(shared: Arc<Shared>, request: RotationRequest) -> Result<RotatedOutput, RotateError> {
    let mut task = RotationTask::new(request);
    task.transition(RotationState::Decoding);

    let source = task.request().source.clone();
    let bytes = match shared.opener.open(&source).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let err = RotateError::from(e);
            task.fail(&err);
            return Err(err);
        }
    };
    let metadata_source = shared.opener.local_path(&source);

    let worker = tokio::task::spawn_blocking(move || {
        let result = task.process(&bytes, metadata_source.as_deref(), &shared.context);
        (task, result)
    });

    match worker.await {
        Ok((_, Ok(output))) => Ok(output),
        Ok((mut task, Err(err))) => {
            task.fail(&err);
            Err(err)
        }
        Err(join_error) => {
            // The task state died with the worker
            error!(uri = %source, error = %join_error, "rotation worker aborted");
            Err(RotateError::Worker(join_error.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{encode_png_bytes, gradient_rgba, FixedSpaceProbe};
    use reqwest::Url;
    use std::fs;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn config(dir: &TempDir) -> RotateConfig {
        let mut config = RotateConfig::default();
        config.internal_cache_dir = Some(dir.path().to_path_buf());
        config.sweep_on_start = false;
        config
    }

    fn rotator(dir: &TempDir) -> ImageRotator {
        ImageRotator::builder(config(dir))
            .space_probe(FixedSpaceProbe::default())
            .build()
            .unwrap()
    }

    fn write_png(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, encode_png_bytes(&gradient_rgba(12, 6))).unwrap();
        Url::from_file_path(&path).unwrap().to_string()
    }

    #[test]
    fn test_build_without_runtime_fails() {
        let dir = TempDir::new().unwrap();
        let result = ImageRotator::builder(config(&dir)).build();
        assert!(matches!(result, Err(RotateError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.quality = 0;
        let result = ImageRotator::builder(config).build();
        assert!(matches!(result, Err(RotateError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_rotate_returns_output() {
        let dir = TempDir::new().unwrap();
        let source = write_png(&dir, "input.png");

        let output = rotator(&dir).rotate(&source, -90.0).await.unwrap();
        assert_eq!((output.width, output.height), (6, 12));
        assert!(output.uri().starts_with("file://"));
        assert!(output.path.exists());
    }

    #[tokio::test]
    async fn test_success_callback_fires_once() {
        let dir = TempDir::new().unwrap();
        let source = write_png(&dir, "input.png");
        let (tx, rx) = oneshot::channel();
        let (err_tx, mut err_rx) = oneshot::channel::<String>();

        let handle = rotator(&dir)
            .rotate_image(
                &source,
                30.0,
                move |uri| {
                    let _ = tx.send(uri);
                },
                move |message| {
                    let _ = err_tx.send(message);
                },
            )
            .unwrap();
        handle.await.unwrap();

        let uri = rx.await.unwrap();
        let path = Url::parse(&uri).unwrap().to_file_path().unwrap();
        assert!(path.exists());
        assert!(err_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_request_spawns_nothing() {
        let dir = TempDir::new().unwrap();
        let result = rotator(&dir).rotate_image(
            "",
            90.0,
            |_| panic!("success must not fire"),
            |_| panic!("error must not fire"),
        );
        assert!(matches!(result, Err(RotateError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = Url::from_file_path(dir.path().join("gone.png"))
            .unwrap()
            .to_string();

        let err = rotator(&dir).rotate(&source, 90.0).await.unwrap_err();
        assert!(matches!(err, RotateError::SourceUnavailable(_)), "{:?}", err);
    }

    #[tokio::test]
    async fn test_build_sweeps_when_enabled() {
        let dir = TempDir::new().unwrap();
        let stale = dir.path().join("rotated_image_stale.webp");
        fs::write(&stale, b"x").unwrap();

        let mut config = config(&dir);
        config.sweep_on_start = true;
        let _rotator = ImageRotator::builder(config)
            .space_probe(FixedSpaceProbe::default())
            .build()
            .unwrap();

        for _ in 0..100 {
            if !stale.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("startup sweep did not remove {}", stale.display());
    }

    #[tokio::test]
    async fn test_sweep_and_shutdown() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rotated_image_old.jpg"), b"x").unwrap();
        fs::write(dir.path().join("keep.jpg"), b"x").unwrap();

        let rotator = rotator(&dir);
        let report = rotator.sweep().await.unwrap();
        assert_eq!(report.removed, 1);
        assert!(dir.path().join("keep.jpg").exists());

        fs::write(dir.path().join("rotated_image_new.png"), b"x").unwrap();
        let report = rotator.shutdown().await.unwrap();
        assert_eq!(report.removed, 1);
    }
}
