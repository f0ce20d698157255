//! The per-request rotation state machine.
//!
//! A [`RotationTask`] walks one request through
//! `Idle → Decoding → Rotating → Encoding → [CopyingMetadata] → Succeeded`,
//! dropping to `Failed` from any non-terminal state. Everything past opening
//! the source is synchronous and runs on the blocking pool.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, error, info, warn};

use crate::config::RotateConfig;
use crate::decode::{decode_image, DecodeLimits, DecodedImage};
use crate::encode::{encode_image, OutputFormat, EXIF_MIME_TYPE};
use crate::error::RotateError;
use crate::metadata::copy_metadata;
use crate::source::SourceUri;
use crate::storage::{create_temp_file, CacheDirectories, SpaceProbe};
use crate::transform::{apply_rotation, InterpolationFilter};

/// A validated rotation request.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationRequest {
    pub source: SourceUri,
    /// Degrees, clockwise-positive, always finite.
    pub angle: f64,
}

impl RotationRequest {
    /// Validate the raw arguments without touching the filesystem or network.
    pub fn new(source: &str, angle: f64) -> Result<Self, RotateError> {
        if !angle.is_finite() {
            return Err(RotateError::InvalidArgument(format!(
                "Rotation angle must be finite, got {angle}"
            )));
        }
        let source = SourceUri::parse(source)?;
        Ok(Self { source, angle })
    }
}

/// Where a request is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    Idle,
    Decoding,
    Rotating,
    Encoding,
    CopyingMetadata,
    Succeeded,
    Failed,
}

impl RotationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RotationState::Succeeded | RotationState::Failed)
    }

    pub fn can_transition_to(self, next: RotationState) -> bool {
        use RotationState::*;

        match (self, next) {
            (Idle, Decoding)
            | (Decoding, Rotating)
            | (Rotating, Encoding)
            | (Encoding, CopyingMetadata)
            | (Encoding, Succeeded)
            | (CopyingMetadata, Succeeded) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationState::Idle => "idle",
            RotationState::Decoding => "decoding",
            RotationState::Rotating => "rotating",
            RotationState::Encoding => "encoding",
            RotationState::CopyingMetadata => "copying_metadata",
            RotationState::Succeeded => "succeeded",
            RotationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A rotated image persisted in a cache root. The caller owns the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotatedOutput {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl RotatedOutput {
    /// `file://` location of the output.
    pub fn uri(&self) -> String {
        Url::from_file_path(&self.path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("file://{}", self.path.display()))
    }
}

/// Settings shared by every run, derived once from the config.
pub(crate) struct PipelineContext {
    pub cache: CacheDirectories,
    pub probe: Arc<dyn SpaceProbe>,
    pub prefix: String,
    pub quality: u8,
    pub filter: InterpolationFilter,
    pub limits: DecodeLimits,
}

impl PipelineContext {
    pub fn new(config: &RotateConfig, probe: Arc<dyn SpaceProbe>) -> Self {
        Self {
            cache: config.cache_directories(),
            probe,
            prefix: config.temp_file_prefix.clone(),
            quality: config.quality,
            filter: config.filter,
            limits: config.decode_limits(),
        }
    }
}

/// One request's trip through the pipeline.
#[derive(Debug)]
pub(crate) struct RotationTask {
    request: RotationRequest,
    state: RotationState,
}

impl RotationTask {
    pub fn new(request: RotationRequest) -> Self {
        Self {
            request,
            state: RotationState::Idle,
        }
    }

    pub fn request(&self) -> &RotationRequest {
        &self.request
    }

    #[cfg(test)]
    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn transition(&mut self, next: RotationState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(
            uri = %self.request.source,
            from = %self.state,
            state = %next,
            "rotation state changed"
        );
        self.state = next;
    }

    /// Decode, rotate, encode and persist. Expects to be in `Decoding`.
    ///
    /// On error the state is left where the failure happened; the caller
    /// reports it through [`RotationTask::fail`].
    pub fn process(
        &mut self,
        bytes: &[u8],
        metadata_source: Option<&Path>,
        ctx: &PipelineContext,
    ) -> Result<RotatedOutput, RotateError> {
        let decoded = decode_image(bytes, &ctx.limits)?;
        self.rotate_and_store(decoded, metadata_source, ctx)
    }

    fn rotate_and_store(
        &mut self,
        decoded: DecodedImage,
        metadata_source: Option<&Path>,
        ctx: &PipelineContext,
    ) -> Result<RotatedOutput, RotateError> {
        self.transition(RotationState::Rotating);
        let rotated = apply_rotation(&decoded, self.request.angle, ctx.filter, &ctx.limits)?;
        drop(decoded);

        self.transition(RotationState::Encoding);
        let mime_type = rotated
            .mime_type
            .filter(|m| !m.is_empty())
            .ok_or(RotateError::UnknownFormat)?;
        let format = OutputFormat::from_mime_type(Some(mime_type));

        // Removed on drop until persisted below
        let temp = create_temp_file(&ctx.cache, ctx.probe.as_ref(), &ctx.prefix, format)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            encode_image(&rotated, format, ctx.quality, &mut writer)?;
            writer.flush()?;
        }

        if mime_type == EXIF_MIME_TYPE {
            self.transition(RotationState::CopyingMetadata);
            self.copy_exif(metadata_source, temp.path());
        }

        let (_, path) = temp.keep().map_err(|e| RotateError::Io(e.error))?;
        self.transition(RotationState::Succeeded);

        let output = RotatedOutput {
            path,
            mime_type: format.mime_type(),
            width: rotated.width,
            height: rotated.height,
        };
        info!(
            uri = %self.request.source,
            angle = self.request.angle,
            path = %output.path.display(),
            width = output.width,
            height = output.height,
            "rotated image"
        );
        Ok(output)
    }

    fn copy_exif(&self, source: Option<&Path>, dest: &Path) {
        let Some(source) = source else {
            warn!(uri = %self.request.source, "source has no local path, skipping metadata copy");
            return;
        };

        match copy_metadata(source, dest) {
            Ok(copied) => debug!(uri = %self.request.source, copied, "copied metadata"),
            Err(e) => warn!(uri = %self.request.source, error = %e, "could not copy metadata"),
        }
    }

    pub fn fail(&mut self, err: &RotateError) {
        error!(
            uri = %self.request.source,
            angle = self.request.angle,
            state = %self.state,
            error = %err,
            "rotation failed"
        );
        self.transition(RotationState::Failed);
    }
}
