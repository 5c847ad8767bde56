//! The render backend seam and the values that cross it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::options::GenerationOptions;
use crate::types::SourceRef;

/// Upscaler used for upscale jobs.
pub const DEFAULT_UPSCALER: &str = "R-ESRGAN 2x+";

/// Upscale factor used for upscale jobs.
pub const DEFAULT_UPSCALE_FACTOR: u32 = 2;

/// A text-to-image render request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextToImageRequest {
    pub options: GenerationOptions,
}

impl From<GenerationOptions> for TextToImageRequest {
    fn from(options: GenerationOptions) -> Self {
        Self { options }
    }
}

/// Images and seeds produced by one text-to-image call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextToImageOutput {
    /// Base64-encoded images, in render order.
    pub images: Vec<String>,
    /// Seed of each image, parallel to `images`.
    pub seeds: Vec<i64>,
    /// Subseed of each image, parallel to `images`.
    pub subseeds: Vec<i64>,
    /// Model description reported by the backend (may be empty).
    pub model: String,
}

/// Upscale one already-rendered image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpscaleRequest {
    pub resize_mode: u32,
    pub upscaling_resize: u32,
    pub upscaler: String,
    /// Base64-encoded source image.
    pub image: String,
}

impl UpscaleRequest {
    /// Upscale `image` with the default upscaler and factor.
    pub fn with_defaults(image: String) -> Self {
        Self {
            resize_mode: 0,
            upscaling_resize: DEFAULT_UPSCALE_FACTOR,
            upscaler: DEFAULT_UPSCALER.to_string(),
            image,
        }
    }
}

/// A single upscaled image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpscaledImage {
    pub image: String,
}

/// Progress of whatever the backend is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderProgress {
    /// Completion in `0.0..=1.0`.
    pub fraction: f64,
    /// Estimated seconds until completion.
    pub eta_seconds: f64,
}

/// The outcome of a successful job, as delivered to the front door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub images: Vec<String>,
    pub seeds: Vec<i64>,
    pub subseeds: Vec<i64>,
    pub model: String,
    pub source_ref: SourceRef,
}

impl GenerationResult {
    pub fn from_output(output: TextToImageOutput, source_ref: SourceRef) -> Self {
        Self {
            images: output.images,
            seeds: output.seeds,
            subseeds: output.subseeds,
            model: output.model,
            source_ref,
        }
    }
}

/// A backend able to render one job at a time.
///
/// Implementations are not expected to serialize calls themselves; the
/// worker guarantees at most one render call is in flight. Progress
/// queries may arrive concurrently with a render.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn text_to_image(
        &self,
        request: &TextToImageRequest,
    ) -> Result<TextToImageOutput, BackendError>;

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<UpscaledImage, BackendError>;

    async fn progress(&self) -> Result<RenderProgress, BackendError>;

    /// Names of the textual-inversion embeddings the backend has loaded.
    async fn embeddings(&self) -> Result<Vec<String>, BackendError>;
}
