//! REST API client for the Stable Diffusion WebUI HTTP endpoints.
//!
//! Wraps text-to-image, single-image upscaling, progress and embedding
//! listing using [`reqwest`], and exposes them to the queue through
//! [`RenderBackend`].

use async_trait::async_trait;
use imagine_core::error::BackendError;
use imagine_core::render::{
    RenderBackend, RenderProgress, TextToImageOutput, TextToImageRequest, UpscaleRequest,
    UpscaledImage,
};

use crate::config::SdApiConfig;
use crate::messages::{
    extract_model, parse_info, EmbeddingsResponse, ExtraSingleImageBody,
    ExtraSingleImageResponse, ProgressResponse, Txt2ImgBody, Txt2ImgResponse,
};

/// HTTP client for a single WebUI instance.
#[derive(Debug, Clone)]
pub struct StableDiffusionApi {
    client: reqwest::Client,
    host: String,
}

/// Errors from the WebUI REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum SdApiError {
    /// No host was configured.
    #[error("Stable Diffusion API host is missing")]
    MissingHost,

    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The WebUI returned a non-2xx status code.
    #[error("Stable Diffusion API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The `info` document of a txt2img response could not be parsed.
    #[error("Invalid generation info: {0}")]
    InvalidInfo(#[from] serde_json::Error),
}

impl From<SdApiError> for BackendError {
    fn from(err: SdApiError) -> Self {
        match err {
            SdApiError::ApiError { status, body } => BackendError::Status { status, body },
            SdApiError::Request(e) if e.is_decode() => BackendError::InvalidResponse(e.to_string()),
            SdApiError::Request(e) => BackendError::Transport(e.to_string()),
            other @ SdApiError::InvalidInfo(_) => BackendError::InvalidResponse(other.to_string()),
            other @ SdApiError::MissingHost => BackendError::Transport(other.to_string()),
        }
    }
}

impl StableDiffusionApi {
    /// Create a new API client for a WebUI instance.
    ///
    /// Fails with [`SdApiError::MissingHost`] when the host is empty.
    pub fn new(config: SdApiConfig) -> Result<Self, SdApiError> {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: SdApiConfig) -> Result<Self, SdApiError> {
        let host = config.host.trim().trim_end_matches('/').to_string();
        if host.is_empty() {
            return Err(SdApiError::MissingHost);
        }
        Ok(Self { client, host })
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Render images for `request`.
    ///
    /// Sends `POST /sdapi/v1/txt2img` and decodes the seeds and model
    /// from the response's `info` document.
    pub async fn txt2img(
        &self,
        request: &TextToImageRequest,
    ) -> Result<TextToImageOutput, SdApiError> {
        let url = format!("{}/sdapi/v1/txt2img", self.host);
        let response = self
            .client
            .post(&url)
            .json(&Txt2ImgBody::from(&request.options))
            .send()
            .await?;

        let body: Txt2ImgResponse = Self::parse_response(response).await?;
        let info = parse_info(&body.info).inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "Unexpected txt2img info document");
        })?;

        Ok(TextToImageOutput {
            images: body.images,
            seeds: info.all_seeds,
            subseeds: info.all_subseeds,
            model: extract_model(&body.info),
        })
    }

    /// Upscale a single image with `POST /sdapi/v1/extra-single-image`.
    pub async fn extra_single_image(
        &self,
        request: &UpscaleRequest,
    ) -> Result<UpscaledImage, SdApiError> {
        let response = self
            .client
            .post(format!("{}/sdapi/v1/extra-single-image", self.host))
            .json(&ExtraSingleImageBody::from(request))
            .send()
            .await?;

        let body: ExtraSingleImageResponse = Self::parse_response(response).await?;
        Ok(UpscaledImage { image: body.image })
    }

    /// Progress of the render currently running on the WebUI.
    pub async fn current_progress(&self) -> Result<RenderProgress, SdApiError> {
        let response = self
            .client
            .get(format!("{}/sdapi/v1/progress", self.host))
            .send()
            .await?;

        let body: ProgressResponse = Self::parse_response(response).await?;
        Ok(body.into())
    }

    /// Embeddings loaded for the current model.
    pub async fn get_embeddings(&self) -> Result<EmbeddingsResponse, SdApiError> {
        let response = self
            .client
            .get(format!("{}/sdapi/v1/embeddings", self.host))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or an [`SdApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, SdApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SdApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SdApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RenderBackend for StableDiffusionApi {
    async fn text_to_image(
        &self,
        request: &TextToImageRequest,
    ) -> Result<TextToImageOutput, BackendError> {
        Ok(self.txt2img(request).await?)
    }

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<UpscaledImage, BackendError> {
        Ok(self.extra_single_image(request).await?)
    }

    async fn progress(&self) -> Result<RenderProgress, BackendError> {
        Ok(self.current_progress().await?)
    }

    async fn embeddings(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.get_embeddings().await?.loaded_names())
    }
}
