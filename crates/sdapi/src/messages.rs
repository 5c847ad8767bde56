//! Wire types for the Stable Diffusion WebUI `/sdapi/v1` endpoints.
//!
//! The WebUI reports seeds inside `info`, a JSON document serialized into
//! a string field of the txt2img response, and the model only inside its
//! free-form infotext. Both are parsed here so the client stays a thin
//! transport layer.

use std::collections::HashMap;
use std::sync::LazyLock;

use imagine_core::options::GenerationOptions;
use imagine_core::render::{RenderProgress, UpscaleRequest};
use regex::Regex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// txt2img
// ---------------------------------------------------------------------------

/// Body of `POST /sdapi/v1/txt2img`.
#[derive(Debug, Clone, Serialize)]
pub struct Txt2ImgBody<'a> {
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub width: u32,
    pub height: u32,
    pub restore_faces: bool,
    pub enable_hr: bool,
    pub denoising_strength: f64,
    pub batch_size: u32,
    /// Number of batches.
    pub n_iter: u32,
    pub seed: i64,
    pub subseed: i64,
    pub subseed_strength: f64,
    pub sampler_name: &'a str,
    pub cfg_scale: f64,
    pub steps: u32,
    pub save_images: bool,
}

impl<'a> From<&'a GenerationOptions> for Txt2ImgBody<'a> {
    fn from(options: &'a GenerationOptions) -> Self {
        Self {
            prompt: &options.prompt,
            negative_prompt: &options.negative_prompt,
            width: options.width,
            height: options.height,
            restore_faces: options.restore_faces,
            enable_hr: false,
            denoising_strength: 0.0,
            batch_size: options.batch_size,
            n_iter: options.batch_count,
            seed: options.seed,
            subseed: options.subseed,
            subseed_strength: options.subseed_strength,
            sampler_name: &options.sampler,
            cfg_scale: options.cfg_scale,
            steps: options.steps,
            save_images: false,
        }
    }
}

/// Response of `POST /sdapi/v1/txt2img`.
#[derive(Debug, Clone, Deserialize)]
pub struct Txt2ImgResponse {
    #[serde(default)]
    pub images: Vec<String>,
    /// JSON document encoded as a string; see [`GenerationInfo`].
    #[serde(default)]
    pub info: String,
}

/// The fields of the txt2img `info` document this client uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationInfo {
    #[serde(default)]
    pub all_seeds: Vec<i64>,
    #[serde(default)]
    pub all_subseeds: Vec<i64>,
}

/// Parse the string-encoded `info` document.
pub fn parse_info(info: &str) -> Result<GenerationInfo, serde_json::Error> {
    serde_json::from_str(info)
}

static MODEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r", (Model hash: \w+, Model: [^,]+),").expect("model regex is valid")
});

/// Extract `Model hash: …, Model: …` from the infotext embedded in `info`.
///
/// Returns an empty string when the infotext carries no model.
pub fn extract_model(info: &str) -> String {
    MODEL_REGEX
        .captures(info)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// extra-single-image
// ---------------------------------------------------------------------------

/// Body of `POST /sdapi/v1/extra-single-image`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtraSingleImageBody<'a> {
    pub resize_mode: u32,
    pub upscaling_resize: u32,
    pub upscaler_1: &'a str,
    pub image: &'a str,
}

impl<'a> From<&'a UpscaleRequest> for ExtraSingleImageBody<'a> {
    fn from(request: &'a UpscaleRequest) -> Self {
        Self {
            resize_mode: request.resize_mode,
            upscaling_resize: request.upscaling_resize,
            upscaler_1: &request.upscaler,
            image: &request.image,
        }
    }
}

/// Response of `POST /sdapi/v1/extra-single-image`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtraSingleImageResponse {
    pub image: String,
}

// ---------------------------------------------------------------------------
// progress / embeddings
// ---------------------------------------------------------------------------

/// Response of `GET /sdapi/v1/progress`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProgressResponse {
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub eta_relative: f64,
}

impl From<ProgressResponse> for RenderProgress {
    fn from(response: ProgressResponse) -> Self {
        Self {
            fraction: response.progress.clamp(0.0, 1.0),
            eta_seconds: response.eta_relative.max(0.0),
        }
    }
}

/// Response of `GET /sdapi/v1/embeddings`.
///
/// Per-embedding metadata is not used, so values are kept opaque.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default)]
    pub loaded: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub skipped: HashMap<String, serde_json::Value>,
}

impl EmbeddingsResponse {
    /// Names of the loaded embeddings, sorted.
    pub fn loaded_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaded.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use imagine_core::dimensions::PRESET_512;

    use super::*;

    const INFO: &str = r#"{"prompt": "a cat", "all_seeds": [11, 12], "all_subseeds": [21, 22], "infotexts": ["a cat\nSteps: 20, Sampler: Euler a, CFG scale: 9, Seed: 11, Size: 512x512, Model hash: 1d1e459f9f, Model: anything-v4.5, Version: v1.2.0"]}"#;

    #[test]
    fn info_seeds_parsed() {
        let info = parse_info(INFO).unwrap();
        assert_eq!(info.all_seeds, vec![11, 12]);
        assert_eq!(info.all_subseeds, vec![21, 22]);
    }

    #[test]
    fn model_extracted_from_infotext() {
        assert_eq!(
            extract_model(INFO),
            "Model hash: 1d1e459f9f, Model: anything-v4.5"
        );
    }

    #[test]
    fn missing_model_is_empty() {
        assert_eq!(extract_model(r#"{"all_seeds": [1]}"#), "");
    }

    #[test]
    fn malformed_info_rejected() {
        assert!(parse_info("not json").is_err());
    }

    #[test]
    fn txt2img_body_maps_batch_count_to_n_iter() {
        let mut options = GenerationOptions::new("a cat", PRESET_512);
        options.batch_count = 3;
        options.batch_size = 2;

        let body = serde_json::to_value(Txt2ImgBody::from(&options)).unwrap();
        assert_eq!(body["n_iter"], 3);
        assert_eq!(body["batch_size"], 2);
        assert_eq!(body["sampler_name"], "Euler a");
        assert_eq!(body["seed"], -1);
    }

    #[test]
    fn upscale_body_uses_upscaler_1() {
        let request = UpscaleRequest::with_defaults("aGVsbG8=".to_string());
        let body = serde_json::to_value(ExtraSingleImageBody::from(&request)).unwrap();
        assert_eq!(body["upscaler_1"], "R-ESRGAN 2x+");
        assert_eq!(body["upscaling_resize"], 2);
        assert_eq!(body["resize_mode"], 0);
    }

    #[test]
    fn embeddings_sorted_by_name() {
        let json = r#"{"loaded": {"zeta": {}, "alpha": {"step": 100}, "mid": {}}, "skipped": {"old": {}}}"#;
        let response: EmbeddingsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.loaded_names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn progress_clamped() {
        let response: ProgressResponse =
            serde_json::from_str(r#"{"progress": 1.4, "eta_relative": -2.0}"#).unwrap();
        let progress = RenderProgress::from(response);
        assert_eq!(progress.fraction, 1.0);
        assert_eq!(progress.eta_seconds, 0.0);
    }
}
