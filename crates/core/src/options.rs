//! Generation parameters, their defaults, and validation.

use serde::{Deserialize, Serialize};

use crate::dimensions::{validate_dimensions, Dimensions};
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Seed value asking the backend to pick a fresh random seed.
pub const RANDOM_SEED: i64 = -1;

pub const DEFAULT_STEPS: u32 = 20;
pub const DEFAULT_CFG_SCALE: f64 = 9.0;
pub const DEFAULT_SAMPLER: &str = "Euler a";
pub const DEFAULT_RESTORE_FACES: bool = false;
/// Images per request for fresh jobs and variations.
pub const DEFAULT_BATCH_COUNT: u32 = 4;
pub const DEFAULT_BATCH_SIZE: u32 = 1;
pub const DEFAULT_NEGATIVE_PROMPT: &str = "ugly, tiling, poorly drawn hands, poorly drawn feet, \
    poorly drawn face, out of frame, mutation, mutated, extra limbs, extra legs, extra arms, \
    disfigured, deformed, cross-eye, body out of frame, blurry, bad art, bad anatomy, \
    blurred, text, watermark, grainy";

pub const MIN_STEPS: u32 = 1;
pub const MAX_STEPS: u32 = 50;
pub const MIN_CFG_SCALE: f64 = 1.0;
pub const MAX_CFG_SCALE: f64 = 30.0;
pub const MAX_BATCH_COUNT: u32 = 8;
pub const MAX_BATCH_SIZE: u32 = 8;

/// Sampler names the backend understands.
pub const SUPPORTED_SAMPLERS: &[&str] = &[
    "DPM++ 2M Karras",
    "Euler a",
    "DDIM",
    "PLMS",
    "UniPC",
    "Heun",
    "Euler",
    "LMS",
    "LMS Karras",
    "DPM2 a",
    "DPM2 a Karras",
    "DPM2",
    "DPM2 Karras",
    "DPM fast",
    "DPM adaptive",
    "DPM++ 2S a",
    "DPM++ 2M",
    "DPM++ SDE",
    "DPM++ 2S a Karras",
    "DPM++ SDE Karras",
];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Everything the backend needs to reproduce an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub sampler: String,
    pub cfg_scale: f64,
    pub seed: i64,
    pub subseed: i64,
    pub subseed_strength: f64,
    pub steps: u32,
    pub restore_faces: bool,
    /// Number of sequential batches (`n_iter`).
    pub batch_count: u32,
    /// Images per batch.
    pub batch_size: u32,
}

impl GenerationOptions {
    /// Default options for `prompt` rendered at `dimensions`.
    pub fn new(prompt: impl Into<String>, dimensions: Dimensions) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            width: dimensions.width,
            height: dimensions.height,
            sampler: DEFAULT_SAMPLER.to_string(),
            cfg_scale: DEFAULT_CFG_SCALE,
            seed: RANDOM_SEED,
            subseed: RANDOM_SEED,
            subseed_strength: 0.0,
            steps: DEFAULT_STEPS,
            restore_faces: DEFAULT_RESTORE_FACES,
            batch_count: DEFAULT_BATCH_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Total number of images one render of these options produces.
    pub fn image_count(&self) -> u32 {
        self.batch_count.saturating_mul(self.batch_size)
    }

    /// Validate user-controllable fields.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.prompt.trim().is_empty() {
            return Err(CoreError::Validation("Prompt must not be empty".to_string()));
        }
        validate_dimensions(self.width, self.height)?;
        if !(MIN_STEPS..=MAX_STEPS).contains(&self.steps) {
            return Err(CoreError::Validation(format!(
                "Steps must be between {MIN_STEPS} and {MAX_STEPS} (got {})",
                self.steps
            )));
        }
        if !(MIN_CFG_SCALE..=MAX_CFG_SCALE).contains(&self.cfg_scale) {
            return Err(CoreError::Validation(format!(
                "CFG scale must be between {MIN_CFG_SCALE} and {MAX_CFG_SCALE} (got {})",
                self.cfg_scale
            )));
        }
        if !SUPPORTED_SAMPLERS.contains(&self.sampler.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown sampler '{}'",
                self.sampler
            )));
        }
        if !(1..=MAX_BATCH_COUNT).contains(&self.batch_count) {
            return Err(CoreError::Validation(format!(
                "Batch count must be between 1 and {MAX_BATCH_COUNT} (got {})",
                self.batch_count
            )));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(CoreError::Validation(format!(
                "Batch size must be between 1 and {MAX_BATCH_SIZE} (got {})",
                self.batch_size
            )));
        }
        Ok(())
    }
}
