//! Render dimension presets, dimension validation, and the process-wide
//! [`DefaultsStore`].

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/* --------------------------------------------------------------------------
Named constants
-------------------------------------------------------------------------- */

/// A width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The shorter of the two sides.
    pub fn short_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Square 512px preset (the startup default).
pub const PRESET_512: Dimensions = Dimensions::new(512, 512);

/// Square 768px preset.
pub const PRESET_768: Dimensions = Dimensions::new(768, 768);

/// All presets the default dimensions may be set to.
pub const SUPPORTED_PRESETS: &[Dimensions] = &[PRESET_512, PRESET_768];

/// Smallest explicit width or height accepted for a job.
pub const MIN_DIMENSION: u32 = 64;

/// Largest explicit width or height accepted for a job.
pub const MAX_DIMENSION: u32 = 2048;

/// Explicit dimensions must be a multiple of this.
pub const DIMENSION_STEP: u32 = 8;

/* --------------------------------------------------------------------------
Validation functions
-------------------------------------------------------------------------- */

/// Validate that the pair is one of [`SUPPORTED_PRESETS`].
pub fn validate_preset(width: u32, height: u32) -> Result<Dimensions, CoreError> {
    let dims = Dimensions::new(width, height);
    if SUPPORTED_PRESETS.contains(&dims) {
        Ok(dims)
    } else {
        let valid: Vec<String> = SUPPORTED_PRESETS
            .iter()
            .map(|p| format!("{}x{}", p.width, p.height))
            .collect();
        Err(CoreError::Validation(format!(
            "Unsupported default dimensions {width}x{height}. Valid presets: {}",
            valid.join(", ")
        )))
    }
}

/// Validate explicit per-job dimensions: bounded and a multiple of 8.
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), CoreError> {
    for (name, value) in [("Width", width), ("Height", height)] {
        if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
            return Err(CoreError::Validation(format!(
                "{name} must be between {MIN_DIMENSION} and {MAX_DIMENSION}px (got {value})"
            )));
        }
        if value % DIMENSION_STEP != 0 {
            return Err(CoreError::Validation(format!(
                "{name} must be a multiple of {DIMENSION_STEP} (got {value})"
            )));
        }
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Defaults store
-------------------------------------------------------------------------- */

/// Holds the default render dimensions used by fresh jobs that do not
/// override them.
///
/// Width and height live in one value behind one lock, so a reader always
/// sees a pair that was set together.
#[derive(Debug)]
pub struct DefaultsStore {
    current: RwLock<Dimensions>,
}

impl DefaultsStore {
    /// Create a store starting at the given preset.
    pub fn new(initial: Dimensions) -> Result<Self, CoreError> {
        let initial = validate_preset(initial.width, initial.height)?;
        Ok(Self {
            current: RwLock::new(initial),
        })
    }

    /// Current default dimensions.
    pub fn get(&self) -> Dimensions {
        // A poisoned lock still holds a complete pair; writers never leave
        // it half-updated.
        *self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace both defaults at once.
    pub fn set(&self, width: u32, height: u32) -> Result<Dimensions, CoreError> {
        let dims = validate_preset(width, height)?;
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = dims;
        Ok(dims)
    }
}

impl Default for DefaultsStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(PRESET_512),
        }
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
