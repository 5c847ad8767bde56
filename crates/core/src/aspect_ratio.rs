//! `--ar W:H` prompt flag handling.
//!
//! Users can append an aspect ratio to a prompt (`a lighthouse --ar 16:9`).
//! The flag is stripped from the prompt and turned into concrete render
//! dimensions: the short side keeps the default short side and the long
//! side is scaled, rounded up to a multiple of [`DIMENSION_STEP`].

use std::sync::LazyLock;

use regex::Regex;

use crate::dimensions::{validate_dimensions, Dimensions, DIMENSION_STEP};
use crate::error::CoreError;

static ASPECT_RATIO_FLAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)--ar\s+(\d+)\s*:\s*(\d+)(?:\s|$)").expect("aspect ratio regex is valid")
});

/// A prompt with any aspect-ratio flag removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrompt {
    pub prompt: String,
    pub dimensions: Option<Dimensions>,
}

/// Strip a `--ar W:H` flag from `prompt` and compute the dimensions it asks
/// for, relative to `base`.
pub fn parse_prompt(prompt: &str, base: Dimensions) -> Result<ParsedPrompt, CoreError> {
    let Some(caps) = ASPECT_RATIO_FLAG.captures(prompt) else {
        return Ok(ParsedPrompt {
            prompt: prompt.trim().to_string(),
            dimensions: None,
        });
    };

    let ratio_w = parse_ratio_part(&caps[1])?;
    let ratio_h = parse_ratio_part(&caps[2])?;
    let dimensions = dimensions_for_ratio(ratio_w, ratio_h, base.short_side());
    validate_dimensions(dimensions.width, dimensions.height)?;

    let stripped = ASPECT_RATIO_FLAG.replace(prompt, " ");
    let prompt = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    Ok(ParsedPrompt {
        prompt,
        dimensions: Some(dimensions),
    })
}

fn parse_ratio_part(raw: &str) -> Result<u32, CoreError> {
    match raw.parse::<u32>() {
        Ok(0) | Err(_) => Err(CoreError::Validation(format!(
            "Aspect ratio parts must be positive integers (got '{raw}')"
        ))),
        Ok(value) => Ok(value),
    }
}

/// Keep `short_side` on the shorter axis and scale the other one.
pub fn dimensions_for_ratio(ratio_w: u32, ratio_h: u32, short_side: u32) -> Dimensions {
    if ratio_w >= ratio_h {
        Dimensions::new(scale_side(short_side, ratio_w, ratio_h), short_side)
    } else {
        Dimensions::new(short_side, scale_side(short_side, ratio_h, ratio_w))
    }
}

fn scale_side(short_side: u32, long: u32, short: u32) -> u32 {
    let scaled = (u64::from(short_side) * u64::from(long)).div_ceil(u64::from(short));
    let step = u64::from(DIMENSION_STEP);
    let aligned = scaled.div_ceil(step) * step;
    u32::try_from(aligned).unwrap_or(u32::MAX)
}
