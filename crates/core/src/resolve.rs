//! Turning a [`Job`] into a concrete backend request.
//!
//! Fresh jobs already carry their options. Derived jobs look up the
//! previous result in [`History`] and adjust its options:
//!
//! | kind      | seed                        | images |
//! |-----------|-----------------------------|--------|
//! | reroll    | random                      | as stored |
//! | variation | seed of the chosen image, random subseed at [`VARIATION_STRENGTH`] | [`DEFAULT_BATCH_COUNT`] |
//! | upscale   | seed + subseed of the chosen image | 1, then upscaled |
//!
//! Resolution never talks to the backend.

use crate::error::{CoreError, ResolutionError};
use crate::history::History;
use crate::job::{Job, JobKind};
use crate::options::{GenerationOptions, DEFAULT_BATCH_COUNT, RANDOM_SEED};
use crate::render::TextToImageRequest;
use crate::types::SourceRef;

/// Subseed strength used for variations.
pub const VARIATION_STRENGTH: f64 = 0.15;

/// What the worker has to ask the backend for.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPlan {
    /// One text-to-image call.
    Generate(TextToImageRequest),
    /// Regenerate a single image, then upscale it.
    Upscale(TextToImageRequest),
}

impl RenderPlan {
    pub fn request(&self) -> &TextToImageRequest {
        match self {
            RenderPlan::Generate(request) | RenderPlan::Upscale(request) => request,
        }
    }
}

/// Seed material of one image in a stored result.
#[derive(Debug, Clone, PartialEq)]
pub struct Ancestor {
    pub options: GenerationOptions,
    pub seed: i64,
    pub subseed: i64,
}

/// Look up image `index` (1-based, defaulting to 1) of the result stored
/// under `source_ref`.
pub fn lookup_ancestor(
    history: &History,
    source_ref: &SourceRef,
    index: Option<usize>,
) -> Result<Ancestor, ResolutionError> {
    let entry = history
        .get(source_ref)
        .ok_or_else(|| ResolutionError::NotFound {
            source_ref: source_ref.clone(),
        })?;

    let index = index.unwrap_or(1);
    let available = entry.result.images.len().min(entry.result.seeds.len());
    if index == 0 || index > available {
        return Err(ResolutionError::OutOfRange {
            source_ref: source_ref.clone(),
            index,
            available,
        });
    }

    let position = index - 1;
    let seed = entry.result.seeds[position];
    let subseed = entry
        .result
        .subseeds
        .get(position)
        .copied()
        .unwrap_or(RANDOM_SEED);

    Ok(Ancestor {
        options: entry.options,
        seed,
        subseed,
    })
}

/// Resolve `job` into a render plan.
pub fn resolve(job: &Job, history: &History) -> Result<RenderPlan, CoreError> {
    match job.kind {
        JobKind::Fresh => {
            let options = job.options.clone().ok_or_else(|| {
                CoreError::Validation("Fresh job has no options".to_string())
            })?;
            Ok(RenderPlan::Generate(options.into()))
        }
        JobKind::Reroll => {
            let entry = history
                .get(&job.source_ref)
                .ok_or_else(|| ResolutionError::NotFound {
                    source_ref: job.source_ref.clone(),
                })?;
            let mut options = entry.options;
            options.seed = RANDOM_SEED;
            Ok(RenderPlan::Generate(options.into()))
        }
        JobKind::Variation => {
            let ancestor = lookup_ancestor(history, &job.source_ref, job.source_index)?;
            let mut options = ancestor.options;
            options.seed = ancestor.seed;
            options.subseed = RANDOM_SEED;
            options.subseed_strength = VARIATION_STRENGTH;
            options.batch_count = DEFAULT_BATCH_COUNT;
            options.batch_size = 1;
            Ok(RenderPlan::Generate(options.into()))
        }
        JobKind::Upscale => {
            let ancestor = lookup_ancestor(history, &job.source_ref, job.source_index)?;
            let mut options = ancestor.options;
            options.seed = ancestor.seed;
            options.subseed = ancestor.subseed;
            options.batch_count = 1;
            options.batch_size = 1;
            Ok(RenderPlan::Upscale(options.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::dimensions::PRESET_512;
    use crate::history::HistoryEntry;
    use crate::render::GenerationResult;

    fn history_with(source: &str, seeds: &[i64]) -> History {
        let history = History::default();
        let mut options = GenerationOptions::new("a lighthouse", PRESET_512);
        options.seed = seeds[0];
        history.record(
            SourceRef::from(source),
            HistoryEntry {
                options,
                result: GenerationResult {
                    images: seeds.iter().map(|s| format!("img-{s}")).collect(),
                    seeds: seeds.to_vec(),
                    subseeds: seeds.iter().map(|s| s + 1000).collect(),
                    model: "Model hash: abc, Model: test".to_string(),
                    source_ref: SourceRef::from(source),
                },
            },
        );
        history
    }

    #[test]
    fn fresh_job_uses_own_options() {
        let options = GenerationOptions::new("a cat", PRESET_512);
        let job = Job::fresh(SourceRef::from("msg-1"), options.clone()).unwrap();
        let plan = resolve(&job, &History::default()).unwrap();
        assert_eq!(plan, RenderPlan::Generate(options.into()));
    }

    #[test]
    fn reroll_replaces_seed_with_random() {
        let history = history_with("msg-1", &[42, 43, 44, 45]);
        let job = Job::reroll(SourceRef::from("msg-1")).unwrap();

        let plan = resolve(&job, &history).unwrap();
        let options = &plan.request().options;
        assert_ne!(options.seed, 42);
        assert_eq!(options.seed, RANDOM_SEED);
        assert_eq!(options.prompt, "a lighthouse");
    }

    #[test]
    fn reroll_without_history_is_not_found() {
        let job = Job::reroll(SourceRef::from("missing")).unwrap();
        assert_matches!(
            resolve(&job, &History::default()),
            Err(CoreError::Resolution(ResolutionError::NotFound { .. }))
        );
    }

    #[test]
    fn variation_seeds_from_selected_image() {
        let history = history_with("msg-1", &[10, 20, 30, 40]);
        let job = Job::variation(SourceRef::from("msg-1"), 3).unwrap();

        let plan = resolve(&job, &history).unwrap();
        let options = &plan.request().options;
        assert_matches!(plan, RenderPlan::Generate(_));
        assert_eq!(options.seed, 30);
        assert_eq!(options.subseed, RANDOM_SEED);
        assert_eq!(options.subseed_strength, VARIATION_STRENGTH);
        assert_eq!(options.batch_count, DEFAULT_BATCH_COUNT);
    }

    #[test]
    fn upscale_regenerates_single_image() {
        let history = history_with("msg-1", &[10, 20, 30, 40]);
        let job = Job::upscale(SourceRef::from("msg-1"), 2).unwrap();

        let plan = resolve(&job, &history).unwrap();
        assert_matches!(plan, RenderPlan::Upscale(_));
        let options = &plan.request().options;
        assert_eq!(options.seed, 20);
        assert_eq!(options.subseed, 1020);
        assert_eq!(options.image_count(), 1);
    }

    #[test]
    fn upscale_index_past_image_count_is_out_of_range() {
        let history = history_with("msg-1", &[10, 20, 30, 40]);
        let job = Job::upscale(SourceRef::from("msg-1"), 5).unwrap();

        assert_matches!(
            resolve(&job, &history),
            Err(CoreError::Resolution(ResolutionError::OutOfRange {
                index: 5,
                available: 4,
                ..
            }))
        );
    }

    #[test]
    fn variation_index_zero_is_out_of_range() {
        let history = history_with("msg-1", &[10, 20, 30, 40]);
        let job = Job::variation(SourceRef::from("msg-1"), 0).unwrap();

        assert_matches!(
            resolve(&job, &history),
            Err(CoreError::Resolution(ResolutionError::OutOfRange {
                index: 0,
                available: 4,
                ..
            }))
        );
    }

    #[test]
    fn last_image_is_in_range() {
        let history = history_with("msg-1", &[10, 20, 30, 40]);
        let ancestor = lookup_ancestor(&history, &SourceRef::from("msg-1"), Some(4)).unwrap();
        assert_eq!(ancestor.seed, 40);
    }

    #[test]
    fn missing_index_defaults_to_first_image() {
        let history = history_with("msg-1", &[10, 20]);
        let ancestor = lookup_ancestor(&history, &SourceRef::from("msg-1"), None).unwrap();
        assert_eq!(ancestor.seed, 10);
    }

    #[test]
    fn variation_without_history_is_not_found() {
        let job = Job::variation(SourceRef::from("missing"), 1).unwrap();
        assert_matches!(
            resolve(&job, &History::default()),
            Err(CoreError::Resolution(ResolutionError::NotFound { .. }))
        );
    }
}
