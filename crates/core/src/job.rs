//! The unit of scheduled work.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::aspect_ratio::parse_prompt;
use crate::dimensions::DefaultsStore;
use crate::error::CoreError;
use crate::options::GenerationOptions;
use crate::types::{JobId, SourceRef, Timestamp};

/// What a job asks the backend to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// A new prompt with explicit options.
    Fresh,
    /// Same options as a previous result with a new random seed.
    Reroll,
    /// More images seeded from one image of a previous result.
    Variation,
    /// One image of a previous result, regenerated and upscaled.
    Upscale,
}

impl JobKind {
    pub fn is_derived(&self) -> bool {
        !matches!(self, JobKind::Fresh)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Fresh => "fresh",
            JobKind::Reroll => "reroll",
            JobKind::Variation => "variation",
            JobKind::Upscale => "upscale",
        }
    }
}

/// A requested unit of work.
///
/// Fresh jobs carry their own [`GenerationOptions`]; derived jobs carry
/// only a reference to a previous result and take their options from
/// history when the worker resolves them.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub options: Option<GenerationOptions>,
    /// For fresh jobs, the request's own identity. For derived jobs, the
    /// previous result this job builds on.
    pub source_ref: SourceRef,
    /// 1-based image index within the previous result.
    pub source_index: Option<usize>,
    /// Key under which a successful result is stored, when it should not
    /// overwrite `source_ref`.
    pub result_ref: Option<SourceRef>,
    /// Member the render time is accounted to.
    pub requested_by: Option<String>,
    pub enqueued_at: Timestamp,
}

impl Job {
    /// A fresh job. Fails if the prompt is blank or an option is invalid.
    pub fn fresh(source_ref: SourceRef, options: GenerationOptions) -> Result<Self, CoreError> {
        let job = Self::build(JobKind::Fresh, source_ref, Some(options), None);
        job.validate()?;
        Ok(job)
    }

    /// A fresh job using default options, the current default dimensions,
    /// and any `--ar W:H` flag in the prompt.
    pub fn from_prompt(
        source_ref: SourceRef,
        prompt: &str,
        defaults: &DefaultsStore,
    ) -> Result<Self, CoreError> {
        let base = defaults.get();
        let parsed = parse_prompt(prompt, base)?;
        let options = GenerationOptions::new(parsed.prompt, parsed.dimensions.unwrap_or(base));
        Self::fresh(source_ref, options)
    }

    pub fn reroll(source_ref: SourceRef) -> Result<Self, CoreError> {
        Self::derived(JobKind::Reroll, source_ref, None)
    }

    pub fn variation(source_ref: SourceRef, index: usize) -> Result<Self, CoreError> {
        Self::derived(JobKind::Variation, source_ref, Some(index))
    }

    pub fn upscale(source_ref: SourceRef, index: usize) -> Result<Self, CoreError> {
        Self::derived(JobKind::Upscale, source_ref, Some(index))
    }

    /// A derived job of the given kind.
    pub fn derived(
        kind: JobKind,
        source_ref: SourceRef,
        source_index: Option<usize>,
    ) -> Result<Self, CoreError> {
        if !kind.is_derived() {
            return Err(CoreError::Validation(
                "Fresh jobs must be created with options".to_string(),
            ));
        }
        let job = Self::build(kind, source_ref, None, source_index);
        job.validate()?;
        Ok(job)
    }

    pub fn with_result_ref(mut self, result_ref: SourceRef) -> Self {
        self.result_ref = Some(result_ref);
        self
    }

    pub fn with_requested_by(mut self, member_id: impl Into<String>) -> Self {
        self.requested_by = Some(member_id.into());
        self
    }

    /// The key a successful result is written to in history.
    pub fn history_key(&self) -> &SourceRef {
        self.result_ref.as_ref().unwrap_or(&self.source_ref)
    }

    /// Check the job is well-formed enough to be queued.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.kind {
            JobKind::Fresh => match &self.options {
                Some(options) => options.validate(),
                None => Err(CoreError::Validation(
                    "Prompt must not be empty".to_string(),
                )),
            },
            _ => {
                if self.source_ref.is_blank() {
                    return Err(CoreError::Validation(format!(
                        "A {} job requires a source reference",
                        self.kind.as_str()
                    )));
                }
                Ok(())
            }
        }
    }

    fn build(
        kind: JobKind,
        source_ref: SourceRef,
        options: Option<GenerationOptions>,
        source_index: Option<usize>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            kind,
            options,
            source_ref,
            source_index,
            result_ref: None,
            requested_by: None,
            enqueued_at: Utc::now(),
        }
    }
}
