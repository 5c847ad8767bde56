//! Handlers for job submission.
//!
//! Every endpoint only validates and queues; the outcome is delivered
//! asynchronously over the WebSocket event stream. Derived jobs are checked
//! against history up front so a missing source or a bad image index is
//! reported immediately. The worker resolves them again when it picks them
//! up.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use imagine_core::aspect_ratio::parse_prompt;
use imagine_core::dimensions::{validate_dimensions, Dimensions};
use imagine_core::error::{CoreError, ResolutionError};
use imagine_core::job::{Job, JobKind};
use imagine_core::options::GenerationOptions;
use imagine_core::resolve::lookup_ancestor;
use imagine_core::types::{JobId, SourceRef};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Request body for POST /imagine.
///
/// Only `prompt` is required. Dimensions come from `width`/`height` when
/// both are given, otherwise from a `--ar W:H` flag in the prompt, otherwise
/// from the current defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ImagineRequest {
    pub prompt: String,
    /// Identity of the request; generated when absent.
    pub source_ref: Option<String>,
    pub negative_prompt: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sampler: Option<String>,
    pub cfg_scale: Option<f64>,
    pub steps: Option<u32>,
    pub seed: Option<i64>,
    pub restore_faces: Option<bool>,
    pub batch_count: Option<u32>,
    pub batch_size: Option<u32>,
    /// Embedding name (see GET /embeddings) appended to the prompt.
    pub embedding: Option<String>,
    /// Member the render time is accounted to.
    pub requested_by: Option<String>,
}

/// Query parameters accepted by the derived-job endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DerivedParams {
    /// Store the result under this ref instead of the source's.
    pub result_ref: Option<String>,
    pub requested_by: Option<String>,
}

/// Response for every submission endpoint.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: JobId,
    pub kind: JobKind,
    pub source_ref: SourceRef,
    /// 1-based position in the queue at submission time.
    pub position: usize,
}

// ---------------------------------------------------------------------------
// Fresh prompts
// ---------------------------------------------------------------------------

/// POST /api/v1/imagine
pub async fn submit_prompt(
    State(state): State<AppState>,
    Json(body): Json<ImagineRequest>,
) -> AppResult<impl IntoResponse> {
    let options = build_options(&body, state.defaults.get())?;
    let source_ref = body
        .source_ref
        .map(SourceRef::new)
        .unwrap_or_else(|| SourceRef::new(uuid::Uuid::new_v4().to_string()));

    let mut job = Job::fresh(source_ref, options)?;
    if let Some(member) = body.requested_by {
        job = job.with_requested_by(member);
    }

    submit(&state, job)
}

fn build_options(body: &ImagineRequest, base: Dimensions) -> Result<GenerationOptions, CoreError> {
    let parsed = parse_prompt(&body.prompt, base)?;

    let dimensions = match (body.width, body.height) {
        (Some(width), Some(height)) => {
            validate_dimensions(width, height)?;
            Dimensions::new(width, height)
        }
        (None, None) => parsed.dimensions.unwrap_or(base),
        _ => {
            return Err(CoreError::Validation(
                "width and height must be given together".to_string(),
            ))
        }
    };

    let mut prompt = parsed.prompt;
    if let Some(embedding) = body.embedding.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        prompt.push_str(", ");
        prompt.push_str(embedding);
    }

    let mut options = GenerationOptions::new(prompt, dimensions);
    if let Some(negative_prompt) = &body.negative_prompt {
        options.negative_prompt = negative_prompt.clone();
    }
    if let Some(sampler) = &body.sampler {
        options.sampler = sampler.clone();
    }
    if let Some(cfg_scale) = body.cfg_scale {
        options.cfg_scale = cfg_scale;
    }
    if let Some(steps) = body.steps {
        options.steps = steps;
    }
    if let Some(seed) = body.seed {
        options.seed = seed;
    }
    if let Some(restore_faces) = body.restore_faces {
        options.restore_faces = restore_faces;
    }
    if let Some(batch_count) = body.batch_count {
        options.batch_count = batch_count;
    }
    if let Some(batch_size) = body.batch_size {
        options.batch_size = batch_size;
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Derived jobs
// ---------------------------------------------------------------------------

/// POST /api/v1/imagine/{source_ref}/reroll
pub async fn submit_reroll(
    State(state): State<AppState>,
    Path(source_ref): Path<String>,
    Query(params): Query<DerivedParams>,
) -> AppResult<impl IntoResponse> {
    let source_ref = SourceRef::new(source_ref);
    if state.history.get(&source_ref).is_none() {
        return Err(ResolutionError::NotFound { source_ref }.into());
    }

    let job = with_params(Job::reroll(source_ref)?, params);
    submit(&state, job)
}

/// POST /api/v1/imagine/{source_ref}/variation/{index}
pub async fn submit_variation(
    State(state): State<AppState>,
    Path((source_ref, index)): Path<(String, usize)>,
    Query(params): Query<DerivedParams>,
) -> AppResult<impl IntoResponse> {
    let job = Job::variation(SourceRef::new(source_ref), index)?;
    lookup_ancestor(&state.history, &job.source_ref, job.source_index)?;
    submit(&state, with_params(job, params))
}

/// POST /api/v1/imagine/{source_ref}/upscale/{index}
pub async fn submit_upscale(
    State(state): State<AppState>,
    Path((source_ref, index)): Path<(String, usize)>,
    Query(params): Query<DerivedParams>,
) -> AppResult<impl IntoResponse> {
    let job = Job::upscale(SourceRef::new(source_ref), index)?;
    lookup_ancestor(&state.history, &job.source_ref, job.source_index)?;
    submit(&state, with_params(job, params))
}

fn with_params(mut job: Job, params: DerivedParams) -> Job {
    if let Some(result_ref) = params.result_ref.filter(|r| !r.trim().is_empty()) {
        job = job.with_result_ref(SourceRef::new(result_ref));
    }
    if let Some(member) = params.requested_by {
        job = job.with_requested_by(member);
    }
    job
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

fn submit(state: &AppState, job: Job) -> AppResult<(StatusCode, Json<DataResponse<SubmitResponse>>)> {
    let job_id = job.id;
    let kind = job.kind;
    let source_ref = job.source_ref.clone();

    let position = state.queue.submit(job).map_err(AppError::from)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: SubmitResponse {
                job_id,
                kind,
                source_ref,
                position,
            },
        }),
    ))
}
