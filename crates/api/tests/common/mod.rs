#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use imagine_api::config::ServerConfig;
use imagine_api::router::build_app_router;
use imagine_api::state::AppState;
use imagine_core::dimensions::PRESET_512;
use imagine_core::error::BackendError;
use imagine_core::history::{History, HistoryEntry};
use imagine_core::options::GenerationOptions;
use imagine_core::render::{
    GenerationResult, RenderBackend, RenderProgress, TextToImageOutput, TextToImageRequest,
    UpscaleRequest, UpscaledImage,
};
use imagine_core::types::SourceRef;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

/// Backend that answers instantly, or fails every call when `offline`.
#[derive(Default)]
pub struct StubBackend {
    pub offline: AtomicBool,
}

impl StubBackend {
    fn check(&self) -> Result<(), BackendError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RenderBackend for StubBackend {
    async fn text_to_image(
        &self,
        request: &TextToImageRequest,
    ) -> Result<TextToImageOutput, BackendError> {
        self.check()?;
        let count = request.options.image_count() as i64;
        Ok(TextToImageOutput {
            images: (0..count).map(|i| format!("image-{i}")).collect(),
            seeds: (0..count).collect(),
            subseeds: (0..count).collect(),
            model: String::new(),
        })
    }

    async fn upscale_image(&self, request: &UpscaleRequest) -> Result<UpscaledImage, BackendError> {
        self.check()?;
        Ok(UpscaledImage {
            image: request.image.clone(),
        })
    }

    async fn progress(&self) -> Result<RenderProgress, BackendError> {
        self.check()?;
        Ok(RenderProgress {
            fraction: 0.0,
            eta_seconds: 0.0,
        })
    }

    async fn embeddings(&self) -> Result<Vec<String>, BackendError> {
        self.check()?;
        Ok(vec!["bad-hands".to_string(), "easynegative".to_string()])
    }
}

/// Build the full application router and hand back its state.
///
/// No worker is started, so submitted jobs stay queued.
pub fn build_test_app() -> (Router, AppState, Arc<StubBackend>) {
    let config = test_config();
    let backend = Arc::new(StubBackend::default());
    let state = AppState::new(backend.clone(), History::default());
    let app = build_app_router(state.clone(), &config);
    (app, state, backend)
}

/// Store a finished four-image result under `source`.
pub fn seed_history(state: &AppState, source: &str) {
    state.history.record(
        SourceRef::from(source),
        HistoryEntry {
            options: GenerationOptions::new("a lighthouse", PRESET_512),
            result: GenerationResult {
                images: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                seeds: vec![1, 2, 3, 4],
                subseeds: vec![5, 6, 7, 8],
                model: String::new(),
                source_ref: SourceRef::from(source),
            },
        },
    );
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(body)).await
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
