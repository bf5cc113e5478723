use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, Request, State},
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose, Engine};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::RelayError;
use crate::models::{AnalysisRequest, AnalysisResult, FoodImage, ImageAnalysisRequest, ACCEPTED_IMAGE_TYPES};
use crate::services::FoodAnalyzer;

pub mod middleware;

pub const MAX_IMAGE_BODY_BYTES: usize = 10_000_000;

const FOOD_REQUIRED: &str = "Please provide a food to analyse.";
const IMAGE_REQUIRED: &str = "Please provide an image to analyse.";
const IMAGE_TOO_LARGE: &str = "Image is too large. Please try a smaller photo.";
const IMAGE_NOT_BASE64: &str = "Image data is not valid base64.";

pub struct AppState {
    pub analyzer: Arc<dyn FoodAnalyzer>,
    pub assets: ServeDir<ServeFile>,
}

impl AppState {
    /// Static files come from `static_dir`; unknown paths fall back to its `index.html`.
    pub fn new(analyzer: Arc<dyn FoodAnalyzer>, static_dir: &Path) -> Self {
        Self {
            analyzer,
            assets: ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let [allow_origin, allow_methods, allow_headers] = middleware::cors_headers();

    Router::new()
        .route("/api/analyze", post(analyze_food).fallback(fallback))
        .route(
            "/api/analyze-image",
            post(analyze_food_image)
                .fallback(fallback)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BODY_BYTES)),
        )
        .fallback(fallback)
        .layer(axum_middleware::from_fn(middleware::preflight))
        .layer(allow_origin)
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(axum_middleware::from_fn(middleware::log_request))
        .with_state(state)
}

/// POST /api/analyze
async fn analyze_food(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalysisResult>, RelayError> {
    let body = body.map_err(|e| RelayError::BadBody(e.body_text()))?;
    let payload: Value = serde_json::from_slice(&body)?;

    let request = AnalysisRequest::from_json(&payload).ok_or_else(|| RelayError::validation(FOOD_REQUIRED))?;

    log::info!("🍽️ Analysing: \"{}\"", request.food);
    let result = state.analyzer.analyze_food(&request.food).await?;
    log::info!("✅ -> Rating: {}/10", result.rating_label());

    Ok(Json(result))
}

/// POST /api/analyze-image
async fn analyze_food_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<AnalysisResult>, RelayError> {
    let declared_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);
    if declared_length > MAX_IMAGE_BODY_BYTES {
        return Err(RelayError::PayloadTooLarge(IMAGE_TOO_LARGE.to_string()));
    }

    let body = match body {
        Ok(body) => body,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            return Err(RelayError::PayloadTooLarge(IMAGE_TOO_LARGE.to_string()))
        }
        Err(e) => return Err(RelayError::BadBody(e.body_text())),
    };
    let payload: Value = serde_json::from_slice(&body)?;
    let request = ImageAnalysisRequest::from_json(&payload);

    if request.image.is_empty() || request.media_type.is_empty() {
        return Err(RelayError::validation(IMAGE_REQUIRED));
    }
    if !ACCEPTED_IMAGE_TYPES.contains(&request.media_type.as_str()) {
        return Err(RelayError::validation(format!(
            "Unsupported image type: {}",
            request.media_type
        )));
    }

    let data = request.base64_data();
    let decoded = general_purpose::STANDARD
        .decode(data)
        .map_err(|_| RelayError::validation(IMAGE_NOT_BASE64))?;

    log::info!(
        "📸 Analysing photo ({}, {} bytes)...",
        request.media_type,
        decoded.len()
    );
    let image = FoodImage {
        media_type: request.media_type.clone(),
        data: data.to_string(),
    };
    let result = state.analyzer.analyze_food_image(&image).await?;
    log::info!(
        "✅ -> Food: {}, Rating: {}/10",
        result.food().unwrap_or("?"),
        result.rating_label()
    );

    Ok(Json(result))
}

/// GET/HEAD serve static assets; everything else is a 404.
async fn fallback(State(state): State<Arc<AppState>>, request: Request) -> Response {
    if request.method() != Method::GET && request.method() != Method::HEAD {
        return not_found();
    }

    match state.assets.clone().oneshot(request).await {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => not_found(),
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
