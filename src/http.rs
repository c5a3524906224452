use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::TryOnError;
use crate::generation::GenerateRequest;
use crate::models::Category;
use crate::service::TryOnService;

const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub type AppState = Arc<TryOnService>;

/// CORS for the browser frontend. Origins are validated by the config
/// loader; anything that is still not a valid header value is skipped.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "skipping invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn router(service: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/upload/clothing",
            post(upload_clothing).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/upload/reference",
            post(upload_reference).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/wardrobe/tops", get(wardrobe_tops))
        .route("/wardrobe/bottoms", get(wardrobe_bottoms))
        .route("/wardrobe/{id}", delete(delete_clothing))
        .route("/user/refs", get(user_refs))
        .route("/user/refs/{id}", delete(delete_reference))
        .route("/generations", get(generations))
        .route("/recommend", post(recommend))
        .route("/generate", post(generate))
        .layer(cors_layer(allowed_origins))
        .with_state(service)
}

pub struct ApiError(TryOnError);

impl From<TryOnError> for ApiError {
    fn from(err: TryOnError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(TryOnError::InvalidInput(rejection.body_text()))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    ok: bool,
    error: String,
    retryable: bool,
}

fn status_for(err: &TryOnError) -> StatusCode {
    match err {
        TryOnError::NotFound { .. } => StatusCode::NOT_FOUND,
        TryOnError::NoReference
        | TryOnError::InsufficientWardrobe
        | TryOnError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TryOnError::ProviderRetryable(_) => StatusCode::TOO_MANY_REQUESTS,
        TryOnError::ProviderFatal(_) => StatusCode::BAD_GATEWAY,
        TryOnError::MissingArtifact(_)
        | TryOnError::Config(_)
        | TryOnError::Storage(_)
        | TryOnError::Image(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = ErrorResponse {
            ok: false,
            error: self.0.to_string(),
            retryable: matches!(self.0, TryOnError::ProviderRetryable(_)),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, ApiError>;

fn ok(body: serde_json::Value) -> ApiResult {
    Ok((StatusCode::OK, Json(body)).into_response())
}

async fn health(State(service): State<AppState>) -> ApiResult {
    ok(json!({ "status": "ok", "model": service.model() }))
}

#[derive(Default)]
struct UploadForm {
    item_type: Option<String>,
    tags: Option<String>,
    file_name: Option<String>,
    bytes: Option<Vec<u8>>,
}

fn invalid(what: &str, err: impl std::fmt::Display) -> ApiError {
    ApiError(TryOnError::InvalidInput(format!("{what}: {err}")))
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(invalid("failed to read form", err)),
        };
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("item_type") => {
                let text = field.text().await;
                let text = text.map_err(|err| invalid("failed to read item_type", err))?;
                form.item_type = Some(text);
            }
            Some("tags") => {
                let text = field.text().await;
                form.tags = Some(text.map_err(|err| invalid("failed to read tags", err))?);
            }
            Some("file") => {
                if let Some(content_type) = field.content_type() {
                    if !content_type.starts_with("image/") {
                        return Err(ApiError(TryOnError::InvalidInput(format!(
                            "unsupported file type: {content_type}"
                        ))));
                    }
                }
                form.file_name = Some(field.file_name().unwrap_or("").to_string());
                let data = field.bytes().await.map_err(|err| invalid("failed to read file", err))?;
                form.bytes = Some(data.to_vec());
            }
            _ => {}
        }
    }
    Ok(form)
}

fn require_file(form: &UploadForm) -> Result<(&str, &[u8]), ApiError> {
    match (form.file_name.as_deref(), form.bytes.as_deref()) {
        (Some(name), Some(bytes)) => Ok((name, bytes)),
        _ => Err(ApiError(TryOnError::InvalidInput("file field is required".to_string()))),
    }
}

async fn upload_clothing(State(service): State<AppState>, multipart: Multipart) -> ApiResult {
    let form = read_upload_form(multipart).await?;
    let item_type = form
        .item_type
        .as_deref()
        .ok_or_else(|| ApiError(TryOnError::InvalidInput("item_type is required".to_string())))?;
    let (file_name, bytes) = require_file(&form)?;
    let item = service
        .upload_clothing(item_type, form.tags.as_deref().unwrap_or(""), file_name, bytes)
        .await?;
    ok(json!({ "ok": true, "item": item }))
}

async fn upload_reference(State(service): State<AppState>, multipart: Multipart) -> ApiResult {
    let form = read_upload_form(multipart).await?;
    let (file_name, bytes) = require_file(&form)?;
    let reference = service.upload_reference(file_name, bytes).await?;
    ok(json!({ "ok": true, "ref": reference }))
}

async fn wardrobe_tops(State(service): State<AppState>) -> ApiResult {
    let items = service.list_clothing(Some(Category::Top)).await?;
    ok(json!({ "ok": true, "items": items }))
}

async fn wardrobe_bottoms(State(service): State<AppState>) -> ApiResult {
    let items = service.list_clothing(Some(Category::Bottom)).await?;
    ok(json!({ "ok": true, "items": items }))
}

async fn delete_clothing(State(service): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let item = service.delete_clothing(&id).await?;
    ok(json!({ "ok": true, "item": item }))
}

async fn user_refs(State(service): State<AppState>) -> ApiResult {
    let refs = service.list_references().await?;
    ok(json!({ "ok": true, "refs": refs }))
}

async fn delete_reference(State(service): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let reference = service.delete_reference(&id).await?;
    ok(json!({ "ok": true, "ref": reference }))
}

async fn generations(State(service): State<AppState>) -> ApiResult {
    let generations = service.list_generations().await?;
    ok(json!({ "ok": true, "generations": generations }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendBody {
    #[serde(default)]
    pub theme: String,
}

async fn recommend(
    State(service): State<AppState>,
    body: Result<Json<RecommendBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let recommendation = service.recommend(&body.theme).await?;
    ok(json!({
        "ok": true,
        "top_id": recommendation.top_id,
        "bottom_id": recommendation.bottom_id,
        "keywords": recommendation.keywords,
    }))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub reference_id: Option<String>,
    pub top_id: String,
    pub bottom_id: String,
    #[serde(default)]
    pub theme: String,
}

async fn generate(
    State(service): State<AppState>,
    body: Result<Json<GenerateBody>, JsonRejection>,
) -> ApiResult {
    let Json(body) = body?;
    let request = GenerateRequest {
        reference_id: body.reference_id.filter(|id| !id.trim().is_empty()),
        top_id: body.top_id,
        bottom_id: body.bottom_id,
        theme: body.theme,
    };
    let outcome = service.generate(&request).await?;
    ok(json!({
        "ok": true,
        "output_url": outcome.output_url,
        "provider": outcome.provider,
        "cached": outcome.cached,
        "generation": outcome.generation,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalFileStorage;
    use crate::config::FallbackPolicy;
    use crate::provider::DisabledProvider;
    use crate::store::Catalog;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&TryOnError::not_found("top_id", "x")), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&TryOnError::NoReference), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&TryOnError::InsufficientWardrobe), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&TryOnError::MissingArtifact("top file".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&TryOnError::ProviderRetryable("quota".into())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_for(&TryOnError::ProviderFatal("no image".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    fn test_router(dir: &TempDir) -> Router {
        let storage = Arc::new(LocalFileStorage::new(
            dir.path().to_path_buf(),
            "/static".to_string(),
        ));
        let service = TryOnService::new(
            Catalog::in_memory(),
            storage,
            Arc::new(DisabledProvider),
            FallbackPolicy::default(),
            Duration::from_secs(1),
        );
        router(Arc::new(service), &["http://localhost:3000".to_string()])
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/recommend")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_allows_configured_origin() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(preflight("http://localhost:3000"))
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_preflight_ignores_unknown_origin() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(preflight("https://evil.example.com"))
            .await
            .unwrap();
        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_shape() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = test_router(&dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["retryable"], false);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_shape() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/recommend")
            .body(Body::from(r#"{"theme":"formal"}"#))
            .unwrap();
        let response = test_router(&dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["ok"], false);
    }

    #[tokio::test]
    async fn test_recommend_on_empty_wardrobe_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/recommend")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"theme":"formal"}"#))
            .unwrap();
        let response = test_router(&dir).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert!(body["error"].as_str().unwrap().contains("at least one top"));
    }
}
