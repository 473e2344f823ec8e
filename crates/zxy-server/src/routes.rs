//! HTTP routes
//!
//! Thin handlers over [`ZxyProxy`]; every failure is answered with a JSON
//! `{ "error": ... }` body.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{Method, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use zxy_core::{SourceId, ZxyError, ZxyProxy};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    proxy: Arc<ZxyProxy>,
}

impl AppState {
    pub fn new(proxy: ZxyProxy) -> Self {
        Self {
            proxy: Arc::new(proxy),
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn method_not_allowed(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::METHOD_NOT_ALLOWED,
            message: message.into(),
        }
    }
}

impl From<ZxyError> for ApiError {
    fn from(err: ZxyError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|e| ApiError::bad_request(e.body_text()))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayParams {
    pub path: Option<String>,
    pub source: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamUrlResponse {
    pub stream_url: String,
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/search-source-original", get(search_original))
        .route("/api/search-source-fsyuyou", get(search_fsyuyou))
        .route("/api/get-play-data", get(get_play_data))
        .route(
            "/api/get-stream-url",
            get(get_stream_url).post(post_stream_url),
        )
        .route("/health", get(health))
        .fallback(fallback)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn fallback() -> ApiError {
    ApiError::not_found("endpoint not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("method not allowed")
}

async fn search_original(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Html<String>> {
    search(&state, SourceId::Original, query_params(query)?).await
}

async fn search_fsyuyou(
    State(state): State<AppState>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> ApiResult<Html<String>> {
    search(&state, SourceId::Fsyuyou, query_params(query)?).await
}

async fn search(
    state: &AppState,
    source_id: SourceId,
    params: SearchParams,
) -> ApiResult<Html<String>> {
    let html = state
        .proxy
        .search(source_id, params.query.as_deref())
        .await?;
    Ok(Html(html))
}

async fn get_play_data(
    State(state): State<AppState>,
    query: Result<Query<PlayParams>, QueryRejection>,
) -> ApiResult<Html<String>> {
    let params = query_params(query)?;
    let html = state
        .proxy
        .play_page(params.source.as_deref(), params.path.as_deref())
        .await?;
    Ok(Html(html))
}

async fn get_stream_url(
    State(state): State<AppState>,
    query: Result<Query<PlayParams>, QueryRejection>,
) -> ApiResult<Json<StreamUrlResponse>> {
    stream_url(&state, query_params(query)?).await
}

async fn post_stream_url(
    State(state): State<AppState>,
    body: Result<Json<PlayParams>, JsonRejection>,
) -> ApiResult<Json<StreamUrlResponse>> {
    let Json(params) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    stream_url(&state, params).await
}

async fn stream_url(state: &AppState, params: PlayParams) -> ApiResult<Json<StreamUrlResponse>> {
    let result = state
        .proxy
        .stream_url(
            params.source.as_deref(),
            params.path.as_deref(),
            params.title.as_deref(),
        )
        .await;

    match result {
        Ok(stream_url) => Ok(Json(StreamUrlResponse { stream_url })),
        Err(ZxyError::MissingCredential) => {
            error!("AI_API_KEY is not configured on the server");
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Server AI configuration error.".to_string(),
            })
        }
        Err(err) if err.status_code() == 400 => Err(err.into()),
        Err(err) => {
            error!(
                path = ?params.path,
                title = ?params.title,
                error = %err,
                "Failed to get stream URL"
            );
            let mut api_error = ApiError::from(err);
            api_error.message = format!("Failed to get stream URL: {}", api_error.message);
            Err(api_error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zxy_core::{ClientConfig, CompletionConfig, ExtractorConfig, SourceRegistry};

    fn app(site: &MockServer, ai: &MockServer, api_key: Option<&str>) -> Router {
        let sources = SourceRegistry::default()
            .with_base_url(SourceId::Original, site.uri())
            .with_base_url(SourceId::Fsyuyou, site.uri());
        let extractor_config = ExtractorConfig {
            api_key: api_key.map(str::to_string),
            retry_delay: Duration::from_millis(5),
            ..ExtractorConfig::default()
        };
        let completion_config = CompletionConfig {
            endpoint: format!("{}/chat/completions", ai.uri()),
            timeout: Duration::from_secs(5),
        };
        let proxy = ZxyProxy::new(
            sources,
            ClientConfig::default(),
            completion_config,
            extractor_config,
        )
        .unwrap();
        router(AppState::new(proxy))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> Response {
        app.oneshot(request).await.unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(app(&site, &ai, None), get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(app(&site, &ai, None), get_request("/api/nope")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "endpoint not found");
    }

    #[tokio::test]
    async fn duplicate_query_field_is_json_400() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, None),
            get_request("/api/get-play-data?source=original&source=fsyuyou&path=/a.html"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("duplicate field"));
    }

    #[tokio::test]
    async fn stream_url_bad_query_is_json_400() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, Some("k")),
            get_request("/api/get-stream-url?path=/a.html&path=/b.html&source=original"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/api/get-stream-url")
            .body(Body::empty())
            .unwrap();
        let response = send(app(&site, &ai, Some("k")), request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_json(response).await["error"], "method not allowed");
    }

    #[tokio::test]
    async fn search_without_query_is_400() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, None),
            get_request("/api/search-source-original"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Missing search query");
    }

    #[tokio::test]
    async fn search_returns_upstream_html() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        Mock::given(method("GET"))
            .and(path("/fqsiso/-------------.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<ul>results</ul>"))
            .mount(&site)
            .await;

        let response = send(
            app(&site, &ai, None),
            get_request("/api/search-source-fsyuyou?query=naruto"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<ul>results</ul>");
    }

    #[tokio::test]
    async fn play_data_rejects_unknown_source() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, None),
            get_request("/api/get-play-data?source=other&path=/vodplay/1.html"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn play_data_propagates_upstream_status() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&site)
            .await;

        let response = send(
            app(&site, &ai, None),
            get_request("/api/get-play-data?source=original&path=/vodplay/9.html"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert_eq!(error, "Error from Original Source (pkcom.cc) server: 404");
    }

    #[tokio::test]
    async fn stream_url_missing_path_is_400() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, Some("k")),
            get_request("/api/get-stream-url?source=original"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn stream_url_without_key_is_500() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let response = send(
            app(&site, &ai, None),
            get_request("/api/get-stream-url?source=original&path=/vodplay/1.html"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"],
            "Server AI configuration error."
        );
    }

    #[tokio::test]
    async fn stream_url_get_success() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        Mock::given(method("GET"))
            .and(path("/vodplay/12-1-1.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>player</html>"))
            .mount(&site)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "https://cdn.example.com/v/abc.m3u8" } }]
            })))
            .expect(1)
            .mount(&ai)
            .await;

        let response = send(
            app(&site, &ai, Some("k")),
            get_request("/api/get-stream-url?source=original&path=/vodplay/12-1-1.html&title=Demo"),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["streamUrl"],
            "https://cdn.example.com/v/abc.m3u8"
        );
    }

    #[tokio::test]
    async fn stream_url_post_exhausted_is_prefixed() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&site)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "I could not find a stream" } }]
            })))
            .expect(3)
            .mount(&ai)
            .await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/get-stream-url")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"source":"fsyuyou","path":"/vodplay/3-1-1.html","title":"Demo"}"#,
            ))
            .unwrap();
        let response = send(app(&site, &ai, Some("k")), request).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error = body_json(response).await["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Failed to get stream URL: AI analysis failed after 3 attempts"));
    }

    #[tokio::test]
    async fn stream_url_post_bad_json_is_400() {
        let (site, ai) = (MockServer::start().await, MockServer::start().await);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/get-stream-url")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(app(&site, &ai, Some("k")), request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }
}
