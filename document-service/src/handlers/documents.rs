use std::time::Duration;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use document_storage::config::MAX_URL_EXPIRY_SECONDS;
use document_storage::{DocumentId, DocumentMetadata, NewDocument, TransferMode, UploadDescriptor};
use serde::{Deserialize, Serialize};
use shared::ApiResponse;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub url: String,
    /// `None` when the URL does not expire
    pub expires_in: Option<u64>,
}

fn parse_id(raw: &str) -> ApiResult<DocumentId> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid document id: {}", raw)))
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::BadRequest(format!("Invalid multipart: {}", e.body_text()))
    }
}

/// Handle a multipart upload; the file is expected in the `file` field
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<UploadDescriptor>>)> {
    let mut upload: Option<(Bytes, String, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            tracing::debug!(field = field.name().unwrap_or("unknown"), "Skipping form field");
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
        let data = field.bytes().await.map_err(multipart_error)?;

        upload = Some((data, content_type, file_name));
        break;
    }

    let (data, content_type, file_name) =
        upload.ok_or_else(|| ApiError::BadRequest("No file provided".to_string()))?;

    if data.is_empty() {
        return Err(ApiError::BadRequest("Empty file provided".to_string()));
    }
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} MB",
            state.max_upload_bytes / (1024 * 1024)
        )));
    }

    tracing::info!(
        file_name = file_name.as_deref().unwrap_or("-"),
        size = data.len(),
        content_type = %content_type,
        "File received"
    );

    let mut file = NewDocument::new(data, content_type);
    if let Some(name) = file_name {
        file = file.with_file_name(name);
    }

    let descriptor = state.gateway.create_document(file).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(descriptor, "Document stored")),
    ))
}

/// Stream the stored bytes back with their content type
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let doc_id = parse_id(&id)?;
    let document = state.gateway.read_document(&doc_id).await?;

    Ok(([(header::CONTENT_TYPE, document.content_type)], document.data).into_response())
}

pub async fn document_exists(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let doc_id = parse_id(&id)?;
    if state.gateway.document_exists(&doc_id).await {
        Ok(StatusCode::OK)
    } else {
        Ok(StatusCode::NOT_FOUND)
    }
}

pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let doc_id = parse_id(&id)?;
    state.gateway.delete_document(&doc_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn document_url(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<Json<ApiResponse<UrlResponse>>> {
    let doc_id = parse_id(&id)?;

    let url = match query.expires_in {
        Some(secs) if secs == 0 || secs > MAX_URL_EXPIRY_SECONDS => {
            return Err(ApiError::BadRequest(format!(
                "expires_in must be between 1 and {} seconds",
                MAX_URL_EXPIRY_SECONDS
            )));
        }
        Some(secs) => {
            state
                .gateway
                .document_url_with_expiry(&doc_id, Duration::from_secs(secs))
                .await?
        }
        None => state.gateway.document_url(&doc_id).await?,
    };

    let expires_in = match state.gateway.transfer_mode() {
        TransferMode::Direct => None,
        TransferMode::Presigned => Some(
            query
                .expires_in
                .unwrap_or_else(|| state.gateway.default_url_expiry().as_secs()),
        ),
    };

    Ok(Json(ApiResponse::success(UrlResponse { url, expires_in })))
}

pub async fn document_metadata(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<DocumentMetadata>>> {
    let doc_id = parse_id(&id)?;
    let metadata = state.gateway.document_metadata(&doc_id).await?;
    Ok(Json(ApiResponse::success(metadata)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request, Router};
    use document_storage::{DocumentGateway, MemoryBackend, StorageConfig};
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::app::{cors_layer, router};

    const BOUNDARY: &str = "X-DOCUMENT-BOUNDARY";

    fn app_with_limit(mode: TransferMode, max_upload_bytes: usize) -> Router {
        let store = Arc::new(MemoryBackend::new("docs"));
        let config = StorageConfig {
            bucket: "docs".to_string(),
            transfer_mode: mode,
            ..StorageConfig::default()
        };
        let state = AppState {
            gateway: Arc::new(DocumentGateway::new(store.clone(), store, config)),
            max_upload_bytes,
        };
        router(state, cors_layer(&["*".to_string()]))
    }

    fn app(mode: TransferMode) -> Router {
        app_with_limit(mode, 1024 * 1024)
    }

    fn multipart_request(file_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn upload(app: &Router, data: &[u8], content_type: &str) -> String {
        let response = app
            .clone()
            .oneshot(multipart_request("notes.txt", content_type, data))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        body["data"]["doc_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_upload_then_download() {
        for mode in [TransferMode::Direct, TransferMode::Presigned] {
            let app = app(mode);
            let id = upload(&app, b"week 3 reading list", "text/plain").await;

            let response = app
                .clone()
                .oneshot(request("GET", &format!("/documents/{id}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], b"week 3 reading list");
        }
    }

    #[tokio::test]
    async fn test_metadata_and_head() {
        let app = app(TransferMode::Direct);
        let id = upload(&app, b"0123456789", "application/pdf").await;

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}/metadata")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["size"], 10);
        assert_eq!(body["data"]["content_type"], "application/pdf");

        let response = app
            .clone()
            .oneshot(request("HEAD", &format!("/documents/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_delete_then_missing() {
        let app = app(TransferMode::Direct);
        let id = upload(&app, b"quiz answers", "text/plain").await;

        let response = app
            .clone()
            .oneshot(request("DELETE", &format!("/documents/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request("HEAD", &format!("/documents/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to read document: not found");
    }

    #[tokio::test]
    async fn test_invalid_id_rejected() {
        let app = app(TransferMode::Direct);
        let response = app
            .oneshot(request("GET", "/documents/not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_url_expiry() {
        let app = app(TransferMode::Presigned);
        let id = DocumentId::generate();

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}/url")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["expires_in"], 3600);
        assert_eq!(
            body["data"]["url"],
            format!("memory://docs/{id}?X-Amz-Expires=3600")
        );

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}/url?expires_in=300")))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(
            body["data"]["url"],
            format!("memory://docs/{id}?X-Amz-Expires=300")
        );

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}/url?expires_in=0")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_direct_url_does_not_expire() {
        let app = app(TransferMode::Direct);
        let id = DocumentId::generate();

        let response = app
            .oneshot(request("GET", &format!("/documents/{id}/url")))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["expires_in"], Value::Null);
        assert_eq!(body["data"]["url"], format!("memory://docs/{id}"));
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_and_oversized() {
        let app = app_with_limit(TransferMode::Direct, 16);

        let response = app
            .clone()
            .oneshot(multipart_request("empty.txt", "text/plain", b""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(multipart_request("big.bin", "application/octet-stream", &[1u8; 64]))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_declared_length_over_limit_gets_envelope() {
        let app = app_with_limit(TransferMode::Direct, 16);
        let body = vec![b'a'; 70 * 1024];
        let request = Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Request body too large");
    }

    #[tokio::test]
    async fn test_upload_without_content_type_defaults_to_octet_stream() {
        let app = app(TransferMode::Direct);
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"scan.dat\"\r\n\r\nraw bytes\r\n--{BOUNDARY}--\r\n"
        );
        let upload_request = Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.clone().oneshot(upload_request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let id = json_body(response).await["data"]["doc_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .clone()
            .oneshot(request("GET", &format!("/documents/{id}/metadata")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["content_type"], "application/octet-stream");
        assert_eq!(body["data"]["size"], 9);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let app = app(TransferMode::Direct);
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nLecture 1\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/documents")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(TransferMode::Direct);
        let response = app.oneshot(request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["storage_reachable"], true);
    }
}
