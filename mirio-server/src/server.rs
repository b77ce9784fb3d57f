use crate::config::Config;
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures_util::TryStreamExt;
use mirio_core::{ChunkStream, Gateway, MirioError, Result};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Header carrying the object name for uploads. The name travels out of
/// band from the chunk stream; this header is part of the call contract.
pub const FILE_NAME_HEADER: &str = "x-mirio-file-name";

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    files: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run_server(config: &Config, gateway: Arc<Gateway>) -> Result<()> {
    let app = router(gateway);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/files", get(list_files).post(upload_file))
        .route("/files/:name", get(download_file).delete(delete_file))
        .route("/files/:name/meta", get(get_metadata))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

async fn health_handler(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    let response = serde_json::json!({
        "nodes": gateway.node_count(),
        "bucket": gateway.bucket(),
    });
    (StatusCode::OK, Json(response))
}

async fn upload_file(
    State(gateway): State<Arc<Gateway>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let file_name = match headers.get(FILE_NAME_HEADER) {
        Some(value) => match value.to_str() {
            Ok(name) => name.to_string(),
            Err(_) => {
                return error_response(&MirioError::InvalidRequest(format!(
                    "invalid {} header value: not valid UTF-8",
                    FILE_NAME_HEADER
                )));
            }
        },
        None => {
            return error_response(&MirioError::InvalidRequest(format!(
                "missing {} header",
                FILE_NAME_HEADER
            )));
        }
    };

    let stream: ChunkStream = Box::pin(
        body.into_data_stream()
            .map_err(|error| MirioError::Store(format!("client stream error: {}", error))),
    );

    match gateway.upload(&file_name, stream).await {
        Ok(message) => (StatusCode::OK, Json(MessageResponse { message })).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn download_file(State(gateway): State<Arc<Gateway>>, Path(name): Path<String>) -> Response {
    // Not-found is decided here, before the first body byte goes out.
    match gateway.download(&name).await {
        Ok(stream) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            Body::from_stream(stream),
        )
            .into_response(),
        Err(error) => error_response(&error),
    }
}

async fn get_metadata(State(gateway): State<Arc<Gateway>>, Path(name): Path<String>) -> Response {
    match gateway.get_metadata(&name).await {
        Ok(metadata) => (StatusCode::OK, Json(metadata)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn list_files(State(gateway): State<Arc<Gateway>>) -> Response {
    match gateway.list_files().await {
        Ok(files) => (StatusCode::OK, Json(ListResponse { files })).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn delete_file(State(gateway): State<Arc<Gateway>>, Path(name): Path<String>) -> Response {
    match gateway.delete_file(&name).await {
        Ok(message) => (StatusCode::OK, Json(MessageResponse { message })).into_response(),
        Err(error) => error_response(&error),
    }
}

fn error_response(error: &MirioError) -> Response {
    let status = match error {
        MirioError::NotFound(_) => StatusCode::NOT_FOUND,
        MirioError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use mirio_core::{MemoryNodeStore, NodeRegistry, NodeStore};
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let nodes: Vec<Arc<dyn NodeStore>> = (0..3)
            .map(|i| Arc::new(MemoryNodeStore::new(format!("mem-{}", i))) as Arc<dyn NodeStore>)
            .collect();
        let registry = Arc::new(NodeRegistry::new(nodes, "files").unwrap());
        registry.ensure_bucket("us-east-1").await.unwrap();
        router(Arc::new(Gateway::new(registry)))
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_upload_then_download_round_trip() {
        let app = test_app().await;

        let upload = Request::builder()
            .method("POST")
            .uri("/files")
            .header(FILE_NAME_HEADER, "hello.txt")
            .body(Body::from("hello over http"))
            .unwrap();
        let response = app.clone().oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let download = Request::builder()
            .uri("/files/hello.txt")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(download).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"hello over http");
    }

    #[tokio::test]
    async fn test_upload_without_file_name_header_is_rejected() {
        let app = test_app().await;

        let upload = Request::builder()
            .method("POST")
            .uri("/files")
            .body(Body::from("orphan bytes"))
            .unwrap();
        let response = app.oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upload_with_non_utf8_file_name_header_is_rejected_as_invalid() {
        let app = test_app().await;

        let mut upload = Request::builder()
            .method("POST")
            .uri("/files")
            .body(Body::from("payload"))
            .unwrap();
        upload.headers_mut().insert(
            FILE_NAME_HEADER,
            axum::http::HeaderValue::from_bytes(b"\xffname").unwrap(),
        );
        let response = app.oneshot(upload).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The header is present, so the error names it invalid, not missing.
        let body = body_bytes(response).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let message = value["error"].as_str().unwrap();
        assert!(message.contains("invalid"));
        assert!(!message.contains("missing"));
    }

    #[tokio::test]
    async fn test_download_of_missing_object_is_404() {
        let app = test_app().await;

        let download = Request::builder()
            .uri("/files/nope.bin")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(download).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_zero_length_upload_downloads_as_empty_200() {
        let app = test_app().await;

        let upload = Request::builder()
            .method("POST")
            .uri("/files")
            .header(FILE_NAME_HEADER, "empty.bin")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            app.clone().oneshot(upload).await.unwrap().status(),
            StatusCode::OK
        );

        let download = Request::builder()
            .uri("/files/empty.bin")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(download).await.unwrap();
        // A zero-length object is distinguishable from a missing one.
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_and_list() {
        let app = test_app().await;

        let upload = Request::builder()
            .method("POST")
            .uri("/files")
            .header(FILE_NAME_HEADER, "doc.pdf")
            .body(Body::from("pdf bytes"))
            .unwrap();
        app.clone().oneshot(upload).await.unwrap();

        let meta = Request::builder()
            .uri("/files/doc.pdf/meta")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(meta).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_bytes(response).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["file_name"], "doc.pdf");
        assert!(value["version"].as_str().is_some_and(|tag| !tag.is_empty()));

        let list = Request::builder()
            .uri("/files")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(list).await.unwrap();
        let body = body_bytes(response).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["files"], serde_json::json!(["doc.pdf"]));
    }

    #[tokio::test]
    async fn test_delete_then_404() {
        let app = test_app().await;

        let upload = Request::builder()
            .method("POST")
            .uri("/files")
            .header(FILE_NAME_HEADER, "tmp")
            .body(Body::from("x"))
            .unwrap();
        app.clone().oneshot(upload).await.unwrap();

        let delete = Request::builder()
            .method("DELETE")
            .uri("/files/tmp")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(delete).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let download = Request::builder()
            .uri("/files/tmp")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(download).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_bucket_lists_as_empty() {
        let app = test_app().await;

        let list = Request::builder()
            .uri("/files")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(list).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_bytes(response).await;
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["files"], serde_json::json!([]));
    }
}
