//! Shared test helpers: a local fake Metadata Extraction Service

#![allow(dead_code)]

use axum::{
    extract::Multipart,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wfimport::models::ImageFile;

pub const EXTRACT_PATH: &str = "/workflow-importer/extract";

/// One multipart upload as seen by the fake service
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// Handle to a running fake service
pub struct FakeService {
    pub base_url: String,
    pub uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
}

impl FakeService {
    pub fn received_names(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.file_name.clone())
            .collect()
    }
}

/// Answer chosen by file name:
/// - `a1111*`: success=false with an Automatic1111 reason
/// - `plain*`: success=false without error text
/// - `error500*`: HTTP 500
/// - `garbage*`: 200 with a non-JSON body
/// - `prompt*`: API prompt only, as a JSON string
/// - `both*`: workflow and prompt
/// - `badjson*`: workflow string that is not JSON
/// - anything else: workflow graph object
fn respond(file_name: &str) -> Response {
    if file_name.starts_with("a1111") {
        Json(json!({"success": false, "error": "only Automatic1111 parameters found"})).into_response()
    } else if file_name.starts_with("plain") {
        Json(json!({"success": false})).into_response()
    } else if file_name.starts_with("error500") {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
    } else if file_name.starts_with("garbage") {
        (StatusCode::OK, "<html>not json</html>").into_response()
    } else if file_name.starts_with("prompt") {
        Json(json!({
            "success": true,
            "prompt": "{\"3\": {\"class_type\": \"KSampler\", \"inputs\": {}}}"
        }))
        .into_response()
    } else if file_name.starts_with("both") {
        Json(json!({
            "success": true,
            "workflow": {"nodes": [{"id": 1}], "links": [], "kind": "workflow"},
            "prompt": {"3": {"class_type": "KSampler"}},
            "info": {"format": "png"}
        }))
        .into_response()
    } else if file_name.starts_with("badjson") {
        Json(json!({"success": true, "workflow": "{nodes: oops"})).into_response()
    } else {
        Json(json!({
            "success": true,
            "workflow": {"nodes": [], "links": [], "source": file_name}
        }))
        .into_response()
    }
}

async fn extract(uploads: Arc<Mutex<Vec<ReceivedUpload>>>, mut multipart: Multipart) -> Response {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        _ => return (StatusCode::BAD_REQUEST, "missing file").into_response(),
    };

    let field_name = field.name().unwrap_or_default().to_string();
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().unwrap_or_default().to_string();
    let size = match field.bytes().await {
        Ok(bytes) => bytes.len(),
        Err(_) => return (StatusCode::BAD_REQUEST, "unreadable file").into_response(),
    };

    uploads.lock().unwrap().push(ReceivedUpload {
        field_name,
        file_name: file_name.clone(),
        content_type,
        size,
    });

    respond(&file_name)
}

/// Start the fake service on an ephemeral localhost port
pub async fn spawn_fake_service() -> FakeService {
    let uploads = Arc::new(Mutex::new(Vec::new()));
    let handler_uploads = uploads.clone();
    let app = Router::new().route(
        EXTRACT_PATH,
        post(move |multipart: Multipart| extract(handler_uploads.clone(), multipart)),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeService {
        base_url: format!("http://{}", addr),
        uploads,
    }
}

pub fn png(name: &str) -> ImageFile {
    ImageFile::new(name, "image/png", b"\x89PNG\r\n\x1a\nfake".to_vec())
}
