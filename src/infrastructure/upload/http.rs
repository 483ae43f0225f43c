//! HTTP upload server adapter

use std::path::Path;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::meminfo::{available_memory_mb, MIN_FREE_MEMORY_MB};
use crate::application::ports::{ServerResponse, UploadError, UploadReceipt, Uploader};
use crate::domain::config::{UploadSettings, BYTES_PER_MB};
use crate::domain::session::display_name;

/// Timeout for list and delete requests
const MANAGEMENT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// A file stored on the upload server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Client for the capture upload server
pub struct HttpUploader {
    client: reqwest::Client,
    server_url: String,
    max_file_size: u64,
    timeout: StdDuration,
    check_memory: bool,
}

impl HttpUploader {
    pub fn new(settings: &UploadSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: settings.server_url.trim_end_matches('/').to_string(),
            max_file_size: settings.max_file_size,
            timeout: settings.timeout.as_std(),
            check_memory: settings.check_memory,
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UploadError> {
        let mut url = Url::parse(&self.server_url)
            .map_err(|e| UploadError::Request(format!("Invalid server URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| UploadError::Request("Invalid server URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error, timeout: StdDuration) -> UploadError {
        if e.is_timeout() {
            UploadError::Timeout(timeout.as_secs())
        } else if e.is_connect() {
            UploadError::Connect(self.server_url.clone())
        } else {
            UploadError::Request(e.to_string())
        }
    }

    async fn check_free_memory(&self) -> Result<(), UploadError> {
        if !self.check_memory {
            return Ok(());
        }
        // Unreadable meminfo is treated as enough memory
        match available_memory_mb().await {
            Some(free_mb) if free_mb < MIN_FREE_MEMORY_MB => Err(UploadError::InsufficientMemory {
                free_mb,
                required_mb: MIN_FREE_MEMORY_MB,
            }),
            _ => Ok(()),
        }
    }

    /// Files currently stored on the server
    pub async fn list_files(&self) -> Result<Vec<RemoteFile>, UploadError> {
        let url = self.endpoint(&["api", "files"])?;
        let response = self
            .client
            .get(url)
            .timeout(MANAGEMENT_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, MANAGEMENT_TIMEOUT))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UploadError::Request(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(UploadError::Rejected(error_message(&body, status)));
        }

        serde_json::from_str(&body).map_err(|e| UploadError::ParseError(e.to_string()))
    }

    /// Remove one stored file by name
    pub async fn delete_file(&self, name: &str) -> Result<(), UploadError> {
        let url = self.endpoint(&["api", "files", name])?;
        let response = self
            .client
            .delete(url)
            .timeout(MANAGEMENT_TIMEOUT)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, MANAGEMENT_TIMEOUT))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::Rejected(error_message(&body, status)))
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload(&self, path: &Path) -> Result<UploadReceipt, UploadError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| UploadError::NotFound(path.display().to_string()))?;
        let size_bytes = meta.len();

        if size_bytes > self.max_file_size {
            return Err(UploadError::TooLarge {
                size_mb: size_bytes as f64 / BYTES_PER_MB as f64,
                max_mb: self.max_file_size as f64 / BYTES_PER_MB as f64,
            });
        }

        self.check_free_memory().await?;

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| UploadError::Request(format!("Failed to read file: {}", e)))?;
        let file_name = display_name(path);

        let form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(data).file_name(file_name.clone()),
        );

        let url = self.endpoint(&["api", "upload"])?;
        debug!(%url, file = %file_name, size_bytes, "Sending upload");

        let response = self
            .client
            .post(url)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_send_error(e, self.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_send_error(e, self.timeout))?;

        if status != StatusCode::OK {
            return Err(UploadError::Rejected(error_message(&body, status)));
        }

        let response = match serde_json::from_str::<Value>(&body) {
            Ok(json) => {
                if json.get("success").is_some_and(is_falsy) {
                    let message = json
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("Upload rejected by server");
                    return Err(UploadError::Rejected(message.to_string()));
                }
                ServerResponse::Json(json)
            }
            Err(_) => ServerResponse::Text(body),
        };

        Ok(UploadReceipt {
            file_name,
            size_bytes,
            response,
        })
    }
}

/// `false`, `null`, zero, and empty strings or collections
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

/// The JSON `error` field of a failed response, or a generic status line
fn error_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("Upload failed with status {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::Duration;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(server_url: &str) -> HttpUploader {
        HttpUploader::new(&UploadSettings {
            server_url: server_url.to_string(),
            check_memory: false,
            ..Default::default()
        })
    }

    fn sample_file(dir: &TempDir, name: &str, len: usize) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, vec![b'x'; len]).unwrap();
        path
    }

    #[tokio::test]
    async fn upload_success_returns_json_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(body_string_contains("name=\"file\"; filename=\"p.jpg\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "originalName": "p.jpg",
                "filename": "1714550400_p.jpg",
                "size": 16
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 16);

        let receipt = uploader(&server.uri()).upload(&file).await.unwrap();

        assert_eq!(receipt.file_name, "p.jpg");
        assert_eq!(receipt.size_bytes, 16);
        assert_eq!(receipt.response.field("originalName"), Some("p.jpg".to_string()));
        assert_eq!(receipt.response.field("size"), Some("16".to_string()));
    }

    #[tokio::test]
    async fn trailing_slash_in_server_url_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "a.wav", 4);

        assert!(uploader(&format!("{}/", server.uri())).upload(&file).await.is_ok());
    }

    #[tokio::test]
    async fn plain_text_response_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        let receipt = uploader(&server.uri()).upload(&file).await.unwrap();
        assert_eq!(receipt.response, ServerResponse::Text("stored".to_string()));
    }

    #[tokio::test]
    async fn success_false_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "error": "disk full" })),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        let err = uploader(&server.uri()).upload(&file).await.unwrap_err();
        assert!(matches!(err, UploadError::Rejected(ref m) if m == "disk full"));
    }

    #[tokio::test]
    async fn falsy_success_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        for success in [json!(null), json!(0), json!("")] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/upload"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": success })))
                .mount(&server)
                .await;

            let err = uploader(&server.uri()).upload(&file).await.unwrap_err();
            assert!(
                matches!(err, UploadError::Rejected(ref m) if m == "Upload rejected by server"),
                "success = {} should be rejected",
                success
            );
        }
    }

    #[test]
    fn truthy_values() {
        assert!(!is_falsy(&json!(true)));
        assert!(!is_falsy(&json!(1)));
        assert!(!is_falsy(&json!("yes")));
        assert!(is_falsy(&json!(false)));
        assert!(is_falsy(&json!([])));
        assert!(is_falsy(&json!(0.0)));
    }

    #[tokio::test]
    async fn error_status_uses_json_error_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "No file provided" })),
            )
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        let err = uploader(&server.uri()).upload(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "No file provided");
    }

    #[tokio::test]
    async fn error_status_without_json_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(413).set_body_string("too big"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        let err = uploader(&server.uri()).upload(&file).await.unwrap_err();
        assert_eq!(err.to_string(), "Upload failed with status 413");
    }

    #[tokio::test]
    async fn oversized_file_is_never_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "a.wav", 2048);
        let uploader = HttpUploader::new(&UploadSettings {
            server_url: server.uri(),
            max_file_size: 1024,
            check_memory: false,
            ..Default::default()
        });

        let err = uploader.upload(&file).await.unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = uploader("http://127.0.0.1:9")
            .upload(&dir.path().join("gone.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotFound(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        // Bind then drop to get a port with nothing listening
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);

        let err = uploader(&format!("http://127.0.0.1:{}", port))
            .upload(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Connect(_)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(StdDuration::from_secs(5)))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = sample_file(&dir, "p.jpg", 4);
        let uploader = HttpUploader::new(&UploadSettings {
            server_url: server.uri(),
            timeout: Duration::from_millis(200),
            check_memory: false,
            ..Default::default()
        });

        let err = uploader.upload(&file).await.unwrap_err();
        assert!(matches!(err, UploadError::Timeout(_)));
    }

    #[tokio::test]
    async fn list_files_parses_entries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "session_20240501_080000.wav", "size": 9600 },
                { "name": "session_20240501_080000_photo_0001.jpg", "size": 512 }
            ])))
            .mount(&server)
            .await;

        let files = uploader(&server.uri()).list_files().await.unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files[0],
            RemoteFile {
                name: "session_20240501_080000.wav".to_string(),
                size: 9600
            }
        );
    }

    #[tokio::test]
    async fn delete_file_hits_named_path() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/files/old.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        uploader(&server.uri()).delete_file("old.jpg").await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_file_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "File not found" })))
            .mount(&server)
            .await;

        let err = uploader(&server.uri()).delete_file("nope.jpg").await.unwrap_err();
        assert_eq!(err.to_string(), "File not found");
    }
}
