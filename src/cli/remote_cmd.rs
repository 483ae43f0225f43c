//! Upload and remote file commands

use std::path::Path;

use crate::application::ports::{UploadError, UploadReceipt, Uploader};
use crate::domain::config::{validate_url, SessionConfig, UploadSettings};
use crate::domain::error::ConfigError;
use crate::domain::session::human_readable_size;
use crate::infrastructure::HttpUploader;

use super::args::RemoteAction;
use super::presenter::Presenter;

/// Response fields worth echoing after a manual upload
const RECEIPT_FIELDS: &[&str] = &["originalName", "filename", "size", "path"];

/// Upload settings with an optional `--server` override applied
pub fn upload_settings(
    config: &SessionConfig,
    server: Option<&str>,
) -> Result<UploadSettings, ConfigError> {
    let mut settings = config.upload.clone();
    if let Some(url) = server {
        settings.server_url = validate_url(url)?;
    }
    Ok(settings)
}

/// Upload a single file and print what the server returned
pub async fn handle_upload<U: Uploader>(
    uploader: &U,
    file: &Path,
    presenter: &mut Presenter,
) -> Result<(), UploadError> {
    presenter.start_spinner(&format!("Uploading {}...", file.display()));

    match uploader.upload(file).await {
        Ok(receipt) => {
            presenter.spinner_success(&format!(
                "Uploaded {} ({})",
                receipt.file_name,
                human_readable_size(receipt.size_bytes)
            ));
            print_receipt(&receipt, presenter);
            Ok(())
        }
        Err(e) => {
            presenter.spinner_fail("Upload failed");
            Err(e)
        }
    }
}

fn print_receipt(receipt: &UploadReceipt, presenter: &Presenter) {
    for key in RECEIPT_FIELDS {
        if let Some(value) = receipt.response.field(key) {
            presenter.key_value(key, &value);
        }
    }
}

/// Handle remote subcommand
pub async fn handle_remote_command(
    action: &RemoteAction,
    uploader: &HttpUploader,
    presenter: &Presenter,
) -> Result<(), UploadError> {
    match action {
        RemoteAction::List { .. } => {
            let files = uploader.list_files().await?;
            if files.is_empty() {
                presenter.info(&format!("No files on {}", uploader.server_url()));
            }
            for file in files {
                presenter.key_value(&file.name, &human_readable_size(file.size));
            }
            Ok(())
        }
        RemoteAction::Delete { name, .. } => {
            uploader.delete_file(name).await?;
            presenter.success(&format!("Deleted {}", name));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn uploader(server_url: &str) -> HttpUploader {
        HttpUploader::new(&UploadSettings {
            server_url: server_url.to_string(),
            check_memory: false,
            ..Default::default()
        })
    }

    #[test]
    fn server_flag_overrides_config() {
        let config = SessionConfig::with_dirs("/tmp/p", "/tmp/r");

        let settings = upload_settings(&config, Some("http://pi.local:5001")).unwrap();
        assert_eq!(settings.server_url, "http://pi.local:5001");

        let settings = upload_settings(&config, None).unwrap();
        assert_eq!(settings.server_url, config.upload.server_url);

        assert!(upload_settings(&config, Some("pi.local")).is_err());
    }

    #[tokio::test]
    async fn single_upload_reports_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "originalName": "note.wav",
                "filename": "1714550400_note.wav"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("note.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let mut presenter = Presenter::new();
        handle_upload(&uploader(&server.uri()), &file, &mut presenter)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn single_upload_propagates_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let file = dir.path().join("note.wav");
        std::fs::write(&file, b"RIFF").unwrap();

        let mut presenter = Presenter::new();
        let err = handle_upload(&uploader(&server.uri()), &file, &mut presenter)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Upload failed with status 500");
    }

    #[tokio::test]
    async fn remote_list_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "a.jpg", "size": 2048}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/files/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = uploader(&server.uri());
        let presenter = Presenter::new();

        handle_remote_command(&RemoteAction::List { server: None }, &client, &presenter)
            .await
            .unwrap();
        handle_remote_command(
            &RemoteAction::Delete {
                name: "a.jpg".to_string(),
                server: None,
            },
            &client,
            &presenter,
        )
        .await
        .unwrap();
    }
}
