//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over a [`MockMediaToolkit`], so jobs run
//! end to end without ffmpeg.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use podclip_core::{testing::MockMediaToolkit, Config, JobOrchestrator};
use podclip_server::{create_router, AppState};

const BOUNDARY: &str = "podclip-test-boundary";

/// In-process server with a controllable media toolkit.
pub struct TestFixture {
    pub router: Router,
    pub toolkit: Arc<MockMediaToolkit>,
    pub config: Config,
    /// Holds uploads and clips
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestFixture {
    /// Fixture whose sources probe as `duration_secs` long.
    pub fn new(duration_secs: f64) -> Self {
        Self::with_config(duration_secs, |_| {})
    }

    /// Fixture with config tweaks applied on top of the test defaults.
    pub fn with_config(duration_secs: f64, customize: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.storage.upload_dir = temp_dir.path().join("uploads");
        config.storage.output_dir = temp_dir.path().join("clips");
        customize(&mut config);

        let toolkit = Arc::new(MockMediaToolkit::with_duration(duration_secs));
        let orchestrator = JobOrchestrator::new(
            config.jobs.clone(),
            config.storage.output_dir.clone(),
            toolkit.clone(),
            toolkit.clone(),
        );

        let state = Arc::new(AppState::new(config.clone(), Arc::new(orchestrator)));

        Self {
            router: create_router(state),
            toolkit,
            config,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.config.storage.upload_dir.clone()
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Posts a multipart form built from `parts`.
    pub async fn post_form(&self, uri: &str, parts: &[FormPart]) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let raw = response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            body,
            raw,
        }
    }

    /// Polls `/job/{id}` until the job is terminal.
    pub async fn wait_for_terminal(&self, job_id: &str) -> Value {
        for _ in 0..200 {
            let response = self.get(&format!("/job/{}", job_id)).await;
            assert_eq!(response.status, StatusCode::OK);
            let status = response.body["status"].as_str().unwrap_or_default();
            if status == "completed" || status == "failed" {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Job {} did not finish", job_id);
    }
}

/// One part of a multipart form.
pub enum FormPart {
    File {
        field: &'static str,
        file_name: String,
        contents: Vec<u8>,
    },
    Text {
        field: &'static str,
        value: String,
    },
}

impl FormPart {
    pub fn file(field: &'static str, file_name: &str) -> Self {
        FormPart::File {
            field,
            file_name: file_name.to_string(),
            contents: format!("fake {}", file_name).into_bytes(),
        }
    }

    pub fn text(field: &'static str, value: &str) -> Self {
        FormPart::Text {
            field,
            value: value.to_string(),
        }
    }
}

fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::File {
                field,
                file_name,
                contents,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        field, file_name
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(contents);
            }
            FormPart::Text { field, value } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                        field, value
                    )
                    .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
