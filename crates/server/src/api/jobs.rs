//! Job intake and status endpoints.

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use podclip_core::{
    resolve_clip_length, CreateJobRequest, JobError, JobSnapshot, JobStatus, SourceKind,
    StorageConfig,
};

use super::handlers::ErrorResponse;
use crate::metrics::UPLOADED_FILES_TOTAL;
use crate::state::AppState;

/// Maximum number of images accepted with one podcast.
pub const MAX_IMAGES: usize = 100;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn job_error(e: JobError) -> ApiError {
    let status = match e {
        JobError::InputMissing { .. } | JobError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        JobError::UnknownJob(_) => StatusCode::NOT_FOUND,
    };
    api_error(status, e.to_string())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// Job status as polled by the upload form.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: String,
    pub kind: SourceKind,
    pub status: JobStatus,
    /// Percent of planned clips produced.
    pub progress: u8,
    pub total_clips: usize,
    pub clips_generated: usize,
    /// Download URLs of produced clips, in completion order.
    pub download_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobResponse {
    pub fn from_snapshot(snapshot: JobSnapshot, storage: &StorageConfig) -> Self {
        Self {
            download_urls: snapshot
                .outputs
                .iter()
                .map(|o| storage.download_url(&o.file_name))
                .collect(),
            id: snapshot.id,
            kind: snapshot.kind,
            status: snapshot.status,
            progress: snapshot.progress_percent,
            total_clips: snapshot.total_clips,
            clips_generated: snapshot.completed_clips,
            error_message: snapshot.error_message,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            finished_at: snapshot.finished_at,
        }
    }
}

/// Files and fields read from one upload form.
#[derive(Debug, Default)]
struct Uploads {
    source: Option<PathBuf>,
    images: Vec<PathBuf>,
    clip_duration: Option<String>,
}

impl Uploads {
    /// Every file stored for this form.
    fn stored_files(&self) -> Vec<PathBuf> {
        self.source.iter().chain(&self.images).cloned().collect()
    }
}

/// Removes uploads that no job will reference.
async fn discard_files(files: &[PathBuf]) {
    for path in files {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(file = %path.display(), error = %e, "Failed to remove rejected upload");
        }
    }
    if !files.is_empty() {
        debug!(count = files.len(), "Removed rejected uploads");
    }
}

/// POST /process-podcast
pub async fn process_podcast(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CreateJobResponse>, ApiError> {
    let uploads = read_uploads(multipart, &state.storage().upload_dir, "audio", true).await?;
    create_job(&state, SourceKind::Audio, uploads).await
}

/// POST /process-video
pub async fn process_video(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CreateJobResponse>, ApiError> {
    let uploads = read_uploads(multipart, &state.storage().upload_dir, "video", false).await?;
    create_job(&state, SourceKind::Video, uploads).await
}

/// GET /job/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let snapshot = state.orchestrator().get_job(&id).await.map_err(job_error)?;
    Ok(Json(JobResponse::from_snapshot(snapshot, state.storage())))
}

/// GET /jobs
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobResponse>> {
    let jobs = state
        .orchestrator()
        .list_jobs()
        .await
        .into_iter()
        .map(|s| JobResponse::from_snapshot(s, state.storage()))
        .collect();
    Json(jobs)
}

async fn create_job(
    state: &AppState,
    kind: SourceKind,
    uploads: Uploads,
) -> Result<Json<CreateJobResponse>, ApiError> {
    let clip_length_secs = resolve_clip_length(
        uploads.clip_duration.as_deref(),
        state.orchestrator().config().default_clip_length_secs,
    );

    let stored = uploads.stored_files();
    let request = CreateJobRequest {
        kind,
        source_path: uploads.source,
        image_paths: uploads.images,
        clip_length_secs,
    };

    match state.orchestrator().create_job(request).await {
        Ok(job_id) => Ok(Json(CreateJobResponse { job_id })),
        Err(e) => {
            // No job was created, so nothing refers to these files.
            discard_files(&stored).await;
            Err(job_error(e))
        }
    }
}

/// Reads the form, streaming files into `upload_dir`.
///
/// On error every file already stored for the form is removed.
async fn read_uploads(
    mut multipart: Multipart,
    upload_dir: &FsPath,
    source_field: &str,
    accept_images: bool,
) -> Result<Uploads, ApiError> {
    tokio::fs::create_dir_all(upload_dir).await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create upload directory: {}", e),
        )
    })?;

    let mut uploads = Uploads::default();
    match read_fields(
        &mut multipart,
        upload_dir,
        source_field,
        accept_images,
        &mut uploads,
    )
    .await
    {
        Ok(()) => Ok(uploads),
        Err(e) => {
            discard_files(&uploads.stored_files()).await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    upload_dir: &FsPath,
    source_field: &str,
    accept_images: bool,
    uploads: &mut Uploads,
) -> Result<(), ApiError> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };

        let name = field.name().unwrap_or("").to_string();
        // Browsers send an empty part for file inputs left blank.
        let has_file = field.file_name().is_some_and(|n| !n.is_empty());

        if name == source_field {
            if !has_file {
                continue;
            }
            if uploads.source.is_some() {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Only one {} file is allowed", source_field),
                ));
            }
            uploads.source = Some(save_upload(field, upload_dir).await?);
            UPLOADED_FILES_TOTAL.with_label_values(&[source_field]).inc();
        } else if name == "image" && accept_images {
            if !has_file {
                continue;
            }
            if uploads.images.len() >= MAX_IMAGES {
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("At most {} images are allowed", MAX_IMAGES),
                ));
            }
            uploads.images.push(save_upload(field, upload_dir).await?);
            UPLOADED_FILES_TOTAL.with_label_values(&["image"]).inc();
        } else if name == "clip_duration" {
            uploads.clip_duration = field.text().await.ok();
        } else {
            debug!(field = %name, "Ignoring form field");
        }
    }

    Ok(())
}

/// Streams one file part to `<millis>-<sanitized name>` inside `dir`.
async fn save_upload(mut field: Field<'_>, dir: &FsPath) -> Result<PathBuf, ApiError> {
    let original = field.file_name().unwrap_or("upload").to_string();
    let (path, mut file) = create_upload_file(dir, &sanitize_file_name(&original)).await?;

    let write_error = |e: std::io::Error| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to store upload: {}", e),
        )
    };

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "Upload interrupted");
                let _ = tokio::fs::remove_file(&path).await;
                return Err(api_error(
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read upload: {}", e),
                ));
            }
        };
        file.write_all(&chunk).await.map_err(write_error)?;
    }
    file.flush().await.map_err(write_error)?;

    debug!(file = %path.display(), "Upload stored");
    Ok(path)
}

/// Creates a new file for an upload without overwriting an existing one.
async fn create_upload_file(
    dir: &FsPath,
    name: &str,
) -> Result<(PathBuf, tokio::fs::File), ApiError> {
    let millis = Utc::now().timestamp_millis();

    for attempt in 0..100u32 {
        let file_name = if attempt == 0 {
            format!("{}-{}", millis, name)
        } else {
            format!("{}-{}-{}", millis, attempt, name)
        };
        let path = dir.join(file_name);

        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to store upload: {}", e),
                ))
            }
        }
    }

    Err(api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to store upload: too many files with the same name",
    ))
}

/// Reduces a client-supplied file name to a safe single path component.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podclip_core::ClipOutput;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("episode 12.mp3"), "episode_12.mp3");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cover.png"), "cover.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name("..."), "upload");
        assert_eq!(sanitize_file_name("canción.mp3"), "canci_n.mp3");
    }

    #[tokio::test]
    async fn test_create_upload_file_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_upload_file(dir.path(), "a.mp3").await.unwrap();
        let (second, _) = create_upload_file(dir.path(), "a.mp3").await.unwrap();
        assert_ne!(first, second);
        assert!(first
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("-a.mp3"));
    }

    #[test]
    fn test_job_response_projects_download_urls() {
        let snapshot = JobSnapshot {
            id: "abc".to_string(),
            kind: SourceKind::Audio,
            status: JobStatus::Processing,
            total_clips: 3,
            completed_clips: 1,
            progress_percent: 33,
            outputs: vec![ClipOutput {
                index: 1,
                file_name: "abc_clip2.mp3".to_string(),
                path: PathBuf::from("public/clips/abc_clip2.mp3"),
                size_bytes: 42,
            }],
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            finished_at: None,
        };

        let response = JobResponse::from_snapshot(snapshot, &StorageConfig::default());
        assert_eq!(response.download_urls, vec!["/public/clips/abc_clip2.mp3"]);
        assert_eq!(response.progress, 33);
        assert_eq!(response.clips_generated, 1);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "processing");
        assert!(json.get("error_message").is_none());
    }
}
