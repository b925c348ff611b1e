//! HTTP-level tests for job intake, status polling and clip downloads.

mod common;

use axum::http::StatusCode;
use common::{FormPart, TestFixture};

fn stored_uploads(fixture: &TestFixture) -> usize {
    match std::fs::read_dir(fixture.upload_dir()) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

fn job_id(body: &serde_json::Value) -> String {
    body["job_id"]
        .as_str()
        .expect("response carries job_id")
        .to_string()
}

#[tokio::test]
async fn test_root_banner_and_health() {
    let fixture = TestFixture::new(60.0);

    let root = fixture.get("/").await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.raw, b"PodClip backend is running");

    let health = fixture.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");
}

#[tokio::test]
async fn test_podcast_job_runs_to_completion() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("audio", "episode.mp3"),
                FormPart::text("clip_duration", "60"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    assert_eq!(job["id"], id.as_str());
    assert_eq!(job["kind"], "audio");
    assert_eq!(job["status"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["total_clips"], 2);
    assert_eq!(job["clips_generated"], 2);
    assert!(job.get("error_message").is_none());
    assert!(job["finished_at"].is_string());

    let mut urls: Vec<String> = job["download_urls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u.as_str().unwrap().to_string())
        .collect();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            format!("/public/clips/{}_clip1.mp3", id),
            format!("/public/clips/{}_clip2.mp3", id),
        ]
    );
}

#[tokio::test]
async fn test_upload_is_stored_with_timestamp_prefix() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("audio", "my episode.mp3"),
                FormPart::file("image", "cover.png"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let mut stored: Vec<String> = std::fs::read_dir(fixture.upload_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    stored.sort();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().any(|n| n.ends_with("-my_episode.mp3")));
    assert!(stored.iter().any(|n| n.ends_with("-cover.png")));

    let probed = fixture.toolkit.probed_paths().await;
    assert_eq!(probed.len(), 1);
    assert!(probed[0].starts_with(fixture.upload_dir()));
}

#[tokio::test]
async fn test_podcast_with_images_renders_mp4() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("audio", "episode.mp3"),
                FormPart::file("image", "a.png"),
                FormPart::file("image", "b.png"),
            ],
        )
        .await;
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    assert_eq!(job["status"], "completed");
    for url in job["download_urls"].as_array().unwrap() {
        assert!(url.as_str().unwrap().ends_with(".mp4"));
    }
}

#[tokio::test]
async fn test_missing_audio_is_rejected() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form("/process-podcast", &[FormPart::file("image", "a.png")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No audio file uploaded");
    assert_eq!(stored_uploads(&fixture), 0);

    let jobs = fixture.get("/jobs").await;
    assert_eq!(jobs.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_missing_video_is_rejected() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form("/process-video", &[FormPart::text("clip_duration", "30")])
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No video file uploaded");
}

#[tokio::test]
async fn test_video_job_uses_clip_duration() {
    let fixture = TestFixture::new(95.0);

    let response = fixture
        .post_form(
            "/process-video",
            &[
                FormPart::file("video", "talk.mp4"),
                FormPart::text("clip_duration", "30"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    assert_eq!(job["kind"], "video");
    assert_eq!(job["status"], "completed");
    assert_eq!(job["total_clips"], 3);
}

#[tokio::test]
async fn test_unparseable_clip_duration_uses_default() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("audio", "episode.mp3"),
                FormPart::text("clip_duration", "soon"),
            ],
        )
        .await;
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    // 125 s at the default 60 s clip length
    assert_eq!(job["total_clips"], 2);
}

#[tokio::test]
async fn test_probe_failure_returns_failed_job() {
    let fixture = TestFixture::new(125.0);
    fixture
        .toolkit
        .set_probe_error("Invalid data found when processing input")
        .await;

    let response = fixture
        .post_form("/process-podcast", &[FormPart::file("audio", "broken.mp3")])
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let id = job_id(&response.body);

    let job = fixture.get(&format!("/job/{}", id)).await;
    assert_eq!(job.body["status"], "failed");
    assert_eq!(
        job.body["error_message"],
        "Invalid data found when processing input"
    );
    assert_eq!(job.body["total_clips"], 0);
    assert_eq!(job.body["progress"], 0);
}

#[tokio::test]
async fn test_clip_failure_fails_job() {
    let fixture = TestFixture::new(185.0);
    fixture
        .toolkit
        .fail_clip(1, "ffmpeg exited with code 1: Conversion failed!")
        .await;

    let response = fixture
        .post_form("/process-podcast", &[FormPart::file("audio", "episode.mp3")])
        .await;
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    assert_eq!(job["status"], "failed");
    assert_eq!(
        job["error_message"],
        "ffmpeg exited with code 1: Conversion failed!"
    );
    assert!(job["clips_generated"].as_u64().unwrap() < 3);
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let fixture = TestFixture::new(125.0);

    let response = fixture.get("/job/does-not-exist").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Job not found: does-not-exist");
}

#[tokio::test]
async fn test_too_many_images_rejected() {
    let fixture = TestFixture::new(125.0);

    let mut parts = vec![FormPart::file("audio", "episode.mp3")];
    for i in 0..=100 {
        parts.push(FormPart::file("image", &format!("img{}.png", i)));
    }

    let response = fixture.post_form("/process-podcast", &parts).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "At most 100 images are allowed");
    assert_eq!(stored_uploads(&fixture), 0);
}

#[tokio::test]
async fn test_second_source_file_rejected_and_removed() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("image", "cover.png"),
                FormPart::file("audio", "one.mp3"),
                FormPart::file("audio", "two.mp3"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Only one audio file is allowed");
    assert_eq!(stored_uploads(&fixture), 0);
    assert!(fixture.toolkit.probed_paths().await.is_empty());
}

#[tokio::test]
async fn test_accepted_uploads_are_kept() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form(
            "/process-podcast",
            &[
                FormPart::file("audio", "episode.mp3"),
                FormPart::file("image", "cover.png"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(stored_uploads(&fixture), 2);
}

#[tokio::test]
async fn test_jobs_listed_newest_first() {
    let fixture = TestFixture::new(30.0);

    let mut ids = Vec::new();
    for _ in 0..3 {
        let response = fixture
            .post_form("/process-podcast", &[FormPart::file("audio", "episode.mp3")])
            .await;
        ids.push(job_id(&response.body));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let jobs = fixture.get("/jobs").await;
    let listed: Vec<&str> = jobs
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["id"].as_str().unwrap())
        .collect();
    ids.reverse();
    assert_eq!(listed, ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_clip_download_served_with_media_type() {
    let fixture = TestFixture::new(65.0);
    fixture.toolkit.set_write_outputs(true).await;

    let response = fixture
        .post_form("/process-podcast", &[FormPart::file("audio", "episode.mp3")])
        .await;
    let id = job_id(&response.body);

    let job = fixture.wait_for_terminal(&id).await;
    assert_eq!(job["status"], "completed");
    let url = job["download_urls"][0].as_str().unwrap().to_string();

    let download = fixture.get(&url).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.content_type.as_deref(), Some("audio/mpeg"));
    assert_eq!(download.raw, format!("clip 1 of {}", id).into_bytes());
}

#[tokio::test]
async fn test_status_and_metrics_endpoints() {
    let fixture = TestFixture::new(125.0);

    let response = fixture
        .post_form("/process-podcast", &[FormPart::file("audio", "episode.mp3")])
        .await;
    let id = job_id(&response.body);
    fixture.wait_for_terminal(&id).await;

    let status = fixture.get("/status").await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["jobs"]["completed"], 1);
    assert_eq!(status.body["pool"]["max_concurrent"], 4);
    assert_eq!(status.body["pool"]["active_clips"], 0);

    let metrics = fixture.get("/metrics").await;
    assert_eq!(metrics.status, StatusCode::OK);
    let text = String::from_utf8(metrics.raw).unwrap();
    assert!(text.contains("podclip_jobs_by_status"));
    assert!(text.contains("podclip_uploaded_files_total"));
}

#[tokio::test]
async fn test_upload_over_body_limit_rejected() {
    let fixture = TestFixture::with_config(125.0, |config| {
        config.server.max_upload_mb = 1;
    });

    let response = fixture
        .post_form(
            "/process-podcast",
            &[FormPart::File {
                field: "audio",
                file_name: "huge.mp3".to_string(),
                contents: vec![0u8; 2 * 1024 * 1024],
            }],
        )
        .await;
    assert!(response.status.is_client_error());
    assert_eq!(fixture.toolkit.probed_paths().await.len(), 0);
    assert_eq!(stored_uploads(&fixture), 0);
}
