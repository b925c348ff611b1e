//! Per-job event aggregation.
//!
//! Every dispatched job gets one aggregator task. Clip tasks send their
//! results over a channel and the aggregator applies them to the job, so it
//! is the only writer for that job while clips are running.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::job::{JobEntry, JobStatus, JobTransition};
use crate::metrics;

use super::types::{ClipEvent, JobUpdateCallback};

/// Applies clip events to `entry` until the job is terminal.
///
/// If every sender goes away before that, the job is failed so it never stays
/// `processing` forever.
pub(crate) async fn run_aggregator(
    job_id: String,
    entry: JobEntry,
    mut events: mpsc::Receiver<ClipEvent>,
    on_update: Option<JobUpdateCallback>,
) -> JobStatus {
    while let Some(event) = events.recv().await {
        let transition = {
            let mut job = entry.write().await;
            match event {
                ClipEvent::Completed(output) => {
                    debug!(
                        job_id = %job_id,
                        clip = output.index,
                        file = %output.file_name,
                        "Clip completed"
                    );
                    job.record_clip_completed(output)
                }
                ClipEvent::Failed { index, error } => {
                    warn!(job_id = %job_id, clip = index, error = %error, "Clip failed");
                    job.fail(error)
                }
                ClipEvent::Skipped { index } => {
                    debug!(job_id = %job_id, clip = index, "Clip skipped");
                    JobTransition::Ignored
                }
            }
        };

        if let JobTransition::Terminal(status) = transition {
            report_terminal(&job_id, status, on_update.as_ref());
            return status;
        }
    }

    let mut job = entry.write().await;
    match job.fail("Clip workers stopped before the job finished") {
        JobTransition::Terminal(status) => {
            drop(job);
            report_terminal(&job_id, status, on_update.as_ref());
            status
        }
        _ => job.status(),
    }
}

/// Logs, counts and publishes a terminal transition.
pub(crate) fn report_terminal(
    job_id: &str,
    status: JobStatus,
    on_update: Option<&JobUpdateCallback>,
) {
    info!(job_id = %job_id, status = %status, "Job finished");
    metrics::JOBS_FINISHED
        .with_label_values(&[status.as_str()])
        .inc();
    if let Some(callback) = on_update {
        callback(job_id, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Job, JobRegistry};
    use crate::media::ClipOutput;
    use crate::planner::SourceKind;
    use rand::seq::SliceRandom;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn output(index: usize) -> ClipOutput {
        ClipOutput {
            index,
            file_name: format!("job_clip{}.mp3", index + 1),
            path: PathBuf::from(format!("job_clip{}.mp3", index + 1)),
            size_bytes: 1,
        }
    }

    async fn processing_job(registry: &JobRegistry, total: usize) -> (String, JobEntry) {
        let job = Job::new(SourceKind::Audio);
        let id = job.id().to_string();
        let entry = registry.insert(job).await;
        entry.write().await.start_processing(total);
        (id, entry)
    }

    fn counting_callback() -> (JobUpdateCallback, Arc<AtomicUsize>) {
        let terminal = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&terminal);
        let callback: JobUpdateCallback = Arc::new(move |_: &str, status: JobStatus| {
            if status.is_terminal() {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        (callback, terminal)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_any_completion_order_completes_once() {
        let mut rng = rand::rng();

        for trial in 0..50 {
            let total = 1 + trial % 12;
            let registry = JobRegistry::new();
            let (id, entry) = processing_job(&registry, total).await;
            let (callback, terminal) = counting_callback();

            let (tx, rx) = mpsc::channel(4);
            let aggregator = tokio::spawn(run_aggregator(
                id.clone(),
                Arc::clone(&entry),
                rx,
                Some(callback),
            ));

            let mut order: Vec<usize> = (0..total).collect();
            order.shuffle(&mut rng);
            let senders: Vec<_> = order
                .into_iter()
                .map(|index| {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        tokio::task::yield_now().await;
                        let _ = tx.send(ClipEvent::Completed(output(index))).await;
                    })
                })
                .collect();
            drop(tx);
            futures::future::join_all(senders).await;

            assert_eq!(aggregator.await.unwrap(), JobStatus::Completed);
            let snapshot = registry.get(&id).await.unwrap();
            assert_eq!(snapshot.completed_clips, total);
            assert_eq!(snapshot.outputs.len(), total);
            assert_eq!(snapshot.progress_percent, 100);
            assert_eq!(terminal.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn test_failure_keeps_earlier_outputs() {
        let registry = JobRegistry::new();
        let (id, entry) = processing_job(&registry, 3).await;

        let (tx, rx) = mpsc::channel(8);
        tx.send(ClipEvent::Completed(output(2))).await.unwrap();
        tx.send(ClipEvent::Failed {
            index: 0,
            error: "ffmpeg exited with code 1: bad input".to_string(),
        })
        .await
        .unwrap();
        tx.send(ClipEvent::Completed(output(1))).await.unwrap();
        drop(tx);

        let status = run_aggregator(id.clone(), entry, rx, None).await;
        assert_eq!(status, JobStatus::Failed);

        let snapshot = registry.get(&id).await.unwrap();
        assert_eq!(snapshot.outputs, vec![output(2)]);
        assert_eq!(snapshot.completed_clips, 1);
        assert_eq!(
            snapshot.error_message.as_deref(),
            Some("ffmpeg exited with code 1: bad input")
        );
    }

    #[tokio::test]
    async fn test_closed_channel_fails_job() {
        let registry = JobRegistry::new();
        let (id, entry) = processing_job(&registry, 2).await;
        let (callback, terminal) = counting_callback();

        let (tx, rx) = mpsc::channel(8);
        tx.send(ClipEvent::Completed(output(0))).await.unwrap();
        tx.send(ClipEvent::Skipped { index: 1 }).await.unwrap();
        drop(tx);

        let status = run_aggregator(id.clone(), entry, rx, Some(callback)).await;
        assert_eq!(status, JobStatus::Failed);
        assert_eq!(terminal.load(Ordering::SeqCst), 1);

        let snapshot = registry.get(&id).await.unwrap();
        assert_eq!(snapshot.completed_clips, 1);
        assert!(snapshot.error_message.is_some());
    }
}
