//! Interruption, checkpointing, resumption and concurrency-bound tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use rekonvert_core::testing::MockConverter;
use rekonvert_core::{
    BatchError, BatchRunner, CancelSource, CancelToken, Config, OutputFormat, RunOptions,
};

struct ResumeHarness {
    config: Config,
    source: PathBuf,
    output: PathBuf,
    _temp_dir: TempDir,
}

impl ResumeHarness {
    fn new(max_workers: usize) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let source = temp_dir.path().join("music");
        let output = temp_dir.path().join("converted");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&output).unwrap();

        let mut config = Config::default();
        config.index.index_path = temp_dir.path().join("index");
        config.index.checkpoint_path = temp_dir.path().join("checkpoint");
        config.scheduler.max_workers = max_workers;

        Self {
            config,
            source,
            output,
            _temp_dir: temp_dir,
        }
    }

    /// Creates `count` convertible source files.
    fn make_tracks(&self, count: usize) {
        for i in 0..count {
            fs::write(self.source.join(format!("track{:02}.mp3", i)), b"mp3").unwrap();
        }
    }

    /// A runner sharing this harness's durable-state paths.
    fn runner(&self, converter: Arc<MockConverter>) -> BatchRunner<MockConverter> {
        BatchRunner::new(self.config.clone(), converter)
    }

    fn options(&self) -> RunOptions {
        RunOptions::new(&self.source, &self.output, OutputFormat::Flac).recursive(true)
    }

    fn outputs_present(&self, count: usize) -> usize {
        (0..count)
            .filter(|i| self.output.join(format!("track{:02}.flac", i)).exists())
            .count()
    }
}

#[tokio::test]
async fn test_bounded_concurrency() {
    let harness = ResumeHarness::new(2);
    harness.make_tracks(8);

    let converter = Arc::new(MockConverter::new());
    converter
        .set_conversion_duration(Duration::from_millis(40))
        .await;
    let runner = harness.runner(Arc::clone(&converter));

    let report = runner
        .run(harness.options(), false, CancelToken::never(), None)
        .await
        .unwrap();

    assert_eq!(report.files_done, 8);
    assert!(converter.max_concurrent_seen() <= 2);
    assert!(converter.max_concurrent_seen() >= 1);
}

#[tokio::test]
async fn test_zero_workers_runs_serially() {
    let harness = ResumeHarness::new(0);
    harness.make_tracks(5);

    let converter = Arc::new(MockConverter::new());
    converter
        .set_conversion_duration(Duration::from_millis(10))
        .await;
    let runner = harness.runner(Arc::clone(&converter));

    let report = runner
        .run(harness.options(), false, CancelToken::never(), None)
        .await
        .unwrap();

    assert_eq!(report.files_done, 5);
    assert_eq!(converter.max_concurrent_seen(), 1);
    assert_eq!(harness.outputs_present(5), 5);
}

#[tokio::test]
async fn test_interrupt_then_resume_completes_exactly_the_remainder() {
    let harness = ResumeHarness::new(2);
    harness.make_tracks(6);

    // First run: cancel as soon as the first job completes.
    let converter = Arc::new(MockConverter::new());
    converter
        .set_conversion_duration(Duration::from_millis(300))
        .await;
    let runner = Arc::new(harness.runner(Arc::clone(&converter)));

    let cancel = CancelSource::new();
    let (progress_tx, mut progress_rx) = mpsc::channel(64);
    let run_handle = tokio::spawn({
        let runner = Arc::clone(&runner);
        let options = harness.options();
        let token = cancel.token();
        async move { runner.run(options, false, token, Some(progress_tx)).await }
    });

    progress_rx.recv().await.expect("no progress before cancel");
    cancel.cancel();
    let report = run_handle.await.unwrap().unwrap();

    assert!(report.interrupted);
    let done = report.files_done;
    assert!(done >= 1, "at least the observed job must be counted");
    assert!(done < 6, "cancellation must leave work for the resume");

    // The durable pair survives, and the checkpoint matches the report.
    assert!(runner.has_resumable_run());
    let checkpoint = runner.resumable_checkpoint().unwrap().unwrap();
    assert_eq!(checkpoint.files_done, done);
    assert_eq!(checkpoint.conversions_done, report.conversions_done);

    // Second run resumes with a fresh converter so the remainder is counted.
    let resumed_converter = Arc::new(MockConverter::new());
    let resumed_runner = harness.runner(Arc::clone(&resumed_converter));
    let resumed_report = resumed_runner
        .run(harness.options(), true, CancelToken::never(), None)
        .await
        .unwrap();

    assert!(!resumed_report.interrupted);
    assert!(resumed_report.resumed);
    assert_eq!(resumed_report.files_done, 6);
    assert_eq!(resumed_report.conversions_done, 6);
    assert!(resumed_report.missing_outputs.is_empty());

    // Exactly the remaining jobs were executed, and every output landed.
    assert_eq!(resumed_converter.conversion_count().await as u64, 6 - done);
    assert_eq!(harness.outputs_present(6), 6);

    // Clean completion supersedes both durable files.
    assert!(!resumed_runner.has_resumable_run());
}

#[tokio::test]
async fn test_checkpoint_on_disk_format() {
    let harness = ResumeHarness::new(1);
    harness.make_tracks(4);

    let converter = Arc::new(MockConverter::new());
    converter
        .set_conversion_duration(Duration::from_millis(200))
        .await;
    let runner = Arc::new(harness.runner(converter));

    let cancel = CancelSource::new();
    let (progress_tx, mut progress_rx) = mpsc::channel(64);
    let run_handle = tokio::spawn({
        let runner = Arc::clone(&runner);
        let options = harness.options();
        let token = cancel.token();
        async move { runner.run(options, false, token, Some(progress_tx)).await }
    });

    progress_rx.recv().await.expect("no progress before cancel");
    cancel.cancel();
    let report = run_handle.await.unwrap().unwrap();
    assert!(report.interrupted);

    let contents = fs::read_to_string(&harness.config.index.checkpoint_path).unwrap();
    assert_eq!(
        contents.trim(),
        format!("{},{}", report.files_done, report.conversions_done)
    );
}

#[tokio::test]
async fn test_fresh_run_discards_stale_state() {
    let harness = ResumeHarness::new(2);
    harness.make_tracks(4);

    // Interrupt a first run.
    let converter = Arc::new(MockConverter::new());
    converter
        .set_conversion_duration(Duration::from_millis(200))
        .await;
    let runner = Arc::new(harness.runner(converter));

    let cancel = CancelSource::new();
    let (progress_tx, mut progress_rx) = mpsc::channel(64);
    let run_handle = tokio::spawn({
        let runner = Arc::clone(&runner);
        let options = harness.options();
        let token = cancel.token();
        async move { runner.run(options, false, token, Some(progress_tx)).await }
    });
    progress_rx.recv().await.expect("no progress before cancel");
    cancel.cancel();
    let report = run_handle.await.unwrap().unwrap();
    assert!(report.interrupted);
    assert!(runner.has_resumable_run());

    // The operator declines to resume: a fresh run rescans everything.
    let fresh_converter = Arc::new(MockConverter::new());
    let fresh_runner = harness.runner(Arc::clone(&fresh_converter));
    let fresh_report = fresh_runner
        .run(harness.options(), false, CancelToken::never(), None)
        .await
        .unwrap();

    assert!(!fresh_report.interrupted);
    assert!(!fresh_report.resumed);
    assert_eq!(fresh_report.total_jobs, 4);
    assert_eq!(fresh_report.files_done, 4);
    assert_eq!(fresh_converter.conversion_count().await, 4);
    assert!(!fresh_runner.has_resumable_run());
}

#[tokio::test]
async fn test_resume_without_state_is_rejected() {
    let harness = ResumeHarness::new(2);
    harness.make_tracks(1);

    let runner = harness.runner(Arc::new(MockConverter::new()));
    let result = runner
        .run(harness.options(), true, CancelToken::never(), None)
        .await;

    assert!(matches!(result, Err(BatchError::NothingToResume)));
}

#[tokio::test]
async fn test_progress_reports_monotonic_counts() {
    let harness = ResumeHarness::new(2);
    harness.make_tracks(5);

    let converter = Arc::new(MockConverter::new());
    let runner = harness.runner(converter);

    let (progress_tx, mut progress_rx) = mpsc::channel(64);
    let report = runner
        .run(
            harness.options(),
            false,
            CancelToken::never(),
            Some(progress_tx),
        )
        .await
        .unwrap();
    assert_eq!(report.files_done, 5);

    let mut last = 0;
    while let Some(progress) = progress_rx.recv().await {
        assert!(progress.files_done >= last);
        assert_eq!(progress.total_jobs, 5);
        last = progress.files_done;
    }
    assert!(last <= 5);
}
