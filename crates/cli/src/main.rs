mod cli;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rekonvert_core::{
    load_config, validate_config, BatchRunner, CancelSource, Config, FfmpegConverter, RunOptions,
    RunProgress, RunReport,
};

use cli::Cli;

/// Exit code for a run stopped by the operator.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::default(),
    };
    if let Some(workers) = cli.workers {
        config.scheduler.max_workers = workers;
    }
    validate_config(&config).context("Configuration validation failed")?;

    let converter = Arc::new(FfmpegConverter::new(config.converter.clone()));
    let runner = BatchRunner::new(config, converter);

    if cli.single_file {
        return run_single_file(&runner, &cli).await;
    }

    if !cli.output.exists() {
        std::fs::create_dir_all(&cli.output)
            .with_context(|| format!("Failed to create output directory {:?}", cli.output))?;
    }

    let resume = decide_resume(&runner, &cli)?;

    let cancel = Arc::new(CancelSource::new());
    let token = cancel.token();
    spawn_interrupt_handler(cancel);

    let (progress_tx, progress_rx) = mpsc::channel(256);
    let progress_task = tokio::spawn(report_progress(progress_rx));

    let options = RunOptions::new(&cli.target, &cli.output, cli.format)
        .recursive(cli.recursive)
        .skip_existing(cli.skip_existing)
        .copy_all(cli.copy_all);

    let report = runner.run(options, resume, token, Some(progress_tx)).await?;
    let _ = progress_task.await;

    print_summary(&report, cli.json)?;
    if report.interrupted {
        std::process::exit(EXIT_INTERRUPTED);
    }
    Ok(())
}

/// Figures out whether to replay the previous run's index.
fn decide_resume(runner: &BatchRunner<FfmpegConverter>, cli: &Cli) -> Result<bool> {
    if !runner.has_resumable_run() {
        if cli.resume {
            bail!("No interrupted run to resume");
        }
        return Ok(false);
    }
    if cli.resume {
        return Ok(true);
    }
    if cli.fresh {
        return Ok(false);
    }

    loop {
        print!("An interrupted run was found. Resume where it left off? [y/n] ");
        std::io::stdout().flush()?;
        let mut answer = String::new();
        std::io::stdin().read_line(&mut answer)?;
        match answer.trim() {
            "y" | "Y" => return Ok(true),
            "n" | "N" => return Ok(false),
            _ => eprintln!("Invalid input"),
        }
    }
}

/// First Ctrl-C cancels cooperatively; a second one force-quits.
fn spawn_interrupt_handler(cancel: Arc<CancelSource>) {
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, draining in-flight conversions (Ctrl-C again to force quit)");
            cancel.cancel();
            if signal::ctrl_c().await.is_ok() {
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
    });
}

async fn report_progress(mut rx: mpsc::Receiver<RunProgress>) {
    while let Some(progress) = rx.recv().await {
        let current = progress
            .current_path
            .map(|p| format!(" - {}", p.display()))
            .unwrap_or_default();
        info!(
            "{}/{} files, {}/{} conversions{}",
            progress.files_done,
            progress.total_jobs,
            progress.conversions_done,
            progress.convert_jobs,
            current
        );
    }
}

fn print_summary(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for failure in &report.failures {
        error!(
            "{} failed: {}",
            failure.input_path.display(),
            failure.diagnostic
        );
    }
    for missing in &report.missing_outputs {
        error!(
            "{} was not produced at {}",
            missing.input_path.display(),
            missing.output_path.display()
        );
    }

    if report.interrupted {
        warn!(
            "interrupted after {}/{} files; run again to resume",
            report.files_done, report.total_jobs
        );
    } else if report.is_clean() {
        info!(
            "done: {} files processed, {} converted",
            report.files_done, report.conversions_done
        );
    } else {
        warn!(
            "completed with {} failures and {} missing outputs",
            report.failures.len(),
            report.missing_outputs.len()
        );
    }
    Ok(())
}

async fn run_single_file(runner: &BatchRunner<FfmpegConverter>, cli: &Cli) -> Result<()> {
    if !cli.target.is_file() {
        bail!("--single-file requires --target to point at a file");
    }
    let output = single_file_output(&cli.target, &cli.output, cli.format.extension());
    let result = runner
        .convert_single(&cli.target, &output)
        .await
        .with_context(|| format!("Failed to convert {:?}", cli.target))?;
    info!(
        "converted {} -> {} in {} ms",
        cli.target.display(),
        result.output_path.display(),
        result.duration_ms
    );
    Ok(())
}

/// Destination for a single-file conversion: next to the source by default,
/// inside `output` when it is a directory, else `output` itself with the
/// format's extension.
fn single_file_output(target: &Path, output: &Path, extension: &str) -> PathBuf {
    if output == Path::new(".") {
        target.with_extension(extension)
    } else if output.is_dir() {
        match target.file_name() {
            Some(name) => output.join(name).with_extension(extension),
            None => output.with_extension(extension),
        }
    } else {
        output.with_extension(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_output_default_is_alongside_source() {
        let out = single_file_output(Path::new("/music/track.mp3"), Path::new("."), "flac");
        assert_eq!(out, PathBuf::from("/music/track.flac"));
    }

    #[test]
    fn test_single_file_output_into_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let out = single_file_output(Path::new("/music/track.mp3"), dir.path(), "m4a");
        assert_eq!(out, dir.path().join("track.m4a"));
    }

    #[test]
    fn test_single_file_output_explicit_file() {
        let out = single_file_output(
            Path::new("/music/track.mp3"),
            Path::new("/tmp/renamed"),
            "mp3",
        );
        assert_eq!(out, PathBuf::from("/tmp/renamed.mp3"));
    }
}
