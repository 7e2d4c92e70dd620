//! filedrop entry point.
//!
//! Queues the given files, uploads them through the simulated backend
//! and prints notifications, progress and a final report.

mod config;
mod intake;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::Parser;
use filedrop_notify::{ToastQueue, notify};
use filedrop_protocol::{FileCategory, FileStatus, format_file_size};
use filedrop_queue::{QueueEvent, UploadQueue};
use filedrop_transfer::{SimulatedTransport, UploadTransport};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "filedrop", version, about = "Queue files and upload them")]
struct Args {
    /// Files to upload.
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Config file (defaults to the per-user location).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the simulated backend.
    #[arg(long)]
    seed: Option<u64>,

    /// Retry failed files once after the run.
    #[arg(long)]
    retry_failed: bool,

    /// Print the backend's upload history at the end.
    #[arg(long)]
    history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting filedrop");

    let mut config = match config::FiledropConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            config::FiledropConfig::default()
        }
    };
    if args.seed.is_some() {
        config.simulation.seed = args.seed;
    }

    let transport = Arc::new(SimulatedTransport::new(config.simulation.clone()));
    let queue = UploadQueue::new(transport.clone(), config.queue.clone());
    let Some(mut events) = queue.take_events() else {
        bail!("event stream already taken");
    };
    let mut toasts = ToastQueue::new();

    let files = intake::collect(&args.paths);
    if files.is_empty() {
        bail!("no readable files given");
    }

    let added = queue.add_files(files);
    if added.truncated > 0 {
        println!(
            "only the first {} files were queued, {} ignored",
            config.queue.max_files_per_batch, added.truncated
        );
    }
    report_pending(&queue, &mut events, &mut toasts);

    if queue.pending_count() > 0 {
        drive(queue.upload_all(), &queue, &mut events, &mut toasts).await?;
    }

    if args.retry_failed {
        let failed: Vec<String> = queue
            .files()
            .into_iter()
            .filter(|f| f.status == FileStatus::Error)
            .map(|f| f.id)
            .collect();
        for id in failed {
            drive(queue.retry(&id), &queue, &mut events, &mut toasts).await?;
        }
    }

    print_report(&queue);

    if args.history {
        let history = transport.history().await?;
        println!("\nupload history ({} entries):", history.len());
        for entry in history {
            println!(
                "  {}  {}  {}  {}",
                entry.uploaded_at.format("%Y-%m-%d %H:%M:%S"),
                entry.id,
                entry.original_name,
                entry.url
            );
        }
    }

    Ok(())
}

/// Runs `work` while printing queue events as they arrive.
async fn drive<T>(
    work: impl Future<Output = T>,
    queue: &UploadQueue,
    events: &mut mpsc::Receiver<QueueEvent>,
    toasts: &mut ToastQueue,
) -> T {
    tokio::pin!(work);
    let output = loop {
        tokio::select! {
            output = &mut work => break output,
            Some(event) = events.recv() => report(queue, toasts, &event),
        }
    };
    report_pending(queue, events, toasts);
    output
}

fn report_pending(
    queue: &UploadQueue,
    events: &mut mpsc::Receiver<QueueEvent>,
    toasts: &mut ToastQueue,
) {
    while let Ok(event) = events.try_recv() {
        report(queue, toasts, &event);
    }
}

fn report(queue: &UploadQueue, toasts: &mut ToastQueue, event: &QueueEvent) {
    if let QueueEvent::Progress { id, progress, speed } = event {
        // Every fifth step of the default simulation.
        if (*progress as u64) % 25 == 0 && *progress > 0.0 {
            if let Some(file) = queue.file(id) {
                println!(
                    "  {:<32} {:>5.1}%  {}/s",
                    file.name,
                    progress,
                    format_file_size(*speed as u64)
                );
            }
        }
        return;
    }

    notify(toasts, event);
    for toast in toasts.drain() {
        match toast.message {
            Some(message) => {
                println!("[{}] {} ({})", toast.toast_type.label(), toast.title, message)
            }
            None => println!("[{}] {}", toast.toast_type.label(), toast.title),
        }
    }
}

fn print_report(queue: &UploadQueue) {
    println!();
    for file in queue.files() {
        let category = FileCategory::from_mime(&file.mime_type).label();
        let detail = match (&file.result, &file.error) {
            (Some(result), _) => result.url.clone(),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        println!(
            "{:<32} {:<9} {:>9}  {:<10} {}",
            file.name,
            category,
            format_file_size(file.size),
            file.status.to_string(),
            detail
        );
    }

    if let Some(session) = queue.session() {
        println!(
            "\n{}/{} uploaded, {} failed, {} total ({:.0}% complete)",
            session.completed_files,
            session.total_files,
            session.failed_files,
            format_file_size(session.total_size),
            session.completion_rate()
        );
        if session.is_complete() {
            println!("all files uploaded");
        }
        if session.outstanding_files() > 0 {
            println!("{} file(s) not uploaded yet", session.outstanding_files());
        }
        if session.has_failures() {
            println!("some uploads failed, rerun with --retry-failed to try them again");
        }
    }
}
