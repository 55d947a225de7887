use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Re-export types from the library crate
pub use photo_report::{
    CancelToken, DecodeFailurePolicy, ImageDescriptor, ImageFailure, RenderEvent, ReportJob,
    ReportOptions, ReportStatistics,
};

/// Commands sent from a front end to the worker
#[derive(Debug)]
pub enum ReportCommand {
    /// Probe input files and classify them
    ResolveImages {
        paths: Vec<PathBuf>,
        policy: DecodeFailurePolicy,
    },
    CalculateStats {
        images: Vec<ImageDescriptor>,
        start_counter: u32,
    },
    LoadConfig {
        path: PathBuf,
    },
    /// Render a report; only one may run at a time
    Generate {
        job: ReportJob,
        options: ReportOptions,
    },
    /// Cancel the running report, if any
    Cancel,
}

/// Updates sent from the worker to the front end
#[derive(Debug, Clone)]
pub enum ReportUpdate {
    ImagesResolved {
        images: Vec<ImageDescriptor>,
        failures: Vec<ImageFailure>,
    },
    StatsCalculated {
        stats: ReportStatistics,
    },
    ConfigLoaded {
        options: ReportOptions,
    },
    Progress {
        current: usize,
        total: usize,
    },
    ReportComplete {
        path: PathBuf,
    },
    ReportCancelled,
    Error {
        message: String,
    },
}

impl From<RenderEvent> for ReportUpdate {
    fn from(event: RenderEvent) -> Self {
        match event {
            RenderEvent::Progress { current, total } => ReportUpdate::Progress { current, total },
            RenderEvent::Completed { output } => ReportUpdate::ReportComplete { path: output },
            RenderEvent::Cancelled => ReportUpdate::ReportCancelled,
            RenderEvent::Failed { reason } => ReportUpdate::Error {
                message: format!("Failed to create report: {reason}"),
            },
        }
    }
}

/// The report currently being rendered
struct ActiveReport {
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

/// Async worker task that processes report commands and sends updates
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<ReportCommand>,
    update_tx: mpsc::UnboundedSender<ReportUpdate>,
) {
    let mut active: Option<ActiveReport> = None;

    while let Some(cmd) = command_rx.recv().await {
        if active.as_ref().is_some_and(|a| a.handle.is_finished()) {
            active = None;
        }

        match cmd {
            ReportCommand::ResolveImages { paths, policy } => {
                handle_resolve_images(paths, policy, &update_tx).await;
            }
            ReportCommand::CalculateStats {
                images,
                start_counter,
            } => match photo_report::calculate_statistics(&images, start_counter) {
                Ok(stats) => {
                    let _ = update_tx.send(ReportUpdate::StatsCalculated { stats });
                }
                Err(e) => {
                    let _ = update_tx.send(ReportUpdate::Error {
                        message: format!("Failed to calculate statistics: {e}"),
                    });
                }
            },
            ReportCommand::LoadConfig { path } => match ReportOptions::load(&path).await {
                Ok(options) => {
                    let _ = update_tx.send(ReportUpdate::ConfigLoaded { options });
                }
                Err(e) => {
                    let _ = update_tx.send(ReportUpdate::Error {
                        message: format!("Failed to load config: {e}"),
                    });
                }
            },
            ReportCommand::Generate { job, options } => {
                if active.is_some() {
                    let _ = update_tx.send(ReportUpdate::Error {
                        message: "A report is already being generated".to_string(),
                    });
                    continue;
                }
                active = Some(spawn_report(job, options, update_tx.clone()));
            }
            ReportCommand::Cancel => match &active {
                Some(report) => {
                    log::info!("Cancelling report");
                    report.cancel.cancel();
                }
                None => log::debug!("Cancel requested with no report running"),
            },
        }
    }

    // Front end is gone: stop at the next page boundary and wait
    if let Some(report) = active {
        report.cancel.cancel();
        let _ = report.handle.await;
    }
}

async fn handle_resolve_images(
    paths: Vec<PathBuf>,
    policy: DecodeFailurePolicy,
    update_tx: &mpsc::UnboundedSender<ReportUpdate>,
) {
    let result = tokio::task::spawn_blocking(move || {
        photo_report::resolve_images(&paths, &photo_report::FsImageSource, &policy)
    })
    .await;

    let update = match result {
        Ok(Ok(resolved)) => ReportUpdate::ImagesResolved {
            images: resolved.images,
            failures: resolved.failures,
        },
        Ok(Err(e)) => ReportUpdate::Error {
            message: format!("Failed to read images: {e}"),
        },
        Err(e) => ReportUpdate::Error {
            message: format!("Failed to read images: {e}"),
        },
    };
    let _ = update_tx.send(update);
}

fn spawn_report(
    job: ReportJob,
    options: ReportOptions,
    update_tx: mpsc::UnboundedSender<ReportUpdate>,
) -> ActiveReport {
    let cancel = CancelToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let render = photo_report::generate_report(job, options, token, event_tx);
        let forward = async {
            while let Some(event) = event_rx.recv().await {
                let _ = update_tx.send(ReportUpdate::from(event));
            }
        };

        let (result, ()) = tokio::join!(render, forward);
        // Anything but a join failure has already produced a terminal event
        if let Err(photo_report::ReportError::TaskJoin(e)) = result {
            let _ = update_tx.send(ReportUpdate::Error {
                message: format!("Report worker crashed: {e}"),
            });
        }
    });

    ActiveReport { cancel, handle }
}
