mod logger;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photo_report::{
    CaptionFormat, DecodeFailurePolicy, FsImageSource, ImageDescriptor, ImageSource,
    PageGeometry, PaperSize, ReportJob, ReportOptions, calculate_statistics, group_blocks,
    layout_block, resolve_images,
};
use photo_report_runtime::{ReportCommand, ReportUpdate, worker_task};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use logger::CliLogger;

#[derive(Parser)]
#[command(name = "photorep", about = "Photo report PDF generator", version)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a photo report PDF and its normalized photos
    Generate {
        #[command(flatten)]
        report: ReportArgs,

        /// Parent directory of the report folder
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Replace an existing report folder
        #[arg(long)]
        overwrite: bool,
    },

    /// Show how images will be paginated without rendering
    Plan {
        #[command(flatten)]
        report: ReportArgs,

        /// Also print the computed page geometry and placements
        #[arg(long)]
        layout: bool,
    },

    /// Write the default configuration to a JSON file
    InitConfig {
        /// Output JSON file
        output: PathBuf,

        /// Paper size to store
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,
    },
}

#[derive(Args)]
struct ReportArgs {
    /// Input images or directories of images
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Case number
    #[arg(long)]
    case_id: String,

    /// Document code; leave empty to omit it from captions
    #[arg(long, default_value = "")]
    doc_code: String,

    /// Document count
    #[arg(long)]
    doc_count: String,

    /// Letterhead image drawn at the top of every page
    #[arg(long)]
    letterhead: Option<PathBuf>,

    /// JSON configuration file (see init-config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Paper size, overrides the configuration
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// First photo number, overrides the configuration
    #[arg(long)]
    start: Option<u32>,

    /// Image used in place of files that cannot be read (default: skip them)
    #[arg(long)]
    placeholder: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => Self::A3,
            PaperArg::A4 => Self::A4,
            PaperArg::A5 => Self::A5,
            PaperArg::Letter => Self::Letter,
            PaperArg::Legal => Self::Legal,
        }
    }
}

impl ReportArgs {
    fn captions(&self) -> Result<CaptionFormat> {
        let captions = CaptionFormat::new(&self.case_id, &self.doc_code, &self.doc_count);
        captions.validate()?;
        Ok(captions)
    }

    fn policy(&self) -> DecodeFailurePolicy {
        match &self.placeholder {
            Some(path) => DecodeFailurePolicy::Substitute(path.clone()),
            None => DecodeFailurePolicy::Skip,
        }
    }

    async fn options(&self) -> Result<ReportOptions> {
        let mut options = match &self.config {
            Some(path) => ReportOptions::load(path)
                .await
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ReportOptions::default(),
        };
        if let Some(paper) = self.paper {
            options.paper_size = paper.into();
        }
        if let Some(start) = self.start {
            options.start_counter = start;
        }
        options.validate()?;
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    CliLogger::from_verbosity(cli.verbose, cli.quiet).init()?;

    match cli.command {
        Commands::Generate {
            report,
            output,
            overwrite,
        } => generate(report, output, overwrite).await?,

        Commands::Plan { report, layout } => plan(report, layout).await?,

        Commands::InitConfig { output, paper } => {
            let mut options = ReportOptions::default();
            if let Some(paper) = paper {
                options.paper_size = paper.into();
            }
            options.save(&output).await?;
            println!("Wrote default configuration → {}", output.display());
        }
    }

    Ok(())
}

async fn generate(report: ReportArgs, output: PathBuf, overwrite: bool) -> Result<()> {
    let captions = report.captions()?;
    let options = report.options().await?;
    let paths = expand_inputs(&report.inputs).await?;

    let folder = output.join(captions.folder_name());
    let mut protected = paths.clone();
    protected.extend(report.letterhead.iter().cloned());
    protected.extend(report.placeholder.iter().cloned());
    prepare_output_folder(&folder, overwrite, &protected).await?;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel();
    let worker = tokio::spawn(worker_task(command_rx, update_tx));

    let send = |cmd: ReportCommand| {
        command_tx
            .send(cmd)
            .map_err(|_| anyhow!("Report worker stopped unexpectedly"))
    };

    send(ReportCommand::ResolveImages {
        paths,
        policy: report.policy(),
    })?;
    let images = match next_update(&mut update_rx).await? {
        ReportUpdate::ImagesResolved { images, failures } => {
            for failure in &failures {
                eprintln!(
                    "Skipped {}: {}",
                    failure.path.display(),
                    failure.reason
                );
            }
            images
        }
        ReportUpdate::Error { message } => bail!(message),
        other => bail!("Unexpected update while reading images: {other:?}"),
    };

    let mut job = ReportJob::new(images, captions, &folder);
    if let Some(letterhead) = report.letterhead {
        job = job.with_letterhead(letterhead);
    }
    send(ReportCommand::Generate { job, options })?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancel_sent = false;

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c, if !cancel_sent => {
                eprintln!("Cancelling after the current page...");
                send(ReportCommand::Cancel)?;
                cancel_sent = true;
            }
            update = next_update(&mut update_rx) => match update? {
                ReportUpdate::Progress { current, total } => {
                    println!("  {current}/{total} images");
                }
                ReportUpdate::ReportComplete { path } => break Ok(path),
                ReportUpdate::ReportCancelled => break Err(anyhow!("Report generation cancelled")),
                ReportUpdate::Error { message } => break Err(anyhow!(message)),
                other => log::debug!("Ignoring update {other:?}"),
            }
        }
    };

    drop(command_tx);
    worker.await?;

    let path = result?;
    println!("Generated report → {}", path.display());
    Ok(())
}

async fn plan(report: ReportArgs, show_layout: bool) -> Result<()> {
    let captions = report.captions()?;
    let options = report.options().await?;
    let paths = expand_inputs(&report.inputs).await?;
    let policy = report.policy();

    let resolved =
        tokio::task::spawn_blocking(move || resolve_images(&paths, &FsImageSource, &policy))
            .await??;
    for failure in &resolved.failures {
        eprintln!("Skipped {}: {}", failure.path.display(), failure.reason);
    }

    let stats = calculate_statistics(&resolved.images, options.start_counter)?;
    println!("Report Statistics:");
    println!("  Images: {}", stats.images);
    println!("  Pages: {}", stats.pages);
    println!("  Paired pages: {}", stats.paired_pages);
    println!("  Single pages: {}", stats.single_pages);
    println!("  Photo numbers: {} to {}", stats.first_photo, stats.last_photo);

    let geometry = if show_layout {
        let letterhead = match &report.letterhead {
            Some(path) => Some(FsImageSource.dimensions(path)?),
            None => None,
        };
        let geometry = PageGeometry::from_options(&options, letterhead)?;
        print_geometry(&geometry);
        Some(geometry)
    } else {
        None
    };

    let mut photo = options.start_counter;
    for (index, block) in group_blocks(resolved.images).iter().enumerate() {
        let names: Vec<String> = block.items().iter().map(describe_image).collect();
        println!("Page {}: {}", index + 1, names.join(", "));

        if let Some(geometry) = &geometry {
            for item in layout_block(block, geometry, &captions, photo) {
                println!(
                    "    {:<28} image x={:.1} y={:.1} w={:.1} h={:.1}  caption y={:.1} w={:.1}",
                    item.caption_text,
                    item.image.x,
                    item.image.y,
                    item.image.width,
                    item.image.height,
                    item.caption.y,
                    item.caption.width
                );
            }
        }
        photo += block.len() as u32;
    }

    Ok(())
}

fn print_geometry(geometry: &PageGeometry) {
    println!("Page Geometry (mm):");
    println!(
        "  Page: {:.1} x {:.1}",
        geometry.page_width, geometry.page_height
    );
    println!(
        "  Letterhead: {:.1} x {:.1}",
        geometry.header_width, geometry.header_height
    );
    println!(
        "  Content: top {:.1}, {:.1} x {:.1}",
        geometry.content_top(),
        geometry.content_width(),
        geometry.content_height()
    );
    println!("  Paired image height: {:.1}", geometry.uniform_item_height());
}

fn describe_image(image: &ImageDescriptor) -> String {
    let name = image
        .source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| image.source.display().to_string());
    format!(
        "{} ({}x{} {:?})",
        name,
        image.width,
        image.height,
        image.orientation()
    )
}

async fn next_update(rx: &mut mpsc::UnboundedReceiver<ReportUpdate>) -> Result<ReportUpdate> {
    rx.recv()
        .await
        .ok_or_else(|| anyhow!("Report worker stopped unexpectedly"))
}

/// Expand directories into their supported images, sorted by file name
async fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for input in inputs {
        if !tokio::fs::metadata(input)
            .await
            .with_context(|| format!("Cannot read {}", input.display()))?
            .is_dir()
        {
            paths.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        let mut entries = tokio::fs::read_dir(input).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && photo_report::source::is_supported_image(&path) {
                found.push(path);
            }
        }
        found.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        paths.extend(found);
    }

    if paths.is_empty() {
        bail!("No supported images found (png, jpg, jpeg, bmp)");
    }
    Ok(paths)
}

/// Make sure `folder` can be written: refuse an existing folder unless
/// `overwrite`, and never clear one that holds any of `inputs`.
async fn prepare_output_folder(folder: &Path, overwrite: bool, inputs: &[PathBuf]) -> Result<()> {
    if !tokio::fs::try_exists(folder).await? {
        return Ok(());
    }
    if !overwrite {
        bail!(
            "Output folder {} already exists (use --overwrite to replace it)",
            folder.display()
        );
    }

    let canonical_folder = tokio::fs::canonicalize(folder).await?;
    for input in inputs {
        let canonical_input = tokio::fs::canonicalize(input)
            .await
            .unwrap_or_else(|_| input.clone());
        if canonical_input.starts_with(&canonical_folder) {
            bail!(
                "Input {} is inside the output folder {}; move it elsewhere before using --overwrite",
                input.display(),
                folder.display()
            );
        }
    }

    log::info!("Removing existing output folder {}", folder.display());
    tokio::fs::remove_dir_all(folder).await?;
    Ok(())
}
