//! Report rendering - from grouped images to a finished document
//!
//! A [`ReportRenderer`] runs a single pass over the page blocks:
//! 1. Validate the job and build the page geometry
//! 2. For every block: check for cancellation, persist normalized copies of
//!    its images, draw letterhead, images and captions on a fresh page
//! 3. Finalize the document only if every block was rendered
//!
//! Exactly one terminal [`RenderEvent`] is emitted per pass.

use crate::caption::CaptionFormat;
use crate::layout::{Block, PageGeometry, group_blocks, layout_block};
use crate::options::ReportOptions;
use crate::render::{DocumentSink, PdfSink};
use crate::source::{FsImageSource, ImageSource};
use crate::stats::photo_range;
use crate::types::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Cooperative cancellation flag shared between a renderer and its caller
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lifecycle of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Notifications emitted while rendering
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// Emitted after each page; counts images, not pages
    Progress { current: usize, total: usize },
    Completed { output: PathBuf },
    Cancelled,
    Failed { reason: String },
}

/// Everything a render pass needs to know besides page settings
#[derive(Debug, Clone, PartialEq)]
pub struct ReportJob {
    /// Images in report order
    pub images: Vec<ImageDescriptor>,
    pub captions: CaptionFormat,
    /// Branding image drawn at the top of every page
    pub letterhead: Option<PathBuf>,
    /// Folder receiving the normalized per-image JPEGs
    pub output_folder: PathBuf,
    /// Path of the finished document
    pub document_path: PathBuf,
}

impl ReportJob {
    /// Job writing into `output_folder`, with the document named after the folder
    pub fn new(
        images: Vec<ImageDescriptor>,
        captions: CaptionFormat,
        output_folder: impl Into<PathBuf>,
    ) -> Self {
        let output_folder = output_folder.into();
        let document_name = output_folder
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| captions.folder_name());
        let document_path = output_folder.join(format!("{document_name}.pdf"));

        Self {
            images,
            captions,
            letterhead: None,
            output_folder,
            document_path,
        }
    }

    pub fn with_letterhead(mut self, letterhead: impl Into<PathBuf>) -> Self {
        self.letterhead = Some(letterhead.into());
        self
    }

    pub fn with_document_path(mut self, document_path: impl Into<PathBuf>) -> Self {
        self.document_path = document_path.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.captions.validate()?;
        if self.images.is_empty() {
            return Err(ReportError::NoImages);
        }
        if let Some(image) = self.images.iter().find(|i| i.width == 0 || i.height == 0) {
            return Err(ReportError::Config(format!(
                "Image {} has no pixels",
                image.source.display()
            )));
        }
        Ok(())
    }
}

/// Mutable state of one render pass
#[derive(Debug, Clone)]
pub struct RenderSession {
    /// Number of the next photo to be captioned
    pub photo_counter: u32,
    /// Images drawn so far
    pub images_rendered: usize,
    pub cancel: CancelToken,
}

/// Sequential driver turning a [`ReportJob`] into draw commands
pub struct ReportRenderer<'a> {
    job: ReportJob,
    options: ReportOptions,
    source: &'a dyn ImageSource,
    state: RenderState,
    session: RenderSession,
}

impl<'a> ReportRenderer<'a> {
    pub fn new(job: ReportJob, options: ReportOptions, source: &'a dyn ImageSource) -> Self {
        let session = RenderSession {
            photo_counter: options.start_counter,
            images_rendered: 0,
            cancel: CancelToken::new(),
        };
        Self {
            job,
            options,
            source,
            state: RenderState::Idle,
            session,
        }
    }

    /// Use an externally owned cancellation flag
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.session.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.session.cancel.clone()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    /// Run the pass to completion, cancellation or failure.
    ///
    /// Returns the document path on completion. `notify` receives progress
    /// after every page and exactly one terminal event.
    pub fn start(
        &mut self,
        sink: &mut dyn DocumentSink,
        notify: &mut dyn FnMut(RenderEvent),
    ) -> Result<PathBuf> {
        if self.state != RenderState::Idle {
            return Err(ReportError::Config(format!(
                "Renderer cannot start from state {:?}",
                self.state
            )));
        }

        self.state = RenderState::Running;
        self.session.photo_counter = self.options.start_counter;
        self.session.images_rendered = 0;
        log::info!(
            "Rendering {} images to {}",
            self.job.images.len(),
            self.job.document_path.display()
        );

        match self.run(sink, notify) {
            Ok(output) => {
                self.state = RenderState::Completed;
                log::info!("Report complete: {}", output.display());
                notify(RenderEvent::Completed {
                    output: output.clone(),
                });
                Ok(output)
            }
            Err(ReportError::Cancelled) => {
                self.state = RenderState::Cancelled;
                log::info!(
                    "Report cancelled after {} images",
                    self.session.images_rendered
                );
                notify(RenderEvent::Cancelled);
                Err(ReportError::Cancelled)
            }
            Err(e) => {
                self.state = RenderState::Failed;
                log::error!("Report failed: {}", e);
                notify(RenderEvent::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        sink: &mut dyn DocumentSink,
        notify: &mut dyn FnMut(RenderEvent),
    ) -> Result<PathBuf> {
        self.job.validate()?;
        photo_range(self.options.start_counter, self.job.images.len())?;

        let letterhead = match &self.job.letterhead {
            Some(path) => Some((path.clone(), self.source.dimensions(path)?)),
            None => None,
        };
        let geometry =
            PageGeometry::from_options(&self.options, letterhead.as_ref().map(|(_, dims)| *dims))?;

        std::fs::create_dir_all(&self.job.output_folder)?;

        let blocks = group_blocks(self.job.images.iter().cloned());
        let total = self.job.images.len();

        for block in &blocks {
            if self.session.cancel.is_cancelled() {
                return Err(ReportError::Cancelled);
            }

            let first_photo = self.session.photo_counter;
            let normalized = self.persist_block(block, first_photo);

            sink.new_page(geometry.page_width, geometry.page_height)?;
            if let Some((path, _)) = &letterhead {
                sink.place_image(path, geometry.letterhead_rect())?;
            }

            let placed = layout_block(&normalized, &geometry, &self.job.captions, first_photo);
            for (item, image) in placed.iter().zip(normalized.items()) {
                sink.place_image(&image.source, item.image)?;
                sink.place_text(
                    &item.caption_text,
                    item.caption,
                    geometry.caption_font_size_pt,
                    TextAlign::Center,
                )?;
            }

            self.session.photo_counter += block.len() as u32;
            self.session.images_rendered += block.len();
            log::debug!(
                "Page {}: photos {}..{}",
                sink.page_count(),
                first_photo,
                self.session.photo_counter
            );
            notify(RenderEvent::Progress {
                current: self.session.images_rendered,
                total,
            });
        }

        sink.finalize(&self.job.document_path)?;
        Ok(self.job.document_path.clone())
    }

    /// Write the normalized copy of every image in `block`, falling back to
    /// the original file when that fails.
    fn persist_block(&self, block: &Block, first_photo: u32) -> Block {
        let normalized: Vec<ImageDescriptor> = block
            .items()
            .iter()
            .enumerate()
            .map(|(k, image)| {
                let dest = self
                    .job
                    .output_folder
                    .join(self.job.captions.artifact_file_name(first_photo + k as u32));
                self.persist_image(image, &dest)
            })
            .collect();

        match normalized.as_slice() {
            [first, second] => Block::pair(first.clone(), second.clone())
                .unwrap_or_else(|| block.clone()),
            [single] => Block::single(single.clone()),
            _ => block.clone(),
        }
    }

    fn persist_image(&self, image: &ImageDescriptor, dest: &Path) -> ImageDescriptor {
        match self.source.write_normalized(
            &image.source,
            dest,
            self.options.max_image_dimension,
            self.options.jpeg_quality,
        ) {
            Ok((width, height)) if width > 0 && height > 0 => {
                ImageDescriptor::new(width, height, dest)
            }
            Ok(_) => image.clone(),
            Err(e) => {
                log::warn!(
                    "Could not write {}, using original {}: {}",
                    dest.display(),
                    image.source.display(),
                    e
                );
                image.clone()
            }
        }
    }
}

/// Render `job` to a PDF on a blocking worker thread.
///
/// Progress and the terminal event are sent on `updates`; a closed receiver
/// does not stop the render.
pub async fn generate_report(
    job: ReportJob,
    options: ReportOptions,
    cancel: CancelToken,
    updates: mpsc::UnboundedSender<RenderEvent>,
) -> Result<PathBuf> {
    tokio::task::spawn_blocking(move || {
        let title = job.captions.folder_name();
        let mut sink = PdfSink::new(&title);
        let mut renderer =
            ReportRenderer::new(job, options, &FsImageSource).with_cancel_token(cancel);
        renderer.start(&mut sink, &mut |event| {
            let _ = updates.send(event);
        })
    })
    .await?
}
