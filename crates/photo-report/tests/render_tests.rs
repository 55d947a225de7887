use photo_report::source::downsampled_dimensions;
use photo_report::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Image source with canned dimensions that never touches the disk
#[derive(Default)]
struct FakeImageSource {
    dimensions: HashMap<PathBuf, (u32, u32)>,
    fail_normalize: Vec<PathBuf>,
    written: Mutex<Vec<PathBuf>>,
}

impl FakeImageSource {
    fn with(mut self, path: &str, width: u32, height: u32) -> Self {
        self.dimensions.insert(PathBuf::from(path), (width, height));
        self
    }

    fn failing_normalize(mut self, path: &str) -> Self {
        self.fail_normalize.push(PathBuf::from(path));
        self
    }

    fn written(&self) -> Vec<PathBuf> {
        self.written.lock().unwrap().clone()
    }
}

impl ImageSource for FakeImageSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        self.dimensions.get(path).copied().ok_or_else(|| {
            ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ))
        })
    }

    fn write_normalized(
        &self,
        path: &Path,
        dest: &Path,
        max_dimension: u32,
        _quality: u8,
    ) -> Result<(u32, u32)> {
        if self.fail_normalize.iter().any(|p| p == path) {
            return Err(ReportError::Pdf("encoder exploded".to_string()));
        }
        let (width, height) = self.dimensions(path)?;
        self.written.lock().unwrap().push(dest.to_path_buf());
        Ok(downsampled_dimensions(width, height, max_dimension))
    }
}

/// Sink that fails on the n-th image placement
struct FailingSink {
    inner: RecordingSink,
    fail_at_image: usize,
    images: usize,
}

impl DocumentSink for FailingSink {
    fn new_page(&mut self, width_mm: f32, height_mm: f32) -> Result<()> {
        self.inner.new_page(width_mm, height_mm)
    }

    fn place_image(&mut self, path: &Path, rect: Rect) -> Result<()> {
        self.images += 1;
        if self.images == self.fail_at_image {
            return Err(ReportError::Pdf("disk full".to_string()));
        }
        self.inner.place_image(path, rect)
    }

    fn place_text(
        &mut self,
        text: &str,
        area: Rect,
        font_size_pt: f32,
        align: TextAlign,
    ) -> Result<()> {
        self.inner.place_text(text, area, font_size_pt, align)
    }

    fn finalize(&mut self, output_path: &Path) -> Result<()> {
        self.inner.finalize(output_path)
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }
}

fn scenario_source() -> FakeImageSource {
    FakeImageSource::default()
        .with("img1.jpg", 800, 600)
        .with("img2.jpg", 600, 800)
        .with("img3.jpg", 1000, 500)
        .with("img4.jpg", 1200, 600)
        .with("letterhead.png", 900, 300)
}

fn scenario_job(output: &Path) -> ReportJob {
    let images = vec![
        ImageDescriptor::new(800, 600, "img1.jpg"),
        ImageDescriptor::new(600, 800, "img2.jpg"),
        ImageDescriptor::new(1000, 500, "img3.jpg"),
        ImageDescriptor::new(1200, 600, "img4.jpg"),
    ];
    ReportJob::new(images, CaptionFormat::new("12345", "UB", "01"), output)
        .with_letterhead("letterhead.png")
}

fn render(
    job: ReportJob,
    options: ReportOptions,
    source: &FakeImageSource,
    sink: &mut dyn DocumentSink,
    cancel: Option<CancelToken>,
) -> (Result<PathBuf>, Vec<RenderEvent>, RenderState, u32) {
    let mut renderer = ReportRenderer::new(job, options, source);
    if let Some(cancel) = cancel {
        renderer = renderer.with_cancel_token(cancel);
    }
    let mut events = Vec::new();
    let result = renderer.start(sink, &mut |event| events.push(event));
    (
        result,
        events,
        renderer.state(),
        renderer.session().photo_counter,
    )
}

#[test]
fn test_end_to_end_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("12345-UB-01");
    let source = scenario_source();
    let mut sink = RecordingSink::new();

    let (result, events, state, counter) = render(
        scenario_job(&output),
        ReportOptions::default(),
        &source,
        &mut sink,
        None,
    );

    let document = output.join("12345-UB-01.pdf");
    assert_eq!(result.unwrap(), document);
    assert_eq!(state, RenderState::Completed);
    assert_eq!(counter, 5);
    assert_eq!(sink.page_count(), 3);
    assert_eq!(
        sink.captions(),
        vec![
            "12345-UB-01 Foto Nr. 1",
            "12345-UB-01 Foto Nr. 2",
            "12345-UB-01 Foto Nr. 3",
            "12345-UB-01 Foto Nr. 4",
        ]
    );
    assert_eq!(sink.finalized_path(), Some(document.as_path()));

    assert_eq!(
        events,
        vec![
            RenderEvent::Progress {
                current: 1,
                total: 4
            },
            RenderEvent::Progress {
                current: 2,
                total: 4
            },
            RenderEvent::Progress {
                current: 4,
                total: 4
            },
            RenderEvent::Completed { output: document },
        ]
    );
}

#[test]
fn test_pages_carry_letterhead_then_images() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let source = scenario_source();
    let mut sink = RecordingSink::new();

    render(
        scenario_job(&output),
        ReportOptions::default(),
        &source,
        &mut sink,
        None,
    )
    .0
    .unwrap();

    let pages = sink.pages();
    assert_eq!(pages.len(), 3);
    let images_per_page: Vec<usize> = pages
        .iter()
        .map(|page| {
            page.iter()
                .filter(|cmd| matches!(cmd, DrawCommand::Image { .. }))
                .count()
        })
        .collect();
    assert_eq!(images_per_page, vec![2, 2, 3]);

    for page in &pages {
        match &page[0] {
            DrawCommand::Image { path, rect } => {
                assert_eq!(path, Path::new("letterhead.png"));
                assert!((rect.width - 70.0).abs() < 1e-3);
                assert!((rect.x - 70.0).abs() < 1e-3);
                assert_eq!(rect.y, 10.0);
            }
            other => panic!("expected letterhead first, got {other:?}"),
        }
    }
}

#[test]
fn test_images_drawn_from_persisted_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("12345-UB-01");
    let source = scenario_source();
    let mut sink = RecordingSink::new();

    render(
        scenario_job(&output),
        ReportOptions::default(),
        &source,
        &mut sink,
        None,
    )
    .0
    .unwrap();

    let expected: Vec<PathBuf> = (1..=4)
        .map(|n| output.join(format!("12345-UB-01 Foto Nr. {n}.jpg")))
        .collect();
    assert_eq!(source.written(), expected);

    let drawn: Vec<PathBuf> = sink
        .images()
        .into_iter()
        .map(|(path, _)| path.to_path_buf())
        .filter(|path| path != Path::new("letterhead.png"))
        .collect();
    assert_eq!(drawn, expected);
}

#[test]
fn test_artifacts_without_document_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out");
    let source = scenario_source();
    let mut sink = RecordingSink::new();

    let mut job = scenario_job(&output);
    job.captions = CaptionFormat::new("12345", "", "01");
    render(job, ReportOptions::default(), &source, &mut sink, None)
        .0
        .unwrap();

    assert_eq!(sink.captions()[0], "12345-01 Foto Nr. 1");
    assert_eq!(source.written()[3], output.join("12345-01 Foto Nr. 4.jpg"));
}

#[test]
fn test_start_counter_offset() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let options = ReportOptions {
        start_counter: 17,
        ..Default::default()
    };

    let (result, _, _, counter) = render(
        scenario_job(&dir.path().join("out")),
        options,
        &source,
        &mut sink,
        None,
    );

    assert!(result.is_ok());
    assert_eq!(counter, 21);
    assert_eq!(sink.captions().last(), Some(&"12345-UB-01 Foto Nr. 20"));
}

#[test]
fn test_cancel_before_first_block() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let cancel = CancelToken::new();
    cancel.cancel();

    let (result, events, state, counter) = render(
        scenario_job(&dir.path().join("out")),
        ReportOptions::default(),
        &source,
        &mut sink,
        Some(cancel),
    );

    assert!(matches!(result, Err(ReportError::Cancelled)));
    assert_eq!(state, RenderState::Cancelled);
    assert_eq!(events, vec![RenderEvent::Cancelled]);
    assert_eq!(sink.page_count(), 0);
    assert!(sink.finalized_path().is_none());
    assert!(source.written().is_empty());
    assert_eq!(counter, 1);
}

#[test]
fn test_cancel_between_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let cancel = CancelToken::new();

    let mut renderer = ReportRenderer::new(
        scenario_job(&dir.path().join("out")),
        ReportOptions::default(),
        &source,
    )
    .with_cancel_token(cancel.clone());

    let mut events = Vec::new();
    let result = renderer.start(&mut sink, &mut |event| {
        if let RenderEvent::Progress { current: 2, .. } = event {
            cancel.cancel();
        }
        events.push(event);
    });

    assert!(matches!(result, Err(ReportError::Cancelled)));
    assert_eq!(renderer.state(), RenderState::Cancelled);
    assert_eq!(sink.page_count(), 2);
    assert!(sink.finalized_path().is_none());
    assert_eq!(events.last(), Some(&RenderEvent::Cancelled));
    assert_eq!(renderer.session().photo_counter, 3);
}

#[test]
fn test_sink_error_fails_without_finalize() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = FailingSink {
        inner: RecordingSink::new(),
        fail_at_image: 4,
        images: 0,
    };

    let (result, events, state, _) = render(
        scenario_job(&dir.path().join("out")),
        ReportOptions::default(),
        &source,
        &mut sink,
        None,
    );

    assert!(matches!(result, Err(ReportError::Pdf(_))));
    assert_eq!(state, RenderState::Failed);
    assert!(sink.inner.finalized_path().is_none());

    let failures: Vec<&RenderEvent> = events
        .iter()
        .filter(|e| matches!(e, RenderEvent::Failed { .. }))
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        events.last(),
        Some(&RenderEvent::Failed {
            reason: "PDF error: disk full".to_string()
        })
    );
}

#[test]
fn test_unreadable_letterhead_fails_before_any_page() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let job = scenario_job(&dir.path().join("out")).with_letterhead("missing.png");

    let (result, events, state, _) =
        render(job, ReportOptions::default(), &source, &mut sink, None);

    assert!(matches!(result, Err(ReportError::Io(_))));
    assert_eq!(state, RenderState::Failed);
    assert_eq!(sink.page_count(), 0);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], RenderEvent::Failed { .. }));
}

#[test]
fn test_start_counter_overflow_rejected_before_any_page() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let options = ReportOptions {
        start_counter: u32::MAX,
        ..Default::default()
    };
    assert!(options.validate().is_ok());

    let (result, events, state, _) = render(
        scenario_job(&dir.path().join("out")),
        options,
        &source,
        &mut sink,
        None,
    );

    assert!(matches!(result, Err(ReportError::Config(_))));
    assert_eq!(state, RenderState::Failed);
    assert_eq!(sink.page_count(), 0);
    assert!(source.written().is_empty());
    assert!(matches!(events.as_slice(), [RenderEvent::Failed { .. }]));
}

#[test]
fn test_start_counter_near_limit() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let options = ReportOptions {
        start_counter: u32::MAX - 4,
        ..Default::default()
    };

    let (result, _, _, counter) = render(
        scenario_job(&dir.path().join("out")),
        options,
        &source,
        &mut sink,
        None,
    );

    assert!(result.is_ok());
    assert_eq!(counter, u32::MAX);
    assert_eq!(
        sink.captions().last().copied(),
        Some(format!("12345-UB-01 Foto Nr. {}", u32::MAX - 1).as_str())
    );
}

#[test]
fn test_invalid_geometry_rejected_before_any_page() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let options = ReportOptions {
        item_spacing_mm: 400.0,
        ..Default::default()
    };

    let (result, events, state, _) = render(
        scenario_job(&dir.path().join("out")),
        options,
        &source,
        &mut sink,
        None,
    );

    assert!(matches!(result, Err(ReportError::Config(_))));
    assert_eq!(state, RenderState::Failed);
    assert_eq!(sink.page_count(), 0);
    assert!(source.written().is_empty());
    assert!(matches!(events.as_slice(), [RenderEvent::Failed { .. }]));
}

#[test]
fn test_empty_job_fails() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let job = ReportJob::new(
        Vec::new(),
        CaptionFormat::new("12345", "UB", "01"),
        dir.path().join("out"),
    );

    let (result, _, state, _) = render(job, ReportOptions::default(), &source, &mut sink, None);
    assert!(matches!(result, Err(ReportError::NoImages)));
    assert_eq!(state, RenderState::Failed);
}

#[test]
fn test_normalize_failure_passes_original_through() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source().failing_normalize("img2.jpg");
    let mut sink = RecordingSink::new();

    let (result, _, state, _) = render(
        scenario_job(&dir.path().join("out")),
        ReportOptions::default(),
        &source,
        &mut sink,
        None,
    );

    assert!(result.is_ok());
    assert_eq!(state, RenderState::Completed);
    assert_eq!(source.written().len(), 3);
    assert!(
        sink.images()
            .iter()
            .any(|(path, _)| *path == Path::new("img2.jpg"))
    );
}

#[test]
fn test_renderer_runs_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = scenario_source();
    let mut sink = RecordingSink::new();
    let mut renderer = ReportRenderer::new(
        scenario_job(&dir.path().join("out")),
        ReportOptions::default(),
        &source,
    );

    assert_eq!(renderer.state(), RenderState::Idle);
    renderer.start(&mut sink, &mut |_| {}).unwrap();
    assert!(matches!(
        renderer.start(&mut sink, &mut |_| {}),
        Err(ReportError::Config(_))
    ));
    assert_eq!(renderer.state(), RenderState::Completed);
}

#[test]
fn test_oversized_images_laid_out_at_reduced_size() {
    let dir = tempfile::tempdir().unwrap();
    let source = FakeImageSource::default().with("big.jpg", 4000, 3000);
    let mut sink = RecordingSink::new();
    let job = ReportJob::new(
        vec![ImageDescriptor::new(4000, 3000, "big.jpg")],
        CaptionFormat::new("1", "GA", "2"),
        dir.path().join("out"),
    );

    render(job, ReportOptions::default(), &source, &mut sink, None)
        .0
        .unwrap();

    // Aspect ratio survives the downsample; no letterhead so only one image
    let images = sink.images();
    assert_eq!(images.len(), 1);
    let (_, rect) = images[0];
    assert!((rect.width / rect.height - 4.0 / 3.0).abs() < 1e-3);
}

#[test]
fn test_resolve_images_skip_policy() {
    let source = scenario_source();
    let paths: Vec<PathBuf> = ["img1.jpg", "broken.jpg", "img2.jpg"]
        .iter()
        .map(PathBuf::from)
        .collect();

    let resolved = resolve_images(&paths, &source, &DecodeFailurePolicy::Skip).unwrap();
    assert_eq!(resolved.images.len(), 2);
    assert_eq!(resolved.images[1].source, PathBuf::from("img2.jpg"));
    assert_eq!(resolved.images[1].orientation(), Orientation::Vertical);
    assert_eq!(resolved.failures.len(), 1);
    assert_eq!(resolved.failures[0].path, PathBuf::from("broken.jpg"));
}

#[test]
fn test_resolve_images_substitute_policy() {
    let source = scenario_source().with("placeholder.png", 400, 300);
    let paths: Vec<PathBuf> = ["broken.jpg", "img1.jpg", "also-broken.jpg"]
        .iter()
        .map(PathBuf::from)
        .collect();
    let policy = DecodeFailurePolicy::Substitute(PathBuf::from("placeholder.png"));

    let resolved = resolve_images(&paths, &source, &policy).unwrap();
    let sources: Vec<&Path> = resolved.images.iter().map(|i| i.source.as_path()).collect();
    assert_eq!(
        sources,
        vec![
            Path::new("placeholder.png"),
            Path::new("img1.jpg"),
            Path::new("placeholder.png"),
        ]
    );
    assert_eq!(resolved.failures.len(), 2);
}

#[test]
fn test_resolve_images_broken_placeholder() {
    let source = scenario_source();
    let paths = vec![PathBuf::from("broken.jpg")];
    let policy = DecodeFailurePolicy::Substitute(PathBuf::from("nope.png"));
    assert!(resolve_images(&paths, &source, &policy).is_err());
}
