use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("No images to render")]
    NoImages,
    #[error("Rendering was cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Image orientation after EXIF normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Orientation {
    /// Landscape or square: width >= height
    Horizontal,
    /// Portrait: width < height
    Vertical,
}

/// One source photograph, already decoded far enough to know its size
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageDescriptor {
    /// Pixel width after orientation normalization
    pub width: u32,
    /// Pixel height after orientation normalization
    pub height: u32,
    /// Where the pixels come from. Never modified by the renderer.
    pub source: PathBuf,
}

impl ImageDescriptor {
    pub fn new(width: u32, height: u32, source: impl Into<PathBuf>) -> Self {
        Self {
            width,
            height,
            source: source.into(),
        }
    }

    pub fn orientation(&self) -> Orientation {
        crate::layout::classify(self.width, self.height)
    }

    pub fn is_horizontal(&self) -> bool {
        self.orientation() == Orientation::Horizontal
    }

    /// Width divided by height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// Paper sizes offered for the report
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Custom { width_mm: f32, height_mm: f32 },
}

impl PaperSize {
    /// Portrait dimensions (width, height) in millimeters
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            PaperSize::A3 => (297.0, 420.0),
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::A5 => (148.0, 210.0),
            PaperSize::Letter => (215.9, 279.4),
            PaperSize::Legal => (215.9, 355.6),
            PaperSize::Custom {
                width_mm,
                height_mm,
            } => (width_mm, height_mm),
        }
    }
}

/// Horizontal alignment of a caption within its text box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// A rectangle in millimeters, origin at the top-left corner of the page
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// Summary of how a set of images will be paginated
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStatistics {
    /// Number of images going into the report
    pub images: usize,
    /// Number of output pages (one per block)
    pub pages: usize,
    /// Pages carrying two stacked horizontal images
    pub paired_pages: usize,
    /// Pages carrying a single image
    pub single_pages: usize,
    /// Photo number printed under the first image
    pub first_photo: u32,
    /// Photo number printed under the last image
    pub last_photo: u32,
}
