//! Output sinks for rendered reports
//!
//! The renderer talks to its output only through [`DocumentSink`]: open a
//! page, place an image, place a caption, finalize. Nothing reaches disk
//! before [`DocumentSink::finalize`].

mod pdf;
mod recording;

pub use pdf::PdfSink;
pub use recording::{DrawCommand, RecordingSink};

use crate::types::{Rect, Result, TextAlign};
use std::path::Path;

/// Ordered draw commands, in millimeters with a top-left origin
pub trait DocumentSink {
    /// Start a new page; subsequent commands draw on it
    fn new_page(&mut self, width_mm: f32, height_mm: f32) -> Result<()>;

    /// Draw the image stored at `path` scaled into `rect`
    fn place_image(&mut self, path: &Path, rect: Rect) -> Result<()>;

    /// Draw one line of text inside `area`, vertically centered
    fn place_text(&mut self, text: &str, area: Rect, font_size_pt: f32, align: TextAlign)
    -> Result<()>;

    /// Write the finished document to `output_path`
    fn finalize(&mut self, output_path: &Path) -> Result<()>;

    /// Pages started so far
    fn page_count(&self) -> usize;
}
