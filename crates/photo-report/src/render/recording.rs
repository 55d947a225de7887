use crate::types::{Rect, ReportError, Result, TextAlign};
use std::path::{Path, PathBuf};

use super::DocumentSink;

/// A draw command as received by a [`RecordingSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    NewPage {
        width_mm: f32,
        height_mm: f32,
    },
    Image {
        path: PathBuf,
        rect: Rect,
    },
    Text {
        text: String,
        area: Rect,
        font_size_pt: f32,
        align: TextAlign,
    },
    Finalize {
        path: PathBuf,
    },
}

/// [`DocumentSink`] that only records what it is asked to draw.
///
/// Used for dry runs (printing the computed layout) and in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caption texts in draw order
    pub fn captions(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Image placements in draw order, letterheads included
    pub fn images(&self) -> Vec<(&Path, Rect)> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Image { path, rect } => Some((path.as_path(), *rect)),
                _ => None,
            })
            .collect()
    }

    /// Commands grouped per page, without the `NewPage` markers
    pub fn pages(&self) -> Vec<&[DrawCommand]> {
        let starts: Vec<usize> = self
            .commands
            .iter()
            .enumerate()
            .filter(|(_, cmd)| matches!(cmd, DrawCommand::NewPage { .. }))
            .map(|(i, _)| i)
            .collect();

        starts
            .iter()
            .enumerate()
            .map(|(n, &start)| {
                let end = starts.get(n + 1).copied().unwrap_or_else(|| {
                    self.commands
                        .iter()
                        .position(|cmd| matches!(cmd, DrawCommand::Finalize { .. }))
                        .unwrap_or(self.commands.len())
                });
                &self.commands[start + 1..end]
            })
            .collect()
    }

    /// Where the document was finalized, if it was
    pub fn finalized_path(&self) -> Option<&Path> {
        self.commands.iter().find_map(|cmd| match cmd {
            DrawCommand::Finalize { path } => Some(path.as_path()),
            _ => None,
        })
    }
}

impl DocumentSink for RecordingSink {
    fn new_page(&mut self, width_mm: f32, height_mm: f32) -> Result<()> {
        self.commands.push(DrawCommand::NewPage {
            width_mm,
            height_mm,
        });
        Ok(())
    }

    fn place_image(&mut self, path: &Path, rect: Rect) -> Result<()> {
        self.commands.push(DrawCommand::Image {
            path: path.to_path_buf(),
            rect,
        });
        Ok(())
    }

    fn place_text(
        &mut self,
        text: &str,
        area: Rect,
        font_size_pt: f32,
        align: TextAlign,
    ) -> Result<()> {
        self.commands.push(DrawCommand::Text {
            text: text.to_string(),
            area,
            font_size_pt,
            align,
        });
        Ok(())
    }

    fn finalize(&mut self, output_path: &Path) -> Result<()> {
        if self.finalized_path().is_some() {
            return Err(ReportError::Pdf("Document already finalized".to_string()));
        }
        self.commands.push(DrawCommand::Finalize {
            path: output_path.to_path_buf(),
        });
        Ok(())
    }

    fn page_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, DrawCommand::NewPage { .. }))
            .count()
    }
}
