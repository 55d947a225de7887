//! Page geometry for one render pass
//!
//! All values are millimeters with the origin at the top-left page corner.
//! The letterhead is centered at the top margin; everything below it (plus
//! the header spacing) down to the bottom margin is the content area.

use crate::options::ReportOptions;
use crate::types::*;

/// Immutable page configuration shared by every page of a report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    /// Margin above the letterhead and below the content area
    pub margin_top_bottom: f32,
    /// Left/right margin bounding the content width
    pub margin_side: f32,
    /// Letterhead width on the page (0 when there is no letterhead)
    pub header_width: f32,
    /// Letterhead height on the page (0 when there is no letterhead)
    pub header_height: f32,
    pub header_spacing: f32,
    pub caption_line_height: f32,
    pub caption_font_size_pt: f32,
    pub inter_item_spacing: f32,
    pub image_text_gap: f32,
}

impl PageGeometry {
    /// Build the geometry from options and the letterhead's pixel size.
    ///
    /// The letterhead is drawn at `page_width * letterhead_width_ratio` wide,
    /// its height follows from its aspect ratio.
    pub fn from_options(options: &ReportOptions, letterhead: Option<(u32, u32)>) -> Result<Self> {
        options.validate()?;

        let (page_width, page_height) = options.paper_size.dimensions_mm();
        let (header_width, header_height) = match letterhead {
            Some((w, h)) if w > 0 && h > 0 => {
                let width = page_width * options.letterhead_width_ratio;
                (width, width * h as f32 / w as f32)
            }
            Some((w, h)) => {
                return Err(ReportError::Config(format!(
                    "Letterhead has invalid dimensions {w}x{h}"
                )));
            }
            None => (0.0, 0.0),
        };

        let geometry = Self {
            page_width,
            page_height,
            margin_top_bottom: options.margin_top_bottom_mm,
            margin_side: options.margin_side_mm,
            header_width,
            header_height,
            header_spacing: options.header_spacing_mm,
            caption_line_height: options.caption_line_height_mm,
            caption_font_size_pt: options.caption_font_size_pt,
            inter_item_spacing: options.item_spacing_mm,
            image_text_gap: options.image_text_gap_mm,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Reject configurations that leave no room for content.
    pub fn validate(&self) -> Result<()> {
        let derived = [
            ("Content top", self.content_top()),
            ("Content height", self.content_height()),
            ("Content width", self.content_width()),
            ("Uniform item height", self.uniform_item_height()),
        ];
        for (name, value) in derived {
            if !(value.is_finite() && value > 0.0) {
                return Err(ReportError::Config(format!(
                    "{name} must be positive, got {value:.2} mm"
                )));
            }
        }
        Ok(())
    }

    /// Top edge of the content area
    pub fn content_top(&self) -> f32 {
        self.margin_top_bottom + self.header_height + self.header_spacing
    }

    /// Height between the content top and the bottom margin
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top_bottom - self.content_top()
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin_side
    }

    /// Caption box plus the gap above it
    pub fn caption_allowance(&self) -> f32 {
        self.image_text_gap + self.caption_line_height
    }

    /// Image height shared by both items of a two-image page
    pub fn uniform_item_height(&self) -> f32 {
        (self.content_height() - self.inter_item_spacing) / 2.0 - self.caption_allowance()
    }

    /// Where the letterhead goes: horizontally centered at the top margin
    pub fn letterhead_rect(&self) -> Rect {
        Rect::new(
            (self.page_width - self.header_width) / 2.0,
            self.margin_top_bottom,
            self.header_width,
            self.header_height,
        )
    }

    /// X coordinate that centers something `width` wide on the page
    pub fn centered_x(&self, width: f32) -> f32 {
        (self.page_width - width) / 2.0
    }
}
