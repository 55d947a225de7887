use crate::constants::*;
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Page and image settings for a report render pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReportOptions {
    // Page
    pub paper_size: PaperSize,
    pub margin_top_bottom_mm: f32,
    pub margin_side_mm: f32,

    // Letterhead
    pub letterhead_width_ratio: f32,
    pub header_spacing_mm: f32,

    // Captions and stacking
    pub image_text_gap_mm: f32,
    pub item_spacing_mm: f32,
    pub caption_line_height_mm: f32,
    pub caption_font_size_pt: f32,

    // Per-image artifacts
    pub max_image_dimension: u32,
    pub jpeg_quality: u8,

    // Numbering
    pub start_counter: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margin_top_bottom_mm: DEFAULT_MARGIN_TOP_BOTTOM_MM,
            margin_side_mm: DEFAULT_MARGIN_SIDE_MM,
            letterhead_width_ratio: DEFAULT_LETTERHEAD_WIDTH_RATIO,
            header_spacing_mm: DEFAULT_HEADER_SPACING_MM,
            image_text_gap_mm: DEFAULT_IMAGE_TEXT_GAP_MM,
            item_spacing_mm: DEFAULT_ITEM_SPACING_MM,
            caption_line_height_mm: DEFAULT_CAPTION_LINE_HEIGHT_MM,
            caption_font_size_pt: DEFAULT_CAPTION_FONT_SIZE_PT,
            max_image_dimension: DEFAULT_MAX_IMAGE_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            start_counter: 1,
        }
    }
}

impl ReportOptions {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let options: Self = serde_json::from_slice(&bytes)
            .map_err(|e| ReportError::Config(format!("Failed to parse config: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ReportError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    ///
    /// Only checks individual values; whether they leave room for content on
    /// the page is decided by [`crate::PageGeometry`].
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.paper_size.dimensions_mm();
        if !(width > 0.0 && height > 0.0) {
            return Err(ReportError::Config(format!(
                "Paper size must be positive, got {width}x{height} mm"
            )));
        }

        let lengths = [
            ("Top/bottom margin", self.margin_top_bottom_mm),
            ("Side margin", self.margin_side_mm),
            ("Header spacing", self.header_spacing_mm),
            ("Image/text gap", self.image_text_gap_mm),
            ("Item spacing", self.item_spacing_mm),
            ("Caption line height", self.caption_line_height_mm),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(ReportError::Config(format!(
                    "{name} must be a non-negative length, got {value}"
                )));
            }
        }

        if !(self.caption_font_size_pt > 0.0) {
            return Err(ReportError::Config(
                "Caption font size must be positive".to_string(),
            ));
        }

        if !(self.letterhead_width_ratio > 0.0 && self.letterhead_width_ratio <= 1.0) {
            return Err(ReportError::Config(format!(
                "Letterhead width ratio must be in (0, 1], got {}",
                self.letterhead_width_ratio
            )));
        }

        if self.max_image_dimension == 0 {
            return Err(ReportError::Config(
                "Maximum image dimension must be at least 1 pixel".to_string(),
            ));
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ReportError::Config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.start_counter == 0 {
            return Err(ReportError::Config(
                "Photo numbering starts at 1 or later".to_string(),
            ));
        }

        Ok(())
    }
}
