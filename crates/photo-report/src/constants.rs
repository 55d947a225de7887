//! Shared constants for report rendering
//!
//! This module centralizes the reference page configuration and the
//! font metrics used to measure captions.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Convert points to millimeters
#[inline]
pub fn pt_to_mm(pt: f32) -> f32 {
    pt / POINTS_PER_MM
}

// =============================================================================
// Reference Page Layout (millimeters)
// =============================================================================

/// Space above the letterhead and below the content area
pub const DEFAULT_MARGIN_TOP_BOTTOM_MM: f32 = 10.0;

/// Left and right margin bounding the content width
pub const DEFAULT_MARGIN_SIDE_MM: f32 = 10.0;

/// Gap between the letterhead and the content area
pub const DEFAULT_HEADER_SPACING_MM: f32 = 10.0;

/// Gap between an image and its caption
pub const DEFAULT_IMAGE_TEXT_GAP_MM: f32 = 3.0;

/// Gap between two stacked image+caption blocks
pub const DEFAULT_ITEM_SPACING_MM: f32 = 8.0;

/// Height of the caption text box
pub const DEFAULT_CAPTION_LINE_HEIGHT_MM: f32 = 10.0;

/// Caption font size (points)
pub const DEFAULT_CAPTION_FONT_SIZE_PT: f32 = 11.0;

/// Letterhead width as a fraction of the page width
pub const DEFAULT_LETTERHEAD_WIDTH_RATIO: f32 = 1.0 / 3.0;

// =============================================================================
// Image Normalization
// =============================================================================

/// Longest side, in pixels, an image may keep before it is downsampled
pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 2000;

/// JPEG quality used for persisted per-image artifacts
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Extensions accepted as report input (lowercase)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

// =============================================================================
// Caption Metrics
// =============================================================================

/// fpdf-compatible baseline offset: text sits at `box_center + 0.3 * font_size`
pub const CAPTION_BASELINE_FACTOR: f32 = 0.3;

/// Fallback advance for glyphs missing from the table (1/1000 em)
const HELVETICA_BOLD_DEFAULT_ADVANCE: u16 = 556;

/// Advance width of a Helvetica-Bold glyph in 1/1000 em (Adobe core font metrics)
fn helvetica_bold_advance(ch: char) -> u16 {
    match ch {
        ' ' | '.' | ',' | '/' | 'I' | 'i' | 'j' | 'l' => 278,
        '-' | '(' | ')' | ':' | ';' | 'f' | 't' => 333,
        '0'..='9' => 556,
        'A' | 'B' | 'C' | 'D' | 'H' | 'K' | 'N' | 'R' | 'U' => 722,
        'E' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        'F' | 'L' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'J' => 556,
        'M' => 833,
        'W' => 944,
        'a' | 'c' | 'e' | 'k' | 's' | 'v' | 'x' | 'y' => 556,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 611,
        'm' => 889,
        'r' => 389,
        'w' => 778,
        'z' => 500,
        _ => HELVETICA_BOLD_DEFAULT_ADVANCE,
    }
}

/// Rendered width of `text` in Helvetica-Bold at `font_size_pt`, in millimeters
pub fn caption_width_mm(text: &str, font_size_pt: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| helvetica_bold_advance(ch) as u32).sum();
    pt_to_mm(units as f32 / 1000.0 * font_size_pt)
}
