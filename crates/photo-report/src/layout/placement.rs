//! Image and caption placement within the content area
//!
//! This module handles calculating the final position of every image on a
//! page, accounting for:
//! - Aspect-preserving scaling (full content width for a single image,
//!   uniform height for a pair)
//! - Vertical centering of the whole stack in the content area
//! - Horizontal centering of each image and each caption on its own

use crate::caption::CaptionFormat;
use crate::constants::caption_width_mm;
use crate::types::{ImageDescriptor, Rect};

use super::{Block, PageGeometry};

/// Final position of one image and its caption on the page
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedItem {
    /// Photo number printed in the caption
    pub photo_number: u32,
    /// Scaled image bounds
    pub image: Rect,
    pub caption_text: String,
    /// Caption text box: measured text width, one caption line high
    pub caption: Rect,
}

/// Compute the display size of every image in a block.
///
/// A single image spans the content width; a pair shares the uniform item
/// height. Neither may grow wider than the content area, and a single image
/// additionally shrinks to fit the content height. A pair item clamped to the
/// content width ends up shorter than its partner.
pub fn display_sizes(block: &Block, geometry: &PageGeometry) -> Vec<(f32, f32)> {
    let content_width = geometry.content_width();

    if block.is_pair() {
        let height = geometry.uniform_item_height();
        block
            .items()
            .iter()
            .map(|image| {
                let (w, h) = scale_to_height(image, height);
                if w > content_width {
                    scale_to_width(image, content_width)
                } else {
                    (w, h)
                }
            })
            .collect()
    } else {
        let max_height = geometry.content_height() - geometry.caption_allowance();
        block
            .items()
            .iter()
            .map(|image| {
                let (w, h) = scale_to_width(image, content_width);
                if h > max_height {
                    scale_to_height(image, max_height)
                } else {
                    (w, h)
                }
            })
            .collect()
    }
}

/// Lay out one block: images stacked top to bottom, each followed by its
/// caption, the whole stack centered vertically in the content area.
///
/// The two images of a pair normally share [`PageGeometry::uniform_item_height`].
/// A panorama too wide for that height is scaled to the content width
/// instead, so the pair's heights differ and the stack is centered using the
/// actual heights.
///
/// `first_photo` is the photo number of the block's first image.
pub fn layout_block(
    block: &Block,
    geometry: &PageGeometry,
    captions: &CaptionFormat,
    first_photo: u32,
) -> Vec<PlacedItem> {
    let sizes = display_sizes(block, geometry);

    let stack_height: f32 = sizes
        .iter()
        .map(|(_, h)| h + geometry.caption_allowance())
        .sum::<f32>()
        + geometry.inter_item_spacing * sizes.len().saturating_sub(1) as f32;

    let mut y = block_top(geometry, stack_height);
    let mut placed = Vec::with_capacity(sizes.len());

    for (k, (width, height)) in sizes.into_iter().enumerate() {
        let photo_number = first_photo + k as u32;
        let caption_text = captions.caption(photo_number);
        let caption_width = caption_width_mm(&caption_text, geometry.caption_font_size_pt);

        let image = Rect::new(geometry.centered_x(width), y, width, height);
        let caption = Rect::new(
            geometry.centered_x(caption_width),
            image.bottom() + geometry.image_text_gap,
            caption_width,
            geometry.caption_line_height,
        );

        y = caption.bottom() + geometry.inter_item_spacing;
        placed.push(PlacedItem {
            photo_number,
            image,
            caption_text,
            caption,
        });
    }

    placed
}

/// Top edge of a stack `stack_height` tall, centered in the content area
pub fn block_top(geometry: &PageGeometry, stack_height: f32) -> f32 {
    geometry.content_top() + (geometry.content_height() - stack_height) / 2.0
}

fn scale_to_width(image: &ImageDescriptor, width: f32) -> (f32, f32) {
    (width, image.height as f32 * (width / image.width as f32))
}

fn scale_to_height(image: &ImageDescriptor, height: f32) -> (f32, f32) {
    (image.width as f32 * (height / image.height as f32), height)
}

// =============================================================================
// Tests
// =============================================================================
