//! Greedy page grouping
//!
//! Images are packed left to right: a vertical image always gets a page of
//! its own, a horizontal image shares its page with the next image if that
//! one is horizontal too. There is no lookback, so the page count for a given
//! input order is always the same.

use crate::types::{ImageDescriptor, Orientation};

/// One page worth of images: a single image, or two horizontal images
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    items: Vec<ImageDescriptor>,
}

impl Block {
    pub fn single(image: ImageDescriptor) -> Self {
        Self { items: vec![image] }
    }

    /// Pair two images on one page. Returns `None` unless both are horizontal.
    pub fn pair(first: ImageDescriptor, second: ImageDescriptor) -> Option<Self> {
        if first.is_horizontal() && second.is_horizontal() {
            Some(Self {
                items: vec![first, second],
            })
        } else {
            None
        }
    }

    pub fn items(&self) -> &[ImageDescriptor] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_pair(&self) -> bool {
        self.items.len() == 2
    }
}

/// Group an ordered image sequence into page blocks.
pub fn group_blocks<I>(images: I) -> Vec<Block>
where
    I: IntoIterator<Item = ImageDescriptor>,
{
    let mut images = images.into_iter().peekable();
    let mut blocks = Vec::new();

    while let Some(image) = images.next() {
        if image.orientation() == Orientation::Vertical {
            blocks.push(Block::single(image));
            continue;
        }

        match images.next_if(ImageDescriptor::is_horizontal) {
            Some(next) => blocks.push(Block {
                items: vec![image, next],
            }),
            None => blocks.push(Block::single(image)),
        }
    }

    blocks
}
