//! Layout calculation for report pages
//!
//! This module handles everything between a list of images and the
//! coordinates drawn on each page:
//! - Orientation classification (horizontal vs vertical)
//! - Greedy grouping of images into page blocks
//! - Page geometry (letterhead reservation, content area)
//! - Placement of images and captions within the content area

mod geometry;
mod grouping;
mod orientation;
mod placement;

pub use geometry::*;
pub use grouping::*;
pub use orientation::*;
pub use placement::*;
