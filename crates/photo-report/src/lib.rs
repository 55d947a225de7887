pub mod caption;
pub mod constants;
pub mod layout;
mod options;
pub mod render;
mod report;
pub mod source;
mod stats;
mod types;

pub use caption::CaptionFormat;
pub use layout::{Block, PageGeometry, PlacedItem, classify, group_blocks, layout_block};
pub use options::*;
pub use render::{DocumentSink, DrawCommand, PdfSink, RecordingSink};
pub use report::*;
pub use source::{
    DecodeFailurePolicy, FsImageSource, ImageFailure, ImageSource, ResolvedImages, resolve_images,
};
pub use stats::{calculate_statistics, photo_range};
pub use types::*;
