use crate::layout::group_blocks;
use crate::types::*;

/// Calculate how `images` will be paginated, numbering from `start_counter`
pub fn calculate_statistics(
    images: &[ImageDescriptor],
    start_counter: u32,
) -> Result<ReportStatistics> {
    if images.is_empty() {
        return Err(ReportError::NoImages);
    }

    let (first_photo, last_photo) = photo_range(start_counter, images.len())?;

    let blocks = group_blocks(images.iter().cloned());
    let paired_pages = blocks.iter().filter(|block| block.is_pair()).count();

    Ok(ReportStatistics {
        images: images.len(),
        pages: blocks.len(),
        paired_pages,
        single_pages: blocks.len() - paired_pages,
        first_photo,
        last_photo,
    })
}

/// First and last photo number of `image_count` images numbered from
/// `start_counter`. The counter after the last photo must fit in a `u32`.
pub fn photo_range(start_counter: u32, image_count: usize) -> Result<(u32, u32)> {
    let next = u32::try_from(image_count)
        .ok()
        .and_then(|count| start_counter.checked_add(count))
        .ok_or_else(|| {
            ReportError::Config(format!(
                "Photo numbering from {start_counter} overflows with {image_count} images"
            ))
        })?;
    Ok((start_counter, next.saturating_sub(1).max(start_counter)))
}
