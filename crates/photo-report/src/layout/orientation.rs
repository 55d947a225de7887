use crate::types::Orientation;

/// Classify an image by its (already orientation-normalized) pixel size.
///
/// Square images count as horizontal so they can be paired.
pub fn classify(width: u32, height: u32) -> Orientation {
    if width >= height {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(800, 600), Orientation::Horizontal);
        assert_eq!(classify(600, 800), Orientation::Vertical);
        assert_eq!(classify(1000, 1000), Orientation::Horizontal);
        assert_eq!(classify(1, 2), Orientation::Vertical);
    }
}
