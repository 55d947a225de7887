//! Image source: probing, decoding and normalizing photographs
//!
//! The renderer never decodes images itself. It asks an [`ImageSource`] for
//! orientation-corrected dimensions and for normalized JPEG copies, so tests
//! can swap in a source that never touches pixels.

use crate::constants::SUPPORTED_EXTENSIONS;
use crate::types::*;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation as ExifOrientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbImage};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Access to source photographs
pub trait ImageSource: Send + Sync {
    /// Pixel size after applying the image's orientation metadata
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// Write an orientation-corrected RGB JPEG copy of `path` to `dest`,
    /// downsampled so its long side is at most `max_dimension`.
    ///
    /// Returns the pixel size of the written copy.
    fn write_normalized(
        &self,
        path: &Path,
        dest: &Path,
        max_dimension: u32,
        quality: u8,
    ) -> Result<(u32, u32)>;
}

/// [`ImageSource`] backed by the `image` crate and the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSource;

impl ImageSource for FsImageSource {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        let mut decoder = ImageReader::open(path)?
            .with_guessed_format()?
            .into_decoder()?;
        let orientation = decoder.orientation()?;
        let (width, height) = decoder.dimensions();
        Ok(oriented_dimensions(width, height, orientation))
    }

    fn write_normalized(
        &self,
        path: &Path,
        dest: &Path,
        max_dimension: u32,
        quality: u8,
    ) -> Result<(u32, u32)> {
        let image = open_oriented(path)?;
        let image = downsample(image, max_dimension);
        let rgb = flatten_rgb(image);

        let mut writer = BufWriter::new(std::fs::File::create(dest)?);
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality))?;
        writer.flush()?;

        Ok(rgb.dimensions())
    }
}

/// Decode an image and apply its orientation metadata
pub fn open_oriented(path: &Path) -> Result<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);
    Ok(image)
}

/// Decode an image to 8-bit RGB, compositing any alpha onto white
pub fn decode_rgb(path: &Path) -> Result<RgbImage> {
    Ok(flatten_rgb(open_oriented(path)?))
}

fn flatten_rgb(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.into_rgb8();
    }

    let rgba = image.into_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let blend = |c: u8| ((c as u16 * a as u16 + 255 * (255 - a as u16)) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Target size for an image whose long side must not exceed `max_dimension`
pub fn downsampled_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let long_side = width.max(height);
    if long_side <= max_dimension {
        return (width, height);
    }
    let short = |side: u32| ((side as u64 * max_dimension as u64 / long_side as u64) as u32).max(1);
    if width >= height {
        (max_dimension, short(height))
    } else {
        (short(width), max_dimension)
    }
}

fn downsample(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = downsampled_dimensions(image.width(), image.height(), max_dimension);
    if (width, height) == (image.width(), image.height()) {
        return image;
    }
    log::debug!(
        "Downsampling {}x{} to {}x{}",
        image.width(),
        image.height(),
        width,
        height
    );
    image.resize_exact(width, height, FilterType::Lanczos3)
}

fn oriented_dimensions(width: u32, height: u32, orientation: ExifOrientation) -> (u32, u32) {
    match orientation {
        ExifOrientation::Rotate90
        | ExifOrientation::Rotate270
        | ExifOrientation::Rotate90FlipH
        | ExifOrientation::Rotate270FlipH => (height, width),
        _ => (width, height),
    }
}

/// Whether `path` has one of the accepted image extensions
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// What to do with an image that cannot be read
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DecodeFailurePolicy {
    /// Leave the image out of the report
    #[default]
    Skip,
    /// Put this placeholder image in its place
    Substitute(PathBuf),
}

/// An input that could not be read
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of probing a list of inputs
#[derive(Debug, Clone, Default)]
pub struct ResolvedImages {
    /// Readable images (or their substitutes), in input order
    pub images: Vec<ImageDescriptor>,
    /// Inputs that failed to decode
    pub failures: Vec<ImageFailure>,
}

/// Probe every input and apply `policy` to the ones that fail.
///
/// Only a broken substitute is an error; unreadable inputs are recorded in
/// [`ResolvedImages::failures`].
pub fn resolve_images(
    paths: &[PathBuf],
    source: &dyn ImageSource,
    policy: &DecodeFailurePolicy,
) -> Result<ResolvedImages> {
    let mut resolved = ResolvedImages::default();
    let mut placeholder: Option<ImageDescriptor> = None;

    for path in paths {
        let reason = match source.dimensions(path) {
            Ok((width, height)) if width > 0 && height > 0 => {
                resolved
                    .images
                    .push(ImageDescriptor::new(width, height, path.clone()));
                continue;
            }
            Ok((width, height)) => format!("image has no pixels ({width}x{height})"),
            Err(e) => e.to_string(),
        };

        match policy {
            DecodeFailurePolicy::Skip => {
                log::warn!("Skipping unreadable image {}: {}", path.display(), reason);
            }
            DecodeFailurePolicy::Substitute(substitute) => {
                log::warn!(
                    "Substituting {} for unreadable image {}: {}",
                    substitute.display(),
                    path.display(),
                    reason
                );
                if placeholder.is_none() {
                    let (width, height) = source.dimensions(substitute)?;
                    if width == 0 || height == 0 {
                        return Err(ReportError::Config(format!(
                            "Placeholder image {} has no pixels",
                            substitute.display()
                        )));
                    }
                    placeholder = Some(ImageDescriptor::new(width, height, substitute.clone()));
                }
                if let Some(descriptor) = &placeholder {
                    resolved.images.push(descriptor.clone());
                }
            }
        }

        resolved.failures.push(ImageFailure {
            path: path.clone(),
            reason,
        });
    }

    Ok(resolved)
}
