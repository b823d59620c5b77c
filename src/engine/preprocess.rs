//! Image preprocessing for the fresh/rotten classifier
//!
//! Turns an uploaded image file into the `(1, H, W, 3)` RGB tensor the
//! network was trained on, with pixel values scaled to [0, 1].

use std::io::Cursor;
use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageReader};
use ndarray::Array4;
use thiserror::Error;

use crate::config::PreprocessConfig;

/// Failure to turn a file into an input tensor
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The file could not be read
    #[error("failed to read image file: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents are not a supported image
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
}

/// Load an image file and convert it into the classifier input tensor
pub fn load_tensor(path: &Path, config: &PreprocessConfig) -> Result<Array4<f32>, PreprocessError> {
    let data = std::fs::read(path)?;
    let image = decode_image(&data, config.apply_exif_orientation)?;
    Ok(image_to_nhwc(&image, config.width, config.height))
}

/// Decode image bytes, sniffing the format from the contents.
///
/// The bytes are already in memory, so every error from the decoder is a
/// decode error, including truncated streams.
pub fn decode_image(data: &[u8], apply_exif: bool) -> Result<DynamicImage, PreprocessError> {
    let image = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()
        .map_err(PreprocessError::Decode)?;

    if apply_exif {
        Ok(apply_orientation(image, read_exif_orientation(data)))
    } else {
        Ok(image)
    }
}

/// Convert image to NHWC tensor format
/// Resizes with nearest-neighbour sampling and scales RGB to [0, 1]
pub fn image_to_nhwc(image: &DynamicImage, width: u32, height: u32) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let resized = image::imageops::resize(&rgb, width, height, FilterType::Nearest);

    let mut tensor = Array4::<f32>::zeros((1, height as usize, width as usize, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = pixel[0] as f32 / 255.0;
        tensor[[0, y, x, 1]] = pixel[1] as f32 / 255.0;
        tensor[[0, y, x, 2]] = pixel[2] as f32 / 255.0;
    }

    tensor
}

/// Read the EXIF orientation tag, 1 (normal) when absent
fn read_exif_orientation(data: &[u8]) -> u32 {
    match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif_data) => exif_data
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .unwrap_or(1),
        Err(_) => 1,
    }
}

/// Rotate/flip pixels according to an EXIF orientation value
/// See: https://exiftool.org/TagNames/EXIF.html (Orientation)
fn apply_orientation(image: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}
