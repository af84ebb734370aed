//! Grayscale image I/O with bit depth preservation.

use crate::types::{Error, ImageData, ImageFormat, Result};
use ndarray::Array2;
use image::{DynamicImage, ImageBuffer, ImageReader, Luma};
use std::path::{Path, PathBuf};

fn into_array<T>(width: u32, height: u32, raw: Vec<T>) -> Result<Array2<T>> {
    Ok(Array2::from_shape_vec(
        (height as usize, width as usize),
        raw,
    )?)
}

/// Load an image from a file, preserving bit depth.
///
/// Grayscale images are passed through untouched; colour images are
/// converted to grayscale at their native bit depth.
pub fn load_image(path: &Path) -> Result<ImageData> {
    let mut reader = ImageReader::open(path)?;
    reader.no_limits();
    let img = reader.decode()?;

    match img {
        DynamicImage::ImageLuma8(buf) => {
            let (width, height) = buf.dimensions();
            Ok(ImageData::Gray8(into_array(width, height, buf.into_raw())?))
        }
        DynamicImage::ImageLuma16(buf) => {
            let (width, height) = buf.dimensions();
            Ok(ImageData::Gray16(into_array(width, height, buf.into_raw())?))
        }
        other => {
            let bits = other.color().bits_per_pixel() / u16::from(other.color().channel_count());
            if bits > 8 {
                let gray = other.to_luma16();
                let (width, height) = gray.dimensions();
                Ok(ImageData::Gray16(into_array(width, height, gray.into_raw())?))
            } else {
                let gray = other.to_luma8();
                let (width, height) = gray.dimensions();
                Ok(ImageData::Gray8(into_array(width, height, gray.into_raw())?))
            }
        }
    }
}

/// Load a mask image: any non-zero pixel marks a hole.
pub fn load_mask(path: &Path) -> Result<Array2<bool>> {
    match load_image(path)? {
        ImageData::Gray8(arr) => Ok(arr.map(|&v| v != 0)),
        ImageData::Gray16(arr) => Ok(arr.map(|&v| v != 0)),
        _ => Err(Error::UnsupportedFormat(
            "multi-layer images cannot be used as masks".to_string(),
        )),
    }
}

/// Save a single-layer image; the container format follows the extension
/// of `path`.
pub fn save_image(path: &Path, data: &ImageData) -> Result<()> {
    match data {
        ImageData::Gray8(array) => {
            let (height, width) = (array.nrows() as u32, array.ncols() as u32);
            let raw: Vec<u8> = array.iter().copied().collect();
            let buf = ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, raw)
                .ok_or_else(|| Error::Config("image buffer size mismatch".to_string()))?;
            DynamicImage::ImageLuma8(buf).save(path)?;
        }
        ImageData::Gray16(array) => {
            let (height, width) = (array.nrows() as u32, array.ncols() as u32);
            let raw: Vec<u16> = array.iter().copied().collect();
            let buf = ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(width, height, raw)
                .ok_or_else(|| Error::Config("image buffer size mismatch".to_string()))?;
            DynamicImage::ImageLuma16(buf).save(path)?;
        }
        ImageData::Multi8(_) | ImageData::Multi16(_) => {
            return Err(Error::UnsupportedFormat(
                "multi-layer images are not supported for saving".to_string(),
            ));
        }
    }
    Ok(())
}

/// Generate an output filename based on the input and an optional format
/// override.
pub fn generate_output_path(input: &Path, format: Option<ImageFormat>) -> Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config(format!("invalid input filename: {}", input.display())))?;

    let parent = input.parent().unwrap_or_else(|| Path::new("."));

    let extension = match format {
        Some(fmt) => fmt.extension().to_string(),
        None => input
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .ok_or_else(|| Error::Config(format!("no file extension: {}", input.display())))?,
    };

    Ok(parent.join(format!("{}_filled.{}", stem, extension)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_output_path() {
        let input = Path::new("/tmp/trees.pgm");
        let output = generate_output_path(input, None).unwrap();
        assert_eq!(output, Path::new("/tmp/trees_filled.pgm"));
    }

    #[test]
    fn test_generate_output_path_with_format() {
        let input = Path::new("/tmp/trees.pgm");
        let output = generate_output_path(input, Some(ImageFormat::Png)).unwrap();
        assert_eq!(output, Path::new("/tmp/trees_filled.png"));
    }

    #[test]
    fn test_generate_output_path_rejects_bare_name() {
        assert!(generate_output_path(Path::new("noext"), None).is_err());
    }
}
