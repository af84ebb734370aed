//! Core types and structures for dirichlet-fill

use ndarray::{Array2, Array3};
use thiserror::Error;

/// Factorisation strategy for the sparse linear system.
///
/// `Cholesky` pays a one-time factorisation cost and is the right choice
/// when the same mask is applied to many image channels. `ConjugateGradient`
/// skips the factorisation and is preferable for one-shot solves on very
/// large systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMethod {
    #[default]
    Cholesky,
    ConjugateGradient,
}

impl SolveMethod {
    /// Parse a method name as given on a command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "cholesky" | "chol" => Some(SolveMethod::Cholesky),
            "cg" | "conjugate-gradient" => Some(SolveMethod::ConjugateGradient),
            _ => None,
        }
    }
}

/// Fill configuration
#[derive(Debug, Clone, Default)]
pub struct FillConfig {
    /// How to solve the linear system
    pub method: SolveMethod,
    /// Use the bilinear-accelerated approximate solver instead of the exact one
    pub approximate: bool,
}

/// Multi-format image data representation
#[derive(Debug)]
pub enum ImageData {
    /// 8-bit grayscale
    Gray8(Array2<u8>),
    /// 16-bit grayscale
    Gray16(Array2<u16>),
    /// Multi-layer 8-bit (e.g., TIFF stack)
    Multi8(Array3<u8>),
    /// Multi-layer 16-bit (e.g., TIFF stack)
    Multi16(Array3<u16>),
}

impl ImageData {
    /// Get the dimensions (width, height) of the image
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            ImageData::Gray8(arr) => (arr.ncols(), arr.nrows()),
            ImageData::Gray16(arr) => (arr.ncols(), arr.nrows()),
            ImageData::Multi8(arr) => (arr.shape()[2], arr.shape()[1]),
            ImageData::Multi16(arr) => (arr.shape()[2], arr.shape()[1]),
        }
    }

    /// Get the number of layers (1 for single-layer images)
    pub fn num_layers(&self) -> usize {
        match self {
            ImageData::Gray8(_) | ImageData::Gray16(_) => 1,
            ImageData::Multi8(arr) => arr.shape()[0],
            ImageData::Multi16(arr) => arr.shape()[0],
        }
    }

    /// Check if this is a 16-bit image
    pub fn is_16bit(&self) -> bool {
        matches!(self, ImageData::Gray16(_) | ImageData::Multi16(_))
    }
}

/// Image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Tiff,
    Png,
    Pgm,
}

impl ImageFormat {
    /// Parse format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "png" => Some(ImageFormat::Png),
            "pgm" | "pnm" => Some(ImageFormat::Pgm),
            _ => None,
        }
    }

    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Tiff => "tif",
            ImageFormat::Png => "png",
            ImageFormat::Pgm => "pgm",
        }
    }
}

/// dirichlet-fill error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Mask error: {0}")]
    Mask(String),

    #[error("Binning error: {0}")]
    Binning(String),

    #[error("Factorisation failed: {0}")]
    Factorization(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_name() {
        assert_eq!(SolveMethod::from_name("cholesky"), Some(SolveMethod::Cholesky));
        assert_eq!(SolveMethod::from_name("CG"), Some(SolveMethod::ConjugateGradient));
        assert_eq!(SolveMethod::from_name("lu"), None);
    }

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::from_extension("TIFF"), Some(ImageFormat::Tiff));
        assert_eq!(ImageFormat::from_extension("pgm"), Some(ImageFormat::Pgm));
        assert_eq!(ImageFormat::Png.extension(), "png");
    }

    #[test]
    fn test_image_data_dimensions() {
        let data = ImageData::Gray16(Array2::zeros((4, 6)));
        assert_eq!(data.dimensions(), (6, 4));
        assert_eq!(data.num_layers(), 1);
        assert!(data.is_16bit());

        let stack = ImageData::Multi8(Array3::zeros((3, 4, 6)));
        assert_eq!(stack.dimensions(), (6, 4));
        assert_eq!(stack.num_layers(), 3);
        assert!(!stack.is_16bit());
    }
}
