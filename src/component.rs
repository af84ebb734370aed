//! Image-component scalars and strided single-channel views.
//!
//! The solvers are generic over the scalar type of one colour channel of a
//! row-major image. Interleaved multi-component images are handled without
//! rearranging memory: a channel is exposed as an `ArrayView2` whose column
//! stride equals the number of components per pixel.

use crate::types::{Error, Result};
use ndarray::{ArrayView2, ArrayViewMut2, ShapeBuilder};

/// Scalar type of one component of an image pixel.
///
/// Implemented for the common unsigned, signed and floating-point scalars.
/// `from_solution` converts a solved value back to the component type:
/// unsigned integers truncate `x + 0.5`, signed integers round half away
/// from zero, and floating-point types cast. This keeps the written-back
/// image unbiased with respect to the continuous solution.
pub trait Component: Copy + PartialEq + Send + Sync + 'static {
    /// The zero value used for mask comparisons.
    const ZERO: Self;

    /// Widen to `f64` for accumulation into the right-hand side.
    fn to_f64(self) -> f64;

    /// Convert a solved value to this component type, rounding if integral.
    fn from_solution(x: f32) -> Self;
}

macro_rules! unsigned_component {
    ($($t:ty),*) => {$(
        impl Component for $t {
            const ZERO: Self = 0;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_solution(x: f32) -> Self {
                // Float-to-int casts saturate, so negative values clamp to 0.
                (x + 0.5) as $t
            }
        }
    )*};
}

macro_rules! signed_component {
    ($($t:ty),*) => {$(
        impl Component for $t {
            const ZERO: Self = 0;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_solution(x: f32) -> Self {
                // Round half away from zero; truncation does the rest.
                if x < 0.0 {
                    (x - 0.5) as $t
                } else {
                    (x + 0.5) as $t
                }
            }
        }
    )*};
}

macro_rules! float_component {
    ($($t:ty),*) => {$(
        impl Component for $t {
            const ZERO: Self = 0.0;

            fn to_f64(self) -> f64 {
                self as f64
            }

            fn from_solution(x: f32) -> Self {
                x as $t
            }
        }
    )*};
}

unsigned_component!(u8, u16, u32);
signed_component!(i8, i16, i32);
float_component!(f32, f64);

fn check_layout(
    len: usize,
    width: usize,
    height: usize,
    num_comps: usize,
    comp: usize,
) -> Result<()> {
    if num_comps == 0 {
        return Err(Error::Config("components per pixel must be non-zero".into()));
    }
    if comp >= num_comps {
        return Err(Error::Config(format!(
            "component {} out of range for {} components per pixel",
            comp, num_comps
        )));
    }
    let pixels = width * height;
    let required = if pixels == 0 {
        0
    } else {
        (pixels - 1) * num_comps + comp + 1
    };
    if len < required {
        return Err(Error::Config(format!(
            "buffer of {} elements too small for {}x{} image with {} components",
            len, width, height, num_comps
        )));
    }
    Ok(())
}

/// View one channel of an interleaved row-major image buffer.
///
/// # Arguments
/// * `data` - Buffer of `width * height * num_comps` components
/// * `width`, `height` - Image dimensions in pixels
/// * `num_comps` - Number of components per pixel (the channel stride)
/// * `comp` - Which component to view, `0 <= comp < num_comps`
pub fn channel_view<C: Component>(
    data: &[C],
    width: usize,
    height: usize,
    num_comps: usize,
    comp: usize,
) -> Result<ArrayView2<'_, C>> {
    check_layout(data.len(), width, height, num_comps, comp)?;
    let shape = (height, width).strides((width * num_comps, num_comps));
    Ok(ArrayView2::from_shape(shape, &data[comp..])?)
}

/// Mutable variant of [`channel_view`].
pub fn channel_view_mut<C: Component>(
    data: &mut [C],
    width: usize,
    height: usize,
    num_comps: usize,
    comp: usize,
) -> Result<ArrayViewMut2<'_, C>> {
    check_layout(data.len(), width, height, num_comps, comp)?;
    let shape = (height, width).strides((width * num_comps, num_comps));
    Ok(ArrayViewMut2::from_shape(shape, &mut data[comp..])?)
}
