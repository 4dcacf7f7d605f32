//! Conversion between the ITK and nibabel conventions.
//!
//! Orientation: nibabel names the direction each axis points to (RAS+ means
//! L -> R, P -> A, I -> S), ITK names the direction it comes from (RAS means
//! R -> L, A -> P, S -> I). Converting an orientation inverts every letter.
//!
//! Affine: ITK works in LPS physical space and nibabel in RAS, so the first
//! two world axes are mirrored. For an image that ITK calls RAS the
//! direction matrix is `diag(1, 1, -1)`; nibabel calls the same image LPI+
//! with direction `diag(-1, -1, -1)`. Left-multiplying by
//! `diag(-1, -1, 1, 1)` (`diag(-1, -1, 1)` in 2-D) maps one onto the other
//! for every orientation.
//!
//! Both conversions are their own inverse, so the same calls go either way:
//!
//! ```
//! use medspace::{Affine, convert};
//!
//! let affine = Affine::identity(3).unwrap();
//! let axcodes = vec![Some("RAS".to_string()), None];
//! let (nib_affine, nib_axcodes) = convert::convert(&affine, &axcodes).unwrap();
//! assert_eq!(nib_axcodes, vec![Some("LPI".to_string()), None]);
//!
//! let (itk_affine, itk_axcodes) = convert::convert(&nib_affine, &nib_axcodes).unwrap();
//! assert_eq!(itk_affine, affine);
//! assert_eq!(itk_axcodes, axcodes);
//! ```

use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use tracing::trace;

use crate::affine::{Affine, AffineError};
use crate::orientation::{OrientationError, invert_axcodes};

/// Diagonal of the conversion matrix for a spatial dimension: -1 on the
/// first two axes, 1 elsewhere including the homogeneous row.
fn mirror(len: usize) -> Array1<f64> {
    Array1::from_shape_fn(len, |i| if i < 2 { -1.0 } else { 1.0 })
}

/// Conversion matrix of a `(d+1)x(d+1)` affine.
pub fn conversion_matrix(dim: usize) -> Result<Array2<f64>, AffineError> {
    match dim {
        2 | 3 => Ok(Array2::from_diag(&mirror(dim + 1))),
        _ => Err(AffineError::UnsupportedDimension(dim)),
    }
}

/// Convert a raw homogeneous matrix (3x3 or 4x4).
pub fn convert_matrix<'a>(
    matrix: impl Into<ArrayView2<'a, f64>>,
) -> Result<Array2<f64>, AffineError> {
    let matrix = matrix.into();
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(AffineError::DimensionMismatch {
            what: "affine columns",
            expected: rows,
            found: cols,
        });
    }
    let dim = rows.saturating_sub(1);
    Ok(conversion_matrix(dim)?.dot(&matrix))
}

/// Convert an affine.
///
/// Mirroring whole rows keeps the column norms, so the spacing carries
/// over unchanged and the direction is mirrored the same way; the result
/// is not decomposed again.
pub fn convert_affine(affine: &Affine) -> Affine {
    let dim = affine.dim();
    let signs = mirror(dim + 1);
    trace!(dim, "converting affine between ITK and nibabel conventions");

    let matrix = &affine.matrix() * &signs.view().insert_axis(Axis(1));
    let direction = &affine.direction() * &signs.slice(s![..dim]).insert_axis(Axis(1));
    Affine::from_parts(matrix, direction, affine.spacing().to_owned())
}

/// Invert every orientation string, keeping order and missing entries.
pub fn convert_axcodes<S: AsRef<str>>(
    axcodes: &[Option<S>],
) -> Result<Vec<Option<String>>, OrientationError> {
    axcodes
        .iter()
        .map(|axcodes| invert_axcodes(axcodes.as_ref().map(|axcodes| axcodes.as_ref())))
        .collect()
}

/// Convert an affine together with its orientation strings (typically the
/// current and the original orientation of an image).
pub fn convert<S: AsRef<str>>(
    affine: &Affine,
    axcodes: &[Option<S>],
) -> Result<(Affine, Vec<Option<String>>), OrientationError> {
    let axcodes = convert_axcodes(axcodes)?;
    Ok((convert_affine(affine), axcodes))
}
