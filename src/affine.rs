//! Homogeneous affine matrices of 2-D and 3-D images.
//!
//! An [`Affine`] maps an index vector `x` of the image array to physical
//! coordinates `y = M * x + b`. The `(d+1)x(d+1)` matrix holds `M` in its
//! upper-left block and the origin `b` in its last column. `M` is kept
//! decomposed as `direction * diag(spacing)`, where `direction` is a pure
//! rotation/reflection and `spacing` the per-axis voxel size.
//!
//! ```
//! use medspace::Affine;
//! use ndarray::Array2;
//!
//! let affine = Affine::from_components(
//!     &Array2::<f64>::eye(3),
//!     &[0.33, 1.0, 0.33],
//!     &[-90.3, 10.0, 1.44],
//! )
//! .unwrap();
//! let coord = affine.index_to_coord(&[4.0, 0.0, 9.0]).unwrap();
//! assert!((coord[0] - -88.98).abs() < 1e-9);
//! assert!((coord[2] - 4.41).abs() < 1e-9);
//! ```

use std::ops::{Index, Mul};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use rayon::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use crate::enums::CoordSys;
use crate::orientation::{OrientationError, axcodes_from_direction};

/// Tolerance used when checking that a direction matrix is orthonormal.
pub const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// Relative tolerance when checking a stored decomposition against its matrix.
pub const DECOMPOSITION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AffineError {
    #[error("Degenerate affine: column {column} of the direction block has zero norm")]
    DegenerateAffine { column: usize },

    #[error("Dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Inconsistent decomposition: column {column} of the matrix is not direction * spacing")]
    InconsistentDecomposition { column: usize },

    #[error("Unsupported spatial dimension: {0}")]
    UnsupportedDimension(usize),

    #[error(transparent)]
    Orientation(#[from] OrientationError),
}

/// `(d+1)x(d+1)` affine matrix with its cached decomposition, d in {2, 3}.
///
/// The cached `direction` and `spacing` always satisfy
/// `M == direction * diag(spacing)`. The fields are only reachable through
/// accessors, so every mutation keeps the matrix and the cache in step.
/// Cloning copies the cache as is, without decomposing the matrix again.
/// Serialization stores the cache next to the matrix for the same reason.
#[derive(Debug, Clone, PartialEq)]
pub struct Affine {
    matrix: Array2<f64>,
    direction: Array2<f64>,
    spacing: Array1<f64>,
}

fn check_dim(dim: usize) -> Result<(), AffineError> {
    match dim {
        2 | 3 => Ok(()),
        _ => Err(AffineError::UnsupportedDimension(dim)),
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<(), AffineError> {
    if expected != found {
        return Err(AffineError::DimensionMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

fn abs_spacing(spacing: ArrayView1<'_, f64>) -> Array1<f64> {
    if spacing.iter().any(|&value| value < 0.0) {
        warn!(?spacing, "negative spacing stored as its absolute value");
    }
    spacing.mapv(f64::abs)
}

impl Affine {
    /// Build the matrix `[[direction * diag(spacing), origin], [0, 1]]`.
    ///
    /// Negative spacing values are not rejected; their absolute value is
    /// used and stored.
    pub fn from_components<'a>(
        direction: impl Into<ArrayView2<'a, f64>>,
        spacing: impl Into<ArrayView1<'a, f64>>,
        origin: impl Into<ArrayView1<'a, f64>>,
    ) -> Result<Self, AffineError> {
        let direction = direction.into();
        let spacing = spacing.into();
        let origin = origin.into();

        let (rows, cols) = direction.dim();
        check_dim(rows)?;
        check_len("direction columns", rows, cols)?;
        check_len("spacing", rows, spacing.len())?;
        check_len("origin", rows, origin.len())?;

        let spacing = abs_spacing(spacing);
        let mut matrix = Array2::<f64>::eye(rows + 1);
        matrix
            .slice_mut(s![..rows, ..rows])
            .assign(&(&direction * &spacing));
        matrix.slice_mut(s![..rows, rows]).assign(&origin);

        Ok(Self {
            matrix,
            direction: direction.to_owned(),
            spacing,
        })
    }

    /// Decompose a raw `(d+1)x(d+1)` matrix.
    ///
    /// The spacing is the Euclidean norm of each column of the upper-left
    /// block and the direction is that block with its columns normalized.
    ///
    /// # Errors
    ///
    /// Returns [`AffineError::DimensionMismatch`] for a non-square matrix,
    /// [`AffineError::UnsupportedDimension`] unless it is 3x3 or 4x4, and
    /// [`AffineError::DegenerateAffine`] when a column of the upper-left
    /// block is zero.
    pub fn from_matrix<'a>(raw: impl Into<ArrayView2<'a, f64>>) -> Result<Self, AffineError> {
        let raw = raw.into();
        let (rows, cols) = raw.dim();
        check_len("affine columns", rows, cols)?;
        let dim = rows.saturating_sub(1);
        check_dim(dim)?;

        let m = raw.slice(s![..dim, ..dim]);
        let spacing: Array1<f64> = m
            .axis_iter(Axis(1))
            .map(|column| column.dot(&column).sqrt())
            .collect();
        if let Some(column) = spacing.iter().position(|&norm| norm == 0.0) {
            return Err(AffineError::DegenerateAffine { column });
        }
        let direction = &m / &spacing;

        Ok(Self {
            matrix: raw.to_owned(),
            direction,
            spacing,
        })
    }

    /// Assemble an affine from parts already known to be consistent.
    pub(crate) fn from_parts(
        matrix: Array2<f64>,
        direction: Array2<f64>,
        spacing: Array1<f64>,
    ) -> Self {
        Self {
            matrix,
            direction,
            spacing,
        }
    }

    pub fn identity(dim: usize) -> Result<Self, AffineError> {
        check_dim(dim)?;
        Ok(Self {
            matrix: Array2::<f64>::eye(dim + 1),
            direction: Array2::<f64>::eye(dim),
            spacing: Array1::ones(dim),
        })
    }

    /// Spatial dimension d.
    pub fn dim(&self) -> usize {
        self.direction.nrows()
    }

    /// The full homogeneous matrix.
    pub fn matrix(&self) -> ArrayView2<'_, f64> {
        self.matrix.view()
    }

    pub fn into_matrix(self) -> Array2<f64> {
        self.matrix
    }

    /// The upper-left `M` block.
    pub fn m_matrix(&self) -> ArrayView2<'_, f64> {
        let dim = self.dim();
        self.matrix.slice(s![..dim, ..dim])
    }

    pub fn origin(&self) -> ArrayView1<'_, f64> {
        let dim = self.dim();
        self.matrix.slice(s![..dim, dim])
    }

    pub fn set_origin<'a>(
        &mut self,
        origin: impl Into<ArrayView1<'a, f64>>,
    ) -> Result<(), AffineError> {
        let origin = origin.into();
        let dim = self.dim();
        check_len("origin", dim, origin.len())?;
        self.matrix.slice_mut(s![..dim, dim]).assign(&origin);
        Ok(())
    }

    pub fn spacing(&self) -> ArrayView1<'_, f64> {
        self.spacing.view()
    }

    /// Rescale each column of `M` by `new / old` spacing; direction and
    /// origin stay untouched. Negative values are stored as their absolute
    /// value.
    pub fn set_spacing<'a>(
        &mut self,
        spacing: impl Into<ArrayView1<'a, f64>>,
    ) -> Result<(), AffineError> {
        let spacing = spacing.into();
        let dim = self.dim();
        check_len("spacing", dim, spacing.len())?;

        let spacing = abs_spacing(spacing);
        for (j, (&new, &old)) in spacing.iter().zip(self.spacing.iter()).enumerate() {
            let mut column = self.matrix.slice_mut(s![..dim, j]);
            if old == 0.0 {
                // nothing left to rescale, rebuild from the cached direction
                column.assign(&(&self.direction.column(j) * new));
            } else {
                column *= new / old;
            }
        }
        self.spacing = spacing;
        Ok(())
    }

    pub fn direction(&self) -> ArrayView2<'_, f64> {
        self.direction.view()
    }

    pub fn set_direction<'a>(
        &mut self,
        direction: impl Into<ArrayView2<'a, f64>>,
    ) -> Result<(), AffineError> {
        let direction = direction.into();
        let dim = self.dim();
        let (rows, cols) = direction.dim();
        check_len("direction rows", dim, rows)?;
        check_len("direction columns", dim, cols)?;

        self.matrix
            .slice_mut(s![..dim, ..dim])
            .assign(&(&direction * &self.spacing));
        self.direction = direction.to_owned();
        Ok(())
    }

    /// Owned `(direction, spacing, origin)`.
    pub fn components(&self) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
        (
            self.direction.clone(),
            self.spacing.clone(),
            self.origin().to_owned(),
        )
    }

    /// `M * index + origin`.
    pub fn index_to_coord<'a>(
        &self,
        index: impl Into<ArrayView1<'a, f64>>,
    ) -> Result<Array1<f64>, AffineError> {
        let index = index.into();
        check_len("index", self.dim(), index.len())?;
        Ok(self.m_matrix().dot(&index) + &self.origin())
    }

    /// [`Affine::index_to_coord`] for every row of an `n x d` array.
    pub fn index_to_coord_batch<'a>(
        &self,
        indices: impl Into<ArrayView2<'a, f64>>,
    ) -> Result<Array2<f64>, AffineError> {
        let indices = indices.into();
        let (n, cols) = indices.dim();
        check_len("index", self.dim(), cols)?;

        let m = self.m_matrix();
        let origin = self.origin();
        let mut coords = Array2::zeros((n, cols));
        coords
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(indices.axis_iter(Axis(0)))
            .for_each(|(mut coord, index)| coord.assign(&(m.dot(&index) + &origin)));
        Ok(coords)
    }

    pub fn determinant(&self) -> f64 {
        determinant(self.direction.view())
    }

    pub fn is_right_handed(&self) -> bool {
        self.determinant() > 0.0
    }

    /// Whether `direction^T * direction` is the identity.
    pub fn is_orthonormal(&self) -> bool {
        let product = self.direction.t().dot(&self.direction);
        product.indexed_iter().all(|((i, j), &value)| {
            let expected = if i == j { 1.0 } else { 0.0 };
            (value - expected).abs() < ORTHONORMAL_TOLERANCE
        })
    }

    /// Orientation string of a 3-D affine in the given convention.
    pub fn axcodes(&self, coord_sys: CoordSys) -> Result<String, AffineError> {
        if self.dim() != 3 {
            return Err(AffineError::UnsupportedDimension(self.dim()));
        }
        Ok(axcodes_from_direction(self.direction.view(), coord_sys)?)
    }
}

/// Determinant of a square matrix.
pub(crate) fn determinant(m: ArrayView2<'_, f64>) -> f64 {
    match m.dim() {
        (2, 2) => m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        (3, 3) => {
            m[(0, 0)] * (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)])
                - m[(0, 1)] * (m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)])
                + m[(0, 2)] * (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)])
        }
        (n, _) => {
            // Gaussian elimination with partial pivoting
            let mut m = m.to_owned();
            let mut det = 1.0;
            for i in 0..n {
                let pivot = (i..n)
                    .max_by(|&a, &b| m[(a, i)].abs().total_cmp(&m[(b, i)].abs()))
                    .unwrap_or(i);
                if m[(pivot, i)] == 0.0 {
                    return 0.0;
                }
                if pivot != i {
                    for k in 0..n {
                        m.swap((i, k), (pivot, k));
                    }
                    det = -det;
                }
                det *= m[(i, i)];
                for j in (i + 1)..n {
                    let factor = m[(j, i)] / m[(i, i)];
                    for k in i..n {
                        m[(j, k)] -= factor * m[(i, k)];
                    }
                }
            }
            det
        }
    }
}

impl From<Affine> for Array2<f64> {
    fn from(affine: Affine) -> Self {
        affine.matrix
    }
}

impl TryFrom<Array2<f64>> for Affine {
    type Error = AffineError;

    fn try_from(matrix: Array2<f64>) -> Result<Self, Self::Error> {
        Affine::from_matrix(&matrix)
    }
}

#[derive(Serialize)]
struct AffineRef<'a> {
    matrix: &'a Array2<f64>,
    direction: &'a Array2<f64>,
    spacing: &'a Array1<f64>,
}

#[derive(Deserialize)]
struct AffineParts {
    matrix: Array2<f64>,
    direction: Array2<f64>,
    spacing: Array1<f64>,
}

impl AffineParts {
    fn into_affine(self) -> Result<Affine, AffineError> {
        let parts = self;
        let (rows, cols) = parts.matrix.dim();
        check_len("affine columns", rows, cols)?;
        let dim = rows.saturating_sub(1);
        check_dim(dim)?;
        let (direction_rows, direction_cols) = parts.direction.dim();
        check_len("direction rows", dim, direction_rows)?;
        check_len("direction columns", dim, direction_cols)?;
        check_len("spacing", dim, parts.spacing.len())?;

        let expected = &parts.direction * &parts.spacing;
        let m = parts.matrix.slice(s![..dim, ..dim]);
        for (j, (column, expected)) in m
            .axis_iter(Axis(1))
            .zip(expected.axis_iter(Axis(1)))
            .enumerate()
        {
            let tolerance = DECOMPOSITION_TOLERANCE * parts.spacing[j].abs().max(1.0);
            if column
                .iter()
                .zip(expected.iter())
                .any(|(value, expected)| (value - expected).abs() > tolerance)
            {
                return Err(AffineError::InconsistentDecomposition { column: j });
            }
        }

        Ok(Affine::from_parts(parts.matrix, parts.direction, parts.spacing))
    }
}

impl Serialize for Affine {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        AffineRef {
            matrix: &self.matrix,
            direction: &self.direction,
            spacing: &self.spacing,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Affine {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        AffineParts::deserialize(deserializer)?
            .into_affine()
            .map_err(serde::de::Error::custom)
    }
}

impl Index<(usize, usize)> for Affine {
    type Output = f64;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        &self.matrix[index]
    }
}

// Products are plain matrices: the result of arbitrary linear algebra has
// no reason to keep a valid decomposition.
impl Mul<&Array2<f64>> for &Affine {
    type Output = Array2<f64>;

    fn mul(self, rhs: &Array2<f64>) -> Self::Output {
        self.matrix.dot(rhs)
    }
}

impl Mul<&Array1<f64>> for &Affine {
    type Output = Array1<f64>;

    fn mul(self, rhs: &Array1<f64>) -> Self::Output {
        self.matrix.dot(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn assert_close(a: ArrayView2<'_, f64>, b: ArrayView2<'_, f64>) {
        assert_eq!(a.dim(), b.dim());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{a} != {b}");
        }
    }

    fn rotation_z(angle: f64) -> Array2<f64> {
        arr2(&[
            [angle.cos(), -angle.sin(), 0.0],
            [angle.sin(), angle.cos(), 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn test_index_to_coord() {
        let affine = Affine::from_components(
            &Array2::<f64>::eye(3),
            &[0.33, 1.0, 0.33],
            &[-90.3, 10.0, 1.44],
        )
        .unwrap();
        let coord = affine.index_to_coord(&[4.0, 0.0, 9.0]).unwrap();
        let expected = [-88.98, 10.0, 4.41];
        for (c, e) in coord.iter().zip(expected) {
            assert!((c - e).abs() < 1e-9, "{coord}");
        }
    }

    #[test]
    fn test_from_components_layout() {
        let affine =
            Affine::from_components(&rotation_z(0.5), &[2.0, 3.0, 4.0], &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(affine.dim(), 3);
        assert_eq!(affine.matrix().row(3), arr1(&[0.0, 0.0, 0.0, 1.0]));
        assert_eq!(affine.origin(), arr1(&[1.0, 2.0, 3.0]));
        assert_close(
            affine.m_matrix(),
            (&rotation_z(0.5) * &arr1(&[2.0, 3.0, 4.0])).view(),
        );
    }

    #[test]
    fn test_from_matrix_decomposes() {
        let built =
            Affine::from_components(&rotation_z(1.2), &[0.5, 1.5, 2.5], &[-3.0, 4.0, 0.0]).unwrap();
        let decomposed = Affine::from_matrix(&built.matrix().to_owned()).unwrap();
        assert_close(decomposed.direction(), rotation_z(1.2).view());
        for (s, e) in decomposed.spacing().iter().zip([0.5, 1.5, 2.5]) {
            assert!((s - e).abs() < 1e-12);
        }
        assert_eq!(decomposed.origin(), arr1(&[-3.0, 4.0, 0.0]));
        assert!(decomposed.is_orthonormal());
    }

    #[test]
    fn test_from_matrix_degenerate() {
        let mut raw = Array2::<f64>::eye(4);
        raw[(1, 1)] = 0.0;
        assert_eq!(
            Affine::from_matrix(&raw),
            Err(AffineError::DegenerateAffine { column: 1 })
        );
    }

    #[test]
    fn test_from_matrix_bad_shapes() {
        assert_eq!(
            Affine::from_matrix(&Array2::<f64>::eye(5)),
            Err(AffineError::UnsupportedDimension(4))
        );
        assert!(matches!(
            Affine::from_matrix(&Array2::<f64>::zeros((3, 4))),
            Err(AffineError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            Affine::from_components(&Array2::<f64>::eye(3), &[1.0, 1.0], &[0.0, 0.0, 0.0]),
            Err(AffineError::DimensionMismatch { what: "spacing", .. })
        ));
    }

    #[test]
    fn test_set_spacing_rescales_columns() {
        let mut affine = Affine::identity(3).unwrap();
        affine.set_origin(&[5.0, 6.0, 7.0]).unwrap();
        affine.set_spacing(&[2.0, 1.0, 1.0]).unwrap();

        assert_eq!(affine.spacing(), arr1(&[2.0, 1.0, 1.0]));
        assert_eq!(affine.m_matrix().column(0), arr1(&[2.0, 0.0, 0.0]));
        assert_eq!(affine.m_matrix().column(1), arr1(&[0.0, 1.0, 0.0]));
        assert_eq!(affine.m_matrix().column(2), arr1(&[0.0, 0.0, 1.0]));
        assert_eq!(affine.direction(), Array2::<f64>::eye(3));
        assert_eq!(affine.origin(), arr1(&[5.0, 6.0, 7.0]));
    }

    #[test]
    fn test_set_spacing_negative_is_absolute() {
        let mut affine =
            Affine::from_components(&rotation_z(0.3), &[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0]).unwrap();
        affine.set_spacing(&[-4.0, 2.0, 3.0]).unwrap();
        assert_eq!(affine.spacing(), arr1(&[4.0, 2.0, 3.0]));
        let expected = &rotation_z(0.3) * &arr1(&[4.0, 2.0, 3.0]);
        assert_close(affine.m_matrix(), expected.view());
    }

    #[test]
    fn test_set_spacing_from_zero() {
        let mut affine =
            Affine::from_components(&Array2::<f64>::eye(2), &[0.0, 1.0], &[0.0, 0.0]).unwrap();
        affine.set_spacing(&[3.0, 1.0]).unwrap();
        assert_eq!(affine.m_matrix(), arr2(&[[3.0, 0.0], [0.0, 1.0]]));
    }

    #[test]
    fn test_set_direction() {
        let mut affine =
            Affine::from_components(&Array2::<f64>::eye(3), &[2.0, 2.0, 1.0], &[1.0, 1.0, 1.0])
                .unwrap();
        affine.set_direction(&rotation_z(0.7)).unwrap();
        assert_close(affine.direction(), rotation_z(0.7).view());
        assert_close(
            affine.m_matrix(),
            (&rotation_z(0.7) * &arr1(&[2.0, 2.0, 1.0])).view(),
        );
        assert_eq!(affine.spacing(), arr1(&[2.0, 2.0, 1.0]));
        assert!(affine.set_direction(&Array2::<f64>::eye(2)).is_err());
    }

    #[test]
    fn test_clone_keeps_cache() {
        let affine =
            Affine::from_components(&rotation_z(0.1), &[0.7, 0.7, 1.1], &[1.0, 2.0, 3.0]).unwrap();
        let cloned = affine.clone();
        assert_eq!(cloned, affine);
        assert_eq!(cloned.direction(), affine.direction());
    }

    #[test]
    fn test_batch_matches_single() {
        let affine =
            Affine::from_components(&rotation_z(0.4), &[0.5, 1.0, 2.0], &[10.0, -5.0, 3.0])
                .unwrap();
        let indices = arr2(&[[0.0, 0.0, 0.0], [1.0, 2.0, 3.0], [4.0, 0.0, 9.0]]);
        let coords = affine.index_to_coord_batch(&indices).unwrap();
        for (index, coord) in indices.rows().into_iter().zip(coords.rows()) {
            assert_eq!(affine.index_to_coord(index).unwrap(), coord);
        }
        assert!(affine.index_to_coord_batch(&Array2::<f64>::zeros((2, 2))).is_err());
    }

    #[test]
    fn test_products_are_plain_matrices() {
        let affine =
            Affine::from_components(&Array2::<f64>::eye(2), &[2.0, 3.0], &[1.0, 1.0]).unwrap();
        let product: Array2<f64> = &affine * &Array2::<f64>::eye(3);
        assert_eq!(product, affine.matrix());
        let point: Array1<f64> = &affine * &arr1(&[1.0, 1.0, 1.0]);
        assert_eq!(point, arr1(&[3.0, 4.0, 1.0]));
        assert_eq!(affine[(1, 1)], 3.0);
    }

    #[test]
    fn test_matrix_conversions() {
        let affine =
            Affine::from_components(&rotation_z(0.25), &[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0])
                .unwrap();
        let raw = Array2::from(affine.clone());
        assert_eq!(raw, affine.matrix());
        let decomposed = Affine::try_from(raw).unwrap();
        assert_close(decomposed.direction(), affine.direction());
        assert!(Affine::try_from(Array2::<f64>::zeros((4, 4))).is_err());
    }

    #[test]
    fn test_handedness_and_axcodes() {
        let affine = Affine::identity(3).unwrap();
        assert!(affine.is_right_handed());
        assert_eq!(affine.axcodes(CoordSys::Nib), Ok("RAS".to_string()));
        assert_eq!(affine.axcodes(CoordSys::Itk), Ok("RAI".to_string()));

        let flipped =
            Affine::from_components(&arr2(&[[-1.0, 0.0], [0.0, 1.0]]), &[1.0, 1.0], &[0.0, 0.0])
                .unwrap();
        assert!(!flipped.is_right_handed());
        assert_eq!(
            flipped.axcodes(CoordSys::Nib),
            Err(AffineError::UnsupportedDimension(2))
        );
    }

    #[test]
    fn test_determinant_general() {
        let m = arr2(&[
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 3.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!((determinant(m.view()) - -6.0).abs() < 1e-12);
        assert_eq!(determinant(Array2::<f64>::zeros((4, 4)).view()), 0.0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let affine =
            Affine::from_components(&Array2::<f64>::eye(3), &[1.0, 2.0, 4.0], &[0.5, 0.5, 0.5])
                .unwrap();
        let json = serde_json::to_string(&affine).unwrap();
        let restored: Affine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, affine);
    }

    #[test]
    fn test_serde_keeps_rotated_cache() {
        let affine =
            Affine::from_components(&rotation_z(0.7), &[0.33, 1.7, 2.9], &[1.0, -2.0, 3.0])
                .unwrap();
        let json = serde_json::to_string(&affine).unwrap();
        let restored: Affine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, affine);
        assert_eq!(restored.direction(), rotation_z(0.7));
    }

    #[test]
    fn test_serde_zero_spacing() {
        let affine =
            Affine::from_components(&Array2::<f64>::eye(3), &[0.0, 1.0, 1.0], &[0.0, 0.0, 0.0])
                .unwrap();
        let json = serde_json::to_string(&affine).unwrap();
        let mut restored: Affine = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, affine);
        restored.set_spacing(&[2.0, 1.0, 1.0]).unwrap();
        assert_eq!(restored.m_matrix().column(0), arr1(&[2.0, 0.0, 0.0]));
    }

    #[test]
    fn test_serde_rejects_inconsistent_parts() {
        let json = serde_json::json!({
            "matrix": Array2::<f64>::from_diag(&arr1(&[2.0, 1.0, 1.0])),
            "direction": Array2::<f64>::eye(2),
            "spacing": arr1(&[1.0, 1.0]),
        });
        let err = serde_json::from_value::<Affine>(json).unwrap_err();
        assert!(err.to_string().contains("column 0"), "{err}");

        let json = serde_json::json!({
            "matrix": Array2::<f64>::eye(3),
            "direction": Array2::<f64>::eye(3),
            "spacing": arr1(&[1.0, 1.0]),
        });
        assert!(serde_json::from_value::<Affine>(json).is_err());
    }
}
