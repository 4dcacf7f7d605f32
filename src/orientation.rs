//! Orientation codes.
//!
//! An orientation is written as three axis letters, one per spatial axis of
//! the image array, e.g. `"RAS"` or `"LPI"`. Each letter comes from a
//! different opposing pair (R/L, A/P, I/S), which gives exactly 48 valid
//! strings. The packed integer form follows itkSpatialOrientation: the
//! [`AxisCode`] of each letter is shifted by its [`AxisMajorness`] and the
//! three are summed.
//!
//! ```
//! use medspace::orientation;
//!
//! let code = orientation::encode("RAS").unwrap();
//! assert_eq!(code, 2 + (5 << 8) + (9 << 16));
//! assert_eq!(orientation::decode(code).unwrap().as_deref(), Some("RAS"));
//! assert_eq!(orientation::invert_axcodes(Some("SPL")).unwrap().as_deref(), Some("IAR"));
//! ```

use std::sync::LazyLock;

use ndarray::{Array2, ArrayView2};
use thiserror::Error;
use tracing::debug;

use crate::affine::determinant;
use crate::enums::{AxisCode, AxisMajorness, CoordSys};
use crate::two_way_dict::TwoWayDict;

/// Code of an unknown or missing orientation.
pub const INVALID: u32 = 0;

/// Number of valid orientations: 2 * 2 * 2 letters times 3! orderings.
pub const ORIENTATION_COUNT: usize = 48;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrientationError {
    #[error("Invalid axis code: {0:?}")]
    InvalidAxisCode(String),

    #[error("Unknown orientation code: {0}")]
    UnknownOrientationCode(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TableEntry {
    Invalid,
    Code(u32),
    Axcodes([AxisCode; 3]),
}

const OPPOSING_PAIRS: [(AxisCode, AxisCode); 3] = [
    (AxisCode::R, AxisCode::L),
    (AxisCode::A, AxisCode::P),
    (AxisCode::I, AxisCode::S),
];

// lexicographic permutations of three positions
const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

static ORIENTATION_TABLE: LazyLock<TwoWayDict<TableEntry>> = LazyLock::new(|| {
    let mut table = TwoWayDict::new();
    table.set(TableEntry::Invalid, TableEntry::Invalid);
    for axes in enumerate_orientations() {
        table.set(TableEntry::Axcodes(axes), TableEntry::Code(pack(&axes)));
    }
    debug!(orientations = table.len(), "built orientation code table");
    table
});

static AXES_INV: LazyLock<TwoWayDict<AxisCode>> =
    LazyLock::new(|| OPPOSING_PAIRS.into_iter().collect());

/// All 48 orientations: the product of the opposing pairs in R/L, A/P, I/S
/// order, each followed by its permutations.
fn enumerate_orientations() -> Vec<[AxisCode; 3]> {
    let mut orientations = Vec::with_capacity(ORIENTATION_COUNT);
    for first in [OPPOSING_PAIRS[0].0, OPPOSING_PAIRS[0].1] {
        for second in [OPPOSING_PAIRS[1].0, OPPOSING_PAIRS[1].1] {
            for third in [OPPOSING_PAIRS[2].0, OPPOSING_PAIRS[2].1] {
                let letters = [first, second, third];
                for perm in PERMUTATIONS {
                    orientations.push([letters[perm[0]], letters[perm[1]], letters[perm[2]]]);
                }
            }
        }
    }
    orientations
}

fn pack(axes: &[AxisCode; 3]) -> u32 {
    axes.iter()
        .zip(AxisMajorness::ALL)
        .map(|(axis, majorness)| axis.value() << majorness.shift())
        .sum()
}

fn axes_to_string(axes: &[AxisCode; 3]) -> String {
    axes.iter().map(|axis| axis.as_char()).collect()
}

/// Parse a 3-letter orientation with one letter from each opposing pair.
pub fn parse_axcodes(axcodes: &str) -> Result<[AxisCode; 3], OrientationError> {
    let invalid = || OrientationError::InvalidAxisCode(axcodes.to_string());

    let letters: Vec<AxisCode> = axcodes
        .chars()
        .map(AxisCode::from_char)
        .collect::<Option<_>>()
        .ok_or_else(invalid)?;
    let axes: [AxisCode; 3] = letters.try_into().map_err(|_| invalid())?;

    let mut seen = [false; 3];
    for axis in axes {
        if std::mem::replace(&mut seen[axis.pair()], true) {
            return Err(invalid());
        }
    }
    Ok(axes)
}

/// Pack an orientation string into its integer code.
///
/// # Errors
///
/// Returns [`OrientationError::InvalidAxisCode`] unless `axcodes` is three
/// letters taking one from each of R/L, A/P and I/S.
pub fn encode(axcodes: &str) -> Result<u32, OrientationError> {
    parse_axcodes(axcodes).map(|axes| pack(&axes))
}

/// [`encode`], mapping a missing orientation to [`INVALID`].
pub fn encode_opt(axcodes: Option<&str>) -> Result<u32, OrientationError> {
    axcodes.map_or(Ok(INVALID), encode)
}

/// Orientation string of a packed code; [`INVALID`] decodes to `None`.
///
/// # Errors
///
/// Returns [`OrientationError::UnknownOrientationCode`] for any code that is
/// neither [`INVALID`] nor one of the 48 packed orientations.
pub fn decode(code: u32) -> Result<Option<String>, OrientationError> {
    let key = if code == INVALID {
        TableEntry::Invalid
    } else {
        TableEntry::Code(code)
    };
    match ORIENTATION_TABLE.get(&key) {
        Ok(TableEntry::Axcodes(axes)) => Ok(Some(axes_to_string(axes))),
        Ok(TableEntry::Invalid) => Ok(None),
        _ => Err(OrientationError::UnknownOrientationCode(code)),
    }
}

/// The 48 valid orientation strings in enumeration order.
pub fn all_axcodes() -> Vec<String> {
    enumerate_orientations().iter().map(axes_to_string).collect()
}

pub fn invert_axis_letter(letter: char) -> Result<char, OrientationError> {
    AxisCode::from_char(letter)
        .and_then(|axis| AXES_INV.get(&axis).ok())
        .map(|inverse| inverse.as_char())
        .ok_or_else(|| OrientationError::InvalidAxisCode(letter.to_string()))
}

/// Invert every letter, keeping the order: `SPL` -> `IAR`.
pub fn invert_axcodes(axcodes: Option<&str>) -> Result<Option<String>, OrientationError> {
    axcodes
        .map(|axcodes| {
            axcodes
                .chars()
                .map(invert_axis_letter)
                .collect::<Result<String, _>>()
        })
        .transpose()
}

// Letters of the positive and negative direction of each world axis.
fn world_letters(coord_sys: CoordSys) -> [(AxisCode, AxisCode); 3] {
    match coord_sys {
        // RAS+ world, letters name where the axis points to
        CoordSys::Nib => [
            (AxisCode::R, AxisCode::L),
            (AxisCode::A, AxisCode::P),
            (AxisCode::S, AxisCode::I),
        ],
        // LPS world, letters name where the axis comes from
        CoordSys::Itk => [
            (AxisCode::R, AxisCode::L),
            (AxisCode::A, AxisCode::P),
            (AxisCode::I, AxisCode::S),
        ],
    }
}

/// Signed permutation matrix whose columns point along the given axes.
pub fn direction_from_axcodes(
    axcodes: &str,
    coord_sys: CoordSys,
) -> Result<Array2<f64>, OrientationError> {
    let axes = parse_axcodes(axcodes)?;
    let letters = world_letters(coord_sys);
    let mut direction = Array2::zeros((3, 3));
    for (col, axis) in axes.iter().enumerate() {
        let row = axis.pair();
        direction[(row, col)] = if letters[row].0 == *axis { 1.0 } else { -1.0 };
    }
    Ok(direction)
}

/// Orientation string of a 3x3 direction matrix.
///
/// Each column is assigned the world axis it is most aligned with, taking
/// the largest components first so that every world axis is used once.
pub fn axcodes_from_direction(
    direction: ArrayView2<'_, f64>,
    coord_sys: CoordSys,
) -> Result<String, OrientationError> {
    if direction.dim() != (3, 3) {
        return Err(OrientationError::InvalidAxisCode(format!(
            "direction of shape {:?}",
            direction.dim()
        )));
    }

    let mut candidates: Vec<(f64, usize, usize)> = direction
        .indexed_iter()
        .map(|((row, col), value)| (value.abs(), row, col))
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

    let letters = world_letters(coord_sys);
    let mut row_used = [false; 3];
    let mut axes: [Option<AxisCode>; 3] = [None; 3];
    for (magnitude, row, col) in candidates {
        if row_used[row] || axes[col].is_some() || magnitude == 0.0 {
            continue;
        }
        row_used[row] = true;
        axes[col] = Some(if direction[(row, col)] > 0.0 {
            letters[row].0
        } else {
            letters[row].1
        });
    }

    axes.iter()
        .map(|axis| axis.map(AxisCode::as_char))
        .collect::<Option<String>>()
        .ok_or_else(|| OrientationError::InvalidAxisCode("degenerate direction".to_string()))
}

/// Whether the axes form a right-handed frame (positive determinant).
pub fn is_right_handed(axcodes: &str, coord_sys: CoordSys) -> Result<bool, OrientationError> {
    let direction = direction_from_axcodes(axcodes, coord_sys)?;
    Ok(determinant(direction.view()) > 0.0)
}
