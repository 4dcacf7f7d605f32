use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Single-axis direction code. The discriminants are the values packed
/// into an orientation code, see [`crate::orientation::encode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AxisCode {
    /// Right
    R = 2,
    /// Left
    L = 3,
    /// Posterior
    P = 4,
    /// Anterior
    A = 5,
    /// Inferior
    I = 8,
    /// Superior
    S = 9,
}

impl AxisCode {
    pub const ALL: [AxisCode; 6] = [
        AxisCode::R,
        AxisCode::L,
        AxisCode::P,
        AxisCode::A,
        AxisCode::I,
        AxisCode::S,
    ];

    pub fn from_char(letter: char) -> Option<Self> {
        match letter {
            'R' => Some(AxisCode::R),
            'L' => Some(AxisCode::L),
            'P' => Some(AxisCode::P),
            'A' => Some(AxisCode::A),
            'I' => Some(AxisCode::I),
            'S' => Some(AxisCode::S),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AxisCode::R => 'R',
            AxisCode::L => 'L',
            AxisCode::P => 'P',
            AxisCode::A => 'A',
            AxisCode::I => 'I',
            AxisCode::S => 'S',
        }
    }

    /// Index of the opposing pair this letter belongs to:
    /// 0 for R/L, 1 for A/P, 2 for I/S.
    pub fn pair(self) -> usize {
        match self {
            AxisCode::R | AxisCode::L => 0,
            AxisCode::A | AxisCode::P => 1,
            AxisCode::I | AxisCode::S => 2,
        }
    }

    pub fn value(self) -> u32 {
        self as u32
    }
}

/// Bit offset of each axis inside a packed orientation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AxisMajorness {
    Primary = 0,
    Secondary = 8,
    Tertiary = 16,
}

impl AxisMajorness {
    pub const ALL: [AxisMajorness; 3] = [
        AxisMajorness::Primary,
        AxisMajorness::Secondary,
        AxisMajorness::Tertiary,
    ];

    pub fn shift(self) -> u32 {
        self as u32
    }
}

/// Anatomical coordinate-system convention of an affine.
///
/// In `Nib` every axis letter names the direction the axis points *to*
/// (RAS+: L -> R, P -> A, I -> S). `Itk` names the direction it comes
/// *from*, so the same image is RAS in one and LPI in the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSys {
    #[default]
    Itk,
    Nib,
}

impl CoordSys {
    pub fn other(self) -> Self {
        match self {
            CoordSys::Itk => CoordSys::Nib,
            CoordSys::Nib => CoordSys::Itk,
        }
    }
}

impl fmt::Display for CoordSys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordSys::Itk => f.write_str("itk"),
            CoordSys::Nib => f.write_str("nib"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown coordinate system: {0}")]
pub struct ParseCoordSysError(pub String);

impl FromStr for CoordSys {
    type Err = ParseCoordSysError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "itk" => Ok(CoordSys::Itk),
            "nib" | "nibabel" => Ok(CoordSys::Nib),
            _ => Err(ParseCoordSysError(s.to_string())),
        }
    }
}
