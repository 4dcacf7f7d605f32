use std::collections::BTreeMap;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::affine::{Affine, AffineError};
use crate::convert::convert;
use crate::enums::CoordSys;
use crate::orientation::{self, OrientationError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetaDataError {
    #[error("Affine error: {0}")]
    Affine(#[from] AffineError),

    #[error("Orientation error: {0}")]
    Orientation(#[from] OrientationError),

    #[error("DICOM series must be right-handed, got {0}")]
    LeftHandedOrientation(String),
}

/// Spatial metadata of an image, handed between readers and writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaData {
    pub affine: Affine,
    /// Orientation of the image before it was reoriented on read.
    pub orig_ornt: Option<String>,
    pub coord_sys: CoordSys,
    /// Opaque header entries, keyed by tag.
    #[serde(default)]
    pub header: BTreeMap<String, String>,
}

impl MetaData {
    pub fn new(affine: Affine, orig_ornt: Option<String>, coord_sys: CoordSys) -> Self {
        Self {
            affine,
            orig_ornt,
            coord_sys,
            header: BTreeMap::new(),
        }
    }

    /// Current orientation, derived from the affine.
    pub fn ornt(&self) -> Result<String, MetaDataError> {
        Ok(self.affine.axcodes(self.coord_sys)?)
    }

    pub fn spacing(&self) -> ArrayView1<'_, f64> {
        self.affine.spacing()
    }

    pub fn origin(&self) -> ArrayView1<'_, f64> {
        self.affine.origin()
    }

    /// Move the affine and the original orientation to `dest`.
    pub fn convert(&mut self, dest: CoordSys) -> Result<(), MetaDataError> {
        if dest == self.coord_sys {
            return Ok(());
        }
        let (affine, mut axcodes) = convert(&self.affine, &[self.orig_ornt.as_deref()])?;
        debug!(from = %self.coord_sys, to = %dest, "converted metadata");
        self.affine = affine;
        self.orig_ornt = axcodes.pop().flatten();
        self.coord_sys = dest;
        Ok(())
    }

    /// Orientation to write a DICOM series with.
    ///
    /// Checks `desired`, or the current orientation if `None`. A left-handed
    /// orientation is turned right-handed by inverting its tertiary axis when
    /// `allow_reorient` is set, and rejected otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`MetaDataError::LeftHandedOrientation`] for a left-handed
    /// orientation when `allow_reorient` is false,
    /// [`MetaDataError::Orientation`] when `desired` is not a valid
    /// orientation, and [`MetaDataError::Affine`] when `desired` is `None`
    /// and the affine is not 3-D.
    pub fn check_dcm_ornt(
        &self,
        desired: Option<&str>,
        allow_reorient: bool,
    ) -> Result<String, MetaDataError> {
        let ornt = match desired {
            Some(desired) => desired.to_string(),
            None => self.ornt()?,
        };
        if orientation::is_right_handed(&ornt, self.coord_sys)? {
            return Ok(ornt);
        }
        if !allow_reorient {
            return Err(MetaDataError::LeftHandedOrientation(ornt));
        }

        let mut letters: Vec<char> = ornt.chars().collect();
        if let Some(tertiary) = letters.last_mut() {
            *tertiary = orientation::invert_axis_letter(*tertiary)?;
        }
        let right_handed: String = letters.into_iter().collect();
        debug!(%ornt, %right_handed, "reorienting DICOM series to a right-handed orientation");
        Ok(right_handed)
    }
}
