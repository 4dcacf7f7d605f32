//! # medspace
//!
//! This crate holds the spatial bookkeeping shared by medical image readers
//! and writers: the affine that maps array indices to physical coordinates,
//! the orientation codes used to request a reorientation, and the
//! conversion between the ITK (LPS) and nibabel (RAS) conventions.
//!
//! File formats are not handled here. An I/O layer reads the direction,
//! spacing and origin (or a raw matrix) from a file, builds an [`Affine`],
//! and hands orientation strings or packed codes to whichever toolkit does
//! the actual reorientation.
//!
//!  - [`Affine`]: `(d+1)x(d+1)` matrix, d in {2, 3}, kept decomposed into
//!    direction, spacing and origin
//!  - [`orientation`]: the 48 valid orientation strings and their packed
//!    integer codes
//!  - [`convert`]: ITK <-> nibabel conversion of affines and orientations
//!  - [`MetaData`]: affine, original orientation and convention of an image
//!  - [`TwoWayDict`]: symmetric lookup table backing the orientation codes
//!
//! The orientation tables are built once on first use and never mutated, so
//! they can be read from any number of threads. An [`Affine`] is a plain
//! value; share it immutably or clone it.
//!
//! # Examples
//!
//! ## Reading an image in ITK and handing it to nibabel
//!
//! ```
//! # use medspace::{Affine, CoordSys, MetaData};
//! # use ndarray::Array2;
//! let affine = Affine::from_components(
//!     &Array2::<f64>::eye(3),
//!     &[0.8, 0.8, 2.5],
//!     &[-120.0, -95.0, 40.0],
//! )
//! .expect("should have built affine from components");
//! let mut metadata = MetaData::new(affine, Some("LPS".to_string()), CoordSys::Itk);
//! assert_eq!(metadata.ornt().unwrap(), "RAI");
//!
//! metadata
//!     .convert(CoordSys::Nib)
//!     .expect("should have converted to nibabel convention");
//! assert_eq!(metadata.ornt().unwrap(), "LPS");
//! assert_eq!(metadata.orig_ornt.as_deref(), Some("RAI"));
//! ```
//!
//! ## Packing an orientation for a reorientation filter
//!
//! ```
//! # use medspace::orientation;
//! let code = orientation::encode("LPI").expect("should have encoded orientation");
//! assert_eq!(orientation::decode(code).unwrap().as_deref(), Some("LPI"));
//! ```

pub mod affine;
pub mod convert;
pub mod enums;
pub mod metadata;
pub mod orientation;
pub mod two_way_dict;

pub use affine::{Affine, AffineError};
pub use enums::{AxisCode, AxisMajorness, CoordSys};
pub use metadata::{MetaData, MetaDataError};
pub use orientation::OrientationError;
pub use two_way_dict::{TwoWayDict, TwoWayDictError};
