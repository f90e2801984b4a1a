#![warn(missing_docs)]

//! Polyhedral die geometry for the dicebox simulation core.
//!
//! Pure, side-effect-free data: per-kind vertex and face tables, outward
//! face normals derived from the vertex data, face-to-value maps, and the
//! startup validation that keeps the rest of the system honest. Nothing
//! here touches the physics engine; the physics crate consumes these
//! tables to build collision shapes and read landed values.
//!
//! # Example
//!
//! ```
//! use dicebox_geometry::{DieKind, GeometryCatalog};
//!
//! let catalog = GeometryCatalog::new().expect("built-in tables are valid");
//! let d6 = catalog.get(DieKind::D6);
//! assert_eq!(d6.faces.len(), 6);
//! assert_eq!(d6.face_normals.len(), d6.faces.len());
//! ```

mod catalog;
mod error;
mod geometry;
mod kind;
mod tables;

pub use catalog::GeometryCatalog;
pub use error::GeometryError;
pub use geometry::{DieGeometry, Dir3, Point, Vec3};
pub use kind::{DieKind, FaceReadingConvention};
