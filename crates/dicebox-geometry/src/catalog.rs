//! The validated catalog of all supported die geometries.

use std::collections::HashMap;

use crate::error::GeometryError;
use crate::geometry::DieGeometry;
use crate::kind::DieKind;
use crate::tables;

/// Immutable lookup of validated per-kind geometry tables.
///
/// Construction validates every table and fails on the first malformed
/// one, so a catalog in hand is a proof that all tables are sound. It is
/// the leaf dependency for the physics and roll layers; share it behind
/// an `Arc` when dice on multiple tables need it.
#[derive(Debug)]
pub struct GeometryCatalog {
    geometries: HashMap<DieKind, DieGeometry>,
}

impl GeometryCatalog {
    /// Build and validate the tables for all six kinds.
    pub fn new() -> Result<Self, GeometryError> {
        let mut geometries = HashMap::with_capacity(DieKind::ALL.len());
        for kind in DieKind::ALL {
            let geometry = tables::build(kind);
            geometry.validate()?;
            geometries.insert(kind, geometry);
        }
        Ok(GeometryCatalog { geometries })
    }

    /// Geometry table for `kind`.
    pub fn get(&self, kind: DieKind) -> &DieGeometry {
        // Every kind is inserted in `new`, so the lookup cannot miss.
        &self.geometries[&kind]
    }

    /// Re-run the validation checks for one kind.
    pub fn validate(&self, kind: DieKind) -> Result<(), GeometryError> {
        self.get(kind).validate()
    }
}
