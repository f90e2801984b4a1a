//! Error types for die geometry validation.

use thiserror::Error;

use crate::kind::DieKind;

/// Errors that can occur while building or validating die geometry.
///
/// Any of these is fatal at startup: a catalog with a malformed table
/// must never become usable.
#[derive(Error, Debug)]
pub enum GeometryError {
    /// Vertex count does not match the kind's polyhedron.
    #[error("{kind}: expected {expected} vertices, found {found}")]
    VertexCount {
        /// Die kind being validated.
        kind: DieKind,
        /// Expected vertex count.
        expected: usize,
        /// Actual vertex count.
        found: usize,
    },

    /// Face count does not match the kind's polyhedron.
    #[error("{kind}: expected {expected} faces, found {found}")]
    FaceCount {
        /// Die kind being validated.
        kind: DieKind,
        /// Expected face count.
        expected: usize,
        /// Actual face count.
        found: usize,
    },

    /// A face has the wrong number of vertices for its kind.
    #[error("{kind}: face {face} has {arity} vertices, which is invalid for this kind")]
    FaceArity {
        /// Die kind being validated.
        kind: DieKind,
        /// Index of the offending face.
        face: usize,
        /// Number of vertices in the face.
        arity: usize,
    },

    /// A face references a vertex index outside the vertex table.
    #[error("{kind}: face {face} references vertex {index} (only {count} vertices)")]
    VertexIndex {
        /// Die kind being validated.
        kind: DieKind,
        /// Index of the offending face.
        face: usize,
        /// Out-of-range vertex index.
        index: usize,
        /// Number of vertices in the table.
        count: usize,
    },

    /// The per-face normal table is out of sync with the face table.
    #[error("{kind}: {faces} faces but {normals} face normals")]
    NormalCount {
        /// Die kind being validated.
        kind: DieKind,
        /// Number of faces.
        faces: usize,
        /// Number of normals.
        normals: usize,
    },

    /// A derived face normal is degenerate or points inward.
    #[error("{kind}: face {face} has a degenerate or inward normal")]
    BadNormal {
        /// Die kind being validated.
        kind: DieKind,
        /// Index of the offending face.
        face: usize,
    },

    /// The non-zero face values are not a permutation of `1..=N`.
    #[error("{kind}: face values are not a permutation of 1..={expected}: {reason}")]
    ValuePermutation {
        /// Die kind being validated.
        kind: DieKind,
        /// Highest face value for this kind.
        expected: u32,
        /// What went wrong.
        reason: String,
    },

    /// Opposite faces of the six-sided die must sum to 7.
    #[error("d6: opposite faces show {a} and {b}, which do not sum to 7")]
    OppositeSum {
        /// Value on one face of the pair.
        a: u32,
        /// Value on the opposing face.
        b: u32,
    },

    /// `invert_upside` disagrees with the kind's reading convention.
    #[error("{kind}: invert_upside={found} disagrees with the kind's reading convention")]
    ReadingConvention {
        /// Die kind being validated.
        kind: DieKind,
        /// The flag as stored in the table.
        found: bool,
    },
}
