//! Per-kind die geometry tables and their validation.

use nalgebra::{Point3, Unit, Vector3};

use crate::error::GeometryError;
use crate::kind::{DieKind, FaceReadingConvention};

/// A point in the die's local frame.
pub type Point = Point3<f32>;
/// A vector in the die's local frame.
pub type Vec3 = Vector3<f32>;
/// A unit direction in the die's local frame.
pub type Dir3 = Unit<Vector3<f32>>;

/// Immutable geometry table for one die kind.
///
/// Vertices and faces describe the unscaled unit polyhedron; the physics
/// layer applies `scale_factor` when building collision shapes. Face
/// normals are derived from the vertex data at construction time rather
/// than stored as literal constants, so they stay exact under any edit to
/// the vertex tables.
#[derive(Debug, Clone)]
pub struct DieGeometry {
    /// Which kind this table describes.
    pub kind: DieKind,
    /// Ordered vertex positions.
    pub vertices: Vec<Point>,
    /// Ordered per-face vertex index lists. Triangles for the d4/d8/d20,
    /// quads for the d6, kites for the d10, pentagons for the d12.
    pub faces: Vec<Vec<usize>>,
    /// Outward unit normal for each face, parallel to `faces`.
    pub face_normals: Vec<Dir3>,
    /// Shown value per face; 0 marks a structural face with no value.
    pub face_values: Vec<u32>,
    /// Inverse map: `value_to_face[value - 1]` is the face showing `value`.
    pub value_to_face: Vec<usize>,
    /// Uniform scale applied when building the physical shape.
    pub scale_factor: f32,
    /// Body mass handed to the physics layer.
    pub mass: f32,
    /// Chamfer amount used by mesh generation (rendering collaborator).
    pub chamfer: f32,
    /// Face-tab tuning used by mesh generation.
    pub tab: f32,
    /// Face-angle tuning used by mesh generation.
    pub af: f32,
    /// Label inset used by texture generation.
    pub text_margin: f32,
    /// True when the value is read from the face touching the ground.
    pub invert_upside: bool,
}

impl DieGeometry {
    /// Assemble a table from raw vertex/face/value data, deriving normals
    /// and the inverse value map.
    pub(crate) fn assemble(
        kind: DieKind,
        vertices: Vec<Point>,
        faces: Vec<Vec<usize>>,
        face_values: Vec<u32>,
        tuning: Tuning,
    ) -> Self {
        let face_normals = faces
            .iter()
            .map(|face| derive_face_normal(&vertices, face))
            .collect();

        let max_value = kind.value_count() as usize;
        let mut value_to_face = vec![usize::MAX; max_value];
        for (face, &value) in face_values.iter().enumerate() {
            if value > 0 && (value as usize) <= max_value {
                value_to_face[value as usize - 1] = face;
            }
        }

        DieGeometry {
            kind,
            vertices,
            faces,
            face_normals,
            face_values,
            value_to_face,
            scale_factor: tuning.scale_factor,
            mass: tuning.mass,
            chamfer: tuning.chamfer,
            tab: tuning.tab,
            af: tuning.af,
            text_margin: tuning.text_margin,
            invert_upside: kind.reading_convention() == FaceReadingConvention::Downward,
        }
    }

    /// Check every structural invariant of the table.
    ///
    /// A failure here must abort startup; the rest of the system assumes
    /// validated tables.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let kind = self.kind;
        let (expected_vertices, expected_faces) = expected_counts(kind);

        if self.vertices.len() != expected_vertices {
            return Err(GeometryError::VertexCount {
                kind,
                expected: expected_vertices,
                found: self.vertices.len(),
            });
        }
        if self.faces.len() != expected_faces {
            return Err(GeometryError::FaceCount {
                kind,
                expected: expected_faces,
                found: self.faces.len(),
            });
        }
        if self.face_normals.len() != self.faces.len() {
            return Err(GeometryError::NormalCount {
                kind,
                faces: self.faces.len(),
                normals: self.face_normals.len(),
            });
        }

        for (i, face) in self.faces.iter().enumerate() {
            if !allowed_arities(kind).contains(&face.len()) {
                return Err(GeometryError::FaceArity {
                    kind,
                    face: i,
                    arity: face.len(),
                });
            }
            for &index in face {
                if index >= self.vertices.len() {
                    return Err(GeometryError::VertexIndex {
                        kind,
                        face: i,
                        index,
                        count: self.vertices.len(),
                    });
                }
            }
        }

        // Normals must point away from the solid's interior. All tables
        // are centered on the origin, so the face centroid gives the
        // outward side.
        for (i, (face, normal)) in self.faces.iter().zip(&self.face_normals).enumerate() {
            let centroid = face
                .iter()
                .fold(Vec3::zeros(), |acc, &v| acc + self.vertices[v].coords)
                / face.len() as f32;
            if !normal.dot(&centroid).is_finite() || normal.dot(&centroid) <= 0.0 {
                return Err(GeometryError::BadNormal { kind, face: i });
            }
        }

        self.validate_values()?;

        if self.invert_upside != (kind.reading_convention() == FaceReadingConvention::Downward) {
            return Err(GeometryError::ReadingConvention {
                kind,
                found: self.invert_upside,
            });
        }

        if kind == DieKind::D6 {
            self.validate_opposite_sums()?;
        }

        Ok(())
    }

    /// The non-zero face values must be exactly `{1..=N}`, once each.
    fn validate_values(&self) -> Result<(), GeometryError> {
        let kind = self.kind;
        let n = kind.value_count();

        if self.face_values.len() != self.faces.len() {
            return Err(GeometryError::ValuePermutation {
                kind,
                expected: n,
                reason: format!(
                    "{} values for {} faces",
                    self.face_values.len(),
                    self.faces.len()
                ),
            });
        }

        let mut seen = vec![false; n as usize];
        for &value in &self.face_values {
            if value == 0 {
                continue;
            }
            if value > n {
                return Err(GeometryError::ValuePermutation {
                    kind,
                    expected: n,
                    reason: format!("value {} out of range", value),
                });
            }
            let slot = &mut seen[value as usize - 1];
            if *slot {
                return Err(GeometryError::ValuePermutation {
                    kind,
                    expected: n,
                    reason: format!("value {} appears twice", value),
                });
            }
            *slot = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(GeometryError::ValuePermutation {
                kind,
                expected: n,
                reason: format!("value {} missing", missing + 1),
            });
        }

        // The inverse map must agree with the forward table.
        for (value_index, &face) in self.value_to_face.iter().enumerate() {
            if face >= self.faces.len() || self.face_values[face] != value_index as u32 + 1 {
                return Err(GeometryError::ValuePermutation {
                    kind,
                    expected: n,
                    reason: format!("value_to_face broken for value {}", value_index + 1),
                });
            }
        }

        Ok(())
    }

    /// A standard d6 shows 7 minus the bottom value on top: every pair of
    /// opposing faces sums to 7.
    fn validate_opposite_sums(&self) -> Result<(), GeometryError> {
        for (i, normal) in self.face_normals.iter().enumerate() {
            let opposite = self
                .face_normals
                .iter()
                .position(|other| (normal.as_ref() + other.as_ref()).norm() < 1e-4);
            match opposite {
                Some(j) => {
                    let (a, b) = (self.face_values[i], self.face_values[j]);
                    if a + b != 7 {
                        return Err(GeometryError::OppositeSum { a, b });
                    }
                }
                None => {
                    return Err(GeometryError::BadNormal {
                        kind: self.kind,
                        face: i,
                    })
                }
            }
        }
        Ok(())
    }

    /// Vertices scaled for collision-shape construction.
    pub fn scaled_vertices(&self) -> Vec<Point> {
        self.vertices
            .iter()
            .map(|v| Point::from(v.coords * self.scale_factor))
            .collect()
    }
}

/// Per-kind shape and mass tuning carried alongside the vertex tables.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Tuning {
    pub scale_factor: f32,
    pub mass: f32,
    pub chamfer: f32,
    pub tab: f32,
    pub af: f32,
    pub text_margin: f32,
}

/// Expected `(vertices, faces)` for each kind's polyhedron.
fn expected_counts(kind: DieKind) -> (usize, usize) {
    match kind {
        DieKind::D4 => (4, 4),
        DieKind::D6 => (8, 6),
        DieKind::D8 => (6, 8),
        DieKind::D10 => (12, 10),
        DieKind::D12 => (20, 12),
        DieKind::D20 => (12, 20),
    }
}

/// Vertex counts a face may legally have for each kind.
fn allowed_arities(kind: DieKind) -> &'static [usize] {
    match kind {
        DieKind::D4 | DieKind::D8 | DieKind::D20 => &[3],
        DieKind::D6 => &[4],
        // The trapezohedron's kites are quads, but a triangulated band is
        // also accepted for this kind.
        DieKind::D10 => &[3, 4],
        DieKind::D12 => &[5],
    }
}

/// Newell's method over the face perimeter, normalized and oriented
/// outward. Robust for the near-planar kite faces of the d10.
fn derive_face_normal(vertices: &[Point], face: &[usize]) -> Dir3 {
    let mut n = Vec3::zeros();
    for i in 0..face.len() {
        let a = vertices[face[i]];
        let b = vertices[face[(i + 1) % face.len()]];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }

    let centroid = face
        .iter()
        .fold(Vec3::zeros(), |acc, &v| acc + vertices[v].coords)
        / face.len() as f32;
    if n.dot(&centroid) < 0.0 {
        n = -n;
    }
    Unit::new_normalize(n)
}
