//! Vertex, face, and value tables for the six supported polyhedra.
//!
//! The tables describe unit-scale solids centered on the origin. Face
//! normals are not listed here; they are derived from the vertex data
//! when each table is assembled.

use std::f32::consts::PI;

use crate::geometry::{DieGeometry, Point, Tuning};
use crate::kind::DieKind;

/// Build the geometry table for one kind.
pub(crate) fn build(kind: DieKind) -> DieGeometry {
    match kind {
        DieKind::D4 => d4(),
        DieKind::D6 => d6(),
        DieKind::D8 => d8(),
        DieKind::D10 => d10(),
        DieKind::D12 => d12(),
        DieKind::D20 => d20(),
    }
}

fn points(raw: &[[f32; 3]]) -> Vec<Point> {
    raw.iter().map(|v| Point::new(v[0], v[1], v[2])).collect()
}

fn faces(raw: &[&[usize]]) -> Vec<Vec<usize>> {
    raw.iter().map(|f| f.to_vec()).collect()
}

/// Regular tetrahedron. Reads downward: when a d4 lands, its apex points
/// up and the value sits on the face against the floor.
fn d4() -> DieGeometry {
    let vertices = points(&[
        [1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
    ]);
    let face_list = faces(&[&[1, 0, 2], &[0, 1, 3], &[0, 3, 2], &[1, 2, 3]]);
    DieGeometry::assemble(
        DieKind::D4,
        vertices,
        face_list,
        vec![1, 2, 3, 4],
        Tuning {
            scale_factor: 1.2,
            mass: 300.0,
            chamfer: 0.96,
            tab: -0.1,
            af: PI * 7.0 / 6.0,
            text_margin: 2.0,
        },
    )
}

/// Cube. Face order pairs opposing faces so the 7-sum invariant is easy
/// to see: 1/6 on z, 2/5 on x, 3/4 on y.
fn d6() -> DieGeometry {
    let vertices = points(&[
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ]);
    let face_list = faces(&[
        &[0, 3, 2, 1],
        &[1, 2, 6, 5],
        &[0, 1, 5, 4],
        &[3, 7, 6, 2],
        &[0, 4, 7, 3],
        &[4, 5, 6, 7],
    ]);
    DieGeometry::assemble(
        DieKind::D6,
        vertices,
        face_list,
        vec![1, 2, 3, 4, 5, 6],
        Tuning {
            scale_factor: 0.9,
            mass: 300.0,
            chamfer: 0.96,
            tab: 0.1,
            af: PI / 4.0,
            text_margin: 1.0,
        },
    )
}

/// Regular octahedron.
fn d8() -> DieGeometry {
    let vertices = points(&[
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ]);
    let face_list = faces(&[
        &[0, 2, 4],
        &[0, 4, 3],
        &[0, 3, 5],
        &[0, 5, 2],
        &[1, 3, 4],
        &[1, 4, 2],
        &[1, 2, 5],
        &[1, 5, 3],
    ]);
    DieGeometry::assemble(
        DieKind::D8,
        vertices,
        face_list,
        vec![1, 2, 3, 4, 5, 6, 7, 8],
        Tuning {
            scale_factor: 1.0,
            mass: 340.0,
            chamfer: 0.965,
            tab: 0.0,
            af: -PI / 8.0,
            text_margin: 1.2,
        },
    )
}

/// Pentagonal trapezohedron: ten band vertices alternating above and
/// below the equator, plus two poles. Each value face is a kite of four
/// vertices, five per pole.
fn d10() -> DieGeometry {
    let mut vertices = Vec::with_capacity(12);
    for i in 0..10 {
        let angle = i as f32 * PI / 5.0;
        let height = if i % 2 == 1 { 0.105 } else { -0.105 };
        vertices.push(Point::new(angle.cos(), angle.sin(), height));
    }
    vertices.push(Point::new(0.0, 0.0, -1.0)); // 10: bottom pole
    vertices.push(Point::new(0.0, 0.0, 1.0)); // 11: top pole

    let mut face_list = Vec::with_capacity(10);
    let mut face_values = Vec::with_capacity(10);
    for k in 0..5 {
        // Top kite: raised wings 2k+1 and 2k+3 around the lowered far
        // vertex 2k+2.
        face_list.push(vec![11, 2 * k + 1, (2 * k + 2) % 10, (2 * k + 3) % 10]);
        face_values.push(2 * k as u32 + 1);
    }
    for k in 0..5 {
        face_list.push(vec![10, 2 * k, 2 * k + 1, (2 * k + 2) % 10]);
        face_values.push(2 * k as u32 + 2);
    }

    DieGeometry::assemble(
        DieKind::D10,
        vertices,
        face_list,
        face_values,
        Tuning {
            scale_factor: 0.9,
            mass: 350.0,
            chamfer: 0.945,
            tab: 0.0,
            af: PI * 6.0 / 5.0,
            text_margin: 1.0,
        },
    )
}

/// Regular dodecahedron on the golden ratio.
fn d12() -> DieGeometry {
    let p = (1.0 + 5.0f32.sqrt()) / 2.0;
    let q = 1.0 / p;
    let vertices = points(&[
        [0.0, q, p],
        [0.0, q, -p],
        [0.0, -q, p],
        [0.0, -q, -p],
        [p, 0.0, q],
        [p, 0.0, -q],
        [-p, 0.0, q],
        [-p, 0.0, -q],
        [q, p, 0.0],
        [q, -p, 0.0],
        [-q, p, 0.0],
        [-q, -p, 0.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, -1.0, -1.0],
    ]);
    let face_list = faces(&[
        &[2, 14, 4, 12, 0],
        &[15, 9, 11, 19, 3],
        &[16, 10, 17, 7, 6],
        &[6, 7, 19, 11, 18],
        &[6, 18, 2, 0, 16],
        &[18, 11, 9, 14, 2],
        &[1, 17, 10, 8, 13],
        &[1, 13, 5, 15, 3],
        &[13, 8, 12, 4, 5],
        &[5, 4, 14, 9, 15],
        &[0, 12, 8, 10, 16],
        &[3, 19, 7, 17, 1],
    ]);
    DieGeometry::assemble(
        DieKind::D12,
        vertices,
        face_list,
        (1..=12).collect(),
        Tuning {
            scale_factor: 0.9,
            mass: 350.0,
            chamfer: 0.968,
            tab: 0.2,
            af: -PI / 8.0,
            text_margin: 1.0,
        },
    )
}

/// Regular icosahedron on the golden ratio.
fn d20() -> DieGeometry {
    let t = (1.0 + 5.0f32.sqrt()) / 2.0;
    let vertices = points(&[
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]);
    let face_list = faces(&[
        &[0, 11, 5],
        &[0, 5, 1],
        &[0, 1, 7],
        &[0, 7, 10],
        &[0, 10, 11],
        &[1, 5, 9],
        &[5, 11, 4],
        &[11, 10, 2],
        &[10, 7, 6],
        &[7, 1, 8],
        &[3, 9, 4],
        &[3, 4, 2],
        &[3, 2, 6],
        &[3, 6, 8],
        &[3, 8, 9],
        &[4, 9, 5],
        &[2, 4, 11],
        &[6, 2, 10],
        &[8, 6, 7],
        &[9, 8, 1],
    ]);
    DieGeometry::assemble(
        DieKind::D20,
        vertices,
        face_list,
        (1..=20).collect(),
        Tuning {
            scale_factor: 1.0,
            mass: 400.0,
            chamfer: 0.955,
            tab: -0.2,
            af: -PI / 8.0,
            text_margin: 1.0,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_validates() {
        for kind in DieKind::ALL {
            build(kind).validate().unwrap_or_else(|e| panic!("{}", e));
        }
    }

    #[test]
    fn d10_faces_are_kites() {
        let geometry = build(DieKind::D10);
        assert!(geometry.faces.iter().all(|f| f.len() == 4));
        // Five kites per pole.
        let top = geometry.faces.iter().filter(|f| f.contains(&11)).count();
        let bottom = geometry.faces.iter().filter(|f| f.contains(&10)).count();
        assert_eq!((top, bottom), (5, 5));
    }

    #[test]
    fn d12_faces_are_pentagons() {
        let geometry = build(DieKind::D12);
        assert!(geometry.faces.iter().all(|f| f.len() == 5));
    }
}
