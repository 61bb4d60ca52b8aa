use super::builder::SheetBuilder;
use super::mesh::Epithelium;
use super::segment::Segment;
use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

const AXIAL_PATCH: [(i32, i32); 7] = [(0, 0), (1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

/// Seven pointy-top hexagons of circumradius 1: one central cell and its ring.
pub fn hexagonal_patch() -> Epithelium {
    hexagonal_patch_with(Segment::Apical, "hexagons")
}

pub fn hexagonal_patch_with(segment: Segment, identifier: &str) -> Epithelium {
    let mut builder = SheetBuilder::new(identifier);
    builder.segment(segment);
    let mut seen: HashMap<(i64, i64), usize> = HashMap::new();
    for &(q, r) in &AXIAL_PATCH {
        let cx = 3f64.sqrt() * (q as f64 + r as f64 / 2.0);
        let cy = 1.5 * r as f64;
        let mut polygon = Vec::with_capacity(6);
        for i in 0..6 {
            let angle = (60.0 * i as f64 - 30.0).to_radians();
            let (x, y) = (cx + angle.cos(), cy + angle.sin());
            let key = ((x * 1e6).round() as i64, (y * 1e6).round() as i64);
            let id = *seen
                .entry(key)
                .or_insert_with(|| builder.add_vertex(Point3::new(x, y, 0.0)));
            polygon.push(id);
        }
        builder.add_face(&polygon);
    }
    builder.build().unwrap()
}

/// `nx` by `ny` unit squares in the xy plane, wound counter-clockwise.
pub fn quad_grid(nx: usize, ny: usize) -> Epithelium {
    let mut builder = SheetBuilder::new("grid");
    let id = |i: usize, j: usize| j * (nx + 1) + i;
    for j in 0..=ny {
        for i in 0..=nx {
            builder.add_vertex(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    for j in 0..ny {
        for i in 0..nx {
            builder.add_face(&[id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    builder.build().unwrap()
}

/// Deterministic, non-symmetric offsets so finite-difference checks do not
/// sit on symmetric configurations.
pub fn jitter(mesh: &mut Epithelium, amplitude: f64) {
    let offsets: Vec<Vector3<f64>> = (0..mesh.n_verts())
        .map(|v| {
            let t = v as f64 + 1.0;
            amplitude
                * Vector3::new((1.3 * t).sin(), (2.1 * t).cos(), 0.5 * (0.7 * t).sin())
        })
        .collect();
    mesh.translate_vertices(&offsets).unwrap();
}

/// Asserts two floats agree to a relative tolerance, with an absolute floor.
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance * scale,
        "expected {expected}, got {actual}"
    );
}
