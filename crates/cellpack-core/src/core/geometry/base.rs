use super::{fields, normalize_angle};
use crate::core::models::columns::ConfigurationError;
use crate::core::models::mesh::Epithelium;
use nalgebra::Vector3;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Edge, face and cell geometry computed from vertex positions.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseGeometry {
    pub displacement: Vec<Vector3<f64>>,
    pub length: Vec<f64>,
    pub orientation: Vec<f64>,
    /// `0.5 * Σ r_s × r_t` over the face cycle.
    pub vector_area: Vec<Vector3<f64>>,
    pub area: Vec<f64>,
    pub perimeter: Vec<f64>,
    pub normal: Vec<Vector3<f64>>,
    pub volume: Vec<f64>,
}

impl BaseGeometry {
    pub fn compute(mesh: &Epithelium) -> Self {
        let positions: Vec<Vector3<f64>> =
            mesh.vertices().iter().map(|v| v.position.coords).collect();

        #[cfg(not(feature = "parallel"))]
        let edges = mesh.edges().iter();
        #[cfg(feature = "parallel")]
        let edges = mesh.edges().par_iter();

        let displacement: Vec<Vector3<f64>> = edges
            .map(|e| positions[e.trgt] - positions[e.srce])
            .collect();
        let length: Vec<f64> = displacement.iter().map(|d| d.norm()).collect();
        let orientation: Vec<f64> = displacement
            .iter()
            .map(|d| normalize_angle(d.y.atan2(d.x)))
            .collect();

        let mut vector_area = Vec::with_capacity(mesh.n_faces());
        let mut perimeter = Vec::with_capacity(mesh.n_faces());
        for face in 0..mesh.n_faces() {
            let mut sum = Vector3::zeros();
            let mut p = 0.0;
            for &e in mesh.face_edges(face) {
                let edge = &mesh.edges()[e];
                sum += positions[edge.srce].cross(&positions[edge.trgt]);
                p += length[e];
            }
            vector_area.push(0.5 * sum);
            perimeter.push(p);
        }
        let area: Vec<f64> = vector_area.iter().map(|a| a.norm()).collect();
        let normal: Vec<Vector3<f64>> = vector_area
            .iter()
            .zip(&area)
            .map(|(a, &norm)| if norm > 0.0 { a / norm } else { Vector3::zeros() })
            .collect();

        let volume = (0..mesh.n_cells())
            .map(|cell| {
                mesh.cell_faces(cell)
                    .into_iter()
                    .map(|face| {
                        let cycle = mesh.face_edges(face);
                        let centroid = cycle
                            .iter()
                            .map(|&e| positions[mesh.edges()[e].srce])
                            .sum::<Vector3<f64>>()
                            / cycle.len() as f64;
                        cycle
                            .iter()
                            .map(|&e| {
                                let edge = &mesh.edges()[e];
                                centroid.dot(&positions[edge.srce].cross(&positions[edge.trgt]))
                            })
                            .sum::<f64>()
                    })
                    .sum::<f64>()
                    / 6.0
            })
            .collect();

        Self {
            displacement,
            length,
            orientation,
            vector_area,
            area,
            perimeter,
            normal,
            volume,
        }
    }

    pub(crate) fn write(&self, mesh: &mut Epithelium) -> Result<(), ConfigurationError> {
        let edges = mesh.edge_data_mut();
        edges.insert(fields::DX, self.displacement.iter().map(|d| d.x).collect())?;
        edges.insert(fields::DY, self.displacement.iter().map(|d| d.y).collect())?;
        edges.insert(fields::DZ, self.displacement.iter().map(|d| d.z).collect())?;
        edges.insert(fields::LENGTH, self.length.clone())?;
        edges.insert(fields::ORIENTATION, self.orientation.clone())?;

        let faces = mesh.face_data_mut();
        faces.insert(fields::AREA, self.area.clone())?;
        faces.insert(fields::PERIMETER, self.perimeter.clone())?;
        faces.insert(fields::NX, self.normal.iter().map(|n| n.x).collect())?;
        faces.insert(fields::NY, self.normal.iter().map(|n| n.y).collect())?;
        faces.insert(fields::NZ, self.normal.iter().map(|n| n.z).collect())?;

        mesh.cell_data_mut()
            .insert(fields::VOLUME, self.volume.clone())?;
        Ok(())
    }
}
