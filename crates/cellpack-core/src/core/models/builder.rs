use super::columns::Columns;
use super::mesh::{Epithelium, Face, HalfEdge, Vertex};
use super::segment::{Element, Segment};
use crate::core::topology::TopologyError;
use nalgebra::Point3;
use std::collections::BTreeMap;

/// Builds a 2D sheet from explicit vertex positions and polygons.
///
/// Each polygon lists vertex ids in counter-clockwise order and becomes one
/// face whose half-edges follow that order.
pub struct SheetBuilder {
    identifier: String,
    segment: Segment,
    positions: Vec<Point3<f64>>,
    polygons: Vec<Vec<usize>>,
    settings: BTreeMap<String, f64>,
}

impl Default for SheetBuilder {
    fn default() -> Self {
        Self::new("sheet")
    }
}

impl SheetBuilder {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            segment: Segment::Apical,
            positions: Vec::new(),
            polygons: Vec::new(),
            settings: BTreeMap::new(),
        }
    }

    /// Segment label given to every element of the sheet.
    pub fn segment(&mut self, segment: Segment) -> &mut Self {
        self.segment = segment;
        self
    }

    /// Adds a vertex and returns its id.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        self.positions.push(position);
        self.positions.len() - 1
    }

    pub fn add_face(&mut self, vertices: &[usize]) -> &mut Self {
        self.polygons.push(vertices.to_vec());
        self
    }

    pub fn setting(&mut self, name: &str, value: f64) -> &mut Self {
        self.settings.insert(name.to_string(), value);
        self
    }

    /// Validates the polygons and assembles the sheet.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if a polygon has fewer than three vertices,
    /// repeats a vertex, references an unknown vertex, or if two polygons wind
    /// the same directed edge.
    pub fn build(&self) -> Result<Epithelium, TopologyError> {
        let mut edges = Vec::new();
        for (face, polygon) in self.polygons.iter().enumerate() {
            if polygon.len() < 3 {
                return Err(TopologyError::DegenerateFace {
                    face,
                    sides: polygon.len(),
                });
            }
            for &vert in polygon {
                if vert >= self.positions.len() {
                    return Err(TopologyError::VertexNotFound(vert));
                }
            }
            let mut sorted = polygon.clone();
            sorted.sort_unstable();
            sorted.dedup();
            if sorted.len() != polygon.len() {
                return Err(TopologyError::OpenFace(face));
            }
            for (k, &srce) in polygon.iter().enumerate() {
                let trgt = polygon[(k + 1) % polygon.len()];
                edges.push(HalfEdge::new(srce, trgt, face, self.segment));
            }
        }

        let vertices: Vec<Vertex> = self
            .positions
            .iter()
            .map(|&p| Vertex::new(p, self.segment))
            .collect();
        let faces = vec![
            Face {
                segment: self.segment,
                id_sheet: None,
            };
            self.polygons.len()
        ];

        let vert_data = Columns::new(Element::Vert, vertices.len());
        let edge_data = Columns::new(Element::Edge, edges.len());
        let face_data = Columns::new(Element::Face, faces.len());
        Epithelium::from_tables(
            self.identifier.clone(),
            vertices,
            edges,
            faces,
            Vec::new(),
            vert_data,
            edge_data,
            face_data,
            Columns::new(Element::Cell, 0),
            self.settings.clone(),
        )
    }
}
