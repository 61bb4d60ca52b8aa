use super::columns::{ColumnSpec, Columns, ConfigurationError};
use super::segment::{Axis, Element, Segment};
use crate::core::geometry::fields;
use crate::core::topology::TopologyError;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A mesh vertex: the mechanical degree of freedom of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3<f64>,
    #[serde(default)]
    pub segment: Segment,
    /// Index of the vertex this one was built from in its source sheet.
    #[serde(default)]
    pub id_sheet: Option<usize>,
}

impl Vertex {
    pub fn new(position: Point3<f64>, segment: Segment) -> Self {
        Self {
            position,
            segment,
            id_sheet: None,
        }
    }
}

/// A directed edge owned by exactly one face (and, in 3D, one cell).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HalfEdge {
    pub srce: usize,
    pub trgt: usize,
    pub face: usize,
    #[serde(default)]
    pub cell: Option<usize>,
    #[serde(default)]
    pub segment: Segment,
    #[serde(default)]
    pub id_sheet: Option<usize>,
    #[serde(skip)]
    opposite: Option<usize>,
}

impl HalfEdge {
    pub fn new(srce: usize, trgt: usize, face: usize, segment: Segment) -> Self {
        Self {
            srce,
            trgt,
            face,
            cell: None,
            segment,
            id_sheet: None,
            opposite: None,
        }
    }

    pub fn with_cell(mut self, cell: usize) -> Self {
        self.cell = Some(cell);
        self
    }

    #[inline]
    pub fn opposite(&self) -> Option<usize> {
        self.opposite
    }

    #[inline]
    pub fn joins(&self, a: usize, b: usize) -> bool {
        (self.srce == a && self.trgt == b) || (self.srce == b && self.trgt == a)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Face {
    #[serde(default)]
    pub segment: Segment,
    #[serde(default)]
    pub id_sheet: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub id_sheet: Option<usize>,
}

/// Serialized form of an [`Epithelium`]. Derived topology (face cycles and
/// opposites) is not stored; it is rebuilt and validated on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshRecord {
    pub identifier: String,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<HalfEdge>,
    pub faces: Vec<Face>,
    #[serde(default)]
    pub cells: Vec<Cell>,
    pub vert_data: Columns,
    pub edge_data: Columns,
    pub face_data: Columns,
    pub cell_data: Columns,
    #[serde(default)]
    pub settings: BTreeMap<String, f64>,
}

/// A vertex-model mesh: either a 2D sheet (no cells) or a 3D monolayer.
///
/// Element ids are row indices and stay contiguous: structural removals
/// reindex every table. Named scalar columns live next to the element records
/// in [`Columns`] tables; geometry-derived columns are dropped on every
/// positional or structural mutation so they can never be read stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeshRecord", into = "MeshRecord")]
pub struct Epithelium {
    identifier: String,
    vertices: Vec<Vertex>,
    edges: Vec<HalfEdge>,
    faces: Vec<Face>,
    cells: Vec<Cell>,
    vert_data: Columns,
    edge_data: Columns,
    face_data: Columns,
    cell_data: Columns,
    settings: BTreeMap<String, f64>,
    face_cycles: Vec<Vec<usize>>,
}

impl TryFrom<MeshRecord> for Epithelium {
    type Error = TopologyError;

    fn try_from(record: MeshRecord) -> Result<Self, Self::Error> {
        Self::from_parts(record)
    }
}

impl From<Epithelium> for MeshRecord {
    fn from(mesh: Epithelium) -> Self {
        MeshRecord {
            identifier: mesh.identifier,
            vertices: mesh.vertices,
            edges: mesh.edges,
            faces: mesh.faces,
            cells: mesh.cells,
            vert_data: mesh.vert_data,
            edge_data: mesh.edge_data,
            face_data: mesh.face_data,
            cell_data: mesh.cell_data,
            settings: mesh.settings,
        }
    }
}

impl Epithelium {
    /// Assembles a mesh from raw tables, checking every reference and
    /// rebuilding face cycles and opposites.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError`] if an edge references a missing vertex, face or
    /// cell, if a column table has the wrong row count, or if a face does not
    /// form a closed cycle.
    pub fn from_parts(record: MeshRecord) -> Result<Self, TopologyError> {
        let MeshRecord {
            identifier,
            vertices,
            edges,
            faces,
            cells,
            vert_data,
            edge_data,
            face_data,
            cell_data,
            settings,
        } = record;

        for (table, expected) in [
            (&vert_data, vertices.len()),
            (&edge_data, edges.len()),
            (&face_data, faces.len()),
            (&cell_data, cells.len()),
        ] {
            if table.len() != expected {
                return Err(ConfigurationError::LengthMismatch {
                    element: table.element(),
                    column: "*".to_string(),
                    expected,
                    actual: table.len(),
                }
                .into());
            }
            table.check_rows()?;
        }

        for (id, edge) in edges.iter().enumerate() {
            for vert in [edge.srce, edge.trgt] {
                if vert >= vertices.len() {
                    return Err(TopologyError::DanglingReference {
                        element: Element::Vert,
                        edge: id,
                        target: vert,
                    });
                }
            }
            if edge.face >= faces.len() {
                return Err(TopologyError::DanglingReference {
                    element: Element::Face,
                    edge: id,
                    target: edge.face,
                });
            }
            if let Some(cell) = edge.cell {
                if cell >= cells.len() {
                    return Err(TopologyError::DanglingReference {
                        element: Element::Cell,
                        edge: id,
                        target: cell,
                    });
                }
            }
            if edge.srce == edge.trgt {
                return Err(TopologyError::LoopEdge(id));
            }
        }

        let mut mesh = Self {
            identifier,
            vertices,
            edges,
            faces,
            cells,
            vert_data,
            edge_data,
            face_data,
            cell_data,
            settings,
            face_cycles: Vec::new(),
        };
        mesh.reset_topology()?;
        Ok(mesh)
    }

    pub(crate) fn empty(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            vertices: Vec::new(),
            edges: Vec::new(),
            faces: Vec::new(),
            cells: Vec::new(),
            vert_data: Columns::new(Element::Vert, 0),
            edge_data: Columns::new(Element::Edge, 0),
            face_data: Columns::new(Element::Face, 0),
            cell_data: Columns::new(Element::Cell, 0),
            settings: BTreeMap::new(),
            face_cycles: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = identifier.into();
    }

    pub fn n_verts(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// `true` for 3D meshes, which carry cells.
    pub fn is_bulk(&self) -> bool {
        !self.cells.is_empty()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex(&self, id: usize) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn edges(&self) -> &[HalfEdge] {
        &self.edges
    }

    pub fn edge(&self, id: usize) -> Option<&HalfEdge> {
        self.edges.get(id)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn face(&self, id: usize) -> Option<&Face> {
        self.faces.get(id)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Returns the opposite half-edge of `edge`, if it has one.
    ///
    /// On sheets the opposite is the reversed half-edge anywhere in the mesh;
    /// in 3D meshes it is searched within the same cell.
    pub fn opposite(&self, edge: usize) -> Option<usize> {
        self.edges.get(edge).and_then(HalfEdge::opposite)
    }

    /// Half-edges of `face`, ordered so each target is the next source.
    pub fn face_edges(&self, face: usize) -> &[usize] {
        self.face_cycles.get(face).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_sides(&self, face: usize) -> usize {
        self.face_edges(face).len()
    }

    /// Vertices of `face` in winding order.
    pub fn face_vertices(&self, face: usize) -> Vec<usize> {
        self.face_edges(face)
            .iter()
            .map(|&e| self.edges[e].srce)
            .collect()
    }

    /// Faces bounding `cell`, in ascending id order.
    pub fn cell_faces(&self, cell: usize) -> Vec<usize> {
        let mut faces: Vec<usize> = self
            .edges
            .iter()
            .filter(|e| e.cell == Some(cell))
            .map(|e| e.face)
            .collect();
        faces.sort_unstable();
        faces.dedup();
        faces
    }

    /// Faces with at least one half-edge leaving `vert`, in ascending id order.
    pub fn vertex_faces(&self, vert: usize) -> Vec<usize> {
        let mut faces: Vec<usize> = self
            .edges
            .iter()
            .filter(|e| e.srce == vert)
            .map(|e| e.face)
            .collect();
        faces.sort_unstable();
        faces.dedup();
        faces
    }

    /// Distinct vertices sharing an edge with `vert`, in ascending id order.
    pub fn vertex_neighbors(&self, vert: usize) -> Vec<usize> {
        let mut neighbors: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|e| {
                if e.srce == vert {
                    Some(e.trgt)
                } else if e.trgt == vert {
                    Some(e.srce)
                } else {
                    None
                }
            })
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    pub fn position(&self, vert: usize) -> Option<&Point3<f64>> {
        self.vertices.get(vert).map(|v| &v.position)
    }

    /// Moves one vertex. Derived geometry is dropped and must be recomputed.
    pub fn set_position(&mut self, vert: usize, position: Point3<f64>) -> Result<(), TopologyError> {
        let vertex = self
            .vertices
            .get_mut(vert)
            .ok_or(TopologyError::VertexNotFound(vert))?;
        vertex.position = position;
        self.invalidate_geometry();
        Ok(())
    }

    /// Adds `displacement[v]` to every vertex `v`, the way an external
    /// integrator applies a step. Derived geometry is dropped.
    pub fn translate_vertices(
        &mut self,
        displacement: &[Vector3<f64>],
    ) -> Result<(), ConfigurationError> {
        if displacement.len() != self.vertices.len() {
            return Err(ConfigurationError::LengthMismatch {
                element: Element::Vert,
                column: "position".to_string(),
                expected: self.vertices.len(),
                actual: displacement.len(),
            });
        }
        for (vertex, delta) in self.vertices.iter_mut().zip(displacement) {
            vertex.position += delta;
        }
        self.invalidate_geometry();
        Ok(())
    }

    /// Coordinate `axis` of every vertex, in id order.
    pub fn coordinates(&self, axis: Axis) -> Vec<f64> {
        self.vertices
            .iter()
            .map(|v| v.position[axis.index()])
            .collect()
    }

    pub fn vert_data(&self) -> &Columns {
        &self.vert_data
    }

    pub fn edge_data(&self) -> &Columns {
        &self.edge_data
    }

    pub fn face_data(&self) -> &Columns {
        &self.face_data
    }

    pub fn cell_data(&self) -> &Columns {
        &self.cell_data
    }

    pub fn vert_data_mut(&mut self) -> &mut Columns {
        &mut self.vert_data
    }

    pub fn edge_data_mut(&mut self) -> &mut Columns {
        &mut self.edge_data
    }

    pub fn face_data_mut(&mut self) -> &mut Columns {
        &mut self.face_data
    }

    pub fn cell_data_mut(&mut self) -> &mut Columns {
        &mut self.cell_data
    }

    /// The column table of `element`; `None` for [`Element::Settings`].
    pub fn data(&self, element: Element) -> Option<&Columns> {
        match element {
            Element::Vert => Some(&self.vert_data),
            Element::Edge => Some(&self.edge_data),
            Element::Face => Some(&self.face_data),
            Element::Cell => Some(&self.cell_data),
            Element::Settings => None,
        }
    }

    pub(crate) fn data_mut(&mut self, element: Element) -> Option<&mut Columns> {
        match element {
            Element::Vert => Some(&mut self.vert_data),
            Element::Edge => Some(&mut self.edge_data),
            Element::Face => Some(&mut self.face_data),
            Element::Cell => Some(&mut self.cell_data),
            Element::Settings => None,
        }
    }

    pub fn settings(&self) -> &BTreeMap<String, f64> {
        &self.settings
    }

    /// Reads a mesh-level coefficient.
    ///
    /// # Errors
    ///
    /// [`ConfigurationError::MissingSetting`] when absent,
    /// [`ConfigurationError::InvalidCoefficient`] when it is not finite.
    pub fn setting(&self, name: &str) -> Result<f64, ConfigurationError> {
        let value = *self
            .settings
            .get(name)
            .ok_or_else(|| ConfigurationError::MissingSetting(name.to_string()))?;
        if !value.is_finite() {
            return Err(ConfigurationError::InvalidCoefficient {
                name: name.to_string(),
                value,
            });
        }
        Ok(value)
    }

    pub fn set_setting(&mut self, name: &str, value: f64) {
        self.settings.insert(name.to_string(), value);
    }

    /// Merges declared defaults into the element tables and settings.
    /// Missing columns are added, unset entries are filled, and values already
    /// present are left untouched.
    pub fn update_specs(&mut self, specs: &[ColumnSpec]) {
        for spec in specs {
            match self.data_mut(spec.element) {
                Some(table) => table.merge_default(spec.name, spec.default),
                None => {
                    let value = self
                        .settings
                        .entry(spec.name.to_string())
                        .or_insert(spec.default);
                    if value.is_nan() {
                        *value = spec.default;
                    }
                }
            }
        }
    }

    /// One 2D segment per undirected edge, projected on `axes`, for plotting.
    pub fn line_segments(&self, axes: [Axis; 2]) -> Vec<[[f64; 2]; 2]> {
        self.projected_edges(axes, |_| true)
    }

    /// Like [`Epithelium::line_segments`], restricted to the edges of one segment.
    pub fn segment_line_segments(&self, segment: Segment, axes: [Axis; 2]) -> Vec<[[f64; 2]; 2]> {
        self.projected_edges(axes, |e| e.segment == segment)
    }

    fn projected_edges(
        &self,
        axes: [Axis; 2],
        keep: impl Fn(&HalfEdge) -> bool,
    ) -> Vec<[[f64; 2]; 2]> {
        let project = |p: &Point3<f64>| [p[axes[0].index()], p[axes[1].index()]];
        self.edges
            .iter()
            .enumerate()
            .filter(|(id, e)| keep(e) && e.opposite.is_none_or(|opp| *id < opp))
            .map(|(_, e)| {
                [
                    project(&self.vertices[e.srce].position),
                    project(&self.vertices[e.trgt].position),
                ]
            })
            .collect()
    }

    /// Checks that opposites are reversed and involutive and that every face
    /// is a single closed cycle.
    pub fn validate(&self) -> Result<(), TopologyError> {
        for (id, edge) in self.edges.iter().enumerate() {
            if let Some(opp) = edge.opposite {
                let other = &self.edges[opp];
                if other.srce != edge.trgt || other.trgt != edge.srce || other.opposite != Some(id) {
                    return Err(TopologyError::BrokenOpposite(id));
                }
            }
        }
        for face in 0..self.faces.len() {
            let cycle = self.face_edges(face);
            if cycle.len() < 3 {
                return Err(TopologyError::DegenerateFace {
                    face,
                    sides: cycle.len(),
                });
            }
            for (k, &e) in cycle.iter().enumerate() {
                let next = cycle[(k + 1) % cycle.len()];
                if self.edges[e].trgt != self.edges[next].srce {
                    return Err(TopologyError::OpenFace(face));
                }
            }
        }
        Ok(())
    }

    /// Rebuilds opposites and ordered face cycles from the edge table.
    pub(crate) fn reset_topology(&mut self) -> Result<(), TopologyError> {
        let mut by_key: HashMap<(usize, usize, Option<usize>), usize> =
            HashMap::with_capacity(self.edges.len());
        for (id, edge) in self.edges.iter().enumerate() {
            if by_key.insert((edge.srce, edge.trgt, edge.cell), id).is_some() {
                return Err(TopologyError::DuplicateHalfEdge {
                    srce: edge.srce,
                    trgt: edge.trgt,
                });
            }
        }
        let opposites: Vec<Option<usize>> = self
            .edges
            .iter()
            .map(|e| by_key.get(&(e.trgt, e.srce, e.cell)).copied())
            .collect();
        for (edge, opposite) in self.edges.iter_mut().zip(opposites) {
            edge.opposite = opposite;
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.faces.len()];
        for (id, edge) in self.edges.iter().enumerate() {
            members[edge.face].push(id);
        }
        let mut cycles = Vec::with_capacity(self.faces.len());
        for (face, edges) in members.into_iter().enumerate() {
            cycles.push(self.order_cycle(face, &edges)?);
        }
        self.face_cycles = cycles;
        Ok(())
    }

    fn order_cycle(&self, face: usize, edges: &[usize]) -> Result<Vec<usize>, TopologyError> {
        if edges.len() < 3 {
            return Err(TopologyError::DegenerateFace {
                face,
                sides: edges.len(),
            });
        }
        let mut by_srce: HashMap<usize, usize> = HashMap::with_capacity(edges.len());
        for &e in edges {
            if by_srce.insert(self.edges[e].srce, e).is_some() {
                return Err(TopologyError::OpenFace(face));
            }
        }
        let start = edges[0];
        let mut cycle = Vec::with_capacity(edges.len());
        let mut current = start;
        loop {
            cycle.push(current);
            let next = *by_srce
                .get(&self.edges[current].trgt)
                .ok_or(TopologyError::OpenFace(face))?;
            if next == start {
                break;
            }
            if cycle.len() >= edges.len() {
                return Err(TopologyError::OpenFace(face));
            }
            current = next;
        }
        if cycle.len() != edges.len() {
            return Err(TopologyError::OpenFace(face));
        }
        Ok(cycle)
    }

    /// Drops every geometry-derived column and setting.
    pub(crate) fn invalidate_geometry(&mut self) {
        for name in fields::DERIVED_VERT {
            self.vert_data.remove(name);
        }
        for name in fields::DERIVED_EDGE {
            self.edge_data.remove(name);
        }
        for name in fields::DERIVED_FACE {
            self.face_data.remove(name);
        }
        for name in fields::DERIVED_CELL {
            self.cell_data.remove(name);
        }
        for name in fields::DERIVED_SETTINGS {
            self.settings.remove(*name);
        }
    }

    pub(crate) fn vertex_mut(&mut self, id: usize) -> Option<&mut Vertex> {
        self.vertices.get_mut(id)
    }

    pub(crate) fn edges_mut(&mut self) -> &mut [HalfEdge] {
        &mut self.edges
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [Vertex] {
        &mut self.vertices
    }

    /// Appends a vertex whose column values are copied from `template`.
    pub(crate) fn push_vertex(&mut self, vertex: Vertex, template: usize) -> usize {
        self.vertices.push(vertex);
        self.vert_data.push_copy_of(template);
        self.vertices.len() - 1
    }

    /// Appends a half-edge whose column values are copied from `template`.
    pub(crate) fn push_edge(&mut self, edge: HalfEdge, template: usize) -> usize {
        self.edges.push(edge);
        self.edge_data.push_copy_of(template);
        self.edges.len() - 1
    }

    /// Removes the listed half-edges and shifts the remaining ids down.
    pub(crate) fn remove_edges(&mut self, removed: &[usize]) {
        let mut keep = vec![true; self.edges.len()];
        for &e in removed {
            keep[e] = false;
        }
        let mut flags = keep.iter();
        self.edges.retain(|_| *flags.next().unwrap_or(&false));
        self.edge_data.retain_rows(&keep);
    }

    /// Removes an unreferenced vertex and shifts the ids above it down by one.
    pub(crate) fn remove_vertex(&mut self, vert: usize) {
        debug_assert!(self.edges.iter().all(|e| e.srce != vert && e.trgt != vert));
        let mut keep = vec![true; self.vertices.len()];
        keep[vert] = false;
        self.vertices.remove(vert);
        self.vert_data.retain_rows(&keep);
        for edge in &mut self.edges {
            if edge.srce > vert {
                edge.srce -= 1;
            }
            if edge.trgt > vert {
                edge.trgt -= 1;
            }
        }
    }

    /// Raw assembly used by the monolayer builder; topology is reset by the caller.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_tables(
        identifier: String,
        vertices: Vec<Vertex>,
        edges: Vec<HalfEdge>,
        faces: Vec<Face>,
        cells: Vec<Cell>,
        vert_data: Columns,
        edge_data: Columns,
        face_data: Columns,
        cell_data: Columns,
        settings: BTreeMap<String, f64>,
    ) -> Result<Self, TopologyError> {
        Self::from_parts(MeshRecord {
            identifier,
            vertices,
            edges,
            faces,
            cells,
            vert_data,
            edge_data,
            face_data,
            cell_data,
            settings,
        })
    }
}
