//! # Topology Module
//!
//! Elementary mesh surgery: edge collapse and vertex split.
//!
//! ## Overview
//!
//! Both operations keep opposites involutive and face cycles closed, are
//! deterministic, and are all-or-nothing: they work on a scratch copy of the
//! mesh and only commit it once the new topology has been rebuilt and
//! validated. Derived geometry is dropped on success and must be recomputed
//! before the next energy evaluation.
//!
//! ## Key Components
//!
//! - [`collapse`] - Shrinks an edge to a single vertex
//! - [`split`] - Expands a vertex into a new edge, on sheets and monolayers

pub mod collapse;
pub mod split;

pub use collapse::collapse_edge;
pub use split::split_vertex;

use crate::core::models::columns::ConfigurationError;
use crate::core::models::segment::Element;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TopologyError {
    #[error("Edge {0} not found")]
    EdgeNotFound(usize),

    #[error("Vertex {0} not found")]
    VertexNotFound(usize),

    #[error("Face {0} not found")]
    FaceNotFound(usize),

    #[error("Edge {0} is inactive")]
    InactiveEdge(usize),

    #[error("Edge {edge} references missing {element} {target}")]
    DanglingReference {
        element: Element,
        edge: usize,
        target: usize,
    },

    #[error("Edge {0} starts and ends on the same vertex")]
    LoopEdge(usize),

    #[error("Duplicate half-edge {srce} -> {trgt}")]
    DuplicateHalfEdge { srce: usize, trgt: usize },

    #[error("Opposite of edge {0} is not its reverse")]
    BrokenOpposite(usize),

    #[error("Face {face} has {sides} sides; at least 3 are required")]
    DegenerateFace { face: usize, sides: usize },

    #[error("Half-edges of face {0} do not form a single closed cycle")]
    OpenFace(usize),

    #[error("Collapsing the edge would leave face {face} with fewer than 3 sides")]
    CollapseDegeneratesFace { face: usize },

    #[error("Face {face} contains both endpoints of the collapsed edge without the edge")]
    PinchedFace { face: usize },

    #[error("Vertex {vertex} is not on face {face}")]
    FaceNotIncident { vertex: usize, face: usize },

    #[error("Vertex {vertex} lies on the boundary; its face fan is not closed")]
    OpenFan { vertex: usize },

    #[error("Vertex {vertex} is shared by {faces} faces; at least 3 are required to split it")]
    TooFewFaces { vertex: usize, faces: usize },

    #[error("Face {0} is lateral; monolayer vertices are split in the apical or basal layer")]
    LateralSplit(usize),

    #[error("Vertex {vertex} has no single triangular lateral face in the cell of face {face}")]
    NoLateralGap { vertex: usize, face: usize },

    #[error("Expected a 2D sheet for the {0} layer, found a mesh with cells")]
    NotASheet(&'static str),

    #[error("Apical and basal sheets differ in {what}: {apical} vs {basal}")]
    SheetMismatch {
        what: &'static str,
        apical: usize,
        basal: usize,
    },

    #[error("Face {face} has {apical} sides on the apical sheet but {basal} on the basal sheet")]
    DegreeMismatch {
        face: usize,
        apical: usize,
        basal: usize,
    },

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}
