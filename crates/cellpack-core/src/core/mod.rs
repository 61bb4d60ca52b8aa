//! # Core Module
//!
//! Stateless building blocks of the vertex model.
//!
//! - **Mesh Representation** ([`models`]) - Vertices, half-edges, faces and
//!   cells with named per-element columns, plus a polygon-based sheet builder
//! - **Geometry** ([`geometry`]) - Lengths, areas, normals and volumes, followed
//!   by optional anisotropy, barrier and lumen steps
//! - **Mechanics** ([`effectors`]) - Energy terms and their vertex gradients
//! - **Topology** ([`topology`]) - Edge collapse and vertex split
//! - **File I/O** ([`io`]) - JSON meshes and histories, CSV exports

pub mod effectors;
pub mod geometry;
pub mod io;
pub mod models;
pub mod topology;
