//! # Core Models Module
//!
//! Data structures for vertex-model meshes.
//!
//! ## Overview
//!
//! An [`Epithelium`](mesh::Epithelium) stores four element tables (vertices,
//! half-edges, faces and cells) addressed by contiguous integer ids, together
//! with named scalar [`Columns`](columns::Columns) per table and mesh-level
//! settings. Topology that can be derived (opposite half-edges, ordered face
//! cycles) is rebuilt after every structural change rather than stored.
//!
//! ## Key Components
//!
//! - [`mesh`] - The mesh itself, its element records and the mesh protocol
//! - [`columns`] - Named per-element scalar columns and column declarations
//! - [`builder`] - Construction of 2D sheets from explicit polygons
//! - [`segment`] - Segment labels, element kinds and axes
//!
//! ## Usage
//!
//! ```ignore
//! use cellpack::core::models::builder::SheetBuilder;
//! use nalgebra::Point3;
//!
//! let mut builder = SheetBuilder::new("triangle");
//! let a = builder.add_vertex(Point3::new(0.0, 0.0, 0.0));
//! let b = builder.add_vertex(Point3::new(1.0, 0.0, 0.0));
//! let c = builder.add_vertex(Point3::new(0.0, 1.0, 0.0));
//! let sheet = builder.add_face(&[a, b, c]).build()?;
//! ```

pub mod builder;
pub mod columns;
pub mod mesh;
pub mod segment;

#[cfg(test)]
pub(crate) mod fixtures;
