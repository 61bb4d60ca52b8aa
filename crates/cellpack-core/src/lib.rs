//! # CellPack Core Library
//!
//! Vertex-model mechanics and mesh surgery for epithelial tissues: half-edge
//! meshes for 2D sheets and 3D monolayers, geometry updates, additive energy
//! terms with analytic gradients, topological rearrangements, and the
//! assembly of monolayers from recorded sheet histories.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture.
//!
//! - **[`core`]: The Foundation.** The [`core::models::mesh::Epithelium`] data
//!   model with its named column tables, geometry ([`core::geometry`]), energy
//!   terms ([`core::effectors`]), edge collapse and vertex split
//!   ([`core::topology`]) and file I/O.
//!
//! - **[`engine`]: The Logic Core.** Monolayer assembly from an apical and a
//!   basal sheet, sheet histories, configuration, progress reporting and the
//!   aggregate error type.
//!
//! - **[`workflows`]: The Public API.** Complete procedures such as energy
//!   evaluation and history replay, built on the two layers below.
//!
//! ## Features
//!
//! - `parallel`: evaluate effectors and per-edge geometry with
//!   `rayon`. Results are identical with and without it.

pub mod core;
pub mod engine;
pub mod workflows;
