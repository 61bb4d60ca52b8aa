//! # Effectors Module
//!
//! Additive mechanical energy terms of the vertex model and their analytic
//! gradients.
//!
//! ## Overview
//!
//! Each [`Effector`] computes an energy series over one element table and a
//! gradient assigned to vertices either directly or through the source and
//! target of each half-edge. Effectors read their coefficients from mesh
//! columns they declare with [`ColumnSpec`](crate::core::models::columns::ColumnSpec)s
//! and the derived columns written by
//! [`GeometryUpdater`](crate::core::geometry::GeometryUpdater); a missing or
//! unset column fails with a
//! [`ConfigurationError`](crate::core::models::columns::ConfigurationError).
//!
//! ## Key Components
//!
//! - [`effector`] - The effector variants and their energy and gradient laws
//! - [`set`] - Ordered effector collections, total energy and gradient
//! - [`term`] - Energy series, gradients and labelled energy reports
//! - [`potentials`] - Scalar energy laws shared by the effectors
//!
//! ## Usage
//!
//! ```ignore
//! use cellpack::core::effectors::{Effector, EffectorSet};
//! use cellpack::core::geometry::GeometryUpdater;
//!
//! let effectors = EffectorSet::new()
//!     .with(Effector::LineTension { anisotropic: false })
//!     .with(Effector::FaceArea);
//! mesh.update_specs(&effectors.specs());
//! GeometryUpdater::new().update_all(&mut mesh)?;
//! let gradient = effectors.gradient(&mesh)?;
//! ```

pub mod effector;
pub mod potentials;
pub mod set;
pub mod term;

pub use effector::Effector;
pub use set::EffectorSet;
pub use term::{EnergyReport, EnergySeries, Gradient};

/// Coefficient columns and settings read by the effectors.
pub mod params {
    pub const COMPRESSION: &str = "compression";
    pub const LINE_TENSION: &str = "line_tension";
    pub const BARRIER_ELASTICITY: &str = "barrier_elasticity";
    pub const AREA_ELASTICITY: &str = "area_elasticity";
    pub const PREFERRED_AREA: &str = "preferred_area";
    pub const PERIMETER_ELASTICITY: &str = "perimeter_elasticity";
    pub const PREFERRED_PERIMETER: &str = "preferred_perimeter";
    pub const LUMEN_ELASTICITY: &str = "lumen_elasticity";
    pub const LUMEN_PREFERRED_VOLUME: &str = "lumen_preferred_volume";
    pub const IS_ACTIVE: &str = "is_active";
}
