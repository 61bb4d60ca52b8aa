//! # Geometry Module
//!
//! Recomputes the geometry-derived columns an energy evaluation depends on.
//!
//! ## Overview
//!
//! A [`GeometryUpdater`] runs a base update (edge displacement, length and
//! orientation, face area, perimeter and normal, cell volume) followed by an
//! ordered list of [`GeometryStep`]s (anisotropy coefficient, barrier
//! penetration, lumen volume). Every step checks its parameters before any
//! column is written, and all outputs are computed before the first write, so
//! a failed update leaves the mesh as it was.
//!
//! The update is idempotent and never changes topology or positions.

mod base;
mod steps;

pub use base::BaseGeometry;
pub use steps::{Barrier, GeometryStep, lumen_ring};
pub(crate) use steps::signed_ring_area;

use crate::core::models::columns::{ColumnSpec, ConfigurationError};
use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::{Element, Segment};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Names of the derived columns and settings written by the updater.
pub mod fields {
    pub const DX: &str = "dx";
    pub const DY: &str = "dy";
    pub const DZ: &str = "dz";
    pub const LENGTH: &str = "length";
    pub const ORIENTATION: &str = "orientation";
    pub const GAMMA: &str = "gamma";
    pub const ANISOTROPY: &str = "anisotropy";
    pub const PENETRATION: &str = "penetration";
    pub const AREA: &str = "area";
    pub const PERIMETER: &str = "perimeter";
    pub const NX: &str = "nx";
    pub const NY: &str = "ny";
    pub const NZ: &str = "nz";
    pub const VOLUME: &str = "volume";
    pub const LUMEN_VOLUME: &str = "lumen_volume";

    pub const DERIVED_VERT: &[&str] = &[PENETRATION];
    pub const DERIVED_EDGE: &[&str] = &[DX, DY, DZ, LENGTH, ORIENTATION, GAMMA];
    pub const DERIVED_FACE: &[&str] = &[AREA, PERIMETER, NX, NY, NZ];
    pub const DERIVED_CELL: &[&str] = &[VOLUME];
    pub const DERIVED_SETTINGS: &[&str] = &[LUMEN_VOLUME];
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Invalid {parameter} for the {step} step: {value}")]
    InvalidParameter {
        step: &'static str,
        parameter: &'static str,
        value: f64,
    },

    #[error("No boundary half-edges found for the {0} lumen ring")]
    EmptyLumenRing(Segment),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Base geometry plus an ordered list of additional steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryUpdater {
    #[serde(default)]
    steps: Vec<GeometryStep>,
}

impl GeometryUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: GeometryStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: GeometryStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[GeometryStep] {
        &self.steps
    }

    /// Input columns the steps read, with their defaults.
    pub fn specs(&self) -> Vec<ColumnSpec> {
        self.steps.iter().flat_map(GeometryStep::specs).collect()
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        self.steps.iter().try_for_each(GeometryStep::validate)
    }

    /// Recomputes every derived column of `mesh`.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if a step parameter is invalid or a column a
    /// step reads is missing. Nothing is written in that case.
    pub fn update_all(&self, mesh: &mut Epithelium) -> Result<(), GeometryError> {
        self.validate()?;

        let base = BaseGeometry::compute(mesh);
        let mut outputs = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            outputs.push(step.compute(mesh, &base)?);
        }

        base.write(mesh)?;
        for output in outputs {
            output.write(mesh)?;
        }
        trace!(
            verts = mesh.n_verts(),
            edges = mesh.n_edges(),
            steps = self.steps.len(),
            "Geometry updated."
        );
        Ok(())
    }
}

/// Columns produced by a step, applied once every step has succeeded.
pub(crate) enum StepOutput {
    Column {
        element: Element,
        name: &'static str,
        values: Vec<f64>,
    },
    Setting {
        name: &'static str,
        value: f64,
    },
}

impl StepOutput {
    fn write(self, mesh: &mut Epithelium) -> Result<(), ConfigurationError> {
        match self {
            StepOutput::Column {
                element,
                name,
                values,
            } => {
                let table = match element {
                    Element::Vert => mesh.vert_data_mut(),
                    Element::Edge => mesh.edge_data_mut(),
                    Element::Face => mesh.face_data_mut(),
                    Element::Cell => mesh.cell_data_mut(),
                    Element::Settings => {
                        return Err(ConfigurationError::MissingColumn {
                            element,
                            column: name.to_string(),
                        });
                    }
                };
                table.insert(name, values)
            }
            StepOutput::Setting { name, value } => {
                mesh.set_setting(name, value);
                Ok(())
            }
        }
    }
}

/// Maps an `atan2` result onto `(-π, π]`.
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    if angle <= -std::f64::consts::PI {
        angle + 2.0 * std::f64::consts::PI
    } else {
        angle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures::{self, assert_close};
    use crate::core::models::segment::Axis;
    use std::f64::consts::PI;

    #[test]
    fn normalize_angle_maps_minus_pi_to_pi() {
        assert_eq!(normalize_angle(-PI), PI);
        assert_eq!(normalize_angle(0.5), 0.5);
        assert_eq!(normalize_angle(PI), PI);
    }

    #[test]
    fn update_all_is_idempotent() {
        let mut sheet = fixtures::hexagonal_patch();
        let updater = GeometryUpdater::new().with_step(GeometryStep::Barrier(Barrier::Planar {
            axis: Axis::X,
            distance: 1.0,
        }));
        updater.update_all(&mut sheet).unwrap();
        let first = sheet.clone();
        updater.update_all(&mut sheet).unwrap();
        assert_eq!(first, sheet);
    }

    #[test]
    fn invalid_step_leaves_mesh_untouched() {
        let mut sheet = fixtures::quad_grid(1, 1);
        let before = sheet.clone();
        let updater = GeometryUpdater::new()
            .with_step(GeometryStep::Lumen {
                segment: Segment::Apical,
            })
            .with_step(GeometryStep::Barrier(Barrier::Elliptic {
                semi_major: 1.0,
                semi_minor: 0.0,
            }));
        let err = updater.update_all(&mut sheet).unwrap_err();
        assert!(matches!(
            err,
            GeometryError::InvalidParameter {
                parameter: "semi_minor",
                ..
            }
        ));
        assert_eq!(sheet, before);
    }

    #[test]
    fn missing_anisotropy_column_is_a_configuration_error() {
        let mut sheet = fixtures::quad_grid(1, 1);
        let updater = GeometryUpdater::new().with_step(GeometryStep::Anisotropy {
            apical_phase: 0.0,
            basal_phase: 0.0,
        });
        let err = updater.update_all(&mut sheet).unwrap_err();
        assert_eq!(
            err,
            GeometryError::Configuration(ConfigurationError::MissingColumn {
                element: Element::Edge,
                column: fields::ANISOTROPY.to_string(),
            })
        );
        assert!(!sheet.edge_data().contains(fields::LENGTH));
    }

    #[test]
    fn specs_declare_anisotropy_input() {
        let updater = GeometryUpdater::new().with_step(GeometryStep::Anisotropy {
            apical_phase: 0.0,
            basal_phase: 0.0,
        });
        let specs = updater.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, fields::ANISOTROPY);
        assert_close(specs[0].default, 0.0, 1e-12);
    }
}
