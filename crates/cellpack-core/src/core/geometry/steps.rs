use super::base::BaseGeometry;
use super::{GeometryError, StepOutput, fields};
use crate::core::models::columns::ColumnSpec;
use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::{Axis, Element, Segment};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Parametric boundary a one-sided barrier is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "kebab-case")]
pub enum Barrier {
    /// Planes `coordinate = ±distance` along `axis`.
    Planar { axis: Axis, distance: f64 },
    /// Ellipse in the xy plane centred on the origin.
    Elliptic { semi_major: f64, semi_minor: f64 },
}

impl Barrier {
    fn validate(&self) -> Result<(), GeometryError> {
        match *self {
            Barrier::Planar { distance, .. } => finite("barrier", "distance", distance),
            Barrier::Elliptic {
                semi_major,
                semi_minor,
            } => {
                positive("barrier", "semi_major", semi_major)?;
                positive("barrier", "semi_minor", semi_minor)
            }
        }
    }

    /// Penetration of a point beyond the barrier; zero on the inside.
    pub fn penetration(&self, x: f64, y: f64, z: f64) -> f64 {
        match *self {
            Barrier::Planar { axis, distance } => {
                let coordinate = [x, y, z][axis.index()];
                (coordinate.abs() - distance.abs()).max(0.0)
            }
            Barrier::Elliptic {
                semi_major: a,
                semi_minor: b,
            } => {
                let rho = x.hypot(y);
                let theta = y.atan2(x);
                let radius = a * b / ((b * theta.cos()).powi(2) + (a * theta.sin()).powi(2)).sqrt();
                (rho - radius).max(0.0)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GeometryStep {
    /// `gamma = anisotropy * cos(2 (orientation - phase))`, with the phase
    /// chosen by edge segment (zero for lateral edges).
    Anisotropy { apical_phase: f64, basal_phase: f64 },
    /// Per-vertex `penetration` beyond the barrier.
    Barrier(Barrier),
    /// Enclosed area of the boundary ring of `segment`, stored as the
    /// `lumen_volume` setting.
    Lumen { segment: Segment },
}

impl GeometryStep {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryStep::Anisotropy { .. } => "anisotropy",
            GeometryStep::Barrier(_) => "barrier",
            GeometryStep::Lumen { .. } => "lumen",
        }
    }

    pub fn specs(&self) -> Vec<ColumnSpec> {
        match self {
            GeometryStep::Anisotropy { .. } => vec![ColumnSpec::new(
                Element::Edge,
                fields::ANISOTROPY,
                0.0,
                "energy/length",
            )],
            GeometryStep::Barrier(_) | GeometryStep::Lumen { .. } => Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            GeometryStep::Anisotropy {
                apical_phase,
                basal_phase,
            } => {
                finite("anisotropy", "apical_phase", *apical_phase)?;
                finite("anisotropy", "basal_phase", *basal_phase)
            }
            GeometryStep::Barrier(barrier) => barrier.validate(),
            GeometryStep::Lumen { .. } => Ok(()),
        }
    }

    pub(crate) fn compute(
        &self,
        mesh: &Epithelium,
        base: &BaseGeometry,
    ) -> Result<StepOutput, GeometryError> {
        match *self {
            GeometryStep::Anisotropy {
                apical_phase,
                basal_phase,
            } => {
                let amplitude = mesh.edge_data().require(fields::ANISOTROPY)?;
                let values = mesh
                    .edges()
                    .iter()
                    .enumerate()
                    .map(|(e, edge)| {
                        let phase = match edge.segment {
                            Segment::Apical => apical_phase,
                            Segment::Basal => basal_phase,
                            Segment::Lateral => 0.0,
                        };
                        amplitude[e] * (2.0 * (base.orientation[e] - phase)).cos()
                    })
                    .collect();
                Ok(StepOutput::Column {
                    element: Element::Edge,
                    name: fields::GAMMA,
                    values,
                })
            }
            GeometryStep::Barrier(barrier) => {
                let values = mesh
                    .vertices()
                    .iter()
                    .map(|v| barrier.penetration(v.position.x, v.position.y, v.position.z))
                    .collect();
                Ok(StepOutput::Column {
                    element: Element::Vert,
                    name: fields::PENETRATION,
                    values,
                })
            }
            GeometryStep::Lumen { segment } => {
                let ring = lumen_ring(mesh, segment);
                if ring.is_empty() {
                    return Err(GeometryError::EmptyLumenRing(segment));
                }
                Ok(StepOutput::Setting {
                    name: fields::LUMEN_VOLUME,
                    value: signed_ring_area(mesh, &ring).abs(),
                })
            }
        }
    }
}

/// Half-edges of `segment` not reversed by another half-edge of the same
/// segment: the boundary ring enclosing the lumen. On a monolayer the
/// reverse sits in the neighbouring cell, so opposites are not used here.
pub fn lumen_ring(mesh: &Epithelium, segment: Segment) -> Vec<usize> {
    let pairs: HashSet<(usize, usize)> = mesh
        .edges()
        .iter()
        .filter(|e| e.segment == segment)
        .map(|e| (e.srce, e.trgt))
        .collect();
    mesh.edges()
        .iter()
        .enumerate()
        .filter(|(_, e)| e.segment == segment && !pairs.contains(&(e.trgt, e.srce)))
        .map(|(id, _)| id)
        .collect()
}

/// Shoelace sum `Σ ½ (x_s y_t − x_t y_s)` over `ring`.
pub(crate) fn signed_ring_area(mesh: &Epithelium, ring: &[usize]) -> f64 {
    ring.iter()
        .map(|&e| {
            let edge = &mesh.edges()[e];
            let s = &mesh.vertices()[edge.srce].position;
            let t = &mesh.vertices()[edge.trgt].position;
            0.5 * (s.x * t.y - t.x * s.y)
        })
        .sum()
}

fn finite(step: &'static str, parameter: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter {
            step,
            parameter,
            value,
        })
    }
}

fn positive(step: &'static str, parameter: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidParameter {
            step,
            parameter,
            value,
        })
    }
}
