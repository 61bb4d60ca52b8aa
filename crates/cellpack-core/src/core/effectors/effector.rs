use super::params;
use super::potentials::{
    harmonic, harmonic_derivative, quadratic, quadratic_derivative, sign, unit_or_zero,
};
use super::term::{EnergySeries, Gradient};
use crate::core::geometry::{fields, lumen_ring, signed_ring_area};
use crate::core::models::columns::{ColumnSpec, ConfigurationError};
use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::{Axis, Element, Segment};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One additive term of the mechanical energy.
///
/// Effectors are stateless: every coefficient is read from the mesh columns
/// declared by [`Effector::specs`], and derived quantities from the columns
/// written by the geometry update. Evaluation never mutates the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Effector {
    /// `k x²` per vertex along `axis`.
    Compression { axis: Axis },
    /// `line_tension * length` per half-edge, or `gamma * length` for the
    /// anisotropic (shear) variant, which reads the `gamma` written by the
    /// anisotropy step instead of `line_tension`.
    LineTension {
        #[serde(default)]
        anisotropic: bool,
    },
    /// `0.5 k p²` with `p` the planar barrier penetration along `axis`.
    PlanarBarrier { axis: Axis },
    /// `0.5 k p²` with `p` the radial barrier penetration in the xy plane.
    RadialBarrier,
    /// `0.5 K (A - A0)²` per face.
    FaceArea,
    /// `0.5 Kp (P - P0)²` per face.
    Perimeter,
    /// `0.5 Kl (V - V0)²` on the lumen enclosed by the `segment` ring.
    Lumen {
        #[serde(default)]
        segment: Segment,
    },
}

impl Effector {
    pub fn label(&self) -> &'static str {
        match self {
            Effector::Compression { .. } => "compression",
            Effector::LineTension { anisotropic: false } => "line_tension",
            Effector::LineTension { anisotropic: true } => "anisotropic_line_tension",
            Effector::PlanarBarrier { .. } => "planar_barrier",
            Effector::RadialBarrier => "radial_barrier",
            Effector::FaceArea => "face_area",
            Effector::Perimeter => "perimeter",
            Effector::Lumen { .. } => "lumen",
        }
    }

    /// Input columns with their defaults.
    pub fn specs(&self) -> Vec<ColumnSpec> {
        use Element::*;
        match self {
            Effector::Compression { .. } => vec![
                ColumnSpec::new(Vert, params::COMPRESSION, 1.0, "energy/area"),
                ColumnSpec::new(Vert, params::IS_ACTIVE, 1.0, ""),
            ],
            Effector::LineTension { anisotropic: false } => vec![
                ColumnSpec::new(Edge, params::LINE_TENSION, 0.12, "energy/length"),
                ColumnSpec::new(Edge, params::IS_ACTIVE, 1.0, ""),
            ],
            Effector::LineTension { anisotropic: true } => vec![
                ColumnSpec::new(Edge, fields::ANISOTROPY, 0.0, "energy/length"),
                ColumnSpec::new(Edge, params::IS_ACTIVE, 1.0, ""),
            ],
            Effector::PlanarBarrier { .. } | Effector::RadialBarrier => vec![
                ColumnSpec::new(Vert, params::BARRIER_ELASTICITY, 1.0, "energy/area"),
                ColumnSpec::new(Vert, params::IS_ACTIVE, 1.0, ""),
            ],
            Effector::FaceArea => vec![
                ColumnSpec::new(Face, params::AREA_ELASTICITY, 1.0, "energy/area²"),
                ColumnSpec::new(Face, params::PREFERRED_AREA, 1.0, "area"),
            ],
            Effector::Perimeter => vec![
                ColumnSpec::new(Face, params::PERIMETER_ELASTICITY, 0.1, "energy/length²"),
                ColumnSpec::new(Face, params::PREFERRED_PERIMETER, 3.81, "length"),
            ],
            Effector::Lumen { .. } => vec![
                ColumnSpec::new(Settings, params::LUMEN_ELASTICITY, 1.0, "energy/volume²"),
                ColumnSpec::new(Settings, params::LUMEN_PREFERRED_VOLUME, 1.0, "volume"),
            ],
        }
    }

    /// Energy per element; inactive elements contribute zero.
    pub fn energy(&self, mesh: &Epithelium) -> Result<EnergySeries, ConfigurationError> {
        match *self {
            Effector::Compression { axis } => {
                let k = mesh.vert_data().require(params::COMPRESSION)?;
                let active = mesh.vert_data().require(params::IS_ACTIVE)?;
                let values = mesh
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(|(v, vertex)| active[v] * quadratic(k[v], vertex.position[axis.index()]))
                    .collect();
                Ok(EnergySeries::new(Element::Vert, values))
            }
            Effector::LineTension { anisotropic } => {
                let tension = edge_tension(mesh, anisotropic)?;
                let length = mesh.edge_data().require(fields::LENGTH)?;
                let values = tension
                    .iter()
                    .zip(length)
                    .map(|(t, l)| t * l)
                    .collect();
                Ok(EnergySeries::new(Element::Edge, values))
            }
            Effector::PlanarBarrier { .. } | Effector::RadialBarrier => {
                let k = mesh.vert_data().require(params::BARRIER_ELASTICITY)?;
                let active = mesh.vert_data().require(params::IS_ACTIVE)?;
                let penetration = mesh.vert_data().require(fields::PENETRATION)?;
                let values = (0..mesh.n_verts())
                    .map(|v| active[v] * harmonic(k[v], penetration[v], 0.0))
                    .collect();
                Ok(EnergySeries::new(Element::Vert, values))
            }
            Effector::FaceArea => face_series(
                mesh,
                params::AREA_ELASTICITY,
                fields::AREA,
                params::PREFERRED_AREA,
            ),
            Effector::Perimeter => face_series(
                mesh,
                params::PERIMETER_ELASTICITY,
                fields::PERIMETER,
                params::PREFERRED_PERIMETER,
            ),
            Effector::Lumen { .. } => {
                let k = mesh.setting(params::LUMEN_ELASTICITY)?;
                let v0 = mesh.setting(params::LUMEN_PREFERRED_VOLUME)?;
                let volume = mesh.setting(fields::LUMEN_VOLUME)?;
                Ok(EnergySeries::new(
                    Element::Settings,
                    vec![harmonic(k, volume, v0)],
                ))
            }
        }
    }

    /// Gradient of [`Effector::energy`] with respect to vertex positions.
    pub fn gradient(&self, mesh: &Epithelium) -> Result<Gradient, ConfigurationError> {
        match *self {
            Effector::Compression { axis } => {
                let k = mesh.vert_data().require(params::COMPRESSION)?;
                let active = mesh.vert_data().require(params::IS_ACTIVE)?;
                let grad = mesh
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(|(v, vertex)| {
                        let mut g = Vector3::zeros();
                        g[axis.index()] =
                            active[v] * quadratic_derivative(k[v], vertex.position[axis.index()]);
                        g
                    })
                    .collect();
                Ok(Gradient::per_vertex(grad))
            }
            Effector::LineTension { anisotropic } => {
                let tension = edge_tension(mesh, anisotropic)?;
                let displacement = edge_displacement(mesh)?;
                let trgt: Vec<Vector3<f64>> = tension
                    .iter()
                    .zip(&displacement)
                    .map(|(t, d)| *t * unit_or_zero(d))
                    .collect();
                let srce = trgt.iter().map(|g| -g).collect();
                Ok(Gradient::per_edge(srce, trgt))
            }
            Effector::PlanarBarrier { axis } => {
                let k = mesh.vert_data().require(params::BARRIER_ELASTICITY)?;
                let active = mesh.vert_data().require(params::IS_ACTIVE)?;
                let penetration = mesh.vert_data().require(fields::PENETRATION)?;
                let grad = mesh
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(|(v, vertex)| {
                        let mut g = Vector3::zeros();
                        let coordinate = vertex.position[axis.index()];
                        g[axis.index()] = active[v]
                            * harmonic_derivative(k[v], penetration[v], 0.0)
                            * sign(coordinate);
                        g
                    })
                    .collect();
                Ok(Gradient::per_vertex(grad))
            }
            Effector::RadialBarrier => {
                let k = mesh.vert_data().require(params::BARRIER_ELASTICITY)?;
                let active = mesh.vert_data().require(params::IS_ACTIVE)?;
                let penetration = mesh.vert_data().require(fields::PENETRATION)?;
                let grad = mesh
                    .vertices()
                    .iter()
                    .enumerate()
                    .map(|(v, vertex)| {
                        let radial = Vector3::new(vertex.position.x, vertex.position.y, 0.0);
                        active[v]
                            * harmonic_derivative(k[v], penetration[v], 0.0)
                            * unit_or_zero(&radial)
                    })
                    .collect();
                Ok(Gradient::per_vertex(grad))
            }
            Effector::FaceArea => {
                let k = mesh.face_data().require(params::AREA_ELASTICITY)?;
                let a0 = mesh.face_data().require(params::PREFERRED_AREA)?;
                let area = mesh.face_data().require(fields::AREA)?;
                let normal = face_normals(mesh)?;
                let mut srce = vec![Vector3::zeros(); mesh.n_edges()];
                let mut trgt = vec![Vector3::zeros(); mesh.n_edges()];
                for (e, edge) in mesh.edges().iter().enumerate() {
                    let f = edge.face;
                    let factor = 0.5 * harmonic_derivative(k[f], area[f], a0[f]);
                    let r_s = mesh.vertices()[edge.srce].position.coords;
                    let r_t = mesh.vertices()[edge.trgt].position.coords;
                    srce[e] = factor * r_t.cross(&normal[f]);
                    trgt[e] = factor * normal[f].cross(&r_s);
                }
                Ok(Gradient::per_edge(srce, trgt))
            }
            Effector::Perimeter => {
                let k = mesh.face_data().require(params::PERIMETER_ELASTICITY)?;
                let p0 = mesh.face_data().require(params::PREFERRED_PERIMETER)?;
                let perimeter = mesh.face_data().require(fields::PERIMETER)?;
                let displacement = edge_displacement(mesh)?;
                let trgt: Vec<Vector3<f64>> = mesh
                    .edges()
                    .iter()
                    .zip(&displacement)
                    .map(|(edge, d)| {
                        let f = edge.face;
                        harmonic_derivative(k[f], perimeter[f], p0[f]) * unit_or_zero(d)
                    })
                    .collect();
                let srce = trgt.iter().map(|g| -g).collect();
                Ok(Gradient::per_edge(srce, trgt))
            }
            Effector::Lumen { segment } => {
                let k = mesh.setting(params::LUMEN_ELASTICITY)?;
                let v0 = mesh.setting(params::LUMEN_PREFERRED_VOLUME)?;
                let volume = mesh.setting(fields::LUMEN_VOLUME)?;
                let ring = lumen_ring(mesh, segment);
                let factor = sign(signed_ring_area(mesh, &ring)) * harmonic_derivative(k, volume, v0);
                let mut srce = vec![Vector3::zeros(); mesh.n_edges()];
                let mut trgt = vec![Vector3::zeros(); mesh.n_edges()];
                for e in ring {
                    let edge = &mesh.edges()[e];
                    let s = &mesh.vertices()[edge.srce].position;
                    let t = &mesh.vertices()[edge.trgt].position;
                    srce[e] = factor * 0.5 * Vector3::new(t.y, -t.x, 0.0);
                    trgt[e] = factor * 0.5 * Vector3::new(-s.y, s.x, 0.0);
                }
                Ok(Gradient::per_edge(srce, trgt))
            }
        }
    }
}

/// Effective tension per half-edge, already weighted by activity and by the
/// 0.5 factor applied when the opposite half-edge is active too.
fn edge_tension(mesh: &Epithelium, anisotropic: bool) -> Result<Vec<f64>, ConfigurationError> {
    let tension = if anisotropic {
        mesh.edge_data().require(fields::GAMMA)?
    } else {
        mesh.edge_data().require(params::LINE_TENSION)?
    };
    let active = mesh.edge_data().require(params::IS_ACTIVE)?;
    Ok((0..mesh.n_edges())
        .map(|e| {
            let weight = match mesh.opposite(e) {
                Some(opp) if active[opp] != 0.0 => 0.5,
                _ => 1.0,
            };
            active[e] * weight * tension[e]
        })
        .collect())
}

fn edge_displacement(mesh: &Epithelium) -> Result<Vec<Vector3<f64>>, ConfigurationError> {
    let data = mesh.edge_data();
    let (dx, dy, dz) = (
        data.require(fields::DX)?,
        data.require(fields::DY)?,
        data.require(fields::DZ)?,
    );
    Ok((0..mesh.n_edges())
        .map(|e| Vector3::new(dx[e], dy[e], dz[e]))
        .collect())
}

fn face_normals(mesh: &Epithelium) -> Result<Vec<Vector3<f64>>, ConfigurationError> {
    let data = mesh.face_data();
    let (nx, ny, nz) = (
        data.require(fields::NX)?,
        data.require(fields::NY)?,
        data.require(fields::NZ)?,
    );
    Ok((0..mesh.n_faces())
        .map(|f| Vector3::new(nx[f], ny[f], nz[f]))
        .collect())
}

fn face_series(
    mesh: &Epithelium,
    elasticity: &str,
    measure: &str,
    preferred: &str,
) -> Result<EnergySeries, ConfigurationError> {
    let data = mesh.face_data();
    let k = data.require(elasticity)?;
    let x = data.require(measure)?;
    let x0 = data.require(preferred)?;
    let values = (0..mesh.n_faces())
        .map(|f| harmonic(k[f], x[f], x0[f]))
        .collect();
    Ok(EnergySeries::new(Element::Face, values))
}
