use crate::core::effectors::{Effector, EffectorSet};
use crate::core::geometry::{Barrier, GeometryStep, GeometryUpdater};
use crate::core::io::{FileError, read_toml};
use crate::core::models::columns::ColumnSpec;
use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value {value} for parameter '{name}'")]
    InvalidParameter { name: String, value: f64 },
    #[error("Effector '{effector}' has no matching {step} geometry step")]
    UnpairedEffector {
        effector: &'static str,
        step: &'static str,
    },
}

/// Constant per-element column values applied on top of the effector
/// defaults, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnOverrides {
    pub vert: BTreeMap<String, f64>,
    pub edge: BTreeMap<String, f64>,
    pub face: BTreeMap<String, f64>,
    pub cell: BTreeMap<String, f64>,
}

impl ColumnOverrides {
    fn iter(&self) -> impl Iterator<Item = (Element, &str, f64)> {
        [
            (Element::Vert, &self.vert),
            (Element::Edge, &self.edge),
            (Element::Face, &self.face),
            (Element::Cell, &self.cell),
        ]
        .into_iter()
        .flat_map(|(element, table)| {
            table
                .iter()
                .map(move |(name, &value)| (element, name.as_str(), value))
        })
    }
}

/// Mechanical model description: which geometry steps run, which energy
/// terms are summed and which parameters they read.
///
/// ```toml
/// [[geometry]]
/// kind = "anisotropy"
/// apical_phase = 0.0
/// basal_phase = 0.0
///
/// [[effectors]]
/// kind = "line-tension"
///
/// [[effectors]]
/// kind = "line-tension"
/// anisotropic = true
///
/// [settings]
/// lumen_elasticity = 2.0
///
/// [columns.edge]
/// line_tension = 0.2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ModelConfig {
    pub geometry: Vec<GeometryStep>,
    pub effectors: EffectorSet,
    pub settings: BTreeMap<String, f64>,
    pub columns: ColumnOverrides,
}

impl ModelConfig {
    pub fn load(path: &Path) -> Result<Self, FileError> {
        read_toml(path)
    }

    pub fn updater(&self) -> GeometryUpdater {
        self.geometry
            .iter()
            .cloned()
            .fold(GeometryUpdater::new(), GeometryUpdater::with_step)
    }

    pub fn effectors(&self) -> &EffectorSet {
        &self.effectors
    }

    /// Column specs of every geometry step and effector, in declaration order.
    pub fn specs(&self) -> Vec<ColumnSpec> {
        let mut specs = self.updater().specs();
        specs.extend(self.effectors.specs());
        specs
    }

    /// Writes settings and column overrides into `mesh`, then fills every
    /// remaining declared column with its default.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for a non-finite value and
    /// [`ConfigError::UnpairedEffector`] when an effector reads a column no
    /// geometry step writes for it. The mesh is unchanged in both cases.
    pub fn apply(&self, mesh: &mut Epithelium) -> Result<(), ConfigError> {
        self.check_pairing()?;
        let values = self
            .settings
            .iter()
            .map(|(name, &value)| (name.as_str(), value))
            .chain(self.columns.iter().map(|(_, name, value)| (name, value)));
        for (name, value) in values {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    name: name.to_string(),
                    value,
                });
            }
        }

        for (name, &value) in &self.settings {
            mesh.set_setting(name, value);
        }
        for (element, name, value) in self.columns.iter() {
            if let Some(table) = mesh.data_mut(element) {
                table.fill(name, value);
            }
        }
        mesh.update_specs(&self.specs());
        Ok(())
    }
}

impl ModelConfig {
    /// Barrier effectors must match the shape (and axis) of the last barrier
    /// step, which owns the penetration column; the lumen effector must match
    /// a lumen step on the same segment.
    fn check_pairing(&self) -> Result<(), ConfigError> {
        let barrier = self.geometry.iter().rev().find_map(|step| match step {
            GeometryStep::Barrier(barrier) => Some(*barrier),
            _ => None,
        });
        for effector in self.effectors.iter() {
            let (paired, step) = match *effector {
                Effector::PlanarBarrier { axis } => (
                    matches!(barrier, Some(Barrier::Planar { axis: a, .. }) if a == axis),
                    "planar barrier",
                ),
                Effector::RadialBarrier => (
                    matches!(barrier, Some(Barrier::Elliptic { .. })),
                    "elliptic barrier",
                ),
                Effector::Lumen { segment } => (
                    self.geometry.iter().any(
                        |step| matches!(step, GeometryStep::Lumen { segment: s } if *s == segment),
                    ),
                    "lumen",
                ),
                _ => (true, ""),
            };
            if !paired {
                return Err(ConfigError::UnpairedEffector {
                    effector: effector.label(),
                    step,
                });
            }
        }
        Ok(())
    }
}

/// Parameters of a history replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Apical to basal separation of the assembled monolayer.
    pub distance: f64,
    /// Copy in-plane vertex positions from each recorded frame.
    pub sync_positions: bool,
}

#[derive(Default)]
pub struct ReplayConfigBuilder {
    distance: Option<f64>,
    sync_positions: Option<bool>,
}

impl ReplayConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }
    pub fn sync_positions(mut self, sync: bool) -> Self {
        self.sync_positions = Some(sync);
        self
    }

    pub fn build(self) -> Result<ReplayConfig, ConfigError> {
        let distance = self
            .distance
            .ok_or(ConfigError::MissingParameter("distance"))?;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "distance".to_string(),
                value: distance,
            });
        }
        Ok(ReplayConfig {
            distance,
            sync_positions: self.sync_positions.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effectors::{Effector, params};
    use crate::core::models::fixtures;
    use crate::core::models::segment::{Axis, Segment};
    use std::fs;
    use tempfile::tempdir;

    const MODEL: &str = r#"
[[geometry]]
kind = "anisotropy"
apical_phase = 0.0
basal_phase = 0.5

[[geometry]]
kind = "barrier"
shape = "planar"
axis = "z"
distance = 2.0

[[effectors]]
kind = "line-tension"
anisotropic = true

[[effectors]]
kind = "planar-barrier"
axis = "z"

[[effectors]]
kind = "face-area"

[settings]
lumen_elasticity = 3.0

[columns.vert]
barrier_elasticity = 4.0

[columns.edge]
line_tension = 0.25
"#;

    fn write_model(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn load_parses_steps_effectors_and_overrides() {
        let (_dir, path) = write_model(MODEL);
        let config = ModelConfig::load(&path).unwrap();

        assert_eq!(config.updater().steps().len(), 2);
        assert_eq!(config.effectors().len(), 3);
        assert_eq!(
            config.effectors().iter().nth(1),
            Some(&Effector::PlanarBarrier { axis: Axis::Z })
        );
        assert_eq!(config.settings["lumen_elasticity"], 3.0);
        assert_eq!(config.columns.vert["barrier_elasticity"], 4.0);
        assert_eq!(config.columns.edge["line_tension"], 0.25);
    }

    #[test]
    fn load_reports_the_path_of_a_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        match ModelConfig::load(&path) {
            Err(FileError::Io { path: reported, .. }) => {
                assert!(reported.ends_with("absent.toml"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn load_rejects_unknown_effector_kinds() {
        let (_dir, path) = write_model("[[effectors]]\nkind = \"surface-tension\"\n");
        assert!(matches!(
            ModelConfig::load(&path),
            Err(FileError::Toml { .. })
        ));
    }

    #[test]
    fn apply_keeps_overrides_and_fills_defaults() {
        let (_dir, path) = write_model(MODEL);
        let config = ModelConfig::load(&path).unwrap();
        let mut sheet = fixtures::quad_grid(1, 1);
        config.apply(&mut sheet).unwrap();

        let tension = sheet.edge_data().get(params::LINE_TENSION).unwrap();
        assert!(tension.iter().all(|&t| t == 0.25));
        assert_eq!(sheet.setting(params::LUMEN_ELASTICITY).unwrap(), 3.0);
        let barrier = sheet.vert_data().get(params::BARRIER_ELASTICITY).unwrap();
        assert!(barrier.iter().all(|&k| k == 4.0));
        assert!(sheet.face_data().contains(params::AREA_ELASTICITY));
        assert!(sheet.edge_data().contains(params::IS_ACTIVE));
    }

    #[test]
    fn apply_rejects_non_finite_values_without_touching_the_mesh() {
        let mut config = ModelConfig::default();
        config.settings.insert("line_tension".into(), f64::NAN);
        let mut sheet = fixtures::quad_grid(1, 1);
        let before = sheet.clone();
        assert!(matches!(
            config.apply(&mut sheet),
            Err(ConfigError::InvalidParameter { .. })
        ));
        assert_eq!(sheet, before);
    }

    #[test]
    fn barrier_effectors_must_match_the_barrier_step() {
        let planar = |axis| GeometryStep::Barrier(Barrier::Planar { axis, distance: 1.0 });
        let config = |geometry: Vec<GeometryStep>, effector: Effector| ModelConfig {
            geometry,
            effectors: EffectorSet::new().with(effector),
            ..ModelConfig::default()
        };
        let mut sheet = fixtures::quad_grid(1, 1);

        let crossed = config(vec![planar(Axis::Y)], Effector::PlanarBarrier { axis: Axis::X });
        assert_eq!(
            crossed.apply(&mut sheet),
            Err(ConfigError::UnpairedEffector {
                effector: "planar_barrier",
                step: "planar barrier",
            })
        );
        let radial_on_plane = config(vec![planar(Axis::X)], Effector::RadialBarrier);
        assert!(radial_on_plane.apply(&mut sheet).is_err());
        let missing = config(Vec::new(), Effector::PlanarBarrier { axis: Axis::X });
        assert!(missing.apply(&mut sheet).is_err());

        // The last barrier step owns the penetration column.
        let overwritten = config(
            vec![planar(Axis::X), planar(Axis::Y)],
            Effector::PlanarBarrier { axis: Axis::X },
        );
        assert!(overwritten.apply(&mut sheet).is_err());
        let matched = config(
            vec![planar(Axis::Y), planar(Axis::X)],
            Effector::PlanarBarrier { axis: Axis::X },
        );
        assert!(matched.apply(&mut sheet).is_ok());
    }

    #[test]
    fn lumen_effector_needs_a_lumen_step_on_its_segment() {
        let config = |segment| ModelConfig {
            geometry: vec![GeometryStep::Lumen { segment }],
            effectors: EffectorSet::new().with(Effector::Lumen {
                segment: Segment::Apical,
            }),
            ..ModelConfig::default()
        };
        let mut sheet = fixtures::quad_grid(1, 1);
        assert!(config(Segment::Apical).apply(&mut sheet).is_ok());
        assert!(matches!(
            config(Segment::Basal).apply(&mut sheet),
            Err(ConfigError::UnpairedEffector { effector: "lumen", .. })
        ));
    }

    #[test]
    fn replay_builder_requires_a_distance() {
        assert_eq!(
            ReplayConfigBuilder::new().build(),
            Err(ConfigError::MissingParameter("distance"))
        );
    }

    #[test]
    fn replay_builder_rejects_non_positive_distances() {
        assert!(matches!(
            ReplayConfigBuilder::new().distance(0.0).build(),
            Err(ConfigError::InvalidParameter { .. })
        ));
        let config = ReplayConfigBuilder::new().distance(2.0).build().unwrap();
        assert_eq!(config.distance, 2.0);
        assert!(!config.sync_positions);
    }
}
