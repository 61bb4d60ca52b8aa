use super::effector::Effector;
use super::term::EnergyReport;
use crate::core::models::columns::{ColumnSpec, ConfigurationError};
use crate::core::models::mesh::Epithelium;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// An ordered collection of effectors evaluated together.
///
/// Per-effector work may run in parallel, but contributions are always
/// reduced sequentially in effector order, so totals do not depend on the
/// `parallel` feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectorSet {
    effectors: Vec<Effector>,
}

impl FromIterator<Effector> for EffectorSet {
    fn from_iter<I: IntoIterator<Item = Effector>>(iter: I) -> Self {
        Self {
            effectors: iter.into_iter().collect(),
        }
    }
}

impl EffectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, effector: Effector) -> Self {
        self.effectors.push(effector);
        self
    }

    pub fn push(&mut self, effector: Effector) {
        self.effectors.push(effector);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effector> {
        self.effectors.iter()
    }

    pub fn len(&self) -> usize {
        self.effectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effectors.is_empty()
    }

    /// Column declarations of every effector. The first declaration of a
    /// column wins.
    pub fn specs(&self) -> Vec<ColumnSpec> {
        let mut specs: Vec<ColumnSpec> = Vec::new();
        for spec in self.effectors.iter().flat_map(Effector::specs) {
            if !specs
                .iter()
                .any(|s| s.element == spec.element && s.name == spec.name)
            {
                specs.push(spec);
            }
        }
        specs
    }

    pub fn energy_report(&self, mesh: &Epithelium) -> Result<EnergyReport, ConfigurationError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = self.effectors.iter();
        #[cfg(feature = "parallel")]
        let iterator = self.effectors.par_iter();

        let terms: Vec<EnergyReport> = iterator
            .map(|effector| {
                effector
                    .energy(mesh)
                    .map(|series| EnergyReport::single(effector.label(), series.total()))
            })
            .collect::<Result<_, _>>()?;
        Ok(terms.into_iter().sum())
    }

    pub fn total_energy(&self, mesh: &Epithelium) -> Result<f64, ConfigurationError> {
        Ok(self.energy_report(mesh)?.total())
    }

    /// Per-vertex gradient of each effector, in effector order.
    pub fn contributions(
        &self,
        mesh: &Epithelium,
    ) -> Result<Vec<Vec<Vector3<f64>>>, ConfigurationError> {
        #[cfg(not(feature = "parallel"))]
        let iterator = self.effectors.iter();
        #[cfg(feature = "parallel")]
        let iterator = self.effectors.par_iter();

        iterator
            .map(|effector| effector.gradient(mesh).map(|g| g.accumulate(mesh)))
            .collect()
    }

    /// Total per-vertex gradient `dE/dr`, ready for an external optimizer.
    pub fn gradient(&self, mesh: &Epithelium) -> Result<Vec<Vector3<f64>>, ConfigurationError> {
        let mut total = vec![Vector3::zeros(); mesh.n_verts()];
        for contribution in self.contributions(mesh)? {
            for (slot, g) in total.iter_mut().zip(&contribution) {
                *slot += g;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::effectors::params;
    use crate::core::geometry::{Barrier, GeometryStep, GeometryUpdater};
    use crate::core::models::builder::SheetBuilder;
    use crate::core::models::fixtures::{self, assert_close};
    use crate::core::models::segment::{Axis, Segment};

    fn full_set() -> EffectorSet {
        EffectorSet::new()
            .with(Effector::LineTension { anisotropic: false })
            .with(Effector::FaceArea)
            .with(Effector::Perimeter)
            .with(Effector::Compression { axis: Axis::X })
            .with(Effector::RadialBarrier)
            .with(Effector::Lumen {
                segment: Segment::Apical,
            })
    }

    fn updater() -> GeometryUpdater {
        GeometryUpdater::new()
            .with_step(GeometryStep::Barrier(Barrier::Elliptic {
                semi_major: 2.0,
                semi_minor: 1.5,
            }))
            .with_step(GeometryStep::Lumen {
                segment: Segment::Apical,
            })
    }

    fn prepare(mut mesh: Epithelium, set: &EffectorSet) -> Epithelium {
        mesh.update_specs(&set.specs());
        updater().update_all(&mut mesh).unwrap();
        mesh
    }

    #[test]
    fn total_gradient_is_the_sum_of_single_effector_gradients() {
        let set = full_set();
        let mut sheet = fixtures::hexagonal_patch();
        fixtures::jitter(&mut sheet, 0.03);
        let sheet = prepare(sheet, &set);

        let total = set.gradient(&sheet).unwrap();
        let mut summed = vec![Vector3::zeros(); sheet.n_verts()];
        for effector in set.iter() {
            let single = EffectorSet::new().with(*effector);
            for (slot, g) in summed.iter_mut().zip(single.gradient(&sheet).unwrap()) {
                *slot += g;
            }
        }
        for (a, b) in total.iter().zip(&summed) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn total_energy_is_the_sum_of_the_report() {
        let set = full_set();
        let sheet = prepare(fixtures::hexagonal_patch(), &set);
        let report = set.energy_report(&sheet).unwrap();
        assert_eq!(report.terms().len(), set.len());
        let sum: f64 = set
            .iter()
            .map(|e| e.energy(&sheet).unwrap().total())
            .sum();
        assert_close(report.total(), sum, 1e-12);
        assert_close(set.total_energy(&sheet).unwrap(), sum, 1e-12);
    }

    #[test]
    fn energy_and_gradient_are_invariant_under_vertex_relabeling() {
        let set = EffectorSet::new()
            .with(Effector::LineTension { anisotropic: false })
            .with(Effector::FaceArea)
            .with(Effector::Perimeter)
            .with(Effector::Compression { axis: Axis::Y });

        let mut original = fixtures::quad_grid(2, 2);
        fixtures::jitter(&mut original, 0.1);

        // Rebuild the same polygons with vertex ids reversed.
        let n = original.n_verts();
        let relabel = |v: usize| n - 1 - v;
        let mut builder = SheetBuilder::new("relabelled");
        let mut positions = vec![None; n];
        for v in 0..n {
            positions[relabel(v)] = original.position(v).copied();
        }
        for p in positions.into_iter().flatten() {
            builder.add_vertex(p);
        }
        for face in (0..original.n_faces()).rev() {
            let polygon: Vec<usize> = original.face_vertices(face).into_iter().map(relabel).collect();
            builder.add_face(&polygon);
        }
        let relabelled = builder.build().unwrap();

        let original = prepare_plain(original, &set);
        let relabelled = prepare_plain(relabelled, &set);

        assert_close(
            set.total_energy(&relabelled).unwrap(),
            set.total_energy(&original).unwrap(),
            1e-12,
        );
        let g_original = set.gradient(&original).unwrap();
        let g_relabelled = set.gradient(&relabelled).unwrap();
        for v in 0..n {
            assert!((g_original[v] - g_relabelled[relabel(v)]).norm() < 1e-10);
        }
    }

    fn prepare_plain(mut mesh: Epithelium, set: &EffectorSet) -> Epithelium {
        mesh.update_specs(&set.specs());
        GeometryUpdater::new().update_all(&mut mesh).unwrap();
        mesh
    }

    #[test]
    fn specs_keep_the_first_declaration() {
        let set = EffectorSet::new()
            .with(Effector::Compression { axis: Axis::X })
            .with(Effector::RadialBarrier);
        let active: Vec<_> = set
            .specs()
            .into_iter()
            .filter(|s| s.name == params::IS_ACTIVE)
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn empty_set_has_zero_energy_and_gradient() {
        let set = EffectorSet::new();
        let sheet = prepare_plain(fixtures::quad_grid(1, 1), &set);
        assert_eq!(set.total_energy(&sheet).unwrap(), 0.0);
        assert!(set.gradient(&sheet).unwrap().iter().all(|g| *g == Vector3::zeros()));
    }

    #[test]
    fn configuration_error_propagates_from_any_effector() {
        let set = full_set();
        let mut sheet = fixtures::hexagonal_patch();
        sheet.update_specs(&set.specs());
        assert!(set.energy_report(&sheet).is_err());
        assert!(set.gradient(&sheet).is_err());
    }

    #[test]
    fn deserializes_from_a_tagged_list() {
        let set: EffectorSet = serde_json::from_str(
            r#"[{"kind": "line-tension", "anisotropic": true}, {"kind": "compression", "axis": "z"}]"#,
        )
        .unwrap();
        assert_eq!(
            set,
            EffectorSet::new()
                .with(Effector::LineTension { anisotropic: true })
                .with(Effector::Compression { axis: Axis::Z })
        );
    }
}
