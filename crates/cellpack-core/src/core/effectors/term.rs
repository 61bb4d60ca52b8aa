use crate::core::models::mesh::Epithelium;
use crate::core::models::segment::Element;
use nalgebra::Vector3;
use serde::Serialize;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Energy of one effector, one value per element of `element`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySeries {
    pub element: Element,
    pub values: Vec<f64>,
}

impl EnergySeries {
    pub fn new(element: Element, values: Vec<f64>) -> Self {
        Self { element, values }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Gradient of one effector.
///
/// With `element == Vert`, `srce[v]` is the gradient at vertex `v` and `trgt`
/// is `None`. With `element == Edge`, `srce[e]` applies to the source vertex of
/// half-edge `e` and `trgt[e]` to its target.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    pub element: Element,
    pub srce: Vec<Vector3<f64>>,
    pub trgt: Option<Vec<Vector3<f64>>>,
}

impl Gradient {
    pub fn per_vertex(srce: Vec<Vector3<f64>>) -> Self {
        Self {
            element: Element::Vert,
            srce,
            trgt: None,
        }
    }

    pub fn per_edge(srce: Vec<Vector3<f64>>, trgt: Vec<Vector3<f64>>) -> Self {
        Self {
            element: Element::Edge,
            srce,
            trgt: Some(trgt),
        }
    }

    /// Sums the contributions onto the vertices they apply to.
    pub fn accumulate(&self, mesh: &Epithelium) -> Vec<Vector3<f64>> {
        let mut total = vec![Vector3::zeros(); mesh.n_verts()];
        match self.element {
            Element::Edge => {
                for (edge, g) in mesh.edges().iter().zip(&self.srce) {
                    total[edge.srce] += g;
                }
                if let Some(trgt) = &self.trgt {
                    for (edge, g) in mesh.edges().iter().zip(trgt) {
                        total[edge.trgt] += g;
                    }
                }
            }
            _ => {
                for (slot, g) in total.iter_mut().zip(&self.srce) {
                    *slot += g;
                }
            }
        }
        total
    }
}

/// Labelled per-effector energies, in effector order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EnergyReport {
    terms: Vec<(String, f64)>,
}

impl EnergyReport {
    pub fn single(label: &str, energy: f64) -> Self {
        Self {
            terms: vec![(label.to_string(), energy)],
        }
    }

    pub fn terms(&self) -> &[(String, f64)] {
        &self.terms
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.terms.iter().find(|(l, _)| l == label).map(|(_, e)| *e)
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.terms.iter().map(|(_, e)| e).sum()
    }
}

impl AddAssign for EnergyReport {
    fn add_assign(&mut self, rhs: Self) {
        for (label, energy) in rhs.terms {
            match self.terms.iter_mut().find(|(l, _)| *l == label) {
                Some((_, total)) => *total += energy,
                None => self.terms.push((label, energy)),
            }
        }
    }
}

impl Add for EnergyReport {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for EnergyReport {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, report| acc + report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures;

    #[test]
    fn total_returns_sum_of_all_terms() {
        let report = EnergyReport::single("line_tension", 1.5) + EnergyReport::single("face_area", -0.5);
        assert_eq!(report.total(), 1.0);
        assert_eq!(report.terms().len(), 2);
    }

    #[test]
    fn add_merges_terms_with_the_same_label() {
        let mut report = EnergyReport::single("compression", 1.0);
        report += EnergyReport::single("compression", 2.0);
        assert_eq!(report.terms().len(), 1);
        assert_eq!(report.get("compression"), Some(3.0));
    }

    #[test]
    fn default_report_is_empty_with_zero_total() {
        let report = EnergyReport::default();
        assert!(report.terms().is_empty());
        assert_eq!(report.total(), 0.0);
    }

    #[test]
    fn sum_preserves_first_seen_order() {
        let report: EnergyReport = ["b", "a", "b"]
            .into_iter()
            .map(|l| EnergyReport::single(l, 1.0))
            .sum();
        assert_eq!(report.terms()[0], ("b".to_string(), 2.0));
        assert_eq!(report.terms()[1], ("a".to_string(), 1.0));
    }

    #[test]
    fn edge_gradient_accumulates_on_source_and_target() {
        let sheet = fixtures::quad_grid(1, 1);
        let n = sheet.n_edges();
        let gradient = Gradient::per_edge(
            vec![Vector3::new(1.0, 0.0, 0.0); n],
            vec![Vector3::new(0.0, 1.0, 0.0); n],
        );
        let total = gradient.accumulate(&sheet);
        for g in total {
            assert_eq!(g, Vector3::new(1.0, 1.0, 0.0));
        }
    }

    #[test]
    fn series_total_sums_values() {
        let series = EnergySeries::new(Element::Face, vec![0.25, 0.75]);
        assert_eq!(series.total(), 1.0);
    }
}
