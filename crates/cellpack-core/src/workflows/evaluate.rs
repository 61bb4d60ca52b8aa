use crate::core::effectors::EnergyReport;
use crate::core::models::mesh::Epithelium;
use crate::engine::config::ModelConfig;
use crate::engine::error::EngineError;
use nalgebra::Vector3;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: EnergyReport,
    /// Total energy gradient, one vector per vertex.
    pub gradient: Vec<Vector3<f64>>,
}

impl Evaluation {
    pub fn total_energy(&self) -> f64 {
        self.report.total()
    }

    /// Largest per-vertex gradient norm, zero for an empty mesh.
    pub fn max_gradient_norm(&self) -> f64 {
        self.gradient.iter().map(|g| g.norm()).fold(0.0, f64::max)
    }
}

/// Fills the parameters declared by `config`, refreshes geometry and
/// evaluates every effector on `mesh`.
#[instrument(skip_all, name = "evaluate_workflow")]
pub fn run(mesh: &mut Epithelium, config: &ModelConfig) -> Result<Evaluation, EngineError> {
    info!(
        mesh = mesh.identifier(),
        effectors = config.effectors().len(),
        "Evaluating mechanical energy."
    );
    config.apply(mesh)?;
    config.updater().update_all(mesh)?;

    let effectors = config.effectors();
    let report = effectors.energy_report(mesh)?;
    let gradient = effectors.gradient(mesh)?;

    let evaluation = Evaluation { report, gradient };
    info!(
        total = evaluation.total_energy(),
        max_gradient = evaluation.max_gradient_norm(),
        "Evaluation complete."
    );
    Ok(evaluation)
}
