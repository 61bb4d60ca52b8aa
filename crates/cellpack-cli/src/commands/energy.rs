use crate::cli::EnergyArgs;
use crate::config::apply_setting_overrides;
use crate::error::{CliError, Result};
use cellpack::core::io::csv::write_gradient;
use cellpack::core::io::{json::JsonMesh, traits::MeshFile};
use cellpack::engine::config::ModelConfig;
use cellpack::engine::error::EngineError;
use cellpack::workflows;
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

pub fn run(args: EnergyArgs) -> Result<()> {
    let mut model = ModelConfig::load(&args.model).map_err(EngineError::from)?;
    apply_setting_overrides(&mut model, &args.set_values)?;

    info!("Loading mesh from {:?}", &args.input);
    let mut mesh =
        JsonMesh::read_from_path(&args.input).map_err(|e| CliError::file(&args.input, e))?;

    let evaluation = workflows::evaluate::run(&mut mesh, &model)?;

    for (label, energy) in evaluation.report.terms() {
        println!("{label:<28} {energy:>16.8e}");
    }
    println!("{:<28} {:>16.8e}", "total", evaluation.total_energy());
    println!(
        "{:<28} {:>16.8e}",
        "max |gradient|",
        evaluation.max_gradient_norm()
    );

    if let Some(path) = &args.gradient {
        let file = File::create(path).map_err(|e| CliError::file(path, e))?;
        write_gradient(BufWriter::new(file), &evaluation.gradient)
            .map_err(|e| CliError::file(path, e))?;
        info!("Gradient written to {:?}", path);
    }
    if let Some(path) = &args.output {
        JsonMesh::write_to_path(&mesh, path).map_err(|e| CliError::file(path, e))?;
        info!("Evaluated mesh written to {:?}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{unit_square, write_mesh};
    use cellpack::core::models::segment::Segment;
    use std::fs;
    use tempfile::tempdir;

    const MODEL: &str = r#"
[[effectors]]
kind = "line-tension"
anisotropic = false

[columns.edge]
line_tension = 1.0
"#;

    #[test]
    fn writes_gradient_and_evaluated_mesh() {
        let dir = tempdir().unwrap();
        let model = dir.path().join("model.toml");
        fs::write(&model, MODEL).unwrap();
        let args = EnergyArgs {
            input: write_mesh(dir.path(), "sheet.json", &unit_square(Segment::Apical)),
            model,
            gradient: Some(dir.path().join("gradient.csv")),
            output: Some(dir.path().join("evaluated.json")),
            set_values: Vec::new(),
        };
        run(args).unwrap();

        let gradient = fs::read_to_string(dir.path().join("gradient.csv")).unwrap();
        assert_eq!(gradient.lines().count(), 1 + 4);
        let mesh = JsonMesh::read_from_path(dir.path().join("evaluated.json")).unwrap();
        assert_eq!(mesh.edge_data().get("line_tension").unwrap(), &[1.0; 4]);
    }

    #[test]
    fn unreadable_model_is_a_core_error() {
        let dir = tempdir().unwrap();
        let args = EnergyArgs {
            input: write_mesh(dir.path(), "sheet.json", &unit_square(Segment::Apical)),
            model: dir.path().join("missing.toml"),
            gradient: None,
            output: None,
            set_values: Vec::new(),
        };
        assert!(matches!(run(args), Err(CliError::Core(EngineError::File { .. }))));
    }
}
