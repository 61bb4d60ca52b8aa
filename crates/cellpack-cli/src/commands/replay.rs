use crate::cli::ReplayArgs;
use crate::config::PartialReplayConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use cellpack::core::io::{json::JsonHistory, traits::MeshFile};
use cellpack::engine::history::SheetHistory;
use cellpack::engine::progress::ProgressReporter;
use cellpack::workflows;
use tracing::info;

pub fn run(args: ReplayArgs) -> Result<()> {
    let config = PartialReplayConfig::from_options(&args.options)?
        .merge_with_cli(&args.options, args.sync_positions)?;

    info!(
        "Loading sheet histories from {:?} and {:?}",
        &args.apical, &args.basal
    );
    let apical =
        JsonHistory::read_from_path(&args.apical).map_err(|e| CliError::file(&args.apical, e))?;
    let basal =
        JsonHistory::read_from_path(&args.basal).map_err(|e| CliError::file(&args.basal, e))?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Replaying {} frames...", apical.len());
    let history = workflows::replay::run(&apical, &basal, &config, &reporter)?;

    JsonHistory::write_to_path(&history, &args.output)
        .map_err(|e| CliError::file(&args.output, e))?;
    if let Some(last) = history.last() {
        println!(
            "Replayed {} frames up to t = {}; final monolayer has {} vertices. Written to {}",
            history.len(),
            last.time,
            last.mesh.n_verts(),
            args.output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::MonolayerOptions;
    use crate::commands::test_support::unit_square;
    use cellpack::core::models::segment::Segment;
    use cellpack::engine::history::{MemoryHistory, RemovedEdges};
    use tempfile::tempdir;

    fn write_history(dir: &std::path::Path, name: &str, segment: Segment) -> std::path::PathBuf {
        let sheet = unit_square(segment);
        let mut history = MemoryHistory::new();
        history.record(0.0, &sheet, RemovedEdges::none());
        history.record(1.0, &sheet, RemovedEdges::none());
        let path = dir.join(name);
        JsonHistory::write_to_path(&history, &path).unwrap();
        path
    }

    #[test]
    fn replays_every_recorded_frame() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("monolayer_history.json");
        let args = ReplayArgs {
            apical: write_history(dir.path(), "apical.json", Segment::Apical),
            basal: write_history(dir.path(), "basal.json", Segment::Basal),
            output: output.clone(),
            sync_positions: true,
            options: MonolayerOptions {
                config: None,
                distance: None,
                set_values: vec!["distance=0.5".to_string()],
            },
        };
        run(args).unwrap();

        let history = JsonHistory::read_from_path(&output).unwrap();
        assert_eq!(history.time_stamps(), vec![0.0, 1.0]);
        let last = history.snapshot(1).unwrap();
        assert_eq!(last.n_cells(), 1);
        assert_eq!(last.position(0).unwrap().z, 0.25);
    }
}
