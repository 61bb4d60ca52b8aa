use crate::cli::AssembleArgs;
use crate::config::PartialReplayConfig;
use crate::error::{CliError, Result};
use cellpack::core::io::{json::JsonMesh, traits::MeshFile};
use cellpack::engine::error::EngineError;
use cellpack::engine::monolayer::monolayer_from_sheets;
use tracing::info;

pub fn run(args: AssembleArgs) -> Result<()> {
    let config = PartialReplayConfig::from_options(&args.options)?
        .merge_with_cli(&args.options, false)?;

    info!("Loading sheets from {:?} and {:?}", &args.apical, &args.basal);
    let apical = JsonMesh::read_from_path(&args.apical).map_err(|e| CliError::file(&args.apical, e))?;
    let basal = JsonMesh::read_from_path(&args.basal).map_err(|e| CliError::file(&args.basal, e))?;

    let monolayer =
        monolayer_from_sheets(&apical, &basal, config.distance).map_err(EngineError::from)?;

    JsonMesh::write_to_path(&monolayer, &args.output)
        .map_err(|e| CliError::file(&args.output, e))?;
    println!(
        "Assembled {} cells ({} vertices, {} faces, {} half-edges) into {}",
        monolayer.n_cells(),
        monolayer.n_verts(),
        monolayer.n_faces(),
        monolayer.n_edges(),
        args.output.display()
    );
    Ok(())
}
