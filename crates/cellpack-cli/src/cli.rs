use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "CellPack CLI - vertex-model mechanics for epithelial sheets and monolayers: assemble monolayers, replay sheet histories, evaluate energies and export plots.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to evaluate energy terms.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stitch an apical and a basal sheet into a 3D monolayer.
    Assemble(AssembleArgs),
    /// Replay recorded apical/basal sheet histories onto a monolayer.
    Replay(ReplayArgs),
    /// Evaluate the energy terms and vertex gradient of a mesh.
    Energy(EnergyArgs),
    /// Export the edges of a mesh as 2D line segments for plotting.
    Segments(SegmentsArgs),
}

/// Options shared by the commands that build a monolayer.
#[derive(Args, Debug, Clone)]
pub struct MonolayerOptions {
    /// Path to a replay configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the apical to basal separation.
    #[arg(short, long, value_name = "FLOAT")]
    pub distance: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S distance=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `assemble` subcommand.
#[derive(Args, Debug)]
pub struct AssembleArgs {
    /// Path to the apical sheet (JSON mesh).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub apical: PathBuf,

    /// Path to the basal sheet (JSON mesh).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub basal: PathBuf,

    /// Path for the assembled monolayer (JSON mesh).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    #[command(flatten)]
    pub options: MonolayerOptions,
}

/// Arguments for the `replay` subcommand.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the apical sheet history (JSON history).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub apical: PathBuf,

    /// Path to the basal sheet history (JSON history).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub basal: PathBuf,

    /// Path for the replayed monolayer history (JSON history).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Copy in-plane vertex positions from every recorded frame.
    #[arg(long)]
    pub sync_positions: bool,

    #[command(flatten)]
    pub options: MonolayerOptions,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the input mesh (JSON mesh).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the model file (geometry steps, effectors, parameters) in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,

    /// Write the per-vertex gradient to this CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub gradient: Option<PathBuf>,

    /// Write the mesh with its parameter and geometry columns filled in.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a mesh setting, overriding the model file.
    /// Can be used multiple times. Example: -S lumen_elasticity=2.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `segments` subcommand.
#[derive(Args, Debug)]
pub struct SegmentsArgs {
    /// Path to the input mesh (JSON mesh).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the CSV file of line segments.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Projection plane as two axis letters, e.g. 'xy' or 'xz'.
    #[arg(long, default_value = "xy", value_name = "AXES")]
    pub axes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "cellpack", "segments", "-i", "mesh.json", "-o", "out.csv", "-vv", "-j", "2",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(2));
        match cli.command {
            Commands::Segments(args) => assert_eq!(args.axes, "xy"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn repeated_set_values_are_collected() {
        let cli = Cli::try_parse_from([
            "cellpack", "replay", "-a", "a.json", "-b", "b.json", "-o", "out.json", "-S",
            "distance=2", "-S", "sync-positions=true", "--sync-positions",
        ])
        .unwrap();
        let Commands::Replay(args) = cli.command else {
            panic!("expected the replay command");
        };
        assert!(args.sync_positions);
        assert_eq!(
            args.options.set_values,
            vec!["distance=2".to_string(), "sync-positions=true".to_string()]
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from([
            "cellpack", "-q", "-v", "segments", "-i", "m.json", "-o", "o.csv",
        ]);
        assert!(result.is_err());
    }
}
