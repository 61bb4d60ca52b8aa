use crate::cli::SegmentsArgs;
use crate::error::{CliError, Result};
use cellpack::core::io::csv::write_line_segments;
use cellpack::core::io::{json::JsonMesh, traits::MeshFile};
use cellpack::core::models::segment::{Axis, Segment};
use std::fs::File;
use std::io::BufWriter;
use tracing::info;

const LAYERS: [Segment; 3] = [Segment::Apical, Segment::Basal, Segment::Lateral];

pub fn run(args: SegmentsArgs) -> Result<()> {
    let axes = parse_axes(&args.axes)?;
    let mesh = JsonMesh::read_from_path(&args.input).map_err(|e| CliError::file(&args.input, e))?;

    let names: Vec<String> = LAYERS.iter().map(ToString::to_string).collect();
    let sets: Vec<(&str, Vec<[[f64; 2]; 2]>)> = LAYERS
        .iter()
        .zip(&names)
        .map(|(&segment, name)| (name.as_str(), mesh.segment_line_segments(segment, axes)))
        .filter(|(_, segments)| !segments.is_empty())
        .collect();

    let file = File::create(&args.output).map_err(|e| CliError::file(&args.output, e))?;
    write_line_segments(BufWriter::new(file), &sets)
        .map_err(|e| CliError::file(&args.output, e))?;

    let total: usize = sets.iter().map(|(_, segments)| segments.len()).sum();
    info!(segments = total, layers = sets.len(), "Line segments exported.");
    println!("Wrote {} segments to {}", total, args.output.display());
    Ok(())
}

/// Parses a projection plane such as `xy` or `zx`.
fn parse_axes(text: &str) -> Result<[Axis; 2]> {
    let axes: Vec<Axis> = text
        .chars()
        .map(|c| {
            c.to_string()
                .parse::<Axis>()
                .map_err(|_| CliError::Argument(format!("Unknown axis '{}' in '{}'", c, text)))
        })
        .collect::<Result<_>>()?;
    match axes.as_slice() {
        [a, b] if a != b => Ok([*a, *b]),
        _ => Err(CliError::Argument(format!(
            "Expected two distinct axes such as 'xy', got '{}'",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{unit_square, write_mesh};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn axes_are_parsed_in_order() {
        assert_eq!(parse_axes("xy").unwrap(), [Axis::X, Axis::Y]);
        assert_eq!(parse_axes("zx").unwrap(), [Axis::Z, Axis::X]);
    }

    #[test]
    fn invalid_axes_are_rejected() {
        for bad in ["x", "xx", "xyz", "xw"] {
            assert!(matches!(parse_axes(bad), Err(CliError::Argument(_))), "accepted '{bad}'");
        }
    }

    #[test]
    fn sheet_exports_only_its_own_layer() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("segments.csv");
        let args = SegmentsArgs {
            input: write_mesh(dir.path(), "sheet.json", &unit_square(Segment::Apical)),
            output: output.clone(),
            axes: "xy".to_string(),
        };
        run(args).unwrap();

        let content = fs::read_to_string(output).unwrap();
        let rows: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(rows.len(), 4 * 3);
        assert!(rows.iter().all(|row| row.ends_with(",apical")));
    }
}
