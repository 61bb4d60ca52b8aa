use super::traits::MeshFile;
use crate::core::models::mesh::Epithelium;
use crate::engine::history::MemoryHistory;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single mesh as JSON. Topology is rebuilt and validated on read.
pub struct JsonMesh;

impl MeshFile for JsonMesh {
    type Value = Epithelium;
    type Error = JsonError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Value, Self::Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_to(value: &Self::Value, writer: &mut impl Write) -> Result<(), Self::Error> {
        serde_json::to_writer_pretty(writer, value)?;
        Ok(())
    }
}

/// A recorded history (frames plus removed-edge logs) as JSON.
pub struct JsonHistory;

impl MeshFile for JsonHistory {
    type Value = MemoryHistory;
    type Error = JsonError;

    fn read_from(reader: &mut impl BufRead) -> Result<Self::Value, Self::Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn write_to(value: &Self::Value, writer: &mut impl Write) -> Result<(), Self::Error> {
        serde_json::to_writer(writer, value)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::fixtures;
    use crate::engine::history::{RemovedEdges, SheetHistory};
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn mesh_written_to_a_file_reads_back_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let sheet = fixtures::hexagonal_patch();
        JsonMesh::write_to_path(&sheet, &path).unwrap();
        let restored = JsonMesh::read_from_path(&path).unwrap();
        assert_eq!(restored, sheet);
    }

    #[test]
    fn coordinates_survive_a_file_round_trip_bit_for_bit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let mut sheet = fixtures::quad_grid(1, 1);
        let mut corner = *sheet.position(2).unwrap();
        corner.x = -1.8369701987210294e-16;
        corner.y = 0.1 + 0.2;
        sheet.set_position(2, corner).unwrap();

        JsonMesh::write_to_path(&sheet, &path).unwrap();
        let restored = JsonMesh::read_from_path(&path).unwrap();
        let restored_corner = restored.position(2).unwrap();
        assert_eq!(restored_corner.x.to_bits(), corner.x.to_bits());
        assert_eq!(restored_corner.y.to_bits(), corner.y.to_bits());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = JsonMesh::read_from_path(dir.path().join("absent.json"));
        assert!(matches!(result, Err(JsonError::Io(_))));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonMesh::read_from_path(&path),
            Err(JsonError::Json(_))
        ));
    }

    #[test]
    fn mesh_with_an_open_face_is_rejected_on_read() {
        let sheet = fixtures::quad_grid(1, 1);
        let mut value = serde_json::to_value(&sheet).unwrap();
        value["edges"][0]["trgt"] = serde_json::json!(2);
        let text = serde_json::to_string(&value).unwrap();
        let result = JsonMesh::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(JsonError::Json(_))));
    }

    #[test]
    fn history_keeps_the_no_event_sentinel_on_disk() {
        let mut history = MemoryHistory::new();
        history.record(0.0, &fixtures::quad_grid(1, 1), RemovedEdges::none());
        history.record(1.0, &fixtures::quad_grid(1, 1), RemovedEdges::from(vec![3]));

        let mut buffer = Vec::new();
        JsonHistory::write_to(&history, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("[-1]"));

        let restored = JsonHistory::read_from(&mut Cursor::new(text)).unwrap();
        assert_eq!(restored.len(), 2);
        assert!(restored.removed_edges(0).is_empty());
        assert_eq!(restored.removed_edges(1), &[3]);
    }
}
