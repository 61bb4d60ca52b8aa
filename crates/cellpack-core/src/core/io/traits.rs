use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Defines the interface for reading and writing one on-disk mesh format.
///
/// Implementors handle format-specific parsing and serialization; the path
/// helpers wrap them with buffered file access.
pub trait MeshFile {
    /// The value stored in the file (a mesh, a history, ...).
    type Value;

    /// The error type for I/O operations.
    type Error: Error + From<io::Error>;

    /// Reads a value from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or the reader fails.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Value, Self::Error>;

    /// Writes a value to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the writer fails.
    fn write_to(value: &Self::Value, writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Value, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    fn write_to_path<P: AsRef<Path>>(value: &Self::Value, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(value, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
