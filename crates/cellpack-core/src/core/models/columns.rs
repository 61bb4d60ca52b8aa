use super::segment::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Missing required {element} column '{column}'")]
    MissingColumn { element: Element, column: String },

    #[error("Column '{column}' of the {element} table is unset at row {row}")]
    UnsetValue {
        element: Element,
        column: String,
        row: usize,
    },

    #[error("Missing required setting '{0}'")]
    MissingSetting(String),

    #[error("Invalid value {value} for coefficient '{name}'")]
    InvalidCoefficient { name: String, value: f64 },

    #[error("Column '{column}' has {actual} rows but the {element} table has {expected}")]
    LengthMismatch {
        element: Element,
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// Declares a column an effector or geometry step depends on, with the value
/// it takes when the mesh does not provide one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpec {
    pub element: Element,
    pub name: &'static str,
    pub default: f64,
    pub unit: &'static str,
}

impl ColumnSpec {
    pub const fn new(element: Element, name: &'static str, default: f64, unit: &'static str) -> Self {
        Self {
            element,
            name,
            default,
            unit,
        }
    }
}

/// Named scalar columns of one element table. Every column has exactly
/// `len` rows; row `i` belongs to element id `i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    element: Element,
    len: usize,
    #[serde(with = "unset_as_null")]
    data: BTreeMap<String, Vec<f64>>,
}

/// JSON has no NaN, so unset entries travel as `null`.
mod unset_as_null {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        data: &BTreeMap<String, Vec<f64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let optional: BTreeMap<&String, Vec<Option<f64>>> = data
            .iter()
            .map(|(name, values)| {
                let values = values.iter().map(|v| (!v.is_nan()).then_some(*v)).collect();
                (name, values)
            })
            .collect();
        optional.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, Vec<f64>>, D::Error> {
        let optional = BTreeMap::<String, Vec<Option<f64>>>::deserialize(deserializer)?;
        Ok(optional
            .into_iter()
            .map(|(name, values)| {
                let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
                (name, values)
            })
            .collect())
    }
}

impl Columns {
    pub fn new(element: Element, len: usize) -> Self {
        Self {
            element,
            len,
            data: BTreeMap::new(),
        }
    }

    pub fn element(&self) -> Element {
        self.element
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.data.get(name).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut [f64]> {
        self.data.get_mut(name).map(Vec::as_mut_slice)
    }

    /// Fails on the first column whose row count differs from the table's.
    pub(crate) fn check_rows(&self) -> Result<(), ConfigurationError> {
        match self.data.iter().find(|(_, values)| values.len() != self.len) {
            Some((name, values)) => Err(ConfigurationError::LengthMismatch {
                element: self.element,
                column: name.clone(),
                expected: self.len,
                actual: values.len(),
            }),
            None => Ok(()),
        }
    }

    /// Returns the column, failing if it is absent or holds an unset (NaN) entry.
    pub fn require(&self, name: &str) -> Result<&[f64], ConfigurationError> {
        let values = self
            .data
            .get(name)
            .ok_or_else(|| ConfigurationError::MissingColumn {
                element: self.element,
                column: name.to_string(),
            })?;
        if let Some(row) = values.iter().position(|v| v.is_nan()) {
            return Err(ConfigurationError::UnsetValue {
                element: self.element,
                column: name.to_string(),
                row,
            });
        }
        Ok(values)
    }

    pub fn insert(&mut self, name: &str, values: Vec<f64>) -> Result<(), ConfigurationError> {
        if values.len() != self.len {
            return Err(ConfigurationError::LengthMismatch {
                element: self.element,
                column: name.to_string(),
                expected: self.len,
                actual: values.len(),
            });
        }
        self.data.insert(name.to_string(), values);
        Ok(())
    }

    pub fn fill(&mut self, name: &str, value: f64) {
        self.data.insert(name.to_string(), vec![value; self.len]);
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<f64>> {
        self.data.remove(name)
    }

    /// Adds the column if missing and replaces unset entries with `default`.
    /// Existing values are never overwritten.
    pub fn merge_default(&mut self, name: &str, default: f64) {
        let len = self.len;
        let column = self
            .data
            .entry(name.to_string())
            .or_insert_with(|| vec![default; len]);
        for value in column.iter_mut().filter(|v| v.is_nan()) {
            *value = default;
        }
    }

    /// Keeps the rows whose flag is `true`, preserving their relative order.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len);
        for column in self.data.values_mut() {
            let mut flags = keep.iter();
            column.retain(|_| *flags.next().unwrap_or(&false));
        }
        self.len = keep.iter().filter(|&&k| k).count();
    }

    /// Appends a row copying every column value of row `source`.
    pub(crate) fn push_copy_of(&mut self, source: usize) {
        for column in self.data.values_mut() {
            let value = column.get(source).copied().unwrap_or(f64::NAN);
            column.push(value);
        }
        self.len += 1;
    }

    /// Stacks `blocks` on top of each other. Columns missing from a block are
    /// filled with NaN for its rows, so they read as unset until specs are merged.
    pub(crate) fn stack(element: Element, blocks: &[&Columns]) -> Self {
        let len = blocks.iter().map(|b| b.len).sum();
        let mut stacked = Columns::new(element, len);
        let names: std::collections::BTreeSet<&String> =
            blocks.iter().flat_map(|b| b.data.keys()).collect();
        for name in names {
            let mut column = Vec::with_capacity(len);
            for block in blocks {
                match block.data.get(name) {
                    Some(values) => column.extend_from_slice(values),
                    None => column.extend(std::iter::repeat_n(f64::NAN, block.len)),
                }
            }
            stacked.data.insert(name.clone(), column);
        }
        stacked
    }

    pub(crate) fn empty_like(&self, len: usize) -> Self {
        Columns::new(self.element, len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_columns() -> Columns {
        let mut columns = Columns::new(Element::Edge, 3);
        columns.insert("line_tension", vec![0.1, 0.2, 0.3]).unwrap();
        columns
    }

    #[test]
    fn require_returns_missing_column_error_naming_the_field() {
        let columns = edge_columns();
        let err = columns.require("anisotropy").unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingColumn {
                element: Element::Edge,
                column: "anisotropy".to_string()
            }
        );
        assert!(err.to_string().contains("anisotropy"));
    }

    #[test]
    fn require_rejects_unset_values() {
        let mut columns = edge_columns();
        columns.get_mut("line_tension").unwrap()[1] = f64::NAN;
        assert!(matches!(
            columns.require("line_tension"),
            Err(ConfigurationError::UnsetValue { row: 1, .. })
        ));
    }

    #[test]
    fn insert_rejects_wrong_length() {
        let mut columns = edge_columns();
        assert!(matches!(
            columns.insert("gamma", vec![1.0]),
            Err(ConfigurationError::LengthMismatch {
                expected: 3,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn merge_default_never_overwrites_existing_values() {
        let mut columns = edge_columns();
        columns.get_mut("line_tension").unwrap()[2] = f64::NAN;
        columns.merge_default("line_tension", 9.0);
        columns.merge_default("is_active", 1.0);
        assert_eq!(columns.get("line_tension").unwrap(), &[0.1, 0.2, 9.0]);
        assert_eq!(columns.get("is_active").unwrap(), &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn retain_rows_keeps_order_and_updates_len() {
        let mut columns = edge_columns();
        columns.retain_rows(&[true, false, true]);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.get("line_tension").unwrap(), &[0.1, 0.3]);
    }

    #[test]
    fn push_copy_of_duplicates_a_row() {
        let mut columns = edge_columns();
        columns.push_copy_of(1);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns.get("line_tension").unwrap()[3], 0.2);
    }

    #[test]
    fn stack_fills_missing_columns_with_nan() {
        let first = edge_columns();
        let second = Columns::new(Element::Edge, 2);
        let stacked = Columns::stack(Element::Edge, &[&first, &second]);
        assert_eq!(stacked.len(), 5);
        let values = stacked.get("line_tension").unwrap();
        assert_eq!(&values[..3], &[0.1, 0.2, 0.3]);
        assert!(values[3].is_nan() && values[4].is_nan());
    }

    #[test]
    fn unset_entries_are_written_as_null() {
        let mut columns = edge_columns();
        columns.get_mut("line_tension").unwrap()[1] = f64::NAN;
        let json = serde_json::to_string(&columns).unwrap();
        assert!(json.contains("[0.1,null,0.3]"));

        let restored: Columns = serde_json::from_str(&json).unwrap();
        let values = restored.get("line_tension").unwrap();
        assert_eq!(values[0], 0.1);
        assert!(values[1].is_nan());
    }
}
