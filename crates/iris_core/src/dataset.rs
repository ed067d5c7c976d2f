//! CSV dataset loading
//!
//! Reads a headered CSV into a raw string table, then applies the label codec
//! and the feature schema to produce a numeric, integer-labelled dataset.
//! Column semantics live here; parsing mechanics are left to the `csv` crate.

use crate::codec::LabelCodec;
use crate::errors::{Result, SchemaError};
use crate::schema::{self, FeatureColumns, FEATURE_COUNT};
use std::io::Read;
use std::path::Path;

/// Preferred label column name.
pub const LABEL_COLUMN: &str = "species";

/// Case-insensitive aliases accepted when no `species` column exists.
pub const LABEL_ALIASES: [&str; 5] = ["species", "target", "class", "variety", "label"];

/// A CSV as read from disk: header names plus string cells.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Load a table from a CSV file with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Load a table from any reader producing headered CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Fields)
            .from_reader(reader);

        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Locate the label column: exact `species`, else the first header whose
    /// trimmed, lowercased name is one of [`LABEL_ALIASES`].
    pub fn label_column(&self) -> std::result::Result<&str, SchemaError> {
        if let Some(idx) = self.column_index(LABEL_COLUMN) {
            return Ok(&self.headers[idx]);
        }

        self.headers
            .iter()
            .find(|h| LABEL_ALIASES.contains(&h.trim().to_lowercase().as_str()))
            .map(String::as_str)
            .ok_or_else(|| SchemaError::MissingLabelColumn {
                expected: LABEL_ALIASES.iter().map(|a| a.to_string()).collect(),
                available: self.headers.clone(),
            })
    }
}

/// Training dataset with float features in canonical slot order and
/// codec-encoded targets.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<u32>,
    pub feature_columns: FeatureColumns,
    pub label_column: String,
}

impl Dataset {
    /// Apply the label codec and the feature schema to a raw table.
    ///
    /// Every step is a hard gate: the label column must exist, every label
    /// must be known to the codec, every feature slot must resolve and every
    /// feature cell must be numeric. No rows are ever dropped.
    pub fn from_table(
        table: &RawTable,
        codec: &LabelCodec,
    ) -> std::result::Result<Self, SchemaError> {
        if table.is_empty() {
            return Err(SchemaError::EmptyDataset);
        }

        let label_column = table.label_column()?.to_string();
        let normalized: Vec<String> = table
            .column(&label_column)
            .unwrap_or_default()
            .into_iter()
            .map(LabelCodec::normalize)
            .collect();

        codec.validate(normalized.iter().map(String::as_str))?;

        let targets: Vec<u32> = normalized
            .iter()
            .filter_map(|name| codec.encode(name))
            .collect();

        let feature_columns = schema::resolve(table.headers())?;
        let indices: Vec<usize> = feature_columns
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();

        let mut features = Vec::with_capacity(table.len());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(FEATURE_COUNT);
            for (&col_idx, column) in indices.iter().zip(feature_columns.iter()) {
                let cell = row.get(col_idx).map(String::as_str).unwrap_or("");
                let value = cell.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                    SchemaError::NonNumeric {
                        column: column.clone(),
                        row: row_idx + 1,
                        value: cell.to_string(),
                    }
                })?;
                values.push(value);
            }
            features.push(values);
        }

        Ok(Self {
            features,
            targets,
            feature_columns,
            label_column,
        })
    }

    /// Load and validate a dataset straight from a CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P, codec: &LabelCodec) -> Result<Self> {
        let table = RawTable::from_csv(path)?;
        Ok(Self::from_table(&table, codec)?)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Rows and targets at the given indices, in index order.
    pub fn select(&self, indices: &[usize]) -> (Vec<Vec<f64>>, Vec<u32>) {
        indices
            .iter()
            .map(|&i| (self.features[i].clone(), self.targets[i]))
            .unzip()
    }
}
