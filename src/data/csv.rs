//! CSV loading for training data.
//!
//! Supported format:
//! - UTF-8, comma-separated
//! - Optional header row (auto-detected: the first row is a header if any of
//!   its cells is non-empty and non-numeric)
//! - Double-quoted fields with embedded commas and `""` escapes
//!
//! Label modes:
//! - `ClassIndex` - the last column is a 0-based class index, one-hot encoded
//!   into a vector of length `n_classes`.
//! - `Trailing`   - the last `n_label_cols` columns are the expected vector.

use std::path::Path;

use tracing::debug;

use crate::data::training_data::{TrainingData, TrainingDatum};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// Last column is an integer class index; one-hot encode to `n_classes`.
    ClassIndex { n_classes: usize },
    /// Last `n_label_cols` columns are the expected output.
    Trailing { n_label_cols: usize },
}

/// Reads and parses a CSV file.
pub fn load_csv<P: AsRef<Path>>(path: P, label_mode: LabelMode) -> Result<TrainingData> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let data = parse_csv(&text, label_mode)?;
    debug!(path = %path.as_ref().display(), examples = data.len(), "loaded CSV");
    Ok(data)
}

/// Parses CSV text into training data. Every row must carry the same number
/// of features.
pub fn parse_csv(text: &str, label_mode: LabelMode) -> Result<TrainingData> {
    let mut lines = text.lines().peekable();

    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut data = TrainingData::new();
    let mut n_feats: Option<usize> = None;

    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row_num = row_idx + 1;
        let cells = parse_csv_row(line);

        let datum = match label_mode {
            LabelMode::ClassIndex { n_classes } => class_index_row(&cells, n_classes, row_num)?,
            LabelMode::Trailing { n_label_cols } => trailing_row(&cells, n_label_cols, row_num)?,
        };

        match n_feats {
            Some(n) if n != datum.inputs.len() => {
                return Err(Error::Parse(format!(
                    "row {}: feature count {} does not match first row's {}",
                    row_num,
                    datum.inputs.len(),
                    n
                )));
            }
            None => n_feats = Some(datum.inputs.len()),
            _ => {}
        }
        data.push(datum);
    }

    if data.is_empty() {
        return Err(Error::Parse("CSV contains no data rows".into()));
    }
    Ok(data)
}

fn class_index_row(cells: &[String], n_classes: usize, row_num: usize) -> Result<TrainingDatum> {
    let (label_cell, feature_cells) = match cells.split_last() {
        Some(split) if cells.len() >= 2 => split,
        _ => {
            return Err(Error::Parse(format!(
                "row {}: expected at least 2 columns (features + class index), got {}",
                row_num,
                cells.len()
            )))
        }
    };
    let class_idx: usize = label_cell.trim().parse().map_err(|_| {
        Error::Parse(format!(
            "row {}: class index '{}' is not a non-negative integer",
            row_num, label_cell
        ))
    })?;
    if class_idx >= n_classes {
        return Err(Error::Parse(format!(
            "row {}: class index {} >= n_classes {}",
            row_num, class_idx, n_classes
        )));
    }
    let mut one_hot = vec![0.0; n_classes];
    one_hot[class_idx] = 1.0;
    Ok(TrainingDatum::new(parse_floats(feature_cells, row_num)?, one_hot))
}

fn trailing_row(cells: &[String], n_label_cols: usize, row_num: usize) -> Result<TrainingDatum> {
    if cells.len() < n_label_cols + 1 {
        return Err(Error::Parse(format!(
            "row {}: expected at least {} columns, got {}",
            row_num,
            n_label_cols + 1,
            cells.len()
        )));
    }
    let (features, labels) = cells.split_at(cells.len() - n_label_cols);
    Ok(TrainingDatum::new(
        parse_floats(features, row_num)?,
        parse_floats(labels, row_num)?,
    ))
}

fn is_header(line: &str) -> bool {
    parse_csv_row(line).iter().any(|c| {
        let t = c.trim();
        !t.is_empty() && t.parse::<f64>().is_err()
    })
}

fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_floats(cells: &[String], row_num: usize) -> Result<Vec<f64>> {
    cells
        .iter()
        .map(|c| {
            c.trim()
                .parse::<f64>()
                .map_err(|_| Error::Parse(format!("row {}: '{}' is not a valid number", row_num, c)))
        })
        .collect()
}
