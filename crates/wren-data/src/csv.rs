// CSV tables — load numeric tabular data into feature / target tensors
//
// A lightweight parser that doesn't require an external CSV crate. Every
// cell must parse as f64. Blank lines are skipped. The caller names the
// target columns; every other column is a feature, kept in file order.
//
//   iris-style:   f0,f1,f2,f3,t0,t1,t2      target_cols = [4, 5, 6]
//   digits-style: p0,...,p63,label          target_cols = [64]

use std::fs;
use std::path::Path;

use tracing::debug;
use wren_core::{Error, Result, Tensor};

/// Configuration for loading a CSV file.
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Whether the first non-blank line is a header (to be skipped).
    pub has_header: bool,
    /// Column indices holding targets. Empty means "the last column".
    pub target_cols: Vec<usize>,
    /// Delimiter character (default: `,`).
    pub delimiter: u8,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            has_header: false,
            target_cols: Vec::new(),
            delimiter: b',',
        }
    }
}

impl CsvConfig {
    pub fn has_header(mut self, h: bool) -> Self {
        self.has_header = h;
        self
    }
    pub fn target_cols(mut self, cols: Vec<usize>) -> Self {
        self.target_cols = cols;
        self
    }
    pub fn delimiter(mut self, d: u8) -> Self {
        self.delimiter = d;
        self
    }
}

/// A numeric table split into features `[rows, F]` and targets `[rows, K]`.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub features: Tensor,
    pub targets: Tensor,
}

impl CsvTable {
    /// Load a CSV file from disk.
    pub fn load<P: AsRef<Path>>(path: P, config: &CsvConfig) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = content.len(), "read csv");
        Self::from_string(&content, config)
    }

    /// Parse CSV from an in-memory string.
    pub fn from_string(content: &str, config: &CsvConfig) -> Result<Self> {
        let rows = parse_rows(content, config)?;
        let num_cols = rows.first().map(Vec::len).unwrap_or(0);

        let target_cols = if config.target_cols.is_empty() {
            vec![num_cols - 1]
        } else {
            config.target_cols.clone()
        };
        if let Some(&bad) = target_cols.iter().find(|&&c| c >= num_cols) {
            return Err(Error::InvalidArgument(format!(
                "target column {} out of range for {} columns",
                bad, num_cols
            )));
        }
        let feature_cols: Vec<usize> = (0..num_cols).filter(|c| !target_cols.contains(c)).collect();
        if feature_cols.is_empty() {
            return Err(Error::InvalidArgument("csv has no feature columns".into()));
        }

        let pick = |cols: &[usize]| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|r| cols.iter().map(|&c| r[c]).collect())
                .collect()
        };
        let features = Tensor::from_rows(&pick(&feature_cols))?;
        let targets = Tensor::from_rows(&pick(&target_cols))?;
        debug!(
            rows = rows.len(),
            features = feature_cols.len(),
            targets = target_cols.len(),
            "parsed csv table"
        );
        Ok(CsvTable { features, targets })
    }

    pub fn len(&self) -> usize {
        self.features.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse every data line into a row of f64. All rows must have the same
/// number of cells.
pub fn parse_rows(content: &str, config: &CsvConfig) -> Result<Vec<Vec<f64>>> {
    let delim = config.delimiter as char;
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());
    if config.has_header {
        lines.next();
    }

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_no, line) in lines {
        let row = line
            .split(delim)
            .enumerate()
            .map(|(column, cell)| {
                cell.trim().parse::<f64>().map_err(|_| Error::Parse {
                    line: line_no + 1,
                    column,
                    value: cell.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        if let Some(first) = rows.first() {
            if row.len() != first.len() {
                return Err(Error::InvalidArgument(format!(
                    "line {} has {} columns, expected {}",
                    line_no + 1,
                    row.len(),
                    first.len()
                )));
            }
        }
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(Error::InvalidArgument("csv has no data rows".into()));
    }
    Ok(rows)
}
