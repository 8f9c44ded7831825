//! Record stores read from disk.
//!
//! A store is a directory holding one CSV file per table. Table and column names
//! follow the upstream generator and simulation formats:
//!
//! - truth store: table `T` (`EvtNum`, `StdHepN`, `StdHepPdg`, ...)
//! - simulation store: table `output` (one row per sub-event) and optionally a
//!   `meta` table holding the sensor geometry.
//!
//! List-valued cells are `;`-separated; an empty cell is an empty list.

mod sensors;
mod sim;
mod truth;

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

pub use sensors::{SensorTable, META_TABLE};
pub use sim::{PhotonCounts, SimCapabilities, SimRecord, SimStore, SIM_TABLE};
pub use truth::{TruthRecord, TruthStore, TRUTH_TABLE};

/// Separator between elements of a list-valued cell.
pub const LIST_SEPARATOR: char = ';';

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {path:?} does not exist or cannot be opened")]
    Unreadable { path: PathBuf },
    #[error("table '{table}' not found in {path:?}")]
    MissingTable { path: PathBuf, table: &'static str },
    #[error("table '{table}' has no column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("table '{table}', row {row}, column '{column}': {reason}")]
    Corrupt {
        table: &'static str,
        row: usize,
        column: String,
        reason: String,
    },
    #[error("table '{table}' could not be parsed: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },
}

impl StoreError {
    /// True when the store could not be opened at all, as opposed to being
    /// present with a bad schema or content.
    pub fn is_unreadable(&self) -> bool {
        match self {
            StoreError::Unreadable { .. } => true,
            StoreError::Csv { source, .. } => source.is_io_error(),
            _ => false,
        }
    }
}

/// One CSV table held in memory with its header index.
pub(crate) struct Table {
    name: &'static str,
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    /// Read `<dir>/<name>.csv`.
    pub(crate) fn read(dir: &Path, name: &'static str) -> Result<Self, StoreError> {
        if !dir.is_dir() {
            return Err(StoreError::Unreadable {
                path: dir.to_path_buf(),
            });
        }
        let path = dir.join(format!("{name}.csv"));
        if !path.is_file() {
            return Err(StoreError::MissingTable {
                path: dir.to_path_buf(),
                table: name,
            });
        }
        let csv_err = |source| StoreError::Csv { table: name, source };
        let mut rdr = csv::Reader::from_path(&path).map_err(csv_err)?;
        let columns: Vec<String> = rdr
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let rows = rdr
            .records()
            .collect::<Result<Vec<_>, csv::Error>>()
            .map_err(csv_err)?;
        Ok(Table {
            name,
            columns,
            index,
            rows,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn column(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub(crate) fn require(&self, column: &'static str) -> Result<usize, StoreError> {
        self.column(column).ok_or(StoreError::MissingColumn {
            table: self.name,
            column,
        })
    }

    fn corrupt(&self, row: usize, col: usize, reason: impl Display) -> StoreError {
        StoreError::Corrupt {
            table: self.name,
            row,
            column: self.columns[col].clone(),
            reason: reason.to_string(),
        }
    }

    fn cell(&self, row: usize, col: usize) -> &str {
        self.rows[row].get(col).unwrap_or("").trim()
    }

    pub(crate) fn scalar<T>(&self, row: usize, col: usize) -> Result<T, StoreError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.cell(row, col);
        raw.parse::<T>()
            .map_err(|e| self.corrupt(row, col, format!("'{raw}': {e}")))
    }

    /// Scalar from an optional column; `None` when the column is absent.
    pub(crate) fn opt_scalar<T>(&self, row: usize, col: Option<usize>) -> Result<Option<T>, StoreError>
    where
        T: FromStr,
        T::Err: Display,
    {
        col.map(|c| self.scalar(row, c)).transpose()
    }

    pub(crate) fn list<T>(&self, row: usize, col: usize) -> Result<Vec<T>, StoreError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.cell(row, col);
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        raw.split(LIST_SEPARATOR)
            .map(|item| {
                let item = item.trim();
                item.parse::<T>()
                    .map_err(|e| self.corrupt(row, col, format!("'{item}': {e}")))
            })
            .collect()
    }

    /// List from an optional column; empty when the column is absent.
    pub(crate) fn opt_list<T>(&self, row: usize, col: Option<usize>) -> Result<Vec<T>, StoreError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match col {
            Some(c) => self.list(row, c),
            None => Ok(Vec::new()),
        }
    }

    pub(crate) fn check_len(
        &self,
        row: usize,
        col: usize,
        actual: usize,
        expected: usize,
    ) -> Result<(), StoreError> {
        if actual == expected {
            Ok(())
        } else {
            Err(self.corrupt(
                row,
                col,
                format!("expected {expected} values, found {actual}"),
            ))
        }
    }
}

/// Join values into a list-valued cell.
pub fn format_list<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(&LIST_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_table(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(format!("{name}.csv")), body).unwrap();
    }

    #[test]
    fn test_missing_dir_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Table::read(&tmp.path().join("nope"), "T").err().unwrap();
        assert!(err.is_unreadable());
    }

    #[test]
    fn test_missing_table() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Table::read(tmp.path(), "T").err().unwrap();
        assert!(matches!(err, StoreError::MissingTable { table: "T", .. }));
        assert!(!err.is_unreadable());
    }

    #[test]
    fn test_scalars_and_lists() {
        let tmp = tempfile::tempdir().unwrap();
        write_table(tmp.path(), "T", "a,b,c\n3,1;2;3,\n4, 5 ; 6 ,x\n");
        let t = Table::read(tmp.path(), "T").unwrap();
        assert_eq!(t.len(), 2);
        let a = t.require("a").unwrap();
        let b = t.require("b").unwrap();
        let c = t.require("c").unwrap();
        assert_eq!(t.scalar::<i64>(0, a).unwrap(), 3);
        assert_eq!(t.list::<i32>(0, b).unwrap(), vec![1, 2, 3]);
        assert_eq!(t.list::<f64>(1, b).unwrap(), vec![5.0, 6.0]);
        assert!(t.list::<f64>(0, c).unwrap().is_empty());
        let err = t.list::<f64>(1, c).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { row: 1, .. }));
        assert!(matches!(
            t.require("d"),
            Err(StoreError::MissingColumn { column: "d", .. })
        ));
        assert_eq!(t.opt_scalar::<i64>(0, t.column("d")).unwrap(), None);
    }

    #[test]
    fn test_format_list() {
        assert_eq!(format_list(&[1.5, 2.0]), "1.5;2");
        assert_eq!(format_list::<i32>(&[]), "");
    }
}
