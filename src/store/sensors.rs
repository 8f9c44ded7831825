use std::path::Path;

use super::{StoreError, Table};

/// Sensor geometry side table, stored next to the simulation output.
pub const META_TABLE: &str = "meta";

const PMT_ID: &str = "pmtId";
const PMT_X: &str = "pmtX";
const PMT_Y: &str = "pmtY";
const PMT_Z: &str = "pmtZ";

/// Parallel sensor arrays from the first row of the geometry table, in the
/// store's native length unit. A column missing from the table is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorTable {
    pub ids: Option<Vec<i32>>,
    pub x: Option<Vec<f64>>,
    pub y: Option<Vec<f64>>,
    pub z: Option<Vec<f64>>,
}

impl SensorTable {
    /// Read the geometry table of a simulation store directory.
    ///
    /// Returns `Ok(None)` when the store has no geometry table.
    pub fn read<P: AsRef<Path>>(dir: P) -> Result<Option<SensorTable>, StoreError> {
        let t = match Table::read(dir.as_ref(), META_TABLE) {
            Ok(t) => t,
            Err(StoreError::MissingTable { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };
        if t.len() == 0 {
            return Ok(Some(SensorTable::default()));
        }
        Ok(Some(SensorTable {
            ids: t.column(PMT_ID).map(|c| t.list(0, c)).transpose()?,
            x: t.column(PMT_X).map(|c| t.list(0, c)).transpose()?,
            y: t.column(PMT_Y).map(|c| t.list(0, c)).transpose()?,
            z: t.column(PMT_Z).map(|c| t.list(0, c)).transpose()?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_sensor_table() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join("meta.csv"),
            "pmtId,pmtX,pmtY,pmtZ\n1;2,1000;-1000,0;0,500;500\n",
        )
        .unwrap();
        let table = SensorTable::read(tmp.path()).unwrap().unwrap();
        assert_eq!(table.ids, Some(vec![1, 2]));
        assert_eq!(table.x, Some(vec![1000.0, -1000.0]));
        assert_eq!(table.z, Some(vec![500.0, 500.0]));
    }

    #[test]
    fn test_absent_table_and_columns() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(SensorTable::read(tmp.path()).unwrap().is_none());

        std::fs::write(tmp.path().join("meta.csv"), "pmtId,pmtX\n1,0\n").unwrap();
        let table = SensorTable::read(tmp.path()).unwrap().unwrap();
        assert!(table.ids.is_some());
        assert!(table.y.is_none());
        assert!(table.z.is_none());
    }
}
