use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, instrument};

use super::{Columns, TabletEngine};
use crate::Result;

/// A [`TabletEngine`] backed by a [`DashMap`].
///
/// Rows are spread over the shards of the concurrent map and every shard has its own
/// read/write lock, so there is no store-wide lock at all. A row that becomes empty is removed
/// with a conditional remove that re-checks emptiness under the shard lock, so a concurrent
/// `put` into the same row is never lost.
///
/// [`DashMap`]: https://docs.rs/dashmap/latest/dashmap/struct.DashMap.html
#[derive(Debug, Clone, Default)]
pub struct ShardedTablet {
    rows: Arc<DashMap<String, Columns>>,
}

impl ShardedTablet {
    /// creates an empty `ShardedTablet`
    pub fn new() -> Self {
        ShardedTablet::default()
    }

    /// returns the number of rows currently held
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl TabletEngine for ShardedTablet {
    #[instrument(level = "trace", skip(self))]
    fn get(&self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .rows
            .get(row)
            .and_then(|columns| columns.get(col).cloned()))
    }

    #[instrument(level = "trace", skip(self, value), fields(len = value.len()))]
    fn put(&self, row: &str, col: &str, value: Vec<u8>) -> Result<()> {
        if let Some(mut columns) = self.rows.get_mut(row) {
            columns.insert(col.to_string(), value);
            return Ok(());
        }
        self.rows
            .entry(row.to_string())
            .or_default()
            .insert(col.to_string(), value);
        Ok(())
    }

    #[instrument(level = "trace", skip(self))]
    fn delete(&self, row: &str, col: &str) -> Result<bool> {
        let emptied = match self.rows.get_mut(row) {
            Some(mut columns) => {
                if columns.remove(col).is_none() {
                    return Ok(false);
                }
                columns.is_empty()
            }
            None => return Ok(false),
        };

        if emptied && self.rows.remove_if(row, |_, columns| columns.is_empty()).is_some() {
            debug!(row, "row is empty, removed it");
        }
        Ok(true)
    }
}
