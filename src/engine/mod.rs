//! This module provides the row/column storage engines a tablet server can host.
//! The two engines that are implemented are [`Tablet`], which guards every row with its own
//! lock and serializes changes to the set of row locks with a single admin lock, and
//! [`ShardedTablet`], which lets the shards of a [`dashmap`] concurrent hash map do the locking.
//!
//! [`dashmap`]: https://docs.rs/dashmap/latest/dashmap/
use crate::Result;

/// A trait for the basic functionality of a two-level (row, column) storage engine.
///
/// Engines are cheap to clone; every clone is a handle to the same underlying data so that each
/// connection thread can hold its own copy.
pub trait TabletEngine: Clone + Send + 'static {
    /// Gets a copy of the blob stored at (`row`, `col`)
    ///
    /// Returns `None` if the row, or the column within it, does not exist.
    fn get(&self, row: &str, col: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` at (`row`, `col`), creating the row if needed
    ///
    /// If the cell already exists its previous value will be overwritten.
    ///
    /// # Errors
    ///
    /// Returns `TabletError::ResourceExhausted` if the row could not be created.
    fn put(&self, row: &str, col: &str, value: Vec<u8>) -> Result<()>;

    /// Removes the blob stored at (`row`, `col`)
    ///
    /// Returns `false` if there was nothing to remove. Removing the last column of a row removes
    /// the row itself.
    fn delete(&self, row: &str, col: &str) -> Result<bool>;
}

mod sharded;
mod tablet;

pub use self::sharded::ShardedTablet;
pub use self::tablet::Tablet;

/// the columns of a single row
pub(crate) type Columns = std::collections::HashMap<String, Vec<u8>>;
