use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument};

use super::{Columns, TabletEngine};
use crate::error::{Result, TabletError};

/// A row lock. The mutex owns the row's columns, so holding the lock is the only way to touch
/// the row's data, and dropping the last handle to it is the only way to destroy it.
type RowLock = Arc<Mutex<Columns>>;

/// An in-memory, two-level `row -> column -> blob` store that is safe to share between
/// connection threads.
///
/// Every row is guarded by its own lock, created lazily on the first write to the row and
/// destroyed when the last column of the row is deleted. The map of row locks is itself guarded
/// by a single *admin* lock. Locks are always taken admin first, row second:
///
/// - `get` and `put` hold the admin lock only long enough to find (or, for `put`, create) the
///   row lock and acquire it. The admin lock is released before the row is read or written, so
///   operations on different rows run concurrently.
/// - `delete` holds the admin lock for the entire operation. If the delete empties the row, the
///   row lock is released and its map entry erased while the admin lock is still held, so no
///   other thread can be about to acquire a lock that is being destroyed.
///
/// Lock failures (a thread panicked while holding a lock) are reported as
/// [`TabletError::LockPoisoned`] instead of panicking the caller.
#[derive(Debug, Clone, Default)]
pub struct Tablet {
    // the admin lock and the row locks it guards
    locks: Arc<Mutex<HashMap<String, RowLock>>>,
}

impl Tablet {
    /// creates an empty `Tablet`
    pub fn new() -> Self {
        Tablet::default()
    }

    /// returns the number of rows currently held by the tablet. Every live row owns exactly one
    /// row lock, so this is also the number of row locks.
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.locks.lock()?.len())
    }
}

impl TabletEngine for Tablet {
    /// copies the blob stored at (`row`, `col`) out of the tablet.
    /// Looking up a row that does not exist does not create a lock for it.
    #[instrument(level = "trace", skip(self))]
    fn get(&self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        let locks = self.locks.lock()?;
        let row_lock = match locks.get(row) {
            Some(lock) => Arc::clone(lock),
            None => return Ok(None),
        };
        let columns = row_lock.lock()?;
        drop(locks);

        Ok(columns.get(col).cloned())
    }

    /// inserts or overwrites the blob at (`row`, `col`).
    ///
    /// # Errors
    /// returns [`TabletError::ResourceExhausted`] if a lock for a new row could not be
    /// allocated. The row is left absent in that case.
    #[instrument(level = "trace", skip(self, value), fields(len = value.len()))]
    fn put(&self, row: &str, col: &str, value: Vec<u8>) -> Result<()> {
        let mut locks = self.locks.lock()?;
        let row_lock = match locks.get(row) {
            Some(lock) => Arc::clone(lock),
            None => {
                locks
                    .try_reserve(1)
                    .map_err(|_| TabletError::ResourceExhausted(row.to_string()))?;
                let lock: RowLock = Arc::new(Mutex::new(Columns::new()));
                locks.insert(row.to_string(), Arc::clone(&lock));
                debug!(row, "created row lock");
                lock
            }
        };
        let mut columns = row_lock.lock()?;
        drop(locks);

        columns.insert(col.to_string(), value);
        Ok(())
    }

    /// removes the blob at (`row`, `col`), returning `false` if it did not exist.
    /// If the row is now empty, the row and its lock are removed as well.
    #[instrument(level = "trace", skip(self))]
    fn delete(&self, row: &str, col: &str) -> Result<bool> {
        // held until the end of the function
        let mut locks = self.locks.lock()?;
        let row_lock = match locks.get(row) {
            Some(lock) => Arc::clone(lock),
            None => return Ok(false),
        };
        let mut columns = row_lock.lock()?;

        if columns.remove(col).is_none() {
            return Ok(false);
        }

        if columns.is_empty() {
            drop(columns);
            locks.remove(row);
            debug!(row, "row is empty, destroyed its lock");
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crossbeam::channel;

    use super::*;

    fn row_lock(tablet: &Tablet, row: &str) -> RowLock {
        Arc::clone(&tablet.locks.lock().unwrap()[row])
    }

    #[test]
    fn held_row_lock_only_blocks_its_own_row() {
        let tablet = Tablet::new();
        tablet.put("busy", "c", b"held".to_vec()).unwrap();
        tablet.put("idle", "c", b"free".to_vec()).unwrap();

        let busy = row_lock(&tablet, "busy");
        let guard = busy.lock().unwrap();

        // other rows, existing or new, are served while "busy" is locked
        let (tx, rx) = channel::bounded(1);
        let handle = tablet.clone();
        let worker = thread::spawn(move || {
            handle.put("idle", "c2", b"written".to_vec()).unwrap();
            handle.put("fresh", "c", b"new".to_vec()).unwrap();
            let value = handle.get("idle", "c").unwrap();
            let removed = handle.delete("fresh", "c").unwrap();
            tx.send((value, removed)).unwrap();
        });
        let (value, removed) = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("an operation on another row waited for the held row lock");
        assert_eq!(value, Some(b"free".to_vec()));
        assert!(removed);
        worker.join().unwrap();

        // the locked row itself waits until the lock is released
        let (tx, rx) = channel::bounded(1);
        let handle = tablet.clone();
        let waiter = thread::spawn(move || {
            tx.send(handle.get("busy", "c").unwrap()).unwrap();
        });
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        drop(guard);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            Some(b"held".to_vec())
        );
        waiter.join().unwrap();
        assert_eq!(tablet.get("idle", "c2").unwrap(), Some(b"written".to_vec()));
    }
}
