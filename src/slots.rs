use crossbeam::channel::{self, Receiver, Sender};
use tracing::debug;

use crate::error::{Result, TabletError};

/// the default number of connections a server handles at the same time
pub const DEFAULT_SLOTS: usize = 100;

/// A fixed-size registry of connection slots.
///
/// Free slot indices wait in a bounded crossbeam channel, so taking a slot and giving it back are
/// both O(1). When every slot is taken, [`acquire`](ConnectionSlots::acquire) blocks until a
/// connection finishes and its [`Slot`] is dropped.
#[derive(Debug, Clone)]
pub struct ConnectionSlots {
    tx: Sender<usize>,
    rx: Receiver<usize>,
    capacity: usize,
}

impl ConnectionSlots {
    /// creates a registry with `capacity` free slots
    ///
    /// # Errors
    /// returns [`TabletError::Parsing`] if `capacity` is zero
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(TabletError::Parsing(
                "the number of connection slots must be greater than zero".to_string(),
            ));
        }

        let (tx, rx) = channel::bounded(capacity);
        for index in 0..capacity {
            tx.try_send(index)
                .map_err(|e| TabletError::StringErr(format!("could not fill slot registry: {}", e)))?;
        }
        Ok(ConnectionSlots { tx, rx, capacity })
    }

    /// takes a free slot, waiting for one to be released if there is none
    pub fn acquire(&self) -> Result<Slot> {
        let index = self
            .rx
            .recv()
            .map_err(|_| TabletError::StringErr("connection slot registry closed".to_string()))?;
        Ok(self.slot(index))
    }

    /// takes a free slot if there is one
    pub fn try_acquire(&self) -> Option<Slot> {
        self.rx.try_recv().ok().map(|index| self.slot(index))
    }

    /// the number of free slots
    pub fn available(&self) -> usize {
        self.rx.len()
    }

    /// the total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot(&self, index: usize) -> Slot {
        Slot {
            index,
            tx: self.tx.clone(),
        }
    }
}

/// A taken connection slot. The slot is returned to its registry when this is dropped.
#[derive(Debug)]
pub struct Slot {
    index: usize,
    tx: Sender<usize>,
}

impl Slot {
    /// the index of this slot within its registry
    pub fn index(&self) -> usize {
        self.index
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        if self.tx.send(self.index).is_err() {
            debug!(slot = self.index, "slot registry is gone, slot not returned");
        }
    }
}
