//! Thread pools that run connection handlers.
//!
//! - [`NaiveThreadPool`] starts a new thread for every job, i.e. one thread per connection
//! - [`SharedQueueThreadPool`] feeds a fixed number of worker threads from a crossbeam channel
//! - [`RayonThreadPool`] hands jobs to a [`rayon`] work-stealing pool
//!
//! [`rayon`]: https://docs.rs/rayon/latest/rayon/
use crate::Result;

mod naive;
mod rayon_pool;
mod shared_queue;

pub use self::naive::NaiveThreadPool;
pub use self::rayon_pool::RayonThreadPool;
pub use self::shared_queue::SharedQueueThreadPool;

/// A pool of threads that jobs can be spawned onto
pub trait ThreadPool {
    /// Creates a new thread pool with `threads` threads.
    ///
    /// # Errors
    /// returns an error if `threads` is zero for a pool that needs workers, or if a thread
    /// could not be created
    fn new(threads: u32) -> Result<Self>
    where
        Self: Sized;

    /// Runs `job` on a thread of the pool
    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static;
}
