use std::thread;
use tracing::error;
use crate::Result;
use super::ThreadPool;

/// a simple thread-pool that is not actually a pool. It starts a new thread on every spawn
/// request, so every connection gets a thread of its own
#[derive(Debug)]
pub struct NaiveThreadPool;

impl ThreadPool for NaiveThreadPool {

    /// `threads` is ignored, threads are created on demand
    fn new(_threads: u32) -> Result<Self> {
        Ok(NaiveThreadPool)
    }

    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static {
        if let Err(e) = thread::Builder::new()
            .name("tablet-conn".into())
            .spawn(job)
        {
            error!("Failed to spawn a thread: {}", e);
        }
    }
}
