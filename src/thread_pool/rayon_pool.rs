use crate::{ThreadPool, Result, TabletError};
use tracing::{debug};

/// A thread pool that uses a work stealing strategy as implemented by the [`Rayon`] library.
///
/// Connection handlers block on their socket for as long as the connection is open, so a
/// connection only starts being served once one of the `threads` workers is free.
///
/// [`Rayon`]: https://docs.rs/rayon/latest/rayon/index.html
pub struct RayonThreadPool {
    pool: rayon::ThreadPool,
}

impl ThreadPool for RayonThreadPool {

    fn new(threads: u32) -> Result<Self> where Self: Sized {
        if threads == 0 {
            return Err(TabletError::Parsing("a rayon pool needs at least one thread".to_string()));
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads as usize)
            .thread_name(|i| format!("tablet-rayon-{}", i))
            .build()
            .map_err(|e|
                TabletError::StringErr(format!("could not build thread pool: {:?}", &e)))?;
        debug!("created thread pool with {} threads", &threads);

        Ok(
            Self { pool }
        )
    }

    fn spawn<F>(&self, job: F) where F: FnOnce() + Send + 'static {
        self.pool.spawn(job);
    }
}
