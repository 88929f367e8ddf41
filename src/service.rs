use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::command::{
    Request, Response, CREATION_FAILED, INTERNAL_FAILURE, NOT_FOUND, UNSUPPORTED,
};
use crate::engine::TabletEngine;
use crate::router::Router;

/// Executes parsed [`Request`]s and produces the [`Response`] to send back.
///
/// A service is cloned into every connection handler, so clones must share their state.
pub trait Service: Clone + Send + 'static {
    /// executes `request`. Failures are reported as [`Response::Err`], never as a panic.
    fn execute(&self, request: Request) -> Response;
}

/// Serves `GET`, `PUT` and `DEL` from a [`TabletEngine`].
#[derive(Debug, Clone)]
pub struct TabletService<E: TabletEngine> {
    engine: E,
}

impl<E: TabletEngine> TabletService<E> {
    /// creates a service over `engine`
    pub fn new(engine: E) -> Self {
        TabletService { engine }
    }

    /// the engine requests are executed on
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl<E: TabletEngine> Service for TabletService<E> {
    fn execute(&self, request: Request) -> Response {
        match request {
            Request::Get { row, col } => match self.engine.get(&row, &col) {
                Ok(Some(value)) => Response::Ok(Some(value)),
                Ok(None) => Response::err(NOT_FOUND),
                Err(e) => {
                    error!("GET {} {} failed: {}", row, col, e);
                    Response::err(INTERNAL_FAILURE)
                }
            },
            Request::Put { row, col, value } => match self.engine.put(&row, &col, value) {
                Ok(()) => Response::Ok(None),
                Err(e) => {
                    error!("PUT {} {} failed: {}", row, col, e);
                    Response::err(CREATION_FAILED)
                }
            },
            Request::Del { row, col } => match self.engine.delete(&row, &col) {
                Ok(true) => Response::Ok(None),
                Ok(false) => Response::err(NOT_FOUND),
                Err(e) => {
                    error!("DEL {} {} failed: {}", row, col, e);
                    Response::err(INTERNAL_FAILURE)
                }
            },
            Request::Exit => Response::Goodbye,
            other => {
                debug!("tablet server does not serve {:?}", other);
                Response::err(UNSUPPORTED)
            }
        }
    }
}

/// Serves `LOOKUP`, `DIRECTORY` and `PING` from a [`Router`].
#[derive(Debug, Clone)]
pub struct CoordinatorService {
    router: Arc<Router>,
}

impl CoordinatorService {
    /// creates a service over `router`
    pub fn new(router: Arc<Router>) -> Self {
        CoordinatorService { router }
    }
}

impl Service for CoordinatorService {
    fn execute(&self, request: Request) -> Response {
        match request {
            Request::Lookup { row } => match self.router.lookup(&row) {
                Some(addr) => Response::Ok(Some(addr.to_string().into_bytes())),
                None => {
                    warn!(row = row.as_str(), "no server owns row");
                    Response::err(NOT_FOUND)
                }
            },
            Request::Directory => match serde_json::to_vec(self.router.directory()) {
                Ok(json) => Response::Ok(Some(json)),
                Err(e) => {
                    error!("could not serialize the placement directory: {}", e);
                    Response::err(INTERNAL_FAILURE)
                }
            },
            // heartbeats are acknowledged but do not change any placement decision
            Request::Ping { index } => match self.router.directory().server(index) {
                Some(addr) => {
                    info!(index, "heartbeat from {}", addr);
                    Response::Ok(None)
                }
                None => {
                    warn!(index, "heartbeat from unknown node");
                    Response::err(NOT_FOUND)
                }
            },
            Request::Exit => Response::Goodbye,
            other => {
                debug!("coordinator does not serve {:?}", other);
                Response::err(UNSUPPORTED)
            }
        }
    }
}
