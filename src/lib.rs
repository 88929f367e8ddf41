#![deny(missing_docs)]
//! A sharded, in-memory store mapping (row, column) keys to opaque byte blobs.
//!
//! The cluster is made of two kinds of processes:
//!
//! - **tablet servers**, each holding one [`Tablet`]: a concurrent two-level
//! `row -> column -> blob` map serving `GET`, `PUT` and `DEL`
//! - one **coordinator**, which splits the tablet servers into groups, assigns every possible
//! leading byte of a row key to a group, elects a primary in every group, and answers `LOOKUP`
//! requests with the address of the server holding a row
//!
//! A client first asks the coordinator where a row lives, then talks to that tablet server.
//! Nothing is persisted: all data lives in memory and is lost when a tablet server stops.
//!
//! ## Tablet
//! [`Tablet`] is the default implementor of the [`TabletEngine`] trait. Every row has its own
//! lock, so operations on different rows never wait for each other, and a single admin lock
//! guards the creation and destruction of row locks. [`ShardedTablet`] is an alternative engine
//! built on a concurrent hash map.
//!
//! ## Placement
//! The [`placement`] module builds the [`PlacementDirectory`] once when the coordinator starts,
//! and the [`Router`] answers lookups from it. Primaries are chosen by a pluggable
//! [`Election`] strategy.
//!
//! ## Protocol
//! Clients and servers exchange single-line text commands terminated by `\r\n`:
//!
//! ```text
//! GET <row> <col>            -> +250 OK <bytes> | -550 Resource Does Not Exist
//! PUT <row> <col> <bytes>    -> +250 OK        | -550 Resource Creation Failed
//! DEL <row> <col>            -> +250 OK        | -550 Resource Does Not Exist
//! LOOKUP <row>               -> +250 OK <ip:port>
//! EXIT                       -> +950 GOODBYE
//! ```
//!
//! See [`Request`] and [`Response`] for the complete command set.
//!
//! ### Executables
//! - `tablet-server` hosts a tablet
//! - `coordinator` hosts the placement directory
//! - `tablet-client` runs a single command against the cluster
//! - `tablet-shell` is an interactive prompt over a local, in-process tablet
//!
//! [`placement`]: ./placement/index.html

pub use client::{ClusterClient, CoordinatorClient, TabletClient};
pub use command::{Request, Response};
pub use config::ClusterConfig;
pub use engine::{ShardedTablet, Tablet, TabletEngine};
pub use error::{Result, TabletError};
pub use placement::{Election, FirstMemberElection, PlacementDirectory, RandomElection};
pub use router::{MemberSelection, Router};
pub use server::Server;
pub use service::{CoordinatorService, Service, TabletService};
pub use slots::{ConnectionSlots, Slot, DEFAULT_SLOTS};
pub use thread_pool::{NaiveThreadPool, RayonThreadPool, SharedQueueThreadPool, ThreadPool};

mod client;
pub mod command;
mod config;
mod engine;
mod error;
pub mod placement;
pub mod protocol;
mod router;
mod server;
mod service;
mod slots;
pub mod thread_pool;
