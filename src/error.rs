use thiserror::Error;

/// type alias for all operations in this crate that could fail with a [`TabletError`]
pub type Result<T> = std::result::Result<T, TabletError>;

/// The Error variants used throughout the tablet store, the placement directory and the
/// networking layer.
///
/// Absence of a row or column is never an error: lookups return `Option` and deletes return
/// `bool`. These variants cover configuration mistakes and genuinely unexpected failures.
#[derive(Error, Debug)]
pub enum TabletError {
    /// variant for errors caused by socket or file IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// a command line, config value or protocol line could not be parsed
    #[error("parse error: {0}")]
    Parsing(String),

    /// the cluster ip-config file is invalid
    #[error("invalid config at line {line}: {reason}")]
    Config {
        /// 1-based line number in the config file
        line: usize,
        /// what was wrong with it
        reason: String,
    },

    /// zero groups were requested
    #[error("the number of groups must be greater than zero")]
    NoGroups,

    /// a group number outside of `0..groups` was used
    #[error("group {group} is out of range, there are {groups} groups")]
    GroupOutOfRange {
        /// the offending group number
        group: usize,
        /// the number of groups that exist
        groups: usize,
    },

    /// a primary was requested for a group without members
    #[error("group {0} has no members to elect a primary from")]
    EmptyGroup(usize),

    /// more groups were requested than there are nodes to fill them
    #[error("cannot split {nodes} node(s) into {groups} groups")]
    NotEnoughNodes {
        /// number of configured nodes
        nodes: usize,
        /// number of requested groups
        groups: usize,
    },

    /// the node list is empty
    #[error("no tablet servers are configured")]
    NoNodes,

    /// space for a new row lock could not be reserved
    #[error("could not allocate a lock for row {0}")]
    ResourceExhausted(String),

    /// a thread panicked while holding one of the store's locks
    #[error("a tablet lock was poisoned")]
    LockPoisoned,

    /// serialization of the placement directory failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// an error message received from a remote server
    #[error("{0}")]
    StringErr(String),
}

impl<T> From<std::sync::PoisonError<T>> for TabletError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        TabletError::LockPoisoned
    }
}
