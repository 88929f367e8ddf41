use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::trace;

use crate::placement::PlacementDirectory;
use crate::TabletError;

/// Which member of the owning group a lookup returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberSelection {
    /// always the elected primary of the group
    Primary,
    /// every member of the group in turn
    RoundRobin,
}

impl Default for MemberSelection {
    fn default() -> Self {
        MemberSelection::Primary
    }
}

impl FromStr for MemberSelection {
    type Err = TabletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(MemberSelection::Primary),
            "round-robin" => Ok(MemberSelection::RoundRobin),
            other => Err(TabletError::Parsing(format!(
                "unknown member selection: {}, expected 'primary' or 'round-robin'",
                other
            ))),
        }
    }
}

impl fmt::Display for MemberSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberSelection::Primary => write!(f, "primary"),
            MemberSelection::RoundRobin => write!(f, "round-robin"),
        }
    }
}

/// Answers "which tablet server holds this row?" from a [`PlacementDirectory`].
///
/// A `Router` can only be created from a directory that is already built, and the directory is
/// never modified afterwards, so lookups are plain reads and the router can be shared between
/// threads without locking. The only mutable state is the per-group cursor used by
/// [`MemberSelection::RoundRobin`].
#[derive(Debug)]
pub struct Router {
    directory: PlacementDirectory,
    selection: MemberSelection,
    cursors: Vec<AtomicUsize>,
}

impl Router {
    /// creates a router over a fully built `directory`
    pub fn new(directory: PlacementDirectory, selection: MemberSelection) -> Self {
        let cursors = (0..directory.num_groups())
            .map(|_| AtomicUsize::new(0))
            .collect();
        Router {
            directory,
            selection,
            cursors,
        }
    }

    /// the directory this router reads from
    pub fn directory(&self) -> &PlacementDirectory {
        &self.directory
    }

    /// the member selection policy in use
    pub fn selection(&self) -> MemberSelection {
        self.selection
    }

    /// Returns the node index of the server that should serve `row`.
    ///
    /// Returns `None` if `row` is empty, or if the directory has no member for the row's group.
    pub fn route(&self, row: &str) -> Option<usize> {
        let group = self.directory.group_for_row(row)?;
        let node = match self.selection {
            MemberSelection::Primary => self.directory.primary(group)?,
            MemberSelection::RoundRobin => {
                let members = self.directory.members(group)?;
                if members.is_empty() {
                    return None;
                }
                let turn = self.cursors.get(group)?.fetch_add(1, Ordering::Relaxed);
                members[turn % members.len()]
            }
        };
        trace!(row, group, node, "routed row");
        Some(node)
    }

    /// Returns the address of the server that should serve `row`.
    pub fn lookup(&self, row: &str) -> Option<SocketAddr> {
        self.route(row).and_then(|node| self.directory.server(node))
    }
}
