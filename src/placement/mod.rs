//! The placement directory decides which group of tablet servers owns which rows.
//!
//! It is built once, when the coordinator starts, from the ordered list of tablet servers in the
//! cluster config:
//!
//! 1. [`group_servers`] splits the servers into groups, round robin by node index.
//! 2. [`map_alphabet`] assigns each of the 256 possible leading bytes of a row key to a group.
//! 3. [`elect_primary`] elects one primary per group with a pluggable [`Election`] strategy.
//!
//! The resulting [`PlacementDirectory`] is never modified afterwards.
use std::convert::TryFrom;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TabletError};

mod election;

pub use self::election::{Election, FirstMemberElection, RandomElection};

/// the number of distinct leading bytes a row key can start with
pub const ALPHABET_SIZE: usize = 256;

/// A total mapping from the leading byte of a row key to a group number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct AlphabetMap {
    // indexed by the unsigned value of the byte
    groups: Vec<usize>,
}

impl AlphabetMap {
    /// returns the group that owns rows starting with `byte`
    pub fn group_for(&self, byte: u8) -> usize {
        self.groups[byte as usize]
    }

    /// iterates over every `(byte, group)` pair of the mapping
    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.groups
            .iter()
            .enumerate()
            .map(|(byte, group)| (byte as u8, *group))
    }
}

impl TryFrom<Vec<usize>> for AlphabetMap {
    type Error = TabletError;

    fn try_from(groups: Vec<usize>) -> Result<Self> {
        if groups.len() != ALPHABET_SIZE {
            return Err(TabletError::Parsing(format!(
                "an alphabet map needs {} entries, found {}",
                ALPHABET_SIZE,
                groups.len()
            )));
        }
        Ok(AlphabetMap { groups })
    }
}

impl From<AlphabetMap> for Vec<usize> {
    fn from(map: AlphabetMap) -> Self {
        map.groups
    }
}

/// Splits `nodes` into `num_groups` groups, in round robin fashion: node `i` is placed into
/// group `i % num_groups`. Groups hold indices into `nodes`.
///
/// Every node ends up in exactly one group and group sizes differ by at most one. When there
/// are fewer nodes than groups, the trailing groups are empty.
///
/// # Errors
/// returns [`TabletError::NoGroups`] if `num_groups` is zero
pub fn group_servers<T>(num_groups: usize, nodes: &[T]) -> Result<Vec<Vec<usize>>> {
    if num_groups == 0 {
        return Err(TabletError::NoGroups);
    }

    let mut groups = vec![Vec::new(); num_groups];
    for index in 0..nodes.len() {
        groups[index % num_groups].push(index);
    }
    Ok(groups)
}

/// Assigns every possible leading byte to one of `num_groups` groups, round robin.
///
/// Bytes are ordered as signed values, so the walk starts at `-128` (`0x80`) and ends at `127`
/// (`0x7f`): a byte whose signed value is `v` belongs to group `(v + 128) % num_groups`.
///
/// # Errors
/// returns [`TabletError::NoGroups`] if `num_groups` is zero
pub fn map_alphabet(num_groups: usize) -> Result<AlphabetMap> {
    if num_groups == 0 {
        return Err(TabletError::NoGroups);
    }

    let groups = (0..ALPHABET_SIZE)
        .map(|byte| signed_rank(byte as u8) % num_groups)
        .collect();
    Ok(AlphabetMap { groups })
}

/// the position of `byte` when all bytes are ordered by their signed value
fn signed_rank(byte: u8) -> usize {
    (byte as i8 as i16 + 128) as usize
}

/// Elects the primary of group number `group` using `election`.
///
/// # Errors
/// - [`TabletError::GroupOutOfRange`] if `group` is not a valid index into `groups`
/// - [`TabletError::EmptyGroup`] if the group has no members
pub fn elect_primary_for_group<E>(
    group: usize,
    groups: &[Vec<usize>],
    election: &mut E,
) -> Result<usize>
where
    E: Election + ?Sized,
{
    let members = groups.get(group).ok_or(TabletError::GroupOutOfRange {
        group,
        groups: groups.len(),
    })?;

    let primary = election
        .elect(members)
        .ok_or(TabletError::EmptyGroup(group))?;
    debug!(group, primary, "elected primary");
    Ok(primary)
}

/// Elects a primary for every group. Index `i` of the result is the primary of group `i`.
pub fn elect_primary<E>(groups: &[Vec<usize>], election: &mut E) -> Result<Vec<usize>>
where
    E: Election + ?Sized,
{
    (0..groups.len())
        .map(|group| elect_primary_for_group(group, groups, &mut *election))
        .collect()
}

/// The complete set of placement decisions for a cluster: which servers exist, which group each
/// one belongs to, which group owns each leading byte and which member of each group is the
/// primary.
///
/// Node indices are positions in the server list and are used everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementDirectory {
    index_to_server: Vec<SocketAddr>,
    groupno_to_indices: Vec<Vec<usize>>,
    letter_to_groupno: AlphabetMap,
    groupno_to_primary: Vec<usize>,
}

impl PlacementDirectory {
    /// Groups `servers` into `num_groups` groups, maps the alphabet onto the groups and elects a
    /// primary for each group.
    ///
    /// # Errors
    /// - [`TabletError::NoNodes`] if `servers` is empty
    /// - [`TabletError::NoGroups`] if `num_groups` is zero
    /// - [`TabletError::NotEnoughNodes`] if some group would be left without members
    pub fn build<E>(servers: Vec<SocketAddr>, num_groups: usize, election: &mut E) -> Result<Self>
    where
        E: Election + ?Sized,
    {
        if servers.is_empty() {
            return Err(TabletError::NoNodes);
        }
        if num_groups > servers.len() {
            return Err(TabletError::NotEnoughNodes {
                nodes: servers.len(),
                groups: num_groups,
            });
        }

        let groupno_to_indices = group_servers(num_groups, &servers)?;
        let letter_to_groupno = map_alphabet(num_groups)?;
        let groupno_to_primary = elect_primary(&groupno_to_indices, election)?;

        info!(
            servers = servers.len(),
            groups = num_groups,
            "placement directory built"
        );
        Ok(PlacementDirectory {
            index_to_server: servers,
            groupno_to_indices,
            letter_to_groupno,
            groupno_to_primary,
        })
    }

    /// the number of groups
    pub fn num_groups(&self) -> usize {
        self.groupno_to_indices.len()
    }

    /// all servers, ordered by node index
    pub fn servers(&self) -> &[SocketAddr] {
        &self.index_to_server
    }

    /// the address of the server with the given node index
    pub fn server(&self, index: usize) -> Option<SocketAddr> {
        self.index_to_server.get(index).copied()
    }

    /// the node indices of every group
    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groupno_to_indices
    }

    /// the node indices belonging to `group`
    pub fn members(&self, group: usize) -> Option<&[usize]> {
        self.groupno_to_indices.get(group).map(Vec::as_slice)
    }

    /// the leading byte to group mapping
    pub fn alphabet(&self) -> &AlphabetMap {
        &self.letter_to_groupno
    }

    /// the elected primaries, index `i` holding the primary of group `i`
    pub fn primaries(&self) -> &[usize] {
        &self.groupno_to_primary
    }

    /// the primary of `group`
    pub fn primary(&self, group: usize) -> Option<usize> {
        self.groupno_to_primary.get(group).copied()
    }

    /// the group owning `row`, decided by its first byte. `None` for an empty row key.
    pub fn group_for_row(&self, row: &str) -> Option<usize> {
        row.as_bytes()
            .first()
            .map(|byte| self.letter_to_groupno.group_for(*byte))
    }
}
