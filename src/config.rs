use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TabletError};

/// The static layout of a cluster, read from an ip-config file.
///
/// The file holds one `ip:port` address per line. The first address is the coordinator's, every
/// following address is a tablet server, whose node index is its position among the tablet
/// server lines (starting at 0). Blank lines and lines starting with `#` are ignored.
///
/// ```text
/// # coordinator
/// 127.0.0.1:5000
/// # tablet servers 0..3
/// 127.0.0.1:5001
/// 127.0.0.1:5002
/// 127.0.0.1:5003
/// 127.0.0.1:5004
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    coordinator: SocketAddr,
    servers: Vec<SocketAddr>,
}

impl ClusterConfig {
    /// creates a config from already known addresses
    pub fn new(coordinator: SocketAddr, servers: Vec<SocketAddr>) -> Self {
        ClusterConfig {
            coordinator,
            servers,
        }
    }

    /// reads and parses the ip-config file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("reading cluster config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        ClusterConfig::parse(&contents)
    }

    /// parses the contents of an ip-config file
    ///
    /// # Errors
    /// returns [`TabletError::Config`] naming the offending line if an address does not parse,
    /// or if there is no coordinator line at all
    pub fn parse(contents: &str) -> Result<Self> {
        let mut addrs = Vec::new();
        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let addr: SocketAddr = line.parse().map_err(|_| TabletError::Config {
                line: number + 1,
                reason: format!("could not parse {} into an IP address and port", line),
            })?;
            addrs.push(addr);
        }

        if addrs.is_empty() {
            return Err(TabletError::Config {
                line: 1,
                reason: "missing the coordinator address".to_string(),
            });
        }
        let coordinator = addrs.remove(0);
        Ok(ClusterConfig::new(coordinator, addrs))
    }

    /// the coordinator's address
    pub fn coordinator(&self) -> SocketAddr {
        self.coordinator
    }

    /// the tablet servers, ordered by node index
    pub fn servers(&self) -> &[SocketAddr] {
        &self.servers
    }

    /// the address of tablet server `index`
    pub fn server(&self, index: usize) -> Result<SocketAddr> {
        self.servers.get(index).copied().ok_or_else(|| {
            TabletError::Parsing(format!(
                "there is no tablet server with index {}, the config lists {}",
                index,
                self.servers.len()
            ))
        })
    }
}
