use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::command::{Request, Response, NOT_FOUND};
use crate::placement::PlacementDirectory;
use crate::protocol::{write_line, LineReader, DELIMITER};
use crate::{Result, TabletError};

/// A connection that sends one command and reads one status line back at a time
struct Connection {
    reader: LineReader<BufReader<TcpStream>>,
    writer: BufWriter<TcpStream>,
}

impl Connection {
    fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;

        Ok(Connection {
            reader: LineReader::new(BufReader::new(tcp_reader), DELIMITER),
            writer: BufWriter::new(tcp_writer),
        })
    }

    fn call(&mut self, request: &Request) -> Result<Response> {
        request.validate()?;
        write_line(&mut self.writer, &request.to_bytes(), DELIMITER)?;

        let line = self.reader.read_line()?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "server closed the connection")
        })?;
        let response = Response::parse(&line)?;
        debug!("{:?} -> {}", request, response);
        Ok(response)
    }

    fn exit(&mut self) -> Result<()> {
        match self.call(&Request::Exit)? {
            Response::Goodbye => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

/// turns a response that is neither success nor "not found" into an error
fn unexpected(response: Response) -> TabletError {
    match response {
        Response::Err(reason) => TabletError::StringErr(reason),
        other => TabletError::StringErr(format!("unexpected response: {}", other)),
    }
}

/// `TabletClient` talks to a single tablet server
pub struct TabletClient {
    conn: Connection,
}

impl TabletClient {
    /// creates a client and establishes a socket connection to the tablet server at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Ok(TabletClient {
            conn: Connection::connect(addr)?,
        })
    }

    /// gets the blob stored at (`row`, `col`)
    /// ## Returns
    /// `Ok(Some(blob))` if the cell exists, `Ok(None)` if it does not
    pub fn get(&mut self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        let req = Request::Get {
            row: row.to_string(),
            col: col.to_string(),
        };
        match self.conn.call(&req)? {
            Response::Ok(value) => Ok(Some(value.unwrap_or_default())),
            Response::Err(reason) if reason == NOT_FOUND => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// stores `value` at (`row`, `col`)
    /// # Errors
    /// `TabletError::Parsing` if a key contains a space or the value a line break,
    /// `TabletError::StringErr` if the server could not store the value
    pub fn put(&mut self, row: &str, col: &str, value: &[u8]) -> Result<()> {
        let req = Request::Put {
            row: row.to_string(),
            col: col.to_string(),
            value: value.to_vec(),
        };
        match self.conn.call(&req)? {
            Response::Ok(_) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// removes the blob at (`row`, `col`)
    /// ## Returns
    /// `Ok(true)` if it was removed, `Ok(false)` if it did not exist
    pub fn delete(&mut self, row: &str, col: &str) -> Result<bool> {
        let req = Request::Del {
            row: row.to_string(),
            col: col.to_string(),
        };
        match self.conn.call(&req)? {
            Response::Ok(_) => Ok(true),
            Response::Err(reason) if reason == NOT_FOUND => Ok(false),
            other => Err(unexpected(other)),
        }
    }

    /// says goodbye to the server and closes the connection
    pub fn exit(mut self) -> Result<()> {
        self.conn.exit()
    }
}

/// `CoordinatorClient` asks the coordinator where rows live
pub struct CoordinatorClient {
    conn: Connection,
}

impl CoordinatorClient {
    /// creates a client and establishes a socket connection to the coordinator at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Ok(CoordinatorClient {
            conn: Connection::connect(addr)?,
        })
    }

    /// returns the address of the tablet server responsible for `row`, or `None` if no server
    /// owns it
    pub fn lookup(&mut self, row: &str) -> Result<Option<SocketAddr>> {
        let req = Request::Lookup {
            row: row.to_string(),
        };
        match self.conn.call(&req)? {
            Response::Ok(Some(addr)) => {
                let addr = String::from_utf8_lossy(&addr);
                addr.parse::<SocketAddr>().map(Some).map_err(|_| {
                    TabletError::Parsing(format!("could not parse {} into an IP address and port", addr))
                })
            }
            Response::Err(reason) if reason == NOT_FOUND => Ok(None),
            other => Err(unexpected(other)),
        }
    }

    /// fetches the coordinator's complete placement directory
    pub fn directory(&mut self) -> Result<PlacementDirectory> {
        match self.conn.call(&Request::Directory)? {
            Response::Ok(Some(json)) => Ok(serde_json::from_slice(&json)?),
            other => Err(unexpected(other)),
        }
    }

    /// sends a heartbeat on behalf of tablet server `index`
    pub fn ping(&mut self, index: usize) -> Result<()> {
        match self.conn.call(&Request::Ping { index })? {
            Response::Ok(_) => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// says goodbye to the coordinator and closes the connection
    pub fn exit(mut self) -> Result<()> {
        self.conn.exit()
    }
}

/// `ClusterClient` runs every operation against the tablet server the coordinator names for
/// its row
pub struct ClusterClient {
    coordinator: CoordinatorClient,
}

impl ClusterClient {
    /// connects to the coordinator at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Ok(ClusterClient {
            coordinator: CoordinatorClient::connect(addr)?,
        })
    }

    /// connects to the tablet server owning `row`
    fn tablet_for(&mut self, row: &str) -> Result<TabletClient> {
        let addr = self.coordinator.lookup(row)?.ok_or_else(|| {
            TabletError::StringErr(format!("no tablet server owns row {}", row))
        })?;
        debug!(row, "routing to {}", addr);
        TabletClient::connect(addr)
    }

    /// returns the address of the tablet server owning `row`
    pub fn lookup(&mut self, row: &str) -> Result<Option<SocketAddr>> {
        self.coordinator.lookup(row)
    }

    /// see [`TabletClient::get`]
    pub fn get(&mut self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        let mut tablet = self.tablet_for(row)?;
        let value = tablet.get(row, col)?;
        tablet.exit()?;
        Ok(value)
    }

    /// see [`TabletClient::put`]
    pub fn put(&mut self, row: &str, col: &str, value: &[u8]) -> Result<()> {
        let mut tablet = self.tablet_for(row)?;
        tablet.put(row, col, value)?;
        tablet.exit()
    }

    /// see [`TabletClient::delete`]
    pub fn delete(&mut self, row: &str, col: &str) -> Result<bool> {
        let mut tablet = self.tablet_for(row)?;
        let removed = tablet.delete(row, col)?;
        tablet.exit()?;
        Ok(removed)
    }

    /// says goodbye to the coordinator and closes the connection
    pub fn exit(self) -> Result<()> {
        self.coordinator.exit()
    }
}
