use crate::command::{Request, Response, PARSER_FAILURE};
use crate::protocol::{write_line, LineReader, DELIMITER};
use crate::service::Service;
use crate::slots::{ConnectionSlots, Slot, DEFAULT_SLOTS};
use crate::thread_pool::ThreadPool;
use crate::Result;
use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info};

/// A TCP socket server over a [`Service`].
/// It listens for incoming connections on a [`SocketAddr`](https://doc.rust-lang.org/std/net/enum.SocketAddr.html),
/// gives every connection one of a fixed number of connection slots, and then serves the
/// connection on a thread of its [`ThreadPool`].
///
/// Each connection handler receives a clone of the service, reads `\r\n`-terminated commands,
/// and writes one status line back for each command until the client sends `EXIT` or hangs up.
///
/// # Example
/// Create a tablet server listening on "127.0.0.1:4000", running every connection on its own
/// thread
/// ```rust
/// use tabletkv::{Server, Tablet, TabletService};
/// use tabletkv::thread_pool::{NaiveThreadPool, ThreadPool};
/// # use std::error::Error;
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let pool = NaiveThreadPool::new(0)?;
/// let service = TabletService::new(Tablet::new());
/// let server = Server::new(service, pool)?;
/// // server.run("127.0.0.1:4000")?;
/// # Ok(())
/// # }
/// ```
pub struct Server<S: Service, P: ThreadPool> {
    /// the service executing requests
    service: S,
    /// a pool of threads that run the connection handlers
    pool: P,
    /// limits the number of connections served at once
    slots: ConnectionSlots,
    /// written before every command, for people typing into a raw TCP session
    prompt: Option<String>,
}

impl<S: Service, P: ThreadPool> Server<S, P> {
    /// Create a new `Server` with [`DEFAULT_SLOTS`] connection slots
    pub fn new(service: S, pool: P) -> Result<Self> {
        Ok(Server {
            service,
            pool,
            slots: ConnectionSlots::new(DEFAULT_SLOTS)?,
            prompt: None,
        })
    }

    /// replaces the connection slot registry with one holding `capacity` slots
    pub fn with_slots(mut self, capacity: usize) -> Result<Self> {
        self.slots = ConnectionSlots::new(capacity)?;
        Ok(self)
    }

    /// writes `prompt` to the client before reading each command
    pub fn with_prompt<T: Into<String>>(mut self, prompt: T) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// starts a server listening on the given address.
    ///
    /// # Errors
    /// returns [`TabletError`] if the server could not be started
    ///
    /// [`TabletError`]: ./enum.TabletError.html
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        info!("Listening on {}", listener.local_addr()?);
        self.serve(listener)
    }

    /// Accepts connections on an already bound `listener`, forever.
    /// A free connection slot is taken before each accept, so once every slot is in use new
    /// connections wait in the listen backlog.
    pub fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            let slot = self.slots.acquire()?;
            match listener.accept() {
                Ok((stream, peer)) => {
                    info!("[{}] Accepted new connection from {}", slot.index(), peer);
                    let service = self.service.clone();
                    let prompt = self.prompt.clone();
                    self.pool.spawn(move || {
                        if let Err(e) = serve(service, stream, &slot, prompt.as_deref()) {
                            error!("[{}] Error on serving client: {}", slot.index(), e);
                        }
                    });
                }
                Err(e) => error!("Connection failed: {}", e),
            }
        }
    }
}

/// Reads commands from the given `tcp` stream until `EXIT` or end of stream.
/// Each command is parsed, executed by the service, and answered with exactly one status line.
/// Lines that do not parse are answered with a parser failure and the connection stays open.
fn serve<S: Service>(service: S, tcp: TcpStream, slot: &Slot, prompt: Option<&str>) -> Result<()> {
    let peer_addr = tcp.peer_addr()?;
    let mut reader = LineReader::new(BufReader::new(&tcp), DELIMITER);
    let mut writer = BufWriter::new(&tcp);

    loop {
        if let Some(prompt) = prompt {
            writer.write_all(prompt.as_bytes())?;
            writer.flush()?;
        }

        let line = match reader.read_line()? {
            Some(line) => line,
            None => break,
        };

        let response = match Request::parse(&line) {
            Ok(request) => {
                debug!("[{}] Receive request from {}: {:?}", slot.index(), peer_addr, request);
                service.execute(request)
            }
            Err(e) => {
                debug!("[{}] Invalid request from {}: {}", slot.index(), peer_addr, e);
                Response::err(PARSER_FAILURE)
            }
        };

        write_line(&mut writer, &response.to_bytes(), DELIMITER)?;
        debug!("[{}] Response sent to {}: {}", slot.index(), peer_addr, response);

        if response == Response::Goodbye {
            debug!("[{}] Exiting", slot.index());
            break;
        }
    }
    Ok(())
}
