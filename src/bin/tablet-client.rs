//! The tablet-client executable supports the following command line arguments:
//!
//! `tablet-client put <ROW> <COL> <VALUE> [--coordinator IP-PORT | --server IP-PORT]`
//!
//!     Store VALUE at (ROW, COL).
//!
//! `tablet-client get <ROW> <COL> [--coordinator IP-PORT | --server IP-PORT]`
//!
//!     Print the value stored at (ROW, COL), or "Resource not found".
//!
//! `tablet-client del <ROW> <COL> [--coordinator IP-PORT | --server IP-PORT]`
//!
//!     Remove the value stored at (ROW, COL). A missing value is treated as an error.
//!
//! `tablet-client lookup <ROW> [--coordinator IP-PORT]`
//!
//!     Print the address of the tablet server holding ROW.
//!
//! By default requests are routed through the coordinator at 127.0.0.1:5000. With --server,
//! the request is sent straight to the given tablet server instead.


use std::net::SocketAddr;
use std::process::exit;
use clap::{crate_version, App, Arg, SubCommand, ArgMatches};
use tabletkv::{ClusterClient, CoordinatorClient, Request, Result, TabletClient, TabletError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_COORDINATOR: &str = "127.0.0.1:5000";

/// where requests are sent
#[derive(Debug)]
enum Target {
    Coordinator(SocketAddr),
    Server(SocketAddr),
}

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    target: Target,
    req: Request,
}

impl Opt {
    /// validates the address parameters and the request
    /// # Errors
    /// returns [`TabletError::Parsing`] if one of the parameters is invalid
    ///
    fn build(matches: &ArgMatches, req: Request) -> Result<Opt> {
        let target = match matches.value_of("server") {
            Some(addr) => Target::Server(parse_addr(addr)?),
            None => Target::Coordinator(parse_addr(
                matches.value_of("coordinator").unwrap_or(DEFAULT_COORDINATOR),
            )?),
        };
        req.validate()?;
        Ok(Opt { target, req })
    }
}

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse()
        .map_err(|_| TabletError::Parsing(format!("could not parse {} into an IP addess and port", &addr)))
}

fn main() {
    let matches = App::new("tablet-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("runs a single command against the tablet cluster")
        .subcommands(vec![
            SubCommand::with_name("put")
                .about("Store a value at a row and column")
                .arg(Arg::with_name("ROW").required(true).index(1))
                .arg(Arg::with_name("COL").required(true).index(2))
                .arg(Arg::with_name("VALUE").required(true).index(3)),
            SubCommand::with_name("get")
                .about("Get the value stored at a row and column")
                .arg(Arg::with_name("ROW").required(true).index(1))
                .arg(Arg::with_name("COL").required(true).index(2)),
            SubCommand::with_name("del")
                .about("Remove the value stored at a row and column")
                .arg(Arg::with_name("ROW").required(true).index(1))
                .arg(Arg::with_name("COL").required(true).index(2)),
            SubCommand::with_name("lookup")
                .about("Print the address of the tablet server holding a row")
                .arg(Arg::with_name("ROW").required(true).index(1)),
        ])
        .arg(Arg::with_name("coordinator")
            .long("coordinator")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT of the coordinator")
            .global(true))
        .arg(Arg::with_name("server")
            .long("server")
            .value_name("IP_ADDR:PORT")
            .help("sends the request straight to this tablet server")
            .conflicts_with("coordinator")
            .global(true))
        .arg(Arg::with_name("verbose")
            .short("v")
            .help("log debug messages")
            .global(true))
        .get_matches();

    subscriber_config(matches.is_present("verbose"));

    // parse commands into an Opt struct, then run it
    if let Err(e) = parse_options(&matches).and_then(run) {
        eprintln!("{}", e);
        exit(1);
    }
}

/// runs the specified request against the target in `opt`
fn run(opt: Opt) -> Result<()> {
    match (opt.target, opt.req) {
        (Target::Coordinator(addr), Request::Lookup { row }) => {
            let mut client = CoordinatorClient::connect(addr)?;
            match client.lookup(&row)? {
                Some(server) => println!("{}", server),
                None => println!("No server owns row {}", row),
            }
            client.exit()
        }
        (Target::Server(_), Request::Lookup { .. }) => Err(TabletError::Parsing(
            "lookup must be sent to the coordinator".to_string(),
        )),
        (Target::Coordinator(addr), req) => {
            let mut client = ClusterClient::connect(addr)?;
            execute(&mut client, req)?;
            client.exit()
        }
        (Target::Server(addr), req) => {
            let mut client = TabletClient::connect(addr)?;
            execute(&mut client, req)?;
            client.exit()
        }
    }
}

/// the data operations shared by [`ClusterClient`] and [`TabletClient`]
trait DataClient {
    fn get(&mut self, row: &str, col: &str) -> Result<Option<Vec<u8>>>;
    fn put(&mut self, row: &str, col: &str, value: &[u8]) -> Result<()>;
    fn delete(&mut self, row: &str, col: &str) -> Result<bool>;
}

impl DataClient for ClusterClient {
    fn get(&mut self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        ClusterClient::get(self, row, col)
    }

    fn put(&mut self, row: &str, col: &str, value: &[u8]) -> Result<()> {
        ClusterClient::put(self, row, col, value)
    }

    fn delete(&mut self, row: &str, col: &str) -> Result<bool> {
        ClusterClient::delete(self, row, col)
    }
}

impl DataClient for TabletClient {
    fn get(&mut self, row: &str, col: &str) -> Result<Option<Vec<u8>>> {
        TabletClient::get(self, row, col)
    }

    fn put(&mut self, row: &str, col: &str, value: &[u8]) -> Result<()> {
        TabletClient::put(self, row, col, value)
    }

    fn delete(&mut self, row: &str, col: &str) -> Result<bool> {
        TabletClient::delete(self, row, col)
    }
}

/// executes a data request with `client` and prints the outcome
fn execute<C: DataClient>(client: &mut C, req: Request) -> Result<()> {
    match req {
        Request::Get { row, col } => match client.get(&row, &col)? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("Resource not found"),
        },
        Request::Put { row, col, value } => client.put(&row, &col, &value)?,
        Request::Del { row, col } => {
            if !client.delete(&row, &col)? {
                return Err(TabletError::StringErr("Resource not found".to_string()));
            }
        }
        other => {
            return Err(TabletError::Parsing(format!("{:?} is not a data request", other)));
        }
    }
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct
fn parse_options(matches: &ArgMatches) -> Result<Opt> {
    match matches.subcommand() {
        ("put", Some(args)) => {
            let req = Request::Put {
                row: arg(args, "ROW")?,
                col: arg(args, "COL")?,
                value: arg(args, "VALUE")?.into_bytes(),
            };
            Opt::build(args, req)
        }
        ("get", Some(args)) => {
            let req = Request::Get { row: arg(args, "ROW")?, col: arg(args, "COL")? };
            Opt::build(args, req)
        }
        ("del", Some(args)) => {
            let req = Request::Del { row: arg(args, "ROW")?, col: arg(args, "COL")? };
            Opt::build(args, req)
        }
        ("lookup", Some(args)) => {
            let req = Request::Lookup { row: arg(args, "ROW")? };
            Opt::build(args, req)
        }
        _ => Err(TabletError::Parsing(format!("a command is required\n\n{}", matches.usage()))),
    }
}

/// returns the value of the required argument `name`
fn arg(args: &ArgMatches, name: &str) -> Result<String> {
    args.value_of(name)
        .map(String::from)
        .ok_or_else(|| TabletError::Parsing(format!("missing {}", name)))
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        // log to stderr instead of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting tracing default subscriber failed: {}", e);
    }
}
