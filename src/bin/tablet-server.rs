//! this binary starts a tablet server
//! to see the list of commands, type: `tablet-server --help`
//!
//! The listen address is either given directly with `--addr`, or taken from the cluster config
//! with `--config <FILE> --index <N>`, where `N` is the server's node index.

use std::net::SocketAddr;
use std::process::exit;
use clap::{crate_version, App, Arg, arg_enum, value_t, ArgMatches};
use tabletkv::{
    ClusterConfig, NaiveThreadPool, RayonThreadPool, Result, Server, ShardedTablet,
    SharedQueueThreadPool, Tablet, TabletEngine, TabletError, TabletService, ThreadPool,
    DEFAULT_SLOTS,
};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Engine {
        tablet,
        sharded
    }
}

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Pool {
        naive,
        shared,
        rayon
    }
}

const DEFAULT_ADDRESS: &str = "127.0.0.1:4000";
const DEFAULT_THREADS: u32 = 8;
const PROMPT: &str = "DataStore% ";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    addr: SocketAddr,
    engine: Engine,
    pool: Pool,
    threads: u32,
    slots: usize,
    interactive: bool,
}

impl Opt {
    /// validates the command line options
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`TabletError::Parsing`] if one of the parameters is invalid
    ///
    fn build(matches: &ArgMatches) -> Result<Opt> {
        let addr = match (matches.value_of("config"), matches.value_of("index")) {
            (Some(config), Some(index)) => {
                let index: usize = index
                    .parse()
                    .map_err(|_| TabletError::Parsing(format!("invalid node index: {}", index)))?;
                ClusterConfig::from_file(config)?.server(index)?
            }
            _ => {
                let addr = matches.value_of("addr").unwrap_or(DEFAULT_ADDRESS);
                addr.parse()
                    .map_err(|_| TabletError::Parsing(format!("could not parse {} into an IP addess and port", &addr)))?
            }
        };

        let engine = value_t!(matches, "engine", Engine)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;
        let pool = value_t!(matches, "pool", Pool)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;
        let threads = value_t!(matches, "threads", u32)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;
        let slots = value_t!(matches, "slots", usize)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;

        Ok(Opt {
            addr,
            engine,
            pool,
            threads,
            slots,
            interactive: matches.is_present("interactive"),
        })
    }
}


fn main() {
    let default_threads = DEFAULT_THREADS.to_string();
    let default_slots = DEFAULT_SLOTS.to_string();

    // parse command line args
    let matches = App::new("tablet-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("hosts one in-memory tablet of the cluster")
        .arg(Arg::with_name("addr")
            .long("addr")
            .value_name("IP_ADDR:PORT")
            .help("sets the IP_ADDR:PORT that the server listens on")
            .conflicts_with("config"))
        .arg(Arg::with_name("config")
            .long("config")
            .short("c")
            .value_name("FILE")
            .help("the cluster ip-config file to read the listen address from")
            .requires("index"))
        .arg(Arg::with_name("index")
            .long("index")
            .short("n")
            .value_name("N")
            .help("this server's node index in the cluster config")
            .requires("config"))
        .arg(Arg::with_name("engine")
            .long("engine")
            .value_name("ENGINE_NAME")
            .help("sets the storage engine to use")
            .possible_values(&Engine::variants())
            .default_value("tablet"))
        .arg(Arg::with_name("pool")
            .long("pool")
            .value_name("POOL")
            .help("sets the thread pool running the connections")
            .possible_values(&Pool::variants())
            .default_value("naive"))
        .arg(Arg::with_name("threads")
            .long("threads")
            .value_name("N")
            .help("number of worker threads, ignored by the naive pool")
            .default_value(&default_threads))
        .arg(Arg::with_name("slots")
            .long("slots")
            .value_name("N")
            .help("maximum number of connections served at once")
            .default_value(&default_slots))
        .arg(Arg::with_name("interactive")
            .long("interactive")
            .help("write a prompt before every command, for use with telnet or nc"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .help("log debug messages"))
        .get_matches();

    // set up a tracing subscriber to log to STDERR
    subscriber_config(matches.is_present("verbose"));

    // validate command line options, store them in Opt
    let opt = match Opt::build(&matches) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}


fn run(opt: Opt) -> Result<()> {
    info!("tablet-server {}", env!("CARGO_PKG_VERSION"));
    info!("Storage engine: {}", opt.engine);
    info!("Thread pool: {} ({} threads)", opt.pool, opt.threads);

    match opt.engine {
        Engine::tablet => run_with_engine(Tablet::new(), &opt),
        Engine::sharded => run_with_engine(ShardedTablet::new(), &opt),
    }
}

fn run_with_engine<E: TabletEngine>(engine: E, opt: &Opt) -> Result<()> {
    match opt.pool {
        Pool::naive => run_with_pool(engine, NaiveThreadPool::new(opt.threads)?, opt),
        Pool::shared => run_with_pool(engine, SharedQueueThreadPool::new(opt.threads)?, opt),
        Pool::rayon => run_with_pool(engine, RayonThreadPool::new(opt.threads)?, opt),
    }
}

fn run_with_pool<E: TabletEngine, P: ThreadPool>(engine: E, pool: P, opt: &Opt) -> Result<()> {
    let mut server = Server::new(TabletService::new(engine), pool)?.with_slots(opt.slots)?;
    if opt.interactive {
        server = server.with_prompt(PROMPT);
    }
    server.run(opt.addr)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
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
