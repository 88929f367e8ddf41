//! this binary starts the coordinator
//! to see the list of commands, type: `coordinator --help`
//!
//! `coordinator --config <FILE> --groups <N> [--select primary|round-robin] [--seed <SEED>] [-v]`
//!
//!     Reads the cluster ip-config file, splits the tablet servers listed in it into N groups,
//!     elects a primary in every group and then answers LOOKUP requests on the coordinator
//!     address, which is the first address of the config file.

use std::process::exit;
use std::sync::Arc;
use clap::{crate_version, App, Arg, value_t, ArgMatches};
use tabletkv::{
    ClusterConfig, CoordinatorService, MemberSelection, NaiveThreadPool, PlacementDirectory,
    RandomElection, Result, Router, Server, TabletError, ThreadPool,
};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    config: ClusterConfig,
    groups: usize,
    selection: MemberSelection,
    seed: Option<u64>,
}

impl Opt {
    /// reads the cluster config and validates the remaining options
    /// # Errors
    /// returns [`TabletError::Parsing`] if one of the parameters is invalid, or
    /// [`TabletError::Config`] if the config file is invalid
    fn build(matches: &ArgMatches) -> Result<Opt> {
        let path = matches
            .value_of("config")
            .ok_or_else(|| TabletError::Parsing("--config is required".to_string()))?;
        let config = ClusterConfig::from_file(path)?;

        let groups = value_t!(matches, "groups", usize)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;
        let selection = value_t!(matches, "select", MemberSelection)
            .map_err(|e| TabletError::Parsing(e.to_string()))?;
        let seed = match matches.value_of("seed") {
            Some(seed) => Some(
                seed.parse::<u64>()
                    .map_err(|_| TabletError::Parsing(format!("invalid seed: {}", seed)))?,
            ),
            None => None,
        };

        Ok(Opt {
            config,
            groups,
            selection,
            seed,
        })
    }
}

fn main() {
    let matches = App::new("coordinator")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("routes rows to the tablet servers that own them")
        .arg(Arg::with_name("config")
            .long("config")
            .short("c")
            .value_name("FILE")
            .help("the cluster ip-config file, coordinator first, then one line per tablet server")
            .required(true))
        .arg(Arg::with_name("groups")
            .long("groups")
            .short("g")
            .value_name("N")
            .help("the number of groups to split the tablet servers into")
            .default_value("1"))
        .arg(Arg::with_name("select")
            .long("select")
            .value_name("POLICY")
            .help("which group member a lookup returns")
            .possible_values(&["primary", "round-robin"])
            .default_value("primary"))
        .arg(Arg::with_name("seed")
            .long("seed")
            .value_name("SEED")
            .help("seeds the primary election, for reproducible placements"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .help("log debug messages"))
        .get_matches();

    subscriber_config(matches.is_present("verbose"));

    let opt = match Opt::build(&matches) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("coordinator {}", env!("CARGO_PKG_VERSION"));

    let mut election = match opt.seed {
        Some(seed) => RandomElection::with_seed(seed),
        None => RandomElection::new(),
    };
    // the directory is complete before the listener exists, so no lookup can observe a
    // partially built placement
    let directory =
        PlacementDirectory::build(opt.config.servers().to_vec(), opt.groups, &mut election)?;
    for (group, members) in directory.groups().iter().enumerate() {
        info!(
            group,
            ?members,
            primary = directory.primary(group).unwrap_or_default(),
            "group ready"
        );
    }
    debug!("alphabet: {:?}", directory.alphabet());

    let router = Arc::new(Router::new(directory, opt.selection));
    info!("Member selection: {}", router.selection());

    let server = Server::new(CoordinatorService::new(router), NaiveThreadPool::new(0)?)?;
    server.run(opt.config.coordinator())
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
