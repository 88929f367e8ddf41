//! An interactive prompt over a tablet living inside this process. Nothing is shared with a
//! running cluster, which makes it handy for trying out the command set.
//!
//! ```text
//! DataStore % PUT user1 name Alice
//! +250 OK
//! DataStore % GET user1 name
//! +250 OK Alice
//! DataStore % EXIT
//! +950 GOODBYE
//! ```

use std::io::{self, Write};
use std::process::exit;
use clap::{crate_version, App, Arg, arg_enum, value_t};
use tabletkv::command::{PARSER_FAILURE, USAGE};
use tabletkv::protocol::{write_line, LineReader, SHELL_DELIMITER};
use tabletkv::{Request, Response, Result, Service, ShardedTablet, Tablet, TabletEngine, TabletService};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

arg_enum! {
    #[allow(non_camel_case_types)]
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Engine {
        tablet,
        sharded
    }
}

const PROMPT: &str = "DataStore % ";

fn main() {
    let matches = App::new("tablet-shell")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("an interactive prompt over an in-process tablet")
        .arg(Arg::with_name("engine")
            .long("engine")
            .value_name("ENGINE_NAME")
            .help("sets the storage engine to use")
            .possible_values(&Engine::variants())
            .default_value("tablet"))
        .arg(Arg::with_name("verbose")
            .short("v")
            .help("log debug messages"))
        .get_matches();

    subscriber_config(matches.is_present("verbose"));

    let engine = value_t!(matches, "engine", Engine).unwrap_or(Engine::tablet);
    let result = match engine {
        Engine::tablet => run(TabletService::new(Tablet::new())),
        Engine::sharded => run(TabletService::new(ShardedTablet::new())),
    };
    if let Err(e) = result {
        eprintln!("{}", e);
        exit(1);
    }
}

/// reads commands from STDIN until `EXIT` or end of input
fn run<E: TabletEngine>(service: TabletService<E>) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = LineReader::new(stdin.lock(), SHELL_DELIMITER);
    let mut out = stdout.lock();

    loop {
        out.write_all(PROMPT.as_bytes())?;
        out.flush()?;

        let line = match reader.read_line()? {
            Some(line) => line,
            None => break,
        };
        if line.is_empty() {
            continue;
        }

        let response = match Request::parse(&line) {
            Ok(request) => service.execute(request),
            Err(e) => {
                debug!("{}", e);
                eprintln!("{}", USAGE);
                Response::err(PARSER_FAILURE)
            }
        };
        write_line(&mut out, &response.to_bytes(), SHELL_DELIMITER)?;

        if response == Response::Goodbye {
            break;
        }
    }
    Ok(())
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
