use std::io::Write;
use std::net::SocketAddr;

use tabletkv::{ClusterConfig, TabletError};
use tempfile::NamedTempFile;

fn addr(s: &str) -> SocketAddr {
    s.parse().unwrap()
}

#[test]
fn first_address_is_the_coordinator() {
    let config = ClusterConfig::parse("127.0.0.1:5000\n127.0.0.1:5001\n127.0.0.1:5002\n").unwrap();
    assert_eq!(config.coordinator(), addr("127.0.0.1:5000"));
    assert_eq!(
        config.servers(),
        &[addr("127.0.0.1:5001"), addr("127.0.0.1:5002")]
    );
    assert_eq!(config.server(1).unwrap(), addr("127.0.0.1:5002"));
    assert!(config.server(2).is_err());
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let contents = "# coordinator\n\n  127.0.0.1:5000  \n# servers\n127.0.0.1:5001\r\n\n";
    let config = ClusterConfig::parse(contents).unwrap();
    assert_eq!(config, ClusterConfig::new(addr("127.0.0.1:5000"), vec![addr("127.0.0.1:5001")]));
}

#[test]
fn coordinator_only() {
    let config = ClusterConfig::parse("127.0.0.1:5000").unwrap();
    assert!(config.servers().is_empty());
}

#[test]
fn bad_address_names_its_line() {
    let err = ClusterConfig::parse("127.0.0.1:5000\n# ok\nlocalhost\n").unwrap_err();
    match err {
        TabletError::Config { line, .. } => assert_eq!(line, 3),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn empty_config_is_rejected() {
    assert!(matches!(
        ClusterConfig::parse("# nothing here\n\n"),
        Err(TabletError::Config { .. })
    ));
}

#[test]
fn read_from_file() {
    let mut file = NamedTempFile::new().expect("unable to create temporary file");
    writeln!(file, "127.0.0.1:5000").unwrap();
    writeln!(file, "127.0.0.1:5001").unwrap();
    writeln!(file, "[::1]:5002").unwrap();

    let config = ClusterConfig::from_file(file.path()).unwrap();
    assert_eq!(config.coordinator(), addr("127.0.0.1:5000"));
    assert_eq!(config.servers()[1], addr("[::1]:5002"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::TempDir::new().expect("unable to create temporary directory");
    let result = ClusterConfig::from_file(dir.path().join("ip-config.txt"));
    assert!(matches!(result, Err(TabletError::Io(_))));
}
