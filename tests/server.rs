use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use tabletkv::{
    ClusterClient, CoordinatorClient, CoordinatorService, FirstMemberElection, MemberSelection,
    NaiveThreadPool, PlacementDirectory, Result, Router, Server, Service, SharedQueueThreadPool,
    Tablet, TabletClient, TabletEngine, TabletService, ThreadPool,
};

/// binds a loopback listener on a free port and serves `service` on it in the background
fn spawn_server<S: Service, P: ThreadPool + Send + 'static>(service: S, pool: P) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(service, pool).unwrap();
    thread::spawn(move || server.serve(listener));
    addr
}

fn spawn_tablet() -> (SocketAddr, Tablet) {
    let tablet = Tablet::new();
    let addr = spawn_server(
        TabletService::new(tablet.clone()),
        SharedQueueThreadPool::new(4).unwrap(),
    );
    (addr, tablet)
}

/// starts `count` tablet servers and a coordinator splitting them into `groups` groups
fn spawn_cluster(count: usize, groups: usize) -> (SocketAddr, Vec<Tablet>) {
    let (servers, tablets): (Vec<_>, Vec<_>) = (0..count).map(|_| spawn_tablet()).unzip();
    let directory = PlacementDirectory::build(servers, groups, &mut FirstMemberElection).unwrap();
    let router = Arc::new(Router::new(directory, MemberSelection::Primary));
    let coordinator = spawn_server(CoordinatorService::new(router), NaiveThreadPool::new(0).unwrap());
    (coordinator, tablets)
}

/// sends raw lines and collects one response line per command
fn raw_session(addr: SocketAddr, input: &[u8], responses: usize) -> Vec<String> {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(input).unwrap();
    stream.flush().unwrap();

    let mut reader = BufReader::new(stream);
    (0..responses)
        .map(|_| {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            line
        })
        .collect()
}

#[test]
fn tablet_client_round_trip() -> Result<()> {
    let (addr, tablet) = spawn_tablet();
    let mut client = TabletClient::connect(addr)?;

    client.put("user1", "name", b"Alice")?;
    client.put("user1", "bio", b"likes long walks")?;
    assert_eq!(client.get("user1", "name")?, Some(b"Alice".to_vec()));
    assert_eq!(client.get("user1", "bio")?, Some(b"likes long walks".to_vec()));
    assert_eq!(tablet.get("user1", "name")?, Some(b"Alice".to_vec()));

    assert!(client.delete("user1", "name")?);
    assert!(!client.delete("user1", "name")?);
    assert_eq!(client.get("user1", "name")?, None);
    assert_eq!(client.get("nobody", "name")?, None);

    client.put("user1", "empty", b"")?;
    assert_eq!(client.get("user1", "empty")?, Some(Vec::new()));
    client.exit()
}

#[test]
fn client_rejects_unencodable_requests() -> Result<()> {
    let (addr, tablet) = spawn_tablet();
    let mut client = TabletClient::connect(addr)?;

    assert!(client.put("two words", "c", b"v").is_err());
    assert!(client.put("r", "c", b"line\r\nbreak").is_err());
    assert_eq!(tablet.row_count()?, 0);

    // the connection is still usable
    client.put("r", "c", b"v")?;
    client.exit()
}

#[test]
fn wire_format() {
    let (addr, _) = spawn_tablet();
    let responses = raw_session(
        addr,
        b"PUT user1 name Alice\r\nGET user1 name\r\nGET user1 email\r\nDEL user1 email\r\nFOO\r\nLOOKUP user1\r\nEXIT\r\n",
        7,
    );
    assert_eq!(
        responses,
        vec![
            "+250 OK\r\n",
            "+250 OK Alice\r\n",
            "-550 Resource Does Not Exist\r\n",
            "-550 Resource Does Not Exist\r\n",
            "-550 Parser Failure\r\n",
            "-550 Unsupported Command\r\n",
            "+950 GOODBYE\r\n",
        ]
    );
}

#[test]
fn server_closes_after_goodbye() {
    let (addr, _) = spawn_tablet();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"EXIT\r\n").unwrap();

    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "+950 GOODBYE\r\n");

    line.clear();
    assert_eq!(reader.read_line(&mut line).unwrap(), 0);
}

#[test]
fn prompt_is_written_before_each_command() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(TabletService::new(Tablet::new()), NaiveThreadPool::new(0).unwrap())
        .unwrap()
        .with_prompt("DataStore% ");
    thread::spawn(move || server.serve(listener));

    let responses = raw_session(addr, b"PUT a b c\r\nEXIT\r\n", 2);
    assert_eq!(responses, vec!["DataStore% +250 OK\r\n", "DataStore% +950 GOODBYE\r\n"]);
}

#[test]
fn concurrent_clients_share_one_tablet() -> Result<()> {
    let (addr, tablet) = spawn_tablet();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            thread::spawn(move || -> Result<()> {
                let mut client = TabletClient::connect(addr)?;
                let row = format!("row{}", t);
                for i in 0..50 {
                    let value = format!("{}", i).into_bytes();
                    client.put(&row, "col", &value)?;
                    assert_eq!(client.get(&row, "col")?, Some(value));
                }
                client.exit()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap()?;
    }

    for t in 0..8 {
        assert_eq!(tablet.get(&format!("row{}", t), "col")?, Some(b"49".to_vec()));
    }
    Ok(())
}

#[test]
fn connection_slots_bound_concurrent_connections() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(TabletService::new(Tablet::new()), NaiveThreadPool::new(0)?)?
        .with_slots(1)?;
    thread::spawn(move || server.serve(listener));

    let mut first = TabletClient::connect(addr)?;
    first.put("r", "c", b"v")?;
    // the second connection is only served once the first one says goodbye
    let second = thread::spawn(move || -> Result<Option<Vec<u8>>> {
        let mut client = TabletClient::connect(addr)?;
        let value = client.get("r", "c")?;
        client.exit()?;
        Ok(value)
    });
    first.exit()?;
    assert_eq!(second.join().unwrap()?, Some(b"v".to_vec()));
    Ok(())
}

#[test]
fn coordinator_lookup() -> Result<()> {
    let (coordinator, _) = spawn_cluster(4, 2);
    let mut client = CoordinatorClient::connect(coordinator)?;

    let directory = client.directory()?;
    assert_eq!(directory.groups(), &[vec![0, 2], vec![1, 3]]);
    assert_eq!(directory.primaries(), &[0, 1]);

    assert_eq!(client.lookup("banana")?, directory.server(0));
    assert_eq!(client.lookup("apple")?, directory.server(1));
    client.exit()
}

#[test]
fn coordinator_heartbeats_and_unsupported_commands() -> Result<()> {
    let (coordinator, _) = spawn_cluster(2, 1);
    let mut client = CoordinatorClient::connect(coordinator)?;
    client.ping(0)?;
    client.ping(1)?;
    assert!(client.ping(2).is_err());
    client.exit()?;

    let responses = raw_session(coordinator, b"GET a b\r\nLOOKUP a b\r\nEXIT\r\n", 3);
    assert_eq!(
        responses,
        vec![
            "-550 Unsupported Command\r\n",
            "-550 Parser Failure\r\n",
            "+950 GOODBYE\r\n",
        ]
    );
    Ok(())
}

#[test]
fn cluster_client_stores_rows_on_their_owner() -> Result<()> {
    let (coordinator, tablets) = spawn_cluster(4, 2);
    let mut client = ClusterClient::connect(coordinator)?;

    client.put("apple", "color", b"red")?;
    client.put("banana", "color", b"yellow")?;
    assert_eq!(client.get("apple", "color")?, Some(b"red".to_vec()));
    assert_eq!(client.get("banana", "color")?, Some(b"yellow".to_vec()));

    // with first-member election, group 1 ('a') is served by node 1, group 0 ('b') by node 0
    assert_eq!(tablets[1].get("apple", "color")?, Some(b"red".to_vec()));
    assert_eq!(tablets[0].get("banana", "color")?, Some(b"yellow".to_vec()));
    for other in &[0, 2, 3] {
        assert_eq!(tablets[*other].get("apple", "color")?, None);
    }

    assert!(client.delete("apple", "color")?);
    assert!(!client.delete("apple", "color")?);
    assert_eq!(tablets[1].row_count()?, 0);
    client.exit()
}
