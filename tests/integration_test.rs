//! Tests de integración para el servidor de búsqueda
//! tests/integration_test.rs
//!
//! Cada test levanta su propio servidor en un puerto efímero, con un
//! directorio estático temporal, y lo detiene con el `ShutdownHandle`.

use search_server::config::Config;
use search_server::metrics::MetricsCollector;
use search_server::net::{AddressFamily, ShutdownHandle};
use search_server::search::{InvertedIndex, QueryProcessor};
use search_server::server::Server;
use std::fs;
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

/// Directorio temporal que se borra al terminar el test
struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        let n = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("search_server-it-{}-{}-{}", tag, std::process::id(), n));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.0.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// Servidor corriendo en un thread de fondo
struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    metrics: Arc<MetricsCollector>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start(static_dir: &Path, indices: Vec<PathBuf>, workers: usize) -> Self {
        let config = Config {
            port: 0,
            family: AddressFamily::Ipv6,
            static_dir: static_dir.to_path_buf(),
            indices,
            workers,
            reverse_dns: false,
            ..Config::default()
        };

        let engine = QueryProcessor::load(&config.indices).unwrap();
        let server = Server::bind(config, Arc::new(engine)).unwrap();

        let addr = SocketAddr::from(([127, 0, 0, 1], server.local_port()));
        let shutdown = server.shutdown_handle();
        let metrics = server.metrics();
        let handle = thread::spawn(move || server.run().unwrap());

        Self {
            addr,
            shutdown,
            metrics,
            handle: Some(handle),
        }
    }

    fn connect(&self) -> TcpStream {
        let stream = TcpStream::connect(self.addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
        stream
    }

    /// Envía bytes crudos, cierra la escritura y lee hasta EOF
    fn exchange(&self, raw: &[u8]) -> String {
        let mut stream = self.connect();
        stream.write_all(raw).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn get(&self, uri: &str) -> String {
        self.exchange(format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", uri).as_bytes())
    }

    /// Espera a que no queden conexiones activas
    fn wait_idle(&self) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if self.metrics.active_connections() == 0 {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Separa una respuesta en (status line, headers, body)
fn split_response(response: &str) -> (&str, &str, &str) {
    let (head, body) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    let (status, headers) = head.split_once("\r\n").unwrap_or((head, ""));
    (status, headers, body)
}

/// Lee exactamente una respuesta usando Content-Length
fn read_one_response(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).unwrap();
        head.push(byte[0]);
    }

    let head = String::from_utf8(head).unwrap();
    let length: usize = head
        .lines()
        .find_map(|line| line.strip_prefix("Content-Length: "))
        .unwrap()
        .trim()
        .parse()
        .unwrap();

    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).unwrap();
    format!("{}{}", head, String::from_utf8_lossy(&body))
}

#[test]
fn test_static_file_is_served() {
    let dir = TempDir::new("static");
    dir.write("page.html", b"<html>ok</html>");
    let server = TestServer::start(&dir.0, Vec::new(), 4);

    let response = server.get("/static/page.html");
    let (status, headers, body) = split_response(&response);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(headers.contains("Content-Type: text/html"));
    assert!(headers.contains("Content-Length: 15"));
    assert_eq!(body, "<html>ok</html>");
}

#[test]
fn test_missing_static_file_is_escaped_404() {
    let dir = TempDir::new("missing");
    let server = TestServer::start(&dir.0, Vec::new(), 4);

    let response = server.get("/static/missing.png");
    let (status, _, body) = split_response(&response);
    assert_eq!(status, "HTTP/1.1 404 Not Found");
    assert_eq!(body, "<html><body>Couldn't find file \"missing.png\"</body></html>\n");

    let response = server.get("/static/%3Cscript%3E.png");
    assert!(response.contains("Couldn't find file \"&lt;script&gt;.png\""));
}

#[test]
fn test_pipelined_requests_in_one_write() {
    let dir = TempDir::new("pipeline");
    dir.write("one.txt", b"first");
    dir.write("two.txt", b"second");
    let server = TestServer::start(&dir.0, Vec::new(), 4);

    let mut stream = server.connect();
    stream
        .write_all(b"GET /static/one.txt HTTP/1.1\r\n\r\nGET /static/two.txt HTTP/1.1\r\n\r\n")
        .unwrap();

    let first = read_one_response(&mut stream);
    let second = read_one_response(&mut stream);

    assert!(first.ends_with("first"));
    assert!(second.ends_with("second"));
}

#[test]
fn test_keep_alive_then_connection_close() {
    let dir = TempDir::new("close");
    dir.write("a.txt", b"A");
    let server = TestServer::start(&dir.0, Vec::new(), 4);

    let mut stream = server.connect();
    stream.write_all(b"GET /static/a.txt HTTP/1.1\r\n\r\n").unwrap();
    assert!(read_one_response(&mut stream).ends_with("\r\n\r\nA"));

    // Misma conexión, segundo request
    stream.write_all(b"GET /static/a.txt HTTP/1.1\r\n\r\n").unwrap();
    assert!(read_one_response(&mut stream).ends_with("\r\n\r\nA"));

    // Con "Connection: close" el servidor responde y después cierra
    stream
        .write_all(b"GET /static/a.txt HTTP/1.1\r\nCONNECTION: close\r\n\r\n")
        .unwrap();
    assert!(read_one_response(&mut stream).ends_with("\r\n\r\nA"));
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    assert!(server.wait_idle());
    assert_eq!(server.metrics.get_snapshot().total_requests, 3);
}

#[test]
fn test_lone_connection_close_request() {
    let dir = TempDir::new("lone-close");
    dir.write("x.txt", b"only");
    let server = TestServer::start(&dir.0, Vec::new(), 2);

    // El cliente no cierra su lado de escritura
    let mut stream = server.connect();
    stream
        .write_all(b"GET /static/x.txt HTTP/1.1\r\nConnection: close\r\n\r\n")
        .unwrap();

    let response = read_one_response(&mut stream);
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with("\r\n\r\nonly"));

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    assert!(server.wait_idle());
    assert_eq!(server.metrics.get_snapshot().total_requests, 1);
}

#[test]
fn test_pipelined_request_then_close() {
    let dir = TempDir::new("pipeline-close");
    dir.write("one.txt", b"first");
    dir.write("two.txt", b"second");
    let server = TestServer::start(&dir.0, Vec::new(), 2);

    let mut stream = server.connect();
    stream
        .write_all(
            b"GET /static/one.txt HTTP/1.1\r\n\r\nGET /static/two.txt HTTP/1.1\r\nConnection: close\r\n\r\n",
        )
        .unwrap();

    assert!(read_one_response(&mut stream).ends_with("first"));
    assert!(read_one_response(&mut stream).ends_with("second"));

    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());

    assert!(server.wait_idle());
    assert_eq!(server.metrics.get_snapshot().total_requests, 2);
}

#[test]
fn test_truncated_request_gets_no_response() {
    let dir = TempDir::new("truncated");
    let server = TestServer::start(&dir.0, Vec::new(), 2);

    let response = server.exchange(b"GET / HTTP/1.1\r\nHost: localhost\r\n");
    assert!(response.is_empty());
}

#[test]
fn test_malformed_request_line_serves_landing_page() {
    let dir = TempDir::new("malformed");
    let server = TestServer::start(&dir.0, Vec::new(), 2);

    let response = server.exchange(b"GARBAGE\r\nFoo-Bar\r\n\r\n");
    let (status, headers, body) = split_response(&response);

    assert_eq!(status, "HTTP/1.1 200 OK");
    assert!(headers.contains("Content-Type: text/html"));
    assert!(body.contains("<form action=\"/query\" method=\"get\">"));
}

#[test]
fn test_query_against_built_index() {
    let docs = TempDir::new("docs");
    docs.write("moby.txt", b"Call me Ishmael. The whale, the WHALE!");
    docs.write("notes/sea.txt", b"the sea and the whale");
    docs.write("other.txt", b"nothing relevant here");

    let index_dir = TempDir::new("index");
    let index_path = index_dir.0.join("docs.idx");
    InvertedIndex::build_from_dir(&docs.0).unwrap().save(&index_path).unwrap();

    let server = TestServer::start(&docs.0, vec![index_path], 4);

    let body = server.get("/query?terms=The+Whale").split_once("\r\n\r\n").unwrap().1.to_string();
    assert!(body.contains("2 results found for <b>the whale</b>"));

    let moby = body.find("<a href=\"/static/moby.txt\">moby.txt</a> [4]").unwrap();
    let sea = body.find("<a href=\"/static/notes/sea.txt\">notes/sea.txt</a> [3]").unwrap();
    assert!(moby < sea);

    let body = server.get("/query?terms=%3Cnope%3E");
    assert!(body.contains("No results found for <b>&lt;nope&gt;</b>"));

    // Los enlaces de resultados se sirven como archivos estáticos
    assert!(server.get("/static/notes/sea.txt").ends_with("the sea and the whale"));
}

#[test]
fn test_concurrent_clients_within_pool_size() {
    let dir = TempDir::new("concurrent");
    dir.write("data.txt", b"payload");
    let workers = 8;
    let server = Arc::new(TestServer::start(&dir.0, Vec::new(), workers));

    let barrier = Arc::new(Barrier::new(workers));
    let clients: Vec<_> = (0..workers)
        .map(|_| {
            let server = Arc::clone(&server);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut stream = server.connect();
                // Todos conectados a la vez antes de pedir nada
                barrier.wait();
                for _ in 0..3 {
                    stream.write_all(b"GET /static/data.txt HTTP/1.1\r\n\r\n").unwrap();
                    assert!(read_one_response(&mut stream).ends_with("payload"));
                }
            })
        })
        .collect();

    for client in clients {
        client.join().unwrap();
    }

    assert!(server.wait_idle());
    let snapshot = server.metrics.get_snapshot();
    assert_eq!(snapshot.connections_accepted, workers as u64);
    assert_eq!(snapshot.total_requests, 3 * workers as u64);
}

#[test]
fn test_more_clients_than_workers_are_queued() {
    let dir = TempDir::new("queued");
    dir.write("q.txt", b"queued");
    let server = Arc::new(TestServer::start(&dir.0, Vec::new(), 2));

    let clients: Vec<_> = (0..10)
        .map(|_| {
            let server = Arc::clone(&server);
            thread::spawn(move || server.get("/static/q.txt"))
        })
        .collect();

    for client in clients {
        assert!(client.join().unwrap().ends_with("queued"));
    }

    assert!(server.wait_idle());
}
