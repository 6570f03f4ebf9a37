//! Loopback HTTP fixture for exercising the feed fetch without a network.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;

/// Serves a single canned HTTP response and returns the URL to request.
pub(crate) fn serve_once(status_line: &'static str, body: impl Into<String>) -> String {
    let body: String = body.into();
    let length = body.len();
    serve(status_line, length, body)
}

/// Like [`serve_once`], but announces `content_length` bytes and closes the
/// connection after sending only `body`.
pub(crate) fn serve_truncated(body: &'static str, content_length: usize) -> String {
    serve("200 OK", content_length, body.to_string())
}

fn serve(status_line: &'static str, content_length: usize, body: String) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        write!(
            stream,
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {content_length}\r\nConnection: close\r\n\r\n{body}"
        )
        .unwrap();
    });
    format!("http://{addr}/scoreboard.json")
}

/// A URL on a loopback port nothing listens on.
pub(crate) fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/scoreboard.json")
}
