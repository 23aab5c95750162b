// Scripted HTTP server for protocol tests
//
// Serves one canned response per connection, in order; the last script
// entry repeats for any further connections. Counts every connection so
// tests can assert exactly how many attempts a client made.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// What to do with one incoming connection.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Read the request, answer with this status code
    Status(u16),
    /// Read the request, then close without answering (transport error)
    Hangup,
}

pub struct ScriptedServer {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    handle: tokio::task::JoinHandle<()>,
}

impl ScriptedServer {
    pub async fn start(script: Vec<Script>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));

        let task_hits = Arc::clone(&hits);
        let handle = tokio::spawn(async move {
            let mut served = 0usize;
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let step = script
                    .get(served)
                    .or_else(|| script.last())
                    .copied()
                    .unwrap_or(Script::Status(200));
                served += 1;
                task_hits.fetch_add(1, Ordering::SeqCst);
                handle_connection(stream, step).await;
            }
        });

        Self { addr, hits, handle }
    }

    /// Base URL for a config `server.url` field.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// How many connections (= check-in attempts) arrived so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A URL whose port was just released, so connections are refused.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn handle_connection(mut stream: TcpStream, step: Script) {
    read_request(&mut stream).await;

    match step {
        Script::Hangup => {
            // Drop the connection with the response unsent
        }
        Script::Status(code) => {
            let reason = match code {
                200 => "OK",
                208 => "Already Reported",
                404 => "Not Found",
                500 => "Internal Server Error",
                503 => "Service Unavailable",
                _ => "Response",
            };
            let response = format!(
                "HTTP/1.1 {code} {reason}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.flush().await;
        }
    }
}

/// Read one full request (headers plus content-length body) so the client
/// finishes writing before we answer or hang up.
async fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let mut header_end = None;
    let mut content_length = 0usize;

    loop {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if header_end.is_none() {
                    if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
                        header_end = Some(pos + 4);
                        content_length = parse_content_length(&buf[..pos]);
                    }
                }
                if let Some(end) = header_end {
                    if buf.len() >= end + content_length {
                        break;
                    }
                }
            }
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_content_length(headers: &[u8]) -> usize {
    String::from_utf8_lossy(headers)
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}
