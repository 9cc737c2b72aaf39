// Shared test harness: a minimal in-process RESP server
//
// Understands GET, SET (with EX), DEL and TTL; any other command gets +OK.
// Good enough for a real `ConnectionManager` to talk to without Docker.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct ServerState {
    /// key -> (value, ttl seconds as given by SET .. EX)
    entries: HashMap<String, (String, i64)>,
    commands: Vec<Vec<String>>,
}

pub struct FakeRedisServer {
    port: u16,
    state: Arc<Mutex<ServerState>>,
}

impl FakeRedisServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(ServerState::default()));

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                tokio::spawn(serve(socket, accept_state.clone()));
            }
        });

        Self { port, state }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Number of received commands named `name` (case-insensitive)
    pub fn command_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .commands
            .iter()
            .filter(|args| args.first().is_some_and(|c| c.eq_ignore_ascii_case(name)))
            .count()
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.state.lock().entries.get(key).map(|(v, _)| v.clone())
    }
}

async fn serve(socket: TcpStream, state: Arc<Mutex<ServerState>>) {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);

    while let Ok(Some(args)) = read_command(&mut reader).await {
        let reply = respond(&args, &state);
        state.lock().commands.push(args);
        if write_half.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }
}

async fn read_command<R>(reader: &mut R) -> io::Result<Option<Vec<String>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    let count = parse_header(&line, '*')?;

    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await?;
        let len = parse_header(&line, '$')?;

        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        args.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(Some(args))
}

fn parse_header(line: &str, marker: char) -> io::Result<usize> {
    line.trim_end()
        .strip_prefix(marker)
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("bad header {:?}", line)))
}

fn respond(args: &[String], state: &Mutex<ServerState>) -> String {
    let mut state = state.lock();
    let command = args.first().map(|c| c.to_ascii_uppercase()).unwrap_or_default();

    match (command.as_str(), args.len()) {
        ("GET", 2) => match state.entries.get(&args[1]) {
            Some((value, _)) => format!("${}\r\n{}\r\n", value.len(), value),
            None => "$-1\r\n".to_string(),
        },
        ("SET", n) if n >= 3 => {
            let ttl = args
                .iter()
                .position(|a| a.eq_ignore_ascii_case("EX"))
                .and_then(|i| args.get(i + 1))
                .and_then(|t| t.parse().ok())
                .unwrap_or(-1);
            state
                .entries
                .insert(args[1].clone(), (args[2].clone(), ttl));
            "+OK\r\n".to_string()
        }
        ("DEL", 2) => {
            let removed = state.entries.remove(&args[1]).is_some();
            format!(":{}\r\n", usize::from(removed))
        }
        ("TTL", 2) => match state.entries.get(&args[1]) {
            Some((_, ttl)) => format!(":{}\r\n", ttl),
            None => ":-2\r\n".to_string(),
        },
        _ => "+OK\r\n".to_string(),
    }
}
