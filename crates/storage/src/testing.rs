//! Testing utilities for the storage layer
//!
//! Provides an in-process fake of the remote RESP substrate so higher
//! layers can exercise primary-mode behavior without a real server:
//!
//! ```ignore
//! use resona_storage::testing::FakeRemote;
//! use resona_storage::RemoteStore;
//!
//! let server = FakeRemote::spawn();
//! let store = RemoteStore::connect(server.addr(), timeout)?;
//! ```
//!
//! The fake covers exactly the command set the adapter issues. TTL options
//! on `SET` are accepted and ignored; expiry-sensitive paths are tested
//! against the local substrate, which owns TTL behavior in-process.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{BufReader, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

use crate::local::glob_match;
use crate::resp::read_reply;

#[derive(Default)]
struct State {
    strings: BTreeMap<String, String>,
    sets: BTreeMap<String, BTreeSet<String>>,
}

/// In-process RESP server for tests
pub struct FakeRemote {
    addr: String,
}

impl FakeRemote {
    /// Bind an ephemeral port and start serving connections
    ///
    /// Serves until the process exits; state is shared across connections.
    pub fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake remote");
        let addr = listener.local_addr().expect("local addr").to_string();
        let state = Arc::new(Mutex::new(State::default()));

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { return };
                let state = Arc::clone(&state);
                thread::spawn(move || serve_connection(stream, state));
            }
        });

        Self { addr }
    }

    /// Address to connect to (`host:port`)
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

fn serve_connection(stream: std::net::TcpStream, state: Arc<Mutex<State>>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(clone) => clone,
        Err(_) => return,
    });
    let mut writer = stream;

    loop {
        let command = match read_reply(&mut reader) {
            Ok(reply) => reply,
            Err(_) => return, // client hung up
        };
        let args: Vec<String> = match command.into_array() {
            Ok(items) => items
                .into_iter()
                .filter_map(|item| item.into_bulk().ok().flatten())
                .collect(),
            Err(_) => return,
        };
        if args.is_empty() {
            return;
        }

        let reply = handle(&args, &state);
        if writer.write_all(&reply).is_err() {
            return;
        }
    }
}

fn handle(args: &[String], state: &Mutex<State>) -> Vec<u8> {
    let mut state = state.lock().expect("fake remote state");
    match args[0].as_str() {
        "PING" => b"+PONG\r\n".to_vec(),
        "SET" => {
            // Trailing "EX <secs>" is accepted and ignored
            state.strings.insert(args[1].clone(), args[2].clone());
            b"+OK\r\n".to_vec()
        }
        "GET" => match state.strings.get(&args[1]) {
            Some(value) => bulk(value),
            None => b"$-1\r\n".to_vec(),
        },
        "DEL" => {
            let mut removed = 0;
            for key in &args[1..] {
                removed += state.strings.remove(key).is_some() as i64;
                removed += state.sets.remove(key).is_some() as i64;
            }
            integer(removed)
        }
        "EXISTS" => {
            let n = (state.strings.contains_key(&args[1])
                || state.sets.contains_key(&args[1])) as i64;
            integer(n)
        }
        "INCRBY" => {
            let current: i64 = match state.strings.get(&args[1]) {
                Some(value) => match value.parse() {
                    Ok(n) => n,
                    Err(_) => {
                        return b"-ERR value is not an integer or out of range\r\n".to_vec()
                    }
                },
                None => 0,
            };
            let Ok(delta) = args[2].parse::<i64>() else {
                return b"-ERR value is not an integer or out of range\r\n".to_vec();
            };
            let next = current + delta;
            state.strings.insert(args[1].clone(), next.to_string());
            integer(next)
        }
        "SADD" => {
            let set = state.sets.entry(args[1].clone()).or_default();
            let added = args[2..]
                .iter()
                .filter(|member| set.insert((*member).clone()))
                .count();
            integer(added as i64)
        }
        "SREM" => {
            let set = state.sets.entry(args[1].clone()).or_default();
            let removed = args[2..].iter().filter(|member| set.remove(*member)).count();
            integer(removed as i64)
        }
        "SMEMBERS" => {
            let empty = BTreeSet::new();
            let set = state.sets.get(&args[1]).unwrap_or(&empty);
            let mut out = format!("*{}\r\n", set.len()).into_bytes();
            for member in set {
                out.extend_from_slice(&bulk(member));
            }
            out
        }
        "KEYS" => {
            let keys: Vec<&String> = state
                .strings
                .keys()
                .chain(state.sets.keys())
                .filter(|key| glob_match(&args[1], key))
                .collect();
            let mut out = format!("*{}\r\n", keys.len()).into_bytes();
            for key in keys {
                out.extend_from_slice(&bulk(key));
            }
            out
        }
        "FLUSHDB" => {
            state.strings.clear();
            state.sets.clear();
            b"+OK\r\n".to_vec()
        }
        other => format!("-ERR unknown command '{other}'\r\n").into_bytes(),
    }
}

fn bulk(text: &str) -> Vec<u8> {
    format!("${}\r\n{}\r\n", text.len(), text).into_bytes()
}

fn integer(n: i64) -> Vec<u8> {
    format!(":{n}\r\n").into_bytes()
}
