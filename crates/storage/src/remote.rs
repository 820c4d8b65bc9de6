//! Remote substrate: client for a RESP key-value service
//!
//! The primary substrate speaks the Redis wire protocol over TCP. The
//! client is synchronous: one blocking connection with read/write timeouts,
//! held behind a mutex so concurrent callers serialize their round trips.
//! Documents travel as compact JSON text; set members and counters are
//! native server types.
//!
//! `connect` performs the liveness probe (`PING`) the tiered store uses to
//! decide between primary and fallback mode. There is no reconnect logic:
//! a connection that dies after connect surfaces errors to the tiered
//! store's policy layer.

use std::io::{BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;

use resona_core::{decode_text, encode_text, Document, Error, Result};

use crate::backend::Backend;
use crate::resp::{encode_command, read_reply, Reply};

/// Client for the remote key-value substrate
pub struct RemoteStore {
    addr: String,
    conn: Mutex<Connection>,
}

struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl RemoteStore {
    /// Connect and probe liveness
    ///
    /// Resolves `addr` (`host:port`), establishes a TCP connection with the
    /// given timeout applied to connect, reads and writes, then issues a
    /// `PING`. Any failure maps to [`Error::Unreachable`] so the tiered
    /// store can fall back without inspecting the cause.
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let unreachable = |reason: String| Error::Unreachable {
            addr: addr.to_string(),
            reason,
        };

        let sock_addr = addr
            .to_socket_addrs()
            .map_err(|e| unreachable(e.to_string()))?
            .next()
            .ok_or_else(|| unreachable("address resolved to nothing".to_string()))?;

        let stream = TcpStream::connect_timeout(&sock_addr, timeout)
            .map_err(|e| unreachable(e.to_string()))?;
        stream
            .set_read_timeout(Some(timeout))
            .map_err(|e| unreachable(e.to_string()))?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(|e| unreachable(e.to_string()))?;
        let reader = BufReader::new(stream.try_clone().map_err(|e| unreachable(e.to_string()))?);

        let store = Self {
            addr: addr.to_string(),
            conn: Mutex::new(Connection {
                reader,
                writer: stream,
            }),
        };

        store
            .ping()
            .map_err(|e| unreachable(format!("liveness probe failed: {e}")))?;

        Ok(store)
    }

    /// Address this client is connected to
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Liveness probe
    pub fn ping(&self) -> Result<()> {
        self.command(&["PING"])?.expect_simple("PONG")
    }

    /// One request/reply round trip
    ///
    /// Error replies become [`Error::Storage`]; the connection stays usable.
    fn command(&self, args: &[&str]) -> Result<Reply> {
        let mut conn = self.conn.lock();
        conn.writer.write_all(&encode_command(args))?;
        conn.writer.flush()?;
        match read_reply(&mut conn.reader)? {
            Reply::Error(msg) => Err(Error::Storage(msg)),
            reply => Ok(reply),
        }
    }
}

impl Backend for RemoteStore {
    fn get(&self, key: &str) -> Result<Option<Document>> {
        let bulk = self.command(&["GET", key])?.into_bulk()?;
        Ok(bulk.map(|text| decode_text(&text)))
    }

    fn set(&self, key: &str, doc: &Document, ttl: Option<Duration>) -> Result<()> {
        let payload = encode_text(doc);
        match ttl {
            None => self.command(&["SET", key, &payload])?.expect_simple("OK"),
            Some(ttl) => {
                let secs = ttl.as_secs().max(1).to_string();
                self.command(&["SET", key, &payload, "EX", &secs])?
                    .expect_simple("OK")
            }
        }
    }

    fn del(&self, key: &str) -> Result<()> {
        self.command(&["DEL", key])?.into_integer()?;
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.command(&["EXISTS", key])?.into_integer()? > 0)
    }

    fn incr(&self, key: &str, amount: i64) -> Result<i64> {
        let amount = amount.to_string();
        self.command(&["INCRBY", key, &amount])?.into_integer()
    }

    fn sadd(&self, key: &str, members: &[&str]) -> Result<usize> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut args = vec!["SADD", key];
        args.extend_from_slice(members);
        Ok(self.command(&args)?.into_integer()? as usize)
    }

    fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let items = self.command(&["SMEMBERS", key])?.into_array()?;
        let mut members = Vec::with_capacity(items.len());
        for item in items {
            if let Some(member) = item.into_bulk()? {
                members.push(member);
            }
        }
        Ok(members)
    }

    fn srem(&self, key: &str, members: &[&str]) -> Result<usize> {
        if members.is_empty() {
            return Ok(0);
        }
        let mut args = vec!["SREM", key];
        args.extend_from_slice(members);
        Ok(self.command(&args)?.into_integer()? as usize)
    }

    fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let items = self.command(&["KEYS", pattern])?.into_array()?;
        let mut keys = Vec::with_capacity(items.len());
        for item in items {
            if let Some(key) = item.into_bulk()? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn clear(&self) -> Result<()> {
        self.command(&["FLUSHDB"])?.expect_simple("OK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeRemote;

    fn connect(server: &FakeRemote) -> RemoteStore {
        RemoteStore::connect(server.addr(), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_connect_refused_maps_to_unreachable() {
        // Port 1 is essentially never listening
        let result = RemoteStore::connect("127.0.0.1:1", Duration::from_millis(200));
        assert!(matches!(result, Err(Error::Unreachable { .. })));
    }

    #[test]
    fn test_connect_probes_with_ping() {
        let server = FakeRemote::spawn();
        let store = connect(&server);
        assert_eq!(store.addr(), server.addr());
    }

    #[test]
    fn test_get_set_del_round_trip() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        let doc = serde_json::json!({ "title": "Aurora", "plays": 2 });
        store.set("nft:1", &doc, None).unwrap();
        assert_eq!(store.get("nft:1").unwrap(), Some(doc));
        assert!(store.exists("nft:1").unwrap());

        store.del("nft:1").unwrap();
        assert_eq!(store.get("nft:1").unwrap(), None);
        // Idempotent delete
        store.del("nft:1").unwrap();
    }

    #[test]
    fn test_set_with_ttl_is_accepted() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        store
            .set("session:tok", &serde_json::json!("u1"), Some(Duration::from_secs(3600)))
            .unwrap();
        assert!(store.exists("session:tok").unwrap());
    }

    #[test]
    fn test_incr_creates_and_advances() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        assert_eq!(store.incr("nft:1:plays", 1).unwrap(), 1);
        assert_eq!(store.incr("nft:1:plays", 4).unwrap(), 5);
    }

    #[test]
    fn test_incr_non_integer_is_storage_error() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        store.set("nft:1", &serde_json::json!({ "a": 1 }), None).unwrap();
        assert!(matches!(store.incr("nft:1", 1), Err(Error::Storage(_))));
    }

    #[test]
    fn test_set_operations() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        assert_eq!(store.sadd("nfts", &["a", "b"]).unwrap(), 2);
        // Idempotent membership
        assert_eq!(store.sadd("nfts", &["a"]).unwrap(), 0);

        let mut members = store.smembers("nfts").unwrap();
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        assert_eq!(store.srem("nfts", &["a", "missing"]).unwrap(), 1);
        assert_eq!(store.smembers("nfts").unwrap(), vec!["b"]);
    }

    #[test]
    fn test_keys_pattern() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        store.set("user:1", &serde_json::json!(1), None).unwrap();
        store.set("nft:1", &serde_json::json!(2), None).unwrap();

        assert_eq!(store.keys("user:*").unwrap(), vec!["user:1"]);
    }

    #[test]
    fn test_clear_wipes_everything() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        store.set("user:1", &serde_json::json!(1), None).unwrap();
        store.sadd("users", &["1"]).unwrap();
        store.clear().unwrap();

        assert_eq!(store.get("user:1").unwrap(), None);
        assert!(store.smembers("users").unwrap().is_empty());
    }

    #[test]
    fn test_error_reply_surfaces_as_storage_error() {
        let server = FakeRemote::spawn();
        let store = connect(&server);

        let result = store.command(&["NOSUCH"]);
        assert!(matches!(result, Err(Error::Storage(_))));

        // Connection survives an error reply
        store.ping().unwrap();
    }
}
