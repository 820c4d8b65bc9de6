//! RESP2 wire codec for the remote substrate
//!
//! Commands are encoded as arrays of bulk strings; replies are one of the
//! five RESP2 types. The codec is deliberately minimal: it covers exactly
//! the command set the adapter issues and nothing else.
//!
//! Framing is CRLF-delimited:
//! - `+OK\r\n` simple string
//! - `-ERR msg\r\n` error
//! - `:42\r\n` integer
//! - `$5\r\nhello\r\n` bulk string (`$-1\r\n` for nil)
//! - `*2\r\n...\r\n` array (`*-1\r\n` for nil)

use std::io::BufRead;

use resona_core::{Error, Result};

/// A decoded server reply
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Simple string (`+`)
    Simple(String),
    /// Error reply (`-`)
    Error(String),
    /// Integer (`:`)
    Integer(i64),
    /// Bulk string (`$`); `None` is the nil bulk
    Bulk(Option<String>),
    /// Array (`*`); `None` is the nil array
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Name of the reply type, for protocol error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Reply::Simple(_) => "simple string",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(_) => "bulk string",
            Reply::Array(_) => "array",
        }
    }

    /// Expect an integer reply
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Reply::Integer(n) => Ok(n),
            other => Err(Error::Protocol(format!(
                "expected integer reply, got {}",
                other.type_name()
            ))),
        }
    }

    /// Expect a bulk reply; nil maps to `None`
    pub fn into_bulk(self) -> Result<Option<String>> {
        match self {
            Reply::Bulk(b) => Ok(b),
            other => Err(Error::Protocol(format!(
                "expected bulk reply, got {}",
                other.type_name()
            ))),
        }
    }

    /// Expect an array reply; nil maps to empty
    pub fn into_array(self) -> Result<Vec<Reply>> {
        match self {
            Reply::Array(items) => Ok(items.unwrap_or_default()),
            other => Err(Error::Protocol(format!(
                "expected array reply, got {}",
                other.type_name()
            ))),
        }
    }

    /// Expect a specific simple-string reply (`OK`, `PONG`)
    pub fn expect_simple(self, expected: &str) -> Result<()> {
        match self {
            Reply::Simple(s) if s == expected => Ok(()),
            Reply::Simple(s) => Err(Error::Protocol(format!(
                "expected +{expected}, got +{s}"
            ))),
            other => Err(Error::Protocol(format!(
                "expected +{expected}, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Encode a command as an array of bulk strings
pub fn encode_command(args: &[&str]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + args.iter().map(|a| a.len() + 16).sum::<usize>());
    out.extend_from_slice(format!("*{}\r\n", args.len()).as_bytes());
    for arg in args {
        out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
        out.extend_from_slice(arg.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Read one complete reply off the stream
pub fn read_reply<R: BufRead>(reader: &mut R) -> Result<Reply> {
    let line = read_line(reader)?;
    let marker = line
        .chars()
        .next()
        .ok_or_else(|| Error::Protocol("empty reply line".to_string()))?;
    let rest = &line[marker.len_utf8()..];

    match marker {
        '+' => Ok(Reply::Simple(rest.to_string())),
        '-' => Ok(Reply::Error(rest.to_string())),
        ':' => {
            let n = rest
                .parse::<i64>()
                .map_err(|_| Error::Protocol(format!("bad integer reply {rest:?}")))?;
            Ok(Reply::Integer(n))
        }
        '$' => {
            let len = parse_len(rest)?;
            match len {
                None => Ok(Reply::Bulk(None)),
                Some(len) => {
                    let mut buf = vec![0u8; len + 2];
                    reader.read_exact(&mut buf)?;
                    if &buf[len..] != b"\r\n" {
                        return Err(Error::Protocol(
                            "bulk string missing CRLF terminator".to_string(),
                        ));
                    }
                    buf.truncate(len);
                    let text = String::from_utf8(buf)
                        .map_err(|_| Error::Protocol("bulk string is not UTF-8".to_string()))?;
                    Ok(Reply::Bulk(Some(text)))
                }
            }
        }
        '*' => {
            let len = parse_len(rest)?;
            match len {
                None => Ok(Reply::Array(None)),
                Some(len) => {
                    let mut items = Vec::with_capacity(len);
                    for _ in 0..len {
                        items.push(read_reply(reader)?);
                    }
                    Ok(Reply::Array(Some(items)))
                }
            }
        }
        other => Err(Error::Protocol(format!(
            "unexpected reply marker {other:?}"
        ))),
    }
}

/// Read a CRLF-terminated line, without the terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<String> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Err(Error::Protocol("connection closed mid-reply".to_string()));
    }
    if !line.ends_with("\r\n") {
        return Err(Error::Protocol("reply line missing CRLF".to_string()));
    }
    line.truncate(line.len() - 2);
    Ok(line)
}

/// Parse a bulk/array length header; `-1` is the nil sentinel
fn parse_len(text: &str) -> Result<Option<usize>> {
    let n = text
        .parse::<i64>()
        .map_err(|_| Error::Protocol(format!("bad length header {text:?}")))?;
    if n < -1 {
        return Err(Error::Protocol(format!("negative length {n}")));
    }
    if n == -1 {
        return Ok(None);
    }
    Ok(Some(n as usize))
}
