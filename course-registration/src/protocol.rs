use std::io;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{error::ProtocolError, model::Session};

/// Longest frame accepted, line ending excluded.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Verbs the server knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Load,
    Register,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Load => "LOAD",
            Verb::Register => "REGISTER",
        }
    }

    /// Maps a wire verb to a known one. Matching is exact-case; the French
    /// verbs of the first deployment are accepted as aliases.
    pub fn from_wire(verb: &str) -> Option<Self> {
        match verb {
            "LOAD" | "CHARGER" => Some(Verb::Load),
            "REGISTER" | "INSCRIRE" => Some(Verb::Register),
            _ => None,
        }
    }
}

/// First frame of every connection: a verb plus a free-form argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: String,
    pub argument: String,
}

impl Command {
    pub fn load(session: Session) -> Self {
        Self {
            verb: Verb::Load.as_str().to_string(),
            argument: session.as_str().to_string(),
        }
    }

    pub fn register() -> Self {
        Self {
            verb: Verb::Register.as_str().to_string(),
            argument: String::new(),
        }
    }

    /// Splits `VERB[ ARGUMENT]` at the first space. The argument is kept
    /// verbatim, inner and trailing spaces included.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        if line.is_empty() {
            return Err(ProtocolError::EmptyCommand);
        }

        let (verb, argument) = line.split_once(' ').unwrap_or((line, ""));
        Ok(Self {
            verb: verb.to_string(),
            argument: argument.to_string(),
        })
    }

    /// Decodes a raw command frame, which must hold a JSON string.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(frame).map_err(ProtocolError::InvalidUtf8)?;
        match serde_json::from_str::<Value>(text).map_err(ProtocolError::Malformed)? {
            Value::String(line) => Self::parse(&line),
            other => Err(ProtocolError::NotText(json_kind(&other))),
        }
    }

    pub fn to_line(&self) -> String {
        if self.argument.is_empty() {
            self.verb.clone()
        } else {
            format!("{} {}", self.verb, self.argument)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Reads the next frame as raw bytes, skipping blank lines.
///
/// Returns `None` once the peer has closed its side of the stream. A line
/// longer than [`MAX_FRAME_LEN`] fails with `InvalidData` before more of it is
/// buffered.
pub async fn read_frame<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    // One JSON document per line; compact JSON never contains a raw newline.
    let mut line = Vec::new();
    loop {
        line.clear();
        // Room for the longest frame plus a `\r\n` ending.
        let limit = MAX_FRAME_LEN + 2;
        let mut limited = (&mut *reader).take(limit as u64);
        let bytes = limited.read_until(b'\n', &mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }

        let complete = line.last() == Some(&b'\n');
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        if line.len() > MAX_FRAME_LEN || (!complete && bytes == limit) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame exceeds {MAX_FRAME_LEN} bytes"),
            ));
        }
        if line.is_empty() {
            continue;
        }

        return Ok(Some(line));
    }
}

pub async fn read_message<R, T>(reader: &mut R) -> io::Result<Option<T>>
where
    R: AsyncBufRead + Unpin,
    T: DeserializeOwned,
{
    match read_frame(reader).await? {
        Some(frame) => serde_json::from_slice(&frame).map(Some).map_err(to_io_error),
        None => Ok(None),
    }
}

pub async fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + ?Sized,
{
    // Encode to JSON once, append the newline delimiter, and flush so the peer can read it right away.
    let mut encoded = serde_json::to_vec(message).map_err(to_io_error)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

fn to_io_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
