use std::{io, net::SocketAddr, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tokio::{
    io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
    time::timeout,
};

use crate::{
    error::{ProtocolError, ServerError},
    protocol::{Command, read_frame, write_message},
};

type FrameReader = Box<dyn AsyncBufRead + Send + Unpin>;
type FrameWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State for one request cycle.
///
/// Owns both halves of the client stream. Dropping it releases the socket, so
/// every exit path out of a request closes the connection.
pub struct Connection {
    peer: Option<SocketAddr>,
    reader: FrameReader,
    writer: FrameWriter,
    read_timeout: Option<Duration>,
}

impl Connection {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            peer: None,
            reader: Box::new(BufReader::new(reader)),
            writer: Box::new(writer),
            read_timeout: None,
        }
    }

    pub fn from_stream(stream: TcpStream) -> Self {
        let peer = stream.peer_addr().ok();
        let (reader, writer) = stream.into_split();
        Self {
            peer,
            ..Self::new(reader, writer)
        }
    }

    /// Bounds every frame read. `None` waits forever.
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ServerError> {
        match self.read_timeout {
            Some(limit) => timeout(limit, read_frame(&mut self.reader))
                .await
                .map_err(|_| ServerError::Timeout(limit))?
                .map_err(ServerError::from),
            None => Ok(read_frame(&mut self.reader).await?),
        }
    }

    /// Reads and parses the command frame that opens every request.
    pub async fn read_command(&mut self) -> Result<Command, ServerError> {
        let frame = self
            .next_frame()
            .await?
            .ok_or(ProtocolError::ConnectionClosed("command"))?;
        Ok(Command::decode(&frame)?)
    }

    /// Reads a follow-up frame of a known type; `what` names it in errors.
    pub async fn read_payload<T>(&mut self, what: &'static str) -> Result<T, ServerError>
    where
        T: DeserializeOwned,
    {
        let frame = self
            .next_frame()
            .await?
            .ok_or(ProtocolError::ConnectionClosed(what))?;
        serde_json::from_slice(&frame)
            .map_err(|source| ServerError::Deserialization { what, source })
    }

    /// Writes one response frame and flushes it.
    pub async fn send<T>(&mut self, payload: &T) -> Result<(), ServerError>
    where
        T: Serialize + ?Sized,
    {
        write_message(&mut self.writer, payload).await?;
        Ok(())
    }

    pub async fn close(mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}
