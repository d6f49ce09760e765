//! Source-style RCON client used to run console commands on the game server.
//!
//! Every logical call opens a fresh connection, authenticates, runs its
//! commands and closes the socket again, whatever the outcome.

pub mod frame;

use crate::error::{ProtocolError, RconError};
use frame::{check_declared_len, FrameKind, RconFrame, MAX_PAYLOAD_SERVERBOUND};
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

#[derive(Clone)]
pub struct RconClient {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
}

impl fmt::Debug for RconClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RconClient")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RconClient {
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            timeout,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connect and authenticate. The returned session must be closed by the caller;
    /// prefer [`RconClient::execute`] which does that on every path.
    pub async fn open(&self) -> Result<RconSession<TcpStream>, RconError> {
        let address = self.address();
        let stream = timeout(self.timeout, TcpStream::connect(&address))
            .await
            .map_err(|_| RconError::Connection {
                address: address.clone(),
                reason: "connection timed out".to_string(),
            })?
            .map_err(|e| RconError::Connection {
                address: address.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!("rcon connected to {}", address);
        RconSession::login(stream, &self.password, self.timeout).await
    }

    /// Run `commands` in order inside one authenticated session and return one
    /// response per command. Stops at the first failure.
    pub async fn execute(&self, commands: &[String]) -> Result<Vec<String>, RconError> {
        let mut session = self.open().await?;
        let result = session.send_all(commands).await;
        session.close().await;
        result
    }
}

/// A live, authenticated console connection.
pub struct RconSession<S> {
    stream: S,
    timeout: Duration,
    next_id: i32,
    authenticated: bool,
    closed: bool,
}

impl<S> RconSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Authenticate over an already connected transport. On failure the
    /// transport is shut down before the error is returned.
    pub async fn login(stream: S, password: &str, timeout: Duration) -> Result<Self, RconError> {
        let mut session = Self {
            stream,
            timeout,
            next_id: 1,
            authenticated: false,
            closed: false,
        };

        match session.authenticate(password).await {
            Ok(()) => Ok(session),
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated && !self.closed
    }

    async fn authenticate(&mut self, password: &str) -> Result<(), RconError> {
        let id = self.next_request_id();
        self.write_frame(&RconFrame::new(id, FrameKind::Auth, password))
            .await?;

        loop {
            let frame = self.read_frame().await?;
            if frame.request_id == -1 {
                return Err(RconError::Authentication);
            }

            match frame.kind {
                FrameKind::ExecCommand => {
                    if frame.request_id != id {
                        return Err(ProtocolError::RequestIdMismatch {
                            expected: id,
                            actual: frame.request_id,
                        }
                        .into());
                    }
                    self.authenticated = true;
                    return Ok(());
                }
                // Source servers send an empty RESPONSE_VALUE ahead of the auth response.
                kind => tracing::debug!("skipping {:?} frame while authenticating", kind),
            }
        }
    }

    /// Run one command and collect its (possibly fragmented) response.
    pub async fn send(&mut self, command: &str) -> Result<String, RconError> {
        if !self.is_authenticated() {
            return Err(ProtocolError::NotAuthenticated.into());
        }

        let id = self.next_request_id();
        self.write_frame(&RconFrame::new(id, FrameKind::ExecCommand, command))
            .await?;

        let mut response = Vec::new();
        loop {
            let frame = self.read_frame().await?;
            if frame.request_id == -1 {
                self.authenticated = false;
                return Err(RconError::Authentication);
            }
            if frame.request_id != id {
                tracing::debug!(
                    "discarding frame for request {} while waiting on {}",
                    frame.request_id,
                    id
                );
                continue;
            }

            let terminal = frame.ends_response();
            response.extend_from_slice(&frame.payload);
            if terminal {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    pub async fn send_all(&mut self, commands: &[String]) -> Result<Vec<String>, RconError> {
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            responses.push(self.send(command).await?);
        }
        Ok(responses)
    }

    /// Shut the transport down. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.authenticated = false;
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("ignoring error while closing rcon transport: {}", e);
        }
    }

    fn next_request_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = if self.next_id == i32::MAX { 1 } else { self.next_id + 1 };
        id
    }

    async fn write_frame(&mut self, frame: &RconFrame) -> Result<(), ProtocolError> {
        if frame.payload.len() > MAX_PAYLOAD_SERVERBOUND {
            return Err(ProtocolError::PayloadTooLong(frame.payload.len()));
        }
        let bytes = frame.encode();
        let limit = self.timeout;
        let stream = &mut self.stream;
        let write = async move {
            stream.write_all(&bytes).await?;
            stream.flush().await
        };
        timeout(limit, write)
            .await
            .map_err(|_| ProtocolError::Timeout)?
            .map_err(closed_or_io)
    }

    async fn read_frame(&mut self) -> Result<RconFrame, ProtocolError> {
        timeout(self.timeout, read_frame_from(&mut self.stream))
            .await
            .map_err(|_| ProtocolError::Timeout)?
    }
}

/// Read exactly one frame: the length prefix, then exactly that many bytes.
async fn read_frame_from<S>(stream: &mut S) -> Result<RconFrame, ProtocolError>
where
    S: AsyncRead + Unpin,
{
    let prefix = stream.read_i32_le().await.map_err(closed_or_io)?;
    let declared = check_declared_len(prefix)?;

    let mut buf = vec![0u8; 4 + declared];
    buf[..4].copy_from_slice(&prefix.to_le_bytes());
    stream.read_exact(&mut buf[4..]).await.map_err(closed_or_io)?;

    RconFrame::decode(&buf)
}

fn closed_or_io(e: io::Error) -> ProtocolError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset => ProtocolError::ConnectionClosed,
        _ => ProtocolError::Io(e),
    }
}
