use std::io;
use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Framing and exchange failures on an RCON link.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("timed out waiting for the server")]
    Timeout,

    #[error("connection closed by the server")]
    ConnectionClosed,

    #[error("declared frame length {0} is out of range")]
    InvalidLength(i32),

    /// The length prefix disagrees with the bytes actually present.
    #[error("declared frame length {declared} does not match {available} available bytes")]
    LengthMismatch { declared: usize, available: usize },

    #[error("frame is missing its null terminators")]
    MissingTerminator,

    #[error("payload of {0} bytes exceeds the serverbound limit")]
    PayloadTooLong(usize),

    #[error("expected request id {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    #[error("session is not authenticated")]
    NotAuthenticated,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Everything that can go wrong while talking to the remote console.
#[derive(Error, Debug)]
pub enum RconError {
    #[error("failed to connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    /// The server answered the login with request id -1.
    #[error("authentication failed (bad rcon password)")]
    Authentication,

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unknown role {0:?} in users table")]
    UnknownRole(String),
}
