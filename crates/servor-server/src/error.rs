//! Server error types.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Fatal server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Certificate or private key missing, unreadable, or invalid.
    #[error("TLS error for {}: {message}", path.display())]
    Tls {
        /// Offending file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// Live reload target is missing or not a directory.
    #[error("Cannot watch {}: not a directory", .0.display())]
    InvalidWatchTarget(PathBuf),

    /// The OS file watcher could not be installed.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Host/port pair does not form a socket address.
    #[error("Invalid listen address: {0}")]
    Address(String),

    /// Listener could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
