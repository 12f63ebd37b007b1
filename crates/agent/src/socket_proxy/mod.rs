// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-stream bridge between a local Unix socket and a remote agent.
//!
//! In client mode the agent owns a listening socket and opens one
//! `TransferData` stream per accepted connection. In server mode the agent
//! answers `TransferData` by dialing its local socket. Either way the two
//! byte streams are spliced until one side ends; a local read end is sent to
//! the peer as the `EOF` sentinel packet.

pub mod client;
pub mod server;
pub mod splice;

pub use client::SocketProxyClient;
pub use server::SocketProxyServer;
pub use splice::{splice, SpliceEnd};

use std::io;
use std::path::PathBuf;

use givc_wire::WireError;
use thiserror::Error;
use tonic::Status;

/// Sentinel payload marking the end of the sender's local stream.
pub const EOF_SENTINEL: &[u8] = b"EOF";

/// Read size for the local socket.
pub const BUFFER_SIZE: usize = 8192;

/// Group owning client-mode sockets.
pub const SOCKET_GID: u32 = 100;

pub const SOCKET_MODE: u32 = 0o770;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("socket {path}: {source}")]
    Socket { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("remote stream failed: {0}")]
    Remote(Status),
    #[error("remote stream closed")]
    RemoteGone,
    #[error(transparent)]
    Wire(#[from] WireError),
}
