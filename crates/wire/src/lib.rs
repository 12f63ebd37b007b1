// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC plumbing shared by admin, agents and the CLI.
//!
//! gRPC over HTTP/2 (tonic), carried over TCP, Unix sockets or vsock, with
//! optional mutual TLS and a peer-address check on TCP connections.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod pb {
    //! Generated protobuf types and service stubs.
    #![allow(clippy::all, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    pub mod admin {
        tonic::include_proto!("admin");
    }
    pub mod event {
        tonic::include_proto!("event");
    }
    pub mod exec {
        tonic::include_proto!("exec");
    }
    pub mod hwid {
        tonic::include_proto!("hwid");
    }
    pub mod locale {
        tonic::include_proto!("locale");
    }
    pub mod notify {
        tonic::include_proto!("notify");
    }
    pub mod socket {
        tonic::include_proto!("socket");
    }
    pub mod systemd {
        tonic::include_proto!("systemd");
    }
    pub mod wifi {
        tonic::include_proto!("wifi");
    }
}

pub mod client;
pub mod convert;
pub mod endpoint;
pub mod retry;
pub mod security;
pub mod server;
pub mod tls;

pub use client::{AdminClient, AgentClient};
pub use convert::ConvertError;
pub use endpoint::{EndpointConfig, WireError};
pub use retry::RetryPolicy;
pub use security::{AuthInterceptor, PeerInfo, SecurityInfo};
pub use server::{bind, serve, GrpcListener, ServeError, ServerStream};
pub use tls::{TlsConfig, TlsError};

/// Status text returned by control calls that succeeded.
pub const CMD_SUCCESS: &str = "Command successful.";

/// Status text returned by control calls that failed; the error goes in `app_status`.
pub const CMD_FAILURE: &str = "Command failed.";
