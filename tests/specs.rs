// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end behavioural specs.
//!
//! Admin and agents run in-process and talk real gRPC over Unix sockets;
//! only the init system and input devices are faked.

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/event_proxy.rs"]
mod event_proxy;
#[path = "specs/fleet.rs"]
mod fleet;
#[path = "specs/socket_proxy.rs"]
mod socket_proxy;
