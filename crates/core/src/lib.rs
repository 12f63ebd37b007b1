// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! givc-core: shared data model for the fleet admin, the per-VM agents
//! and the command-line client.

pub mod entry;
pub mod locale;
pub mod manifest;
pub mod naming;
pub mod status;
pub mod transport;
pub mod unit_type;
pub mod validate;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use entry::RegistryEntry;
pub use locale::{validate_locale, validate_timezone, LocaleAssignment, LocaleError, LocaleKey};
pub use manifest::{validate_application_manifests, ApplicationManifest, ArgType, ManifestError};
pub use naming::{
    agent_service_name, parse_instance_name, vm_from_agent_service, vm_from_vm_service, vm_service_name, AppRef,
};
pub use status::UnitStatus;
pub use transport::{EndpointAddress, Protocol, TransportConfig, TransportError};
pub use unit_type::{UnitClass, UnitType, UnitTypeError, VmClass};
pub use validate::{ArgumentValidator, ValidationError};
