// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proptest strategies and fixture builders shared across crates.

use proptest::collection::vec;
use proptest::prelude::*;

use crate::{ApplicationManifest, ArgType, RegistryEntry, TransportConfig, UnitStatus, UnitType};

pub mod strategies {
    use super::*;

    pub fn arb_unit_type() -> impl Strategy<Value = UnitType> {
        (0u32..15).prop_map(|n| UnitType::ALL[n as usize])
    }

    /// Identifier accepted on both sides of `<base>@<id>.service`.
    pub fn arb_ident() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,12}"
    }

    pub fn arb_service_name() -> impl Strategy<Value = String> {
        (arb_ident(), arb_ident()).prop_map(|(base, id)| format!("{}@{}.service", base, id))
    }

    pub fn arb_flag() -> impl Strategy<Value = String> {
        ("-{1,2}", "[a-zA-Z0-9_-]{1,16}").prop_map(|(dashes, body)| format!("{}{}", dashes, body))
    }

    pub fn arb_https_url() -> impl Strategy<Value = String> {
        ("[a-z]{1,10}", "(com|org|net|fi)", "[a-z0-9]{0,10}")
            .prop_map(|(host, tld, path)| format!("https://{}.{}/{}", host, tld, path))
    }

    pub fn arb_shell_injection() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(|c| format!(";{}", c)),
            "[a-z]{1,8}".prop_map(|c| format!("$({})", c)),
            "[a-z]{1,8}".prop_map(|c| format!("`{}`", c)),
            "[a-z]{1,8}".prop_map(|c| format!("|{}", c)),
        ]
    }

    pub fn arb_arg_types() -> impl Strategy<Value = Vec<ArgType>> {
        proptest::sample::subsequence(ArgType::VALIDATION_ORDER.to_vec(), 0..=3)
    }

    /// Manifests that pass `validate_application_manifests`.
    pub fn arb_valid_manifests() -> impl Strategy<Value = Vec<ApplicationManifest>> {
        vec(("[a-z]{1,8}", "/bin/[a-z]{1,8}( --[a-z]{1,6})?", arb_arg_types()), 0..6).prop_map(
            |items| {
                let mut out: Vec<ApplicationManifest> = Vec::new();
                for (name, command, args) in items {
                    if out.iter().any(|m| m.name == name) {
                        continue;
                    }
                    let dirs: Vec<String> = if args.contains(&ArgType::File) {
                        vec!["/home/user/Downloads".to_string()]
                    } else {
                        vec![]
                    };
                    out.push(ApplicationManifest::new(name, command).with_args(args).with_directories(dirs));
                }
                out
            },
        )
    }

    pub fn arb_entry() -> impl Strategy<Value = RegistryEntry> {
        ("[a-z]{1,6}(@[0-9]{1,2})?\\.service", arb_unit_type(), any::<bool>())
            .prop_map(|(name, ty, watch)| RegistryEntry::new(name, ty).with_watch(watch))
    }
}

/// Active, running status for `name`.
pub fn running_status(name: &str) -> UnitStatus {
    UnitStatus {
        name: name.to_string(),
        description: format!("{} unit", name),
        load_state: "loaded".to_string(),
        active_state: "active".to_string(),
        sub_state: "running".to_string(),
        path: format!("/org/freedesktop/systemd1/unit/{}", name.replace(['@', '.', '-'], "_")),
        freezer_state: "running".to_string(),
    }
}

/// Agent registry entry listening on a unix socket.
pub fn agent_entry(vm: &str, ty: UnitType, socket: &str) -> RegistryEntry {
    let name = crate::agent_service_name(vm);
    RegistryEntry::new(name.clone(), ty)
        .with_transport(TransportConfig::unix(vm, socket))
        .with_state(running_status(&name))
        .with_watch(ty.is_manager())
}
