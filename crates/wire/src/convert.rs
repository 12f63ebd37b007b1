// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions between the core data model and protobuf messages.

use givc_core::{
    LocaleAssignment, LocaleError, LocaleKey, RegistryEntry, TransportConfig, TransportError,
    UnitStatus, UnitType, UnitTypeError,
};
use thiserror::Error;

use crate::pb;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    UnitType(#[from] UnitTypeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Locale(#[from] LocaleError),
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

impl From<ConvertError> for tonic::Status {
    fn from(err: ConvertError) -> Self {
        tonic::Status::invalid_argument(err.to_string())
    }
}

impl From<UnitStatus> for pb::systemd::UnitStatus {
    fn from(s: UnitStatus) -> Self {
        Self {
            name: s.name,
            description: s.description,
            load_state: s.load_state,
            active_state: s.active_state,
            sub_state: s.sub_state,
            path: s.path,
            freezer_state: s.freezer_state,
        }
    }
}

impl From<pb::systemd::UnitStatus> for UnitStatus {
    fn from(s: pb::systemd::UnitStatus) -> Self {
        Self {
            name: s.name,
            description: s.description,
            load_state: s.load_state,
            active_state: s.active_state,
            sub_state: s.sub_state,
            path: s.path,
            freezer_state: s.freezer_state,
        }
    }
}

impl From<UnitStatus> for pb::systemd::UnitResponse {
    fn from(s: UnitStatus) -> Self {
        Self { unit_status: Some(s.into()) }
    }
}

/// Unit status carried by a response, or an empty status.
pub fn unit_status_of(resp: pb::systemd::UnitResponse) -> UnitStatus {
    resp.unit_status.map(Into::into).unwrap_or_default()
}

impl From<TransportConfig> for pb::admin::TransportConfig {
    fn from(t: TransportConfig) -> Self {
        Self { protocol: t.protocol.to_string(), address: t.address, port: t.port, name: t.name }
    }
}

impl TryFrom<pb::admin::TransportConfig> for TransportConfig {
    type Error = ConvertError;

    fn try_from(t: pb::admin::TransportConfig) -> Result<Self, Self::Error> {
        let protocol = if t.protocol.is_empty() { Default::default() } else { t.protocol.parse()? };
        Ok(Self { name: t.name, address: t.address, port: t.port, protocol })
    }
}

impl From<RegistryEntry> for pb::admin::RegistryRequest {
    fn from(e: RegistryEntry) -> Self {
        Self {
            name: e.name,
            parent: e.parent,
            r#type: e.unit_type.as_u32(),
            transport: Some(e.transport.into()),
            state: Some(e.state.into()),
        }
    }
}

/// Registration request as an entry; `watch` is decided by the admin.
impl TryFrom<pb::admin::RegistryRequest> for RegistryEntry {
    type Error = ConvertError;

    fn try_from(req: pb::admin::RegistryRequest) -> Result<Self, Self::Error> {
        if req.name.is_empty() {
            return Err(ConvertError::MissingField("name"));
        }
        let unit_type = UnitType::from_u32(req.r#type)?;
        let transport = match req.transport {
            Some(t) => TransportConfig::try_from(t)?,
            None => TransportConfig::default(),
        };
        Ok(RegistryEntry::new(req.name, unit_type)
            .with_parent(req.parent)
            .with_transport(transport)
            .with_state(req.state.map(Into::into).unwrap_or_default()))
    }
}

impl From<LocaleAssignment> for pb::locale::LocaleAssignment {
    fn from(a: LocaleAssignment) -> Self {
        let key = pb::locale::LocaleMacroKey::from_str_name(a.key.as_str())
            .unwrap_or(pb::locale::LocaleMacroKey::Lang);
        Self { key: key as i32, value: a.value }
    }
}

impl TryFrom<pb::locale::LocaleAssignment> for LocaleAssignment {
    type Error = ConvertError;

    fn try_from(a: pb::locale::LocaleAssignment) -> Result<Self, Self::Error> {
        let name = pb::locale::LocaleMacroKey::try_from(a.key)
            .map(|k| k.as_str_name())
            .map_err(|_| LocaleError::UnknownKey(a.key.to_string()))?;
        let key: LocaleKey = name.parse()?;
        Ok(LocaleAssignment::new(key, a.value))
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
