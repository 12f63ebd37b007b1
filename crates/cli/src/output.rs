// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Text and JSON rendering of admin replies.

use givc_core::UnitStatus;
use givc_wire::pb::admin::watch_item::Status as WatchStatus;
use givc_wire::pb::admin::{ApplicationResponse, QueryListItem, WatchItem};
use serde::Serialize;

use crate::color;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// One row of `query-list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRow {
    pub name: String,
    pub description: String,
    pub vm_status: String,
    pub trust_level: String,
    pub vm_type: String,
    pub service_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl From<QueryListItem> for UnitRow {
    fn from(item: QueryListItem) -> Self {
        Self {
            name: item.name,
            description: item.description,
            vm_status: item.vm_status,
            trust_level: item.trust_level,
            vm_type: item.vm_type,
            service_type: item.service_type,
            vm_name: item.vm_name.filter(|v| !v.is_empty()),
            agent_name: item.agent_name.filter(|a| !a.is_empty()),
        }
    }
}

/// A registry change seen by `watch`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WatchEvent {
    Initial { units: Vec<UnitRow> },
    Added(UnitRow),
    Updated(UnitRow),
    Removed(UnitRow),
}

impl WatchEvent {
    /// `None` for an item carrying no payload.
    pub fn from_item(item: WatchItem) -> Option<Self> {
        Some(match item.status? {
            WatchStatus::Initial(list) => Self::Initial { units: list.list.into_iter().map(UnitRow::from).collect() },
            WatchStatus::Added(unit) => Self::Added(unit.into()),
            WatchStatus::Updated(unit) => Self::Updated(unit.into()),
            WatchStatus::Removed(unit) => Self::Removed(unit.into()),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AppOutcome<'a> {
    cmd_status: &'a str,
    app_status: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Started<'a> {
    registry_id: &'a str,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn print_app_response(resp: &ApplicationResponse, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            print_json(&AppOutcome { cmd_status: &resp.cmd_status, app_status: &resp.app_status })?
        }
        OutputFormat::Text if resp.app_status.is_empty() => println!("{}", resp.cmd_status),
        OutputFormat::Text => println!("{}: {}", color::header(&resp.app_status), resp.cmd_status),
    }
    Ok(())
}

pub fn print_started(registry_id: &str, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&Started { registry_id })?,
        OutputFormat::Text => println!("Started {}", color::header(registry_id)),
    }
    Ok(())
}

pub fn print_unit_status(status: &UnitStatus, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(status)?,
        OutputFormat::Text => {
            println!("{} {}", color::header(&status.name), color::state(&status.summary()));
            if !status.description.is_empty() {
                println!("  {}", status.description);
            }
            println!("  {} {}", color::muted("load:"), status.load_state);
            if !status.freezer_state.is_empty() {
                println!("  {} {}", color::muted("freezer:"), status.freezer_state);
            }
        }
    }
    Ok(())
}

pub fn print_units(rows: &[UnitRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Text => print!("{}", unit_table(rows)),
    }
    Ok(())
}

pub fn print_watch_event(event: &WatchEvent, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(event)?,
        OutputFormat::Text => match event {
            WatchEvent::Initial { units } => print!("{}", unit_table(units)),
            WatchEvent::Added(row) => println!("{} {}", color::header("added  "), row_summary(row)),
            WatchEvent::Updated(row) => println!("{} {}", color::header("updated"), row_summary(row)),
            WatchEvent::Removed(row) => println!("{} {}", color::header("removed"), row_summary(row)),
        },
    }
    Ok(())
}

fn row_summary(row: &UnitRow) -> String {
    format!("{} {}", row.name, color::state(&row.vm_status))
}

const COLUMNS: [&str; 4] = ["NAME", "TYPE", "VM", "STATUS"];

/// Left-aligned table; colors are applied after padding so widths hold.
pub fn unit_table(rows: &[UnitRow]) -> String {
    if rows.is_empty() {
        return format!("{}\n", color::muted("no units registered"));
    }
    let cells: Vec<[&str; 4]> = rows
        .iter()
        .map(|r| [r.name.as_str(), r.service_type.as_str(), r.vm_name.as_deref().unwrap_or("-"), r.vm_status.as_str()])
        .collect();
    let mut widths = COLUMNS.map(str::len);
    for row in &cells {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let [w_name, w_type, w_vm, _] = widths;
    let mut out = color::header(&format!("{:<w_name$}  {:<w_type$}  {:<w_vm$}  STATUS", "NAME", "TYPE", "VM"));
    out.push('\n');
    for [name, ty, vm, status] in &cells {
        out.push_str(&format!("{:<w_name$}  {:<w_type$}  {:<w_vm$}  {}\n", name, ty, vm, color::state(status)));
    }
    out
}
