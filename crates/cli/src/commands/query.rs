// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry queries

use anyhow::Result;
use futures_util::{Stream, StreamExt};
use givc_wire::pb::admin::WatchItem;
use givc_wire::AdminClient;
use tonic::Status;

use crate::output::{print_unit_status, print_units, print_watch_event, OutputFormat, UnitRow, WatchEvent};

pub async fn list(admin: &AdminClient, format: OutputFormat) -> Result<()> {
    let rows: Vec<UnitRow> = admin.query_list().await?.into_iter().map(UnitRow::from).collect();
    print_units(&rows, format)
}

pub async fn status(vm: &str, unit: &str, admin: &AdminClient, format: OutputFormat) -> Result<()> {
    let status = admin.get_unit_status(vm, unit).await?;
    print_unit_status(&status, format)
}

pub async fn watch(admin: &AdminClient, initial: bool, limit: Option<usize>, format: OutputFormat) -> Result<()> {
    let stream = admin.watch().await?;
    follow(stream, initial, limit, |event| print_watch_event(event, format)).await
}

/// Drain a watch stream. The snapshot never counts towards `limit`.
pub(crate) async fn follow<S, F>(stream: S, initial: bool, limit: Option<usize>, mut emit: F) -> Result<()>
where
    S: Stream<Item = Result<WatchItem, Status>>,
    F: FnMut(&WatchEvent) -> Result<()>,
{
    let mut stream = std::pin::pin!(stream);
    let mut seen = 0;
    while limit.map_or(true, |l| seen < l) {
        let Some(item) = stream.next().await else {
            break;
        };
        let Some(event) = WatchEvent::from_item(item?) else {
            continue;
        };
        match event {
            WatchEvent::Initial { .. } if !initial => {}
            WatchEvent::Initial { .. } => emit(&event)?,
            _ => {
                emit(&event)?;
                seen += 1;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
