// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use futures_util::{Stream, StreamExt};
use givc_wire::pb::socket::BytePacket;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tonic::Status;
use tracing::{debug, warn};

use super::{ProxyError, BUFFER_SIZE, EOF_SENTINEL};

/// Why a splice ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceEnd {
    /// The local socket reached end of stream; `EOF` was sent to the peer
    LocalEof,
    /// The peer sent `EOF`
    RemoteEof,
    /// The peer closed its stream without `EOF`
    RemoteClosed,
    Cancelled,
}

/// Copy bytes both ways between `local` and a remote packet stream until
/// either side ends or `cancel` fires. The local socket is closed on return.
pub async fn splice<R>(
    local: UnixStream,
    inbound: R,
    outbound: mpsc::Sender<BytePacket>,
    cancel: CancellationToken,
) -> Result<SpliceEnd, ProxyError>
where
    R: Stream<Item = Result<BytePacket, Status>> + Unpin,
{
    let (reader, writer) = local.into_split();
    let end = tokio::select! {
        res = remote_to_local(inbound, writer) => res,
        res = local_to_remote(reader, outbound) => res,
        _ = cancel.cancelled() => Ok(SpliceEnd::Cancelled),
    };
    match &end {
        Ok(reason) => debug!(?reason, "splice finished"),
        Err(e) => warn!("splice failed: {}", e),
    }
    end
}

async fn remote_to_local<R>(mut inbound: R, mut writer: OwnedWriteHalf) -> Result<SpliceEnd, ProxyError>
where
    R: Stream<Item = Result<BytePacket, Status>> + Unpin,
{
    while let Some(packet) = inbound.next().await {
        let packet = packet.map_err(ProxyError::Remote)?;
        if packet.data == EOF_SENTINEL {
            return Ok(SpliceEnd::RemoteEof);
        }
        writer.write_all(&packet.data).await?;
    }
    Ok(SpliceEnd::RemoteClosed)
}

async fn local_to_remote(mut reader: OwnedReadHalf, outbound: mpsc::Sender<BytePacket>) -> Result<SpliceEnd, ProxyError> {
    let mut buf = vec![0u8; BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => 0,
            Ok(n) => n,
            Err(e) => {
                debug!("local read failed: {}", e);
                0
            }
        };
        if n == 0 {
            outbound
                .send(BytePacket { data: EOF_SENTINEL.to_vec() })
                .await
                .map_err(|_| ProxyError::RemoteGone)?;
            return Ok(SpliceEnd::LocalEof);
        }
        outbound.send(BytePacket { data: buf[..n].to_vec() }).await.map_err(|_| ProxyError::RemoteGone)?;
    }
}

#[cfg(test)]
#[path = "splice_tests.rs"]
mod tests;
