// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Producer side: find the device, register it with the consumer, stream
//! its events. A disconnect restarts the whole cycle.

use std::sync::Arc;
use std::time::Duration;

use givc_wire::pb::event::event_service_client::EventServiceClient;
use givc_wire::pb::event::{DeviceInfo, InputEvent};
use givc_wire::EndpointConfig;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;
use tracing::{debug, info, warn};

use super::{
    DeviceFinder, EventProxyError, InputSource, BATCH_SIZE, CONSUMER_DIAL_TIMEOUT, DIAL_RETRY_INTERVAL,
};

/// Pause after a transient read error.
const READ_RETRY_DELAY: Duration = Duration::from_millis(10);

pub struct EventProducer {
    target: String,
    endpoint: EndpointConfig,
    finder: Arc<dyn DeviceFinder>,
    dial_timeout: Duration,
    retry_interval: Duration,
}

impl EventProducer {
    pub fn new(target: impl Into<String>, endpoint: EndpointConfig, finder: Arc<dyn DeviceFinder>) -> Self {
        Self {
            target: target.into(),
            endpoint,
            finder,
            dial_timeout: CONSUMER_DIAL_TIMEOUT,
            retry_interval: DIAL_RETRY_INTERVAL,
        }
    }

    pub fn with_timing(mut self, dial_timeout: Duration, retry_interval: Duration) -> Self {
        self.dial_timeout = dial_timeout;
        self.retry_interval = retry_interval;
        self
    }

    /// Run find→register→stream cycles until cancelled.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), EventProxyError> {
        let channel = self.endpoint.connect()?;
        info!(device = %self.target, consumer = %self.endpoint.transport.name, "event producer started");
        loop {
            match self.cycle(&channel, &cancel).await {
                Ok(()) | Err(EventProxyError::Cancelled) => return Ok(()),
                Err(EventProxyError::DeviceDisconnected) => {
                    warn!(device = %self.target, "input device disconnected, waiting for it to return");
                }
                Err(e) => {
                    warn!(device = %self.target, "event forwarding failed: {}", e);
                    tokio::select! {
                        _ = cancel.cancelled() => return Ok(()),
                        _ = tokio::time::sleep(self.retry_interval) => {}
                    }
                }
            }
        }
    }

    async fn cycle(&self, channel: &Channel, cancel: &CancellationToken) -> Result<(), EventProxyError> {
        let mut source = self.finder.find(&self.target, cancel).await?;
        let mut client = EventServiceClient::new(channel.clone());
        self.register(&mut client, DeviceInfo::from(source.identity()), cancel).await?;
        stream(&mut client, source.as_mut(), cancel).await
    }

    /// `RegisterDevice`, retried while the consumer is unreachable.
    async fn register(
        &self,
        client: &mut EventServiceClient<Channel>,
        info: DeviceInfo,
        cancel: &CancellationToken,
    ) -> Result<(), EventProxyError> {
        let deadline = Instant::now() + self.dial_timeout;
        loop {
            let status = match client.register_device(info.clone()).await {
                Ok(ack) => {
                    info!(device = %info.name, status = %ack.into_inner().status, "device registered with consumer");
                    return Ok(());
                }
                Err(status) if status.code() == tonic::Code::InvalidArgument => {
                    return Err(EventProxyError::UnsupportedDevice(info.name));
                }
                Err(status) => status,
            };
            if Instant::now() + self.retry_interval > deadline {
                return Err(EventProxyError::ConsumerUnreachable(status));
            }
            debug!("consumer not ready: {}", status.message());
            tokio::select! {
                _ = cancel.cancelled() => return Err(EventProxyError::Cancelled),
                _ = tokio::time::sleep(self.retry_interval) => {}
            }
        }
    }
}

/// Forward batches from `source` over one `StreamEvents` call. Returns when
/// the device goes away, the stream breaks or `cancel` fires; the request
/// stream is closed in every case so the consumer sees end of stream.
async fn stream(
    client: &mut EventServiceClient<Channel>,
    source: &mut dyn InputSource,
    cancel: &CancellationToken,
) -> Result<(), EventProxyError> {
    let (tx, rx) = mpsc::channel::<InputEvent>(BATCH_SIZE * 4);
    let mut call_client = client.clone();
    let call = tokio::spawn(async move { call_client.stream_events(ReceiverStream::new(rx)).await });

    let outcome = loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break Err(EventProxyError::Cancelled),
            batch = source.read_batch() => batch,
        };
        match batch {
            Ok(events) => {
                debug!(count = events.len(), "forwarding input events");
                let mut sent = true;
                for ev in events {
                    if tx.send(ev.into()).await.is_err() {
                        sent = false;
                        break;
                    }
                }
                if !sent {
                    break Err(EventProxyError::StreamClosed);
                }
            }
            Err(EventProxyError::Io(e)) => {
                debug!("transient input read error: {}", e);
                tokio::time::sleep(READ_RETRY_DELAY).await;
            }
            Err(e) => break Err(e),
        }
    };

    drop(tx);
    match call.await {
        Ok(Ok(ack)) => debug!(status = %ack.into_inner().status, "event stream closed"),
        Ok(Err(status)) => debug!("event stream ended: {}", status.message()),
        Err(e) => debug!("event stream task failed: {}", e),
    }
    outcome
}

#[cfg(test)]
#[path = "producer_tests.rs"]
mod tests;
