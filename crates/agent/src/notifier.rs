// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `UserNotificationService`: fan a notification out to every desktop
//! listener socket in a directory.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use givc_wire::pb::notify::user_notification_service_server::{
    UserNotificationService, UserNotificationServiceServer,
};
use givc_wire::pb::notify::{Status as NotifyStatus, UrgencyLevel, UserNotification};
use givc_wire::AuthInterceptor;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status};
use tracing::{debug, info, warn};

pub const NOTIFICATION_SENT: &str = "Notification sent";

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("cannot list notification sockets in {path}: {source}")]
    ListSockets { path: PathBuf, source: std::io::Error },
    #[error("cannot encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<NotifierError> for Status {
    fn from(err: NotifierError) -> Self {
        match err {
            NotifierError::ListSockets { .. } => Status::failed_precondition(err.to_string()),
            NotifierError::Encode(_) => Status::internal(err.to_string()),
        }
    }
}

/// What listeners receive, one JSON document per connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification<'a> {
    pub event: &'a str,
    pub title: &'a str,
    pub urgency: &'static str,
    pub icon: &'a str,
    pub message: &'a str,
}

impl<'a> Notification<'a> {
    pub fn from_request(req: &'a UserNotification) -> Self {
        let urgency = match UrgencyLevel::try_from(req.urgency).unwrap_or(UrgencyLevel::Normal) {
            UrgencyLevel::Low => "low",
            UrgencyLevel::Normal => "normal",
            UrgencyLevel::Critical => "critical",
        };
        Self { event: &req.event, title: &req.title, urgency, icon: &req.icon, message: &req.message }
    }
}

#[derive(Debug, Clone)]
pub struct NotifierRpc {
    socket_dir: PathBuf,
}

impl NotifierRpc {
    pub fn new(socket_dir: impl Into<PathBuf>) -> Self {
        Self { socket_dir: socket_dir.into() }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<UserNotificationServiceServer<Self>, AuthInterceptor> {
        UserNotificationServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }

    /// Unix sockets directly under the socket directory, sorted.
    pub fn sockets(&self) -> Result<Vec<PathBuf>, NotifierError> {
        let entries = std::fs::read_dir(&self.socket_dir)
            .map_err(|source| NotifierError::ListSockets { path: self.socket_dir.clone(), source })?;
        let mut sockets: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_ok_and(|t| t.is_socket()))
            .map(|e| e.path())
            .collect();
        sockets.sort();
        Ok(sockets)
    }

    /// Deliver to every listener concurrently. Returns how many accepted it;
    /// a listener that fails is skipped.
    pub async fn broadcast(&self, notification: &Notification<'_>) -> Result<usize, NotifierError> {
        let payload = serde_json::to_vec(notification)?;
        let sockets = self.sockets()?;
        if sockets.is_empty() {
            debug!(dir = %self.socket_dir.display(), "no notification listeners");
            return Ok(0);
        }
        let sends = sockets.iter().map(|path| deliver(path, &payload));
        let delivered = join_all(sends).await.into_iter().filter(|ok| *ok).count();
        info!(event = notification.event, delivered, listeners = sockets.len(), "notification broadcast");
        Ok(delivered)
    }
}

async fn deliver(path: &Path, payload: &[u8]) -> bool {
    let result = async {
        let mut stream = UnixStream::connect(path).await?;
        stream.write_all(payload).await?;
        stream.shutdown().await
    }
    .await;
    if let Err(e) = &result {
        warn!(socket = %path.display(), "notification not delivered: {}", e);
    }
    result.is_ok()
}

#[tonic::async_trait]
impl UserNotificationService for NotifierRpc {
    async fn notify_user(&self, request: Request<UserNotification>) -> Result<Response<NotifyStatus>, Status> {
        let req = request.into_inner();
        let notification = Notification::from_request(&req);
        self.broadcast(&notification).await.map_err(|e| {
            warn!("notification failed: {}", e);
            Status::from(e)
        })?;
        Ok(Response::new(NotifyStatus { status: NOTIFICATION_SENT.to_string() }))
    }
}

#[cfg(test)]
#[path = "notifier_tests.rs"]
mod tests;
