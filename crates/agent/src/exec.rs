// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ExecService`: run a command on the agent's VM and stream its output.
//!
//! The first request on the stream must be `Start`; later requests feed
//! stdin or deliver signals. The response stream carries `Started`, then
//! interleaved stdout/stderr chunks, and always ends with `Finished`.

use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use futures_util::Stream;
use givc_wire::pb::exec::command_request::Command;
use givc_wire::pb::exec::command_response::Event;
use givc_wire::pb::exec::exec_service_server::{ExecService, ExecServiceServer};
use givc_wire::pb::exec::{
    CommandIo, CommandRequest, CommandResponse, FinishedEvent, SignalCommand, StartCommand, StartedEvent,
};
use givc_wire::AuthInterceptor;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command as Process};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tonic::codegen::InterceptedService;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

/// Output is forwarded in chunks of at most this many bytes.
pub const CHUNK_SIZE: usize = 1024;

/// Exit code reported for a process killed by a signal.
const SIGNALED: i32 = -1;

type Events = mpsc::Sender<Result<CommandResponse, Status>>;

#[derive(Debug, Clone)]
pub struct ExecRpc {
    cancel: CancellationToken,
}

impl ExecRpc {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn into_server(self, tls: bool) -> InterceptedService<ExecServiceServer<Self>, AuthInterceptor> {
        ExecServiceServer::with_interceptor(self, AuthInterceptor::new(tls))
    }
}

fn event(event: Event) -> Result<CommandResponse, Status> {
    Ok(CommandResponse { event: Some(event) })
}

fn spawn(start: &StartCommand) -> Result<Child, Status> {
    if start.command.is_empty() {
        return Err(Status::invalid_argument("command is empty"));
    }
    let mut process = Process::new(&start.command);
    process
        .args(&start.arguments)
        .envs(&start.env_vars)
        .stdin(if start.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = start.working_directory.as_deref().filter(|d| !d.is_empty()) {
        process.current_dir(dir);
    }
    process.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Status::not_found(format!("cannot run {}: {}", start.command, e)),
        std::io::ErrorKind::PermissionDenied => {
            Status::permission_denied(format!("cannot run {}: {}", start.command, e))
        }
        _ => Status::internal(format!("cannot run {}: {}", start.command, e)),
    })
}

/// Forward `reader` to the response stream until EOF.
async fn pump<R>(mut reader: R, tx: Events, wrap: fn(CommandIo) -> Event)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(event(wrap(CommandIo { payload: buf[..n].to_vec() }))).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("output read failed: {}", e);
                break;
            }
        }
    }
}

fn deliver_signal(pid: u32, SignalCommand { signal }: SignalCommand) {
    let signal = match Signal::try_from(signal) {
        Ok(signal) => signal,
        Err(_) => {
            warn!(pid, signal, "ignoring unknown signal");
            return;
        }
    };
    let Ok(raw) = i32::try_from(pid) else { return };
    if let Err(e) = kill(Pid::from_raw(raw), signal) {
        warn!(pid, ?signal, "signal delivery failed: {}", e);
    }
}

/// Apply stdin and signal requests until the client half-closes.
async fn drive_input(mut inbound: Streaming<CommandRequest>, mut stdin: Option<ChildStdin>, pid: u32) {
    loop {
        let request = match inbound.message().await {
            Ok(Some(request)) => request,
            Ok(None) => break,
            Err(e) => {
                debug!(pid, "request stream ended: {}", e);
                break;
            }
        };
        match request.command {
            Some(Command::Stdin(CommandIo { payload })) => {
                let Some(pipe) = stdin.as_mut() else {
                    warn!(pid, "stdin was not requested at start; dropping input");
                    continue;
                };
                if let Err(e) = pipe.write_all(&payload).await {
                    warn!(pid, "stdin write failed: {}", e);
                    stdin = None;
                }
            }
            Some(Command::Signal(signal)) => deliver_signal(pid, signal),
            Some(Command::Start(_)) => warn!(pid, "ignoring second start request"),
            None => {}
        }
    }
    // Dropping the pipe closes the child's stdin
}

fn return_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(SIGNALED)
}

async fn supervise(
    mut child: Child,
    pid: u32,
    inbound: Streaming<CommandRequest>,
    initial_stdin: Option<Vec<u8>>,
    tx: Events,
    cancel: CancellationToken,
) {
    let mut stdin = child.stdin.take();
    if let (Some(pipe), Some(payload)) = (stdin.as_mut(), initial_stdin.filter(|p| !p.is_empty())) {
        if let Err(e) = pipe.write_all(&payload).await {
            warn!(pid, "stdin write failed: {}", e);
        }
    }
    let stdout = child.stdout.take().map(|r| tokio::spawn(pump(r, tx.clone(), Event::Stdout)));
    let stderr = child.stderr.take().map(|r| tokio::spawn(pump(r, tx.clone(), Event::Stderr)));
    let input = tokio::spawn(drive_input(inbound, stdin, pid));

    let status = tokio::select! {
        status = child.wait() => status,
        _ = tx.closed() => {
            info!(pid, "client went away; killing command");
            let _ = child.start_kill();
            child.wait().await
        }
        _ = cancel.cancelled() => {
            let _ = child.start_kill();
            child.wait().await
        }
    };
    input.abort();
    for task in [stdout, stderr].into_iter().flatten() {
        let _ = task.await;
    }

    match status {
        Ok(status) => {
            let return_code = return_code(status);
            info!(pid, return_code, "command finished");
            let _ = tx.send(event(Event::Finished(FinishedEvent { return_code }))).await;
        }
        Err(e) => {
            warn!(pid, "wait failed: {}", e);
            let _ = tx.send(Err(Status::internal(format!("wait failed: {}", e)))).await;
        }
    }
}

#[tonic::async_trait]
impl ExecService for ExecRpc {
    type RunCommandStream = Pin<Box<dyn Stream<Item = Result<CommandResponse, Status>> + Send + 'static>>;

    async fn run_command(
        &self,
        request: Request<Streaming<CommandRequest>>,
    ) -> Result<Response<Self::RunCommandStream>, Status> {
        let mut inbound = request.into_inner();
        let first = inbound.message().await?.ok_or_else(|| Status::invalid_argument("stream closed before start"))?;
        let Some(Command::Start(start)) = first.command else {
            return Err(Status::invalid_argument("first request must be start"));
        };
        info!(command = %start.command, args = ?start.arguments, "running command");
        let child = spawn(&start)?;
        let pid = child.id().unwrap_or_default();

        let (tx, rx) = mpsc::channel(32);
        tx.send(event(Event::Started(StartedEvent { pid: i32::try_from(pid).unwrap_or_default() })))
            .await
            .map_err(|_| Status::cancelled("client went away"))?;
        tokio::spawn(supervise(child, pid, inbound, start.stdin, tx, self.cancel.clone()));
        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
