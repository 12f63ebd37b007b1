// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use givc_core::TransportConfig;
use givc_wire::pb::exec::exec_service_client::ExecServiceClient;
use givc_wire::EndpointConfig;
use std::time::Duration;
use tonic::service::RoutesBuilder;
use tonic::transport::Channel;
use tonic::Code;

struct Harness {
    client: ExecServiceClient<Channel>,
    cancel: CancellationToken,
    _dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let transport = TransportConfig::unix("exec", dir.path().join("exec.sock").display().to_string());
    let listener = givc_wire::server::bind_with_retry(&transport, 1, Duration::from_millis(1)).await.unwrap();
    let cancel = CancellationToken::new();
    let mut routes = RoutesBuilder::default();
    routes.add_service(ExecRpc::new(cancel.clone()).into_server(false));
    tokio::spawn(givc_wire::serve(listener, routes.routes(), None, cancel.clone()));
    let channel = EndpointConfig::new(transport, None).connect().unwrap();
    Harness { client: ExecServiceClient::new(channel), cancel, _dir: dir }
}

fn start(command: &str, args: &[&str]) -> CommandRequest {
    CommandRequest {
        command: Some(Command::Start(StartCommand {
            command: command.to_string(),
            arguments: args.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        })),
    }
}

#[derive(Debug, Default)]
struct Outcome {
    started: bool,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    return_code: Option<i32>,
}

async fn collect(mut responses: Streaming<CommandResponse>) -> Outcome {
    let mut outcome = Outcome::default();
    while let Some(resp) = responses.message().await.unwrap() {
        match resp.event.unwrap() {
            Event::Started(_) => outcome.started = true,
            Event::Stdout(io) => outcome.stdout.extend(io.payload),
            Event::Stderr(io) => outcome.stderr.extend(io.payload),
            Event::Finished(done) => outcome.return_code = Some(done.return_code),
        }
    }
    outcome
}

async fn run(h: &mut Harness, requests: Vec<CommandRequest>) -> Result<Outcome, Status> {
    let responses = h.client.run_command(tokio_stream::iter(requests)).await?.into_inner();
    Ok(collect(responses).await)
}

#[tokio::test]
async fn streams_stdout_and_exit_code() {
    let mut h = harness().await;
    let outcome = run(&mut h, vec![start("echo", &["hello"])]).await.unwrap();
    assert!(outcome.started);
    assert_eq!(outcome.stdout, b"hello\n");
    assert_eq!(outcome.return_code, Some(0));
    h.cancel.cancel();
}

#[tokio::test]
async fn reports_nonzero_exit_and_stderr() {
    let mut h = harness().await;
    let outcome = run(&mut h, vec![start("sh", &["-c", "echo oops >&2; exit 3"])]).await.unwrap();
    assert_eq!(outcome.stderr, b"oops\n");
    assert_eq!(outcome.return_code, Some(3));
    h.cancel.cancel();
}

#[tokio::test]
async fn long_output_arrives_in_bounded_chunks() {
    let mut h = harness().await;
    let requests = vec![start("sh", &["-c", "head -c 5000 /dev/zero"])];
    let mut responses = h.client.run_command(tokio_stream::iter(requests)).await.unwrap().into_inner();
    let mut total = 0;
    while let Some(resp) = responses.message().await.unwrap() {
        if let Some(Event::Stdout(io)) = resp.event {
            assert!(io.payload.len() <= CHUNK_SIZE);
            total += io.payload.len();
        }
    }
    assert_eq!(total, 5000);
    h.cancel.cancel();
}

#[tokio::test]
async fn initial_and_streamed_stdin_reach_the_command() {
    let mut h = harness().await;
    let mut first = start("cat", &[]);
    if let Some(Command::Start(s)) = first.command.as_mut() {
        s.stdin = Some(b"abc".to_vec());
    }
    let more = CommandRequest { command: Some(Command::Stdin(CommandIo { payload: b"def".to_vec() })) };
    let outcome = run(&mut h, vec![first, more]).await.unwrap();
    assert_eq!(outcome.stdout, b"abcdef");
    assert_eq!(outcome.return_code, Some(0));
    h.cancel.cancel();
}

#[tokio::test]
async fn signal_terminates_the_command() {
    let mut h = harness().await;
    let (tx, rx) = mpsc::channel(4);
    tx.send(start("sleep", &["30"])).await.unwrap();
    let mut responses = h.client.run_command(ReceiverStream::new(rx)).await.unwrap().into_inner();
    let first = responses.message().await.unwrap().unwrap();
    assert!(matches!(first.event, Some(Event::Started(StartedEvent { pid })) if pid > 0));

    tx.send(CommandRequest { command: Some(Command::Signal(SignalCommand { signal: 15 })) }).await.unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(10), collect(responses)).await.unwrap();
    assert_eq!(outcome.return_code, Some(SIGNALED));
    h.cancel.cancel();
}

#[tokio::test]
async fn first_request_must_be_start() {
    let mut h = harness().await;
    let stdin = CommandRequest { command: Some(Command::Stdin(CommandIo { payload: b"x".to_vec() })) };
    let err = run(&mut h, vec![stdin]).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    h.cancel.cancel();
}

#[tokio::test]
async fn missing_program_is_not_found() {
    let mut h = harness().await;
    let err = run(&mut h, vec![start("/nonexistent/givc-test-binary", &[])]).await.unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    h.cancel.cancel();
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let mut h = harness().await;
    let err = run(&mut h, vec![start("", &[])]).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    h.cancel.cancel();
}
