// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::CommandFactory;
use givc_core::LocaleKey;
use serial_test::serial;
use yare::parameterized;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("givc-cli").chain(args.iter().copied())).unwrap()
}

fn parse_err(args: &[&str]) -> clap::Error {
    Cli::try_parse_from(std::iter::once("givc-cli").chain(args.iter().copied())).unwrap_err()
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
#[serial]
fn connection_defaults() {
    for var in ["NAME", "ADDR", "PORT", "CA_CERT", "HOST_CERT", "HOST_KEY"] {
        std::env::remove_var(var);
    }
    let cli = parse(&["query-list"]);
    let transport = cli.connect.transport();
    assert_eq!(transport.name, "admin-vm");
    assert_eq!(transport.address, "127.0.0.1");
    assert_eq!(transport.port, "9000");
    assert_eq!(transport.protocol, Protocol::Tcp);
    assert!(!cli.json);
}

#[test]
fn ip_is_an_alias_for_host() {
    let cli = parse(&["--ip", "192.168.100.3", "--port", "9001", "reboot"]);
    assert_eq!(cli.connect.host, "192.168.100.3");
    assert_eq!(cli.connect.port, "9001");
}

#[test]
fn unix_socket_transport() {
    let cli = parse(&["--protocol", "unix", "--host", "/run/givc/admin.sock", "--notls", "query-list"]);
    let transport = cli.connect.transport();
    assert_eq!(transport.protocol, Protocol::Unix);
    assert_eq!(transport.address, "/run/givc/admin.sock");
    assert!(cli.connect.tls().unwrap().is_none());
}

#[test]
fn unknown_protocol_is_rejected() {
    assert_eq!(parse_err(&["--protocol", "udp", "poweroff"]).kind(), clap::error::ErrorKind::ValueValidation);
}

#[test]
fn tls_needs_all_three_files() {
    let cli = parse(&["--ca", "/etc/givc/ca.pem", "poweroff"]);
    let err = cli.connect.tls().unwrap_err();
    assert!(err.to_string().contains("--notls"), "{}", err);
}

#[test]
fn json_flag_is_global() {
    let cli = parse(&["query-list", "--json"]);
    assert_eq!(cli.format(), OutputFormat::Json);
}

#[test]
fn start_app_collects_trailing_args() {
    let cli = parse(&["start", "app", "chrome", "--vm", "chrome-vm", "--", "--incognito", "https://ghaf.dev"]);
    match cli.command {
        Command::Start { target: StartTarget::App { app, vm, args } } => {
            assert_eq!(app, "chrome");
            assert_eq!(vm.as_deref(), Some("chrome-vm"));
            assert_eq!(args, ["--incognito", "https://ghaf.dev"]);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn start_service_requires_vm() {
    assert_eq!(
        parse_err(&["start", "service", "audio.service"]).kind(),
        clap::error::ErrorKind::MissingRequiredArgument
    );
    let cli = parse(&["start", "service", "audio.service", "--vm", "audio-vm"]);
    assert!(matches!(cli.command, Command::Start { target: StartTarget::Service { .. } }));
}

#[parameterized(
    stop = { "stop" },
    pause = { "pause" },
    resume = { "resume" },
)]
fn app_controls_take_a_name(verb: &str) {
    let cli = parse(&[verb, "chrome@1.service"]);
    let args = match cli.command {
        Command::Stop(a) | Command::Pause(a) | Command::Resume(a) => a,
        other => panic!("unexpected command: {:?}", other),
    };
    assert_eq!(args.app, "chrome@1.service");
    assert_eq!(args.vm, None);
}

#[test]
fn unknown_word_starts_that_application() {
    let cli = parse(&["firefox", "--private-window"]);
    match cli.command {
        Command::App(words) => assert_eq!(words, ["firefox", "--private-window"]),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn set_locale_parses_assignments() {
    let cli = parse(&["set-locale", "LANG=en_US.UTF-8", "LC_TIME=fi_FI.UTF-8"]);
    match cli.command {
        Command::SetLocale { assignments } => {
            assert_eq!(assignments.len(), 2);
            assert_eq!(assignments[1].key, LocaleKey::LcTime);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[parameterized(
    no_assignments = { &["set-locale"] },
    bad_key = { &["set-locale", "LC_FOO=C"] },
)]
fn set_locale_rejects(args: &[&str]) {
    let _ = parse_err(args);
}

#[test]
fn watch_and_ensure_options() {
    let cli = parse(&["watch", "--initial", "--limit", "3"]);
    assert!(matches!(cli.command, Command::Watch { initial: true, limit: Some(3) }));

    let cli = parse(&["test", "ensure", "givc-net-vm.service", "--retry", "10"]);
    match cli.command {
        Command::Test { check: TestCommand::Ensure { service, retry } } => {
            assert_eq!(service, "givc-net-vm.service");
            assert_eq!(retry, 10);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}
