// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin and agent together: registration, queries, application launch.

use crate::prelude::*;

#[tokio::test]
async fn agent_registers_itself_and_its_services() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Admin::start(dir.path()).await;
    let config = unix_agent_config(dir.path(), "chrome-vm", json!({ "services": ["a.service"] }));
    let init = FakeInit::with_units(&["givc-chrome-vm.service", "a.service"]);
    let agent = Agent::start_registered(config, FakeBackends::new(init)).await;

    wait_for("agent registration", || {
        admin.is_registered("givc-chrome-vm.service") && admin.is_registered("a.service")
    })
    .await;

    let client = admin.client();
    let names: Vec<String> = client.query_list().await.unwrap().into_iter().map(|item| item.name).collect();
    assert!(names.contains(&"givc-chrome-vm.service".to_string()), "{:?}", names);

    let status = client.get_unit_status("chrome-vm", "a.service").await.unwrap();
    assert!(status.is_running());

    agent.stop().await;
}

#[tokio::test]
async fn admin_refuses_units_outside_the_whitelist() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Admin::start(dir.path()).await;
    let config = unix_agent_config(dir.path(), "net-vm", json!({ "services": ["a.service"] }));
    let init = FakeInit::with_units(&["givc-net-vm.service", "a.service", "sshd.service"]);
    let agent = Agent::start_registered(config, FakeBackends::new(init)).await;
    wait_for("agent registration", || admin.is_registered("givc-net-vm.service")).await;

    let err = admin.client().get_unit_status("net-vm", "sshd.service").await.unwrap_err();
    assert_eq!(err.code(), tonic::Code::PermissionDenied);

    agent.stop().await;
}

/// Launching an application a second time while the first instance runs
/// merges into the first instance.
#[tokio::test]
async fn second_launch_merges_into_running_instance() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Admin::start(dir.path()).await;
    let config = unix_agent_config(
        dir.path(),
        "browser-vm",
        json!({ "applications": [{ "name": "browser", "command": "/bin/browser", "args": ["url"] }] }),
    );
    let init = FakeInit::with_units(&["givc-browser-vm.service"]);
    init.set_merging(true);
    let agent = Agent::start_registered(config, FakeBackends::new(init)).await;
    wait_for("agent registration", || admin.is_registered("givc-browser-vm.service")).await;

    let client = admin.client();
    let args = vec!["https://x".to_string()];
    let first = client.start_application("browser", None, &args).await.unwrap();
    assert_eq!(first.cmd_status, CMD_SUCCESS);
    assert_eq!(first.app_status, "browser@1.service");

    let second = client.start_application("browser", None, &args).await.unwrap();
    assert_eq!(second.app_status, "browser@1.service");

    let calls = agent.fakes.init.calls();
    assert!(calls.iter().any(|c| c.starts_with("transient browser@2.service /bin/browser https://x")), "{:?}", calls);
    let entry = admin.orchestrator.registry().get_by_name("browser@1.service").unwrap();
    assert_eq!(entry.parent, "givc-browser-vm.service");
    assert!(!admin.is_registered("browser@2.service"));

    agent.stop().await;
}

#[tokio::test]
async fn rejected_arguments_never_reach_the_init_system() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Admin::start(dir.path()).await;
    let config = unix_agent_config(
        dir.path(),
        "browser-vm",
        json!({ "applications": [{ "name": "browser", "command": "/bin/browser", "args": ["url"] }] }),
    );
    let agent = Agent::start_registered(config, FakeBackends::new(FakeInit::with_units(&["givc-browser-vm.service"])))
        .await;
    wait_for("agent registration", || admin.is_registered("givc-browser-vm.service")).await;

    let args = vec!["https://x;rm -rf /".to_string()];
    let resp = admin.client().start_application("browser", None, &args).await.unwrap();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(!agent.fakes.init.calls().iter().any(|c| c.starts_with("transient")));

    agent.stop().await;
}

/// An application that dies right after starting is launched once and its
/// error reaches the caller.
#[tokio::test]
async fn crashing_application_is_launched_once() {
    let dir = tempfile::tempdir().unwrap();
    let admin = Admin::start(dir.path()).await;
    let config = unix_agent_config(
        dir.path(),
        "browser-vm",
        json!({ "applications": [{ "name": "browser", "command": "/bin/browser", "args": ["url"] }] }),
    );
    let init = FakeInit::with_units(&["givc-browser-vm.service"]);
    init.set_crashing(true);
    let agent = Agent::start_registered(config, FakeBackends::new(init)).await;
    wait_for("agent registration", || admin.is_registered("givc-browser-vm.service")).await;

    let args = vec!["https://x".to_string()];
    let resp = admin.client().start_application("browser", None, &args).await.unwrap();
    assert_eq!(resp.cmd_status, CMD_FAILURE);
    assert!(resp.app_status.contains("browser@1.service failed after start"), "{}", resp.app_status);

    let launches = agent.fakes.init.calls().into_iter().filter(|c| c.starts_with("transient")).count();
    assert_eq!(launches, 1);
    assert!(!admin.is_registered("browser@1.service"));

    agent.stop().await;
}
