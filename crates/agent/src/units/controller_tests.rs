// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::init::fake::FakeInit;
use tonic::{Code, Status};
use yare::parameterized;

const AGENT: &str = "givc-chrome-vm.service";

fn controller() -> (UnitController, Arc<FakeInit>) {
    let init = Arc::new(FakeInit::with_units(&[AGENT, "chrome@1.service", "sshd.service"]));
    init.add_unit("poweroff.target", false);
    let whitelist = Whitelist::new([AGENT, "chrome", "poweroff.target"]);
    (UnitController::new(init.clone(), whitelist), init)
}

#[parameterized(
    empty = { "", Code::InvalidArgument },
    unlisted = { "sshd.service", Code::PermissionDenied },
    unknown_instance = { "chrome@7.service", Code::NotFound },
)]
#[test_macro(tokio::test)]
async fn status_rejections(name: &str, code: Code) {
    let (ctl, _) = controller();
    let err = ctl.get_unit_status(name).await.unwrap_err();
    assert_eq!(Status::from(err).code(), code);
}

#[tokio::test]
async fn status_includes_freezer_state() {
    let (ctl, _) = controller();
    let status = ctl.get_unit_status(AGENT).await.unwrap();
    assert_eq!(status.name, AGENT);
    assert!(status.is_running());
    assert_eq!(status.freezer_state, "running");
}

#[tokio::test]
async fn unreadable_freezer_state_reports_error() {
    let (ctl, init) = controller();
    init.set_no_freezer(true);
    let status = ctl.get_unit_status(AGENT).await.unwrap();
    assert_eq!(status.freezer_state, FREEZER_UNKNOWN);
}

#[tokio::test]
async fn start_restarts_unit() {
    let (ctl, init) = controller();
    ctl.start_unit("poweroff.target").await.unwrap();
    assert!(init.calls().contains(&"restart poweroff.target".to_string()));
    assert!(init.unit("poweroff.target").unwrap().is_active());
}

#[tokio::test]
async fn job_result_other_than_done_is_an_error() {
    let (ctl, init) = controller();
    init.set_job_result("chrome@1.service", "canceled");
    let err = ctl.stop_unit("chrome@1.service").await.unwrap_err();
    assert!(matches!(&err, UnitError::Job { result, .. } if result == "canceled"));
    assert_eq!(Status::from(err).code(), Code::Unknown);
}

#[tokio::test]
async fn stop_deactivates_instance() {
    let (ctl, init) = controller();
    ctl.stop_unit("chrome@1.service").await.unwrap();
    assert!(init.unit("chrome@1.service").unwrap().is_inactive());
}

#[tokio::test]
async fn kill_sends_sigkill() {
    let (ctl, init) = controller();
    ctl.kill_unit("chrome@1.service").await.unwrap();
    assert!(init.calls().contains(&format!("kill chrome@1.service {}", Signal::SIGKILL as i32)));
}

#[tokio::test]
async fn freeze_and_thaw() {
    let (ctl, init) = controller();
    ctl.freeze_unit("chrome@1.service").await.unwrap();
    assert!(ctl.get_unit_status("chrome@1.service").await.unwrap().is_paused());

    ctl.unfreeze_unit("chrome@1.service").await.unwrap();
    assert!(!ctl.get_unit_status("chrome@1.service").await.unwrap().is_paused());
    assert_eq!(
        init.calls().iter().filter(|c| c.starts_with("freeze") || c.starts_with("thaw")).count(),
        2
    );
}

#[tokio::test]
async fn rejected_names_never_reach_the_init_system() {
    let (ctl, init) = controller();
    assert!(ctl.stop_unit("sshd.service").await.is_err());
    assert!(ctl.kill_unit("sshd.service").await.is_err());
    assert!(init.calls().is_empty());
}

#[tokio::test]
async fn main_pid_requires_active_unit() {
    let (ctl, _) = controller();
    assert!(ctl.main_pid("chrome@1.service").await.unwrap() > 0);

    let err = ctl.main_pid("poweroff.target").await.unwrap_err();
    assert!(matches!(err, UnitError::NotActive { .. }));
}
