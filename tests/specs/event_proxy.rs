// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input devices forwarded from a producer agent to a consumer agent.

use crate::prelude::*;
use givc_agent::event_proxy::{DeviceClass, RawEvent};
use givc_agent::test_support::FakeSource;

const BTN_SOUTH: u16 = 304;

fn key(value: i32) -> RawEvent {
    RawEvent { timestamp_ns: 0, event_type: 1, code: BTN_SOUTH, value }
}

fn summary(events: &[RawEvent]) -> Vec<(u16, u16, i32)> {
    events.iter().map(|e| (e.event_type, e.code, e.value)).collect()
}

struct Pair {
    producer: Agent,
    consumer: Agent,
    _dir: tempfile::TempDir,
}

/// Consumer `gui-vm` listens on `input.sock`; producer `net-vm` forwards
/// devices whose name contains "controller". `sources` are what the
/// producer's device finder hands out, in order.
async fn pair(sources: Vec<FakeSource>) -> Pair {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.sock").display().to_string();
    let transport = json!({ "name": "gui-vm", "addr": input, "protocol": "unix" });

    let consumer_config = unix_agent_config(
        dir.path(),
        "gui-vm",
        json!({ "eventProxy": { "events": [{ "transport": transport, "producer": false }] } }),
    );
    let consumer = Agent::start(consumer_config, FakeBackends::new(FakeInit::default())).await;

    let producer_config = unix_agent_config(
        dir.path(),
        "net-vm",
        json!({ "eventProxy": { "events": [{ "transport": transport, "producer": true, "device": "controller" }] } }),
    );
    let fakes = FakeBackends::new(FakeInit::default());
    for source in sources {
        fakes.devices.push(source);
    }
    let producer = Agent::start(producer_config, fakes).await;

    Pair { producer, consumer, _dir: dir }
}

#[tokio::test]
async fn controller_becomes_a_virtual_gamepad() {
    let source = FakeSource::new("Logitech Wireless Controller", 0x046d, 0xc21f).with_batch(vec![key(1), key(0)]);
    let pair = pair(vec![source]).await;
    let devices = pair.consumer.fakes.virtual_devices.clone();

    wait_for("forwarded events", || devices.emitted().len() == 2).await;
    let created = devices.created();
    assert_eq!(created.len(), 1);
    let (class, identity) = &created[0];
    assert_eq!(*class, DeviceClass::Gamepad);
    assert_eq!((identity.vendor_id, identity.product_id), (0x046d, 0xc21f));
    assert_eq!(identity.name, "Logitech Wireless Controller");
    assert_eq!(summary(&devices.emitted()), [(1, BTN_SOUTH, 1), (1, BTN_SOUTH, 0)]);

    pair.producer.stop().await;
    pair.consumer.stop().await;
}

#[tokio::test]
async fn unplugged_device_is_picked_up_again() {
    let first = FakeSource::new("Wireless Controller", 0x054c, 0x09cc).with_batch(vec![key(1)]).then_disconnect();
    let second = FakeSource::new("Wireless Controller", 0x054c, 0x09cc).with_batch(vec![key(0)]);
    let pair = pair(vec![first, second]).await;
    let devices = pair.consumer.fakes.virtual_devices.clone();

    wait_for("events from both connections", || devices.emitted().len() == 2).await;
    assert_eq!(summary(&devices.emitted()), [(1, BTN_SOUTH, 1), (1, BTN_SOUTH, 0)]);
    assert_eq!(devices.created().len(), 2);
    assert!(pair.producer.fakes.devices.finds() >= 2);

    // The disconnect stayed inside the proxy: both agents stop cleanly.
    pair.producer.stop().await;
    pair.consumer.stop().await;
}
