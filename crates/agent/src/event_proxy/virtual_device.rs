// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kernel virtual devices through uinput.

use evdev::uinput::{VirtualDevice as UinputDevice, VirtualDeviceBuilder};
use evdev::{
    AbsInfo, AbsoluteAxisType, AttributeSet, BusType, EventType, InputEvent, InputId, Key, RelativeAxisType,
    UinputAbsSetup,
};
use tracing::info;

use super::{DeviceClass, DeviceIdentity, EventProxyError, RawEvent, VirtualDevice, VirtualDeviceFactory};

/// Name of the virtual gamepad; vendor and product are the canonical Xbox 360 pad.
pub const GAMEPAD_NAME: &str = "Microsoft X-Box 360 pad";
const GAMEPAD_VENDOR: u16 = 0x045e;
const GAMEPAD_PRODUCT: u16 = 0x028e;
const GAMEPAD_VERSION: u16 = 0x0110;

/// Carries the loop-guard name so local producers skip it.
pub const MOUSE_NAME: &str = "givc vmmouse";

const GAMEPAD_BUTTONS: [Key; 11] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_NORTH,
    Key::BTN_WEST,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_SELECT,
    Key::BTN_START,
    Key::BTN_MODE,
    Key::BTN_THUMBL,
    Key::BTN_THUMBR,
];

const MOUSE_BUTTONS: [Key; 5] = [Key::BTN_LEFT, Key::BTN_RIGHT, Key::BTN_MIDDLE, Key::BTN_SIDE, Key::BTN_EXTRA];

const MOUSE_AXES: [RelativeAxisType; 4] = [
    RelativeAxisType::REL_X,
    RelativeAxisType::REL_Y,
    RelativeAxisType::REL_WHEEL,
    RelativeAxisType::REL_HWHEEL,
];

/// Creates devices through `/dev/uinput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UinputFactory;

fn uinput_err(e: std::io::Error) -> EventProxyError {
    EventProxyError::Virtual(format!("uinput: {}", e))
}

fn stick(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, -32768, 32767, 16, 128, 0))
}

fn trigger(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, 0, 255, 0, 0, 0))
}

fn hat(axis: AbsoluteAxisType) -> UinputAbsSetup {
    UinputAbsSetup::new(axis, AbsInfo::new(0, -1, 1, 0, 0, 0))
}

fn build_gamepad() -> std::io::Result<UinputDevice> {
    let buttons: AttributeSet<Key> = GAMEPAD_BUTTONS.iter().copied().collect();
    let mut builder = VirtualDeviceBuilder::new()?
        .name(GAMEPAD_NAME)
        .input_id(InputId::new(BusType::BUS_USB, GAMEPAD_VENDOR, GAMEPAD_PRODUCT, GAMEPAD_VERSION))
        .with_keys(&buttons)?;
    for setup in [
        stick(AbsoluteAxisType::ABS_X),
        stick(AbsoluteAxisType::ABS_Y),
        stick(AbsoluteAxisType::ABS_RX),
        stick(AbsoluteAxisType::ABS_RY),
        trigger(AbsoluteAxisType::ABS_Z),
        trigger(AbsoluteAxisType::ABS_RZ),
        hat(AbsoluteAxisType::ABS_HAT0X),
        hat(AbsoluteAxisType::ABS_HAT0Y),
    ] {
        builder = builder.with_absolute_axis(&setup)?;
    }
    builder.build()
}

fn build_mouse(identity: &DeviceIdentity) -> std::io::Result<UinputDevice> {
    let buttons: AttributeSet<Key> = MOUSE_BUTTONS.iter().copied().collect();
    let axes: AttributeSet<RelativeAxisType> = MOUSE_AXES.iter().copied().collect();
    VirtualDeviceBuilder::new()?
        .name(MOUSE_NAME)
        .input_id(InputId::new(BusType::BUS_VIRTUAL, identity.vendor_id, identity.product_id, 1))
        .with_keys(&buttons)?
        .with_relative_axes(&axes)?
        .build()
}

impl VirtualDeviceFactory for UinputFactory {
    fn create(&self, class: DeviceClass, identity: &DeviceIdentity) -> Result<Box<dyn VirtualDevice>, EventProxyError> {
        let device = match class {
            DeviceClass::Gamepad => build_gamepad(),
            DeviceClass::Mouse => build_mouse(identity),
        }
        .map_err(uinput_err)?;
        info!(
            ?class,
            source = %identity.name,
            vendor = format_args!("{:#06x}", identity.vendor_id),
            product = format_args!("{:#06x}", identity.product_id),
            "virtual device registered"
        );
        Ok(Box::new(Uinput { device }))
    }
}

struct Uinput {
    device: UinputDevice,
}

impl VirtualDevice for Uinput {
    fn emit(&mut self, events: &[RawEvent]) -> Result<(), EventProxyError> {
        let events: Vec<InputEvent> =
            events.iter().map(|ev| InputEvent::new(EventType(ev.event_type), ev.code, ev.value)).collect();
        self.device.emit(&events).map_err(uinput_err)
    }
}
