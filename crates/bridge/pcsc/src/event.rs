//! Channels carrying driver events and bridge commands

use crossbeam_channel::{Receiver, Sender, unbounded};
use nfc_bridge_core::DeviceEvent;

/// Sender for device events
pub type DeviceEventSender = Sender<DeviceEvent>;
/// Receiver for device events
pub type DeviceEventReceiver = Receiver<DeviceEvent>;

/// Create an unbounded channel for device events
pub fn device_event_channel() -> (DeviceEventSender, DeviceEventReceiver) {
    unbounded()
}

/// Requests from the bridge to the monitor thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ControlCommand {
    /// Stop reporting this reader until it is unplugged
    Release(String),
    /// Read the UID of the card on this reader
    RequestIdentifier(String),
}

pub(crate) type ControlSender = Sender<ControlCommand>;
pub(crate) type ControlReceiver = Receiver<ControlCommand>;

pub(crate) fn control_channel() -> (ControlSender, ControlReceiver) {
    unbounded()
}
