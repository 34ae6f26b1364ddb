//! PC/SC reader driver for the NFC bridge
//!
//! This crate watches the PC/SC service for readers and cards and turns what it
//! sees into [`DeviceEvent`]s for [`nfc_bridge_core::Bridge`]. It also answers
//! the bridge's [`DeviceControl`] requests: releasing readers the bridge will
//! not bind and reading the UID of cards that were detected without one.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nfc_bridge_pcsc::{PcscConfig, PcscDeviceManager, device_event_channel};
//!
//! let manager = PcscDeviceManager::new()?;
//! let (sender, receiver) = device_event_channel();
//! let handle = manager.monitor(PcscConfig::default()).spawn(sender)?;
//!
//! for event in receiver.iter().take(3) {
//!     println!("{event:?}");
//! }
//! handle.stop();
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

// Core modules
mod card;
mod config;
mod error;
mod event;
mod manager;
mod monitor;
mod reader;
mod uid;

// Public exports
pub use config::PcscConfig;
pub use error::PcscError;
pub use event::{DeviceEventReceiver, DeviceEventSender, device_event_channel};
pub use manager::PcscDeviceManager;
pub use monitor::{MonitorHandle, PcscMonitor};
pub use reader::PcscReader;
pub use uid::{GetUid, TagKind, parse_uid_response};

pub use nfc_bridge_core::{DeviceControl, DeviceEvent};

// Re-export some pcsc types for convenience
pub use pcsc::{Protocols, ShareMode};
