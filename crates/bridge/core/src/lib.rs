//! Reader coordination engine for the NFC bridge
//!
//! This crate owns the state that sits between a PC/SC card reader and the
//! HTTP callers waiting for a card tap:
//!
//! - a [`ReaderSession`] state machine that binds at most one reader and
//!   tracks whether a card is on it,
//! - a [`WaiterRegistry`] of pending "wait for card" requests, drained in one
//!   step when a card arrives or the reader goes away,
//! - the bridge enable flag gating delivery.
//!
//! All three live behind a single lock inside [`Bridge`], which is the only
//! way to mutate them. Raw reader activity enters through
//! [`Bridge::handle_event`]; callers wait with [`Bridge::wait_for_card`].
//!
//! # Examples
//!
//! ```no_run
//! # async fn run(device: std::sync::Arc<dyn nfc_bridge_core::DeviceControl>) {
//! use nfc_bridge_core::{Bridge, BridgeConfig, DeviceEvent};
//!
//! let bridge = Bridge::new(BridgeConfig::default(), device);
//! bridge.handle_event(DeviceEvent::ReaderConnected("ACS ACR122U PICC Interface".into()));
//!
//! match bridge.wait_for_card().await {
//!     Ok(uid) => println!("card {uid}"),
//!     Err(e) => println!("no card: {e}"),
//! }
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod bridge;
mod config;
mod error;
mod event;
mod session;
mod status;
mod uid;
mod waiters;

pub use bridge::Bridge;
pub use config::{BridgeConfig, DEFAULT_READER_FILTER, DEFAULT_WAIT_TIMEOUT};
pub use error::{UidParseError, WaitError};
pub use event::{DeviceControl, DeviceEvent};
pub use session::{ConnectOutcome, DetectOutcome, ReaderSession, ReaderState};
pub use status::BridgeStatus;
pub use uid::CardUid;
pub use waiters::{WaitOutcome, WaiterId, WaiterRegistry};
