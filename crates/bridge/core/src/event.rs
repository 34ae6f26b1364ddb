//! Events consumed from, and commands issued to, the reader driver

use std::fmt;

use crate::uid::CardUid;

/// Raw activity reported by the reader driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A reader was attached to the system
    ReaderConnected(String),

    /// A reader was detached from the system
    ReaderDisconnected(String),

    /// A card was detected on a reader
    CardDetected {
        /// Reader name
        reader: String,
        /// Card identifier, if the driver could already read it
        uid: Option<CardUid>,
    },

    /// The card left the reader field
    CardRemoved {
        /// Reader name
        reader: String,
    },

    /// The driver hit a non-fatal error
    DriverError {
        /// Reader name
        reader: String,
        /// Driver message
        message: String,
    },
}

/// Operations the bridge asks of the reader driver
///
/// Implementations must not block: the bridge calls them from the thread that
/// delivers [`DeviceEvent`]s.
pub trait DeviceControl: Send + Sync + fmt::Debug {
    /// Stop tracking a reader the bridge refused to bind
    fn release(&self, reader: &str);

    /// Read the identifier of the card on `reader` and report it with a new
    /// [`DeviceEvent::CardDetected`]
    fn request_identifier(&self, reader: &str);
}
