//! Lifecycle of the single bound reader

use serde::Serialize;

use crate::config::BridgeConfig;
use crate::uid::CardUid;

/// Where the bound reader is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReaderState {
    /// No reader is bound
    #[default]
    Absent,
    /// A reader is bound and its field is empty
    Ready,
    /// A reader is bound and a card is on it
    CardPresent,
}

/// Result of a reader attaching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The reader is now the active session
    Accepted,
    /// The reader name is not on the allow-list
    NotAllowed,
    /// Another reader is already bound
    Busy {
        /// Name of the reader that keeps the session
        active: String,
    },
}

/// Result of a card detection report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectOutcome {
    /// A card arrived on an empty field; waiters should see it
    Arrived(CardUid),
    /// The card was already present; the identifier was refreshed
    Repeated,
    /// The driver saw a card but has no identifier for it yet
    NeedsIdentifier,
    /// The report does not concern the bound reader, or none is bound
    Ignored,
}

/// The single physical reader currently bound
///
/// At most one session exists: a second reader never replaces the first.
#[derive(Debug, Default)]
pub struct ReaderSession {
    reader: Option<String>,
    state: ReaderState,
    last_uid: Option<CardUid>,
}

impl ReaderSession {
    /// Create an unbound session
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub const fn state(&self) -> ReaderState {
        self.state
    }

    /// Name of the bound reader
    pub fn reader(&self) -> Option<&str> {
        self.reader.as_deref()
    }

    /// Last identifier seen on the bound reader
    pub const fn last_uid(&self) -> Option<&CardUid> {
        self.last_uid.as_ref()
    }

    /// Whether a reader is bound
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ReaderState::Ready | ReaderState::CardPresent)
    }

    /// Whether a card is on the bound reader
    pub const fn card_present(&self) -> bool {
        matches!(self.state, ReaderState::CardPresent)
    }

    /// Identifier of the card currently on the reader, if any
    pub const fn present_uid(&self) -> Option<&CardUid> {
        match self.state {
            ReaderState::CardPresent => self.last_uid.as_ref(),
            _ => None,
        }
    }

    /// Whether `reader` is the bound reader
    pub fn is_active(&self, reader: &str) -> bool {
        self.reader.as_deref() == Some(reader)
    }

    /// A reader attached
    pub fn connect(&mut self, reader: &str, config: &BridgeConfig) -> ConnectOutcome {
        if !config.accepts_reader(reader) {
            return ConnectOutcome::NotAllowed;
        }
        if let Some(active) = &self.reader {
            return ConnectOutcome::Busy {
                active: active.clone(),
            };
        }

        self.reader = Some(reader.to_string());
        self.state = ReaderState::Ready;
        self.last_uid = None;
        ConnectOutcome::Accepted
    }

    /// A card was detected, with or without an identifier
    pub fn card_detected(&mut self, reader: &str, uid: Option<CardUid>) -> DetectOutcome {
        if !self.is_active(reader) || !self.is_ready() {
            return DetectOutcome::Ignored;
        }
        let Some(uid) = uid else {
            return DetectOutcome::NeedsIdentifier;
        };

        let arrived = self.state == ReaderState::Ready;
        self.state = ReaderState::CardPresent;
        self.last_uid = Some(uid.clone());

        if arrived {
            DetectOutcome::Arrived(uid)
        } else {
            DetectOutcome::Repeated
        }
    }

    /// The card left the field; returns whether the state changed
    ///
    /// The last identifier stays readable until the session ends.
    pub fn card_removed(&mut self, reader: &str) -> bool {
        if !self.is_active(reader) || self.state != ReaderState::CardPresent {
            return false;
        }
        self.state = ReaderState::Ready;
        true
    }

    /// A reader detached; returns whether it was the bound one
    pub fn disconnect(&mut self, reader: &str) -> bool {
        if !self.is_active(reader) {
            return false;
        }
        *self = Self::default();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACR: &str = "ACS ACR122U PICC Interface";

    fn uid(s: &str) -> CardUid {
        s.parse().unwrap()
    }

    fn bound() -> ReaderSession {
        let mut session = ReaderSession::new();
        assert_eq!(
            session.connect(ACR, &BridgeConfig::default()),
            ConnectOutcome::Accepted
        );
        session
    }

    #[test]
    fn test_connect_binds_matching_reader() {
        let session = bound();
        assert_eq!(session.state(), ReaderState::Ready);
        assert_eq!(session.reader(), Some(ACR));
        assert!(session.is_ready());
        assert!(!session.card_present());
    }

    #[test]
    fn test_connect_rejects_unlisted_reader() {
        let mut session = ReaderSession::new();
        let outcome = session.connect("Some Other Reader", &BridgeConfig::default());
        assert_eq!(outcome, ConnectOutcome::NotAllowed);
        assert_eq!(session.state(), ReaderState::Absent);
    }

    #[test]
    fn test_second_reader_does_not_replace_first() {
        let mut session = bound();
        session.card_detected(ACR, Some(uid("04A1B2C3")));

        let outcome = session.connect("ACS ACR122U PICC Interface 01", &BridgeConfig::default());
        assert_eq!(
            outcome,
            ConnectOutcome::Busy {
                active: ACR.to_string()
            }
        );
        assert_eq!(session.reader(), Some(ACR));
        assert_eq!(session.state(), ReaderState::CardPresent);
        assert_eq!(session.last_uid(), Some(&uid("04A1B2C3")));
    }

    #[test]
    fn test_detection_without_uid_keeps_state() {
        let mut session = bound();
        assert_eq!(
            session.card_detected(ACR, None),
            DetectOutcome::NeedsIdentifier
        );
        assert_eq!(session.state(), ReaderState::Ready);
        assert_eq!(session.last_uid(), None);
    }

    #[test]
    fn test_only_first_detection_arrives() {
        let mut session = bound();
        assert_eq!(
            session.card_detected(ACR, Some(uid("04A1B2C3"))),
            DetectOutcome::Arrived(uid("04A1B2C3"))
        );
        assert_eq!(
            session.card_detected(ACR, Some(uid("04A1B2C3"))),
            DetectOutcome::Repeated
        );
        assert_eq!(session.present_uid(), Some(&uid("04A1B2C3")));
    }

    #[test]
    fn test_removal_keeps_last_uid() {
        let mut session = bound();
        session.card_detected(ACR, Some(uid("04A1B2C3")));
        assert!(session.card_removed(ACR));
        assert_eq!(session.state(), ReaderState::Ready);
        assert_eq!(session.last_uid(), Some(&uid("04A1B2C3")));
        assert_eq!(session.present_uid(), None);
        assert!(!session.card_removed(ACR));

        // next tap is a new arrival
        assert_eq!(
            session.card_detected(ACR, Some(uid("04DEADBE"))),
            DetectOutcome::Arrived(uid("04DEADBE"))
        );
    }

    #[test]
    fn test_events_from_other_readers_are_ignored() {
        let mut session = bound();
        assert_eq!(
            session.card_detected("ACS ACR122U 01", Some(uid("04A1B2C3"))),
            DetectOutcome::Ignored
        );
        assert!(!session.disconnect("ACS ACR122U 01"));
        assert_eq!(session.state(), ReaderState::Ready);

        let mut unbound = ReaderSession::new();
        assert_eq!(
            unbound.card_detected(ACR, Some(uid("04A1B2C3"))),
            DetectOutcome::Ignored
        );
    }

    #[test]
    fn test_disconnect_clears_session() {
        let mut session = bound();
        session.card_detected(ACR, Some(uid("04A1B2C3")));
        assert!(session.disconnect(ACR));
        assert_eq!(session.state(), ReaderState::Absent);
        assert_eq!(session.reader(), None);
        assert_eq!(session.last_uid(), None);

        // a new reader may bind afterwards
        assert_eq!(
            session.connect("ACS ACR122U 01", &BridgeConfig::default()),
            ConnectOutcome::Accepted
        );
    }
}
