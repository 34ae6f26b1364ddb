//! Snapshot of one PC/SC reader

use pcsc::{ReaderState, State};

use crate::uid::TagKind;

/// A reader and the card in its field, as seen at one moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcscReader {
    name: String,
    /// ATR of the card in the field; `None` when the field is empty
    atr: Option<Vec<u8>>,
}

impl PcscReader {
    /// Reader with nothing in its field
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atr: None,
        }
    }

    /// Reader holding a card that answered with `atr`
    pub fn with_card(name: impl Into<String>, atr: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            atr: Some(atr.into()),
        }
    }

    pub(crate) fn from_reader_state(state: &ReaderState) -> Self {
        let name = state.name().to_string_lossy();
        if card_in_field(state.event_state()) {
            Self::with_card(name, state.atr())
        } else {
            Self::empty(name)
        }
    }

    /// Reader name as reported by the PC/SC service
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a card is in the field
    pub const fn has_card(&self) -> bool {
        self.atr.is_some()
    }

    /// ATR of the card in the field
    pub fn atr(&self) -> Option<&[u8]> {
        self.atr.as_deref()
    }

    /// Kind of tag in the field
    pub fn tag_kind(&self) -> Option<TagKind> {
        self.atr().map(TagKind::from_atr)
    }
}

/// PRESENT alone is not enough: a mute card cannot be talked to
pub(crate) fn card_in_field(state: State) -> bool {
    state.contains(State::PRESENT) && !state.intersects(State::EMPTY | State::MUTE)
}
