//! Reading the card UID through the PC/SC `GET DATA` pseudo-APDU

use bytes::{BufMut, Bytes, BytesMut};
use nfc_bridge_core::CardUid;

use crate::error::PcscError;

/// Status word for a successful command
const SW_SUCCESS: (u8, u8) = (0x90, 0x00);

/// `GET DATA` command asking the reader for the UID of the card in its field
///
/// Class `FF` is reserved for the reader itself (PC/SC part 3), so this works
/// for any contactless tag regardless of the applet running on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetUid;

impl GetUid {
    const CLA: u8 = 0xFF;
    const INS: u8 = 0xCA;
    const P1_UID: u8 = 0x00;
    const P2: u8 = 0x00;
    /// Le of zero: return the whole UID whatever its length
    const LE: u8 = 0x00;

    /// Raw APDU bytes
    pub fn to_bytes(self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(5);
        buffer.put_u8(Self::CLA);
        buffer.put_u8(Self::INS);
        buffer.put_u8(Self::P1_UID);
        buffer.put_u8(Self::P2);
        buffer.put_u8(Self::LE);
        buffer.freeze()
    }
}

/// Extract the UID from a `GET DATA` response (`UID || SW1 SW2`)
pub fn parse_uid_response(response: &[u8]) -> Result<CardUid, PcscError> {
    let Some((payload, status)) = response.split_last_chunk::<2>() else {
        return Err(PcscError::InvalidResponse);
    };
    let [sw1, sw2] = *status;
    if (sw1, sw2) != SW_SUCCESS {
        return Err(PcscError::Status { sw1, sw2 });
    }
    CardUid::from_bytes(payload).map_err(|_| PcscError::InvalidResponse)
}

/// How a contactless tag presents itself to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// ISO 14443-3 storage card (MIFARE Classic, Ultralight, NTAG...)
    Storage,
    /// ISO 14443-4 card with its own application layer (Type 4 tags)
    Iso14443_4,
}

impl TagKind {
    /// Classify a tag from the ATR the reader synthesizes for it
    ///
    /// Storage cards get a PC/SC part 3 ATR whose historical bytes start with
    /// the application identifier presence indicator `4F` at offset 5.
    pub fn from_atr(atr: &[u8]) -> Self {
        match atr.get(5) {
            Some(0x4F) => Self::Storage,
            _ => Self::Iso14443_4,
        }
    }

    /// Whether the UID can be read as soon as the card is detected
    pub const fn has_immediate_uid(self) -> bool {
        matches!(self, Self::Storage)
    }
}
