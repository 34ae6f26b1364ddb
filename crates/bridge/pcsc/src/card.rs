//! Short-lived card connections used to read the UID

use std::ffi::CString;

use nfc_bridge_core::CardUid;
use pcsc::{Card, Context, Disposition};
use tracing::trace;

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::uid::{GetUid, parse_uid_response};

/// Connection to the card on one reader, closed on drop
struct CardConnection {
    card: Option<Card>,
    reader_name: String,
}

impl CardConnection {
    fn open(context: &Context, reader_name: &str, config: &PcscConfig) -> Result<Self, PcscError> {
        let reader_cstr = CString::new(reader_name)
            .map_err(|_| PcscError::ReaderNotFound(reader_name.to_string()))?;

        match context.connect(&reader_cstr, config.share_mode, config.protocols) {
            Ok(card) => Ok(Self {
                card: Some(card),
                reader_name: reader_name.to_string(),
            }),
            Err(pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard) => {
                Err(PcscError::NoCard(reader_name.to_string()))
            }
            Err(pcsc::Error::UnknownReader) => {
                Err(PcscError::ReaderNotFound(reader_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn transmit(&mut self, command: &[u8]) -> Result<Vec<u8>, PcscError> {
        let card = self
            .card
            .as_mut()
            .ok_or_else(|| PcscError::NoCard(self.reader_name.clone()))?;

        // Allocate a buffer for the response
        let mut response_buffer = [0u8; 258];

        match card.transmit(command, &mut response_buffer) {
            Ok(response) => Ok(response.to_vec()),
            Err(pcsc::Error::RemovedCard | pcsc::Error::ResetCard) => {
                self.card = None;
                Err(PcscError::NoCard(self.reader_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CardConnection {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            let _ = card.disconnect(Disposition::LeaveCard);
        }
    }
}

/// Read the UID of the card currently on `reader_name`
pub(crate) fn read_uid(
    context: &Context,
    reader_name: &str,
    config: &PcscConfig,
) -> Result<CardUid, PcscError> {
    let mut connection = CardConnection::open(context, reader_name, config)?;
    let command = GetUid.to_bytes();
    let response = connection.transmit(&command)?;
    trace!(
        reader = reader_name,
        command = %hex::encode_upper(&command),
        response = %hex::encode_upper(&response),
        "uid exchange"
    );
    parse_uid_response(&response)
}
