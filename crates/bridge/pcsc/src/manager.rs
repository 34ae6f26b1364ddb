//! Entry point to the PC/SC service

use std::ffi::CString;
use std::time::Duration;

use pcsc::{Context, ReaderState, Scope, State};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::monitor::PcscMonitor;
use crate::reader::PcscReader;

/// Owns a PC/SC context and hands out reader snapshots and monitors
#[allow(missing_debug_implementations)]
pub struct PcscDeviceManager {
    context: Context,
}

impl PcscDeviceManager {
    /// Connect to the PC/SC service
    pub fn new() -> Result<Self, PcscError> {
        Ok(Self {
            context: Context::establish(Scope::User)?,
        })
    }

    /// Snapshot every attached reader
    ///
    /// Fails with [`PcscError::NoReadersAvailable`] when nothing is plugged in.
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let names = attached_readers(&self.context)?;
        if names.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        let mut states: Vec<ReaderState> = names
            .into_iter()
            .map(|name| ReaderState::new(name, State::UNAWARE))
            .collect();
        // an UNAWARE query returns at once with the current state of each
        self.context
            .get_status_change(Some(Duration::ZERO), &mut states)?;

        Ok(states.iter().map(PcscReader::from_reader_state).collect())
    }

    /// Monitor sharing this manager's context
    pub fn monitor(&self, config: PcscConfig) -> PcscMonitor {
        PcscMonitor::new(self.context.clone(), config)
    }
}

/// Names of the attached readers; none attached is not an error here
pub(crate) fn attached_readers(context: &Context) -> Result<Vec<CString>, PcscError> {
    match context.list_readers_owned() {
        Ok(readers) => Ok(readers),
        Err(pcsc::Error::NoReadersAvailable) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
