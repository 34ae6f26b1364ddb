//! Error types for the PC/SC driver

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// Reader not found
    #[error("Reader not found: {0}")]
    ReaderNotFound(String),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),

    /// Card answered with a non-success status word
    #[error("Card returned status {sw1:02X}{sw2:02X}")]
    Status {
        /// First status byte
        sw1: u8,
        /// Second status byte
        sw2: u8,
    },

    /// Card answer was too short or empty
    #[error("Invalid response from card")]
    InvalidResponse,

    /// Monitor thread could not be started
    #[error("Failed to start monitor thread: {0}")]
    Spawn(#[from] std::io::Error),
}
