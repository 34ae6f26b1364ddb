//! Error types for the bridge core

/// Reasons a wait for the next card can end without an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// No reader is bound, so no card can arrive
    #[error("reader not ready")]
    ReaderNotReady,

    /// The bridge is switched off
    #[error("bridge disabled")]
    BridgeDisabled,

    /// The deadline passed before a card was presented
    #[error("timeout")]
    Timeout,

    /// The reader was unplugged while the request was pending
    #[error("reader removed")]
    ReaderRemoved,

    /// The completion handle was dropped without an outcome
    #[error("wait abandoned")]
    Abandoned,
}

/// Failure to parse a card identifier from text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UidParseError {
    /// Identifier was empty
    #[error("empty card identifier")]
    Empty,

    /// Identifier was not valid hexadecimal
    #[error("invalid card identifier: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
