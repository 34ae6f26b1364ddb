//! Loopback HTTP API for the NFC bridge
//!
//! Three endpoints, served both at the root and under `/api`:
//!
//! | Method | Path             | Purpose                                   |
//! |--------|------------------|-------------------------------------------|
//! | GET    | `/health`        | bridge status snapshot                    |
//! | POST   | `/bridge/toggle` | flip the bridge flag                      |
//! | POST   | `/nfc/wait`      | block until the next card, then its UID   |
//!
//! `/nfc/wait` answers 200 `{uid}`, or an `{error}` body with 503 (no reader),
//! 423 (bridge disabled), 408 (timeout) or 500 (reader removed).
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
mod routes;
mod server;

pub use error::{ApiError, ServerError};
pub use routes::{HealthResponse, ToggleResponse, UidResponse, router};
pub use server::{BoundServer, BridgeServer, BridgeServerBuilder, DEFAULT_PORT};
