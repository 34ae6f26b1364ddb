//! Shared bridge state and the operations over it

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::WaitError;
use crate::event::{DeviceControl, DeviceEvent};
use crate::session::{ConnectOutcome, DetectOutcome, ReaderSession};
use crate::status::BridgeStatus;
use crate::uid::CardUid;
use crate::waiters::{WaitOutcome, WaiterId, WaiterRegistry};

/// Everything guarded by the bridge lock
#[derive(Debug)]
struct Shared {
    session: ReaderSession,
    enabled: bool,
    waiters: WaiterRegistry,
}

/// Side effect to run against the driver once the lock is released
#[derive(Debug)]
enum DeviceAction {
    Release(String),
    RequestIdentifier(String),
}

/// Coordinates one reader session, the bridge flag and the pending waiters
///
/// Reader activity arrives through [`handle_event`](Self::handle_event) and
/// HTTP callers block in [`wait_for_card`](Self::wait_for_card). Both go
/// through the same lock, so a card broadcast reaches every waiter registered
/// before it and none registered after.
#[derive(Debug)]
pub struct Bridge {
    shared: Mutex<Shared>,
    device: Arc<dyn DeviceControl>,
    config: BridgeConfig,
}

impl Bridge {
    /// Create a bridge with no reader bound
    pub fn new(config: BridgeConfig, device: Arc<dyn DeviceControl>) -> Self {
        Self {
            shared: Mutex::new(Shared {
                session: ReaderSession::new(),
                enabled: config.start_enabled,
                waiters: WaiterRegistry::new(),
            }),
            device,
            config,
        }
    }

    /// Snapshot of the current state
    pub fn status(&self) -> BridgeStatus {
        let shared = self.shared.lock();
        BridgeStatus {
            enabled: shared.enabled,
            reader_ready: shared.session.is_ready(),
            reader: shared.session.reader().map(str::to_string),
            last_uid: shared.session.last_uid().cloned(),
            card_present: shared.session.card_present(),
        }
    }

    /// Whether card events are delivered to waiters
    pub fn is_enabled(&self) -> bool {
        self.shared.lock().enabled
    }

    /// Flip the bridge flag and return the new value
    ///
    /// Pending waiters are left alone; only future card arrivals are gated.
    pub fn toggle(&self) -> bool {
        let mut shared = self.shared.lock();
        shared.enabled = !shared.enabled;
        info!(enabled = shared.enabled, "bridge toggled");
        shared.enabled
    }

    /// Set the bridge flag
    pub fn set_enabled(&self, enabled: bool) {
        let mut shared = self.shared.lock();
        if shared.enabled != enabled {
            shared.enabled = enabled;
            info!(enabled, "bridge switched");
        }
    }

    /// Number of callers currently blocked in [`wait_for_card`](Self::wait_for_card)
    pub fn pending_waiters(&self) -> usize {
        self.shared.lock().waiters.len()
    }

    /// Apply one event from the reader driver
    pub fn handle_event(&self, event: DeviceEvent) {
        let action = self.shared.lock().apply(event, &self.config);

        match action {
            Some(DeviceAction::Release(reader)) => self.device.release(&reader),
            Some(DeviceAction::RequestIdentifier(reader)) => {
                self.device.request_identifier(&reader)
            }
            None => {}
        }
    }

    /// Wait for the next card on the bound reader
    ///
    /// Fails at once if no reader is bound or the bridge is disabled. If a
    /// card is already on the reader its identifier is returned without
    /// waiting. Otherwise the call resolves with the next card, or fails when
    /// the deadline passes or the reader is unplugged.
    pub async fn wait_for_card(&self) -> Result<CardUid, WaitError> {
        let (id, deadline, mut completion) = {
            let mut shared = self.shared.lock();
            if !shared.session.is_ready() {
                return Err(WaitError::ReaderNotReady);
            }
            if !shared.enabled {
                return Err(WaitError::BridgeDisabled);
            }
            if let Some(uid) = shared.session.present_uid() {
                debug!(%uid, "card already present");
                return Ok(uid.clone());
            }

            let now = Instant::now();
            shared.waiters.expire(now);
            let deadline = now + self.config.wait_timeout;
            let (id, completion) = shared.waiters.register(deadline);
            debug!(?id, pending = shared.waiters.len(), "waiting for card");
            (id, deadline, completion)
        };

        let mut registration = Registration {
            shared: &self.shared,
            id,
            armed: true,
        };
        let outcome = self.settle(id, deadline, &mut completion).await;
        registration.armed = false;
        outcome
    }

    async fn settle(
        &self,
        id: WaiterId,
        deadline: Instant,
        completion: &mut oneshot::Receiver<WaitOutcome>,
    ) -> WaitOutcome {
        match time::timeout_at(deadline, &mut *completion).await {
            Ok(delivered) => delivered.unwrap_or(Err(WaitError::Abandoned)),
            Err(_) => {
                // A drain may have claimed the entry between the deadline and
                // this point; whoever removes it decides the outcome.
                let cancelled = self.shared.lock().waiters.cancel(id);
                if cancelled {
                    debug!(?id, "wait timed out");
                    Err(WaitError::Timeout)
                } else {
                    completion.try_recv().unwrap_or(Err(WaitError::Abandoned))
                }
            }
        }
    }
}

impl Shared {
    fn apply(&mut self, event: DeviceEvent, config: &BridgeConfig) -> Option<DeviceAction> {
        match event {
            DeviceEvent::ReaderConnected(reader) => match self.session.connect(&reader, config) {
                ConnectOutcome::Accepted => {
                    info!(%reader, "reader ready");
                    None
                }
                ConnectOutcome::NotAllowed => {
                    debug!(%reader, "ignoring reader outside allow-list");
                    Some(DeviceAction::Release(reader))
                }
                ConnectOutcome::Busy { active } => {
                    warn!(%reader, %active, "rejecting second reader");
                    Some(DeviceAction::Release(reader))
                }
            },
            DeviceEvent::ReaderDisconnected(reader) => {
                if self.session.disconnect(&reader) {
                    let rejected = self.waiters.reject_all(WaitError::ReaderRemoved);
                    info!(%reader, rejected, "reader removed");
                }
                None
            }
            DeviceEvent::CardDetected { reader, uid } => {
                match self.session.card_detected(&reader, uid) {
                    DetectOutcome::Arrived(uid) if self.enabled => {
                        let delivered = self.waiters.resolve_all(&uid);
                        info!(%reader, %uid, delivered, "card detected");
                        None
                    }
                    DetectOutcome::Arrived(uid) => {
                        info!(%reader, %uid, "card detected while bridge disabled");
                        None
                    }
                    DetectOutcome::NeedsIdentifier => {
                        debug!(%reader, "card without identifier, requesting it");
                        Some(DeviceAction::RequestIdentifier(reader))
                    }
                    DetectOutcome::Repeated => {
                        debug!(%reader, "card still present");
                        None
                    }
                    DetectOutcome::Ignored => None,
                }
            }
            DeviceEvent::CardRemoved { reader } => {
                if self.session.card_removed(&reader) {
                    debug!(%reader, "card removed");
                }
                None
            }
            DeviceEvent::DriverError { reader, message } => {
                warn!(%reader, %message, "reader error");
                None
            }
        }
    }
}

/// Removes a waiter whose caller stopped waiting before it settled
struct Registration<'a> {
    shared: &'a Mutex<Shared>,
    id: WaiterId,
    armed: bool,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.shared.lock().waiters.cancel(self.id);
        }
    }
}
