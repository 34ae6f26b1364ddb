//! Monitor thread turning PC/SC state changes into device events

use std::collections::HashSet;
use std::ffi::CString;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use nfc_bridge_core::{DeviceControl, DeviceEvent};
use parking_lot::Mutex;
use pcsc::{Context, ReaderState, Scope, State};
use tracing::{debug, trace, warn};

use crate::card;
use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::event::{
    ControlCommand, ControlReceiver, ControlSender, DeviceEventSender, control_channel,
};
use crate::manager::attached_readers;
use crate::reader::card_in_field;
use crate::uid::TagKind;

/// Monitor for PC/SC reader and card events
#[allow(missing_debug_implementations)]
pub struct PcscMonitor {
    /// PC/SC context
    context: Context,
    /// Driver configuration
    config: PcscConfig,
}

impl PcscMonitor {
    /// Create a new monitor
    pub(crate) const fn new(context: Context, config: PcscConfig) -> Self {
        Self { context, config }
    }

    /// Create a new monitor with a dedicated context
    pub fn create(config: PcscConfig) -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self::new(context, config))
    }

    /// Start watching readers on a background thread
    ///
    /// Events are delivered on `events` until the returned handle is stopped
    /// or the receiving side of the channel is dropped.
    pub fn spawn(self, events: DeviceEventSender) -> Result<MonitorHandle, PcscError> {
        let running = Arc::new(AtomicBool::new(true));
        let (control, commands) = control_channel();
        let wake = self.context.clone();

        let thread = thread::Builder::new().name("pcsc-monitor".into()).spawn({
            let running = Arc::clone(&running);
            let (context, config) = (self.context, self.config);
            move || {
                MonitorLoop {
                    context,
                    config,
                    events,
                    commands,
                    running,
                    states: Vec::new(),
                    present: HashSet::new(),
                    released: HashSet::new(),
                }
                .run()
            }
        })?;

        Ok(MonitorHandle {
            running,
            control,
            context: wake,
            thread: Mutex::new(Some(thread)),
        })
    }
}

/// Handle to a running monitor thread
///
/// Implements [`DeviceControl`] so the bridge can release readers and request
/// card identifiers. Dropping the handle stops the thread.
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    control: ControlSender,
    context: Context,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("running", &self.is_running())
            .finish()
    }
}

impl MonitorHandle {
    /// Whether the monitor thread is still watching
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop monitoring and wait for the thread to exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let _ = self.context.cancel();
        if let Some(thread) = self.thread.lock().take() {
            let _ = thread.join();
        }
    }

    fn send(&self, command: ControlCommand) {
        if self.control.send(command).is_ok() {
            // interrupt the pending status wait so the command runs now
            let _ = self.context.cancel();
        }
    }
}

impl DeviceControl for MonitorHandle {
    fn release(&self, reader: &str) {
        self.send(ControlCommand::Release(reader.to_string()));
    }

    fn request_identifier(&self, reader: &str) {
        self.send(ControlCommand::RequestIdentifier(reader.to_string()));
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Readers that appeared and disappeared since the last refresh
#[derive(Debug, Default, PartialEq, Eq)]
struct ReaderDiff {
    added: Vec<String>,
    removed: Vec<String>,
}

fn diff_readers(tracked: &[String], current: &[String], released: &HashSet<String>) -> ReaderDiff {
    ReaderDiff {
        added: current
            .iter()
            .filter(|name| !tracked.contains(name) && !released.contains(*name))
            .cloned()
            .collect(),
        removed: tracked
            .iter()
            .filter(|name| !current.contains(name))
            .cloned()
            .collect(),
    }
}

/// State owned by the monitor thread
struct MonitorLoop {
    context: Context,
    config: PcscConfig,
    events: DeviceEventSender,
    commands: ControlReceiver,
    running: Arc<AtomicBool>,
    /// Readers being watched, in the shape `SCardGetStatusChange` wants
    states: Vec<ReaderState>,
    /// Readers with a card in the field
    present: HashSet<String>,
    /// Readers the bridge refused; ignored until they disappear
    released: HashSet<String>,
}

impl MonitorLoop {
    fn run(mut self) {
        debug!("pcsc monitor started");

        while self.running.load(Ordering::Acquire) {
            self.process_commands();

            if let Err(e) = self.refresh_readers() {
                warn!(error = %e, "failed to list readers");
                thread::sleep(self.config.poll_interval);
                continue;
            }

            if self.states.is_empty() {
                thread::sleep(self.config.poll_interval);
                continue;
            }

            self.wait_for_changes();
        }

        debug!("pcsc monitor stopped");
    }

    fn emit(&self, event: DeviceEvent) {
        trace!(?event, "device event");
        if self.events.send(event).is_err() {
            // nobody is listening any more
            self.running.store(false, Ordering::Release);
        }
    }

    fn tracked_names(&self) -> Vec<String> {
        self.states.iter().map(reader_name).collect()
    }

    fn process_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                ControlCommand::Release(reader) => {
                    debug!(%reader, "releasing reader");
                    self.states.retain(|rs| reader_name(rs) != reader);
                    self.present.remove(&reader);
                    self.released.insert(reader);
                }
                ControlCommand::RequestIdentifier(reader) => {
                    if self.present.contains(&reader) {
                        self.identify(&reader);
                    } else {
                        debug!(%reader, "card left before it could be identified");
                    }
                }
            }
        }
    }

    fn refresh_readers(&mut self) -> Result<(), PcscError> {
        let current: Vec<(String, CString)> = attached_readers(&self.context)?
            .into_iter()
            .map(|name| (name.to_string_lossy().into_owned(), name))
            .collect();
        let current_names: Vec<String> = current.iter().map(|(name, _)| name.clone()).collect();

        let diff = diff_readers(&self.tracked_names(), &current_names, &self.released);
        self.released.retain(|name| current_names.contains(name));

        for name in diff.removed {
            self.states.retain(|rs| reader_name(rs) != name);
            self.present.remove(&name);
            self.emit(DeviceEvent::ReaderDisconnected(name));
        }

        for name in diff.added {
            if let Some((_, cname)) = current.iter().find(|(n, _)| *n == name) {
                self.states
                    .push(ReaderState::new(cname.clone(), State::UNAWARE));
                self.emit(DeviceEvent::ReaderConnected(name));
            }
        }

        Ok(())
    }

    fn wait_for_changes(&mut self) {
        for rs in &mut self.states {
            rs.sync_current_state();
        }

        match self
            .context
            .get_status_change(Some(self.config.poll_interval), &mut self.states)
        {
            Ok(()) => {}
            // nothing happened, or a command woke us up
            Err(pcsc::Error::Timeout | pcsc::Error::Cancelled) => return,
            // reader vanished mid-wait; the next refresh reports it
            Err(pcsc::Error::UnknownReader | pcsc::Error::ReaderUnavailable) => return,
            Err(e) => {
                warn!(error = %e, "waiting for reader status failed");
                thread::sleep(self.config.poll_interval);
                return;
            }
        }

        let mut arrived = Vec::new();
        let mut left = Vec::new();
        for rs in &self.states {
            let name = reader_name(rs);
            let in_field = card_in_field(rs.event_state());
            match (self.present.contains(&name), in_field) {
                (false, true) => arrived.push((name, rs.atr().to_vec())),
                (true, false) => left.push(name),
                _ => {}
            }
        }

        for name in left {
            self.present.remove(&name);
            self.emit(DeviceEvent::CardRemoved { reader: name });
        }
        for (name, atr) in arrived {
            self.present.insert(name.clone());
            self.card_arrived(&name, &atr);
        }
    }

    fn card_arrived(&self, reader: &str, atr: &[u8]) {
        let kind = TagKind::from_atr(atr);
        debug!(reader, atr = %hex::encode_upper(atr), ?kind, "card in field");

        if kind.has_immediate_uid() {
            self.identify(reader);
        } else {
            self.emit(DeviceEvent::CardDetected {
                reader: reader.to_string(),
                uid: None,
            });
        }
    }

    fn identify(&self, reader: &str) {
        let event = match card::read_uid(&self.context, reader, &self.config) {
            Ok(uid) => DeviceEvent::CardDetected {
                reader: reader.to_string(),
                uid: Some(uid),
            },
            Err(e) => DeviceEvent::DriverError {
                reader: reader.to_string(),
                message: e.to_string(),
            },
        };
        self.emit(event);
    }
}

fn reader_name(state: &ReaderState) -> String {
    state.name().to_string_lossy().into_owned()
}
