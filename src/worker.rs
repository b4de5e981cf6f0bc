//! Worker runtime: a dedicated thread owning the engine.
//!
//! Inbound frames arrive on the link reader's thread while the ticker
//! expires temporary modes once a second. Instead of locking the stack,
//! everything funnels into one event channel consumed by a single thread
//! that owns the [`Net`] value; the reader callback, the ticker, and every
//! [`NetHandle`] command only enqueue. That thread is the sole place stack
//! state is touched, so frame passes, tick passes, and commands are
//! serialized by construction.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::ax25::{Address, Frame, FrameError};
use crate::error::Result;
use crate::kiss::KissTcp;
use crate::link::Link;
use crate::net::{Net, Notification};

/// How long the ticker sleeps between tick events. The interval is
/// measured from the end of one tick to the start of the next, so ticks
/// drift under load; the protocol tolerates this.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

// =============================================================================
// Configuration and events
// =============================================================================

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// The station callsign.
    pub our_call: Address,
    /// TNC endpoint, `host:port`.
    pub tnc_addr: String,
}

impl NetConfig {
    /// Configuration with the default TNC endpoint.
    pub fn new(our_call: Address) -> Self {
        Self {
            our_call,
            tnc_addr: "127.0.0.1:8001".to_string(),
        }
    }

    /// Use a different TNC endpoint.
    pub fn with_tnc_addr(mut self, addr: impl Into<String>) -> Self {
        self.tnc_addr = addr.into();
        self
    }
}

/// Everything the worker thread reacts to.
enum Event {
    /// A decoded inbound frame.
    Frame(Frame),
    /// An inbound payload the codec rejected.
    DecodeFailure(FrameError),
    /// The link reader died.
    LinkClosed(std::io::Error),
    /// One second passed.
    Tick,
    /// Set the local TNC mode.
    SetMode(String),
    /// Send a TEST command.
    SendTest { dst: Address, text: String },
    /// Ask a remote station to change its mode.
    RequestRemoteMode { dst: Address, mode: String },
    /// Transmit a frame.
    Send(Frame),
    /// Stop the worker.
    Shutdown,
}

// =============================================================================
// NetHandle
// =============================================================================

/// Cloneable handle for issuing commands to a running [`NetWorker`].
///
/// The application validates commands (callsign syntax, mode-name
/// membership) before issuing them; the engine forwards them as-is. All
/// methods are fire-and-forget: once the worker is gone they do nothing.
#[derive(Clone)]
pub struct NetHandle {
    tx: Sender<Event>,
}

impl NetHandle {
    /// Change the local TNC mode.
    pub fn set_mode(&self, name: impl Into<String>) {
        let _ = self.tx.send(Event::SetMode(name.into()));
    }

    /// Send a TEST command to `dst`.
    pub fn send_test(&self, dst: Address, text: impl Into<String>) {
        let _ = self.tx.send(Event::SendTest {
            dst,
            text: text.into(),
        });
    }

    /// Ask the station at `dst` to change its mode.
    pub fn request_remote_mode(&self, dst: Address, mode: impl Into<String>) {
        let _ = self.tx.send(Event::RequestRemoteMode {
            dst,
            mode: mode.into(),
        });
    }

    /// Transmit a frame.
    pub fn send(&self, frame: Frame) {
        let _ = self.tx.send(Event::Send(frame));
    }

    /// Stop the worker thread.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Event::Shutdown);
    }
}

// =============================================================================
// NetWorker
// =============================================================================

/// Owns the engine on a dedicated thread.
pub struct NetWorker {
    handle: NetHandle,
    thread: Option<JoinHandle<()>>,
    _ticker: JoinHandle<()>,
}

impl NetWorker {
    /// Connect to the TNC and start the engine, reader, and ticker.
    ///
    /// Notifications arrive on the returned receiver; a detached receiver
    /// does not stop the engine.
    pub fn start(config: NetConfig) -> Result<(Self, Receiver<Notification>)> {
        let (event_tx, event_rx) = mpsc::channel();

        let payload_tx = event_tx.clone();
        let close_tx = event_tx.clone();
        let link = KissTcp::connect(
            &config.tnc_addr,
            Box::new(move |payload| {
                let event = match Frame::unpack(&payload) {
                    Ok(frame) => Event::Frame(frame),
                    Err(err) => Event::DecodeFailure(err),
                };
                let _ = payload_tx.send(event);
            }),
            Box::new(move |err| {
                let _ = close_tx.send(Event::LinkClosed(err));
            }),
        )?;
        log::debug!("connected to TNC at {}", config.tnc_addr);

        Ok(Self::spawn(config.our_call, Box::new(link), event_tx, event_rx))
    }

    /// Wire the worker and ticker threads around an already-built link.
    fn spawn(
        our_call: Address,
        link: Box<dyn Link>,
        event_tx: Sender<Event>,
        event_rx: Receiver<Event>,
    ) -> (Self, Receiver<Notification>) {
        let (notify_tx, notify_rx) = mpsc::channel();
        let net = Net::new(our_call, link, notify_tx.clone());

        let tick_tx = event_tx.clone();
        let ticker = thread::spawn(move || loop {
            thread::sleep(TICK_INTERVAL);
            if tick_tx.send(Event::Tick).is_err() {
                return;
            }
        });

        let thread = thread::spawn(move || Self::run(net, event_rx, notify_tx));

        let worker = Self {
            handle: NetHandle { tx: event_tx },
            thread: Some(thread),
            _ticker: ticker,
        };
        (worker, notify_rx)
    }

    fn run(mut net: Net, events: Receiver<Event>, notify: Sender<Notification>) {
        let report = |notify: &Sender<Notification>, what: &str, result: Result<()>| {
            if let Err(err) = result {
                let _ = notify.send(Notification::Status(format!("{what} failed: {err}")));
            }
        };

        for event in events {
            match event {
                Event::Frame(frame) => net.frame_received(frame),
                Event::DecodeFailure(err) => net.decode_failed(&err),
                Event::LinkClosed(err) => net.link_lost(&err.to_string()),
                Event::Tick => net.second_passed(),
                Event::SetMode(name) => {
                    report(&notify, "mode change", net.set_hw_mode(&name));
                }
                Event::SendTest { dst, text } => {
                    report(&notify, "test transmission", net.send_test_command(dst, &text));
                }
                Event::RequestRemoteMode { dst, mode } => {
                    report(&notify, "mode request", net.send_mode_request(dst, &mode));
                }
                Event::Send(frame) => {
                    report(&notify, "transmission", net.send(frame));
                }
                Event::Shutdown => break,
            }
        }
        log::debug!("net worker stopped");
    }

    /// Handle for issuing commands.
    pub fn handle(&self) -> NetHandle {
        self.handle.clone()
    }

    /// Stop the worker and wait for it to finish. Pending events ahead of
    /// the shutdown are still processed.
    pub fn shutdown(mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for NetWorker {
    fn drop(&mut self) {
        self.handle.shutdown();
    }
}
