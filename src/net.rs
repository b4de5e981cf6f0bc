//! The handler stack and its dispatch engine.
//!
//! [`Net`] owns an ordered chain of [`StackAction`]s. Every inbound frame
//! runs through the chain in order until an action resigns (which also
//! consumes the frame for the rest of the chain); every one-second tick
//! visits the whole chain regardless of resignations. Four permanent
//! actions are installed at construction; temporary mode actions come and
//! go under negotiation control.
//!
//! Actions react through the [`NetCore`] they are handed: sends, hardware
//! commands, and notifications take effect immediately, while stack edits
//! (loopback dispatch, temporary-mode replacement) are queued and applied
//! between passes. Each pass therefore observes a stable snapshot of the
//! chain, and re-entrant dispatch cannot occur. A failing action is kept
//! and reported; no error crosses the dispatch boundary.

use std::collections::VecDeque;
use std::sync::mpsc::Sender;

use crate::actions::{ConnectionResponder, Logger, ModeNegotiator, TemporaryMode, TestResponder};
use crate::ax25::{Address, Control, Frame, FrameError, FrameKind, UNPROTO_PID};
use crate::error::{Error, Result};
use crate::link::Link;
use crate::modes::{self, TEMPORARY_SET_OFFSET};

/// Seconds a negotiated temporary mode stays active without traffic.
pub const MODE_TIMEOUT_SECS: u32 = 30;

// =============================================================================
// Notifications and the action interface
// =============================================================================

/// Events the engine reports to the application.
#[derive(Debug)]
pub enum Notification {
    /// A frame was sent or received, for display and audit.
    Traffic(Frame),
    /// A diagnostic message.
    Status(String),
    /// The TNC mode label changed.
    ModeChanged(String),
    /// The link to the TNC failed.
    LinkError(String),
}

/// A stateful unit in the dispatch stack.
pub trait StackAction: Send {
    /// React to a received frame. `Ok(true)` keeps the action and passes
    /// the frame on; `Ok(false)` removes the action and stops this frame
    /// from reaching actions further down the stack.
    fn frame_received(&mut self, net: &mut NetCore, frame: &Frame) -> Result<bool>;

    /// React to one second passing. `Ok(false)` removes the action; other
    /// actions are ticked regardless.
    fn second_passed(&mut self, net: &mut NetCore) -> Result<bool>;

    /// Whether this entry is a temporary mode, replaced by negotiation.
    fn is_temporary(&self) -> bool {
        false
    }

    /// Human-readable description for diagnostics.
    fn describe(&self) -> String;
}

// =============================================================================
// NetCore
// =============================================================================

/// Engine state reachable from inside action callbacks.
pub struct NetCore {
    our_call: Address,
    link: Box<dyn Link>,
    notify: Sender<Notification>,
    loopback: VecDeque<Frame>,
    requested_mode: Option<&'static modes::Mode>,
}

impl NetCore {
    /// The station's own callsign.
    pub fn our_call(&self) -> &Address {
        &self.our_call
    }

    /// Report an event to the application. Delivery is best-effort; a
    /// detached receiver only silences the display.
    pub fn notify(&mut self, notification: Notification) {
        let _ = self.notify.send(notification);
    }

    /// Report a diagnostic message.
    pub fn status(&mut self, msg: impl Into<String>) {
        self.notify(Notification::Status(msg.into()));
    }

    /// Log and transmit a frame.
    ///
    /// Frames addressed to our own station bypass the TNC entirely: they
    /// are queued for local dispatch after the current pass.
    pub fn send(&mut self, frame: Frame) -> Result<()> {
        self.notify(Notification::Traffic(frame.clone()));
        if frame.dst == self.our_call {
            self.loopback.push_back(frame);
            return Ok(());
        }
        self.link.send_frame(&frame.pack())
    }

    /// Send a TEST command to `dst` carrying `text`.
    pub fn send_test_command(&mut self, dst: Address, text: &str) -> Result<()> {
        let control = Control::new(FrameKind::Test, true);
        let frame = Frame::new(
            dst,
            self.our_call.clone(),
            control,
            UNPROTO_PID,
            text.as_bytes().to_vec(),
        );
        self.send(frame)
    }

    /// Answer a TEST command, echoing its payload back to the sender.
    pub fn send_test_response(&mut self, command: &Frame) -> Result<()> {
        let control = Control::new(FrameKind::Test, false);
        let frame = Frame::new(
            command.src.clone(),
            self.our_call.clone(),
            control,
            UNPROTO_PID,
            command.info.clone(),
        );
        self.send(frame)
    }

    /// Ask the station at `dst` to change its mode.
    pub fn send_mode_request(&mut self, dst: Address, mode_name: &str) -> Result<()> {
        let control = Control::new(FrameKind::Ui, true);
        let info = format!("RMODE {mode_name}").into_bytes();
        let frame = Frame::new(dst, self.our_call.clone(), control, UNPROTO_PID, info);
        self.send(frame)
    }

    /// Switch the TNC to `name` using the temporary SETHW encoding and
    /// update the application's mode label.
    pub fn set_hw_mode(&mut self, name: &str) -> Result<()> {
        let mode = modes::lookup(name).ok_or_else(|| Error::UnknownMode(name.to_string()))?;
        log::debug!("setting hardware mode to {name}");
        self.link.set_hardware(mode.hw_code + TEMPORARY_SET_OFFSET)?;
        self.notify(Notification::ModeChanged(name.to_string()));
        Ok(())
    }

    /// Replace any installed temporary mode with a fresh one for `mode`.
    /// Takes effect when the current pass completes.
    pub fn request_temporary_mode(&mut self, mode: &'static modes::Mode) {
        self.requested_mode = Some(mode);
    }
}

// =============================================================================
// Net
// =============================================================================

/// The stack engine.
///
/// All methods take `&mut self`: the engine expects a single serializing
/// owner (see [`NetWorker`](crate::worker::NetWorker)) to feed it inbound
/// frames, ticks, and commands.
pub struct Net {
    core: NetCore,
    stack: Vec<Box<dyn StackAction>>,
}

impl Net {
    /// Build an engine with the permanent actions installed: Logger,
    /// TestResponder, ModeNegotiator, ConnectionResponder, in that order.
    pub fn new(our_call: Address, link: Box<dyn Link>, notify: Sender<Notification>) -> Self {
        Self::with_actions(
            our_call,
            link,
            notify,
            vec![
                Box::new(Logger::new()),
                Box::new(TestResponder::new()),
                Box::new(ModeNegotiator::new()),
                Box::new(ConnectionResponder::new()),
            ],
        )
    }

    /// Build an engine with a custom action chain.
    pub fn with_actions(
        our_call: Address,
        link: Box<dyn Link>,
        notify: Sender<Notification>,
        actions: Vec<Box<dyn StackAction>>,
    ) -> Self {
        Self {
            core: NetCore {
                our_call,
                link,
                notify,
                loopback: VecDeque::new(),
                requested_mode: None,
            },
            stack: actions,
        }
    }

    /// Dispatch one received frame, then any work queued during the pass.
    pub fn frame_received(&mut self, frame: Frame) {
        self.frame_pass(&frame);
        self.run_queued();
    }

    /// Tick every action, dropping those that signal expiry, then run any
    /// queued work. Unlike the frame pass this never short-circuits.
    pub fn second_passed(&mut self) {
        let Self { core, stack } = self;
        stack.retain_mut(|action| match action.second_passed(core) {
            Ok(true) => true,
            Ok(false) => {
                log::debug!("removing {}", action.describe());
                false
            }
            Err(err) => {
                core.status(format!("{} failed: {err}", action.describe()));
                true
            }
        });
        self.run_queued();
    }

    /// Log and transmit a frame, dispatching it locally when addressed to
    /// our own station.
    pub fn send(&mut self, frame: Frame) -> Result<()> {
        let result = self.core.send(frame);
        self.run_queued();
        result
    }

    /// Send a TEST command to `dst` carrying `text`.
    pub fn send_test_command(&mut self, dst: Address, text: &str) -> Result<()> {
        let result = self.core.send_test_command(dst, text);
        self.run_queued();
        result
    }

    /// Ask the station at `dst` to change its mode.
    pub fn send_mode_request(&mut self, dst: Address, mode_name: &str) -> Result<()> {
        let result = self.core.send_mode_request(dst, mode_name);
        self.run_queued();
        result
    }

    /// Answer a TEST command, echoing its payload back to the sender.
    pub fn send_test_response(&mut self, command: &Frame) -> Result<()> {
        let result = self.core.send_test_response(command);
        self.run_queued();
        result
    }

    /// Switch the local TNC mode. Used for locally issued mode commands;
    /// the caller is expected to have validated the name.
    pub fn set_hw_mode(&mut self, name: &str) -> Result<()> {
        self.core.set_hw_mode(name)
    }

    /// Surface a codec failure; dispatch continues with the next frame.
    pub fn decode_failed(&mut self, err: &FrameError) {
        self.core.status(format!("ignoring undecodable frame: {err}"));
    }

    /// Surface a link failure. The engine and its timer keep running;
    /// reconnection policy belongs to the application.
    pub fn link_lost(&mut self, msg: &str) {
        self.core.notify(Notification::LinkError(msg.to_string()));
    }

    /// Descriptions of the installed actions, in dispatch order.
    pub fn describe_stack(&self) -> Vec<String> {
        self.stack.iter().map(|action| action.describe()).collect()
    }

    #[cfg(test)]
    pub(crate) fn core_mut(&mut self) -> &mut NetCore {
        &mut self.core
    }

    /// One frame dispatch pass over the current chain: visit in order,
    /// stop at the first action that resigns and drop it.
    fn frame_pass(&mut self, frame: &Frame) {
        let Self { core, stack } = self;
        let mut resigned = None;
        for (index, action) in stack.iter_mut().enumerate() {
            log::trace!("passing frame to {}", action.describe());
            match action.frame_received(core, frame) {
                Ok(true) => {}
                Ok(false) => {
                    resigned = Some(index);
                    break;
                }
                Err(err) => core.status(format!("{} failed: {err}", action.describe())),
            }
        }
        if let Some(index) = resigned {
            let action = self.stack.remove(index);
            log::debug!("removing {}", action.describe());
        }
    }

    /// Apply stack edits and dispatch loopback frames queued during a
    /// pass. Loopback dispatch may queue further work; keep going until
    /// everything has drained.
    fn run_queued(&mut self) {
        loop {
            if let Some(mode) = self.core.requested_mode.take() {
                self.install_temporary_mode(mode);
            } else if let Some(frame) = self.core.loopback.pop_front() {
                self.frame_pass(&frame);
            } else {
                break;
            }
        }
    }

    /// Replace any installed temporary mode with a fresh one. The hardware
    /// is commanded exactly once, by the new action's activation.
    fn install_temporary_mode(&mut self, mode: &'static modes::Mode) {
        self.stack.retain(|action| !action.is_temporary());
        let action = TemporaryMode::new(mode.name, MODE_TIMEOUT_SECS);
        match action.activate(&mut self.core) {
            Ok(()) => self.stack.push(Box::new(action)),
            Err(err) => self
                .core
                .status(format!("mode change to {} failed: {err}", mode.name)),
        }
    }
}
