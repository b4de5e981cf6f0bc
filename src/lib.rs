//! AX.25 networking stack for KISS TNC packet-radio terminals.
//!
//! This crate provides the protocol core of a packet terminal driving a
//! NinoTNC-style TNC: an ordered stack of stateful actions that sees every
//! inbound frame and every one-second tick, and on top of it a small
//! negotiation protocol — remote-triggered temporary mode switches with an
//! inactivity timeout, TEST frame echo, and connection-request
//! acknowledgement.
//!
//! # Getting started
//!
//! [`NetWorker::start`] connects to the TNC, installs the permanent
//! actions, and runs everything on a dedicated thread. The application
//! consumes [`Notification`]s and issues commands through a [`NetHandle`]:
//!
//! ```no_run
//! use tnc_net::{Address, NetConfig, NetWorker, Notification};
//!
//! let our_call: Address = "N0CALL".parse().unwrap();
//! let config = NetConfig::new(our_call).with_tnc_addr("127.0.0.1:8001");
//! let (worker, notifications) = NetWorker::start(config).unwrap();
//!
//! let handle = worker.handle();
//! handle.send_test("N1XYZ".parse().unwrap(), "Testing from tnc-net");
//!
//! for note in notifications {
//!     match note {
//!         Notification::Traffic(frame) => println!("{frame}"),
//!         Notification::Status(msg) => println!("* {msg}"),
//!         Notification::ModeChanged(name) => println!("* mode now {name}"),
//!         Notification::LinkError(msg) => {
//!             eprintln!("link lost: {msg}");
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Architecture
//!
//! - [`ax25`] — frame value types and the unnumbered-frame codec
//! - [`kiss`] — KISS framing and the TCP link to the TNC
//! - [`modes`] — the NinoTNC mode registry
//! - [`net`] — the action stack and its dispatch engine
//! - [`actions`] — the concrete stack actions
//! - [`worker`] — the thread that owns the engine and serializes access
//!
//! The engine itself is single-owner by design: the link's reader and the
//! ticker run on their own threads but only enqueue events, and the worker
//! thread applies them one at a time. See [`net`] for the dispatch rules.

pub mod actions;
pub mod ax25;
pub mod error;
pub mod kiss;
pub mod link;
pub mod modes;
pub mod net;
pub mod worker;

pub use ax25::{Address, Control, Frame, FrameKind, UNPROTO_PID};
pub use error::{Error, Result};
pub use link::Link;
pub use net::{Net, NetCore, Notification, StackAction, MODE_TIMEOUT_SECS};
pub use worker::{NetConfig, NetHandle, NetWorker};
