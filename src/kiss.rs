//! KISS framing and the TCP link to a TNC.
//!
//! KISS wraps each payload between `FEND` delimiters with a leading command
//! byte and escapes delimiter bytes inside the payload. This module provides
//! the incremental [`Decoder`] for the receive direction, frame encoding for
//! the transmit direction, and [`KissTcp`], a link to a TNC reachable over
//! TCP (a NinoTNC behind a serial-to-TCP bridge, or a software modem).
//!
//! Only data frames are surfaced to the caller; frames for other KISS
//! commands are dropped. The SetHardware command carries NinoTNC SETHW
//! codes.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::link::Link;

/// Frame delimiter.
const FEND: u8 = 0xC0;
/// Escape marker.
const FESC: u8 = 0xDB;
/// Escaped substitute for FEND.
const TFEND: u8 = 0xDC;
/// Escaped substitute for FESC.
const TFESC: u8 = 0xDD;

/// Command nibble of a data frame.
const CMD_DATA: u8 = 0x00;
/// Command byte of a SetHardware frame on port 0.
const CMD_SET_HARDWARE: u8 = 0x06;

/// Callback invoked once per decoded data-frame payload.
pub type PayloadCallback = Box<dyn FnMut(Vec<u8>) + Send + 'static>;
/// Callback invoked when the link is lost.
pub type CloseCallback = Box<dyn FnOnce(std::io::Error) + Send + 'static>;

/// Wrap `payload` in a KISS frame with the given command byte.
fn encode(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 3);
    out.push(FEND);
    out.push(command);
    for &b in payload {
        match b {
            FEND => out.extend_from_slice(&[FESC, TFEND]),
            FESC => out.extend_from_slice(&[FESC, TFESC]),
            other => out.push(other),
        }
    }
    out.push(FEND);
    out
}

/// Incremental KISS decoder.
///
/// Feed it raw bytes as they arrive; it returns the completed data-frame
/// payloads. Bytes before the first delimiter and frames for non-data
/// commands are discarded.
#[derive(Debug, Default)]
pub struct Decoder {
    frame: Vec<u8>,
    in_frame: bool,
    escaped: bool,
}

impl Decoder {
    /// A decoder in its initial state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push received bytes, returning any completed data payloads.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        for &b in bytes {
            if !self.in_frame {
                if b == FEND {
                    self.in_frame = true;
                    self.frame.clear();
                    self.escaped = false;
                }
                continue;
            }
            match b {
                // A delimiter both ends one frame and begins the next;
                // back-to-back delimiters are idle keep-alives.
                FEND => {
                    if let Some(payload) = Self::complete(&mut self.frame) {
                        out.push(payload);
                    }
                    self.escaped = false;
                }
                FESC if !self.escaped => self.escaped = true,
                b => {
                    let b = if self.escaped {
                        self.escaped = false;
                        match b {
                            TFEND => FEND,
                            TFESC => FESC,
                            other => other,
                        }
                    } else {
                        b
                    };
                    self.frame.push(b);
                }
            }
        }
        out
    }

    fn complete(frame: &mut Vec<u8>) -> Option<Vec<u8>> {
        let data = std::mem::take(frame);
        let (&command, payload) = data.split_first()?;
        if command & 0x0F != CMD_DATA {
            log::trace!("ignoring KISS frame with command {command:#04x}");
            return None;
        }
        Some(payload.to_vec())
    }
}

/// A KISS TNC reached over TCP.
///
/// The reader thread owns the receive half of the stream: every decoded
/// data payload is handed to the payload callback, and a read failure or
/// EOF fires the close callback once. Dropping the link shuts the stream
/// down and lets the reader exit without reporting a failure.
pub struct KissTcp {
    stream: TcpStream,
    running: Arc<AtomicBool>,
    _reader: JoinHandle<()>,
}

impl KissTcp {
    /// Connect to a KISS TNC and start the reader thread.
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        on_payload: PayloadCallback,
        on_close: CloseCallback,
    ) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let reader_stream = stream.try_clone()?;
        let running = Arc::new(AtomicBool::new(true));
        let running_reader = Arc::clone(&running);
        let reader = thread::spawn(move || {
            Self::read_loop(reader_stream, on_payload, on_close, running_reader);
        });
        Ok(Self {
            stream,
            running,
            _reader: reader,
        })
    }

    fn read_loop(
        mut stream: TcpStream,
        mut on_payload: PayloadCallback,
        on_close: CloseCallback,
        running: Arc<AtomicBool>,
    ) {
        let mut decoder = Decoder::new();
        let mut buf = [0u8; 2048];
        loop {
            match stream.read(&mut buf) {
                Ok(0) => {
                    if running.load(Ordering::Relaxed) {
                        on_close(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "TNC closed the connection",
                        ));
                    }
                    return;
                }
                Ok(n) => {
                    for payload in decoder.push(&buf[..n]) {
                        on_payload(payload);
                    }
                }
                Err(err) => {
                    if running.load(Ordering::Relaxed) {
                        on_close(err);
                    }
                    return;
                }
            }
        }
    }
}

impl Link for KissTcp {
    fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.stream.write_all(&encode(CMD_DATA, frame))?;
        Ok(())
    }

    fn set_hardware(&mut self, code: u8) -> Result<()> {
        self.stream.write_all(&encode(CMD_SET_HARDWARE, &[code]))?;
        Ok(())
    }
}

impl Drop for KissTcp {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
