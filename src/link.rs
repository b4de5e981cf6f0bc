//! The byte-level seam between the stack engine and a TNC.

use crate::error::Result;

/// A transmit-side link to a TNC.
///
/// The engine hands fully packed frames to `send_frame` and raw SETHW codes
/// to `set_hardware`. Inbound delivery is the transport's concern: a
/// concrete link such as [`KissTcp`](crate::kiss::KissTcp) pushes decoded
/// payloads through a callback registered at connect time.
pub trait Link: Send + 'static {
    /// Transmit one packed AX.25 frame.
    fn send_frame(&mut self, frame: &[u8]) -> Result<()>;

    /// Change the TNC hardware configuration (SETHW).
    fn set_hardware(&mut self, code: u8) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::Link;
    use crate::error::{Error, Result};

    /// Records everything the engine asks the TNC to do. Clones share the
    /// recording, so tests can keep one while the engine owns another.
    #[derive(Clone, Default)]
    pub(crate) struct RecordingLink {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
        hw_codes: Arc<Mutex<Vec<u8>>>,
    }

    impl RecordingLink {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.frames.lock().unwrap().clone()
        }

        pub(crate) fn hw_codes(&self) -> Vec<u8> {
            self.hw_codes.lock().unwrap().clone()
        }
    }

    impl Link for RecordingLink {
        fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }

        fn set_hardware(&mut self, code: u8) -> Result<()> {
            self.hw_codes.lock().unwrap().push(code);
            Ok(())
        }
    }

    /// A link whose operations always fail.
    pub(crate) struct DeadLink;

    impl Link for DeadLink {
        fn send_frame(&mut self, _frame: &[u8]) -> Result<()> {
            Err(Error::LinkClosed)
        }

        fn set_hardware(&mut self, _code: u8) -> Result<()> {
            Err(Error::LinkClosed)
        }
    }
}
