//! TEST frame echo.

use crate::ax25::{Frame, FrameKind};
use crate::error::Result;
use crate::net::{NetCore, StackAction};

/// Answers TEST commands addressed to our station, echoing the payload
/// back to the sender with poll/final cleared.
#[derive(Debug, Default)]
pub struct TestResponder;

impl TestResponder {
    pub fn new() -> Self {
        Self
    }
}

impl StackAction for TestResponder {
    fn frame_received(&mut self, net: &mut NetCore, frame: &Frame) -> Result<bool> {
        if frame.control.kind == FrameKind::Test
            && frame.control.poll_final
            && frame.dst == *net.our_call()
        {
            log::debug!("answering TEST from {}", frame.src);
            net.send_test_response(frame)?;
        }
        Ok(true)
    }

    fn second_passed(&mut self, _net: &mut NetCore) -> Result<bool> {
        Ok(true)
    }

    fn describe(&self) -> String {
        "TestResponder".to_string()
    }
}
