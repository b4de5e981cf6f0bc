//! Connection request acknowledgement.

use crate::ax25::{Control, Frame, FrameKind, UNPROTO_PID};
use crate::error::Result;
use crate::net::{NetCore, StackAction};

/// Acknowledges SABM connection requests addressed to our station with a
/// UA response. No session state is kept; connected mode is not
/// implemented, so the acknowledgement is all a caller gets.
#[derive(Debug, Default)]
pub struct ConnectionResponder;

impl ConnectionResponder {
    pub fn new() -> Self {
        Self
    }
}

impl StackAction for ConnectionResponder {
    fn frame_received(&mut self, net: &mut NetCore, frame: &Frame) -> Result<bool> {
        if frame.control.kind == FrameKind::Sabm
            && frame.control.poll_final
            && frame.dst == *net.our_call()
        {
            net.status(format!("acknowledging connection request from {}", frame.src));
            // A UA response, not an echo of the request's control octet.
            let control = Control::new(FrameKind::Ua, false);
            let reply = Frame::new(
                frame.src.clone(),
                net.our_call().clone(),
                control,
                UNPROTO_PID,
                Vec::new(),
            );
            net.send(reply)?;
        }
        Ok(true)
    }

    fn second_passed(&mut self, _net: &mut NetCore) -> Result<bool> {
        Ok(true)
    }

    fn describe(&self) -> String {
        "ConnectionResponder".to_string()
    }
}
