//! Temporary mode with inactivity timeout.

use crate::ax25::Frame;
use crate::error::Result;
use crate::modes::DEFAULT_MODE;
use crate::net::{NetCore, StackAction};

/// Holds the TNC in a negotiated mode until no traffic has been seen for
/// the configured number of seconds, then restores the default mode and
/// removes itself. Any received frame restarts the countdown; the frame
/// path never removes this action.
///
/// Construction is side-effect free; [`activate`](Self::activate) performs
/// the hardware change.
#[derive(Debug)]
pub struct TemporaryMode {
    mode_name: &'static str,
    timeout_secs: u32,
    seconds_left: u32,
}

impl TemporaryMode {
    /// Create the action without touching the hardware.
    pub fn new(mode_name: &'static str, timeout_secs: u32) -> Self {
        Self {
            mode_name,
            timeout_secs,
            seconds_left: timeout_secs,
        }
    }

    /// Command the TNC into this mode.
    pub fn activate(&self, net: &mut NetCore) -> Result<()> {
        net.set_hw_mode(self.mode_name)
    }
}

impl StackAction for TemporaryMode {
    fn frame_received(&mut self, _net: &mut NetCore, _frame: &Frame) -> Result<bool> {
        self.seconds_left = self.timeout_secs;
        Ok(true)
    }

    fn second_passed(&mut self, net: &mut NetCore) -> Result<bool> {
        if self.seconds_left > 0 {
            self.seconds_left -= 1;
            return Ok(true);
        }
        net.status(format!("mode {} timed out", self.mode_name));
        net.set_hw_mode(DEFAULT_MODE)?;
        Ok(false)
    }

    fn is_temporary(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!(
            "TemporaryMode({}, {}/{})",
            self.mode_name, self.seconds_left, self.timeout_secs
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};

    use super::*;
    use crate::ax25::{Address, Control, FrameKind, UNPROTO_PID};
    use crate::link::testing::RecordingLink;
    use crate::modes::TEMPORARY_SET_OFFSET;
    use crate::net::{Net, Notification};

    fn addr(s: &str) -> Address {
        s.parse().expect("test address")
    }

    fn installed(timeout_secs: u32) -> (Net, RecordingLink, Receiver<Notification>) {
        let link = RecordingLink::new();
        let (tx, rx) = mpsc::channel();
        let action = TemporaryMode::new("9600-GFSK-AX.25", timeout_secs);
        let net = Net::with_actions(
            addr("N0CALL"),
            Box::new(link.clone()),
            tx,
            vec![Box::new(action)],
        );
        (net, link, rx)
    }

    fn any_frame() -> Frame {
        Frame::new(
            addr("N9XYZ"),
            addr("N1ABC"),
            Control::new(FrameKind::Ui, false),
            UNPROTO_PID,
            b"activity".to_vec(),
        )
    }

    #[test]
    fn test_construction_has_no_side_effects() {
        let (_net, link, _rx) = installed(3);
        assert!(link.hw_codes().is_empty());
    }

    #[test]
    fn test_activate_uses_temporary_encoding() {
        let (mut net, link, _rx) = installed(3);
        let action = TemporaryMode::new("9600-GFSK-AX.25", 3);
        action.activate(net.core_mut()).expect("activate");
        assert_eq!(link.hw_codes(), vec![TEMPORARY_SET_OFFSET]);
    }

    #[test]
    fn test_survives_timeout_ticks_then_expires() {
        let (mut net, link, rx) = installed(3);
        drop(rx);

        for tick in 1..=3 {
            net.second_passed();
            assert_eq!(net.describe_stack().len(), 1, "gone after tick {tick}");
        }

        net.second_passed();
        assert!(net.describe_stack().is_empty());
        // Only the restore to the default mode touched the hardware.
        assert_eq!(link.hw_codes(), vec![0b0110 + TEMPORARY_SET_OFFSET]);
    }

    #[test]
    fn test_expiry_reports_a_diagnostic() {
        let (mut net, _link, rx) = installed(0);
        net.second_passed();
        assert!(rx
            .try_iter()
            .any(|n| matches!(n, Notification::Status(msg) if msg.contains("timed out"))));
    }

    #[test]
    fn test_frames_restart_the_countdown() {
        let (mut net, _link, rx) = installed(3);
        drop(rx);

        net.second_passed();
        net.second_passed();
        net.frame_received(any_frame());

        for _ in 0..3 {
            net.second_passed();
        }
        assert_eq!(net.describe_stack().len(), 1, "countdown was restarted");

        net.second_passed();
        assert!(net.describe_stack().is_empty());
    }
}
