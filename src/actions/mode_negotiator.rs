//! Remote mode negotiation.

use crate::ax25::{Frame, FrameKind};
use crate::error::Result;
use crate::modes;
use crate::net::{NetCore, StackAction};

/// Payload prefix of a remote mode-change request.
const REQUEST_PREFIX: &str = "RMODE ";

/// Handles `RMODE <mode>` requests from remote stations by replacing the
/// installed temporary mode.
///
/// Mode names arriving over the air are untrusted and are validated
/// against the registry here, regardless of what the sender claims.
#[derive(Debug, Default)]
pub struct ModeNegotiator;

impl ModeNegotiator {
    pub fn new() -> Self {
        Self
    }
}

impl StackAction for ModeNegotiator {
    fn frame_received(&mut self, net: &mut NetCore, frame: &Frame) -> Result<bool> {
        if frame.control.kind != FrameKind::Ui
            || !frame.control.poll_final
            || frame.dst != *net.our_call()
        {
            return Ok(true);
        }
        let text = frame.info_text();
        let Some(name) = text.strip_prefix(REQUEST_PREFIX) else {
            return Ok(true);
        };
        match modes::lookup(name) {
            Some(mode) => {
                net.status(format!("{} requested mode {name}", frame.src));
                net.request_temporary_mode(mode);
            }
            None => net.status(format!("ignoring request for unknown mode {name}")),
        }
        Ok(true)
    }

    fn second_passed(&mut self, _net: &mut NetCore) -> Result<bool> {
        Ok(true)
    }

    fn describe(&self) -> String {
        "ModeNegotiator".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc::{self, Receiver};

    use super::*;
    use crate::ax25::{Address, Control, UNPROTO_PID};
    use crate::link::testing::RecordingLink;
    use crate::modes::TEMPORARY_SET_OFFSET;
    use crate::net::{Net, Notification};

    fn addr(s: &str) -> Address {
        s.parse().expect("test address")
    }

    fn negotiator() -> (Net, RecordingLink, Receiver<Notification>) {
        let link = RecordingLink::new();
        let (tx, rx) = mpsc::channel();
        let net = Net::with_actions(
            addr("N0CALL"),
            Box::new(link.clone()),
            tx,
            vec![Box::new(ModeNegotiator::new())],
        );
        (net, link, rx)
    }

    fn request(dst: &str, kind: FrameKind, poll_final: bool, info: &[u8]) -> Frame {
        Frame::new(
            addr(dst),
            addr("N1ABC"),
            Control::new(kind, poll_final),
            UNPROTO_PID,
            info.to_vec(),
        )
    }

    #[test]
    fn test_valid_request_installs_the_mode() {
        let (mut net, link, _rx) = negotiator();
        net.frame_received(request(
            "N0CALL",
            FrameKind::Ui,
            true,
            b"RMODE 9600-GFSK-AX.25",
        ));

        assert_eq!(link.hw_codes(), vec![TEMPORARY_SET_OFFSET]);
        assert!(net
            .describe_stack()
            .iter()
            .any(|d| d.contains("9600-GFSK-AX.25")));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let (mut net, link, rx) = negotiator();
        net.frame_received(request("N0CALL", FrameKind::Ui, true, b"RMODE warp-9"));

        assert!(link.hw_codes().is_empty());
        assert_eq!(net.describe_stack(), vec!["ModeNegotiator"]);
        assert!(rx
            .try_iter()
            .any(|n| matches!(n, Notification::Status(msg) if msg.contains("warp-9"))));
    }

    #[test]
    fn test_requests_to_other_stations_are_ignored() {
        let (mut net, link, _rx) = negotiator();
        net.frame_received(request(
            "N9XYZ",
            FrameKind::Ui,
            true,
            b"RMODE 9600-GFSK-AX.25",
        ));
        assert!(link.hw_codes().is_empty());
    }

    #[test]
    fn test_requires_ui_with_poll_set() {
        let (mut net, link, _rx) = negotiator();
        net.frame_received(request(
            "N0CALL",
            FrameKind::Ui,
            false,
            b"RMODE 9600-GFSK-AX.25",
        ));
        net.frame_received(request(
            "N0CALL",
            FrameKind::Test,
            true,
            b"RMODE 9600-GFSK-AX.25",
        ));
        assert!(link.hw_codes().is_empty());
    }

    #[test]
    fn test_prefix_must_match_exactly() {
        let (mut net, link, _rx) = negotiator();
        net.frame_received(request("N0CALL", FrameKind::Ui, true, b"RMODE"));
        net.frame_received(request(
            "N0CALL",
            FrameKind::Ui,
            true,
            b"rmode 9600-GFSK-AX.25",
        ));
        assert!(link.hw_codes().is_empty());
    }
}
