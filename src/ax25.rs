//! Minimal AX.25 codec for unnumbered frames.
//!
//! This module provides the [`Frame`] value type the stack dispatches on,
//! together with `pack`/`unpack` for the unnumbered frame kinds an
//! unconnected station exchanges (UI, SABM, DISC, DM, UA, TEST). Connected
//! mode (I and S frames, windowing, retransmission) is not implemented.
//!
//! Decode failures are reported as [`FrameError`] values; nothing in here
//! panics on wire input.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// PID marking a frame that carries no layer 3 protocol.
pub const UNPROTO_PID: u8 = 0xF0;

/// Encoded length of one address field.
const ADDR_LEN: usize = 7;

/// Most digipeaters one address field may carry.
const MAX_DIGIPEATERS: usize = 8;

/// Poll/final bit within a control octet.
const POLL_FINAL: u8 = 0x10;

/// A buffer that could not be encoded or decoded as an AX.25 frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The buffer ended before the frame was complete.
    #[error("frame truncated at {0} bytes")]
    Truncated(usize),

    /// A callsign that is empty, too long, or not alphanumeric.
    #[error("invalid callsign {0:?}")]
    InvalidCallsign(String),

    /// An SSID outside 0-15.
    #[error("invalid SSID {0}")]
    InvalidSsid(u8),

    /// The address field does not contain a destination and a source.
    #[error("malformed address field")]
    BadAddressField,

    /// More digipeaters than the address field allows.
    #[error("too many digipeaters")]
    TooManyDigipeaters,

    /// A control octet for a frame kind this codec does not understand.
    #[error("unsupported control octet {0:#04x}")]
    UnsupportedControl(u8),

    /// Payload bytes on a frame kind that carries no information field.
    #[error("{0} bytes after control field")]
    TrailingBytes(usize),
}

/// An AX.25 address: a callsign of up to six characters plus an SSID.
///
/// Parsed from and displayed in the usual `CALL-SSID` notation; the SSID is
/// omitted when zero.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    callsign: String,
    ssid: u8,
}

impl Address {
    /// Build an address, validating the callsign and SSID.
    pub fn new(callsign: &str, ssid: u8) -> Result<Self, FrameError> {
        if ssid > 15 {
            return Err(FrameError::InvalidSsid(ssid));
        }
        let callsign = callsign.to_ascii_uppercase();
        if callsign.is_empty()
            || callsign.len() > 6
            || !callsign.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(FrameError::InvalidCallsign(callsign));
        }
        Ok(Self { callsign, ssid })
    }

    /// The callsign, without SSID.
    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    /// The SSID, 0-15.
    pub fn ssid(&self) -> u8 {
        self.ssid
    }

    /// Append the seven-byte encoding. The extension bit on the final
    /// octet marks the end of the whole address field.
    fn encode(&self, buf: &mut Vec<u8>, last: bool) {
        let bytes = self.callsign.as_bytes();
        for i in 0..6 {
            let c = bytes.get(i).copied().unwrap_or(b' ');
            buf.push(c << 1);
        }
        // Reserved bits set, command/response bits clear (v2.0 style).
        let mut ssid_octet = 0x60 | (self.ssid << 1);
        if last {
            ssid_octet |= 0x01;
        }
        buf.push(ssid_octet);
    }

    /// Decode a seven-byte address; returns the address and whether the
    /// extension bit ended the address field.
    fn decode(buf: &[u8]) -> Result<(Self, bool), FrameError> {
        let mut callsign = String::with_capacity(6);
        for &b in &buf[..6] {
            let c = (b >> 1) as char;
            if c == ' ' {
                break;
            }
            callsign.push(c);
        }
        let ssid = (buf[6] >> 1) & 0x0F;
        let last = buf[6] & 0x01 != 0;
        let address = Self::new(&callsign, ssid)?;
        Ok((address, last))
    }
}

impl FromStr for Address {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, FrameError> {
        match s.split_once('-') {
            Some((callsign, ssid)) => {
                let ssid = ssid
                    .parse::<u8>()
                    .map_err(|_| FrameError::InvalidCallsign(s.to_string()))?;
                Self::new(callsign, ssid)
            }
            None => Self::new(s, 0),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid == 0 {
            f.write_str(&self.callsign)
        } else {
            write!(f, "{}-{}", self.callsign, self.ssid)
        }
    }
}

/// The unnumbered frame kinds this codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Unnumbered information.
    Ui,
    /// Connection request.
    Sabm,
    /// Disconnect request.
    Disc,
    /// Disconnected mode.
    Dm,
    /// Unnumbered acknowledge.
    Ua,
    /// Test request/response.
    Test,
}

impl FrameKind {
    fn opcode(self) -> u8 {
        match self {
            FrameKind::Ui => 0x03,
            FrameKind::Sabm => 0x2F,
            FrameKind::Disc => 0x43,
            FrameKind::Dm => 0x0F,
            FrameKind::Ua => 0x63,
            FrameKind::Test => 0xE3,
        }
    }

    fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            0x03 => Some(FrameKind::Ui),
            0x2F => Some(FrameKind::Sabm),
            0x43 => Some(FrameKind::Disc),
            0x0F => Some(FrameKind::Dm),
            0x63 => Some(FrameKind::Ua),
            0xE3 => Some(FrameKind::Test),
            _ => None,
        }
    }

    /// Whether frames of this kind carry a PID and information field.
    pub fn has_info(self) -> bool {
        matches!(self, FrameKind::Ui | FrameKind::Test)
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FrameKind::Ui => "UI",
            FrameKind::Sabm => "SABM",
            FrameKind::Disc => "DISC",
            FrameKind::Dm => "DM",
            FrameKind::Ua => "UA",
            FrameKind::Test => "TEST",
        })
    }
}

/// Control descriptor: a frame kind plus the poll/final flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// Frame kind.
    pub kind: FrameKind,
    /// Poll (command) or final (response) flag.
    pub poll_final: bool,
}

impl Control {
    /// Build a control descriptor.
    pub fn new(kind: FrameKind, poll_final: bool) -> Self {
        Self { kind, poll_final }
    }

    /// Encode as a control octet.
    pub fn encode(self) -> u8 {
        let mut octet = self.kind.opcode();
        if self.poll_final {
            octet |= POLL_FINAL;
        }
        octet
    }

    /// Decode a control octet.
    pub fn decode(octet: u8) -> Result<Self, FrameError> {
        let kind = FrameKind::from_opcode(octet & !POLL_FINAL)
            .ok_or(FrameError::UnsupportedControl(octet))?;
        Ok(Self {
            kind,
            poll_final: octet & POLL_FINAL != 0,
        })
    }
}

/// A single AX.25 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Destination address.
    pub dst: Address,
    /// Source address.
    pub src: Address,
    /// Digipeater path, outermost first.
    pub via: Vec<Address>,
    /// Control descriptor.
    pub control: Control,
    /// Protocol ID. On the wire only for kinds with an information field.
    pub pid: u8,
    /// Information field.
    pub info: Vec<u8>,
}

impl Frame {
    /// Build a frame with no digipeater path.
    pub fn new(dst: Address, src: Address, control: Control, pid: u8, info: Vec<u8>) -> Self {
        Self {
            dst,
            src,
            via: Vec::new(),
            control,
            pid,
            info,
        }
    }

    /// The information field decoded as text, undecodable bytes replaced.
    pub fn info_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.info)
    }

    /// Encode the frame for transmission.
    pub fn pack(&self) -> Vec<u8> {
        let mut buf =
            Vec::with_capacity(ADDR_LEN * (2 + self.via.len()) + 2 + self.info.len());
        self.dst.encode(&mut buf, false);
        self.src.encode(&mut buf, self.via.is_empty());
        for (i, digi) in self.via.iter().enumerate() {
            digi.encode(&mut buf, i + 1 == self.via.len());
        }
        buf.push(self.control.encode());
        if self.control.kind.has_info() {
            buf.push(self.pid);
            buf.extend_from_slice(&self.info);
        }
        buf
    }

    /// Decode a received buffer.
    pub fn unpack(buf: &[u8]) -> Result<Self, FrameError> {
        let mut addresses = Vec::new();
        let mut offset = 0;
        loop {
            let Some(chunk) = buf.get(offset..offset + ADDR_LEN) else {
                return Err(FrameError::Truncated(buf.len()));
            };
            let (address, last) = Address::decode(chunk)?;
            addresses.push(address);
            offset += ADDR_LEN;
            if last {
                break;
            }
            if addresses.len() == 2 + MAX_DIGIPEATERS {
                return Err(FrameError::TooManyDigipeaters);
            }
        }
        if addresses.len() < 2 {
            return Err(FrameError::BadAddressField);
        }
        let via = addresses.split_off(2);
        let src = addresses.pop().ok_or(FrameError::BadAddressField)?;
        let dst = addresses.pop().ok_or(FrameError::BadAddressField)?;

        let control_octet = buf
            .get(offset)
            .copied()
            .ok_or(FrameError::Truncated(buf.len()))?;
        let control = Control::decode(control_octet)?;
        offset += 1;

        let (pid, info) = if control.kind.has_info() {
            let pid = buf
                .get(offset)
                .copied()
                .ok_or(FrameError::Truncated(buf.len()))?;
            (pid, buf[offset + 1..].to_vec())
        } else {
            if offset != buf.len() {
                return Err(FrameError::TrailingBytes(buf.len() - offset));
            }
            (UNPROTO_PID, Vec::new())
        };

        Ok(Self {
            dst,
            src,
            via,
            control,
            pid,
            info,
        })
    }
}

impl fmt::Display for Frame {
    /// TNC2-style monitor format: `SRC>DST,DIGI <KIND P>:payload`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.src, self.dst)?;
        for digi in &self.via {
            write!(f, ",{digi}")?;
        }
        let pf = if self.control.poll_final { 'P' } else { 'F' };
        write!(f, " <{} {pf}>", self.control.kind)?;
        if !self.info.is_empty() {
            write!(f, ":{}", self.info_text())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().expect("test address")
    }

    #[test]
    fn test_address_parse_and_display() {
        let plain = addr("n2bp");
        assert_eq!(plain.callsign(), "N2BP");
        assert_eq!(plain.ssid(), 0);
        assert_eq!(plain.to_string(), "N2BP");

        let with_ssid = addr("N2BP-7");
        assert_eq!(with_ssid.ssid(), 7);
        assert_eq!(with_ssid.to_string(), "N2BP-7");
    }

    #[test]
    fn test_address_rejects_bad_input() {
        assert!(matches!(
            "TOOLONG1".parse::<Address>(),
            Err(FrameError::InvalidCallsign(_))
        ));
        assert!(matches!(
            "".parse::<Address>(),
            Err(FrameError::InvalidCallsign(_))
        ));
        assert!(matches!(
            "N2/BP".parse::<Address>(),
            Err(FrameError::InvalidCallsign(_))
        ));
        assert!(matches!(
            "N2BP-16".parse::<Address>(),
            Err(FrameError::InvalidSsid(16))
        ));
        assert!(matches!(
            "N2BP-x".parse::<Address>(),
            Err(FrameError::InvalidCallsign(_))
        ));
    }

    #[test]
    fn test_control_octets() {
        assert_eq!(Control::new(FrameKind::Ui, false).encode(), 0x03);
        assert_eq!(Control::new(FrameKind::Ui, true).encode(), 0x13);
        assert_eq!(Control::new(FrameKind::Sabm, true).encode(), 0x3F);
        assert_eq!(Control::new(FrameKind::Ua, false).encode(), 0x63);
        assert_eq!(Control::new(FrameKind::Test, true).encode(), 0xF3);

        let decoded = Control::decode(0xF3).expect("TEST with P set");
        assert_eq!(decoded, Control::new(FrameKind::Test, true));
    }

    #[test]
    fn test_control_rejects_s_frames() {
        // RR with any sequence bits is not an unnumbered frame.
        assert!(matches!(
            Control::decode(0x01),
            Err(FrameError::UnsupportedControl(0x01))
        ));
    }

    #[test]
    fn test_pack_known_bytes() {
        let frame = Frame::new(
            addr("CQ"),
            addr("N2BP-7"),
            Control::new(FrameKind::Ui, true),
            UNPROTO_PID,
            b"HI".to_vec(),
        );
        assert_eq!(
            frame.pack(),
            vec![
                // CQ, four pad spaces, SSID 0
                0x86, 0xA2, 0x40, 0x40, 0x40, 0x40, 0x60,
                // N2BP-7, extension bit set
                0x9C, 0x64, 0x84, 0xA0, 0x40, 0x40, 0x6F,
                // UI with P, PID, payload
                0x13, 0xF0, b'H', b'I',
            ]
        );
    }

    #[test]
    fn test_roundtrip_with_digipeaters() {
        let mut frame = Frame::new(
            addr("N1ABC"),
            addr("N2BP-7"),
            Control::new(FrameKind::Ui, true),
            UNPROTO_PID,
            b"hello".to_vec(),
        );
        frame.via = vec![addr("WIDE1-1"), addr("WIDE2-2")];

        let unpacked = Frame::unpack(&frame.pack()).expect("roundtrip");
        assert_eq!(unpacked, frame);
    }

    #[test]
    fn test_roundtrip_without_info_field() {
        let frame = Frame::new(
            addr("N1ABC"),
            addr("N2BP"),
            Control::new(FrameKind::Sabm, true),
            UNPROTO_PID,
            Vec::new(),
        );
        let packed = frame.pack();
        // Address field, control octet, nothing else.
        assert_eq!(packed.len(), 15);
        assert_eq!(Frame::unpack(&packed).expect("roundtrip"), frame);
    }

    #[test]
    fn test_unpack_truncated() {
        let frame = Frame::new(
            addr("N1ABC"),
            addr("N2BP"),
            Control::new(FrameKind::Ui, false),
            UNPROTO_PID,
            b"x".to_vec(),
        );
        let packed = frame.pack();
        for len in 0..15 {
            assert!(
                matches!(Frame::unpack(&packed[..len]), Err(FrameError::Truncated(_))),
                "no error at {len} bytes"
            );
        }
        // Ends right after a UI control octet: the PID is missing.
        assert!(matches!(
            Frame::unpack(&packed[..15]),
            Err(FrameError::Truncated(15))
        ));
    }

    #[test]
    fn test_unpack_rejects_payload_on_ua() {
        let mut packed = Frame::new(
            addr("N1ABC"),
            addr("N2BP"),
            Control::new(FrameKind::Ua, false),
            UNPROTO_PID,
            Vec::new(),
        )
        .pack();
        packed.extend_from_slice(b"junk");
        assert!(matches!(
            Frame::unpack(&packed),
            Err(FrameError::TrailingBytes(4))
        ));
    }

    #[test]
    fn test_unpack_rejects_runaway_address_field() {
        let mut frame = Frame::new(
            addr("N1ABC"),
            addr("N2BP"),
            Control::new(FrameKind::Ui, false),
            UNPROTO_PID,
            Vec::new(),
        );
        frame.via = vec![addr("WIDE1"); MAX_DIGIPEATERS + 1];
        assert!(matches!(
            Frame::unpack(&frame.pack()),
            Err(FrameError::TooManyDigipeaters)
        ));
    }

    #[test]
    fn test_monitor_format() {
        let mut frame = Frame::new(
            addr("CQ"),
            addr("N2BP-7"),
            Control::new(FrameKind::Ui, true),
            UNPROTO_PID,
            b"hello".to_vec(),
        );
        frame.via = vec![addr("WIDE1-1")];
        assert_eq!(frame.to_string(), "N2BP-7>CQ,WIDE1-1 <UI P>:hello");

        let ua = Frame::new(
            addr("N2BP"),
            addr("N1ABC"),
            Control::new(FrameKind::Ua, false),
            UNPROTO_PID,
            Vec::new(),
        );
        assert_eq!(ua.to_string(), "N1ABC>N2BP <UA F>");
    }

    #[test]
    fn test_info_text_replaces_bad_utf8() {
        let frame = Frame::new(
            addr("N1ABC"),
            addr("N2BP"),
            Control::new(FrameKind::Ui, true),
            UNPROTO_PID,
            vec![b'R', 0xFF, b'M'],
        );
        assert_eq!(frame.info_text(), "R\u{FFFD}M");
    }
}
