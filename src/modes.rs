//! NinoTNC mode registry.
//!
//! Maps the symbolic mode names exchanged during negotiation to the SETHW
//! hardware codes the TNC understands. The table is fixed at build time;
//! iteration order is preference order and is part of the help text and of
//! remote request validation, so it must stay stable.

/// A named modem configuration with its SETHW hardware code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    /// Wire-visible mode identifier.
    pub name: &'static str,
    /// SETHW code selecting this mode.
    pub hw_code: u8,
}

/// Modes available as of NinoTNC v3.41, ordered from most to least
/// preferred.
pub const MODES: &[Mode] = &[
    Mode { name: "19.2K-C4FSK-IL2Pc", hw_code: 0b0001 },
    Mode { name: "9600-C4SK-IL2Pc", hw_code: 0b0011 },
    Mode { name: "9600-GFSK-IL2Pc", hw_code: 0b0010 },
    Mode { name: "9600-GFSK-AX.25", hw_code: 0b0000 },
    Mode { name: "4800-GFSK-IL2Pc", hw_code: 0b0100 },
    Mode { name: "3600-AQPSK-IL2Pc", hw_code: 0b0101 },
    Mode { name: "2400-QPSK-IL2Pc", hw_code: 0b1011 },
    Mode { name: "1200-BPSK-ILP2Pc", hw_code: 0b1010 },
    Mode { name: "1200-AFSK-AX.25", hw_code: 0b0110 },
    Mode { name: "600-QPSK-IL2Pc", hw_code: 0b1001 },
    Mode { name: "300-BPSK-IP2Pc", hw_code: 0b1000 },
    Mode { name: "300-AFSK-IL2Pc", hw_code: 0b1110 },
    Mode { name: "300-AFSK-AX.25", hw_code: 0b1100 },
];

/// The mode restored when a temporary mode expires.
pub const DEFAULT_MODE: &str = "1200-AFSK-AX.25";

/// Added to a hardware code to select the mode without persisting it
/// across a TNC restart (SETHW codes 16-31).
pub const TEMPORARY_SET_OFFSET: u8 = 16;

/// Look up a mode by name.
pub fn lookup(name: &str) -> Option<&'static Mode> {
    MODES.iter().find(|mode| mode.name == name)
}

/// All known mode names in preference order.
pub fn names() -> impl Iterator<Item = &'static str> {
    MODES.iter().map(|mode| mode.name)
}
