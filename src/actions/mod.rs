//! The concrete stack actions.
//!
//! Logger, TestResponder, ModeNegotiator, and ConnectionResponder are
//! permanent: the engine installs them at construction and they never
//! resign. TemporaryMode is transient: ModeNegotiator has the engine
//! install one per accepted request, and it removes itself when its
//! inactivity timeout runs out.

mod connection_responder;
mod logger;
mod mode_negotiator;
mod temporary_mode;
mod test_responder;

pub use connection_responder::ConnectionResponder;
pub use logger::Logger;
pub use mode_negotiator::ModeNegotiator;
pub use temporary_mode::TemporaryMode;
pub use test_responder::TestResponder;
