//! Traffic logging.

use crate::ax25::Frame;
use crate::error::Result;
use crate::net::{NetCore, Notification, StackAction};

/// Reports every received frame to the application and passes it on
/// unchanged.
#[derive(Debug, Default)]
pub struct Logger;

impl Logger {
    pub fn new() -> Self {
        Self
    }
}

impl StackAction for Logger {
    fn frame_received(&mut self, net: &mut NetCore, frame: &Frame) -> Result<bool> {
        net.notify(Notification::Traffic(frame.clone()));
        Ok(true)
    }

    fn second_passed(&mut self, _net: &mut NetCore) -> Result<bool> {
        Ok(true)
    }

    fn describe(&self) -> String {
        "Logger".to_string()
    }
}
