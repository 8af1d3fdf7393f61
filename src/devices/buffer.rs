use std::fmt::{self, Display, Formatter};

use crate::serial::SerialDevice;

/// Device that accumulates every byte sent over the serial line
/// into an internal buffer, used to capture the output of test
/// ROMs that report their result over the link cable.
pub struct BufferDevice {
    buffer: Vec<u8>,
}

impl BufferDevice {
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn buffer(&self) -> &Vec<u8> {
        &self.buffer
    }
}

impl SerialDevice for BufferDevice {
    fn exchange(&mut self, byte: u8) -> u8 {
        self.buffer.push(byte);
        0xff
    }

    fn description(&self) -> String {
        String::from("Buffer")
    }

    fn state(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }
}

impl Default for BufferDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BufferDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Buffer")
    }
}
