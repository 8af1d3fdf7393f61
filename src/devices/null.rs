use crate::serial::SerialDevice;

/// Device that represents a disconnected link cable, every
/// exchanged byte reads back as 0xff (line held high).
pub struct NullDevice {}

impl NullDevice {
    pub fn new() -> Self {
        Self {}
    }
}

impl SerialDevice for NullDevice {
    fn exchange(&mut self, _byte: u8) -> u8 {
        0xff
    }

    fn description(&self) -> String {
        String::from("Null")
    }

    fn state(&self) -> String {
        String::from("")
    }
}

impl Default for NullDevice {
    fn default() -> Self {
        Self::new()
    }
}
