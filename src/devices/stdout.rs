use std::io::{stdout, Write};

use crate::serial::SerialDevice;

/// Device that prints every byte sent over the serial line to
/// the standard output, useful to follow test ROM progress.
pub struct StdoutDevice {
    flush: bool,
}

impl StdoutDevice {
    pub fn new(flush: bool) -> Self {
        Self { flush }
    }
}

impl SerialDevice for StdoutDevice {
    fn exchange(&mut self, byte: u8) -> u8 {
        print!("{}", byte as char);
        if self.flush {
            stdout().flush().unwrap();
        }
        0xff
    }

    fn description(&self) -> String {
        String::from("Stdout")
    }

    fn state(&self) -> String {
        String::from("")
    }
}

impl Default for StdoutDevice {
    fn default() -> Self {
        Self::new(true)
    }
}
