//! Gamepad (joypad) functions and structures.

use crate::{consts::P1_ADDR, warnln};

/// Snapshot of the buttons currently held down, as provided
/// by the embedding host on every input poll.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct PadState {
    pub right: bool,
    pub left: bool,
    pub up: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub select: bool,
    pub start: bool,
}

impl PadState {
    pub fn any_pressed(&self) -> bool {
        self.right
            || self.left
            || self.up
            || self.down
            || self.a
            || self.b
            || self.select
            || self.start
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

pub struct Pad {
    state: PadState,

    /// Output port selection bits as written to P1, bit 4 selects
    /// the direction keys and bit 5 the action keys (active low).
    selection: u8,

    /// The input line values (low nibble of P1) observed on the
    /// previous machine cycle, used for high-to-low edge detection.
    last_input: u8,

    int_pad: bool,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            state: PadState::default(),
            selection: 0x30,
            last_input: 0x0f,
            int_pad: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = PadState::default();
        self.selection = 0x30;
        self.last_input = 0x0f;
        self.int_pad = false;
    }

    /// Refreshes the multiplexed input lines from the current button
    /// state, requesting the joypad interrupt whenever any selected
    /// line transitions from high to low.
    pub fn machine_cycle(&mut self) {
        let mut dpad = 0x0f;
        if self.selection & 0x10 == 0x00 {
            dpad = (if self.state.right { 0x00 } else { 0x01 })
                | (if self.state.left { 0x00 } else { 0x02 })
                | (if self.state.up { 0x00 } else { 0x04 })
                | (if self.state.down { 0x00 } else { 0x08 });
        }

        let mut action = 0x0f;
        if self.selection & 0x20 == 0x00 {
            action = (if self.state.a { 0x00 } else { 0x01 })
                | (if self.state.b { 0x00 } else { 0x02 })
                | (if self.state.select { 0x00 } else { 0x04 })
                | (if self.state.start { 0x00 } else { 0x08 });
        }

        let input = dpad & action;
        let change = input ^ self.last_input;
        if (input & change) != change {
            // at least one selected line went from high to low
            self.int_pad = true;
        }
        self.last_input = input;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            P1_ADDR => self.selection | self.last_input | 0xc0,
            _ => {
                warnln!("Reading from unknown Pad location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            P1_ADDR => self.selection = value & 0x30,
            _ => warnln!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    #[inline(always)]
    pub fn state(&self) -> PadState {
        self.state
    }

    #[inline(always)]
    pub fn set_state(&mut self, state: PadState) {
        self.state = state;
    }

    #[inline(always)]
    pub fn any_pressed(&self) -> bool {
        self.state.any_pressed()
    }

    pub fn key_press(&mut self, key: PadKey) {
        self.apply_key(key, true);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.apply_key(key, false);
    }

    #[inline(always)]
    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    #[inline(always)]
    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    #[inline(always)]
    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }

    fn apply_key(&mut self, key: PadKey, pressed: bool) {
        match key {
            PadKey::Up => self.state.up = pressed,
            PadKey::Down => self.state.down = pressed,
            PadKey::Left => self.state.left = pressed,
            PadKey::Right => self.state.right = pressed,
            PadKey::Start => self.state.start = pressed,
            PadKey::Select => self.state.select = pressed,
            PadKey::A => self.state.a = pressed,
            PadKey::B => self.state.b = pressed,
        }
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{Pad, PadKey, PadState};

    #[test]
    fn test_selection_lines() {
        let mut pad = Pad::new();
        pad.key_press(PadKey::A);
        pad.key_press(PadKey::Down);

        // selects the action keys (bit 5 low)
        pad.write(0xff00, 0x10);
        pad.machine_cycle();
        assert_eq!(pad.read(0xff00) & 0x0f, 0x0e);

        // selects the direction keys (bit 4 low)
        pad.write(0xff00, 0x20);
        pad.machine_cycle();
        assert_eq!(pad.read(0xff00) & 0x0f, 0x07);
    }

    #[test]
    fn test_interrupt_on_press() {
        let mut pad = Pad::new();
        pad.write(0xff00, 0x20);
        pad.machine_cycle();
        assert!(!pad.int_pad());

        pad.set_state(PadState {
            up: true,
            ..Default::default()
        });
        pad.machine_cycle();
        assert!(pad.int_pad());

        // releasing the key produces no further interrupt
        pad.ack_pad();
        pad.set_state(PadState::default());
        pad.machine_cycle();
        assert!(!pad.int_pad());
    }
}
