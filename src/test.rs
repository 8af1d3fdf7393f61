//! Test harness utilities, able to drive complete test ROMs
//! through the emulator and capture their serial output.

use grayboy_common::error::Error;

use crate::{devices::buffer::BufferDevice, gb::GameBoy};

#[derive(Default)]
pub struct TestOptions {
    /// Whether the machine boots directly into the post boot
    /// state, skipping the bootstrap sequence (default true).
    pub boot: Option<bool>,
}

pub fn build_test(options: TestOptions) -> Box<GameBoy> {
    let device = Box::<BufferDevice>::default();
    let mut game_boy = Box::new(GameBoy::new());
    game_boy.attach_serial(device);
    if options.boot.unwrap_or(true) {
        game_boy.boot();
    }
    game_boy
}

pub fn run_test(
    rom_path: &str,
    max_cycles: Option<u64>,
    options: TestOptions,
) -> Result<Box<GameBoy>, Error> {
    let max_cycles = max_cycles.unwrap_or(u64::MAX);
    let mut game_boy = build_test(options);
    game_boy.load_rom_file(rom_path)?;
    game_boy.clocks_cycles(max_cycles);
    Ok(game_boy)
}

pub fn run_step_test(
    rom_path: &str,
    addr: u16,
    options: TestOptions,
) -> Result<Box<GameBoy>, Error> {
    let mut game_boy = build_test(options);
    game_boy.load_rom_file(rom_path)?;
    game_boy.step_to(addr);
    Ok(game_boy)
}

/// Runs the provided test ROM and returns the complete string
/// that was sent through the serial port, the typical way test
/// ROMs report their result.
pub fn run_serial_test(
    rom_path: &str,
    max_cycles: Option<u64>,
    options: TestOptions,
) -> Result<(String, Box<GameBoy>), Error> {
    let game_boy = run_test(rom_path, max_cycles, options)?;
    Ok((game_boy.serial_i().device().state(), game_boy))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{run_serial_test, TestOptions};

    #[test]
    fn test_blargg_cpu_instrs() {
        let rom_path = "res/roms/test/blargg/cpu/cpu_instrs.gb";
        if !Path::new(rom_path).exists() {
            return;
        }

        let (result, game_boy) = run_serial_test(
            rom_path,
            Some(300000000),
            TestOptions::default(),
        )
        .unwrap();
        assert!(result.contains("Passed"));
        assert_eq!(game_boy.rom_i().title().as_str(), "CPU_INSTRS");
        assert!(game_boy.rom_i().valid_checksum());
    }

    #[test]
    fn test_blargg_instr_timing() {
        let rom_path = "res/roms/test/blargg/instr_timing/instr_timing.gb";
        if !Path::new(rom_path).exists() {
            return;
        }

        let (result, _game_boy) = run_serial_test(
            rom_path,
            Some(50000000),
            TestOptions::default(),
        )
        .unwrap();
        assert!(result.contains("Passed"));
    }
}
