//! Game Boy emulation entrypoint and associated functions and structures.
//!
//! Most of the meaningful publicly available functions and structures to build
//! a working emulator should be present here.
//!
//! # Examples
//!
//! Creates a simple [`GameBoy`] instance, loads an empty cartridge and runs
//! a couple of frames worth of emulation.
//!
//! ```rust
//! use grayboy::gb::GameBoy;
//! let mut game_boy = GameBoy::new();
//! game_boy.boot();
//! game_boy.load_rom_empty().unwrap();
//! let cycles = game_boy.tick(0.05);
//! println!("Ran {} cycles", cycles);
//! ```

use std::fmt::{self, Display, Formatter};

use grayboy_common::{error::Error, util::read_file};

use crate::{
    apu::Apu,
    cpu::Cpu,
    devices::callback::CallbackDevice,
    dma::Dma,
    info::Info,
    mmu::{Mmu, BOOT_SIZE},
    pad::{Pad, PadKey, PadState},
    ppu::{Ppu, PpuMode, FRAME_BUFFER_SIZE},
    rom::Cartridge,
    serial::{Serial, SerialDevice},
    timer::Timer,
    warnln,
};

/// Snapshot of the main registers of the system, to be
/// used mostly for debugging purposes.
pub struct Registers {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub scy: u8,
    pub scx: u8,
    pub wy: u8,
    pub wx: u8,
    pub ly: u8,
    pub lyc: u8,
}

/// Top level structure that abstracts the usage of the
/// Game Boy system under the Grayboy emulator.
///
/// Should serve as the main entry-point API.
pub struct GameBoy {
    /// Reference to the Game Boy CPU component to be
    /// used as the main element of the system, when
    /// clocked it drives every other component through
    /// the machine cycle heartbeat of the MMU.
    cpu: Cpu,

    /// The cycle target of the wall-clock driven [`GameBoy::tick`]
    /// operation, frozen while the CPU is stopped.
    target_cycles: u64,

    /// Whether the cartridge wrote to its (battery backed) RAM
    /// during the last tick, to be consumed by the host to
    /// schedule asynchronous save operations.
    cart_wrote_ram: bool,
}

impl GameBoy {
    /// The logic frequency of the Game Boy CPU in Hz.
    pub const CPU_FREQ: u32 = 4194304;

    /// The visual frequency (refresh rate) of the Game Boy,
    /// close to 60 Hz.
    pub const VISUAL_FREQ: f32 = 59.7275;

    /// The cycles taken to run a complete frame loop in the
    /// Game Boy's PPU (in clock cycles).
    pub const LCD_CYCLES: u32 = 70224;

    /// Maximum number of cycles a single [`GameBoy::tick`] call is
    /// allowed to consume, absorbs host stalls (one emulated second).
    pub const MAX_TICK_CYCLES: u64 = Self::CPU_FREQ as u64;

    pub fn new() -> Self {
        let mmu = Mmu::new(
            Ppu::default(),
            Apu::default(),
            Dma::default(),
            Pad::default(),
            Timer::default(),
            Serial::default(),
        );
        let cpu = Cpu::new(mmu);

        Self {
            cpu,
            target_cycles: 0,
            cart_wrote_ram: false,
        }
    }

    pub fn reset(&mut self) {
        self.ppu().reset();
        self.apu().reset();
        self.timer().reset();
        self.serial().reset();
        self.pad().reset();
        self.dma().reset();
        self.mmu().reset();
        self.cpu.reset();
        self.target_cycles = 0;
        self.cart_wrote_ram = false;
    }

    /// Direct boot method that immediately jumps the machine
    /// to the post boot state, this will effectively skip the
    /// boot sequence and jump to the cartridge execution.
    pub fn boot(&mut self) {
        self.cpu.boot();
    }

    /// Advances the system by the provided amount of wall-clock
    /// seconds, converting it into a clock cycle budget and running
    /// the CPU until the budget is exhausted.
    ///
    /// While the CPU is in the STOP state the budget is frozen and
    /// only a pressed joypad key resumes execution. The cartridge
    /// wall-clock (RTC) always advances.
    ///
    /// Returns the number of clock cycles effectively run.
    pub fn tick(&mut self, dt: f64) -> u64 {
        // the STOP state is exited when any button is pressed
        if self.cpu.stopped() && self.pad_i().any_pressed() {
            self.cpu.resume();
        }

        let start_cycles = self.cpu.mmu_i().cycles();

        if self.should_step_cpu() {
            let budget = (dt.max(0.0) * Self::CPU_FREQ as f64).round() as u64;
            self.target_cycles = self
                .target_cycles
                .max(start_cycles)
                .saturating_add(budget)
                .min(start_cycles + Self::MAX_TICK_CYCLES);

            while self.cpu.mmu_i().cycles() < self.target_cycles && !self.cpu.stopped() {
                self.cpu.clock();
            }
        }

        // a stopped CPU freezes the clock target so that no time
        // debt accumulates while the system is suspended
        if self.cpu.stopped() {
            self.target_cycles = self.cpu.mmu_i().cycles();
        }

        self.cart_wrote_ram = self.rom().take_wrote_ram();
        self.rom().tick(dt);

        self.cpu.mmu_i().cycles().wrapping_sub(start_cycles)
    }

    /// Advances the system by one CPU step (one instruction or one
    /// interrupt dispatch), returning the cycles consumed.
    pub fn clock(&mut self) -> u16 {
        self.cpu.clock()
    }

    /// Advances every component (except the CPU) by exactly one
    /// machine cycle (4 clocks), without any bus access.
    pub fn machine_cycle(&mut self) {
        self.mmu().machine_cycle();
    }

    /// Clocks the emulator until the limit of cycles that has been
    /// provided and returns the number of cycles that have been
    /// run.
    pub fn clocks_cycles(&mut self, limit: u64) -> u64 {
        let mut cycles = 0u64;
        while cycles < limit {
            cycles += self.clock() as u64;
        }
        cycles
    }

    /// Runs the system until the start of the next frame (V-Blank
    /// boundary), returning the number of cycles consumed.
    pub fn next_frame(&mut self) -> u32 {
        let mut cycles = 0u32;
        let current_frame = self.ppu_frame();
        while self.ppu_frame() == current_frame {
            cycles += self.clock() as u32;
        }
        cycles
    }

    /// Runs the system until the PC (Program Counter) reaches the
    /// provided address.
    pub fn step_to(&mut self, addr: u16) -> u32 {
        let mut cycles = 0u32;
        while self.cpu_i().pc() != addr {
            cycles += self.clock() as u32;
        }
        cycles
    }

    pub fn key_press(&mut self, key: PadKey) {
        self.pad().key_press(key);
    }

    pub fn key_lift(&mut self, key: PadKey) {
        self.pad().key_lift(key);
    }

    /// Records the set of currently pressed joypad buttons, the
    /// joypad interrupt is raised by the next machine cycle when a
    /// selected line observes a high-to-low transition.
    pub fn set_joypad_state(&mut self, state: PadState) {
        self.pad().set_state(state);
    }

    /// Installs the function invoked when an internal-clock serial
    /// transfer completes, receiving the transferred byte and
    /// returning the byte shifted in from the other end.
    pub fn set_serial_callback(&mut self, callback: Box<dyn FnMut(u8) -> u8 + Send>) {
        self.attach_serial(Box::new(CallbackDevice::new(callback)));
    }

    pub fn attach_serial(&mut self, device: Box<dyn SerialDevice>) {
        self.serial().set_device(device);
    }

    pub fn ppu_ly(&self) -> u8 {
        self.ppu_i().ly()
    }

    pub fn ppu_mode(&self) -> PpuMode {
        self.ppu_i().mode()
    }

    pub fn ppu_frame(&self) -> u64 {
        self.ppu_i().frame_index()
    }

    /// Obtains the frame buffer of the last fully rendered frame,
    /// every pixel is one of the four monochrome shades (0 to 3).
    ///
    /// An embedding host reading this buffer from another thread
    /// should snapshot [`GameBoy::frame_index`] before and after the
    /// copy to detect tears.
    pub fn frame_buffer(&self) -> &[u8; FRAME_BUFFER_SIZE] {
        self.ppu_i().frame_buffer()
    }

    pub fn frame_index(&self) -> u64 {
        self.ppu_i().frame_index()
    }

    /// Drains queued stereo audio samples into the provided left
    /// and right buffers, returning the number of samples written.
    pub fn consume_audio(&mut self, left: &mut [i16], right: &mut [i16]) -> usize {
        self.apu().consume_audio(left, right)
    }

    pub fn audio_sampling_rate(&self) -> u32 {
        self.apu_i().sampling_rate()
    }

    pub fn set_audio_sampling_rate(&mut self, value: u32) {
        self.apu().set_sampling_rate(value);
    }

    pub fn set_audio_enabled(&mut self, value: bool) {
        self.apu().set_sampling_enabled(value);
    }

    /// Serializes the battery backed state of the current cartridge
    /// (RAM banks plus RTC for MBC3), an empty vector is returned
    /// when no cartridge is loaded.
    pub fn save_cart_ram(&self) -> Vec<u8> {
        match self.rom_i().save_ram() {
            Ok(data) => data,
            Err(err) => {
                warnln!("Failed to save cartridge RAM: {}", err);
                vec![]
            }
        }
    }

    /// Restores battery backed cartridge state produced by
    /// [`GameBoy::save_cart_ram`], returning whether the data was
    /// accepted.
    pub fn load_cart_ram(&mut self, data: &[u8]) -> bool {
        match self.rom().load_ram(data) {
            Ok(()) => true,
            Err(err) => {
                warnln!("Failed to load cartridge RAM: {}", err);
                false
            }
        }
    }

    /// The title of the currently loaded cartridge, as stored in
    /// its header.
    pub fn title(&self) -> String {
        self.rom_i().title()
    }

    /// Whether the cartridge wrote to its RAM during the last
    /// [`GameBoy::tick`] call.
    pub fn cart_wrote_ram(&self) -> bool {
        self.cart_wrote_ram
    }

    pub fn registers(&self) -> Registers {
        let ppu_registers = self.ppu_i().registers();
        Registers {
            pc: self.cpu.pc,
            sp: self.cpu.sp,
            a: self.cpu.a,
            b: self.cpu.b,
            c: self.cpu.c,
            d: self.cpu.d,
            e: self.cpu.e,
            h: self.cpu.h,
            l: self.cpu.l,
            scy: ppu_registers.scy,
            scx: ppu_registers.scx,
            wy: ppu_registers.wy,
            wx: ppu_registers.wx,
            ly: ppu_registers.ly,
            lyc: ppu_registers.lyc,
        }
    }

    pub fn description(&self, column_length: usize) -> String {
        let version_l = format!("{:width$}", "Version", width = column_length);
        let clock_l = format!("{:width$}", "Clock", width = column_length);
        let serial_l = format!("{:width$}", "Serial", width = column_length);
        format!(
            "{}  {}\n{}  {:.02} MHz\n{}  {}",
            version_l,
            Info::version(),
            clock_l,
            Self::CPU_FREQ as f32 / 1000.0 / 1000.0,
            serial_l,
            self.serial_i().device().description(),
        )
    }

    pub fn description_debug(&self) -> String {
        format!(
            "{}\nCPU:\n{}\nDMA:\n{}",
            self.description(12),
            self.cpu_i().description_default(),
            self.dma_i().description()
        )
    }

    fn should_step_cpu(&self) -> bool {
        self.has_program() && !self.cpu.stopped()
    }
}

/// Game Boy implementations that are meant with performance
/// in mind, direct access to the internal components.
impl GameBoy {
    pub fn cpu(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn cpu_i(&self) -> &Cpu {
        &self.cpu
    }

    pub fn mmu(&mut self) -> &mut Mmu {
        self.cpu.mmu()
    }

    pub fn mmu_i(&self) -> &Mmu {
        self.cpu.mmu_i()
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        self.cpu.mmu().ppu()
    }

    pub fn ppu_i(&self) -> &Ppu {
        self.cpu.mmu_i().ppu_i()
    }

    pub fn apu(&mut self) -> &mut Apu {
        self.cpu.mmu().apu()
    }

    pub fn apu_i(&self) -> &Apu {
        self.cpu.mmu_i().apu_i()
    }

    pub fn dma(&mut self) -> &mut Dma {
        self.cpu.mmu().dma()
    }

    pub fn dma_i(&self) -> &Dma {
        self.cpu.mmu_i().dma_i()
    }

    pub fn pad(&mut self) -> &mut Pad {
        self.cpu.mmu().pad()
    }

    pub fn pad_i(&self) -> &Pad {
        self.cpu.mmu_i().pad_i()
    }

    pub fn timer(&mut self) -> &mut Timer {
        self.cpu.mmu().timer()
    }

    pub fn timer_i(&self) -> &Timer {
        self.cpu.mmu_i().timer_i()
    }

    pub fn serial(&mut self) -> &mut Serial {
        self.cpu.mmu().serial()
    }

    pub fn serial_i(&self) -> &Serial {
        self.cpu.mmu_i().serial_i()
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        self.cpu.mmu().rom()
    }

    pub fn rom_i(&self) -> &Cartridge {
        self.cpu.mmu_i().rom_i()
    }

    pub fn has_program(&self) -> bool {
        !self.rom_i().rom_data().is_empty() || self.mmu_i().boot_active()
    }

    /// Verifies that the provided data is a loadable cartridge
    /// image (size and header checksum validation).
    pub fn verify_rom(data: &[u8]) -> bool {
        Cartridge::from_data(data).is_ok()
    }

    /// Installs an optional 256 byte bootstrap image, execution
    /// restarts at address 0x0000 with the overlay active.
    pub fn set_bootstrap(&mut self, data: &[u8; BOOT_SIZE]) {
        self.mmu().write_boot(data);
        self.cpu.set_pc(0x0000);
    }

    pub fn set_cartridge(&mut self, rom: Cartridge) -> &mut Cartridge {
        self.mmu().set_rom(rom);
        self.rom()
    }

    pub fn load_rom(&mut self, data: &[u8]) -> Result<&mut Cartridge, Error> {
        let rom = Cartridge::from_data(data)?;
        Ok(self.set_cartridge(rom))
    }

    pub fn load_rom_file(&mut self, path: &str) -> Result<&mut Cartridge, Error> {
        let data = read_file(path)?;
        self.load_rom(&data)
    }

    /// Loads a zero filled (but checksum valid) cartridge image,
    /// useful for testing the system without a real ROM.
    pub fn load_rom_empty(&mut self) -> Result<&mut Cartridge, Error> {
        let mut data = vec![0u8; 32 * 1024];
        let mut checksum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            checksum = checksum.wrapping_sub(*byte).wrapping_sub(1);
        }
        data[0x014d] = checksum;
        self.load_rom(&data)
    }

    /// Reads a byte from the bus without any clock side effects,
    /// to be used for debugging purposes.
    pub fn read_memory(&self, addr: u16) -> u8 {
        self.mmu_i().read_direct(addr)
    }

    /// Writes a byte to the bus without any clock side effects,
    /// to be used for debugging purposes.
    pub fn write_memory(&mut self, addr: u16, value: u8) {
        self.mmu().write_direct(addr, value);
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameBoy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

#[cfg(test)]
mod tests {
    use crate::pad::PadState;

    use super::GameBoy;

    fn build_gb() -> GameBoy {
        let mut gb = GameBoy::new();
        gb.boot();
        gb.load_rom_empty().unwrap();
        gb
    }

    #[test]
    fn test_tick_budget() {
        let mut gb = build_gb();
        let cycles = gb.tick(0.01);

        // the budget is honored with sub-instruction precision
        let target = (0.01 * GameBoy::CPU_FREQ as f64).round() as u64;
        assert!(cycles >= target);
        assert!(cycles < target + 24);
    }

    #[test]
    fn test_tick_cap() {
        let mut gb = build_gb();
        let cycles = gb.tick(30.0);
        assert!(cycles <= GameBoy::MAX_TICK_CYCLES + 24);
    }

    #[test]
    fn test_frame_generation() {
        let mut gb = build_gb();
        // LCD is enabled by the boot state, one frame is 70224 cycles
        gb.clocks_cycles(GameBoy::LCD_CYCLES as u64 * 2);
        assert!(gb.frame_index() >= 2);
        assert!(gb.frame_buffer().iter().all(|shade| *shade <= 3));
    }

    #[test]
    fn test_div_counter_rate() {
        let mut gb = build_gb();
        gb.write_memory(0xff04, 0x00);
        let start = gb.timer_i().counter();
        assert_eq!(start, 0);

        gb.clocks_cycles(256);
        assert_eq!(gb.timer_i().counter(), 256);
        assert_eq!(gb.read_memory(0xff04), 1);
    }

    #[test]
    fn test_timer_falling_edge_rate() {
        let mut gb = build_gb();
        // TAC enabled with the 16 clock period, then DIV reset
        gb.write_memory(0xff07, 0b101);
        gb.write_memory(0xff05, 0x00);
        gb.write_memory(0xff04, 0x00);

        // 64 machine cycles (256 clocks) equal 16 TIMA increments
        gb.clocks_cycles(256);
        assert_eq!(gb.read_memory(0xff05), 16);
    }

    #[test]
    fn test_stop_freezes_until_key() {
        let mut gb = build_gb();

        // places a STOP instruction in RAM and runs it
        gb.write_memory(0xc000, 0x10);
        gb.write_memory(0xc001, 0x00);
        gb.cpu().set_pc(0xc000);
        gb.clock();
        assert!(gb.cpu_i().stopped());

        // while stopped the tick consumes no cycles
        let cycles = gb.tick(0.01);
        assert_eq!(cycles, 0);

        // pressing any key resumes execution
        gb.set_joypad_state(PadState {
            start: true,
            ..Default::default()
        });
        let cycles = gb.tick(0.001);
        assert!(cycles > 0);
        assert!(!gb.cpu_i().stopped());
    }

    #[test]
    fn test_serial_callback() {
        use std::sync::{
            atomic::{AtomicU8, Ordering},
            Arc,
        };

        let mut gb = build_gb();
        let received = Arc::new(AtomicU8::new(0));
        let received_c = received.clone();
        gb.set_serial_callback(Box::new(move |byte| {
            received_c.store(byte, Ordering::Relaxed);
            0x99
        }));

        // writes 0x42 to SB and starts an internal clock transfer
        gb.write_memory(0xff01, 0x42);
        gb.write_memory(0xff02, 0x81);
        gb.clocks_cycles(4096 + 16);

        assert_eq!(received.load(Ordering::Relaxed), 0x42);
        assert_eq!(gb.read_memory(0xff01), 0x99);
    }

    #[test]
    fn test_title() {
        let mut gb = GameBoy::new();
        gb.boot();
        let mut data = vec![0u8; 32 * 1024];
        data[0x0134..0x0134 + 4].copy_from_slice(b"ABCD");
        let mut checksum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            checksum = checksum.wrapping_sub(*byte).wrapping_sub(1);
        }
        data[0x014d] = checksum;
        gb.load_rom(&data).unwrap();
        assert_eq!(gb.title(), "ABCD");
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let mut gb = GameBoy::new();
        let mut data = vec![0u8; 32 * 1024];
        data[0x014d] = 0x12;
        assert!(gb.load_rom(&data).is_err());
        assert!(!GameBoy::verify_rom(&data));
    }
}
