//! MMU (Memory Management Unit) functions and structures.
//!
//! Besides the memory map decode this module owns the machine cycle
//! heartbeat: every bus access performed by the CPU first advances
//! the complete system by exactly one machine cycle (4 clocks).

use crate::{
    apu::Apu,
    consts::{BOOT_ADDR, DMA_ADDR, IE_ADDR, IF_ADDR, P1_ADDR},
    dma::Dma,
    pad::Pad,
    panic_gb,
    ppu::Ppu,
    rom::Cartridge,
    serial::Serial,
    timer::Timer,
    warnln,
};

pub const BOOT_SIZE: usize = 256;
pub const RAM_SIZE: usize = 8192;
pub const HRAM_SIZE: usize = 127;

pub struct Mmu {
    /// Register that controls the interrupts that are considered
    /// to be enabled and should be triggered.
    ie: u8,

    /// The IF register was written during the current machine cycle,
    /// overriding a pending (delayed) timer interrupt request.
    if_written: bool,

    /// Total number of clock cycles the system has run, incremented
    /// by 4 on every machine cycle.
    cycles: u64,

    /// Reference to the PPU (Pixel Processing Unit) that is going
    /// to be used both for VRAM reading/writing and to forward
    /// some of the access operations.
    ppu: Ppu,

    /// Reference to the APU (Audio Processing Unit) that is going
    /// to be used both for register reading/writing and to forward
    /// some of the access operations.
    apu: Apu,

    /// Reference to the DMA (Direct Memory Access) controller that
    /// copies bytes into the OAM one machine cycle at a time.
    dma: Dma,

    /// Reference to the Gamepad structure that is going to control
    /// the I/O access to this device.
    pad: Pad,

    /// The timer controller to be used as part of the I/O access
    /// that is memory mapped.
    timer: Timer,

    /// The serial data transfer controller to be used to control the
    /// link cable connection, this component is memory mapped.
    serial: Serial,

    /// The cartridge ROM that is currently loaded into the system,
    /// going to be used to access ROM and external RAM banks.
    rom: Cartridge,

    /// Flag that controls the access to the boot section in the
    /// 0x0000-0x00FF memory area, this flag should be unset after
    /// the boot sequence has been finished.
    boot_active: bool,

    /// Buffer used to store the (optional) 256 byte bootstrap image
    /// overlaid on the bottom of the address space while booting.
    boot: [u8; BOOT_SIZE],

    /// Internal work RAM of the system, mapped in 0xC000-0xDFFF
    /// and mirrored in 0xE000-0xFDFF.
    ram: [u8; RAM_SIZE],

    /// High RAM area (0xFF80-0xFFFE), the only memory the CPU can
    /// reach while an OAM DMA transfer is in flight.
    hram: [u8; HRAM_SIZE],
}

impl Mmu {
    pub fn new(ppu: Ppu, apu: Apu, dma: Dma, pad: Pad, timer: Timer, serial: Serial) -> Self {
        Self {
            ie: 0x0,
            if_written: false,
            cycles: 0,
            ppu,
            apu,
            dma,
            pad,
            timer,
            serial,
            rom: Cartridge::new(),
            boot_active: false,
            boot: [0u8; BOOT_SIZE],
            ram: [0u8; RAM_SIZE],
            hram: [0u8; HRAM_SIZE],
        }
    }

    pub fn reset(&mut self) {
        self.ie = 0x0;
        self.if_written = false;
        self.cycles = 0;
        self.rom = Cartridge::new();
        self.boot_active = false;
        self.boot = [0u8; BOOT_SIZE];
        self.ram = [0u8; RAM_SIZE];
        self.hram = [0u8; HRAM_SIZE];
    }

    /// The heartbeat of the system, advances every component by
    /// exactly one machine cycle (4 clocks) in a fixed order: DMA
    /// byte, joypad refresh, timer edge logic, serial shift, PPU
    /// dots and finally APU cycles.
    ///
    /// Interrupts raised by any of these steps become observable
    /// at the start of the next machine cycle.
    pub fn machine_cycle(&mut self) {
        self.cycles = self.cycles.wrapping_add(4);

        self.cycle_dma();

        self.pad.machine_cycle();

        let if_written = self.if_written;
        self.if_written = false;
        self.timer.machine_cycle(if_written);

        self.serial.machine_cycle();

        self.ppu.clock(4);
        self.apu.clock(4);
    }

    /// Performs a CPU visible bus read, advancing the machine by
    /// one cycle before the actual access is decoded.
    pub fn read(&mut self, addr: u16) -> u8 {
        self.machine_cycle();
        self.read_direct(addr)
    }

    /// Performs a CPU visible bus write, advancing the machine by
    /// one cycle before the actual access is decoded.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.machine_cycle();
        self.write_direct(addr, value);
    }

    /// Raw address decode without any clock side effects, used by
    /// the DMA engine and by debugger style inspection.
    pub fn read_direct(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x00FF - Bootstrap overlay (while active)
            0x0000..=0x00ff if self.boot_active => self.boot[addr as usize],

            // 0x0000-0x3FFF - ROM 0 (16 KB)
            // 0x4000-0x7FFF - ROM 1 (Banked) (16 KB)
            0x0000..=0x7fff => self.rom.read(addr),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.read(addr),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.read(addr),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize],

            // 0xE000-0xFDFF - Working RAM Shadow
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize],

            // 0xFE00-0xFE9F - Object attribute memory (OAM),
            // locked out while an OAM DMA transfer is running
            0xfe00..=0xfe9f => {
                if self.dma.in_progress() {
                    0xff
                } else {
                    self.ppu.read(addr)
                }
            }

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => 0xff,

            // 0xFF00 - Joypad input
            P1_ADDR => self.pad.read(addr),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.read(addr),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.read(addr),

            // 0xFF0F — IF: Interrupt flag
            IF_ADDR => self.if_value() | 0xe0,

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.read(addr),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.read(addr),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.dma.read(addr),

            // 0xFF50 - Boot active flag
            BOOT_ADDR => u8::from(!self.boot_active),

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.hram[(addr & 0x007f) as usize],

            // 0xFFFF — IE: Interrupt enable
            IE_ADDR => self.ie,

            addr => {
                warnln!("Reading from unknown location 0x{:04x}", addr);
                0xff
            }
        }
    }

    /// Raw address decode for writes without any clock side effects.
    pub fn write_direct(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x3FFF - ROM 0 (16 KB)
            // 0x4000-0x7FFF - ROM 1 (Banked) (16 KB)
            0x0000..=0x7fff => self.rom.write(addr, value),

            // 0x8000-0x9FFF - Graphics: VRAM (8 KB)
            0x8000..=0x9fff => self.ppu.write(addr, value),

            // 0xA000-0xBFFF - External RAM (8 KB)
            0xa000..=0xbfff => self.rom.write(addr, value),

            // 0xC000-0xDFFF - Working RAM (8 KB)
            0xc000..=0xdfff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xE000-0xFDFF - Working RAM Shadow
            0xe000..=0xfdff => self.ram[(addr & 0x1fff) as usize] = value,

            // 0xFE00-0xFE9F - Object attribute memory (OAM),
            // locked out while an OAM DMA transfer is running
            0xfe00..=0xfe9f => {
                if !self.dma.in_progress() {
                    self.ppu.write(addr, value);
                }
            }

            // 0xFEA0-0xFEFF - Not Usable
            0xfea0..=0xfeff => {}

            // 0xFF00 - Joypad input
            P1_ADDR => self.pad.write(addr, value),

            // 0xFF01-0xFF02 - Serial data transfer
            0xff01..=0xff02 => self.serial.write(addr, value),

            // 0xFF04-0xFF07 - Timer and divider
            0xff04..=0xff07 => self.timer.write(addr, value),

            // 0xFF0F — IF: Interrupt flag, writes during the timer
            // overflow delay window override the pending request
            IF_ADDR => {
                self.set_if(value);
                self.if_written = true;
            }

            // 0xFF10-0xFF26 — Audio
            // 0xFF30-0xFF3F — Wave pattern
            0xff10..=0xff26 | 0xff30..=0xff3f => self.apu.write(addr, value),

            // 0xFF40-0xFF45 - PPU registers
            // 0xFF47-0xFF4B - PPU registers
            0xff40..=0xff45 | 0xff47..=0xff4b => self.ppu.write(addr, value),

            // 0xFF46 — DMA: OAM DMA source address & start
            DMA_ADDR => self.dma.write(addr, value),

            // 0xFF50 - Boot active flag
            BOOT_ADDR => {
                if value != 0x00 {
                    self.boot_active = false;
                }
            }

            // 0xFF80-0xFFFE - High RAM (HRAM)
            0xff80..=0xfffe => self.hram[(addr & 0x007f) as usize] = value,

            // 0xFFFF — IE: Interrupt enable
            IE_ADDR => self.ie = value,

            addr => warnln!("Writing to unknown location 0x{:04x}", addr),
        }
    }

    /// Composes the (5-bit) IF value from the distributed per
    /// component interrupt request flags.
    pub fn if_value(&self) -> u8 {
        (if self.ppu.int_vblank() { 0x01 } else { 0x00 })
            | (if self.ppu.int_stat() { 0x02 } else { 0x00 })
            | (if self.timer.int_tima() { 0x04 } else { 0x00 })
            | (if self.serial.int_serial() { 0x08 } else { 0x00 })
            | (if self.pad.int_pad() { 0x10 } else { 0x00 })
    }

    /// Distributes an IF register write into the per component
    /// interrupt request flags.
    pub fn set_if(&mut self, value: u8) {
        self.ppu.set_int_vblank(value & 0x01 == 0x01);
        self.ppu.set_int_stat(value & 0x02 == 0x02);
        self.timer.set_int_tima(value & 0x04 == 0x04);
        self.serial.set_int_serial(value & 0x08 == 0x08);
        self.pad.set_int_pad(value & 0x10 == 0x10);
    }

    /// Clears the request flag of the interrupt identified by the
    /// provided IF bit, used on interrupt dispatch.
    pub fn clear_interrupt(&mut self, bit: u8) {
        match bit {
            0x01 => self.ppu.ack_vblank(),
            0x02 => self.ppu.ack_stat(),
            0x04 => self.timer.ack_tima(),
            0x08 => self.serial.ack_serial(),
            0x10 => self.pad.ack_pad(),
            bit => panic_gb!("Invalid interrupt bit 0x{:02x}", bit),
        }
    }

    /// An interrupt is pending when it is both requested (IF) and
    /// enabled (IE), regardless of the master enable flag.
    #[inline(always)]
    pub fn any_interrupt_pending(&self) -> bool {
        self.if_value() & self.ie & 0x1f != 0
    }

    #[inline(always)]
    pub fn ie(&self) -> u8 {
        self.ie
    }

    #[inline(always)]
    pub fn set_ie(&mut self, value: u8) {
        self.ie = value;
    }

    #[inline(always)]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn ppu(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    pub fn ppu_i(&self) -> &Ppu {
        &self.ppu
    }

    pub fn apu(&mut self) -> &mut Apu {
        &mut self.apu
    }

    pub fn apu_i(&self) -> &Apu {
        &self.apu
    }

    pub fn dma(&mut self) -> &mut Dma {
        &mut self.dma
    }

    pub fn dma_i(&self) -> &Dma {
        &self.dma
    }

    pub fn pad(&mut self) -> &mut Pad {
        &mut self.pad
    }

    pub fn pad_i(&self) -> &Pad {
        &self.pad
    }

    pub fn timer(&mut self) -> &mut Timer {
        &mut self.timer
    }

    pub fn timer_i(&self) -> &Timer {
        &self.timer
    }

    pub fn serial(&mut self) -> &mut Serial {
        &mut self.serial
    }

    pub fn serial_i(&self) -> &Serial {
        &self.serial
    }

    pub fn rom(&mut self) -> &mut Cartridge {
        &mut self.rom
    }

    pub fn rom_i(&self) -> &Cartridge {
        &self.rom
    }

    pub fn set_rom(&mut self, rom: Cartridge) {
        self.rom = rom;
    }

    pub fn boot_active(&self) -> bool {
        self.boot_active
    }

    pub fn set_boot_active(&mut self, value: bool) {
        self.boot_active = value;
    }

    /// Installs a bootstrap image into the boot overlay buffer,
    /// activating the overlay at the bottom of the address space.
    pub fn write_boot(&mut self, data: &[u8; BOOT_SIZE]) {
        self.boot.copy_from_slice(data);
        self.boot_active = true;
    }

    /// Steps the OAM DMA engine by one machine cycle, copying one
    /// byte while a transfer is in progress and promoting the
    /// request/pending stages afterwards.
    fn cycle_dma(&mut self) {
        if self.dma.in_progress() {
            let index = self.dma.index();
            let byte = self.read_direct(self.dma.source().wrapping_add(index as u16));
            self.ppu.write_oam_dma(index, byte);
            self.dma.advance();
        }
        self.dma.promote();
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Mmu::new(
            Ppu::default(),
            Apu::default(),
            Dma::default(),
            Pad::default(),
            Timer::default(),
            Serial::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Mmu;

    #[test]
    fn test_machine_cycle_advances_counters() {
        let mut mmu = Mmu::default();
        let div_before = mmu.timer_i().counter();

        mmu.machine_cycle();
        assert_eq!(mmu.cycles(), 4);
        assert_eq!(mmu.timer_i().counter(), div_before + 4);
    }

    #[test]
    fn test_bus_access_ticks_once() {
        let mut mmu = Mmu::default();

        mmu.write(0xc000, 0x42);
        assert_eq!(mmu.cycles(), 4);

        assert_eq!(mmu.read(0xc000), 0x42);
        assert_eq!(mmu.cycles(), 8);
    }

    #[test]
    fn test_wram_mirror() {
        let mut mmu = Mmu::default();
        mmu.write_direct(0xc123, 0x99);
        assert_eq!(mmu.read_direct(0xe123), 0x99);
    }

    #[test]
    fn test_unusable_region() {
        let mut mmu = Mmu::default();
        assert_eq!(mmu.read_direct(0xfea0), 0xff);
        assert_eq!(mmu.read_direct(0xfeff), 0xff);
    }

    #[test]
    fn test_if_composition() {
        let mut mmu = Mmu::default();
        assert_eq!(mmu.read_direct(0xff0f), 0xe0);

        mmu.timer().set_int_tima(true);
        assert_eq!(mmu.read_direct(0xff0f), 0xe4);

        mmu.write_direct(0xff0f, 0x00);
        assert!(!mmu.timer_i().int_tima());
    }

    #[test]
    fn test_dma_blocks_oam() {
        let mut mmu = Mmu::default();

        // seeds the DMA source area with recognizable values
        for index in 0..160u16 {
            mmu.write_direct(0xc000 + index, index as u8);
        }

        mmu.write_direct(0xff46, 0xc0);

        // request and setup stages, the OAM is still accessible
        mmu.machine_cycle();
        mmu.machine_cycle();

        // the transfer is now in progress, 160 machine cycles copy
        // the 160 bytes while the OAM reads as 0xFF
        for _ in 0..160 {
            assert_eq!(mmu.read_direct(0xfe00), 0xff);
            mmu.machine_cycle();
        }

        assert_eq!(mmu.read_direct(0xfe00), 0x00);
        assert_eq!(mmu.read_direct(0xfe9f), 0x9f);
    }

    #[test]
    fn test_oam_write_blocked_during_dma() {
        let mut mmu = Mmu::default();
        mmu.write_direct(0xc000, 0x11);
        mmu.write_direct(0xff46, 0xc0);
        mmu.machine_cycle();
        mmu.machine_cycle();

        // the write lands while the transfer is active and is lost
        mmu.write_direct(0xfe00, 0x77);
        for _ in 0..160 {
            mmu.machine_cycle();
        }
        assert_eq!(mmu.read_direct(0xfe00), 0x11);
    }

    #[test]
    fn test_boot_overlay() {
        let mut mmu = Mmu::default();
        let mut boot = [0u8; 256];
        boot[0x00] = 0x31;
        mmu.write_boot(&boot);

        assert!(mmu.boot_active());
        assert_eq!(mmu.read_direct(0x0000), 0x31);

        // any non-zero write to 0xFF50 disables the overlay
        mmu.write_direct(0xff50, 0x01);
        assert!(!mmu.boot_active());
        assert_eq!(mmu.read_direct(0x0000), 0xff);
    }
}
