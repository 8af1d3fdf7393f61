//! Cartridge (ROM) related functions and structures.

use core::fmt;
use std::{
    cmp::max,
    fmt::{Display, Formatter},
    io::Cursor,
};

use grayboy_common::{
    data::{read_i64, read_into, read_u8, write_bytes, write_i64, write_u8},
    error::Error,
    util::{read_file, timestamp},
};

use crate::{debugln, warnln};

pub const ROM_BANK_SIZE: usize = 16384;
pub const RAM_BANK_SIZE: usize = 8192;

/// Size of the (half-byte) built-in RAM of the MBC2 controller.
pub const MBC2_RAM_SIZE: usize = 512;

const HEADER_SIZE: usize = 0x0150;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MbcType {
    NoMbc = 0x00,
    Mbc1 = 0x01,
    Mbc2 = 0x02,
    Mbc3 = 0x03,
    Mbc5 = 0x04,
    Unknown = 0x05,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomType {
    RomOnly = 0x00,
    Mbc1 = 0x01,
    Mbc1Ram = 0x02,
    Mbc1RamBattery = 0x03,
    Mbc2 = 0x05,
    Mbc2Battery = 0x06,
    RomRam = 0x08,
    RomRamBattery = 0x09,
    Mmm01 = 0x0b,
    Mmm01Ram = 0x0c,
    Mmm01RamBattery = 0x0d,
    Mbc3TimerBattery = 0x0f,
    Mbc3TimerRamBattery = 0x10,
    Mbc3 = 0x11,
    Mbc3Ram = 0x12,
    Mbc3RamBattery = 0x13,
    Mbc5 = 0x19,
    Mbc5Ram = 0x1a,
    Mbc5RamBattery = 0x1b,
    Mbc5Rumble = 0x1c,
    Mbc5RumbleRam = 0x1d,
    Mbc5RumbleRamBattery = 0x1e,
    Mbc6 = 0x20,
    Mbc7SensorRumbleRamBattery = 0x22,
    PocketCamera = 0xfc,
    BandaiTama5 = 0xfd,
    HuC3 = 0xfe,
    HuC1RamBattery = 0xff,
    Unknown = 0xef,
}

impl RomType {
    pub fn description(&self) -> &'static str {
        match self {
            RomType::RomOnly => "ROM Only",
            RomType::Mbc1 => "MBC1",
            RomType::Mbc1Ram => "MBC1 + RAM",
            RomType::Mbc1RamBattery => "MBC1 + RAM + Battery",
            RomType::Mbc2 => "MBC2",
            RomType::Mbc2Battery => "MBC2 + Battery",
            RomType::RomRam => "ROM + RAM",
            RomType::RomRamBattery => "ROM + RAM + BATTERY",
            RomType::Mmm01 => "MMM01",
            RomType::Mmm01Ram => "MMM01 + RAM",
            RomType::Mmm01RamBattery => "MMM01 + RAM + BATTERY",
            RomType::Mbc3TimerBattery => "MBC3 + TIMER + BATTERY",
            RomType::Mbc3TimerRamBattery => "MBC3 + TIMER + RAM + BATTERY",
            RomType::Mbc3 => "MBC3",
            RomType::Mbc3Ram => "MBC3 + RAM",
            RomType::Mbc3RamBattery => "MBC3 + RAM + BATTERY",
            RomType::Mbc5 => "MBC5",
            RomType::Mbc5Ram => "MBC5 + RAM",
            RomType::Mbc5RamBattery => "MBC5 + RAM + BATTERY",
            RomType::Mbc5Rumble => "MBC5 + RUMBLE",
            RomType::Mbc5RumbleRam => "MBC5 + RUMBLE + RAM",
            RomType::Mbc5RumbleRamBattery => "MBC5 + RUMBLE + RAM + BATTERY",
            RomType::Mbc6 => "MBC6",
            RomType::Mbc7SensorRumbleRamBattery => "MBC7 + SENSOR + RUMBLE + RAM + BATTERY",
            RomType::PocketCamera => "POCKET CAMERA",
            RomType::BandaiTama5 => "BANDAI TAMA5",
            RomType::HuC3 => "HuC3",
            RomType::HuC1RamBattery => "HuC1 + RAM + BATTERY",
            RomType::Unknown => "Unknown",
        }
    }

    pub fn mbc_type(&self) -> MbcType {
        match self {
            RomType::RomOnly | RomType::RomRam | RomType::RomRamBattery => MbcType::NoMbc,
            RomType::Mbc1 | RomType::Mbc1Ram | RomType::Mbc1RamBattery => MbcType::Mbc1,
            RomType::Mbc2 | RomType::Mbc2Battery => MbcType::Mbc2,
            RomType::Mbc3
            | RomType::Mbc3Ram
            | RomType::Mbc3RamBattery
            | RomType::Mbc3TimerBattery
            | RomType::Mbc3TimerRamBattery => MbcType::Mbc3,
            RomType::Mbc5
            | RomType::Mbc5Ram
            | RomType::Mbc5RamBattery
            | RomType::Mbc5Rumble
            | RomType::Mbc5RumbleRam
            | RomType::Mbc5RumbleRamBattery => MbcType::Mbc5,
            _ => MbcType::Unknown,
        }
    }
}

impl Display for RomType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RomSize {
    Size32K,
    Size64K,
    Size128K,
    Size256K,
    Size512K,
    Size1M,
    Size2M,
    Size4M,
    Size8M,
    SizeUnknown,
}

impl RomSize {
    pub fn description(&self) -> &'static str {
        match self {
            RomSize::Size32K => "32 KB",
            RomSize::Size64K => "64 KB",
            RomSize::Size128K => "128 KB",
            RomSize::Size256K => "256 KB",
            RomSize::Size512K => "512 KB",
            RomSize::Size1M => "1 MB",
            RomSize::Size2M => "2 MB",
            RomSize::Size4M => "4 MB",
            RomSize::Size8M => "8 MB",
            RomSize::SizeUnknown => "Unknown",
        }
    }

    pub fn rom_banks(&self) -> u16 {
        match self {
            RomSize::Size32K => 2,
            RomSize::Size64K => 4,
            RomSize::Size128K => 8,
            RomSize::Size256K => 16,
            RomSize::Size512K => 32,
            RomSize::Size1M => 64,
            RomSize::Size2M => 128,
            RomSize::Size4M => 256,
            RomSize::Size8M => 512,
            RomSize::SizeUnknown => 0,
        }
    }
}

impl Display for RomSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RamSize {
    NoRam,
    Unused,
    Size8K,
    Size16K,
    Size32K,
    Size64K,
    Size128K,
    SizeUnknown,
}

impl RamSize {
    pub fn description(&self) -> &'static str {
        match self {
            RamSize::NoRam => "No RAM",
            RamSize::Unused => "Unused",
            RamSize::Size8K => "8 KB",
            RamSize::Size16K => "16 KB",
            RamSize::Size32K => "32 KB",
            RamSize::Size64K => "64 KB",
            RamSize::Size128K => "128 KB",
            RamSize::SizeUnknown => "Unknown",
        }
    }

    pub fn ram_banks(&self) -> u16 {
        match self {
            RamSize::NoRam => 0,
            RamSize::Unused => 0,
            RamSize::Size8K => 1,
            RamSize::Size16K => 2,
            RamSize::Size32K => 4,
            RamSize::Size64K => 8,
            RamSize::Size128K => 16,
            RamSize::SizeUnknown => 0,
        }
    }
}

impl Display for RamSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// State of the real-time clock carried by MBC3 cartridges, a day
/// counter with a halt flag and a sticky overflow carry.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Rtc {
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
    pub days_low: u8,
    pub days_msb: bool,
    pub halt: bool,
    pub days_carry: bool,
}

impl Rtc {
    pub fn days_high(&self) -> u8 {
        (if self.days_msb { 0x01 } else { 0x00 })
            | (if self.halt { 0x40 } else { 0x00 })
            | (if self.days_carry { 0x80 } else { 0x00 })
    }

    pub fn set_days_high(&mut self, value: u8) {
        self.days_msb = value & 0x01 == 0x01;
        self.halt = value & 0x40 == 0x40;
        self.days_carry = value & 0x80 == 0x80;
    }

    /// Advances the clock by the provided amount of wall-clock
    /// seconds, unless the clock is currently halted.
    pub fn advance(&mut self, dt: f64, accumulator: &mut f64) {
        if self.halt || dt < 0.0 {
            return;
        }

        *accumulator += dt;
        let elapsed = *accumulator as u64;
        *accumulator -= elapsed as f64;

        let seconds = self.seconds as u64 + elapsed;

        let minutes = self.minutes as u64 + seconds / 60;
        let seconds = seconds % 60;

        let hours = self.hours as u64 + minutes / 60;
        let minutes = minutes % 60;

        let days = self.days_low as u64 + (if self.days_msb { 0x100 } else { 0 }) + hours / 24;
        let hours = hours % 24;

        self.seconds = seconds as u8;
        self.minutes = minutes as u8;
        self.hours = hours as u8;
        self.days_low = (days % 0x100) as u8;

        let days_msb = days / 0x100;
        self.days_msb = days_msb % 2 == 1;
        // the carry bit is set on day counter overflow and stays
        // set until the program clears it
        self.days_carry = self.days_carry || days_msb > 1;
    }
}

/// Structure that defines the ROM and RAM contents of a Game Boy
/// cartridge. Should correctly address the specifics of all the
/// major MBCs (Memory Bank Controllers).
#[derive(Clone, Debug)]
pub struct Cartridge {
    /// The complete data of the ROM cartridge, should
    /// include the complete set of ROM banks.
    rom_data: Vec<u8>,

    /// The base RAM that is going to be used to store
    /// temporary data for the cartridge.
    ram_data: Vec<u8>,

    /// The MBC (Memory Bank Controller) to be used for
    /// RAM and ROM access on the current cartridge.
    mbc: &'static Mbc,

    /// The number of ROM banks (of 16KB) that are available
    /// to the current cartridge, this is a computed value
    /// to allow improved performance.
    rom_bank_count: u16,

    /// The number of RAM banks (of 8KB) that are available
    /// to the current cartridge, this is a computed value
    /// to allow improved performance.
    ram_bank_count: u16,

    /// The offset address to the ROM bank (#1) that is
    /// currently in use by the ROM cartridge.
    rom_offset: usize,

    /// The offset address to the ERAM bank that is
    /// currently in use by the ROM cartridge.
    ram_offset: usize,

    /// If the RAM access is enabled, this flag allows
    /// control of memory access to avoid corruption.
    ram_enabled: bool,

    /// Lower 5 bits of the selected ROM bank as last written to
    /// the bank select register (MBC1 only, bank-0 rewrite applied
    /// at offset computation time).
    rom_bank_lower: u8,

    /// The two-bit secondary bank register that feeds either the
    /// upper ROM bank bits or the RAM bank (MBC1 only).
    bank_upper: u8,

    /// The banking mode latch, selects whether the secondary bank
    /// register maps ROM or RAM (MBC1 only).
    ram_banking_mode: bool,

    /// The value written to the RAM bank / RTC register selection
    /// register (MBC3 only), values 0x08-0x0c select RTC registers.
    ram_rtc_select: u8,

    /// The live real-time clock state (MBC3 only).
    rtc: Rtc,

    /// Snapshot of the RTC taken by the latch sequence, reads go
    /// through this copy while latched (MBC3 only).
    rtc_latched: Option<Rtc>,

    /// The value last written to the latch register, a 0x00 to
    /// 0x01 transition toggles the latch (MBC3 only).
    rtc_latch_data: u8,

    /// Sub-second accumulator for the RTC advance (MBC3 only).
    rtc_accumulator: f64,

    /// Set whenever a write reaches cartridge RAM, consumed by the
    /// host to schedule battery saves.
    wrote_ram: bool,

    /// The final offset of the last character of the title
    /// that is considered to be non zero (0x0) so that a
    /// proper safe conversion to UTF-8 string can be done.
    title_offset: usize,

    /// The current rumble state of the cartridge, this
    /// boolean value controls if vibration is currently active.
    rumble_active: bool,

    /// Callback function to be called whenever there's a new
    /// rumble vibration triggered or when it's disabled.
    rumble_cb: fn(active: bool),
}

impl Cartridge {
    pub fn new() -> Self {
        Self {
            rom_data: vec![],
            ram_data: vec![],
            mbc: &NO_MBC,
            rom_bank_count: 0,
            ram_bank_count: 0,
            rom_offset: 0x4000,
            ram_offset: 0x0000,
            ram_enabled: false,
            rom_bank_lower: 0x01,
            bank_upper: 0x00,
            ram_banking_mode: false,
            ram_rtc_select: 0x00,
            rtc: Rtc::default(),
            rtc_latched: None,
            rtc_latch_data: 0xff,
            rtc_accumulator: 0.0,
            wrote_ram: false,
            title_offset: 0x0143,
            rumble_active: false,
            rumble_cb: |_| {},
        }
    }

    pub fn from_data(data: &[u8]) -> Result<Self, Error> {
        let mut cartridge = Cartridge::new();
        cartridge.set_data(data)?;
        Ok(cartridge)
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = read_file(path)?;
        Self::from_data(&data)
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            // 0x0000-0x7FFF: 16 KiB ROM bank 00 & 16 KiB ROM Bank 01-NN
            0x0000..=0x7fff => (self.mbc.read_rom)(self, addr),
            // 0xA000-0xBFFF: 8 KiB External RAM
            0xa000..=0xbfff => (self.mbc.read_ram)(self, addr),
            _ => {
                debugln!("Reading from unknown Cartridge location 0x{:04x}", addr);
                0xff
            }
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            // 0x0000-0x7FFF: 16 KiB ROM bank 00 & 16 KiB ROM Bank 01-NN
            0x0000..=0x7fff => (self.mbc.write_rom)(self, addr, value),
            // 0xA000-0xBFFF: 8 KiB External RAM
            0xa000..=0xbfff => (self.mbc.write_ram)(self, addr, value),
            _ => debugln!("Writing to unknown Cartridge address 0x{:04x}", addr),
        }
    }

    /// Advances the wall-clock driven parts of the cartridge (the
    /// RTC for MBC3) by the provided amount of seconds.
    pub fn tick(&mut self, dt: f64) {
        (self.mbc.tick)(self, dt);
    }

    /// Serializes the battery backed state of the cartridge, all
    /// the RAM banks in sequence plus, for MBC3, the RTC registers
    /// and the current wall-clock timestamp.
    pub fn save_ram(&self) -> Result<Vec<u8>, Error> {
        (self.mbc.save_ram)(self)
    }

    /// Restores battery backed state previously produced by
    /// [`Cartridge::save_ram`], advancing the RTC by the wall-clock
    /// time elapsed since the save was written (MBC3 only).
    pub fn load_ram(&mut self, data: &[u8]) -> Result<(), Error> {
        (self.mbc.load_ram)(self, data)
    }

    pub fn reset(&mut self) {
        *self = Cartridge::new();
    }

    pub fn data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn mbc(&self) -> Result<&'static Mbc, Error> {
        Ok(match self.rom_type().mbc_type() {
            MbcType::NoMbc => &NO_MBC,
            MbcType::Mbc1 => &MBC1,
            MbcType::Mbc2 => &MBC2,
            MbcType::Mbc3 => &MBC3,
            MbcType::Mbc5 => &MBC5,
            MbcType::Unknown => {
                return Err(Error::UnsupportedCartridgeType(self.rom_data[0x0147]))
            }
        })
    }

    pub fn has_ram(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc1Ram
                | RomType::Mbc1RamBattery
                | RomType::Mbc2
                | RomType::Mbc2Battery
                | RomType::RomRam
                | RomType::RomRamBattery
                | RomType::Mbc3TimerRamBattery
                | RomType::Mbc3Ram
                | RomType::Mbc3RamBattery
                | RomType::Mbc5Ram
                | RomType::Mbc5RamBattery
                | RomType::Mbc5RumbleRam
                | RomType::Mbc5RumbleRamBattery
        )
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc1RamBattery
                | RomType::Mbc2Battery
                | RomType::RomRamBattery
                | RomType::Mbc3TimerBattery
                | RomType::Mbc3TimerRamBattery
                | RomType::Mbc3RamBattery
                | RomType::Mbc5RamBattery
                | RomType::Mbc5RumbleRamBattery
        )
    }

    pub fn has_rtc(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc3TimerBattery | RomType::Mbc3TimerRamBattery
        )
    }

    pub fn has_rumble(&self) -> bool {
        matches!(
            self.rom_type(),
            RomType::Mbc5Rumble | RomType::Mbc5RumbleRam | RomType::Mbc5RumbleRamBattery
        )
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn set_ram_enabled(&mut self, ram_enabled: bool) {
        self.ram_enabled = ram_enabled
    }

    pub fn ram_bank(&self) -> u8 {
        (self.ram_offset / RAM_BANK_SIZE) as u8
    }

    pub fn set_ram_bank(&mut self, ram_bank: u8) {
        self.ram_offset = ram_bank as usize * RAM_BANK_SIZE;
    }

    pub fn rom_bank(&self) -> u16 {
        (self.rom_offset / ROM_BANK_SIZE) as u16
    }

    pub fn set_rom_bank(&mut self, rom_bank: u16) {
        self.rom_offset = rom_bank as usize * ROM_BANK_SIZE;
    }

    pub fn rtc(&self) -> &Rtc {
        &self.rtc
    }

    pub fn rtc_mut(&mut self) -> &mut Rtc {
        &mut self.rtc
    }

    pub fn set_rumble_cb(&mut self, rumble_cb: fn(active: bool)) {
        self.rumble_cb = rumble_cb;
    }

    pub fn trigger_rumble(&self) {
        (self.rumble_cb)(self.rumble_active);
    }

    /// Consumes the RAM dirty flag, returning whether cartridge RAM
    /// has been written to since the last call.
    pub fn take_wrote_ram(&mut self) -> bool {
        let wrote_ram = self.wrote_ram;
        self.wrote_ram = false;
        wrote_ram
    }

    fn set_data(&mut self, data: &[u8]) -> Result<(), Error> {
        Self::ensure_data(data)?;
        self.rom_data = data.to_vec();
        self.rom_offset = 0x4000;
        self.ram_offset = 0x0000;
        self.mbc = self.mbc()?;
        self.set_computed();
        self.set_title_offset();
        self.allocate_ram();
        self.set_rom_bank(1);
        self.set_ram_bank(0);
        if !self.valid_global_checksum() {
            warnln!("Cartridge global checksum mismatch (ignored)");
        }
        Ok(())
    }

    fn set_computed(&mut self) {
        self.rom_bank_count = self.rom_size().rom_banks();
        self.ram_bank_count = self.ram_size().ram_banks();
    }

    fn set_title_offset(&mut self) {
        let mut offset: usize = 0;
        for byte in &self.rom_data[0x0134..=0x0143] {
            if *byte == 0u8 {
                break;
            }

            // the final byte of the title region doubles as the CGB
            // compatibility flag and must not leak into the title
            if offset > 14 && (*byte == 0x80 || *byte == 0xc0) {
                break;
            }

            offset += 1;
        }
        self.title_offset = 0x0134 + offset;
    }

    fn allocate_ram(&mut self) {
        if self.rom_type().mbc_type() == MbcType::Mbc2 {
            self.ram_data = vec![0xffu8; MBC2_RAM_SIZE];
            return;
        }
        let ram_banks = max(self.ram_size().ram_banks(), 1);
        self.ram_data = vec![0u8; ram_banks as usize * RAM_BANK_SIZE];
    }

    /// Ensures that the provided data is a valid Game Boy ROM image,
    /// both in size and in header checksum.
    fn ensure_data(data: &[u8]) -> Result<(), Error> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InsufficientData);
        }
        if data.len() % ROM_BANK_SIZE != 0 || !data.len().is_power_of_two() {
            return Err(Error::RomSize);
        }
        if Self::header_checksum(data) != data[0x014d] {
            return Err(Error::HeaderChecksumMismatch);
        }
        Ok(())
    }

    /// Computes the header checksum over 0x0134..=0x014C, the value
    /// stored at 0x014D must match for the cartridge to boot.
    fn header_checksum(data: &[u8]) -> u8 {
        let mut sum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            sum = sum.wrapping_sub(*byte).wrapping_sub(1);
        }
        sum
    }

    /// Re-computes the MBC1 bank offsets from the three banking
    /// registers, applying the bank-0 rewrite on the lower bits.
    fn mbc1_update_offsets(&mut self) {
        let mut lower = self.rom_bank_lower & 0x1f;
        if lower == 0x00 {
            lower = 0x01;
        }

        let (rom_bank, ram_bank) = if self.ram_banking_mode {
            (lower as u16, self.bank_upper)
        } else {
            (((self.bank_upper as u16) << 5) | lower as u16, 0)
        };

        let rom_mask = self.rom_bank_count.saturating_sub(1).max(1);
        self.set_rom_bank(rom_bank & rom_mask);
        if (ram_bank as u16) < self.ram_bank_count {
            self.set_ram_bank(ram_bank);
        } else {
            self.set_ram_bank(0);
        }
    }
}

impl Cartridge {
    pub fn title(&self) -> String {
        if self.rom_data.len() < 0x0144 {
            return String::new();
        }
        String::from(
            std::str::from_utf8(&self.rom_data[0x0134..self.title_offset])
                .unwrap_or("")
                .trim(),
        )
    }

    pub fn rom_type(&self) -> RomType {
        if self.rom_data.len() < 0x0148 {
            return RomType::Unknown;
        }
        match self.rom_data[0x0147] {
            0x00 => RomType::RomOnly,
            0x01 => RomType::Mbc1,
            0x02 => RomType::Mbc1Ram,
            0x03 => RomType::Mbc1RamBattery,
            0x05 => RomType::Mbc2,
            0x06 => RomType::Mbc2Battery,
            0x08 => RomType::RomRam,
            0x09 => RomType::RomRamBattery,
            0x0b => RomType::Mmm01,
            0x0c => RomType::Mmm01Ram,
            0x0d => RomType::Mmm01RamBattery,
            0x0f => RomType::Mbc3TimerBattery,
            0x10 => RomType::Mbc3TimerRamBattery,
            0x11 => RomType::Mbc3,
            0x12 => RomType::Mbc3Ram,
            0x13 => RomType::Mbc3RamBattery,
            0x19 => RomType::Mbc5,
            0x1a => RomType::Mbc5Ram,
            0x1b => RomType::Mbc5RamBattery,
            0x1c => RomType::Mbc5Rumble,
            0x1d => RomType::Mbc5RumbleRam,
            0x1e => RomType::Mbc5RumbleRamBattery,
            0x20 => RomType::Mbc6,
            0x22 => RomType::Mbc7SensorRumbleRamBattery,
            0xfc => RomType::PocketCamera,
            0xfd => RomType::BandaiTama5,
            0xfe => RomType::HuC3,
            0xff => RomType::HuC1RamBattery,
            _ => RomType::Unknown,
        }
    }

    pub fn rom_size(&self) -> RomSize {
        if self.rom_data.len() < 0x0149 {
            return RomSize::SizeUnknown;
        }
        match self.rom_data[0x0148] {
            0x00 => RomSize::Size32K,
            0x01 => RomSize::Size64K,
            0x02 => RomSize::Size128K,
            0x03 => RomSize::Size256K,
            0x04 => RomSize::Size512K,
            0x05 => RomSize::Size1M,
            0x06 => RomSize::Size2M,
            0x07 => RomSize::Size4M,
            0x08 => RomSize::Size8M,
            _ => RomSize::SizeUnknown,
        }
    }

    pub fn ram_size(&self) -> RamSize {
        if self.rom_data.len() < 0x014a {
            return RamSize::SizeUnknown;
        }
        match self.rom_data[0x0149] {
            0x00 => RamSize::NoRam,
            0x01 => RamSize::Unused,
            0x02 => RamSize::Size8K,
            0x03 => RamSize::Size32K,
            0x04 => RamSize::Size128K,
            0x05 => RamSize::Size64K,
            _ => RamSize::SizeUnknown,
        }
    }

    pub fn checksum(&self) -> u8 {
        Self::header_checksum(&self.rom_data)
    }

    pub fn valid_checksum(&self) -> bool {
        self.rom_data[0x014d] == self.checksum()
    }

    /// Verifies the (warn-only) global checksum, the sum of every
    /// ROM byte except the two checksum bytes themselves.
    pub fn valid_global_checksum(&self) -> bool {
        let mut sum: u16 = 0;
        for byte in &self.rom_data {
            sum = sum.wrapping_add(*byte as u16);
        }
        sum = sum.wrapping_sub(self.rom_data[0x014e] as u16);
        sum = sum.wrapping_sub(self.rom_data[0x014f] as u16);
        let stored = ((self.rom_data[0x014e] as u16) << 8) | self.rom_data[0x014f] as u16;
        stored == sum
    }

    pub fn rom_data(&self) -> &Vec<u8> {
        &self.rom_data
    }

    pub fn ram_data(&self) -> &Vec<u8> {
        &self.ram_data
    }

    pub fn ram_data_mut(&mut self) -> &mut Vec<u8> {
        &mut self.ram_data
    }

    pub fn set_ram_data(&mut self, data: &[u8]) {
        self.ram_data = data.to_vec();
    }

    pub fn description(&self, column_length: usize) -> String {
        let title_l = format!("{:width$}", "Title", width = column_length);
        let type_l = format!("{:width$}", "Type", width = column_length);
        let rom_size_l = format!("{:width$}", "ROM Size", width = column_length);
        let ram_size_l = format!("{:width$}", "RAM Size", width = column_length);
        format!(
            "{}  {}\n{}  {}\n{}  {}\n{}  {}",
            title_l,
            self.title(),
            type_l,
            self.rom_type(),
            rom_size_l,
            self.rom_size(),
            ram_size_l,
            self.ram_size(),
        )
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description(9))
    }
}

/// Dispatch record for one Memory Bank Controller variant, every
/// cartridge points to one of the static records below.
#[derive(Debug)]
pub struct Mbc {
    pub name: &'static str,
    pub read_rom: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_rom: fn(rom: &mut Cartridge, addr: u16, value: u8),
    pub read_ram: fn(rom: &Cartridge, addr: u16) -> u8,
    pub write_ram: fn(rom: &mut Cartridge, addr: u16, value: u8),
    pub tick: fn(rom: &mut Cartridge, dt: f64),
    pub save_ram: fn(rom: &Cartridge) -> Result<Vec<u8>, Error>,
    pub load_ram: fn(rom: &mut Cartridge, data: &[u8]) -> Result<(), Error>,
}

fn tick_noop(_rom: &mut Cartridge, _dt: f64) {}

fn save_ram_banks(rom: &Cartridge) -> Result<Vec<u8>, Error> {
    let mut cursor = Cursor::new(vec![]);
    write_bytes(&mut cursor, &rom.ram_data)?;
    Ok(cursor.into_inner())
}

fn load_ram_banks(rom: &mut Cartridge, data: &[u8]) -> Result<(), Error> {
    if data.len() != rom.ram_data.len() {
        return Err(Error::SaveRamParseFailure);
    }
    rom.ram_data.copy_from_slice(data);
    Ok(())
}

pub static NO_MBC: Mbc = Mbc {
    name: "No MBC",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.rom_data.get(addr as usize).unwrap_or(&0xff)
    },
    write_rom: |_rom: &mut Cartridge, addr: u16, _value: u8| {
        match addr {
            // ignores this address as Tetris and some other games write
            // to this address for some reason (probably related to
            // some kind of MBC1 compatibility issue)
            0x2000 => (),
            _ => debugln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        };
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        *rom.ram_data.get((addr - 0xa000) as usize).unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        let index = (addr - 0xa000) as usize;
        if index < rom.ram_data.len() {
            rom.ram_data[index] = value;
            rom.wrote_ram = true;
        }
    },
    tick: tick_noop,
    save_ram: save_ram_banks,
    load_ram: load_ram_banks,
};

pub static MBC1: Mbc = Mbc {
    name: "MBC1",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            // 0x4000-0x7FFF - ROM bank 01-7F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x3FFF - ROM bank selection 5 lower bits
            0x2000..=0x3fff => {
                rom.rom_bank_lower = value & 0x1f;
                rom.mbc1_update_offsets();
            }
            // 0x4000-0x5FFF - RAM bank selection or ROM bank selection upper bits
            0x4000..=0x5fff => {
                rom.bank_upper = value & 0x03;
                rom.mbc1_update_offsets();
            }
            // 0x6000-0x7FFF - ROM/RAM banking mode selection
            0x6000..=0x7fff => {
                rom.ram_banking_mode = value & 0x01 == 0x01;
                rom.mbc1_update_offsets();
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        *rom.ram_data
            .get(rom.ram_offset + (addr - 0xa000) as usize)
            .unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            debugln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        let index = rom.ram_offset + (addr - 0xa000) as usize;
        if index < rom.ram_data.len() {
            rom.ram_data[index] = value;
            rom.wrote_ram = true;
        }
    },
    tick: tick_noop,
    save_ram: save_ram_banks,
    load_ram: load_ram_banks,
};

pub static MBC2: Mbc = Mbc {
    name: "MBC2",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            // 0x4000-0x7FFF - ROM bank 01-0F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x3FFF - RAM enable or ROM bank selection, bit 8
            // of the address selects which register is written
            0x0000..=0x3fff => {
                if addr & 0x0100 == 0x0000 {
                    rom.ram_enabled = (value & 0x0f) == 0x0a;
                } else {
                    let mut rom_bank = (value & 0x0f) as u16;
                    if rom_bank == 0 {
                        rom_bank = 1;
                    }
                    rom_bank &= rom.rom_bank_count.saturating_sub(1).max(1);
                    rom.set_rom_bank(rom_bank);
                }
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled || addr > 0xa1ff {
            return 0xff;
        }
        // only the lower nibble of each byte is backed by memory,
        // the upper one reads as set bits
        0xf0 | (rom.ram_data[(addr - 0xa000) as usize] & 0x0f)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled || addr > 0xa1ff {
            return;
        }
        rom.ram_data[(addr - 0xa000) as usize] = 0xf0 | (value & 0x0f);
        rom.wrote_ram = true;
    },
    tick: tick_noop,
    save_ram: save_ram_banks,
    load_ram: load_ram_banks,
};

pub static MBC3: Mbc = Mbc {
    name: "MBC3",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            // 0x4000-0x7FFF - ROM bank 01-7F
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM/RTC enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x3FFF - ROM bank selection
            0x2000..=0x3fff => {
                let mut rom_bank = (value & 0x7f) as u16;
                if rom_bank == 0 {
                    rom_bank = 1;
                }
                rom_bank &= rom.rom_bank_count.saturating_sub(1).max(1);
                rom.set_rom_bank(rom_bank);
            }
            // 0x4000-0x5FFF - RAM bank or RTC register selection
            0x4000..=0x5fff => {
                rom.ram_rtc_select = value & 0x0f;
                if rom.ram_rtc_select <= 0x03 && (rom.ram_rtc_select as u16) < rom.ram_bank_count {
                    rom.set_ram_bank(rom.ram_rtc_select);
                }
            }
            // 0x6000-0x7FFF - RTC latch, toggled by a 0x00 to 0x01 write sequence
            0x6000..=0x7fff => {
                if rom.rtc_latch_data == 0x00 && value == 0x01 {
                    rom.rtc_latched = match rom.rtc_latched {
                        Some(_) => None,
                        None => Some(rom.rtc),
                    };
                }
                rom.rtc_latch_data = value;
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        let rtc = rom.rtc_latched.as_ref().unwrap_or(&rom.rtc);
        match rom.ram_rtc_select {
            0x00..=0x03 => *rom
                .ram_data
                .get(rom.ram_offset + (addr - 0xa000) as usize)
                .unwrap_or(&0xff),
            0x08 => rtc.seconds,
            0x09 => rtc.minutes,
            0x0a => rtc.hours,
            0x0b => rtc.days_low,
            0x0c => rtc.days_high(),
            _ => 0xff,
        }
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            debugln!("Attempt to write to ERAM/RTC while write protect is active");
            return;
        }
        match rom.ram_rtc_select {
            0x00..=0x03 => {
                let index = rom.ram_offset + (addr - 0xa000) as usize;
                if index < rom.ram_data.len() {
                    rom.ram_data[index] = value;
                    rom.wrote_ram = true;
                }
            }
            0x08 => rom.rtc.seconds = value,
            0x09 => rom.rtc.minutes = value,
            0x0a => rom.rtc.hours = value,
            0x0b => rom.rtc.days_low = value,
            0x0c => rom.rtc.set_days_high(value),
            _ => (),
        }
    },
    tick: |rom: &mut Cartridge, dt: f64| {
        let mut accumulator = rom.rtc_accumulator;
        rom.rtc.advance(dt, &mut accumulator);
        rom.rtc_accumulator = accumulator;
    },
    save_ram: |rom: &Cartridge| -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(vec![]);
        write_bytes(&mut cursor, &rom.ram_data)?;
        write_u8(&mut cursor, rom.rtc.seconds)?;
        write_u8(&mut cursor, rom.rtc.minutes)?;
        write_u8(&mut cursor, rom.rtc.hours)?;
        write_u8(&mut cursor, rom.rtc.days_low)?;
        write_u8(&mut cursor, rom.rtc.days_high())?;
        write_i64(&mut cursor, timestamp())?;
        Ok(cursor.into_inner())
    },
    load_ram: |rom: &mut Cartridge, data: &[u8]| -> Result<(), Error> {
        if data.len() != rom.ram_data.len() + 13 {
            return Err(Error::SaveRamParseFailure);
        }

        let ram_len = rom.ram_data.len();
        let mut cursor = Cursor::new(data);
        read_into(&mut cursor, &mut rom.ram_data[0..ram_len])
            .map_err(|_| Error::SaveRamParseFailure)?;

        rom.rtc.seconds = read_u8(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;
        rom.rtc.minutes = read_u8(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;
        rom.rtc.hours = read_u8(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;
        rom.rtc.days_low = read_u8(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;
        let days_high = read_u8(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;
        rom.rtc.set_days_high(days_high);

        let save_time = read_i64(&mut cursor).map_err(|_| Error::SaveRamParseFailure)?;

        // catches the RTC up with the wall-clock time elapsed since
        // the save file was written
        let elapsed = (timestamp() - save_time).max(0);
        rom.tick(elapsed as f64);

        Ok(())
    },
};

pub static MBC5: Mbc = Mbc {
    name: "MBC5",
    read_rom: |rom: &Cartridge, addr: u16| -> u8 {
        match addr {
            // 0x0000-0x3FFF - ROM bank 00
            0x0000..=0x3fff => rom.rom_data[addr as usize],
            // 0x4000-0x7FFF - ROM bank 00-1FF
            0x4000..=0x7fff => *rom
                .rom_data
                .get(rom.rom_offset + (addr - 0x4000) as usize)
                .unwrap_or(&0xff),
            _ => {
                warnln!("Reading from unknown Cartridge ROM location 0x{:04x}", addr);
                0xff
            }
        }
    },
    write_rom: |rom: &mut Cartridge, addr: u16, value: u8| {
        match addr {
            // 0x0000-0x1FFF - RAM enabled flag
            0x0000..=0x1fff => {
                rom.ram_enabled = (value & 0x0f) == 0x0a;
            }
            // 0x2000-0x2FFF - ROM bank selection 8 lower bits,
            // bank 0 is selectable (no rewrite to bank 1)
            0x2000..=0x2fff => {
                let rom_bank = (rom.rom_bank() & 0x0100) | value as u16;
                rom.set_rom_bank(rom_bank & rom.rom_bank_count.saturating_sub(1).max(1));
            }
            // 0x3000-0x3FFF - ROM bank selection 9th bit
            0x3000..=0x3fff => {
                let rom_bank = (rom.rom_bank() & 0x00ff) | (((value & 0x01) as u16) << 8);
                rom.set_rom_bank(rom_bank & rom.rom_bank_count.saturating_sub(1).max(1));
            }
            // 0x4000-0x5FFF - RAM bank selection
            0x4000..=0x5fff => {
                let mut ram_bank = value & 0x0f;

                // handles the rumble flag for the cartridges
                // that support the rumble operation
                if rom.has_rumble() {
                    ram_bank = value & 0x07;
                    let rumble = (value & 0x08) == 0x08;
                    if rom.rumble_active != rumble {
                        rom.rumble_active = rumble;
                        rom.trigger_rumble();
                    }
                }

                if (ram_bank as u16) < rom.ram_bank_count {
                    rom.set_ram_bank(ram_bank);
                }
            }
            _ => warnln!("Writing to unknown Cartridge ROM location 0x{:04x}", addr),
        }
    },
    read_ram: |rom: &Cartridge, addr: u16| -> u8 {
        if !rom.ram_enabled {
            return 0xff;
        }
        *rom.ram_data
            .get(rom.ram_offset + (addr - 0xa000) as usize)
            .unwrap_or(&0xff)
    },
    write_ram: |rom: &mut Cartridge, addr: u16, value: u8| {
        if !rom.ram_enabled {
            debugln!("Attempt to write to ERAM while write protect is active");
            return;
        }
        let index = rom.ram_offset + (addr - 0xa000) as usize;
        if index < rom.ram_data.len() {
            rom.ram_data[index] = value;
            rom.wrote_ram = true;
        }
    },
    tick: tick_noop,
    save_ram: save_ram_banks,
    load_ram: load_ram_banks,
};

#[cfg(test)]
mod tests {
    use super::{Cartridge, Rtc};
    use grayboy_common::error::Error;

    fn build_rom(rom_type: u8, rom_size: u8, ram_size: u8) -> Vec<u8> {
        let banks = 2usize << rom_size;
        let mut data = vec![0u8; banks * 0x4000];
        let title = b"TESTCART";
        data[0x0134..0x0134 + title.len()].copy_from_slice(title);
        data[0x0147] = rom_type;
        data[0x0148] = rom_size;
        data[0x0149] = ram_size;
        data[0x014d] = checksum(&data);
        data
    }

    fn checksum(data: &[u8]) -> u8 {
        let mut sum: u8 = 0;
        for byte in &data[0x0134..=0x014c] {
            sum = sum.wrapping_sub(*byte).wrapping_sub(1);
        }
        sum
    }

    #[test]
    fn test_header_checksum() {
        let data = build_rom(0x00, 0x00, 0x00);
        assert!(Cartridge::from_data(&data).is_ok());

        let mut bad = data.clone();
        bad[0x0140] ^= 0x01;
        assert_eq!(
            Cartridge::from_data(&bad).unwrap_err(),
            Error::HeaderChecksumMismatch
        );
    }

    #[test]
    fn test_insufficient_data() {
        let data = vec![0u8; 0x100];
        assert_eq!(
            Cartridge::from_data(&data).unwrap_err(),
            Error::InsufficientData
        );
    }

    #[test]
    fn test_unsupported_type() {
        let data = build_rom(0xfc, 0x00, 0x00);
        assert_eq!(
            Cartridge::from_data(&data).unwrap_err(),
            Error::UnsupportedCartridgeType(0xfc)
        );
    }

    #[test]
    fn test_title() {
        let data = build_rom(0x00, 0x00, 0x00);
        let rom = Cartridge::from_data(&data).unwrap();
        assert_eq!(rom.title(), "TESTCART");
    }

    #[test]
    fn test_mbc1_bank_zero_rewrite() {
        let data = build_rom(0x01, 0x05, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x2000, 0x00);
        assert_eq!(rom.rom_bank(), 1);

        rom.write(0x2000, 0x12);
        assert_eq!(rom.rom_bank(), 0x12);

        // bank 0x20 request maps to 0x21 through the lower-bit rewrite
        rom.write(0x2000, 0x00);
        rom.write(0x4000, 0x01);
        assert_eq!(rom.rom_bank(), 0x21);
    }

    #[test]
    fn test_mbc1_ram_banking_mode() {
        let data = build_rom(0x03, 0x04, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.write(0x4000, 0x02);
        assert_eq!(rom.ram_bank(), 0);

        rom.write(0x6000, 0x01);
        assert_eq!(rom.ram_bank(), 2);

        rom.write(0xa000, 0x77);
        rom.write(0x6000, 0x00);
        assert_eq!(rom.ram_bank(), 0);
        assert_eq!(rom.read(0xa000), 0x00);

        rom.write(0x6000, 0x01);
        assert_eq!(rom.read(0xa000), 0x77);
    }

    #[test]
    fn test_mbc2_nibble_ram() {
        let data = build_rom(0x06, 0x01, 0x00);
        let mut rom = Cartridge::from_data(&data).unwrap();

        // the RAM enable register requires address bit 8 clear
        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x35);
        assert_eq!(rom.read(0xa000), 0xf5);

        // ROM bank selection requires address bit 8 set
        rom.write(0x2100, 0x03);
        assert_eq!(rom.rom_bank(), 0x03);
    }

    #[test]
    fn test_mbc5_bank_zero() {
        let data = build_rom(0x19, 0x06, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x2000, 0x00);
        assert_eq!(rom.rom_bank(), 0);

        rom.write(0x2000, 0x42);
        assert_eq!(rom.rom_bank(), 0x42);
    }

    #[test]
    fn test_mbc3_rtc_latch() {
        let data = build_rom(0x10, 0x02, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.write(0x4000, 0x08);
        rom.tick(90.0);
        assert_eq!(rom.read(0xa000), 30);

        // latches a snapshot, further ticks no longer show through
        rom.write(0x6000, 0x00);
        rom.write(0x6000, 0x01);
        rom.tick(30.0);
        assert_eq!(rom.read(0xa000), 30);

        // unlatching exposes the live clock again
        rom.write(0x6000, 0x00);
        rom.write(0x6000, 0x01);
        assert_eq!(rom.read(0xa000), 0);
        rom.write(0x4000, 0x09);
        assert_eq!(rom.read(0xa000), 2);
    }

    #[test]
    fn test_rtc_day_carry() {
        let mut rtc = Rtc::default();
        let mut accumulator = 0.0;
        rtc.advance(86400.0 * 512.0, &mut accumulator);
        assert!(rtc.days_carry);
        assert!(!rtc.days_msb);
        assert_eq!(rtc.days_low, 0);
    }

    #[test]
    fn test_save_ram_round_trip() {
        let data = build_rom(0x03, 0x04, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x13);
        rom.write(0xa001, 0x37);

        let saved = rom.save_ram().unwrap();
        assert_eq!(saved.len(), 4 * 8192);

        let mut other = Cartridge::from_data(&data).unwrap();
        other.load_ram(&saved).unwrap();
        other.write(0x0000, 0x0a);
        assert_eq!(other.read(0xa000), 0x13);
        assert_eq!(other.read(0xa001), 0x37);
    }

    #[test]
    fn test_save_ram_round_trip_rtc() {
        let data = build_rom(0x10, 0x02, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();

        rom.write(0x0000, 0x0a);
        rom.tick(3661.0);
        rom.write(0xa000, 0x55);

        let saved = rom.save_ram().unwrap();
        assert_eq!(saved.len(), 4 * 8192 + 13);

        let mut other = Cartridge::from_data(&data).unwrap();
        other.load_ram(&saved).unwrap();
        assert_eq!(other.rtc().hours, 1);
        assert_eq!(other.rtc().minutes, 1);
        assert!(other.rtc().seconds >= 1);
    }

    #[test]
    fn test_save_ram_bad_length() {
        let data = build_rom(0x03, 0x04, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();
        assert_eq!(
            rom.load_ram(&[0u8; 16]).unwrap_err(),
            Error::SaveRamParseFailure
        );
    }

    #[test]
    fn test_wrote_ram_flag() {
        let data = build_rom(0x03, 0x04, 0x03);
        let mut rom = Cartridge::from_data(&data).unwrap();
        assert!(!rom.take_wrote_ram());

        rom.write(0x0000, 0x0a);
        rom.write(0xa000, 0x01);
        assert!(rom.take_wrote_ram());
        assert!(!rom.take_wrote_ram());
    }
}
