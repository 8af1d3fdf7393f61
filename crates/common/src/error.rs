#![allow(clippy::uninlined_format_args)]

//! Error related data structures to be shared and used.
//!
//! This module contains the [`Error`] enum, which is used to represent
//! errors that can occur within the Grayboy domain.

use std::{
    fmt::{self, Display, Formatter},
    io,
};

/// Top level enum for error handling within Grayboy.
///
/// Most of the time, you will want to use the `CustomError` variant
/// to provide a more detailed error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InsufficientData,
    HeaderChecksumMismatch,
    UnsupportedCartridgeType(u8),
    SaveRamParseFailure,
    RomSize,
    InvalidParameter(String),
    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::InsufficientData => String::from("Not enough data to parse cartridge header"),
            Error::HeaderChecksumMismatch => String::from("Cartridge header checksum mismatch"),
            Error::UnsupportedCartridgeType(rom_type) => {
                format!("Unsupported cartridge type: 0x{:02x}", rom_type)
            }
            Error::SaveRamParseFailure => String::from("Failed to parse save RAM data"),
            Error::RomSize => String::from("Invalid ROM size"),
            Error::InvalidParameter(message) => format!("Invalid parameter: {}", message),
            Error::CustomError(message) => String::from(message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::CustomError(error.to_string())
    }
}
