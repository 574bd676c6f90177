//! Ags3870 device definitions
//!
//! Copyright 2019 Ryan Kurte


/// Ags3870 default I2C address
pub const DEFAULT_ADDRESS: u8 = 0x1A;

pub const CRC_POLY: u8 = 0x31;
pub const CRC_INIT: u8 = 0xff;
pub const CRC_XOR: u8 = 0x00;

/// Register frame length, 4 data bytes followed by a CRC-8 byte
pub const FRAME_LEN: usize = 5;

/// Number of data bytes in a register frame
pub const DATA_LEN: usize = 4;

/// Recommended preheat time after power-up before readings are trusted (ms)
pub const PREHEAT_MS: u64 = 120_000;

/// Status bit set by the device while a measurement is not yet available
pub const STATUS_NOT_READY: u8 = 0x01;

/// Ags3870 I2C registers
/// Every register transfers a 5-byte frame, 4 big endian data bytes and a CRC-8 checksum
#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Register {
    /// Concentration
    /// Status byte followed by a 24-bit CH4 concentration in ppm
    Ppm = 0x00,

    /// Zero-point calibration
    /// Read: 16-bit status word and 16-bit value word
    /// Write: two zero bytes followed by the 16-bit zero value
    Calibration = 0x01,

    /// Firmware version, reported in data byte 1
    Version = 0x11,

    /// Sensor resistance
    /// 24-bit magnitude in units of 10 ohm, byte 3 is reserved
    Resistance = 0x20,
}

/// Zero-point calibration data as reported by the device
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct ZeroCalibrationData {
    /// Calibration status word
    pub status: u16,
    /// Calibration value word
    pub value: u16,
}

impl ZeroCalibrationData {
    pub(crate) fn from_frame(frame: &[u8; FRAME_LEN]) -> Self {
        ZeroCalibrationData {
            status: (frame[0] as u16) << 8 | (frame[1] as u16),
            value: (frame[2] as u16) << 8 | (frame[3] as u16),
        }
    }
}

/// Raw contents of a register without a dedicated decoder
#[derive(PartialEq, Clone, Copy, Debug, Default)]
pub struct RegisterData {
    pub data: [u8; DATA_LEN],
    pub crc: u8,
    /// Always set when returned by a successful read
    pub crc_valid: bool,
}
