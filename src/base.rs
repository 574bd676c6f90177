//! Base communication implementation for interacting with Ags3870 device
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::Debug;

use embedded_hal::blocking::i2c;

use crate::{Error};
use crate::device::*;

/// Base API for reading and writing register frames on the device
/// This should not be required by consumers, but is exposed to support alternate use
pub trait Base<Err> {
    /// Issue an empty write to check the device acknowledges its address
    fn probe(&mut self, address: u8) -> Result<(), Error<Err>>;
    /// Select a register and read back its 5-byte frame
    fn read_register(&mut self, address: u8, register: u8, frame: &mut [u8; FRAME_LEN]) -> Result<(), Error<Err>>;
    /// Write a 5-byte frame to a register
    fn write_register(&mut self, address: u8, register: u8, frame: &[u8; FRAME_LEN]) -> Result<(), Error<Err>>;
}

/// Helper for device CRC-8 calculation
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = CRC_INIT;

    // For each byte
    for v in data {
        // XOR with current byte
        crc ^= v;

        // For each bit (in -ve order, but, doesn't actually matter here)
        for _bit in 0..8 {
            if crc & 0x80 != 0 {
                crc = (crc << 1) ^ CRC_POLY;
            } else {
                crc = crc << 1;
            }
        }
    }

    // Apply final xor
    crc ^ CRC_XOR
}

/// Base implementation for I2C devices
impl <Conn, Err> Base<Err> for Conn where
    Conn: i2c::Read<Error=Err> + i2c::Write<Error=Err>,
    Err: Debug,
{
    fn probe(&mut self, address: u8) -> Result<(), Error<Err>> {
        self.write(address, &[]).map_err(|e| Error::Conn(e) )
    }

    fn read_register(&mut self, address: u8, register: u8, frame: &mut [u8; FRAME_LEN]) -> Result<(), Error<Err>> {
        trace!("Selecting register: {:#04x}", register);

        // First write the register address
        self.write(address, &[register])
            .map_err(|e| Error::Conn(e) )?;

        // Then, read the frame back, anything short of a full frame is a short read
        let mut buff = [0u8; FRAME_LEN];
        if let Err(e) = self.read(address, &mut buff) {
            warn!("Short read from register {:#04x}: {:?}", register, e);
            return Err(Error::ShortRead);
        }

        // Only touch the caller's frame once the read has completed
        frame.copy_from_slice(&buff);

        trace!("Read frame: {:x?}", frame);

        Ok(())
    }

    fn write_register(&mut self, address: u8, register: u8, frame: &[u8; FRAME_LEN]) -> Result<(), Error<Err>> {
        let mut buff = [0u8; FRAME_LEN + 1];
        buff[0] = register;
        buff[1..].copy_from_slice(frame);

        trace!("Writing register: {:#04x} frame: {:x?}", register, frame);

        self.write(address, &buff).map_err(|e| Error::Conn(e) )
    }
}
