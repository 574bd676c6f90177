//! Ags3870 methane (CH4) gas sensor driver
//!
//! Copyright 2019 Ryan Kurte

use core::fmt::Debug;

extern crate embedded_hal;
use embedded_hal::blocking::i2c;

#[macro_use] extern crate log;

pub mod base;
use base::{Base, crc8};

pub mod device;
use device::*;

pub mod clock;
use clock::Clock;


/// Ags3870 sensor object
/// This is generic over an I2C connector, a millisecond clock and the connector error type
pub struct Ags3870<Conn, Clk, Err> {
    conn: Conn,
    clock: Clk,
    address: u8,
    /// Scratch frame shared by every register transaction
    buffer: [u8; FRAME_LEN],
    start_time: u64,
    last_read: u64,
    last_ppm: u32,
    status: u8,
    error: Option<Error<Err>>,
}

/// Ags3870 error object
#[derive(Debug)]
pub enum Error<ConnErr> {
    /// Underlying connector error
    Conn(ConnErr),
    /// Checksum mismatch (computed, received)
    Crc(u8, u8),
    /// Device reported the measurement is not ready
    NotReady,
    /// Device returned less than a full frame
    ShortRead,
}

impl <ConnErr> From<ConnErr> for Error<ConnErr> {
    fn from(conn_err: ConnErr) -> Self {
        Error::Conn(conn_err)
    }
}


impl <Conn, Clk, Err> Ags3870 <Conn, Clk, Err> where
    Conn: i2c::Read<Error=Err> + i2c::Write<Error=Err>,
    Clk: Clock,
    Err: Debug,
{
    /// Create a new Ags3870 sensor instance at the default address
    pub fn new(conn: Conn, clock: Clk) -> Self {
        Self::with_address(conn, clock, DEFAULT_ADDRESS)
    }

    /// Create a new Ags3870 sensor instance at the provided address
    pub fn with_address(conn: Conn, clock: Clk, address: u8) -> Self {
        let mut s = Ags3870 {
            conn,
            clock,
            address,
            buffer: [0u8; FRAME_LEN],
            start_time: 0,
            last_read: 0,
            last_ppm: 0,
            status: 0,
            error: None,
        };

        s.reset();

        s
    }

    /// Start the preheat timer and check the device is present
    /// This does not wait for preheating, see `preheat_complete`
    pub fn begin(&mut self) -> bool {
        self.start_time = self.clock.now_ms();
        self.is_connected()
    }

    /// Check whether the device acknowledges its address
    pub fn is_connected(&mut self) -> bool {
        self.conn.probe(self.address).is_ok()
    }

    /// Reset the driver state, restarting the preheat timer
    pub fn reset(&mut self) {
        self.start_time = self.clock.now_ms();
        self.last_read = 0;
        self.last_ppm = 0;
        self.status = 0;
        self.error = None;
    }

    /// Fetch the device firmware version, 0xFF if the device could not be read
    pub fn version(&mut self) -> u8 {
        let mut version = 0xFF;

        if self.read_frame(Register::Version as u8) {
            // Returned even on checksum failure, callers check `last_error`
            version = self.buffer[1];
            self.check_crc();
        }

        version
    }

    /// Read the CH4 concentration in ppm
    ///
    /// On any failure the last good concentration is returned and the cause is
    /// available from `last_error`.
    pub fn read_ppm(&mut self) -> u32 {
        let value = self.read_sensor();

        if self.error.is_none() {
            self.last_read = self.clock.now_ms();
            self.last_ppm = value;
            debug!("Concentration: {} ppm", value);
        }

        self.last_ppm
    }

    /// Read the sensor resistance in ohms, 0 if the device could not be read
    pub fn read_resistance(&mut self) -> u32 {
        let mut value = 0;

        if self.read_frame(Register::Resistance as u8) {
            // Byte 3 is reserved
            value = be24(&self.buffer[0..3]);
            self.check_crc();
        }

        value * 10
    }

    /// Set the zero point calibration value
    pub fn manual_zero_calibration(&mut self, value: u16) -> bool {
        self.buffer[0] = 0x00;
        self.buffer[1] = 0x00;
        self.buffer[2] = (value >> 8) as u8;
        self.buffer[3] = (value & 0xFF) as u8;
        self.buffer[4] = crc8(&self.buffer[..DATA_LEN]);

        self.write_frame(Register::Calibration as u8)
    }

    /// Read the zero point calibration status and value
    pub fn zero_calibration_data(&mut self) -> Option<ZeroCalibrationData> {
        if !self.read_frame(Register::Calibration as u8) {
            return None;
        }

        if !self.check_crc() {
            return None;
        }

        self.error = None;

        let data = ZeroCalibrationData::from_frame(&self.buffer);
        debug!("Zero calibration: {:?}", data);

        Some(data)
    }

    /// Read the raw contents of an arbitrary register
    pub fn read_register(&mut self, register: u8) -> Option<RegisterData> {
        if !self.read_frame(register) {
            return None;
        }

        if !self.check_crc() {
            return None;
        }

        self.error = None;

        let mut data = [0u8; DATA_LEN];
        data.copy_from_slice(&self.buffer[..DATA_LEN]);

        Some(RegisterData{ data, crc: self.buffer[DATA_LEN], crc_valid: true })
    }

    /// Fetch and clear the error from the most recent operation
    pub fn last_error(&mut self) -> Option<Error<Err>> {
        self.error.take()
    }

    /// Configured device address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Status byte from the last concentration read
    pub fn status(&self) -> u8 {
        self.status
    }

    /// Whether the last concentration read reported a ready measurement
    pub fn data_ready(&self) -> bool {
        self.status & STATUS_NOT_READY == 0
    }

    /// Last successfully read concentration, without bus access
    pub fn last_ppm(&self) -> u32 {
        self.last_ppm
    }

    /// Timestamp (ms) of the last successful concentration read, 0 if none
    pub fn last_read(&self) -> u64 {
        self.last_read
    }

    /// Timestamp (ms) at which preheating started
    pub fn preheat_start(&self) -> u64 {
        self.start_time
    }

    /// Whether the recommended preheat time has elapsed
    pub fn preheat_complete(&self) -> bool {
        self.clock.now_ms().saturating_sub(self.start_time) >= PREHEAT_MS
    }

    /// Destroy the driver, returning the connector and clock
    pub fn release(self) -> (Conn, Clk) {
        (self.conn, self.clock)
    }

    /// Run a concentration read cycle, the returned value is only meaningful
    /// when no error is set afterwards
    fn read_sensor(&mut self) -> u32 {
        if !self.read_frame(Register::Ppm as u8) {
            return 0;
        }

        self.status = self.buffer[0];
        if self.status & STATUS_NOT_READY != 0 {
            self.error = Some(Error::NotReady);
        }

        let value = be24(&self.buffer[1..4]);

        // Checksum failure takes precedence over not ready
        self.check_crc();

        value
    }

    fn read_frame(&mut self, register: u8) -> bool {
        match self.conn.read_register(self.address, register, &mut self.buffer) {
            Ok(()) => {
                self.error = None;
                true
            },
            Err(e) => {
                self.error = Some(e);
                false
            },
        }
    }

    fn write_frame(&mut self, register: u8) -> bool {
        match self.conn.write_register(self.address, register, &self.buffer) {
            Ok(()) => {
                self.error = None;
                true
            },
            Err(e) => {
                self.error = Some(e);
                false
            },
        }
    }

    /// Validate the scratch frame checksum, setting the error on mismatch
    fn check_crc(&mut self) -> bool {
        if crc8(&self.buffer) == 0 {
            return true;
        }

        let computed = crc8(&self.buffer[..DATA_LEN]);
        let received = self.buffer[DATA_LEN];
        warn!("CRC mismatch (computed: {:#04x} received: {:#04x})", computed, received);

        self.error = Some(Error::Crc(computed, received));

        false
    }
}

/// Decode a big endian 24-bit value
fn be24(b: &[u8]) -> u32 {
    (b[0] as u32) << 16 | (b[1] as u32) << 8 | (b[2] as u32)
}
