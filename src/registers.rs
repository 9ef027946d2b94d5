//! Register map definitions for the ADS1256 converter.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{ByteOrder, ClockOut, Gain, GpioDirection, Input, SensorDetect};

/// Register address of `STATUS`.
pub const REG_STATUS: u8 = 0x00;
/// Register address of `MUX`.
pub const REG_MUX: u8 = 0x01;
/// Register address of `ADCON`.
pub const REG_ADCON: u8 = 0x02;
/// Register address of `DRATE`.
pub const REG_DRATE: u8 = 0x03;
/// Register address of `IO`.
pub const REG_IO: u8 = 0x04;
/// Register address of `OFC0`, offset calibration bits 7:0.
pub const REG_OFC0: u8 = 0x05;
/// Register address of `OFC1`.
pub const REG_OFC1: u8 = 0x06;
/// Register address of `OFC2`, offset calibration bits 23:16.
pub const REG_OFC2: u8 = 0x07;
/// Register address of `FSC0`, full-scale calibration bits 7:0.
pub const REG_FSC0: u8 = 0x08;
/// Register address of `FSC1`.
pub const REG_FSC1: u8 = 0x09;
/// Register address of `FSC2`, full-scale calibration bits 23:16.
pub const REG_FSC2: u8 = 0x0A;

/// Register addresses occupy the low nibble of `RREG`/`WREG`.
pub const REGISTER_ADDRESS_MASK: u8 = 0x0F;

/// Minimal metadata exposed by every register value type.
pub trait Register: Copy + From<u8> + Into<u8> {
    /// Register address as documented in the datasheet.
    const ADDRESS: u8;
    /// Power-on value defined by the datasheet.
    const RESET_VALUE: u8;
}

/// Bitfield representation of the `STATUS` register (address `0x00`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // Mirror of the DRDY pin (bit 0, read-only).
    pub data_ready_n: bool,
    // Analog input buffer enable (bit 1).
    pub buffer_enable: bool,
    // Auto-calibration enable (bit 2).
    pub auto_calibration: bool,
    // Data output bit order (bit 3).
    pub order: ByteOrder,
    // Factory programmed identification bits (bits 7:4, read-only).
    pub id: B4,
}

/// Bitfield representation of the `MUX` register (address `0x01`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mux {
    // Negative input channel selector (bits 3:0).
    pub negative: B4,
    // Positive input channel selector (bits 7:4).
    pub positive: B4,
}

impl Mux {
    /// Returns the input pair this value selects.
    pub fn input(self) -> Input {
        Input::from_mux_code(self.into_bytes()[0])
    }

    /// Builds the register value selecting `input`.
    pub fn for_input(input: Input) -> Self {
        Self::new()
            .with_positive(input.positive.code())
            .with_negative(input.negative.code())
    }
}

/// Bitfield representation of the `ADCON` register (address `0x02`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adcon {
    // Programmable gain amplifier code (bits 2:0).
    pub pga: B3,
    // Sensor-detect current sources (bits 4:3).
    pub sensor_detect: SensorDetect,
    // Clock output divider (bits 6:5).
    pub clock_out: ClockOut,
    #[skip]
    __: B1,
}

impl Adcon {
    /// Returns the decoded gain setting.
    pub fn gain(self) -> Gain {
        Gain::from_code(self.pga())
    }

    /// Replaces the gain setting.
    pub fn set_gain(&mut self, gain: Gain) {
        self.set_pga(gain.code());
    }
}

/// Bitfield representation of the `IO` register (address `0x04`).
///
/// Bits 3:0 hold the D0..D3 pin values and bits 7:4 their directions.
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioControl {
    pub d0: bool,
    pub d1: bool,
    pub d2: bool,
    pub d3: bool,
    pub dir0: GpioDirection,
    pub dir1: GpioDirection,
    pub dir2: GpioDirection,
    pub dir3: GpioDirection,
}

impl GpioControl {
    /// Number of digital I/O pins.
    pub const PINS: usize = 4;

    /// Returns the level of pin `pin`, or `None` for an index above 3.
    pub fn value(self, pin: usize) -> Option<bool> {
        match pin {
            0 => Some(self.d0()),
            1 => Some(self.d1()),
            2 => Some(self.d2()),
            3 => Some(self.d3()),
            _ => None,
        }
    }

    /// Sets all four pin directions, D0 first.
    pub fn set_directions(&mut self, dirs: [GpioDirection; Self::PINS]) {
        self.set_dir0(dirs[0]);
        self.set_dir1(dirs[1]);
        self.set_dir2(dirs[2]);
        self.set_dir3(dirs[3]);
    }

    /// Returns all four pin directions, D0 first.
    pub fn directions(self) -> [GpioDirection; Self::PINS] {
        [self.dir0(), self.dir1(), self.dir2(), self.dir3()]
    }

    /// Sets all four output levels, D0 first.
    pub fn set_values(&mut self, values: [bool; Self::PINS]) {
        self.set_d0(values[0]);
        self.set_d1(values[1]);
        self.set_d2(values[2]);
        self.set_d3(values[3]);
    }
}

macro_rules! impl_byte_register {
    ($ty:ty, $addr:expr, $reset:expr) => {
        impl From<u8> for $ty {
            fn from(value: u8) -> Self {
                Self::from_bytes([value])
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value.into_bytes()[0]
            }
        }

        impl Register for $ty {
            const ADDRESS: u8 = $addr;
            const RESET_VALUE: u8 = $reset;
        }
    };
}

impl_byte_register!(Status, REG_STATUS, 0x01);
impl_byte_register!(Mux, REG_MUX, 0x01);
impl_byte_register!(Adcon, REG_ADCON, 0x20);
impl_byte_register!(GpioControl, REG_IO, 0xE0);

/// Power-on value of `DRATE` (30 000 SPS).
pub const DRATE_RESET_VALUE: u8 = 0xF0;

/// Registers mirrored by [`RegisterSnapshot`].
const CACHED_REGISTERS: usize = 5;

/// Last known contents of the STATUS, MUX, ADCON, DRATE and IO registers.
///
/// This is a cache of what the driver last wrote or read back; the chip may have
/// diverged after an external reset or recalibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterSnapshot {
    values: [u8; CACHED_REGISTERS],
}

impl RegisterSnapshot {
    /// Snapshot seeded with datasheet power-on values.
    pub const fn power_on() -> Self {
        Self {
            values: [
                Status::RESET_VALUE,
                Mux::RESET_VALUE,
                Adcon::RESET_VALUE,
                DRATE_RESET_VALUE,
                GpioControl::RESET_VALUE,
            ],
        }
    }

    /// Returns `true` when `address` is mirrored by the snapshot.
    pub const fn is_cached(address: u8) -> bool {
        (address as usize) < CACHED_REGISTERS
    }

    /// Cached value of `address`, or `None` for uncached registers.
    pub fn get(&self, address: u8) -> Option<u8> {
        self.values.get(address as usize).copied()
    }

    /// Records `value` for `address`. Uncached addresses are ignored.
    pub fn set(&mut self, address: u8, value: u8) {
        if let Some(slot) = self.values.get_mut(address as usize) {
            *slot = value;
        }
    }

    /// Typed view of a cached register.
    pub fn register<R: Register>(&self) -> R {
        R::from(self.values[R::ADDRESS as usize])
    }

    /// Stores a typed register value.
    pub fn store<R: Register>(&mut self, value: R) {
        self.values[R::ADDRESS as usize] = value.into();
    }

    /// Cached `STATUS`.
    pub fn status(&self) -> Status {
        self.register()
    }

    /// Cached `MUX`.
    pub fn mux(&self) -> Mux {
        self.register()
    }

    /// Cached `ADCON`.
    pub fn adcon(&self) -> Adcon {
        self.register()
    }

    /// Cached `DRATE` byte.
    pub fn drate(&self) -> u8 {
        self.values[REG_DRATE as usize]
    }

    /// Cached `IO`.
    pub fn gpio(&self) -> GpioControl {
        self.register()
    }
}

impl Default for RegisterSnapshot {
    fn default() -> Self {
        Self::power_on()
    }
}
