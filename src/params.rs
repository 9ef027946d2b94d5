//! Strongly typed parameter enumerations for the ADS1256 driver.
//!
//! These enums map directly to datasheet field encodings and are used across
//! [`Config`](crate::config::Config) and the high-level driver APIs. Prefer these
//! types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use ads1256::params::{Channel, DataRate, Gain, Input};
//!
//! let rate = DataRate::Sps1000;
//! let gain = Gain::X8;
//! let input = Input::single_ended(Channel::Ain3);
//! assert_eq!(input.mux_code(), 0x38);
//! let _ = (rate, gain);
//! ```

use modular_bitfield::prelude::Specifier;

/// Programmable gain amplifier settings encoded in `ADCON[2:0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Gain {
    /// ×1, ±2·VREF input range.
    X1 = 0b000,
    /// ×2.
    X2 = 0b001,
    /// ×4.
    X4 = 0b010,
    /// ×8.
    X8 = 0b011,
    /// ×16.
    X16 = 0b100,
    /// ×32.
    X32 = 0b101,
    /// ×64.
    X64 = 0b110,
}

impl Gain {
    /// Returns the 3-bit PGA code.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a PGA field. Both `0b110` and `0b111` select ×64.
    pub const fn from_code(code: u8) -> Self {
        match code & 0b111 {
            0b000 => Self::X1,
            0b001 => Self::X2,
            0b010 => Self::X4,
            0b011 => Self::X8,
            0b100 => Self::X16,
            0b101 => Self::X32,
            _ => Self::X64,
        }
    }

    /// Returns the amplification factor.
    pub const fn multiplier(self) -> u32 {
        1 << self.code()
    }
}

/// Output data rates written verbatim to the `DRATE` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataRate {
    /// 30 000 samples per second.
    Sps30000 = 0xF0,
    /// 15 000 SPS.
    Sps15000 = 0xE0,
    /// 7 500 SPS.
    Sps7500 = 0xD0,
    /// 3 750 SPS.
    Sps3750 = 0xC0,
    /// 2 000 SPS.
    Sps2000 = 0xB0,
    /// 1 000 SPS.
    Sps1000 = 0xA1,
    /// 500 SPS.
    Sps500 = 0x92,
    /// 100 SPS.
    Sps100 = 0x82,
    /// 60 SPS.
    Sps60 = 0x72,
    /// 50 SPS.
    Sps50 = 0x63,
    /// 30 SPS.
    Sps30 = 0x53,
    /// 25 SPS.
    Sps25 = 0x43,
    /// 15 SPS.
    Sps15 = 0x33,
    /// 10 SPS.
    Sps10 = 0x23,
    /// 5 SPS.
    Sps5 = 0x13,
    /// 2.5 SPS.
    Sps2_5 = 0x03,
}

impl DataRate {
    const ALL: [Self; 16] = [
        Self::Sps30000,
        Self::Sps15000,
        Self::Sps7500,
        Self::Sps3750,
        Self::Sps2000,
        Self::Sps1000,
        Self::Sps500,
        Self::Sps100,
        Self::Sps60,
        Self::Sps50,
        Self::Sps30,
        Self::Sps25,
        Self::Sps15,
        Self::Sps10,
        Self::Sps5,
        Self::Sps2_5,
    ];

    /// Returns the raw `DRATE` register value.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Looks up a documented `DRATE` code. Undocumented codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|rate| rate.code() == code)
    }
}

/// D0/CLKOUT divider selection encoded in `ADCON[6:5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum ClockOut {
    /// Clock output disabled.
    Off = 0b00,
    /// f_CLKIN (power-on default).
    Full = 0b01,
    /// f_CLKIN / 2.
    Half = 0b10,
    /// f_CLKIN / 4.
    Quarter = 0b11,
}

/// Sensor-detect current source selection encoded in `ADCON[4:3]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum SensorDetect {
    /// Current sources off.
    Off = 0b00,
    /// 0.5 µA.
    Ua0_5 = 0b01,
    /// 2 µA.
    Ua2 = 0b10,
    /// 10 µA.
    Ua10 = 0b11,
}

/// Data output bit order (`STATUS.ORDER`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum ByteOrder {
    /// Most significant bit first (default).
    MsbFirst = 0,
    /// Least significant bit first.
    LsbFirst = 1,
}

/// Direction of one of the D0..D3 digital I/O pins (`IO.DIRn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 1]
pub enum GpioDirection {
    /// Pin drives the value written to `IO.DIOn`.
    Output = 0,
    /// Pin is sampled into `IO.DIOn`.
    Input = 1,
}

/// Analog input pins addressable by the multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Channel {
    /// AIN0.
    Ain0 = 0,
    /// AIN1.
    Ain1 = 1,
    /// AIN2.
    Ain2 = 2,
    /// AIN3.
    Ain3 = 3,
    /// AIN4.
    Ain4 = 4,
    /// AIN5.
    Ain5 = 5,
    /// AIN6.
    Ain6 = 6,
    /// AIN7.
    Ain7 = 7,
    /// AINCOM, the common reference input.
    AinCom = 8,
}

impl Channel {
    /// Returns the 4-bit multiplexer selector.
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Decodes a multiplexer nibble. Any code with bit 3 set selects AINCOM.
    pub const fn from_code(code: u8) -> Self {
        match code & 0x0F {
            0 => Self::Ain0,
            1 => Self::Ain1,
            2 => Self::Ain2,
            3 => Self::Ain3,
            4 => Self::Ain4,
            5 => Self::Ain5,
            6 => Self::Ain6,
            7 => Self::Ain7,
            _ => Self::AinCom,
        }
    }
}

/// A positive/negative channel pair routed to the modulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Input {
    /// Channel routed to the positive input.
    pub positive: Channel,
    /// Channel routed to the negative input.
    pub negative: Channel,
}

impl Input {
    /// Measures `channel` against AINCOM.
    pub const fn single_ended(channel: Channel) -> Self {
        Self {
            positive: channel,
            negative: Channel::AinCom,
        }
    }

    /// Measures `positive` against `negative`.
    pub const fn differential(positive: Channel, negative: Channel) -> Self {
        Self { positive, negative }
    }

    /// Returns the `MUX` register value selecting this pair.
    pub const fn mux_code(self) -> u8 {
        (self.positive.code() << 4) | self.negative.code()
    }

    /// Decodes a `MUX` register value.
    pub const fn from_mux_code(code: u8) -> Self {
        Self {
            positive: Channel::from_code(code >> 4),
            negative: Channel::from_code(code),
        }
    }

    /// Returns `true` when the negative input is AINCOM.
    pub const fn is_single_ended(self) -> bool {
        matches!(self.negative, Channel::AinCom)
    }
}
