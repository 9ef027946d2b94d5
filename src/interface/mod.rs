//! Bus interface abstraction for the ADS1256 driver.

pub mod spi;

#[cfg(test)]
pub(crate) mod mock;

pub use embedded_hal::digital::PinState;
use embedded_hal::spi::{Mode, MODE_1};

/// Output lines driven by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// Active-low chip select.
    ChipSelect,
    /// Active-low hardware reset.
    Reset,
    /// Active-low SYNC / power-down.
    Sync,
}

/// Serial clock settings requested at the start of every bus transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusSettings {
    /// SCLK frequency in hertz.
    pub clock_hz: u32,
    /// Clock polarity and phase.
    pub mode: Mode,
}

impl BusSettings {
    /// 1.92 MHz, SPI mode 1 (CPOL = 0, CPHA = 1). Bytes are always shifted MSB first.
    ///
    /// SCLK must stay below f_CLKIN / 4, so 1.92 MHz is safe for the usual 7.68 MHz crystal.
    pub const ADS1256: Self = Self {
        clock_hz: 1_920_000,
        mode: MODE_1,
    };
}

/// Abstraction over the low-level bus and pin access required by the driver.
///
/// Implementations exchange single bytes and leave framing (chip-select, delays,
/// DRDY handshakes) to [`protocol`](crate::protocol).
pub trait Ads1256Interface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Claims the bus with the given settings.
    fn begin_transaction(&mut self, settings: &BusSettings) -> core::result::Result<(), Self::Error>;

    /// Shifts `byte` out and returns the byte shifted in.
    fn transfer(&mut self, byte: u8) -> core::result::Result<u8, Self::Error>;

    /// Releases the bus after all pending bytes are on the wire.
    fn end_transaction(&mut self) -> core::result::Result<(), Self::Error>;

    /// Drives an output line.
    fn set_line(&mut self, line: Line, level: PinState) -> core::result::Result<(), Self::Error>;

    /// Samples the DRDY line.
    fn read_data_ready(&mut self) -> core::result::Result<PinState, Self::Error>;

    /// Reports whether `line` is physically wired. Writes to absent lines are no-ops.
    fn has_line(&self, line: Line) -> bool {
        let _ = line;
        true
    }

    /// Blocks for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Blocks for `us` microseconds.
    fn delay_us(&mut self, us: u32);
}
