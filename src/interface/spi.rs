//! SPI interface implementation built on top of `embedded-hal` `SpiBus` and GPIO pins.
//!
//! The ADS1256 needs chip-select held low across several logical commands (continuous
//! reads and channel cycling), so the driver owns the raw bus and the CS pin instead of
//! an `SpiDevice`.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin, PinState};
use embedded_hal::spi::{self, SpiBus};

use super::{Ads1256Interface, BusSettings, Line};

/// Error produced by [`SpiInterface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterfaceError {
    /// The SPI bus reported a failure.
    Spi(spi::ErrorKind),
    /// One of the GPIO lines reported a failure.
    Pin(digital::ErrorKind),
}

impl InterfaceError {
    fn spi<E: spi::Error>(err: E) -> Self {
        Self::Spi(err.kind())
    }

    fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }
}

/// Placeholder for an optional line that is not wired on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        Ok(())
    }
}

/// SPI-based interface implementation for the ADS1256 driver.
///
/// The bus must already be configured for [`BusSettings::ADS1256`]; `embedded-hal` buses
/// cannot be reclocked per transaction.
pub struct SpiInterface<SPI, CS, DRDY, D, RST = NoPin, SYNC = NoPin> {
    spi: SPI,
    cs: CS,
    drdy: DRDY,
    delay: D,
    reset: Option<RST>,
    sync: Option<SYNC>,
    in_transaction: bool,
}

impl<SPI, CS, DRDY, D> SpiInterface<SPI, CS, DRDY, D> {
    /// Creates a new interface without RESET or SYNC/PDWN lines.
    pub const fn new(spi: SPI, cs: CS, drdy: DRDY, delay: D) -> Self {
        Self {
            spi,
            cs,
            drdy,
            delay,
            reset: None,
            sync: None,
            in_transaction: false,
        }
    }
}

impl<SPI, CS, DRDY, D, RST, SYNC> SpiInterface<SPI, CS, DRDY, D, RST, SYNC> {
    /// Attaches the hardware RESET line.
    pub fn with_reset<P>(self, reset: P) -> SpiInterface<SPI, CS, DRDY, D, P, SYNC> {
        SpiInterface {
            spi: self.spi,
            cs: self.cs,
            drdy: self.drdy,
            delay: self.delay,
            reset: Some(reset),
            sync: self.sync,
            in_transaction: self.in_transaction,
        }
    }

    /// Attaches the SYNC/PDWN line.
    pub fn with_sync<P>(self, sync: P) -> SpiInterface<SPI, CS, DRDY, D, RST, P> {
        SpiInterface {
            spi: self.spi,
            cs: self.cs,
            drdy: self.drdy,
            delay: self.delay,
            reset: self.reset,
            sync: Some(sync),
            in_transaction: self.in_transaction,
        }
    }

    /// Provides mutable access to the wrapped SPI bus.
    pub fn spi_mut(&mut self) -> &mut SPI {
        &mut self.spi
    }

    /// Consumes the interface and returns the bus, CS, DRDY and delay provider.
    pub fn release(self) -> (SPI, CS, DRDY, D) {
        (self.spi, self.cs, self.drdy, self.delay)
    }
}

fn drive<P: OutputPin>(pin: &mut P, level: PinState) -> core::result::Result<(), InterfaceError> {
    pin.set_state(level).map_err(InterfaceError::pin)
}

impl<SPI, CS, DRDY, D, RST, SYNC> Ads1256Interface for SpiInterface<SPI, CS, DRDY, D, RST, SYNC>
where
    SPI: SpiBus,
    CS: OutputPin,
    DRDY: InputPin,
    D: DelayNs,
    RST: OutputPin,
    SYNC: OutputPin,
{
    type Error = InterfaceError;

    fn begin_transaction(&mut self, settings: &BusSettings) -> core::result::Result<(), Self::Error> {
        if self.in_transaction {
            warn!("bus transaction already open");
        }
        trace!("begin transaction at {} Hz", settings.clock_hz);
        self.in_transaction = true;
        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> core::result::Result<u8, Self::Error> {
        let mut buf = [byte];
        self.spi.transfer_in_place(&mut buf).map_err(InterfaceError::spi)?;
        Ok(buf[0])
    }

    fn end_transaction(&mut self) -> core::result::Result<(), Self::Error> {
        self.spi.flush().map_err(InterfaceError::spi)?;
        self.in_transaction = false;
        Ok(())
    }

    fn set_line(&mut self, line: Line, level: PinState) -> core::result::Result<(), Self::Error> {
        match line {
            Line::ChipSelect => {
                if level == PinState::High {
                    // Every clocked bit must be on the wire before CS rises.
                    self.spi.flush().map_err(InterfaceError::spi)?;
                }
                drive(&mut self.cs, level)
            }
            Line::Reset => match self.reset.as_mut() {
                Some(pin) => drive(pin, level),
                None => Ok(()),
            },
            Line::Sync => match self.sync.as_mut() {
                Some(pin) => drive(pin, level),
                None => Ok(()),
            },
        }
    }

    fn read_data_ready(&mut self) -> core::result::Result<PinState, Self::Error> {
        let high = self.drdy.is_high().map_err(InterfaceError::pin)?;
        Ok(PinState::from(high))
    }

    fn has_line(&self, line: Line) -> bool {
        match line {
            Line::ChipSelect => true,
            Line::Reset => self.reset.is_some(),
            Line::Sync => self.sync.is_some(),
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
