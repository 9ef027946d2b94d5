//! Command set and timed byte sequences for the ADS1256 serial interface.
//!
//! Functions in this module come in two flavours:
//!
//! * bracketed operations ([`write_register`], [`read_register`], [`send_command`],
//!   [`read_data`]) that wait for DRDY where required, open a chip-select bracket, exchange
//!   their bytes and close the bracket again;
//! * in-bracket primitives ([`open_bracket`], [`shift_write_register`], [`shift_read_data`],
//!   [`shift_sample`], [`shift_command`], [`shift_sync_wakeup`], [`close_bracket`]) used by the acquisition
//!   engine, which keeps chip-select low across several commands.
//!
//! DRDY waits are unbounded busy polls. The chip gives no timeout signal, so callers that
//! need bounded latency must wrap the whole driver.

use crate::codec::SAMPLE_BYTES;
use crate::interface::{Ads1256Interface, BusSettings, Line, PinState};
use crate::registers::{REGISTER_ADDRESS_MASK, REG_MUX};

/// Delay between CS falling and the first clock edge, and after direct commands.
pub const CS_GUARD_US: u32 = 5;
/// t6: command to first data bit, 50 master clock periods (≈ 6.51 µs at 7.68 MHz).
pub const DATA_DELAY_US: u32 = 7;
/// t11: SYNC to WAKEUP, 24 master clock periods (≈ 3.125 µs).
pub const SYNC_DELAY_US: u32 = 4;

/// Second command byte of `RREG`/`WREG`: number of registers minus one.
const SINGLE_REGISTER: u8 = 0x00;
/// Byte clocked out while reading a register.
const DUMMY: u8 = 0xFF;
/// Byte clocked out while shifting conversion data. Must not alias SDATAC or RESET.
const DATA_DUMMY: u8 = 0x00;

/// Commands understood by the ADS1256 (datasheet table 24).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Read a single conversion result.
    Rdata = 0x01,
    /// Enter read-data-continuous mode.
    Rdatac = 0x03,
    /// Leave read-data-continuous mode.
    Sdatac = 0x0F,
    /// Read registers; OR-ed with the start address.
    Rreg = 0x10,
    /// Write registers; OR-ed with the start address.
    Wreg = 0x50,
    /// Offset and gain self-calibration.
    SelfCal = 0xF0,
    /// Offset self-calibration.
    SelfOffsetCal = 0xF1,
    /// Gain self-calibration.
    SelfGainCal = 0xF2,
    /// System offset calibration.
    SystemOffsetCal = 0xF3,
    /// System gain calibration.
    SystemGainCal = 0xF4,
    /// Synchronize the conversion.
    Sync = 0xFC,
    /// Enter standby.
    Standby = 0xFD,
    /// Reset registers to power-up values.
    Reset = 0xFE,
    /// Complete SYNC and exit standby.
    Wakeup = 0xFF,
}

impl Command {
    /// Returns the command byte.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// First byte of a register read starting at `address`.
    pub const fn read_register(address: u8) -> u8 {
        Self::Rreg.byte() | (address & REGISTER_ADDRESS_MASK)
    }

    /// First byte of a register write starting at `address`.
    pub const fn write_register(address: u8) -> u8 {
        Self::Wreg.byte() | (address & REGISTER_ADDRESS_MASK)
    }
}

/// Busy-polls DRDY until it reads low.
pub fn wait_for_data_ready<IFACE>(interface: &mut IFACE) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    while interface.read_data_ready()? == PinState::High {}
    Ok(())
}

/// Claims the bus, pulls CS low and waits out the guard time.
pub fn open_bracket<IFACE>(interface: &mut IFACE) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    interface.begin_transaction(&BusSettings::ADS1256)?;
    interface.set_line(Line::ChipSelect, PinState::Low)?;
    interface.delay_us(CS_GUARD_US);
    Ok(())
}

/// Raises CS and releases the bus.
pub fn close_bracket<IFACE>(interface: &mut IFACE) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    interface.set_line(Line::ChipSelect, PinState::High)?;
    interface.end_transaction()
}

/// Shifts a single-register `WREG` sequence inside an open bracket.
pub fn shift_write_register<IFACE>(
    interface: &mut IFACE,
    address: u8,
    value: u8,
) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    interface.transfer(Command::write_register(address))?;
    interface.transfer(SINGLE_REGISTER)?;
    interface.transfer(value)?;
    Ok(())
}

/// Shifts out the three bytes of a pending conversion.
pub fn shift_sample<IFACE>(interface: &mut IFACE) -> Result<[u8; SAMPLE_BYTES], IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    let mut bytes = [0u8; SAMPLE_BYTES];
    for byte in bytes.iter_mut() {
        *byte = interface.transfer(DATA_DUMMY)?;
    }
    Ok(bytes)
}

/// Issues `command` (RDATA or RDATAC), waits t6 and shifts out the first result.
fn shift_data_command<IFACE>(
    interface: &mut IFACE,
    command: Command,
) -> Result<[u8; SAMPLE_BYTES], IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    shift_command(interface, command)?;
    interface.delay_us(DATA_DELAY_US);
    shift_sample(interface)
}

/// Issues RDATA inside an open bracket and returns the conversion bytes.
pub fn shift_read_data<IFACE>(interface: &mut IFACE) -> Result<[u8; SAMPLE_BYTES], IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    shift_data_command(interface, Command::Rdata)
}

/// Issues RDATAC inside an open bracket and returns the first conversion bytes.
pub fn shift_read_data_continuous<IFACE>(
    interface: &mut IFACE,
) -> Result<[u8; SAMPLE_BYTES], IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    shift_data_command(interface, Command::Rdatac)
}

/// Shifts a single command byte inside an open bracket.
pub fn shift_command<IFACE>(interface: &mut IFACE, command: Command) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    interface.transfer(command.byte())?;
    Ok(())
}

/// Restarts the modulator with SYNC, t11, WAKEUP inside an open bracket.
pub fn shift_sync_wakeup<IFACE>(interface: &mut IFACE) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    shift_command(interface, Command::Sync)?;
    interface.delay_us(SYNC_DELAY_US);
    shift_command(interface, Command::Wakeup)
}

/// Writes one register: DRDY wait, then `[WREG | addr, 0x00, value]` in its own bracket.
pub fn write_register<IFACE>(interface: &mut IFACE, address: u8, value: u8) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    wait_for_data_ready(interface)?;
    open_bracket(interface)?;
    shift_write_register(interface, address, value)?;
    close_bracket(interface)?;
    trace!("wrote register {=u8:#x} = {=u8:#x}", address, value);
    Ok(())
}

/// Reads one register: DRDY wait, then `[RREG | addr, 0x00]`, t6 and one dummy byte.
pub fn read_register<IFACE>(interface: &mut IFACE, address: u8) -> Result<u8, IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    wait_for_data_ready(interface)?;
    open_bracket(interface)?;
    interface.transfer(Command::read_register(address))?;
    interface.transfer(SINGLE_REGISTER)?;
    interface.delay_us(DATA_DELAY_US);
    let value = interface.transfer(DUMMY)?;
    close_bracket(interface)?;
    trace!("read register {=u8:#x} = {=u8:#x}", address, value);
    Ok(value)
}

/// Sends a direct command in its own bracket without waiting for DRDY.
pub fn send_command<IFACE>(interface: &mut IFACE, command: Command) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    open_bracket(interface)?;
    shift_command(interface, command)?;
    interface.delay_us(CS_GUARD_US);
    close_bracket(interface)?;
    debug!("sent command {}", command);
    Ok(())
}

/// Reads the latest conversion with RDATA: DRDY wait, bracket, command, t6, three bytes.
pub fn read_data<IFACE>(interface: &mut IFACE) -> Result<[u8; SAMPLE_BYTES], IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    wait_for_data_ready(interface)?;
    open_bracket(interface)?;
    let bytes = shift_read_data(interface)?;
    close_bracket(interface)?;
    Ok(bytes)
}

/// Selects a new input and restarts conversion on it: MUX write, SYNC, t11, WAKEUP.
///
/// Runs in a single bracket after DRDY, so the next DRDY falling edge belongs to `mux`.
pub fn select_input<IFACE>(interface: &mut IFACE, mux: u8) -> Result<(), IFACE::Error>
where
    IFACE: Ads1256Interface,
{
    wait_for_data_ready(interface)?;
    open_bracket(interface)?;
    shift_write_register(interface, REG_MUX, mux)?;
    shift_sync_wakeup(interface)?;
    close_bracket(interface)
}
