//! High-level ADS1256 device driver implementation.

use crate::acquisition::AcquisitionMode;
use crate::codec::{self, Sample, SAMPLE_BYTES};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::interface::spi::{NoPin, SpiInterface};
use crate::interface::{Ads1256Interface, Line, PinState};
use crate::params::{ByteOrder, ClockOut, DataRate, Gain, GpioDirection, Input, SensorDetect};
use crate::protocol::{self, Command};
use crate::registers::{
    Adcon,
    GpioControl,
    Register,
    RegisterSnapshot,
    Status,
    REG_ADCON,
    REG_DRATE,
    REG_MUX,
    REG_STATUS,
};

// Settle time after gain, data-rate and input changes (milliseconds).
pub(crate) const ANALOG_SETTLE_MS: u32 = 200;
// Settle time after clock-out, sensor-detect, STATUS and GPIO changes (milliseconds).
pub(crate) const FIELD_SETTLE_MS: u32 = 100;
// Width of the hardware RESET low pulse (milliseconds).
const RESET_PULSE_MS: u32 = 200;
// Oscillator start-up and register reload after a reset (milliseconds).
const RESET_RECOVERY_MS: u32 = 1_000;
// Wait before the first register write after power-up (milliseconds).
const POWER_UP_DELAY_MS: u32 = 200;
// Lets DRDY rise after a calibration command before it is polled (milliseconds).
pub(crate) const COMMAND_START_MS: u32 = 200;

/// High-level synchronous driver for the ADS1256 converter.
pub struct Ads1256<IFACE> {
    pub(crate) interface: IFACE,
    pub(crate) config: Config,
    pub(crate) registers: RegisterSnapshot,
    pub(crate) mode: AcquisitionMode,
}

impl<IFACE> Ads1256<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    ///
    /// No bus traffic happens until [`init`](Self::init).
    pub fn new(interface: IFACE, config: Config) -> Self {
        Self {
            interface,
            config,
            registers: RegisterSnapshot::power_on(),
            mode: AcquisitionMode::Idle,
        }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, Config) {
        (self.interface, self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last written or read register values.
    pub fn registers(&self) -> &RegisterSnapshot {
        &self.registers
    }

    /// Currently active acquisition mode.
    pub fn acquisition_mode(&self) -> AcquisitionMode {
        self.mode
    }

    // ==================================================================
    // == Sample Conversion =============================================
    // ==================================================================
    /// Gain as last written or read; used for every voltage conversion.
    pub fn cached_gain(&self) -> Gain {
        self.registers.adcon().gain()
    }

    /// Scales a raw code to volts using the configured reference and the cached gain.
    pub fn convert_to_voltage(&self, raw: i32) -> f32 {
        codec::to_voltage(raw, self.config.vref, self.cached_gain())
    }

    /// Scales a sample to volts using the configured reference and the cached gain.
    pub fn sample_voltage(&self, sample: &Sample) -> f32 {
        self.convert_to_voltage(sample.raw)
    }

    pub(crate) fn sample(&self, input: Input, bytes: [u8; SAMPLE_BYTES]) -> Sample {
        let order = self.registers.status().order();
        Sample {
            input,
            raw: codec::decode_ordered(bytes, order),
        }
    }
}

impl<SPI, CS, DRDY, D> Ads1256<SpiInterface<SPI, CS, DRDY, D, NoPin, NoPin>> {
    // ==================================================================
    // == SPI Convenience Constructors ==================================
    // ==================================================================
    /// Convenience constructor for boards wiring only SPI, CS and DRDY.
    pub fn new_spi(spi: SPI, cs: CS, drdy: DRDY, delay: D, config: Config) -> Self {
        Self::new(SpiInterface::new(spi, cs, drdy, delay), config)
    }
}

impl<IFACE, CommE> Ads1256<IFACE>
where
    IFACE: Ads1256Interface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Recovery =====================================
    // ==================================================================
    /// Resets the converter, programs the configuration and runs a self-calibration.
    pub fn init(&mut self) -> Result<(), CommE> {
        self.config.validate().map_err(|_| Error::InvalidConfig)?;
        self.ensure_idle()?;

        self.reset()?;
        if self.interface.has_line(Line::Sync) {
            self.interface.set_line(Line::Sync, PinState::High)?;
        }
        self.interface.delay_ms(POWER_UP_DELAY_MS);

        let config = self.config;
        self.apply_config(&config)?;
        self.command_and_wait(Command::SelfCal)?;

        info!("ADS1256 initialized, input {=u8:#x}", self.config.input.mux_code());
        Ok(())
    }

    /// Applies a new configuration to the device.
    pub fn configure(&mut self, config: Config) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;
        self.ensure_idle()?;

        self.apply_config(&config)?;
        self.config = config;
        Ok(())
    }

    /// Recovers from protocol desynchronization with a full reset and configuration replay.
    ///
    /// Any open chip-select bracket is dropped without sending further commands. This is
    /// never attempted automatically.
    pub fn recover(&mut self) -> Result<(), CommE> {
        warn!("recovering from {}", self.mode);
        self.interface.set_line(Line::ChipSelect, PinState::High)?;
        self.interface.end_transaction()?;
        self.mode = AcquisitionMode::Idle;
        self.init()
    }

    /// Resets the converter with the RESET line, or the RESET command when it is not wired.
    ///
    /// Register contents return to their power-on values.
    pub fn reset(&mut self) -> Result<(), CommE> {
        self.ensure_idle()?;

        if self.interface.has_line(Line::Reset) {
            self.interface.set_line(Line::Reset, PinState::Low)?;
            self.interface.delay_ms(RESET_PULSE_MS);
            self.interface.set_line(Line::Reset, PinState::High)?;
        } else {
            protocol::send_command(&mut self.interface, Command::Reset)?;
        }
        self.interface.delay_ms(RESET_RECOVERY_MS);

        self.registers = RegisterSnapshot::power_on();
        Ok(())
    }

    // ==================================================================
    // == Raw Register Access ===========================================
    // ==================================================================
    /// Writes a register and records the value in the snapshot.
    pub fn write_register(&mut self, address: u8, value: u8) -> Result<(), CommE> {
        self.ensure_idle()?;
        protocol::write_register(&mut self.interface, address, value)?;
        self.registers.set(address, value);
        Ok(())
    }

    /// Reads a register from the chip and refreshes the snapshot.
    pub fn read_register(&mut self, address: u8) -> Result<u8, CommE> {
        self.ensure_idle()?;
        let value = protocol::read_register(&mut self.interface, address)?;
        self.registers.set(address, value);
        Ok(value)
    }

    /// Samples DRDY without waiting. `true` means a conversion result is ready.
    pub fn poll_data_ready(&mut self) -> Result<bool, CommE> {
        Ok(self.interface.read_data_ready()? == PinState::Low)
    }

    // ==================================================================
    // == ADCON: Gain, Clock Output & Sensor Detect =====================
    // ==================================================================
    /// Sets the programmable gain.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), CommE> {
        self.update_register::<Adcon, _>(ANALOG_SETTLE_MS, |adcon| adcon.set_gain(gain))?;
        self.config.gain = gain;
        Ok(())
    }

    /// Reads the programmable gain back from the chip.
    pub fn gain(&mut self) -> Result<Gain, CommE> {
        Ok(self.refresh::<Adcon>()?.gain())
    }

    /// Sets the D0/CLKOUT divider.
    pub fn set_clock_out(&mut self, clock_out: ClockOut) -> Result<(), CommE> {
        self.update_register::<Adcon, _>(FIELD_SETTLE_MS, |adcon| adcon.set_clock_out(clock_out))?;
        self.config.clock_out = clock_out;
        Ok(())
    }

    /// Reads the D0/CLKOUT divider back from the chip.
    pub fn clock_out(&mut self) -> Result<ClockOut, CommE> {
        Ok(self.refresh::<Adcon>()?.clock_out())
    }

    /// Sets the sensor-detect current sources.
    pub fn set_sensor_detect(&mut self, sensor_detect: SensorDetect) -> Result<(), CommE> {
        self.update_register::<Adcon, _>(FIELD_SETTLE_MS, |adcon| {
            adcon.set_sensor_detect(sensor_detect)
        })?;
        self.config.sensor_detect = sensor_detect;
        Ok(())
    }

    /// Reads the sensor-detect setting back from the chip.
    pub fn sensor_detect(&mut self) -> Result<SensorDetect, CommE> {
        Ok(self.refresh::<Adcon>()?.sensor_detect())
    }

    // ==================================================================
    // == STATUS: Buffer, Auto-Calibration & Byte Order =================
    // ==================================================================
    /// Enables or disables the analog input buffer.
    pub fn set_buffer(&mut self, enabled: bool) -> Result<(), CommE> {
        self.update_register::<Status, _>(FIELD_SETTLE_MS, |status| {
            status.set_buffer_enable(enabled)
        })?;
        self.config.buffer = enabled;
        Ok(())
    }

    /// Reads the analog input buffer state from the chip.
    pub fn buffer_enabled(&mut self) -> Result<bool, CommE> {
        Ok(self.refresh::<Status>()?.buffer_enable())
    }

    /// Enables or disables automatic self-calibration.
    pub fn set_auto_calibration(&mut self, enabled: bool) -> Result<(), CommE> {
        self.update_register::<Status, _>(FIELD_SETTLE_MS, |status| {
            status.set_auto_calibration(enabled)
        })?;
        self.config.auto_calibration = enabled;
        Ok(())
    }

    /// Reads the auto-calibration state from the chip.
    pub fn auto_calibration(&mut self) -> Result<bool, CommE> {
        Ok(self.refresh::<Status>()?.auto_calibration())
    }

    /// Sets the data output bit order.
    pub fn set_byte_order(&mut self, order: ByteOrder) -> Result<(), CommE> {
        self.update_register::<Status, _>(FIELD_SETTLE_MS, |status| status.set_order(order))?;
        self.config.byte_order = order;
        Ok(())
    }

    /// Reads the data output bit order from the chip.
    pub fn byte_order(&mut self) -> Result<ByteOrder, CommE> {
        Ok(self.refresh::<Status>()?.order())
    }

    // ==================================================================
    // == DRATE & MUX ===================================================
    // ==================================================================
    /// Sets the output data rate.
    pub fn set_data_rate(&mut self, rate: DataRate) -> Result<(), CommE> {
        self.write_register(REG_DRATE, rate.code())?;
        self.interface.delay_ms(ANALOG_SETTLE_MS);
        self.config.data_rate = rate;
        Ok(())
    }

    /// Reads the output data rate. `None` when the chip holds an undocumented code.
    pub fn data_rate(&mut self) -> Result<Option<DataRate>, CommE> {
        Ok(DataRate::from_code(self.read_register(REG_DRATE)?))
    }

    /// Routes `input` to the modulator.
    pub fn set_input(&mut self, input: Input) -> Result<(), CommE> {
        self.write_register(REG_MUX, input.mux_code())?;
        self.interface.delay_ms(ANALOG_SETTLE_MS);
        self.config.input = input;
        Ok(())
    }

    /// Reads the selected input pair from the chip.
    pub fn input(&mut self) -> Result<Input, CommE> {
        Ok(Input::from_mux_code(self.read_register(REG_MUX)?))
    }

    // ==================================================================
    // == IO: Digital Pins D0..D3 =======================================
    // ==================================================================
    /// Sets the direction of all four digital pins, D0 first.
    pub fn set_gpio_direction(&mut self, dirs: [GpioDirection; GpioControl::PINS]) -> Result<(), CommE> {
        self.update_register::<GpioControl, _>(FIELD_SETTLE_MS, |gpio| gpio.set_directions(dirs))?;
        Ok(())
    }

    /// Writes the output level of all four digital pins, D0 first.
    ///
    /// Only pins configured as outputs drive the written level.
    pub fn write_gpio(&mut self, values: [bool; GpioControl::PINS]) -> Result<(), CommE> {
        self.update_register::<GpioControl, _>(FIELD_SETTLE_MS, |gpio| gpio.set_values(values))?;
        Ok(())
    }

    /// Reads the level of digital pin `pin` (0..=3).
    pub fn read_gpio(&mut self, pin: usize) -> Result<bool, CommE> {
        if pin >= GpioControl::PINS {
            return Err(Error::InvalidConfig);
        }
        let gpio = self.refresh::<GpioControl>()?;
        self.interface.delay_ms(FIELD_SETTLE_MS);
        gpio.value(pin).ok_or(Error::InvalidConfig)
    }

    /// Reads the whole `IO` register.
    pub fn gpio(&mut self) -> Result<GpioControl, CommE> {
        self.refresh()
    }

    // ==================================================================
    // == Power Management ==============================================
    // ==================================================================
    /// Enters standby with the STANDBY command. The oscillator keeps running.
    pub fn standby(&mut self) -> Result<(), CommE> {
        self.ensure_idle()?;
        protocol::send_command(&mut self.interface, Command::Standby)
            .map_err(Error::Interface)
    }

    /// Leaves standby with the WAKEUP command and restarts conversions.
    pub fn wakeup(&mut self) -> Result<(), CommE> {
        self.ensure_idle()?;
        protocol::send_command(&mut self.interface, Command::Wakeup)
            .map_err(Error::Interface)
    }

    /// Holds SYNC/PDWN low to power the chip down.
    ///
    /// Falls back to [`standby`](Self::standby) when the line is not wired.
    pub fn power_down(&mut self) -> Result<(), CommE> {
        self.ensure_idle()?;
        if self.interface.has_line(Line::Sync) {
            self.interface.set_line(Line::Sync, PinState::Low)?;
            Ok(())
        } else {
            self.standby()
        }
    }

    /// Releases SYNC/PDWN and waits for the oscillator, or sends WAKEUP without the line.
    ///
    /// Register contents survive power-down; a self-calibration is not repeated.
    pub fn power_up(&mut self) -> Result<(), CommE> {
        self.ensure_idle()?;
        if self.interface.has_line(Line::Sync) {
            self.interface.set_line(Line::Sync, PinState::High)?;
            self.interface.delay_ms(POWER_UP_DELAY_MS);
            protocol::wait_for_data_ready(&mut self.interface)?;
            Ok(())
        } else {
            self.wakeup()
        }
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    pub(crate) fn ensure_idle(&self) -> Result<(), CommE> {
        self.ensure_mode_available(AcquisitionMode::Idle)
    }

    pub(crate) fn ensure_mode_available(&self, requested: AcquisitionMode) -> Result<(), CommE> {
        if self.mode.holds_bus() {
            warn!("{} requested while {} holds the bus", requested, self.mode);
            return Err(Error::ModeConflict {
                active: self.mode,
                requested,
            });
        }
        Ok(())
    }

    /// Sends a direct command and blocks until DRDY signals completion.
    ///
    /// DRDY may still be low from the previous conversion right after the command, so
    /// polling starts only after [`COMMAND_START_MS`].
    pub(crate) fn command_and_wait(&mut self, command: Command) -> Result<(), CommE> {
        self.ensure_idle()?;
        protocol::send_command(&mut self.interface, command)?;
        self.interface.delay_ms(COMMAND_START_MS);
        protocol::wait_for_data_ready(&mut self.interface)?;
        Ok(())
    }

    fn apply_config(&mut self, config: &Config) -> Result<(), CommE> {
        self.write_settled(REG_STATUS, config.status().into(), ANALOG_SETTLE_MS)?;
        self.write_settled(REG_MUX, config.mux().into(), ANALOG_SETTLE_MS)?;
        self.write_settled(REG_ADCON, config.adcon().into(), ANALOG_SETTLE_MS)?;
        self.write_settled(REG_DRATE, config.data_rate.code(), ANALOG_SETTLE_MS)?;
        Ok(())
    }

    fn write_settled(&mut self, address: u8, value: u8, settle_ms: u32) -> Result<(), CommE> {
        self.write_register(address, value)?;
        self.interface.delay_ms(settle_ms);
        Ok(())
    }

    fn refresh<R: Register>(&mut self) -> Result<R, CommE> {
        Ok(R::from(self.read_register(R::ADDRESS)?))
    }

    /// Read-modify-write of a single register followed by `settle_ms`.
    fn update_register<R, F>(&mut self, settle_ms: u32, mutate: F) -> Result<R, CommE>
    where
        R: Register,
        F: FnOnce(&mut R),
    {
        let mut value = self.refresh::<R>()?;
        mutate(&mut value);
        self.write_settled(R::ADDRESS, value.into(), settle_ms)?;
        Ok(value)
    }
}
