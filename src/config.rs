//! Configuration primitives for the ADS1256 driver.

use crate::params::{ByteOrder, Channel, ClockOut, DataRate, Gain, Input, SensorDetect};
use crate::registers::{Adcon, Mux, Status};

/// Smallest reference voltage (VREFP − VREFN) the datasheet allows.
pub const VREF_MIN: f32 = 0.5;
/// Largest reference voltage the datasheet allows.
pub const VREF_MAX: f32 = 2.6;

/// User-facing configuration for the ADS1256 converter.
///
/// Applied by [`Ads1256::init`](crate::device::Ads1256::init) and replayed by
/// [`Ads1256::recover`](crate::device::Ads1256::recover).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Reference voltage in volts, used to scale conversion codes.
    pub vref: f32,
    /// Analog input buffer enable.
    pub buffer: bool,
    /// Automatic self-calibration after gain, rate or buffer changes.
    pub auto_calibration: bool,
    /// Data output bit order.
    pub byte_order: ByteOrder,
    /// Input pair selected after initialization.
    pub input: Input,
    /// Clock output divider.
    pub clock_out: ClockOut,
    /// Sensor-detect current sources.
    pub sensor_detect: SensorDetect,
    /// Programmable gain.
    pub gain: Gain,
    /// Output data rate.
    pub data_rate: DataRate,
}

impl Config {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Checks whether this configuration is valid according to datasheet rules.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if !self.vref.is_finite() || self.vref < VREF_MIN || self.vref > VREF_MAX {
            return Err(ConfigError::ReferenceOutOfRange);
        }

        Ok(())
    }

    /// `STATUS` value applying the buffer, auto-calibration and byte order settings.
    pub fn status(&self) -> Status {
        Status::new()
            .with_buffer_enable(self.buffer)
            .with_auto_calibration(self.auto_calibration)
            .with_order(self.byte_order)
    }

    /// `MUX` value selecting the initial input.
    pub fn mux(&self) -> Mux {
        Mux::for_input(self.input)
    }

    /// `ADCON` value applying clock-out, sensor-detect and gain settings.
    pub fn adcon(&self) -> Adcon {
        let mut adcon = Adcon::new()
            .with_clock_out(self.clock_out)
            .with_sensor_detect(self.sensor_detect);
        adcon.set_gain(self.gain);
        adcon
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the reference voltage.
    pub fn vref(mut self, vref: f32) -> Self {
        self.config.vref = vref;
        self
    }

    /// Enables or disables the analog input buffer.
    pub fn buffer(mut self, enabled: bool) -> Self {
        self.config.buffer = enabled;
        self
    }

    /// Enables or disables automatic self-calibration.
    pub fn auto_calibration(mut self, enabled: bool) -> Self {
        self.config.auto_calibration = enabled;
        self
    }

    /// Sets the data output bit order.
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.config.byte_order = order;
        self
    }

    /// Sets the initial input pair.
    pub fn input(mut self, input: Input) -> Self {
        self.config.input = input;
        self
    }

    /// Sets the clock output divider.
    pub fn clock_out(mut self, clock_out: ClockOut) -> Self {
        self.config.clock_out = clock_out;
        self
    }

    /// Sets the sensor-detect current.
    pub fn sensor_detect(mut self, sensor_detect: SensorDetect) -> Self {
        self.config.sensor_detect = sensor_detect;
        self
    }

    /// Sets the programmable gain.
    pub fn gain(mut self, gain: Gain) -> Self {
        self.config.gain = gain;
        self
    }

    /// Sets the output data rate.
    pub fn data_rate(mut self, data_rate: DataRate) -> Self {
        self.config.data_rate = data_rate;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vref: 2.5,
            buffer: true,
            auto_calibration: true,
            byte_order: ByteOrder::MsbFirst,
            input: Input::differential(Channel::Ain0, Channel::Ain1),
            clock_out: ClockOut::Off,
            sensor_detect: SensorDetect::Off,
            gain: Gain::X1,
            data_rate: DataRate::Sps100,
        }
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Reference voltage is outside `VREF_MIN..=VREF_MAX` or not a number.
    ReferenceOutOfRange,
}
