//! Sample acquisition: single-shot reads, read-data-continuous and pipelined channel cycling.
//!
//! Continuous and cycling modes keep chip-select low between calls. While one of them is
//! active every request that would open another bracket fails with
//! [`Error::ModeConflict`](crate::Error::ModeConflict); call [`Ads1256::stop_acquisition`] first.
//!
//! Cycling is pipelined: each step writes the *next* input to `MUX`, restarts the modulator
//! with SYNC/WAKEUP and then clocks out the conversion of the input selected one step
//! earlier. The first sample after switching between modes may still belong to the
//! previously selected input.

use crate::codec::Sample;
use crate::device::Ads1256;
use crate::error::Result;
use crate::interface::{Ads1256Interface, Line, PinState};
use crate::params::{Channel, Input};
use crate::protocol::{self, Command, CS_GUARD_US};
use crate::registers::{Mux, REG_MUX};

/// Settle time after the first `MUX` write of a cycling session (milliseconds).
pub const CYCLE_SETTLE_MS: u32 = 50;

/// Inputs visited by [`Ads1256::cycle_single_ended`], in order.
pub const SINGLE_ENDED_CYCLE: [Input; 8] = [
    Input::single_ended(Channel::Ain0),
    Input::single_ended(Channel::Ain1),
    Input::single_ended(Channel::Ain2),
    Input::single_ended(Channel::Ain3),
    Input::single_ended(Channel::Ain4),
    Input::single_ended(Channel::Ain5),
    Input::single_ended(Channel::Ain6),
    Input::single_ended(Channel::Ain7),
];

/// Inputs visited by [`Ads1256::cycle_differential`], in order.
pub const DIFFERENTIAL_CYCLE: [Input; 4] = [
    Input::differential(Channel::Ain0, Channel::Ain1),
    Input::differential(Channel::Ain2, Channel::Ain3),
    Input::differential(Channel::Ain4, Channel::Ain5),
    Input::differential(Channel::Ain6, Channel::Ain7),
];

/// What the driver is currently doing with the bus.
///
/// Cycling variants carry the position, within their cycle, of the input whose
/// conversion the next call returns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionMode {
    /// No bracket is open.
    #[default]
    Idle,
    /// One RDATA read in its own bracket. Never outlives the call.
    SingleShot,
    /// RDATAC session on the selected input.
    ContinuousSameChannel,
    /// Pipelined cycle over AIN0..AIN7 against AINCOM.
    CycleSingleEnded(u8),
    /// Pipelined cycle over the pairs AIN0/1, AIN2/3, AIN4/5, AIN6/7.
    CycleDifferential(u8),
}

impl AcquisitionMode {
    /// Returns `true` when the mode keeps chip-select low between calls.
    pub const fn holds_bus(self) -> bool {
        matches!(
            self,
            Self::ContinuousSameChannel | Self::CycleSingleEnded(_) | Self::CycleDifferential(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cycle {
    SingleEnded,
    Differential,
}

impl Cycle {
    fn inputs(self) -> &'static [Input] {
        match self {
            Self::SingleEnded => &SINGLE_ENDED_CYCLE,
            Self::Differential => &DIFFERENTIAL_CYCLE,
        }
    }

    fn mode(self, position: u8) -> AcquisitionMode {
        match self {
            Self::SingleEnded => AcquisitionMode::CycleSingleEnded(position),
            Self::Differential => AcquisitionMode::CycleDifferential(position),
        }
    }

    /// Position of the pending input if `mode` is this cycle.
    fn position(self, mode: AcquisitionMode) -> Option<u8> {
        match (self, mode) {
            (Self::SingleEnded, AcquisitionMode::CycleSingleEnded(pos))
            | (Self::Differential, AcquisitionMode::CycleDifferential(pos)) => Some(pos),
            _ => None,
        }
    }

    fn input(self, position: u8) -> Input {
        let inputs = self.inputs();
        inputs[position as usize % inputs.len()]
    }

    fn next(self, position: u8) -> u8 {
        ((position as usize + 1) % self.inputs().len()) as u8
    }
}

impl<IFACE, CommE> Ads1256<IFACE>
where
    IFACE: Ads1256Interface<Error = CommE>,
{
    /// Reads the latest conversion of the currently selected input with RDATA.
    pub fn read_single(&mut self) -> Result<Sample, CommE> {
        self.ensure_mode_available(AcquisitionMode::SingleShot)?;

        let bytes = protocol::read_data(&mut self.interface)?;
        Ok(self.sample(self.registers.mux().input(), bytes))
    }

    /// Selects `input`, restarts the conversion and reads its first result.
    pub fn read_input(&mut self, input: Input) -> Result<Sample, CommE> {
        self.ensure_mode_available(AcquisitionMode::SingleShot)?;

        protocol::select_input(&mut self.interface, input.mux_code())?;
        self.registers.store(Mux::for_input(input));
        self.config.input = input;

        let bytes = protocol::read_data(&mut self.interface)?;
        Ok(self.sample(input, bytes))
    }

    /// Reads the next conversion in read-data-continuous mode.
    ///
    /// The first call issues RDATAC and leaves chip-select low; later calls only wait for
    /// DRDY and clock out three bytes. End the session with
    /// [`stop_acquisition`](Self::stop_acquisition).
    pub fn read_continuous(&mut self) -> Result<Sample, CommE> {
        let input = self.registers.mux().input();
        match self.mode {
            AcquisitionMode::ContinuousSameChannel => {
                protocol::wait_for_data_ready(&mut self.interface)?;
                let bytes = protocol::shift_sample(&mut self.interface)?;
                Ok(self.sample(input, bytes))
            }
            _ => {
                self.ensure_mode_available(AcquisitionMode::ContinuousSameChannel)?;

                protocol::wait_for_data_ready(&mut self.interface)?;
                protocol::open_bracket(&mut self.interface)?;
                self.mode = AcquisitionMode::ContinuousSameChannel;
                let bytes = protocol::shift_read_data_continuous(&mut self.interface)?;
                debug!("entered continuous mode on {=u8:#x}", input.mux_code());
                Ok(self.sample(input, bytes))
            }
        }
    }

    /// Returns the next sample of the AIN0..AIN7 single-ended cycle.
    ///
    /// Successive calls return every input of [`SINGLE_ENDED_CYCLE`] in order and wrap around.
    pub fn cycle_single_ended(&mut self) -> Result<Sample, CommE> {
        self.cycle_step(Cycle::SingleEnded)
    }

    /// Returns the next sample of the four-pair differential cycle.
    ///
    /// Successive calls return every input of [`DIFFERENTIAL_CYCLE`] in order and wrap around.
    pub fn cycle_differential(&mut self) -> Result<Sample, CommE> {
        self.cycle_step(Cycle::Differential)
    }

    /// Ends a continuous or cycling session and releases chip-select.
    ///
    /// Continuous mode is left with SDATAC after the next DRDY. Does nothing when idle.
    pub fn stop_acquisition(&mut self) -> Result<(), CommE> {
        match self.mode {
            AcquisitionMode::ContinuousSameChannel => {
                protocol::wait_for_data_ready(&mut self.interface)?;
                protocol::shift_command(&mut self.interface, Command::Sdatac)?;
                protocol::close_bracket(&mut self.interface)?;
            }
            AcquisitionMode::CycleSingleEnded(_) | AcquisitionMode::CycleDifferential(_) => {
                protocol::close_bracket(&mut self.interface)?;
            }
            AcquisitionMode::Idle | AcquisitionMode::SingleShot => return Ok(()),
        }
        debug!("stopped {}", self.mode);
        self.mode = AcquisitionMode::Idle;
        Ok(())
    }

    fn cycle_step(&mut self, cycle: Cycle) -> Result<Sample, CommE> {
        let position = match cycle.position(self.mode) {
            Some(position) => position,
            None => {
                self.ensure_mode_available(cycle.mode(0))?;
                self.start_cycle(cycle)?;
                0
            }
        };

        let current = cycle.input(position);
        let next_position = cycle.next(position);
        let next = cycle.input(next_position);

        protocol::wait_for_data_ready(&mut self.interface)?;
        protocol::shift_write_register(&mut self.interface, REG_MUX, next.mux_code())?;
        protocol::shift_sync_wakeup(&mut self.interface)?;
        let bytes = protocol::shift_read_data(&mut self.interface)?;

        self.registers.store(Mux::for_input(next));
        self.mode = cycle.mode(next_position);
        Ok(self.sample(current, bytes))
    }

    /// Opens the long-lived bracket and routes the first input of `cycle`.
    fn start_cycle(&mut self, cycle: Cycle) -> Result<(), CommE> {
        let first = cycle.input(0);

        protocol::wait_for_data_ready(&mut self.interface)?;
        protocol::open_bracket(&mut self.interface)?;
        self.mode = cycle.mode(0);
        protocol::shift_write_register(&mut self.interface, REG_MUX, first.mux_code())?;
        self.interface.set_line(Line::ChipSelect, PinState::High)?;
        self.interface.delay_ms(CYCLE_SETTLE_MS);
        self.interface.set_line(Line::ChipSelect, PinState::Low)?;
        self.interface.delay_us(CS_GUARD_US);

        self.registers.store(Mux::for_input(first));
        debug!("started cycle {}", self.mode);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::Error;
    use crate::interface::mock::{Event, MockBus};
    use crate::params::ByteOrder;
    use crate::protocol::DATA_DELAY_US;

    fn idle_device() -> Ads1256<MockBus> {
        Ads1256::new(MockBus::new(), Config::default())
    }

    /// MUX values written inside the cycling bracket, in order.
    fn mux_writes(adc: &mut Ads1256<MockBus>) -> std::vec::Vec<u8> {
        adc.interface_mut().writes_to(REG_MUX)
    }

    #[test]
    fn single_ended_cycle_visits_every_input_once() {
        let mut adc = idle_device();

        let inputs: std::vec::Vec<Input> = (0..8)
            .map(|_| adc.cycle_single_ended().unwrap().input)
            .collect();

        assert_eq!(inputs, SINGLE_ENDED_CYCLE);
        assert_eq!(
            mux_writes(&mut adc),
            [0x08, 0x18, 0x28, 0x38, 0x48, 0x58, 0x68, 0x78, 0x08]
        );
        assert_eq!(adc.acquisition_mode(), AcquisitionMode::CycleSingleEnded(0));
        assert_eq!(adc.cycle_single_ended().unwrap().input, SINGLE_ENDED_CYCLE[0]);
    }

    #[test]
    fn differential_cycle_closes_after_four_steps() {
        let mut adc = idle_device();

        let codes: std::vec::Vec<u8> = (0..5)
            .map(|_| adc.cycle_differential().unwrap().input.mux_code())
            .collect();

        assert_eq!(codes, [0x01, 0x23, 0x45, 0x67, 0x01]);
        assert_eq!(adc.registers().mux().input(), DIFFERENTIAL_CYCLE[1]);
    }

    #[test]
    fn cycle_setup_happens_once() {
        let mut adc = idle_device();

        adc.cycle_differential().unwrap();
        adc.cycle_differential().unwrap();
        adc.cycle_differential().unwrap();

        let bus = adc.interface_mut();
        assert_eq!(bus.events.iter().filter(|e| **e == Event::Begin).count(), 1);
        assert_eq!(
            bus.events.iter().filter(|e| **e == Event::DelayMs(CYCLE_SETTLE_MS)).count(),
            1
        );
        assert_eq!(bus.chip_selects(PinState::Low), 2);
        assert_eq!(bus.chip_selects(PinState::High), 1);
    }

    #[test]
    fn cycle_step_orders_mux_sync_and_read() {
        let mut adc = idle_device();
        adc.cycle_single_ended().unwrap();
        adc.interface_mut().clear();
        adc.interface_mut().respond(&[0x00, 0x10, 0x00]);

        let sample = adc.cycle_single_ended().unwrap();

        assert_eq!(sample.input, SINGLE_ENDED_CYCLE[1]);
        assert_eq!(sample.raw, 0x1000);
        assert_eq!(
            adc.interface_mut().events,
            [
                Event::DataReady,
                Event::Transfer(0x51),
                Event::Transfer(0x00),
                Event::Transfer(0x28),
                Event::Transfer(0xFC),
                Event::DelayUs(protocol::SYNC_DELAY_US),
                Event::Transfer(0xFF),
                Event::Transfer(0x01),
                Event::DelayUs(DATA_DELAY_US),
                Event::Transfer(0x00),
                Event::Transfer(0x00),
                Event::Transfer(0x00),
            ]
        );
    }

    #[test]
    fn switching_cycles_without_stop_is_rejected() {
        let mut adc = idle_device();
        adc.cycle_single_ended().unwrap();
        adc.interface_mut().clear();

        let err = adc.cycle_differential().unwrap_err();

        assert_eq!(
            err,
            Error::ModeConflict {
                active: AcquisitionMode::CycleSingleEnded(1),
                requested: AcquisitionMode::CycleDifferential(0),
            }
        );
        assert!(adc.interface_mut().events.is_empty());
    }

    #[test]
    fn continuous_mode_rejects_cycling_and_register_access() {
        let mut adc = idle_device();
        adc.read_continuous().unwrap();
        adc.interface_mut().clear();

        assert!(matches!(
            adc.cycle_differential(),
            Err(Error::ModeConflict { .. })
        ));
        assert!(matches!(adc.read_single(), Err(Error::ModeConflict { .. })));
        assert!(matches!(adc.set_gain(crate::params::Gain::X2), Err(Error::ModeConflict { .. })));
        assert!(adc.interface_mut().sent().is_empty());
    }

    #[test]
    fn continuous_mode_issues_rdatac_once() {
        let mut adc = idle_device();
        adc.interface_mut().respond(&[0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF]);

        let first = adc.read_continuous().unwrap();
        let second = adc.read_continuous().unwrap();

        assert_eq!(first.raw, 1);
        assert_eq!(second.raw, -1);
        assert_eq!(first.input, Config::default().input);
        let bus = adc.interface_mut();
        assert_eq!(bus.sent(), [0x03, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        assert_eq!(bus.chip_selects(PinState::Low), 1);
        assert_eq!(bus.chip_selects(PinState::High), 0);
    }

    #[test]
    fn stopping_continuous_mode_sends_sdatac_and_releases_cs() {
        let mut adc = idle_device();
        adc.read_continuous().unwrap();
        adc.interface_mut().clear();

        adc.stop_acquisition().unwrap();

        assert_eq!(
            adc.interface_mut().events,
            [
                Event::DataReady,
                Event::Transfer(0x0F),
                Event::Line(Line::ChipSelect, PinState::High),
                Event::End,
            ]
        );
        assert_eq!(adc.acquisition_mode(), AcquisitionMode::Idle);
    }

    #[test]
    fn single_shot_after_stop_uses_a_fresh_bracket() {
        let mut adc = idle_device();
        adc.cycle_differential().unwrap();
        adc.stop_acquisition().unwrap();
        adc.interface_mut().clear();

        adc.read_single().unwrap();

        let bus = adc.interface_mut();
        assert_eq!(bus.events.first(), Some(&Event::DataReady));
        assert_eq!(bus.events[1], Event::Begin);
        assert_eq!(bus.events.last(), Some(&Event::End));
        assert_eq!(bus.sent(), [0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn single_shot_after_continuous_stop_has_no_rdatac_residue() {
        let mut adc = idle_device();
        adc.read_continuous().unwrap();
        adc.read_continuous().unwrap();
        adc.stop_acquisition().unwrap();
        adc.interface_mut().clear();

        adc.read_single().unwrap();

        let bus = adc.interface_mut();
        let sent = bus.sent();
        assert_eq!(sent, [0x01, 0x00, 0x00, 0x00]);
        assert!(!sent.contains(&0x03));
        assert!(!sent.contains(&0x0F));
        assert_eq!(bus.events[1], Event::Begin);
        assert_eq!(bus.chip_selects(PinState::Low), 1);
        assert_eq!(bus.chip_selects(PinState::High), 1);
        assert_eq!(adc.acquisition_mode(), AcquisitionMode::Idle);
    }

    #[test]
    fn stop_when_idle_is_silent() {
        let mut adc = idle_device();

        adc.stop_acquisition().unwrap();

        assert!(adc.interface_mut().events.is_empty());
    }

    #[test]
    fn read_input_reroutes_before_reading() {
        let mut adc = idle_device();
        let input = Input::single_ended(Channel::Ain5);
        adc.interface_mut().respond(&[0x40, 0x00, 0x00]);

        let sample = adc.read_input(input).unwrap();

        assert_eq!(sample.input, input);
        assert_eq!(sample.raw, 1 << 22);
        assert_eq!(adc.interface_mut().sent(), [0x51, 0x00, 0x58, 0xFC, 0xFF, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(adc.registers().mux().input(), input);
        assert!((adc.sample_voltage(&sample) - 2.5).abs() < 1e-6);
    }

    #[test]
    fn samples_honour_cached_bit_order() {
        let mut adc = idle_device();
        adc.set_byte_order(ByteOrder::LsbFirst).unwrap();
        adc.interface_mut().respond(&[0x80, 0x00, 0x01]);

        assert_eq!(adc.read_single().unwrap().raw, 0x01_0080);
    }
}
