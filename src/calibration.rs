//! Calibration commands and access to the offset and full-scale coefficient registers.

use crate::codec;
use crate::device::Ads1256;
use crate::error::Result;
use crate::interface::Ads1256Interface;
use crate::protocol::Command;
use crate::registers::{REG_FSC0, REG_OFC0};

const COEFFICIENT_BYTES: u8 = 3;

/// Calibration routines built into the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationKind {
    /// Offset and gain self-calibration (`SELFCAL`).
    SelfOffsetAndGain,
    /// Offset self-calibration (`SELFOCAL`).
    SelfOffset,
    /// Gain self-calibration (`SELFGCAL`).
    SelfGain,
    /// System offset calibration against a zero input applied by the caller (`SYSOCAL`).
    SystemOffset,
    /// System gain calibration against a full-scale input applied by the caller (`SYSGCAL`).
    SystemGain,
}

impl CalibrationKind {
    /// Command starting this calibration.
    pub const fn command(self) -> Command {
        match self {
            Self::SelfOffsetAndGain => Command::SelfCal,
            Self::SelfOffset => Command::SelfOffsetCal,
            Self::SelfGain => Command::SelfGainCal,
            Self::SystemOffset => Command::SystemOffsetCal,
            Self::SystemGain => Command::SystemGainCal,
        }
    }
}

/// Contents of the `OFC` and `FSC` registers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationReport {
    /// Offset coefficient, 24-bit two's complement.
    pub offset: i32,
    /// Full-scale coefficient, 24-bit unsigned.
    pub full_scale: u32,
}

/// Runs `kind`, waits for completion and reads back the resulting coefficients.
pub fn run_calibration<IFACE, CommE>(
    device: &mut Ads1256<IFACE>,
    kind: CalibrationKind,
) -> Result<CalibrationReport, CommE>
where
    IFACE: Ads1256Interface<Error = CommE>,
{
    device.command_and_wait(kind.command())?;
    let report = device.calibration_coefficients()?;
    debug!(
        "calibration {} done: offset {=i32}, full scale {=u32:#x}",
        kind, report.offset, report.full_scale
    );
    Ok(report)
}

impl<IFACE, CommE> Ads1256<IFACE>
where
    IFACE: Ads1256Interface<Error = CommE>,
{
    /// Runs a calibration and returns the coefficients the chip settled on.
    ///
    /// System calibrations expect the caller to apply the reference input beforehand.
    pub fn calibrate(&mut self, kind: CalibrationKind) -> Result<CalibrationReport, CommE> {
        run_calibration(self, kind)
    }

    /// Reads the offset and full-scale coefficients.
    pub fn calibration_coefficients(&mut self) -> Result<CalibrationReport, CommE> {
        let offset = self.read_coefficient(REG_OFC0)?;
        let full_scale = self.read_coefficient(REG_FSC0)?;
        Ok(CalibrationReport {
            offset: codec::sign_extend(offset),
            full_scale,
        })
    }

    /// Overwrites the offset and full-scale coefficients, e.g. with values saved earlier.
    pub fn set_calibration_coefficients(&mut self, report: CalibrationReport) -> Result<(), CommE> {
        self.write_coefficient(REG_OFC0, report.offset as u32)?;
        self.write_coefficient(REG_FSC0, report.full_scale)
    }

    // Coefficients are stored least significant byte first.
    fn read_coefficient(&mut self, first: u8) -> Result<u32, CommE> {
        let mut word = 0u32;
        for i in 0..COEFFICIENT_BYTES {
            word |= u32::from(self.read_register(first + i)?) << (8 * i);
        }
        Ok(word)
    }

    fn write_coefficient(&mut self, first: u8, word: u32) -> Result<(), CommE> {
        for i in 0..COEFFICIENT_BYTES {
            self.write_register(first + i, (word >> (8 * i)) as u8)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::device::COMMAND_START_MS;
    use crate::error::Error;
    use crate::interface::mock::{Event, MockBus};
    use crate::registers::{REG_FSC2, REG_OFC2};

    fn idle_device() -> Ads1256<MockBus> {
        Ads1256::new(MockBus::new(), Config::default())
    }

    #[test]
    fn kinds_map_to_calibration_commands() {
        let bytes = [
            CalibrationKind::SelfOffsetAndGain,
            CalibrationKind::SelfOffset,
            CalibrationKind::SelfGain,
            CalibrationKind::SystemOffset,
            CalibrationKind::SystemGain,
        ]
        .map(|kind| kind.command().byte());
        assert_eq!(bytes, [0xF0, 0xF1, 0xF2, 0xF3, 0xF4]);
    }

    #[test]
    fn calibration_waits_for_drdy_then_reads_coefficients() {
        let mut adc = idle_device();
        let bus = adc.interface_mut();
        bus.registers[REG_OFC0 as usize..=REG_FSC2 as usize]
            .copy_from_slice(&[0xFE, 0xFF, 0xFF, 0x00, 0x00, 0x45]);

        let report = adc.calibrate(CalibrationKind::SelfOffset).unwrap();

        assert_eq!(
            report,
            CalibrationReport {
                offset: -2,
                full_scale: 0x45_0000,
            }
        );
        let bus = adc.interface_mut();
        assert_eq!(bus.sent()[0], 0xF1);
        let end = bus.events.iter().position(|e| *e == Event::End).unwrap();
        assert_eq!(
            bus.events[end + 1..end + 3],
            [Event::DelayMs(COMMAND_START_MS), Event::DataReady]
        );
    }

    #[test]
    fn coefficients_are_written_lsb_first() {
        let mut adc = idle_device();

        adc.set_calibration_coefficients(CalibrationReport {
            offset: -1,
            full_scale: 0x12_3456,
        })
        .unwrap();

        let bus = adc.interface_mut();
        assert_eq!(bus.registers[REG_OFC0 as usize..=REG_OFC2 as usize], [0xFF, 0xFF, 0xFF]);
        assert_eq!(bus.registers[REG_FSC0 as usize..=REG_FSC2 as usize], [0x56, 0x34, 0x12]);
        assert_eq!(adc.calibration_coefficients().unwrap().offset, -1);
    }

    #[test]
    fn calibration_is_refused_while_acquiring() {
        let mut adc = idle_device();
        adc.read_continuous().unwrap();

        assert!(matches!(
            adc.calibrate(CalibrationKind::SelfGain),
            Err(Error::ModeConflict { .. })
        ));
    }
}
