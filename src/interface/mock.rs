//! Recording bus transport used by driver-level tests.
//!
//! Besides logging every call, the mock decodes `WREG`/`RREG` sequences against an
//! in-memory register file so read-modify-write paths see their own writes.

use std::collections::VecDeque;
use std::vec::Vec;

use super::{Ads1256Interface, BusSettings, Line, PinState};

/// Everything the driver did to the bus, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Begin,
    End,
    Transfer(u8),
    Line(Line, PinState),
    DataReady,
    DelayMs(u32),
    DelayUs(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    Command,
    WriteCount(usize),
    WriteValue(usize),
    ReadCount(usize),
    ReadValue(usize),
}

pub(crate) struct MockBus {
    pub events: Vec<Event>,
    /// Register file, addresses 0x00..=0x0A.
    pub registers: [u8; 11],
    responses: VecDeque<u8>,
    drdy: VecDeque<PinState>,
    lines: [bool; 3],
    decode: Decode,
}

impl MockBus {
    /// Transport with all optional lines wired and DRDY permanently low.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            registers: [0x01, 0x01, 0x20, 0xF0, 0xE0, 0, 0, 0, 0, 0, 0],
            responses: VecDeque::new(),
            drdy: VecDeque::new(),
            lines: [true; 3],
            decode: Decode::Command,
        }
    }

    /// Transport with only chip-select wired.
    pub fn without_optional_lines() -> Self {
        Self {
            lines: [true, false, false],
            ..Self::new()
        }
    }

    /// Queues conversion bytes, returned by the `0x00` dummy clocks. Unqueued clocks return 0.
    pub fn respond(&mut self, bytes: &[u8]) {
        self.responses.extend(bytes.iter().copied());
    }

    /// Queues DRDY samples. Once drained DRDY reads low.
    pub fn data_ready(&mut self, levels: &[PinState]) {
        self.drdy.extend(levels.iter().copied());
    }

    /// Bytes shifted out, ignoring framing.
    pub fn sent(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Transfer(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    /// Values written to `address`, in order.
    pub fn writes_to(&self, address: u8) -> Vec<u8> {
        let sent = self.sent();
        let mut writes = Vec::new();
        let mut i = 0;
        while i + 2 < sent.len() {
            if sent[i] == 0x50 | address && sent[i + 1] == 0x00 {
                writes.push(sent[i + 2]);
                i += 3;
            } else {
                i += 1;
            }
        }
        writes
    }

    /// Number of chip-select transitions to `level`.
    pub fn chip_selects(&self, level: PinState) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::Line(Line::ChipSelect, level))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn line_index(line: Line) -> usize {
        match line {
            Line::ChipSelect => 0,
            Line::Reset => 1,
            Line::Sync => 2,
        }
    }

    fn next_response(&mut self) -> u8 {
        self.responses.pop_front().unwrap_or(0)
    }
}

impl Ads1256Interface for MockBus {
    type Error = ();

    fn begin_transaction(&mut self, settings: &BusSettings) -> Result<(), ()> {
        assert_eq!(*settings, BusSettings::ADS1256);
        self.events.push(Event::Begin);
        Ok(())
    }

    fn transfer(&mut self, byte: u8) -> Result<u8, ()> {
        self.events.push(Event::Transfer(byte));
        let address = (byte & 0x0F) as usize;
        let (next, response) = match self.decode {
            Decode::Command if byte & 0xF0 == 0x50 => (Decode::WriteCount(address), 0),
            Decode::Command if byte & 0xF0 == 0x10 => (Decode::ReadCount(address), 0),
            Decode::Command if byte == 0x00 => (Decode::Command, self.next_response()),
            Decode::Command => (Decode::Command, 0),
            Decode::WriteCount(address) => (Decode::WriteValue(address), 0),
            Decode::WriteValue(address) => {
                if let Some(slot) = self.registers.get_mut(address) {
                    *slot = byte;
                }
                (Decode::Command, 0)
            }
            Decode::ReadCount(address) => (Decode::ReadValue(address), 0),
            Decode::ReadValue(address) => {
                (Decode::Command, self.registers.get(address).copied().unwrap_or(0))
            }
        };
        self.decode = next;
        Ok(response)
    }

    fn end_transaction(&mut self) -> Result<(), ()> {
        self.events.push(Event::End);
        Ok(())
    }

    fn set_line(&mut self, line: Line, level: PinState) -> Result<(), ()> {
        self.events.push(Event::Line(line, level));
        if line == Line::ChipSelect && level == PinState::High {
            self.decode = Decode::Command;
        }
        Ok(())
    }

    fn read_data_ready(&mut self) -> Result<PinState, ()> {
        self.events.push(Event::DataReady);
        Ok(self.drdy.pop_front().unwrap_or(PinState::Low))
    }

    fn has_line(&self, line: Line) -> bool {
        self.lines[Self::line_index(line)]
    }

    fn delay_ms(&mut self, ms: u32) {
        self.events.push(Event::DelayMs(ms));
    }

    fn delay_us(&mut self, us: u32) {
        self.events.push(Event::DelayUs(us));
    }
}
