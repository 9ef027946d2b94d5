//! Conversion word decoding and voltage scaling.

use crate::params::{ByteOrder, Gain, Input};

/// Number of bytes in one conversion result.
pub const SAMPLE_BYTES: usize = 3;

/// Positive full-scale code count, 2^23.
pub const FULL_SCALE_CODES: i32 = 1 << 23;

const WORD_MASK: u32 = 0x00FF_FFFF;
const SIGN_BIT: u32 = 1 << 23;

/// One conversion result tagged with the input it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Input pair routed to the modulator for this conversion.
    pub input: Input,
    /// Sign-extended 24-bit conversion code.
    pub raw: i32,
}

impl Sample {
    /// Scales the raw code to volts.
    pub fn voltage(&self, vref: f32, gain: Gain) -> f32 {
        to_voltage(self.raw, vref, gain)
    }
}

/// Composes the 24-bit word from three bytes in the order the chip shifted them out.
///
/// Bytes always arrive most significant byte first. With [`ByteOrder::LsbFirst`] the bits
/// inside each byte are reversed.
pub fn compose(bytes: [u8; SAMPLE_BYTES], order: ByteOrder) -> u32 {
    let [b0, b1, b2] = match order {
        ByteOrder::MsbFirst => bytes,
        ByteOrder::LsbFirst => bytes.map(u8::reverse_bits),
    };
    u32::from_be_bytes([0, b0, b1, b2])
}

/// Sign-extends a 24-bit two's-complement word.
pub const fn sign_extend(word: u32) -> i32 {
    let word = word & WORD_MASK;
    if word & SIGN_BIT != 0 {
        word as i32 - (1 << 24)
    } else {
        word as i32
    }
}

/// Decodes three MSB-first bytes into a signed conversion code.
pub fn decode(bytes: [u8; SAMPLE_BYTES]) -> i32 {
    sign_extend(compose(bytes, ByteOrder::MsbFirst))
}

/// Decodes three bytes honouring the configured output bit order.
pub fn decode_ordered(bytes: [u8; SAMPLE_BYTES], order: ByteOrder) -> i32 {
    sign_extend(compose(bytes, order))
}

/// Converts a conversion code to volts: `(2 · vref / 2^23) · raw / 2^gain_code`.
pub fn to_voltage(raw: i32, vref: f32, gain: Gain) -> f32 {
    ((2.0 * vref) / FULL_SCALE_CODES as f32) * raw as f32 / gain.multiplier() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Channel;

    #[test]
    fn negative_full_scale_sign_extends() {
        assert_eq!(decode([0x80, 0x00, 0x00]), -8_388_608);
        assert_eq!(decode([0xFF, 0xFF, 0xFF]), -1);
    }

    #[test]
    fn positive_codes_pass_through() {
        assert_eq!(decode([0x7F, 0xFF, 0xFF]), 8_388_607);
        assert_eq!(decode([0x00, 0x00, 0x01]), 1);
        assert_eq!(decode([0x12, 0x34, 0x56]), 0x12_3456);
    }

    #[test]
    fn sign_bit_subtracts_two_to_the_24() {
        for word in [0x80_0000u32, 0x80_0001, 0xC0_0000, 0xFF_FFFE] {
            assert_eq!(sign_extend(word), word as i32 - (1 << 24));
        }
        for word in [0u32, 1, 0x40_0000, 0x7F_FFFF] {
            assert_eq!(sign_extend(word), word as i32);
        }
    }

    #[test]
    fn lsb_first_reverses_bits_within_each_byte() {
        // Byte order stays MSB first; 0x010000 arrives as 0x80 0x00 0x00.
        assert_eq!(compose([0x80, 0x00, 0x00], ByteOrder::LsbFirst), 0x01_0000);
        assert_eq!(compose([0x48, 0x2C, 0x6A], ByteOrder::LsbFirst), 0x12_3456);
        assert_eq!(decode_ordered([0x00, 0x00, 0x01], ByteOrder::LsbFirst), 0x80);
        assert_eq!(decode_ordered([0x01, 0x00, 0x00], ByteOrder::LsbFirst), -8_388_608);
        assert_eq!(decode_ordered([0x12, 0x34, 0x56], ByteOrder::MsbFirst), 0x12_3456);
    }

    #[test]
    fn half_scale_at_unity_gain_is_vref() {
        // Full scale at gain 1 spans ±2·VREF.
        let volts = to_voltage(1 << 22, 2.5, Gain::X1);
        assert!((volts - 2.5).abs() < 1e-6);
        let quarter = to_voltage(1 << 21, 2.5, Gain::X1);
        assert!((quarter - 1.25).abs() < 1e-6);
    }

    #[test]
    fn gain_divides_the_range() {
        let unity = to_voltage(1 << 22, 2.5, Gain::X1);
        let x64 = to_voltage(1 << 22, 2.5, Gain::X64);
        assert!((unity / x64 - 64.0).abs() < 1e-3);
        assert!((to_voltage(-(1 << 23), 2.5, Gain::X1) + 5.0).abs() < 1e-6);
    }

    #[test]
    fn conversion_is_repeatable() {
        let sample = Sample {
            input: Input::single_ended(Channel::Ain2),
            raw: -1_234_567,
        };
        let first = sample.voltage(2.5, Gain::X4);
        let second = sample.voltage(2.5, Gain::X4);
        assert_eq!(first.to_bits(), second.to_bits());
    }
}
