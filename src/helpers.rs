/// Wrapper for printing byte slices that are usually, but not always, ASCII.
pub struct LossyStr<'a>(pub &'a [u8]);

impl<'a> core::fmt::Debug for LossyStr<'a> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match core::str::from_utf8(self.0) {
            Ok(s) => write!(f, "{:?}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(feature = "defmt")]
impl<'a> defmt::Format for LossyStr<'a> {
    fn format(&self, fmt: defmt::Formatter<'_>) {
        defmt::write!(fmt, "{=[u8]:a}", self.0)
    }
}

/// DTE checksum trailing every `+SBDWB` payload and every `+SBDRB` answer:
/// the low 16 bits of the byte-wise sum, transmitted big-endian.
pub fn sbd_checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |sum, byte| sum.wrapping_add(u16::from(*byte)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_of_abc() {
        // 0x41 + 0x42 + 0x43 = 0xC6, emitted as [0x00, 0xC6]
        let sum = sbd_checksum(&[0x41, 0x42, 0x43]);
        assert_eq!(sum, 0x00C6);
        assert_eq!(sum.to_be_bytes(), [0x00, 0xC6]);
    }

    #[test]
    fn checksum_is_truncated_to_16_bits() {
        let payload = [0xFF; 340];
        assert_eq!(sbd_checksum(&payload), (0xFFu32 * 340 % 0x1_0000) as u16);
    }

    #[test]
    fn checksum_of_empty_payload() {
        assert_eq!(sbd_checksum(&[]), 0);
    }
}
