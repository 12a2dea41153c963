//! Seam for an external text compression codec (Unishox2 or similar).
//!
//! Compressed text sessions run the message through an implementation of
//! [`TextCodec`] before `+SBDWT` and after `+SBDRT`; the driver treats the
//! compressed bytes as opaque.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// The output buffer is too small for the result.
    BufferTooSmall,
    /// The input could not be decoded.
    Malformed,
}

pub trait TextCodec {
    /// Compress `text` into `out`, returning the number of bytes written.
    fn compress(&self, text: &str, out: &mut [u8]) -> Result<usize, CodecError>;

    /// Decompress `data` into `out`, returning the number of bytes
    /// written. The result is expected to be valid UTF-8.
    fn decompress(&self, data: &[u8], out: &mut [u8]) -> Result<usize, CodecError>;
}
