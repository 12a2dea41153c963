use crate::error::Error;

/// Contract for one AT exchange with the transceiver.
///
/// Implementations declare the literal request, the timeout and the shape
/// of the expected answer; [`Client::send`](crate::Client::send) drives the
/// exchange and hands the body (everything buffered before the terminating
/// result code, CRLF-trimmed) to [`parse`](SbdCmd::parse).
pub trait SbdCmd {
    type Response;

    /// Largest request this command can emit, checksum and CRLF included.
    const MAX_LEN: usize;

    /// Per-command response timeout in milliseconds. `0` disables the
    /// timeout entirely and the engine waits indefinitely.
    const MAX_TIMEOUT_MS: u32 = 5_000;

    /// Commands that elicit no result code at all resolve immediately
    /// after the bytes are flushed.
    const EXPECTS_RESPONSE_CODE: bool = true;

    /// The command completes on a `READY` data prompt instead of `OK`.
    const EXPECTS_PROMPT: bool = false;

    /// The answer is a length-prefixed raw byte envelope rather than
    /// CRLF-delimited lines (`+SBDRB`).
    const BINARY_RESPONSE: bool = false;

    /// Serialize the request into `buf`, returning its length. Text
    /// commands carry a trailing CRLF; raw payloads are emitted verbatim.
    fn write(&self, buf: &mut [u8]) -> usize;

    /// Whether a buffered body line belongs to this command's answer.
    ///
    /// The transceiver interleaves acknowledgement chatter with real
    /// responses; lines rejected here are dropped before
    /// [`parse`](SbdCmd::parse) sees the body. The default keeps every
    /// line. Not consulted for [`BINARY_RESPONSE`](SbdCmd::BINARY_RESPONSE)
    /// answers, which are opaque envelopes rather than lines.
    fn filter_line(&self, line: &[u8]) -> bool {
        let _ = line;
        true
    }

    /// Turn the response body (or engine failure) into the typed result.
    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error>;
}

/// Classifies and frames the raw inbound byte stream.
pub trait Digester {
    /// Forget any partial classification state.
    fn reset(&mut self);

    /// Switch between CRLF line framing and the raw length-prefixed
    /// `+SBDRB` envelope.
    fn set_binary(&mut self, binary: bool);

    /// Try to extract one result from the front of `buf`, removing the
    /// bytes it consumed.
    fn digest<const N: usize>(
        &mut self,
        buf: &mut heapless::Vec<u8, N>,
    ) -> crate::digest::DigestResult<N>;
}
