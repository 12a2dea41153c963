//! Classification of the inbound byte stream.
//!
//! The 9602/9603 interleaves four kinds of traffic on one serial line:
//!
//! - solicited responses, CRLF-delimited lines terminated by `OK` or
//!   `ERROR`,
//! - the `READY` data prompt of the two-phase binary write,
//! - unsolicited result codes (`SBDRING`, `+CIEV:`, `+AREG:`) that may
//!   appear at any time, including between the lines of a pending
//!   response body,
//! - the raw length-prefixed answer of `+SBDRB`, which is not
//!   line-delimited at all.
//!
//! The digester owns no I/O. It inspects the accumulated receive buffer,
//! removes at most one classified item per call and returns it; `None`
//! means the buffer holds nothing complete yet.

use heapless::Vec;

use crate::traits::Digester;
use crate::types::MAX_MT_PAYLOAD;
use crate::urc::Urc;

#[derive(Debug, PartialEq)]
pub enum DigestResult<const N: usize> {
    /// A complete unsolicited line, plucked out even when a response body
    /// is pending around it.
    Urc(Vec<u8, N>),
    /// A terminated response: the body buffered before `OK`, or the
    /// failure reported by an `ERROR` line.
    Response(Result<Vec<u8, N>, DigestError<N>>),
    /// A data prompt; the transceiver is waiting for raw payload bytes.
    Prompt(u8),
    /// Nothing complete in the buffer yet.
    None,
}

#[derive(Debug, PartialEq)]
pub enum DigestError<const N: usize> {
    /// `ERROR` terminator; carries the diagnosis lines buffered before
    /// it, which are frequently empty.
    Command(Vec<u8, N>),
    /// The buffer filled up without a recognizable frame.
    Overflow,
}

/// Digester for the Iridium SBD AT dialect.
#[derive(Debug, Default)]
pub struct SbdDigester {
    /// When set, the next answer is the raw `+SBDRB` envelope.
    binary: bool,
}

impl SbdDigester {
    pub fn new() -> Self {
        Self::default()
    }

    fn digest_binary<const N: usize>(&mut self, buf: &mut Vec<u8, N>) -> DigestResult<N> {
        // Framing CRLF may precede the envelope. The length high byte can
        // never be 0x0D or 0x0A, so this cannot eat payload.
        let lead = buf
            .iter()
            .take_while(|c| matches!(**c, b'\r' | b'\n'))
            .count();
        if lead > 0 {
            remove_prefix(buf, lead);
        }

        if buf.len() < 2 {
            return DigestResult::None;
        }

        let len = usize::from(u16::from_be_bytes([buf[0], buf[1]]));
        if len > MAX_MT_PAYLOAD {
            // Not an envelope. The transceiver answered with result lines
            // instead, e.g. ERROR on an empty MT buffer.
            self.binary = false;
            return self.digest(buf);
        }

        let total = 2 + len + 2;
        if buf.len() < total {
            return DigestResult::None;
        }

        // The envelope is followed by a result code line; consume it here
        // so it cannot complete a later command.
        let mut cursor = total;
        while cursor < buf.len() && matches!(buf[cursor], b'\r' | b'\n') {
            cursor += 1;
        }
        let Some(pos) = buf[cursor..]
            .iter()
            .position(|&c| c == b'\r' || c == b'\n')
        else {
            return DigestResult::None;
        };
        let line_end = cursor + pos;
        let mut next = line_end;
        while next < buf.len() && matches!(buf[next], b'\r' | b'\n') {
            next += 1;
        }

        let envelope = Vec::from_slice(&buf[..total]).unwrap();
        self.binary = false;
        if &buf[cursor..line_end] == b"OK" {
            remove_prefix(buf, next);
        } else {
            // Unexpected trailer, leave it for line classification
            remove_prefix(buf, total);
        }
        DigestResult::Response(Ok(envelope))
    }
}

impl Digester for SbdDigester {
    fn reset(&mut self) {
        self.binary = false;
    }

    fn set_binary(&mut self, binary: bool) {
        self.binary = binary;
    }

    fn digest<const N: usize>(&mut self, buf: &mut Vec<u8, N>) -> DigestResult<N> {
        if self.binary {
            return self.digest_binary(buf);
        }

        let lead = buf
            .iter()
            .take_while(|c| matches!(**c, b'\r' | b'\n' | b' ' | b'\t'))
            .count();
        if lead > 0 {
            remove_prefix(buf, lead);
        }

        let mut start = 0;
        while let Some(pos) = buf[start..]
            .iter()
            .position(|&c| c == b'\r' || c == b'\n')
        {
            let end = start + pos;
            let mut next = end;
            while next < buf.len() && matches!(buf[next], b'\r' | b'\n') {
                next += 1;
            }

            let line = &buf[start..end];
            if line.is_empty() {
                start = next;
                continue;
            }

            if Urc::matches(line) {
                let urc = Vec::from_slice(line).unwrap();
                splice_out(buf, start, next);
                return DigestResult::Urc(urc);
            }
            if line == b"OK" {
                let body = trimmed(&buf[..start]);
                remove_prefix(buf, next);
                return DigestResult::Response(Ok(body));
            }
            if line == b"ERROR" {
                let diagnosis = trimmed(&buf[..start]);
                remove_prefix(buf, next);
                return DigestResult::Response(Err(DigestError::Command(diagnosis)));
            }
            if start == 0 && line == b"READY" {
                remove_prefix(buf, next);
                return DigestResult::Prompt(b'R');
            }
            if start == 0 && line.starts_with(b"AT") {
                // Command echo, present until ATE0 takes effect
                remove_prefix(buf, next);
                return DigestResult::None;
            }

            // Response body line, kept buffered until the terminator
            start = next;
        }

        if buf.is_full() {
            buf.clear();
            return DigestResult::Response(Err(DigestError::Overflow));
        }
        DigestResult::None
    }
}

fn remove_prefix<const N: usize>(buf: &mut Vec<u8, N>, n: usize) {
    let len = buf.len();
    buf.as_mut_slice().copy_within(n..len, 0);
    buf.truncate(len - n);
}

fn splice_out<const N: usize>(buf: &mut Vec<u8, N>, start: usize, end: usize) {
    let len = buf.len();
    buf.as_mut_slice().copy_within(end..len, start);
    buf.truncate(len - (end - start));
}

fn trimmed<const N: usize>(bytes: &[u8]) -> Vec<u8, N> {
    let is_frame = |c: &u8| matches!(*c, b'\r' | b'\n' | b' ' | b'\t');
    let first = bytes.iter().position(|c| !is_frame(c));
    let last = bytes.iter().rposition(|c| !is_frame(c));
    match (first, last) {
        (Some(first), Some(last)) => Vec::from_slice(&bytes[first..=last]).unwrap(),
        _ => Vec::new(),
    }
}
