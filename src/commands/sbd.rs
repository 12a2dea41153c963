//! Short Burst Data buffer management, transfers and sessions.

use heapless::Vec;
use nom::bytes::complete::tag;
use nom::character::complete::space0;
use nom::combinator::opt;
use nom::IResult;

use super::parse::{i32_val, sep, u16_val, u8_val, usize_val};
use super::{after_prefix, body_str, digit_line, write_cmd, NoResponse};
use crate::error::{DetachError, Error};
use crate::helpers::sbd_checksum;
use crate::traits::SbdCmd;
use crate::types::{
    BinaryWriteStatus, ClearBuffer, SbdStatus, SbdStatusEx, SessionResult, MAX_MO_PAYLOAD,
    MAX_MT_PAYLOAD, MAX_TEXT_PAYLOAD,
};

/// `AT+SBDWT=<text>`: load the MO buffer with a text message.
///
/// The payload is emitted verbatim, which also carries the opaque output
/// of a text compression codec; it must not contain CR or LF.
pub struct WriteText<'a>(pub &'a [u8]);

impl SbdCmd for WriteText<'_> {
    type Response = NoResponse;
    const MAX_LEN: usize = 11 + MAX_TEXT_PAYLOAD;

    fn write(&self, buf: &mut [u8]) -> usize {
        const PREFIX: &[u8] = b"AT+SBDWT=";
        let len = PREFIX.len() + self.0.len() + 2;
        buf[..PREFIX.len()].copy_from_slice(PREFIX);
        buf[PREFIX.len()..PREFIX.len() + self.0.len()].copy_from_slice(self.0);
        buf[len - 2..len].copy_from_slice(b"\r\n");
        len
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT+SBDRT`: read the MT buffer as text.
pub struct ReadText;

impl SbdCmd for ReadText {
    type Response = Vec<u8, MAX_MT_PAYLOAD>;
    const MAX_LEN: usize = 10;
    const MAX_TIMEOUT_MS: u32 = 60_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDRT"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        let message = body
            .strip_prefix(b"+SBDRT:")
            .ok_or(Error::InvalidResponse)?;
        let skip = message
            .iter()
            .take_while(|c| matches!(**c, b'\r' | b'\n'))
            .count();
        Vec::from_slice(&message[skip..]).map_err(|_| Error::Overflow)
    }
}

/// `AT+SBDWB=<length>`: announce a binary MO message. Completes on the
/// `READY` prompt; the payload follows as [`WriteBinaryPayload`].
pub struct InitiateBinaryWrite {
    pub len: usize,
}

impl SbdCmd for InitiateBinaryWrite {
    type Response = NoResponse;
    const MAX_LEN: usize = 14;
    const MAX_TIMEOUT_MS: u32 = 10_000;
    const EXPECTS_PROMPT: bool = true;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDWB={}", self.len))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// Second phase of the binary write: the raw payload followed by its
/// 16 bit big-endian byte-sum checksum, no CRLF framing. The transfer
/// window is controlled by the transceiver, so no host timeout applies.
pub struct WriteBinaryPayload<'a> {
    pub data: &'a [u8],
}

impl SbdCmd for WriteBinaryPayload<'_> {
    type Response = BinaryWriteStatus;
    const MAX_LEN: usize = MAX_MO_PAYLOAD + 2;
    const MAX_TIMEOUT_MS: u32 = 0;

    fn write(&self, buf: &mut [u8]) -> usize {
        let len = self.data.len();
        buf[..len].copy_from_slice(self.data);
        buf[len..len + 2].copy_from_slice(&sbd_checksum(self.data).to_be_bytes());
        len + 2
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        digit_line(line)
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        match body.first().copied() {
            Some(digit @ b'0'..=b'9') => Ok(BinaryWriteStatus::from(digit - b'0')),
            _ => Err(Error::InvalidResponse),
        }
    }
}

/// A raw `+SBDRB` answer: the MT payload plus both checksums, verified by
/// the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMessage {
    pub payload: Vec<u8, MAX_MT_PAYLOAD>,
    /// Checksum reported in the envelope trailer.
    pub reported_checksum: u16,
    /// Checksum computed over the received payload.
    pub computed_checksum: u16,
}

impl BinaryMessage {
    pub fn checksum_ok(&self) -> bool {
        self.reported_checksum == self.computed_checksum
    }
}

/// `AT+SBDRB`: read the MT buffer as a length-prefixed binary envelope.
pub struct ReadBinary;

impl SbdCmd for ReadBinary {
    type Response = BinaryMessage;
    const MAX_LEN: usize = 10;
    const MAX_TIMEOUT_MS: u32 = 60_000;
    const BINARY_RESPONSE: bool = true;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDRB"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        if body.len() < 4 {
            return Err(Error::InvalidResponse);
        }
        let len = usize::from(u16::from_be_bytes([body[0], body[1]]));
        if body.len() != 2 + len + 2 {
            return Err(Error::InvalidResponse);
        }
        let payload_bytes = &body[2..2 + len];
        let payload = Vec::from_slice(payload_bytes).map_err(|_| Error::Overflow)?;
        Ok(BinaryMessage {
            reported_checksum: u16::from_be_bytes([body[2 + len], body[2 + len + 1]]),
            computed_checksum: sbd_checksum(payload_bytes),
            payload,
        })
    }
}

fn session_result(i: &[u8]) -> IResult<&[u8], SessionResult> {
    let (i, _) = tag("+SBDIX")(i)?;
    let (i, _) = opt(tag("A"))(i)?;
    let (i, _) = tag(":")(i)?;
    let (i, _) = space0(i)?;
    let (i, mo_status) = u8_val(i)?;
    let (i, ()) = sep(i)?;
    let (i, mo_msn) = u16_val(i)?;
    let (i, ()) = sep(i)?;
    let (i, mt_status) = u8_val(i)?;
    let (i, ()) = sep(i)?;
    let (i, mt_msn) = i32_val(i)?;
    let (i, ()) = sep(i)?;
    let (i, mt_length) = usize_val(i)?;
    let (i, ()) = sep(i)?;
    let (i, mt_queued) = u16_val(i)?;
    Ok((
        i,
        SessionResult {
            mo_status: crate::types::MoStatus(mo_status),
            mo_msn,
            mt_status: mt_status.into(),
            mt_msn,
            mt_length,
            mt_queued,
        },
    ))
}

/// `AT+SBDIX` / `AT+SBDIXA`: attempt an SBD session with the gateway.
/// The `A` variant answers a ring alert.
pub struct InitiateSession {
    pub answer_ring: bool,
}

impl SbdCmd for InitiateSession {
    type Response = SessionResult;
    const MAX_LEN: usize = 11;
    const MAX_TIMEOUT_MS: u32 = 60_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        if self.answer_ring {
            write_cmd(buf, format_args!("AT+SBDIXA"))
        } else {
            write_cmd(buf, format_args!("AT+SBDIX"))
        }
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDIX")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let (_, result) = session_result(resp?).map_err(|_| Error::Parse)?;
        Ok(result)
    }
}

fn buffer_op_result(resp: Result<&[u8], Error>) -> Result<NoResponse, Error> {
    // The transceiver answers 0 on success and 1 when the operation
    // failed, each followed by OK.
    match body_str(resp)?.trim() {
        "0" => Ok(NoResponse),
        "1" => Err(Error::Command),
        _ => Err(Error::Parse),
    }
}

/// `AT+SBDD<n>`: clear the MO buffer, the MT buffer or both. Sequence
/// numbers are not touched; see [`ResetMoMsn`] for that.
pub struct ClearBuffers(pub ClearBuffer);

impl SbdCmd for ClearBuffers {
    type Response = NoResponse;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDD{}", self.0.code()))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        digit_line(line)
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        buffer_op_result(resp)
    }
}

/// `AT+SBDC`: reset the MO message sequence number to zero.
pub struct ResetMoMsn;

impl SbdCmd for ResetMoMsn {
    type Response = NoResponse;
    const MAX_LEN: usize = 9;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDC"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        digit_line(line)
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        buffer_op_result(resp)
    }
}

/// `AT+SBDS`: buffer status.
pub struct GetStatus;

impl SbdCmd for GetStatus {
    type Response = SbdStatus;
    const MAX_LEN: usize = 9;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDS"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDS:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        fn parse(i: &[u8]) -> IResult<&[u8], SbdStatus> {
            let (i, _) = tag("+SBDS:")(i)?;
            let (i, _) = space0(i)?;
            let (i, mo) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mo_msn) = u16_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mt) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mt_msn) = i32_val(i)?;
            Ok((
                i,
                SbdStatus {
                    mo_in_buffer: mo != 0,
                    mo_msn,
                    mt_in_buffer: mt != 0,
                    mt_msn,
                },
            ))
        }
        let (_, status) = parse(body).map_err(|_| Error::Parse)?;
        Ok(status)
    }
}

/// `AT+SBDSX`: extended buffer status including ring and queue state.
pub struct GetStatusExtended;

impl SbdCmd for GetStatusExtended {
    type Response = SbdStatusEx;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDSX"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDSX:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        fn parse(i: &[u8]) -> IResult<&[u8], SbdStatusEx> {
            let (i, _) = tag("+SBDSX:")(i)?;
            let (i, _) = space0(i)?;
            let (i, mo) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mo_msn) = u16_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mt) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, mt_msn) = i32_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, ring) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, waiting) = u16_val(i)?;
            Ok((
                i,
                SbdStatusEx {
                    mo_in_buffer: mo != 0,
                    mo_msn,
                    mt_in_buffer: mt != 0,
                    mt_msn,
                    ring_pending: ring != 0,
                    mt_queued: waiting,
                },
            ))
        }
        let (_, status) = parse(body).map_err(|_| Error::Parse)?;
        Ok(status)
    }
}

/// `AT+SBDTC`: copy the MO buffer into the MT buffer (loopback test).
/// Answers with the number of bytes copied.
pub struct TransferMoToMt;

impl SbdCmd for TransferMoToMt {
    type Response = u16;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDTC"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"SBDTC")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        // "SBDTC: Outbound SBD Copied to Inbound SBD: size = <n>"
        let body = body_str(resp)?;
        let (_, size) = body.rsplit_once('=').ok_or(Error::InvalidResponse)?;
        size.trim().parse().map_err(|_| Error::Parse)
    }
}

/// `AT+SBDGW`: which gateway this transceiver is provisioned for.
pub struct GetGateway;

impl SbdCmd for GetGateway {
    type Response = heapless::String<32>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDGW"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDGW:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = body_str(resp)?;
        let gateway = after_prefix(body, "+SBDGW:")?;
        heapless::String::try_from(gateway).map_err(|_| Error::Overflow)
    }
}

/// Structured `+SBDDET` answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetachResult {
    /// `0` when the detach was performed.
    pub status: u8,
    pub error: DetachError,
}

/// `AT+SBDDET`: detach from the gateway.
pub struct Detach;

impl SbdCmd for Detach {
    type Response = DetachResult;
    const MAX_LEN: usize = 11;
    const MAX_TIMEOUT_MS: u32 = 60_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDDET"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDDET:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        fn parse(i: &[u8]) -> IResult<&[u8], (u8, u8)> {
            let (i, _) = tag("+SBDDET:")(i)?;
            let (i, _) = space0(i)?;
            let (i, status) = u8_val(i)?;
            let (i, ()) = sep(i)?;
            let (i, error) = u8_val(i)?;
            Ok((i, (status, error)))
        }
        let (_, (status, error)) = parse(body).map_err(|_| Error::Parse)?;
        Ok(DetachResult {
            status,
            error: DetachError { code: error },
        })
    }
}
