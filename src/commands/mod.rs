//! Typed wrappers around every AT command of the 9602/9603 dialect this
//! driver speaks. Each command declares its literal request, timeout and
//! response shape through [`SbdCmd`](crate::SbdCmd).

pub mod control;
pub mod identity;
pub mod network;
pub mod sbd;

use crate::error::Error;

/// Response of commands that answer with a bare result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoResponse;

struct CmdWriter<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl core::fmt::Write for CmdWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let end = self.len + bytes.len();
        if end > self.buf.len() {
            return Err(core::fmt::Error);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

/// Format a command line into `buf` and append the CRLF terminator.
pub(crate) fn write_cmd(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    let mut writer = CmdWriter { buf, len: 0 };
    let _ = writer.write_fmt(args);
    let _ = writer.write_str("\r\n");
    writer.len
}

pub(crate) fn body_str<'a>(resp: Result<&'a [u8], Error>) -> Result<&'a str, Error> {
    core::str::from_utf8(resp?).map_err(|_| Error::Parse)
}

/// Strip a `+XXX:` style prefix and surrounding whitespace from a body.
pub(crate) fn after_prefix<'a>(body: &'a str, prefix: &str) -> Result<&'a str, Error> {
    body.trim()
        .strip_prefix(prefix)
        .map(str::trim)
        .ok_or(Error::InvalidResponse)
}

/// Body filter for commands answered with a bare result digit, like
/// `+SBDD` and the second `+SBDWB` phase.
pub(crate) fn digit_line(line: &[u8]) -> bool {
    line.len() == 1 && line[0].is_ascii_digit()
}

/// nom building blocks for the comma-separated numeric responses
/// (`+SBDIX`, `+SBDS`, `+CRIS`, ...).
pub(crate) mod parse {
    use nom::bytes::complete::tag;
    use nom::character::complete::{digit1, space0};
    use nom::combinator::{map_res, opt, recognize};
    use nom::sequence::{pair, tuple};
    use nom::IResult;

    fn from_digits<T: core::str::FromStr>(digits: &[u8]) -> Result<T, ()> {
        core::str::from_utf8(digits)
            .map_err(|_| ())
            .and_then(|s| s.parse().map_err(|_| ()))
    }

    pub fn u8_val(i: &[u8]) -> IResult<&[u8], u8> {
        map_res(digit1, from_digits::<u8>)(i)
    }

    pub fn u16_val(i: &[u8]) -> IResult<&[u8], u16> {
        map_res(digit1, from_digits::<u16>)(i)
    }

    pub fn usize_val(i: &[u8]) -> IResult<&[u8], usize> {
        map_res(digit1, from_digits::<usize>)(i)
    }

    pub fn i32_val(i: &[u8]) -> IResult<&[u8], i32> {
        map_res(recognize(pair(opt(tag("-")), digit1)), from_digits::<i32>)(i)
    }

    /// A field separator: a comma with optional spaces around it.
    pub fn sep(i: &[u8]) -> IResult<&[u8], ()> {
        let (i, _) = tuple((space0, tag(","), space0))(i)?;
        Ok((i, ()))
    }
}
