//! Device identity queries.

use heapless::String;

use super::{body_str, write_cmd};
use crate::error::Error;
use crate::traits::SbdCmd;

fn text_response<const N: usize>(resp: Result<&[u8], Error>) -> Result<String<N>, Error> {
    let body = body_str(resp)?;
    String::try_from(body.trim()).map_err(|_| Error::Overflow)
}

/// `AT+CGMI`: manufacturer identification.
pub struct GetManufacturer;

impl SbdCmd for GetManufacturer {
    type Response = String<64>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CGMI"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        text_response(resp)
    }
}

/// `AT+CGMM`: model identification.
pub struct GetModel;

impl SbdCmd for GetModel {
    type Response = String<64>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CGMM"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        text_response(resp)
    }
}

/// `AT+CGMR`: software revision. Answers with several lines (call
/// processor, DSP, ...) which are returned verbatim.
pub struct GetRevision;

impl SbdCmd for GetRevision {
    type Response = String<160>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CGMR"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        text_response(resp)
    }
}

/// `AT+CGSN`: serial number (IMEI).
pub struct GetSerialNumber;

impl SbdCmd for GetSerialNumber {
    type Response = String<32>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CGSN"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        text_response(resp)
    }
}

/// `ATIn`: identification pages (`3` software revision, `4` product
/// family, `7` hardware specification, ...).
pub struct Identification(pub u8);

impl SbdCmd for Identification {
    type Response = String<64>;
    const MAX_LEN: usize = 6;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("ATI{}", self.0))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        text_response(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_bodies_are_trimmed_text() {
        assert_eq!(
            GetManufacturer.parse(Ok(b"Iridium")).unwrap().as_str(),
            "Iridium"
        );
        assert_eq!(
            GetSerialNumber.parse(Ok(b"300234060379270")).unwrap().as_str(),
            "300234060379270"
        );
        assert_eq!(
            Identification(4).parse(Ok(b"IRIDIUM 9600 Family")).unwrap().as_str(),
            "IRIDIUM 9600 Family"
        );
    }

    #[test]
    fn multi_line_revision_is_kept_verbatim() {
        let body = b"Call Processor Version: TA16005\r\nDSP Version: 1.7";
        let parsed = GetRevision.parse(Ok(body)).unwrap();
        assert!(parsed.as_str().contains("TA16005"));
        assert!(parsed.as_str().contains("DSP"));
    }
}
