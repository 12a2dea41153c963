//! Terminal configuration, profile management and lockout handling.

use super::{after_prefix, body_str, write_cmd, NoResponse};
use crate::error::Error;
use crate::traits::SbdCmd;
use crate::types::LockStatus;

/// Bare `AT` liveness check.
pub struct Ping;

impl SbdCmd for Ping {
    type Response = NoResponse;
    const MAX_LEN: usize = 4;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `ATEn`: command echo on or off. The driver turns echo off during boot;
/// the digester tolerates both.
pub struct SetEcho(pub bool);

impl SbdCmd for SetEcho {
    type Response = NoResponse;
    const MAX_LEN: usize = 6;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("ATE{}", u8::from(self.0)))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `ATQn`: suppress (`true`) or emit (`false`) result codes.
pub struct SetQuiet(pub bool);

impl SbdCmd for SetQuiet {
    type Response = NoResponse;
    const MAX_LEN: usize = 6;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("ATQ{}", u8::from(self.0)))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `ATVn`: textual (`true`) or numeric (`false`) result codes.
pub struct SetVerbose(pub bool);

impl SbdCmd for SetVerbose {
    type Response = NoResponse;
    const MAX_LEN: usize = 6;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("ATV{}", u8::from(self.0)))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT&Kn`: RTS/CTS flow control. Disabled in three-wire installations.
pub struct SetFlowControl(pub bool);

impl SbdCmd for SetFlowControl {
    type Response = NoResponse;
    const MAX_LEN: usize = 7;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT&K{}", if self.0 { 3 } else { 0 }))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT&F0`: recall the factory default configuration.
pub struct RestoreFactoryDefaults;

impl SbdCmd for RestoreFactoryDefaults {
    type Response = NoResponse;
    const MAX_LEN: usize = 7;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT&F0"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT&W0`: store the active configuration as profile 0.
pub struct StoreActiveConfig;

impl SbdCmd for StoreActiveConfig {
    type Response = NoResponse;
    const MAX_LEN: usize = 7;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT&W0"))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT&Yn`: select the profile loaded on power-up.
pub struct DesignateResetProfile(pub u8);

impl SbdCmd for DesignateResetProfile {
    type Response = NoResponse;
    const MAX_LEN: usize = 7;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT&Y{}", self.0))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `ATZn`: soft reset, restoring the given stored profile.
pub struct SoftReset(pub u8);

impl SbdCmd for SoftReset {
    type Response = NoResponse;
    const MAX_LEN: usize = 6;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("ATZ{}", self.0))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

fn parse_lock_status(resp: Result<&[u8], Error>) -> Result<LockStatus, Error> {
    let body = body_str(resp)?;
    let code: u8 = after_prefix(body, "+CULK:")?
        .parse()
        .map_err(|_| Error::Parse)?;
    LockStatus::try_from(code).map_err(|_| Error::InvalidResponse)
}

/// `AT+CULK?`: query the SBD lockout state.
pub struct GetLockStatus;

impl SbdCmd for GetLockStatus {
    type Response = LockStatus;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CULK?"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+CULK:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        parse_lock_status(resp)
    }
}

/// `AT+CULK=<key>`: attempt to unlock the transceiver. The answer carries
/// the state after the attempt.
pub struct Unlock<'a> {
    pub key: &'a str,
}

impl SbdCmd for Unlock<'_> {
    type Response = LockStatus;
    const MAX_LEN: usize = 30;
    const MAX_TIMEOUT_MS: u32 = 30_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CULK={}", self.key))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+CULK:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        parse_lock_status(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered<Cmd: SbdCmd>(cmd: &Cmd) -> heapless::Vec<u8, 64> {
        let mut buf = [0u8; 64];
        let len = cmd.write(&mut buf);
        heapless::Vec::from_slice(&buf[..len]).unwrap()
    }

    #[test]
    fn request_framing() {
        assert_eq!(rendered(&Ping).as_slice(), b"AT\r\n");
        assert_eq!(rendered(&SetEcho(false)).as_slice(), b"ATE0\r\n");
        assert_eq!(rendered(&SetEcho(true)).as_slice(), b"ATE1\r\n");
        assert_eq!(rendered(&SetQuiet(false)).as_slice(), b"ATQ0\r\n");
        assert_eq!(rendered(&SetQuiet(true)).as_slice(), b"ATQ1\r\n");
        assert_eq!(rendered(&SetVerbose(false)).as_slice(), b"ATV0\r\n");
        assert_eq!(rendered(&SetVerbose(true)).as_slice(), b"ATV1\r\n");
        assert_eq!(rendered(&SetFlowControl(true)).as_slice(), b"AT&K3\r\n");
        assert_eq!(rendered(&SetFlowControl(false)).as_slice(), b"AT&K0\r\n");
        assert_eq!(rendered(&SoftReset(0)).as_slice(), b"ATZ0\r\n");
        assert_eq!(rendered(&Unlock { key: "1234567" }).as_slice(), b"AT+CULK=1234567\r\n");
    }

    #[test]
    fn lock_status_parses() {
        assert_eq!(
            GetLockStatus.parse(Ok(b"+CULK:0")),
            Ok(LockStatus::Unlocked)
        );
        assert_eq!(
            GetLockStatus.parse(Ok(b"+CULK: 2")),
            Ok(LockStatus::PermanentlyLocked)
        );
        assert_eq!(GetLockStatus.parse(Ok(b"+CULK:7")), Err(Error::InvalidResponse));
        assert_eq!(GetLockStatus.parse(Err(Error::Command)), Err(Error::Command));
    }
}
