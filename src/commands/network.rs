//! Signal, time, registration and ring alert configuration.

use nom::character::complete::space0;
use nom::bytes::complete::tag;

use super::parse::{sep, u8_val};
use super::{after_prefix, body_str, write_cmd, NoResponse};
use crate::error::Error;
use crate::traits::SbdCmd;
use crate::types::{
    NetworkTime, RegistrationResult, RegistrationStatus, RingIndicationStatus,
};

/// `AT+CSQ`: current signal quality `[0, 5]`. The transceiver may take up
/// to 50 seconds to measure.
pub struct GetSignalQuality;

impl SbdCmd for GetSignalQuality {
    type Response = u8;
    const MAX_LEN: usize = 9;
    const MAX_TIMEOUT_MS: u32 = 50_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CSQ"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+CSQ:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = body_str(resp)?;
        after_prefix(body, "+CSQ:")?.parse().map_err(|_| Error::Parse)
    }
}

/// `AT+CSQF`: last known signal quality, returned immediately.
pub struct GetLastSignalQuality;

impl SbdCmd for GetLastSignalQuality {
    type Response = u8;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CSQF"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+CSQF:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = body_str(resp)?;
        after_prefix(body, "+CSQF:")?.parse().map_err(|_| Error::Parse)
    }
}

/// `AT+CIER=1,<signal>,<service>,0`: select which `+CIEV` indicator
/// events the transceiver reports.
pub struct SetIndicatorReporting {
    pub signal: bool,
    pub service: bool,
}

impl SetIndicatorReporting {
    /// Report signal quality changes only; used while waiting for network.
    pub fn signal_only() -> Self {
        Self {
            signal: true,
            service: false,
        }
    }

    /// Stop reporting all indicators.
    pub fn off() -> Self {
        Self {
            signal: false,
            service: false,
        }
    }
}

impl SbdCmd for SetIndicatorReporting {
    type Response = NoResponse;
    const MAX_LEN: usize = 20;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(
            buf,
            format_args!(
                "AT+CIER=1,{},{},0",
                u8::from(self.signal),
                u8::from(self.service)
            ),
        )
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT-MSSTM`: Iridium network time. `None` when the transceiver has no
/// network service to fetch it from.
pub struct GetSystemTime;

impl SbdCmd for GetSystemTime {
    type Response = Option<NetworkTime>;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT-MSSTM"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"-MSSTM:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = body_str(resp)?;
        let value = after_prefix(body, "-MSSTM:")?;
        if value == "no network service" {
            return Ok(None);
        }
        u32::from_str_radix(value, 16)
            .map(|ticks| Some(NetworkTime { ticks }))
            .map_err(|_| Error::Parse)
    }
}

fn registration_fields(body: &[u8]) -> Result<(u8, Option<u8>), Error> {
    let (rest, _) = tag::<_, _, nom::error::Error<&[u8]>>("+SBDREG:")(body)
        .map_err(|_| Error::InvalidResponse)?;
    let (rest, _) = space0::<_, nom::error::Error<&[u8]>>(rest).map_err(|_| Error::Parse)?;
    let (rest, status) = u8_val(rest).map_err(|_| Error::Parse)?;
    match sep(rest) {
        Ok((rest, ())) => {
            let (_, error) = u8_val(rest).map_err(|_| Error::Parse)?;
            Ok((status, Some(error)))
        }
        Err(_) => Ok((status, None)),
    }
}

/// `AT+SBDREG?`: query the gateway registration state.
pub struct GetRegistrationStatus;

impl SbdCmd for GetRegistrationStatus {
    type Response = RegistrationStatus;
    const MAX_LEN: usize = 12;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDREG?"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDREG:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let (status, _) = registration_fields(resp?)?;
        Ok(status.into())
    }
}

/// `AT+SBDREG[=<location>]`: trigger a manual network registration.
pub struct Register<'a> {
    pub location: Option<&'a str>,
}

impl SbdCmd for Register<'_> {
    type Response = RegistrationResult;
    const MAX_LEN: usize = 40;
    const MAX_TIMEOUT_MS: u32 = 60_000;

    fn write(&self, buf: &mut [u8]) -> usize {
        match self.location {
            Some(location) => write_cmd(buf, format_args!("AT+SBDREG={}", location)),
            None => write_cmd(buf, format_args!("AT+SBDREG")),
        }
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDREG:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let (status, error) = registration_fields(resp?)?;
        Ok(RegistrationResult {
            status: status.into(),
            error: error.unwrap_or(0),
        })
    }
}

/// `AT+SBDAREG=<mode>`: automatic registration on or off.
pub struct SetAutoRegistration(pub bool);

impl SbdCmd for SetAutoRegistration {
    type Response = NoResponse;
    const MAX_LEN: usize = 16;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDAREG={}", u8::from(self.0)))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT+CRIS`: ring indication status. The second field reports whether an
/// SBD ring alert arrived since the last session.
pub struct GetRingIndicationStatus;

impl SbdCmd for GetRingIndicationStatus {
    type Response = RingIndicationStatus;
    const MAX_LEN: usize = 10;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+CRIS"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+CRIS:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = resp?;
        let (rest, _) = tag::<_, _, nom::error::Error<&[u8]>>("+CRIS:")(body)
            .map_err(|_| Error::InvalidResponse)?;
        let (rest, _) = space0::<_, nom::error::Error<&[u8]>>(rest).map_err(|_| Error::Parse)?;
        let (rest, _tri) = u8_val(rest).map_err(|_| Error::Parse)?;
        let (rest, ()) = sep(rest).map_err(|_| Error::Parse)?;
        let (_, sri) = u8_val(rest).map_err(|_| Error::Parse)?;
        Ok(sri.into())
    }
}

/// `AT+SBDMTA=<mode>`: SBD ring alerts on or off.
pub struct SetRingAlerts(pub bool);

impl SbdCmd for SetRingAlerts {
    type Response = NoResponse;
    const MAX_LEN: usize = 14;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDMTA={}", u8::from(self.0)))
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        resp.map(|_| NoResponse)
    }
}

/// `AT+SBDMTA?`: whether SBD ring alerts are enabled.
pub struct GetRingAlertsEnabled;

impl SbdCmd for GetRingAlertsEnabled {
    type Response = bool;
    const MAX_LEN: usize = 12;

    fn write(&self, buf: &mut [u8]) -> usize {
        write_cmd(buf, format_args!("AT+SBDMTA?"))
    }

    fn filter_line(&self, line: &[u8]) -> bool {
        line.starts_with(b"+SBDMTA:")
    }

    fn parse(&self, resp: Result<&[u8], Error>) -> Result<Self::Response, Error> {
        let body = body_str(resp)?;
        let mode: u8 = after_prefix(body, "+SBDMTA:")?
            .parse()
            .map_err(|_| Error::Parse)?;
        Ok(mode != 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{IRIDIUM_EPOCH_UNIX_MS, MSSTM_TICK_MS};

    #[test]
    fn signal_quality() {
        assert_eq!(GetSignalQuality.parse(Ok(b"+CSQ:3")), Ok(3));
        assert_eq!(GetLastSignalQuality.parse(Ok(b"+CSQF: 5")), Ok(5));
        assert_eq!(GetSignalQuality.parse(Ok(b"garbage")), Err(Error::InvalidResponse));
    }

    #[test]
    fn indicator_reporting_requests() {
        let mut buf = [0u8; 32];
        let len = SetIndicatorReporting::signal_only().write(&mut buf);
        assert_eq!(&buf[..len], b"AT+CIER=1,1,0,0\r\n");
        let len = SetIndicatorReporting::off().write(&mut buf);
        assert_eq!(&buf[..len], b"AT+CIER=1,0,0,0\r\n");
    }

    #[test]
    fn system_time_decodes_hex_ticks() {
        let time = GetSystemTime.parse(Ok(b"-MSSTM: 2fb4c8c6")).unwrap().unwrap();
        assert_eq!(time.ticks, 0x2fb4_c8c6);
        assert_eq!(
            time.unix_millis(),
            IRIDIUM_EPOCH_UNIX_MS + u64::from(time.ticks) * MSSTM_TICK_MS
        );
    }

    #[test]
    fn system_time_without_service() {
        assert_eq!(GetSystemTime.parse(Ok(b"-MSSTM: no network service")), Ok(None));
    }

    #[test]
    fn registration_status_parses_the_status_field() {
        assert_eq!(
            GetRegistrationStatus.parse(Ok(b"+SBDREG:2")),
            Ok(RegistrationStatus::Registered)
        );
        assert_eq!(
            Register { location: None }.parse(Ok(b"+SBDREG:3,0")),
            Ok(RegistrationResult {
                status: RegistrationStatus::RegistrationDenied,
                error: 0,
            })
        );
    }

    #[test]
    fn ring_indication_takes_the_second_field() {
        assert_eq!(
            GetRingIndicationStatus.parse(Ok(b"+CRIS:000,001")),
            Ok(RingIndicationStatus::RingReceived)
        );
        assert_eq!(
            GetRingIndicationStatus.parse(Ok(b"+CRIS:0,0")),
            Ok(RingIndicationStatus::None)
        );
    }

    #[test]
    fn ring_alert_query() {
        assert_eq!(GetRingAlertsEnabled.parse(Ok(b"+SBDMTA:1")), Ok(true));
        assert_eq!(GetRingAlertsEnabled.parse(Ok(b"+SBDMTA:0")), Ok(false));
    }
}
