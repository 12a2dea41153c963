use crate::types::{BinaryWriteStatus, SessionResult};

/// Errors produced by the command engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Serial read error
    Read,
    /// Serial write error
    Write,
    /// Timed out while waiting for a response
    Timeout,
    /// The transceiver answered `ERROR`
    Command,
    /// Response did not have the shape the command expected
    InvalidResponse,
    /// Failed to parse a received response
    Parse,
    /// Response did not fit the ingress buffer
    Overflow,
}

/// Errors surfaced by the SBD orchestrator on top of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SbdError {
    /// An underlying AT exchange failed.
    At(Error),
    /// The session completed but the gateway reported a failure; the full
    /// structured response is carried for diagnosis.
    Session(SessionResult),
    /// The second `+SBDWB` phase was rejected.
    BinaryWrite(BinaryWriteStatus),
    /// `+SBDDET` reported a failed detach.
    Detach(DetachError),
    /// The supplied unlock key was wrong.
    WrongUnlockKey,
    /// The transceiver is permanently locked and cannot be recovered.
    PermanentlyLocked,
    /// `-MSSTM` had no network time to report.
    NoNetworkService,
    /// The trailing checksum of an `+SBDRB` answer did not match its payload.
    Checksum { expected: u16, actual: u16 },
    /// Payload length outside what the target buffer accepts.
    InvalidPayloadLength { len: usize, max: usize },
}

impl From<Error> for SbdError {
    fn from(e: Error) -> Self {
        Self::At(e)
    }
}

/// Gateway-reported `+SBDDET` error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DetachError {
    pub code: u8,
}

impl DetachError {
    pub fn description(self) -> &'static str {
        match self.code {
            0 => "detach successfully performed",
            1..=4 => "reserved, indicates success",
            15 => "access is denied",
            16 => "ISU has been locked and may not make SBD calls",
            17 => "gateway not responding (local session timeout)",
            18 => "connection lost (RF drop)",
            32 => "no network service, unable to initiate call",
            33 => "antenna fault, unable to initiate call",
            34 => "radio is disabled, unable to initiate call",
            35 => "ISU is busy, unable to initiate call",
            _ => "reserved, indicates failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_table() {
        assert_eq!(DetachError { code: 0 }.description(), "detach successfully performed");
        assert!(DetachError { code: 17 }.description().contains("not responding"));
        assert!(DetachError { code: 99 }.description().contains("failure"));
    }

    #[test]
    fn at_errors_wrap() {
        assert_eq!(SbdError::from(Error::Timeout), SbdError::At(Error::Timeout));
    }
}
