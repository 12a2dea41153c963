//! Status codes and result structures reported by the transceiver, as
//! published in the ISU AT command reference for the 9602/9603 family.

use heapless::Vec;

/// Largest mobile-originated payload the 9602/9603 accepts.
pub const MAX_MO_PAYLOAD: usize = 340;

/// Largest mobile-terminated payload the gateway will deliver.
pub const MAX_MT_PAYLOAD: usize = 270;

/// Largest message accepted by the `+SBDWT=` command line form.
pub const MAX_TEXT_PAYLOAD: usize = 120;

/// Unix timestamp of the Iridium epoch, `2007-03-08T03:50:35Z`, in
/// milliseconds. Reference point for `-MSSTM` network time.
pub const IRIDIUM_EPOCH_UNIX_MS: u64 = 1_173_325_835_000;

/// Length of one `-MSSTM` tick in milliseconds.
pub const MSSTM_TICK_MS: u64 = 90;

/// MO disposition of an SBD session, first field of `+SBDIX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoStatus(pub u8);

impl MoStatus {
    /// Gateway codes `0..=4` all indicate a successful MO transfer.
    pub fn is_success(self) -> bool {
        self.0 <= 4
    }

    pub fn description(self) -> &'static str {
        match self.0 {
            0 => "MO message transferred successfully",
            1 => "MO message transferred successfully, but the MT message in the queue was too big to be transferred",
            2 => "MO message transferred successfully, but the requested location update was not accepted",
            3 | 4 => "reserved, indicates MO session success",
            5..=9 => "reserved, indicates MO session failure",
            10 => "GSS reported that the call did not complete in the allowed time",
            11 => "MO message queue at the GSS is full",
            12 => "MO message has too many segments",
            13 => "GSS reported that the session did not complete",
            14 => "invalid segment size",
            15 => "access is denied",
            16 => "ISU has been locked and may not make SBD calls",
            17 => "gateway not responding (local session timeout)",
            18 => "connection lost (RF drop)",
            19 => "link failure (a protocol error caused termination of the call)",
            32 => "no network service, unable to initiate call",
            33 => "antenna fault, unable to initiate call",
            34 => "radio is disabled, unable to initiate call",
            35 => "ISU is busy, unable to initiate call",
            36 => "try later, must wait 3 minutes since last registration",
            37 => "SBD service is temporarily disabled",
            38 => "try later, traffic management period",
            64 => "band violation, attempt to transmit outside permitted frequency band",
            65 => "PLL lock failure, hardware error during attempted transmit",
            _ => "reserved, indicates failure",
        }
    }
}

/// MT disposition of an SBD session, third field of `+SBDIX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MtStatus {
    /// No MT message was waiting at the gateway.
    None,
    /// An MT message was transferred into the MT buffer. It must be read
    /// (and the buffer cleared) before the next session.
    Received,
    /// An error occurred while checking the gateway mailbox.
    Error,
    /// Code outside the documented `0..=2` range.
    Unknown(u8),
}

impl From<u8> for MtStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Received,
            2 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

impl MtStatus {
    pub fn description(self) -> &'static str {
        match self {
            Self::None => "no MT message to receive",
            Self::Received => "MT message received and stored in the MT buffer",
            Self::Error => "error while checking the gateway mailbox",
            Self::Unknown(_) => "unknown MT status",
        }
    }
}

/// Result code of the second `+SBDWB` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BinaryWriteStatus {
    Accepted,
    /// The transceiver gave up waiting for payload bytes.
    Timeout,
    ChecksumMismatch,
    SizeOutOfRange,
    Unknown(u8),
}

impl From<u8> for BinaryWriteStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Accepted,
            1 => Self::Timeout,
            2 => Self::ChecksumMismatch,
            3 => Self::SizeOutOfRange,
            other => Self::Unknown(other),
        }
    }
}

impl BinaryWriteStatus {
    pub fn description(self) -> &'static str {
        match self {
            Self::Accepted => "SBD message successfully written to the ISU",
            Self::Timeout => "SBD message write timeout, insufficient data sent in the transfer period",
            Self::ChecksumMismatch => "SBD message checksum sent from DTE does not match the checksum calculated at the ISU",
            Self::SizeOutOfRange => "SBD message size is not correct, must be 1 to 340 bytes",
            Self::Unknown(_) => "unknown SBD write result code",
        }
    }
}

/// Structured `+SBDIX:` / `+SBDIXA` session response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionResult {
    pub mo_status: MoStatus,
    pub mo_msn: u16,
    pub mt_status: MtStatus,
    pub mt_msn: i32,
    /// Length in bytes of the MT message now in the MT buffer, if any.
    pub mt_length: usize,
    /// Number of further MT messages queued at the gateway.
    pub mt_queued: u16,
}

/// Outcome of a full send pipeline: the session response plus the MT
/// payload that was auto-read when the gateway delivered one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub result: SessionResult,
    pub mt_message: Option<Vec<u8, MAX_MT_PAYLOAD>>,
}

/// `+SBDS:` buffer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SbdStatus {
    pub mo_in_buffer: bool,
    pub mo_msn: u16,
    pub mt_in_buffer: bool,
    /// `-1` when the MT buffer holds no message.
    pub mt_msn: i32,
}

/// `+SBDSX:` extended buffer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SbdStatusEx {
    pub mo_in_buffer: bool,
    pub mo_msn: u16,
    pub mt_in_buffer: bool,
    pub mt_msn: i32,
    /// A ring alert has been received but not yet answered with a session.
    pub ring_pending: bool,
    /// MT messages waiting at the gateway.
    pub mt_queued: u16,
}

/// `+CULK` SIM-style lockout state of the transceiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockStatus {
    Unlocked,
    Locked,
    PermanentlyLocked,
}

impl TryFrom<u8> for LockStatus {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        match code {
            0 => Ok(Self::Unlocked),
            1 => Ok(Self::Locked),
            2 => Ok(Self::PermanentlyLocked),
            other => Err(other),
        }
    }
}

/// Second field of `+CRIS`: whether an SBD ring alert has been received
/// since the last `+SBDIXA` session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingIndicationStatus {
    None,
    RingReceived,
}

impl From<u8> for RingIndicationStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::RingReceived,
            _ => Self::None,
        }
    }
}

/// `+SBDREG` gateway registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationStatus {
    Detached,
    NotRegistered,
    Registered,
    RegistrationDenied,
    Unknown(u8),
}

impl From<u8> for RegistrationStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => Self::Detached,
            1 => Self::NotRegistered,
            2 => Self::Registered,
            3 => Self::RegistrationDenied,
            other => Self::Unknown(other),
        }
    }
}

/// Response to a manual `+SBDREG` registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationResult {
    pub status: RegistrationStatus,
    /// GSS error code, `0` on success.
    pub error: u8,
}

/// Which on-device message buffer a `+SBDD` command clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClearBuffer {
    Mo,
    Mt,
    Both,
}

impl ClearBuffer {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Mo => 0,
            Self::Mt => 1,
            Self::Both => 2,
        }
    }
}

/// Decoded `-MSSTM` network time.
///
/// The wire value is a 32 bit hex counter. The tick length is interpreted
/// here as [`MSSTM_TICK_MS`] (90 ms) past [`IRIDIUM_EPOCH_UNIX_MS`]; the
/// raw counter is kept so callers can apply their own interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkTime {
    pub ticks: u32,
}

impl NetworkTime {
    /// Unix timestamp in milliseconds under the 90 ms tick interpretation.
    pub fn unix_millis(self) -> u64 {
        IRIDIUM_EPOCH_UNIX_MS + u64::from(self.ticks) * MSSTM_TICK_MS
    }
}
