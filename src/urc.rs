//! Unsolicited result codes the 9602/9603 can emit at any time.

use crate::types::RegistrationStatus;

/// An unsolicited line routed out-of-band, never completing a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Urc {
    /// `SBDRING`: the gateway holds an MT message; answer with `+SBDIXA`.
    RingAlert,
    /// `+CIEV:` indicator event report, enabled through `+CIER`.
    Indicator(IndicatorEvent),
    /// `+AREG:` automatic registration event, enabled through `+SBDAREG`.
    AutoRegistration(AutoRegEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IndicatorEvent {
    /// Signal quality changed; value in `[0, 5]`.
    SignalQuality(u8),
    /// Network service became available or unavailable.
    ServiceAvailability(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoRegEvent {
    pub status: RegistrationStatus,
    /// GSS error code, `0` on success.
    pub error: u8,
}

impl Urc {
    /// Whether a complete line belongs to the unsolicited set. Used by the
    /// digester to pluck these out even while a response body is pending.
    pub(crate) fn matches(line: &[u8]) -> bool {
        line == b"SBDRING" || line.starts_with(b"+CIEV:") || line.starts_with(b"+AREG:")
    }

    pub fn parse(line: &[u8]) -> Option<Self> {
        if line == b"SBDRING" {
            return Some(Self::RingAlert);
        }
        if let Some(args) = line.strip_prefix(b"+CIEV:") {
            let (ind, value) = pair(args)?;
            return match ind {
                0 => Some(Self::Indicator(IndicatorEvent::SignalQuality(value))),
                1 => Some(Self::Indicator(IndicatorEvent::ServiceAvailability(
                    value != 0,
                ))),
                _ => None,
            };
        }
        if let Some(args) = line.strip_prefix(b"+AREG:") {
            let (status, error) = pair(args)?;
            return Some(Self::AutoRegistration(AutoRegEvent {
                status: status.into(),
                error,
            }));
        }
        None
    }
}

fn pair(args: &[u8]) -> Option<(u8, u8)> {
    let args = core::str::from_utf8(args).ok()?;
    let mut fields = args.split(',');
    let first = fields.next()?.trim().parse().ok()?;
    let second = fields.next()?.trim().parse().ok()?;
    Some((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_alert() {
        assert_eq!(Urc::parse(b"SBDRING"), Some(Urc::RingAlert));
        assert!(Urc::matches(b"SBDRING"));
        // Prefixes of other lines are not ring alerts
        assert_eq!(Urc::parse(b"SBDRING2"), None);
    }

    #[test]
    fn signal_indicator() {
        assert_eq!(
            Urc::parse(b"+CIEV:0,3"),
            Some(Urc::Indicator(IndicatorEvent::SignalQuality(3)))
        );
        assert_eq!(
            Urc::parse(b"+CIEV:1,1"),
            Some(Urc::Indicator(IndicatorEvent::ServiceAvailability(true)))
        );
        assert_eq!(Urc::parse(b"+CIEV:9,0"), None);
    }

    #[test]
    fn auto_registration() {
        assert_eq!(
            Urc::parse(b"+AREG:2,0"),
            Some(Urc::AutoRegistration(AutoRegEvent {
                status: RegistrationStatus::Registered,
                error: 0,
            }))
        );
    }

    #[test]
    fn solicited_lines_do_not_match() {
        assert!(!Urc::matches(b"+CSQ:3"));
        assert!(!Urc::matches(b"OK"));
        assert!(!Urc::matches(b"+SBDIX: 1, 42, 0, -1, 0, 0"));
    }
}
