//! The SBD session orchestrator: boot sequence, the
//! write → wait-for-network → session → read-MT → clear pipeline, and
//! typed passthroughs for the rest of the catalog.

use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use heapless::{String, Vec};

use crate::client::Client;
use crate::codec::TextCodec;
use crate::commands::control::{
    DesignateResetProfile, GetLockStatus, Ping, RestoreFactoryDefaults, SetEcho, SetFlowControl,
    SetQuiet, SetVerbose, SoftReset, StoreActiveConfig, Unlock,
};
use crate::commands::identity::{
    GetManufacturer, GetModel, GetRevision, GetSerialNumber, Identification,
};
use crate::commands::network::{
    GetLastSignalQuality, GetRegistrationStatus, GetRingAlertsEnabled, GetRingIndicationStatus,
    GetSignalQuality, GetSystemTime, Register, SetAutoRegistration, SetIndicatorReporting,
    SetRingAlerts,
};
use crate::commands::sbd::{
    ClearBuffers, Detach, GetGateway, GetStatus, GetStatusExtended, InitiateBinaryWrite,
    InitiateSession, ReadBinary, ReadText, ResetMoMsn, TransferMoToMt, WriteBinaryPayload,
    WriteText,
};
use crate::error::{Error, SbdError};
use crate::types::{
    ClearBuffer, LockStatus, MtStatus, NetworkTime, RegistrationResult, RegistrationStatus,
    RingIndicationStatus, SbdStatus, SbdStatusEx, SessionOutcome, SessionResult, MAX_MO_PAYLOAD,
    MAX_MT_PAYLOAD, MAX_TEXT_PAYLOAD,
};
use crate::urc::{IndicatorEvent, Urc};
use crate::urc_channel::UrcSubscription;

/// Options for one send pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Signal quality `[0, 5]` required before the session is attempted.
    pub min_signal_quality: u8,
    /// Bound on the wait for sufficient signal. `None` waits forever.
    pub network_timeout: Option<Duration>,
    /// Treat a gateway mailbox check error (`mt_status == 2`) as a hard
    /// session failure instead of a warning.
    pub fail_on_mailbox_check_error: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            min_signal_quality: 1,
            network_timeout: None,
            fail_on_mailbox_check_error: false,
        }
    }
}

/// High-level driver for one 9602/9603 transceiver.
///
/// Owns the command [`Client`] plus one URC subscription for indicator
/// events. Subscribe separately on the
/// [`UrcChannel`](crate::UrcChannel) to observe ring alerts.
pub struct Modem<
    'a,
    W: Write,
    const INGRESS_BUF_SIZE: usize,
    const URC_CAPACITY: usize,
    const URC_SUBSCRIBERS: usize,
> {
    client: Client<'a, W, INGRESS_BUF_SIZE>,
    urc_subscription: UrcSubscription<'a, URC_CAPACITY, URC_SUBSCRIBERS>,
}

impl<
        'a,
        W: Write,
        const INGRESS_BUF_SIZE: usize,
        const URC_CAPACITY: usize,
        const URC_SUBSCRIBERS: usize,
    > Modem<'a, W, INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>
{
    pub fn new(
        client: Client<'a, W, INGRESS_BUF_SIZE>,
        urc_subscription: UrcSubscription<'a, URC_CAPACITY, URC_SUBSCRIBERS>,
    ) -> Self {
        Self {
            client,
            urc_subscription,
        }
    }

    /// Direct access to the command client for catalog commands without a
    /// dedicated wrapper here.
    pub fn client(&mut self) -> &mut Client<'a, W, INGRESS_BUF_SIZE> {
        &mut self.client
    }

    /// Boot sequence, fail-fast: liveness check, flow control off, echo
    /// off, indicator reporting off, clear both buffers, automatic
    /// registration on, ring alerts on. Returns the current ring
    /// indication status so a ring that arrived while the host was down
    /// can be honored with an immediate session.
    pub async fn init(&mut self) -> Result<RingIndicationStatus, SbdError> {
        info!("Initializing SBD transceiver");
        self.client.send(&Ping).await?;
        self.client.send(&SetFlowControl(false)).await?;
        self.client.send(&SetEcho(false)).await?;
        self.client.send(&SetIndicatorReporting::off()).await?;
        self.client.send(&ClearBuffers(ClearBuffer::Both)).await?;
        self.client.send(&SetAutoRegistration(true)).await?;
        self.client.send(&SetRingAlerts(true)).await?;
        let ring = self.client.send(&GetRingIndicationStatus).await?;
        Ok(ring)
    }

    /// Block until the constellation is visible with at least `min_signal`
    /// bars, by watching `+CIEV` signal indicator events.
    ///
    /// On timeout the indicator reporting is deliberately left enabled;
    /// the caller owns the recovery path and can issue
    /// [`SetIndicatorReporting::off`] when it gives up.
    pub async fn wait_for_network(
        &mut self,
        min_signal: u8,
        timeout: Option<Duration>,
    ) -> Result<u8, SbdError> {
        // Stale reports from an earlier wait must not satisfy this one.
        while self.urc_subscription.try_next_message_pure().is_some() {}

        self.client
            .send(&SetIndicatorReporting::signal_only())
            .await?;

        let urc_subscription = &mut self.urc_subscription;
        let wait = async {
            loop {
                if let Urc::Indicator(IndicatorEvent::SignalQuality(quality)) =
                    urc_subscription.next_message_pure().await
                {
                    if quality >= min_signal {
                        return quality;
                    }
                    debug!("Signal quality {} below threshold {}", quality, min_signal);
                }
            }
        };

        let quality = match timeout {
            Some(timeout) => with_timeout(timeout, wait)
                .await
                .map_err(|_| SbdError::At(Error::Timeout))?,
            None => wait.await,
        };

        self.client.send(&SetIndicatorReporting::off()).await?;
        info!("Network visible with signal quality {}", quality);
        Ok(quality)
    }

    /// Two-phase binary write into the MO buffer, checksum included.
    pub async fn write_binary(&mut self, data: &[u8]) -> Result<(), SbdError> {
        if data.is_empty() || data.len() > MAX_MO_PAYLOAD {
            return Err(SbdError::InvalidPayloadLength {
                len: data.len(),
                max: MAX_MO_PAYLOAD,
            });
        }

        self.client
            .send(&InitiateBinaryWrite { len: data.len() })
            .await?;
        let status = self.client.send(&WriteBinaryPayload { data }).await?;
        match status {
            crate::types::BinaryWriteStatus::Accepted => Ok(()),
            rejected => {
                warn!("Binary write rejected: {}", rejected.description());
                Err(SbdError::BinaryWrite(rejected))
            }
        }
    }

    /// Read the MT buffer as binary, verifying the envelope checksum.
    pub async fn read_binary(&mut self) -> Result<Vec<u8, MAX_MT_PAYLOAD>, SbdError> {
        let message = self.client.send(&ReadBinary).await?;
        if !message.checksum_ok() {
            return Err(SbdError::Checksum {
                expected: message.computed_checksum,
                actual: message.reported_checksum,
            });
        }
        Ok(message.payload)
    }

    /// Write a text message into the MO buffer.
    pub async fn write_text(&mut self, text: &str) -> Result<(), SbdError> {
        if text.len() > MAX_TEXT_PAYLOAD {
            return Err(SbdError::InvalidPayloadLength {
                len: text.len(),
                max: MAX_TEXT_PAYLOAD,
            });
        }
        self.client.send(&WriteText(text.as_bytes())).await?;
        Ok(())
    }

    /// Read the MT buffer as text.
    pub async fn read_text(&mut self) -> Result<Vec<u8, MAX_MT_PAYLOAD>, SbdError> {
        Ok(self.client.send(&ReadText).await?)
    }

    /// Send a binary message: write, wait for network, run the session
    /// and fetch a delivered MT message, if any.
    pub async fn send_binary_message(
        &mut self,
        data: &[u8],
        options: &SessionOptions,
    ) -> Result<SessionOutcome, SbdError> {
        self.write_binary(data).await?;
        self.run_session(false, options).await
    }

    /// Send a text message through the same pipeline.
    pub async fn send_text_message(
        &mut self,
        text: &str,
        options: &SessionOptions,
    ) -> Result<SessionOutcome, SbdError> {
        self.write_text(text).await?;
        self.run_session(true, options).await
    }

    /// Send a text message compressed through an external codec. The
    /// compressed bytes are loaded with the text write command and are
    /// opaque to the transceiver.
    pub async fn send_compressed_text_message<C: TextCodec>(
        &mut self,
        codec: &C,
        text: &str,
        options: &SessionOptions,
    ) -> Result<SessionOutcome, SbdError> {
        let mut compressed = [0u8; MAX_TEXT_PAYLOAD];
        let len = codec
            .compress(text, &mut compressed)
            .map_err(|_| SbdError::InvalidPayloadLength {
                len: text.len(),
                max: MAX_TEXT_PAYLOAD,
            })?;
        self.client.send(&WriteText(&compressed[..len])).await?;
        self.run_session(true, options).await
    }

    /// Poll the gateway for queued MT messages: an empty MO message run
    /// through the full pipeline.
    pub async fn mailbox_check(
        &mut self,
        options: &SessionOptions,
    ) -> Result<SessionOutcome, SbdError> {
        self.send_text_message("", options).await
    }

    async fn run_session(
        &mut self,
        text: bool,
        options: &SessionOptions,
    ) -> Result<SessionOutcome, SbdError> {
        self.wait_for_network(options.min_signal_quality, options.network_timeout)
            .await?;

        let result = self.client.send(&InitiateSession { answer_ring: true }).await?;
        debug!(
            "Session finished: MO {}, MT {}",
            result.mo_status.0,
            result.mt_status.description()
        );

        if !result.mo_status.is_success() {
            // The MO buffer is left intact so the caller can retry the
            // session without rewriting the message.
            warn!("MO transfer failed: {}", result.mo_status.description());
            return Err(SbdError::Session(result));
        }

        let mut mt_message = None;
        let mut mt_failure = None;
        match result.mt_status {
            MtStatus::Received => match self.read_delivered(text).await {
                Ok(message) => mt_message = Some(message),
                Err(e) => mt_failure = Some(e),
            },
            MtStatus::Error => {
                if options.fail_on_mailbox_check_error {
                    mt_failure = Some(SbdError::Session(result));
                } else {
                    warn!("Gateway reported a mailbox check error");
                }
            }
            MtStatus::None | MtStatus::Unknown(_) => {}
        }

        // The message left the MO buffer; it must not be retransmitted by
        // the next session, whatever happened on the MT side.
        self.clear_mo_buffer().await?;

        match mt_failure {
            Some(failure) => Err(failure),
            None => Ok(SessionOutcome { result, mt_message }),
        }
    }

    async fn read_delivered(&mut self, text: bool) -> Result<Vec<u8, MAX_MT_PAYLOAD>, SbdError> {
        let message = if text {
            self.read_text().await?
        } else {
            self.read_binary().await?
        };
        self.client.send(&ClearBuffers(ClearBuffer::Mt)).await?;
        Ok(message)
    }

    /// Run one SBD session without touching the buffers first. Useful to
    /// answer a ring alert when no MO message is pending.
    pub async fn initiate_session(
        &mut self,
        answer_ring: bool,
    ) -> Result<SessionResult, SbdError> {
        Ok(self.client.send(&InitiateSession { answer_ring }).await?)
    }

    pub async fn signal_quality(&mut self) -> Result<u8, SbdError> {
        Ok(self.client.send(&GetSignalQuality).await?)
    }

    pub async fn last_signal_quality(&mut self) -> Result<u8, SbdError> {
        Ok(self.client.send(&GetLastSignalQuality).await?)
    }

    pub async fn system_time(&mut self) -> Result<NetworkTime, SbdError> {
        self.client
            .send(&GetSystemTime)
            .await?
            .ok_or(SbdError::NoNetworkService)
    }

    pub async fn manufacturer(&mut self) -> Result<String<64>, SbdError> {
        Ok(self.client.send(&GetManufacturer).await?)
    }

    pub async fn model(&mut self) -> Result<String<64>, SbdError> {
        Ok(self.client.send(&GetModel).await?)
    }

    pub async fn revision(&mut self) -> Result<String<160>, SbdError> {
        Ok(self.client.send(&GetRevision).await?)
    }

    pub async fn serial_number(&mut self) -> Result<String<32>, SbdError> {
        Ok(self.client.send(&GetSerialNumber).await?)
    }

    pub async fn identification(&mut self, page: u8) -> Result<String<64>, SbdError> {
        Ok(self.client.send(&Identification(page)).await?)
    }

    pub async fn registration_status(&mut self) -> Result<RegistrationStatus, SbdError> {
        Ok(self.client.send(&GetRegistrationStatus).await?)
    }

    pub async fn register(
        &mut self,
        location: Option<&str>,
    ) -> Result<RegistrationResult, SbdError> {
        Ok(self.client.send(&Register { location }).await?)
    }

    pub async fn set_auto_registration(&mut self, enabled: bool) -> Result<(), SbdError> {
        self.client.send(&SetAutoRegistration(enabled)).await?;
        Ok(())
    }

    pub async fn set_ring_alerts(&mut self, enabled: bool) -> Result<(), SbdError> {
        self.client.send(&SetRingAlerts(enabled)).await?;
        Ok(())
    }

    pub async fn ring_alerts_enabled(&mut self) -> Result<bool, SbdError> {
        Ok(self.client.send(&GetRingAlertsEnabled).await?)
    }

    pub async fn ring_indication_status(&mut self) -> Result<RingIndicationStatus, SbdError> {
        Ok(self.client.send(&GetRingIndicationStatus).await?)
    }

    pub async fn clear_mo_buffer(&mut self) -> Result<(), SbdError> {
        self.client.send(&ClearBuffers(ClearBuffer::Mo)).await?;
        Ok(())
    }

    pub async fn clear_mt_buffer(&mut self) -> Result<(), SbdError> {
        self.client.send(&ClearBuffers(ClearBuffer::Mt)).await?;
        Ok(())
    }

    pub async fn clear_buffers(&mut self) -> Result<(), SbdError> {
        self.client.send(&ClearBuffers(ClearBuffer::Both)).await?;
        Ok(())
    }

    pub async fn reset_mo_msn(&mut self) -> Result<(), SbdError> {
        self.client.send(&ResetMoMsn).await?;
        Ok(())
    }

    pub async fn status(&mut self) -> Result<SbdStatus, SbdError> {
        Ok(self.client.send(&GetStatus).await?)
    }

    pub async fn status_extended(&mut self) -> Result<SbdStatusEx, SbdError> {
        Ok(self.client.send(&GetStatusExtended).await?)
    }

    /// Copy the MO buffer into the MT buffer and report the copied size.
    pub async fn transfer_mo_to_mt(&mut self) -> Result<u16, SbdError> {
        Ok(self.client.send(&TransferMoToMt).await?)
    }

    pub async fn gateway(&mut self) -> Result<String<32>, SbdError> {
        Ok(self.client.send(&GetGateway).await?)
    }

    /// Detach from the gateway; a non-zero status is mapped through the
    /// detach error table.
    pub async fn detach(&mut self) -> Result<(), SbdError> {
        let result = self.client.send(&Detach).await?;
        if result.status != 0 {
            warn!("Detach failed: {}", result.error.description());
            return Err(SbdError::Detach(result.error));
        }
        Ok(())
    }

    pub async fn lock_status(&mut self) -> Result<LockStatus, SbdError> {
        Ok(self.client.send(&GetLockStatus).await?)
    }

    /// Attempt to unlock a locked transceiver.
    pub async fn unlock(&mut self, key: &str) -> Result<(), SbdError> {
        match self.client.send(&Unlock { key }).await? {
            LockStatus::Unlocked => Ok(()),
            LockStatus::Locked => Err(SbdError::WrongUnlockKey),
            LockStatus::PermanentlyLocked => Err(SbdError::PermanentlyLocked),
        }
    }

    /// Suppress (`true`) or emit (`false`) result codes. The driver needs
    /// result codes; only ever turn them off for a terminal session.
    pub async fn set_quiet(&mut self, enabled: bool) -> Result<(), SbdError> {
        self.client.send(&SetQuiet(enabled)).await?;
        Ok(())
    }

    /// Textual (`true`) or numeric (`false`) result codes. The driver
    /// expects textual codes.
    pub async fn set_verbose(&mut self, enabled: bool) -> Result<(), SbdError> {
        self.client.send(&SetVerbose(enabled)).await?;
        Ok(())
    }

    pub async fn restore_factory_defaults(&mut self) -> Result<(), SbdError> {
        self.client.send(&RestoreFactoryDefaults).await?;
        Ok(())
    }

    pub async fn store_active_config(&mut self) -> Result<(), SbdError> {
        self.client.send(&StoreActiveConfig).await?;
        Ok(())
    }

    pub async fn designate_reset_profile(&mut self, profile: u8) -> Result<(), SbdError> {
        self.client.send(&DesignateResetProfile(profile)).await?;
        Ok(())
    }

    pub async fn soft_reset(&mut self, profile: u8) -> Result<(), SbdError> {
        self.client.send(&SoftReset(profile)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::Buffers;
    use crate::config::Config;
    use crate::error::Error;
    use crate::tx_mock::{TxChannel, TxMock};
    use crate::types::{BinaryWriteStatus, MoStatus};

    macro_rules! setup {
        () => {{
            static BUFFERS: Buffers<512, 8, 2> = Buffers::new();
            static TX: TxChannel = TxChannel::new();

            let (ingress, client) =
                BUFFERS.split(TxMock::new(TX.publisher().unwrap()), Config::new());
            let modem = Modem::new(client, BUFFERS.urc_subscription().unwrap());
            (ingress, modem, TX.subscriber().unwrap(), BUFFERS.urc_channel())
        }};
    }

    macro_rules! expect {
        ($tx:expr, $ingress:expr, $request:expr, $answer:expr) => {{
            assert_eq!($tx.next_message_pure().await.as_slice(), &$request[..]);
            $ingress.write($answer).await;
        }};
    }

    #[tokio::test]
    async fn boot_sequence_runs_in_order() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = modem.init();
        let script = async {
            expect!(tx, ingress, b"AT\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT&K0\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"ATE0\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDD2\r\n", b"\r\n0\r\n\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDAREG=1\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDMTA=1\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CRIS\r\n", b"\r\n+CRIS:000,000\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        assert_eq!(res.unwrap(), RingIndicationStatus::None);
    }

    #[tokio::test]
    async fn boot_aborts_on_first_failure() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = modem.init();
        let script = async {
            expect!(tx, ingress, b"AT\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT&K0\r\n", b"\r\nERROR\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        assert_eq!(res, Err(SbdError::At(Error::Command)));
    }

    #[tokio::test]
    async fn binary_write_happy_path() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = modem.write_binary(&[0x41, 0x42, 0x43]);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWB=3\r\n", b"READY\r\n");
            expect!(
                tx,
                ingress,
                [0x41, 0x42, 0x43, 0x00, 0xC6],
                b"\r\n0\r\n\r\nOK\r\n"
            );
        };

        let (res, ()) = tokio::join!(op, script);
        res.unwrap();
    }

    #[tokio::test]
    async fn binary_write_checksum_rejection() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = modem.write_binary(&[0x41, 0x42, 0x43]);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWB=3\r\n", b"READY\r\n");
            expect!(
                tx,
                ingress,
                [0x41, 0x42, 0x43, 0x00, 0xC6],
                b"\r\n2\r\n\r\nOK\r\n"
            );
        };

        let (res, ()) = tokio::join!(op, script);
        match res {
            Err(SbdError::BinaryWrite(status)) => {
                assert_eq!(status, BinaryWriteStatus::ChecksumMismatch);
                assert!(status.description().contains("checksum"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn payload_size_is_validated_before_any_io() {
        let (_ingress, mut modem, _tx, _urcs) = setup!();

        let res = modem.write_binary(&[]).await;
        assert_eq!(
            res,
            Err(SbdError::InvalidPayloadLength { len: 0, max: MAX_MO_PAYLOAD })
        );

        let huge = [0u8; MAX_MO_PAYLOAD + 1];
        let res = modem.write_binary(&huge).await;
        assert_eq!(
            res,
            Err(SbdError::InvalidPayloadLength {
                len: MAX_MO_PAYLOAD + 1,
                max: MAX_MO_PAYLOAD
            })
        );
    }

    #[tokio::test]
    async fn text_session_delivers_inbound_message() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let options = SessionOptions {
            min_signal_quality: 2,
            ..Default::default()
        };
        let op = modem.send_text_message("HELLO", &options);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWT=HELLO\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            // Below threshold first, then sufficient signal
            ingress.write(b"\r\n+CIEV:0,1\r\n").await;
            ingress.write(b"\r\n+CIEV:0,3\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 1, 42, 1, 7, 11, 0\r\n\r\nOK\r\n"
            );
            expect!(tx, ingress, b"AT+SBDRT\r\n", b"\r\n+SBDRT:\r\nWORLD\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDD1\r\n", b"\r\n0\r\n\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDD0\r\n", b"\r\n0\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        let outcome = res.unwrap();
        assert_eq!(outcome.result.mo_status, MoStatus(1));
        assert_eq!(outcome.result.mo_msn, 42);
        assert_eq!(outcome.result.mt_status, MtStatus::Received);
        assert_eq!(outcome.result.mt_length, 11);
        assert_eq!(outcome.mt_message.unwrap().as_slice(), b"WORLD");
    }

    #[tokio::test]
    async fn failed_mo_transfer_keeps_the_mo_buffer() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let opts = SessionOptions::default();
        let op = modem.send_text_message("HELLO", &opts);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWT=HELLO\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            ingress.write(b"\r\n+CIEV:0,5\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            // 32: no network service
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 32, 42, 0, -1, 0, 0\r\n\r\nOK\r\n"
            );
            // No further commands: the MO buffer is not cleared
        };

        let (res, ()) = tokio::join!(op, script);
        match res {
            Err(SbdError::Session(result)) => {
                assert_eq!(result.mo_status, MoStatus(32));
                assert!(!result.mo_status.is_success());
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn mailbox_check_error_is_a_warning_by_default() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let opts = SessionOptions::default();
        let op = modem.mailbox_check(&opts);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWT=\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            ingress.write(b"\r\n+CIEV:0,4\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 0, 43, 2, -1, 0, 0\r\n\r\nOK\r\n"
            );
            expect!(tx, ingress, b"AT+SBDD0\r\n", b"\r\n0\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        let outcome = res.unwrap();
        assert_eq!(outcome.result.mt_status, MtStatus::Error);
        assert!(outcome.mt_message.is_none());
    }

    #[tokio::test]
    async fn mailbox_check_error_fails_when_opted_in() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let options = SessionOptions {
            fail_on_mailbox_check_error: true,
            ..Default::default()
        };
        let op = modem.mailbox_check(&options);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWT=\r\n", b"\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            ingress.write(b"\r\n+CIEV:0,4\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 0, 43, 2, -1, 0, 0\r\n\r\nOK\r\n"
            );
            // The MO buffer is still cleared before the failure surfaces
            expect!(tx, ingress, b"AT+SBDD0\r\n", b"\r\n0\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        match res {
            Err(SbdError::Session(result)) => assert_eq!(result.mt_status, MtStatus::Error),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn binary_session_reads_mt_with_checksum_verification() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let opts = SessionOptions::default();
        let op = modem.send_binary_message(&[0x01, 0x02], &opts);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWB=2\r\n", b"READY\r\n");
            expect!(tx, ingress, [0x01, 0x02, 0x00, 0x03], b"\r\n0\r\n\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            ingress.write(b"\r\n+CIEV:0,2\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 0, 5, 1, 9, 3, 0\r\n\r\nOK\r\n"
            );
            assert_eq!(tx.next_message_pure().await.as_slice(), b"AT+SBDRB\r\n");
            ingress
                .write(&[0x00, 0x03, 0x41, 0x42, 0x43, 0x00, 0xC6])
                .await;
            ingress.write(b"\r\nOK\r\n").await;
            expect!(tx, ingress, b"AT+SBDD1\r\n", b"\r\n0\r\n\r\nOK\r\n");
            expect!(tx, ingress, b"AT+SBDD0\r\n", b"\r\n0\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        let outcome = res.unwrap();
        assert_eq!(outcome.mt_message.unwrap().as_slice(), &[0x41, 0x42, 0x43]);
    }

    #[tokio::test]
    async fn corrupt_mt_checksum_surfaces_after_buffer_hygiene() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let opts = SessionOptions::default();
        let op = modem.send_binary_message(&[0x01], &opts);
        let script = async {
            expect!(tx, ingress, b"AT+SBDWB=1\r\n", b"READY\r\n");
            expect!(tx, ingress, [0x01, 0x00, 0x01], b"\r\n0\r\n\r\nOK\r\n");
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            ingress.write(b"\r\n+CIEV:0,2\r\n").await;
            expect!(tx, ingress, b"AT+CIER=1,0,0,0\r\n", b"\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDIXA\r\n",
                b"\r\n+SBDIX: 0, 5, 1, 9, 3, 0\r\n\r\nOK\r\n"
            );
            assert_eq!(tx.next_message_pure().await.as_slice(), b"AT+SBDRB\r\n");
            ingress
                .write(&[0x00, 0x03, 0x41, 0x42, 0x43, 0xBE, 0xEF])
                .await;
            ingress.write(b"\r\nOK\r\n").await;
            // MO buffer hygiene still runs before the error is returned
            expect!(tx, ingress, b"AT+SBDD0\r\n", b"\r\n0\r\n\r\nOK\r\n");
        };

        let (res, ()) = tokio::join!(op, script);
        assert_eq!(
            res,
            Err(SbdError::Checksum {
                expected: 0x00C6,
                actual: 0xBEEF
            })
        );
    }

    #[tokio::test]
    async fn ring_alert_reaches_subscribers_without_a_command_in_flight() {
        let (mut ingress, _modem, _tx, urcs) = setup!();
        let mut ring_subscription = urcs.subscribe().unwrap();

        ingress.write(b"\r\nSBDRING\r\n").await;

        assert_eq!(
            ring_subscription.try_next_message_pure(),
            Some(Urc::RingAlert)
        );
        assert_eq!(ring_subscription.try_next_message_pure(), None);
    }

    #[tokio::test]
    async fn network_wait_timeout_leaves_reporting_enabled() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = modem.wait_for_network(3, Some(Duration::from_millis(50)));
        let script = async {
            expect!(tx, ingress, b"AT+CIER=1,1,0,0\r\n", b"\r\nOK\r\n");
            // Never enough signal
            ingress.write(b"\r\n+CIEV:0,1\r\n").await;
        };

        let (res, ()) = tokio::join!(op, script);
        assert_eq!(res, Err(SbdError::At(Error::Timeout)));
        // No CIER disable was sent: the subscriber script consumed exactly
        // one request.
    }

    #[tokio::test]
    async fn loopback_round_trip_via_mt_read() {
        let (mut ingress, mut modem, mut tx, _urcs) = setup!();

        let op = async {
            modem.write_binary(&[0xDE, 0xAD]).await?;
            let copied = modem.transfer_mo_to_mt().await?;
            let payload = modem.read_binary().await?;
            Ok::<_, SbdError>((copied, payload))
        };
        let script = async {
            expect!(tx, ingress, b"AT+SBDWB=2\r\n", b"READY\r\n");
            expect!(tx, ingress, [0xDE, 0xAD, 0x01, 0x8B], b"\r\n0\r\n\r\nOK\r\n");
            expect!(
                tx,
                ingress,
                b"AT+SBDTC\r\n",
                b"\r\nSBDTC: Outbound SBD Copied to Inbound SBD: size = 2\r\n\r\nOK\r\n"
            );
            assert_eq!(tx.next_message_pure().await.as_slice(), b"AT+SBDRB\r\n");
            ingress.write(&[0x00, 0x02, 0xDE, 0xAD, 0x01, 0x8B]).await;
            ingress.write(b"\r\nOK\r\n").await;
        };

        let (res, ()) = tokio::join!(op, script);
        let (copied, payload) = res.unwrap();
        assert_eq!(copied, 2);
        assert_eq!(payload.as_slice(), &[0xDE, 0xAD]);
    }
}
