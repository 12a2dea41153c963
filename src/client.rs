use embassy_time::{with_timeout, Duration, Timer};
use embedded_io_async::Write;
use heapless::Vec;

use crate::config::Config;
use crate::error::Error;
use crate::helpers::LossyStr;
use crate::response::{Response, ResponseSlot};
use crate::traits::SbdCmd;

/// Room for the largest request: a 340 byte `+SBDWB` payload plus its
/// two checksum bytes.
const CMD_BUF_LEN: usize = 352;

/// Transmit half of the driver: writes requests and waits for the single
/// in-flight response.
///
/// The transceiver is a strictly serial device. Overlapping commands are
/// unrepresentable here: `send` borrows the client mutably for the whole
/// exchange, so a second request can only start once the first completed,
/// failed or timed out.
pub struct Client<'a, W: Write, const INGRESS_BUF_SIZE: usize> {
    writer: W,
    res_slot: &'a ResponseSlot<INGRESS_BUF_SIZE>,
    buf: [u8; CMD_BUF_LEN],
    config: Config,
    cooldown_timer: Option<Timer>,
}

impl<'a, W: Write, const INGRESS_BUF_SIZE: usize> Client<'a, W, INGRESS_BUF_SIZE> {
    pub fn new(writer: W, res_slot: &'a ResponseSlot<INGRESS_BUF_SIZE>, config: Config) -> Self {
        Self {
            writer,
            res_slot,
            buf: [0; CMD_BUF_LEN],
            config,
            cooldown_timer: None,
        }
    }

    /// Run one command to completion with its declared timeout.
    pub async fn send<Cmd: SbdCmd>(&mut self, cmd: &Cmd) -> Result<Cmd::Response, Error> {
        let timeout = match Cmd::MAX_TIMEOUT_MS {
            0 => None,
            ms => Some(Duration::from_millis(u64::from(ms))),
        };
        self.send_with_timeout(cmd, timeout).await
    }

    /// Run one command to completion, overriding its declared timeout.
    /// `None` waits indefinitely.
    pub async fn send_with_timeout<Cmd: SbdCmd>(
        &mut self,
        cmd: &Cmd,
        timeout: Option<Duration>,
    ) -> Result<Cmd::Response, Error> {
        self.wait_cooldown_timer().await;

        let len = cmd.write(&mut self.buf);
        debug_assert!(len <= Cmd::MAX_LEN);

        if len < 50 {
            debug!("Sending command: {:?}", LossyStr(&self.buf[..len]));
        } else {
            debug!("Sending command with long payload ({} bytes)", len);
        }

        // A response that arrived after a previous command timed out must
        // not complete this one.
        self.res_slot.reset();
        if Cmd::BINARY_RESPONSE {
            self.res_slot.expect_binary();
        }

        if let Err(e) = self.send_inner(len).await {
            self.res_slot.reset();
            return Err(e);
        }

        self.start_cooldown_timer();

        if !Cmd::EXPECTS_RESPONSE_CODE {
            return cmd.parse(Ok(&[]));
        }

        let guard = match timeout {
            Some(timeout) => match with_timeout(timeout, self.res_slot.wait()).await {
                Ok(guard) => guard,
                Err(_) => {
                    warn!("Command timed out after {} ms", timeout.as_millis());
                    self.res_slot.reset();
                    return Err(Error::Timeout);
                }
            },
            None => self.res_slot.wait().await,
        };

        let response = guard.borrow();
        match &*response {
            Response::Ok(body) => {
                if Cmd::EXPECTS_PROMPT {
                    return Err(Error::InvalidResponse);
                }
                if Cmd::BINARY_RESPONSE {
                    cmd.parse(Ok(body))
                } else {
                    let kept = Self::filter_body(cmd, body);
                    cmd.parse(Ok(&kept))
                }
            }
            Response::Prompt(_) => cmd.parse(Ok(&[])),
            Response::CommandError(_) => cmd.parse(Err(Error::Command)),
            Response::Overflow => Err(Error::Overflow),
        }
    }

    /// Keep only the body lines the command claims; anything else is
    /// interleaved transceiver chatter and is dropped.
    fn filter_body<Cmd: SbdCmd>(cmd: &Cmd, body: &[u8]) -> Vec<u8, INGRESS_BUF_SIZE> {
        let mut kept: Vec<u8, INGRESS_BUF_SIZE> = Vec::new();
        for line in body.split(|&c| matches!(c, b'\r' | b'\n')) {
            if line.is_empty() {
                continue;
            }
            if !cmd.filter_line(line) {
                debug!("Ignoring interleaved line: {:?}", LossyStr(line));
                continue;
            }
            if !kept.is_empty() {
                kept.extend_from_slice(b"\r\n").unwrap();
            }
            kept.extend_from_slice(line).unwrap();
        }
        kept
    }

    async fn send_inner(&mut self, len: usize) -> Result<(), Error> {
        with_timeout(self.config.tx_timeout, self.writer.write_all(&self.buf[..len]))
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|_| Error::Write)?;

        with_timeout(self.config.flush_timeout, self.writer.flush())
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|_| Error::Write)?;

        Ok(())
    }

    fn start_cooldown_timer(&mut self) {
        self.cooldown_timer = Some(Timer::after(self.config.cmd_cooldown));
    }

    async fn wait_cooldown_timer(&mut self) {
        if let Some(cooldown) = self.cooldown_timer.take() {
            cooldown.await
        }
    }
}
