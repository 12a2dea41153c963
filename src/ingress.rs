use heapless::Vec;

use crate::digest::{DigestError, DigestResult};
use crate::helpers::LossyStr;
use crate::response::{Response, ResponseSlot};
use crate::traits::Digester;
use crate::urc::Urc;
use crate::urc_channel::{UrcChannel, UrcPublisher};

/// Receive half of the driver.
///
/// Feed it the raw bytes read from the transceiver; it runs them through
/// the [`Digester`], completes the in-flight command through the
/// [`ResponseSlot`] and publishes unsolicited events on the URC channel.
/// Usually driven by a dedicated task running [`Ingress::read_from`].
pub struct Ingress<
    'a,
    D: Digester,
    const INGRESS_BUF_SIZE: usize,
    const URC_CAPACITY: usize,
    const URC_SUBSCRIBERS: usize,
> {
    digester: D,
    buf: Vec<u8, INGRESS_BUF_SIZE>,
    res_slot: &'a ResponseSlot<INGRESS_BUF_SIZE>,
    urc_publisher: UrcPublisher<'a, URC_CAPACITY, URC_SUBSCRIBERS>,
}

impl<
        'a,
        D: Digester,
        const INGRESS_BUF_SIZE: usize,
        const URC_CAPACITY: usize,
        const URC_SUBSCRIBERS: usize,
    > Ingress<'a, D, INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>
{
    pub fn new(
        digester: D,
        res_slot: &'a ResponseSlot<INGRESS_BUF_SIZE>,
        urc_channel: &'a UrcChannel<URC_CAPACITY, URC_SUBSCRIBERS>,
    ) -> Self {
        Self {
            digester,
            buf: Vec::new(),
            res_slot,
            urc_publisher: urc_channel.0.publisher().unwrap(),
        }
    }

    /// Ingest a chunk of received bytes and process everything that
    /// completes.
    pub async fn write(&mut self, data: &[u8]) {
        let mut data = data;
        while !data.is_empty() {
            let space = INGRESS_BUF_SIZE - self.buf.len();
            if space == 0 {
                error!(
                    "Ingress buffer full without a recognizable frame, dropping {:?}",
                    LossyStr(&self.buf)
                );
                self.buf.clear();
                continue;
            }
            let chunk = usize::min(space, data.len());
            self.buf.extend_from_slice(&data[..chunk]).unwrap();
            data = &data[chunk..];
            self.process().await;
        }
    }

    /// Read from `serial` forever, digesting as bytes arrive.
    pub async fn read_from<R: embedded_io_async::Read>(&mut self, mut serial: R) -> ! {
        use embedded_io::Error;
        let mut chunk = [0u8; 64];
        loop {
            match serial.read(&mut chunk).await {
                Ok(received) => {
                    if received > 0 {
                        self.write(&chunk[..received]).await;
                    }
                }
                Err(e) => {
                    error!("Got serial read error {:?}", e.kind());
                    self.clear();
                }
            }
        }
    }

    /// Drop all partial input and classification state.
    pub fn clear(&mut self) {
        self.buf.clear();
        self.digester.reset();
    }

    async fn process(&mut self) {
        loop {
            self.digester.set_binary(self.res_slot.binary_expected());

            let before = self.buf.len();
            match self.digester.digest(&mut self.buf) {
                DigestResult::None => {
                    if self.buf.len() == before {
                        break;
                    }
                }
                DigestResult::Prompt(prompt) => {
                    debug!("Received prompt");
                    if self.res_slot.signal(Response::Prompt(prompt)).is_err() {
                        error!("Received prompt but a response is already pending");
                    }
                }
                DigestResult::Urc(line) => match Urc::parse(&line) {
                    Some(urc) => {
                        debug!("Received URC: {:?}", LossyStr(&line));
                        self.urc_publisher.publish(urc).await;
                    }
                    None => error!("Parsing URC FAILED: {:?}", LossyStr(&line)),
                },
                DigestResult::Response(result) => {
                    self.res_slot.finish_binary();

                    let response = match result {
                        Ok(body) => {
                            if body.is_empty() {
                                debug!("Received OK");
                            } else {
                                debug!("Received response: {:?}", LossyStr(&body));
                            }
                            Response::Ok(body)
                        }
                        Err(DigestError::Command(diagnosis)) => {
                            warn!(
                                "Received error response: {:?}",
                                LossyStr(&diagnosis)
                            );
                            Response::CommandError(diagnosis)
                        }
                        Err(DigestError::Overflow) => {
                            error!("Response overflowed the ingress buffer");
                            Response::Overflow
                        }
                    };

                    if self.res_slot.signal(response).is_err() {
                        error!("Received response but a response is already pending");
                    }
                }
            }
        }
    }
}
