use embedded_io_async::Write;

use crate::client::Client;
use crate::config::Config;
use crate::digest::SbdDigester;
use crate::ingress::Ingress;
use crate::response::ResponseSlot;
use crate::urc_channel::{SubscribeError, UrcChannel, UrcSubscription};

/// Statically allocated state shared between [`Ingress`] and [`Client`]:
/// the single in-flight response slot and the URC fan-out channel.
///
/// ```ignore
/// static BUFFERS: Buffers<256, 4, 2> = Buffers::new();
///
/// let (ingress, client) = BUFFERS.split(serial_tx, Config::default());
/// ```
///
/// `INGRESS_BUF_SIZE` bounds one complete response; keep it at 512 or
/// above when `+SBDRB` is used, so a full 270 byte MT envelope fits.
pub struct Buffers<
    const INGRESS_BUF_SIZE: usize,
    const URC_CAPACITY: usize,
    const URC_SUBSCRIBERS: usize,
> {
    res_slot: ResponseSlot<INGRESS_BUF_SIZE>,
    urc_channel: UrcChannel<URC_CAPACITY, URC_SUBSCRIBERS>,
}

impl<const INGRESS_BUF_SIZE: usize, const URC_CAPACITY: usize, const URC_SUBSCRIBERS: usize>
    Buffers<INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>
{
    pub const fn new() -> Self {
        Self {
            res_slot: ResponseSlot::new(),
            urc_channel: UrcChannel::new(),
        }
    }

    pub fn split<W: Write>(
        &self,
        writer: W,
        config: Config,
    ) -> (
        Ingress<'_, SbdDigester, INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>,
        Client<'_, W, INGRESS_BUF_SIZE>,
    ) {
        (
            Ingress::new(SbdDigester::new(), &self.res_slot, &self.urc_channel),
            Client::new(writer, &self.res_slot, config),
        )
    }

    /// The channel carrying ring alerts and other unsolicited events.
    pub fn urc_channel(&self) -> &UrcChannel<URC_CAPACITY, URC_SUBSCRIBERS> {
        &self.urc_channel
    }

    pub fn urc_subscription(
        &self,
    ) -> Result<UrcSubscription<'_, URC_CAPACITY, URC_SUBSCRIBERS>, SubscribeError> {
        self.urc_channel.subscribe()
    }
}

impl<const INGRESS_BUF_SIZE: usize, const URC_CAPACITY: usize, const URC_SUBSCRIBERS: usize> Default
    for Buffers<INGRESS_BUF_SIZE, URC_CAPACITY, URC_SUBSCRIBERS>
{
    fn default() -> Self {
        Self::new()
    }
}
