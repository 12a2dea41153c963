use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::urc::Urc;

pub type UrcPublisher<'sub, const CAPACITY: usize, const SUBSCRIBERS: usize> =
    Publisher<'sub, CriticalSectionRawMutex, Urc, CAPACITY, SUBSCRIBERS, 1>;
pub type UrcSubscription<'sub, const CAPACITY: usize, const SUBSCRIBERS: usize> =
    Subscriber<'sub, CriticalSectionRawMutex, Urc, CAPACITY, SUBSCRIBERS, 1>;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscribeError {
    MaximumSubscribersReached,
}

/// Fan-out of unsolicited events (ring alerts, indicator reports,
/// registration events) to up to `SUBSCRIBERS` listeners.
pub struct UrcChannel<const CAPACITY: usize, const SUBSCRIBERS: usize>(
    pub(crate) PubSubChannel<CriticalSectionRawMutex, Urc, CAPACITY, SUBSCRIBERS, 1>,
);

impl<const CAPACITY: usize, const SUBSCRIBERS: usize> UrcChannel<CAPACITY, SUBSCRIBERS> {
    pub const fn new() -> Self {
        Self(PubSubChannel::new())
    }

    pub fn subscribe(&self) -> Result<UrcSubscription<'_, CAPACITY, SUBSCRIBERS>, SubscribeError> {
        self.0
            .subscriber()
            .map_err(|_| SubscribeError::MaximumSubscribersReached)
    }
}

impl<const CAPACITY: usize, const SUBSCRIBERS: usize> Default
    for UrcChannel<CAPACITY, SUBSCRIBERS>
{
    fn default() -> Self {
        Self::new()
    }
}
