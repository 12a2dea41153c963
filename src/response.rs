use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    mutex::{Mutex, MutexGuard},
    signal::Signal,
};
use heapless::Vec;

use crate::error::Error;

/// One completed exchange as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<const N: usize> {
    /// Terminated by `OK`; carries the body buffered before it.
    Ok(Vec<u8, N>),
    /// A data prompt (`READY`) asking for a raw payload.
    Prompt(u8),
    /// Terminated by `ERROR`; carries whatever diagnosis lines were
    /// buffered before it, possibly nothing.
    CommandError(Vec<u8, N>),
    /// The answer did not fit the ingress buffer.
    Overflow,
}

impl<const N: usize> Default for Response<N> {
    fn default() -> Self {
        Response::Ok(Vec::new())
    }
}

impl<'a, const N: usize> From<&'a Response<N>> for Result<&'a [u8], Error> {
    fn from(value: &'a Response<N>) -> Self {
        match value {
            Response::Ok(body) => Ok(body),
            Response::Prompt(_) => Ok(&[]),
            Response::CommandError(_) => Err(Error::Command),
            Response::Overflow => Err(Error::Overflow),
        }
    }
}

/// The single in-flight slot shared between ingress and client.
///
/// Holds at most one completed [`Response`] at a time. The client resets
/// the slot before every request, so a response that arrives after its
/// command already timed out is discarded instead of completing the next
/// command. The binary flag carries the client's announcement that the
/// next answer uses the raw `+SBDRB` envelope.
pub struct ResponseSlot<const N: usize> {
    response: Mutex<CriticalSectionRawMutex, RefCell<Response<N>>>,
    signal: Signal<CriticalSectionRawMutex, ()>,
    binary: AtomicBool,
}

pub type ResponseSlotGuard<'a, const N: usize> =
    MutexGuard<'a, CriticalSectionRawMutex, RefCell<Response<N>>>;

/// A response was signaled while a previous one was still pending.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SlotInUseError;

impl<const N: usize> ResponseSlot<N> {
    pub const fn new() -> Self {
        Self {
            response: Mutex::new(RefCell::new(Response::Ok(Vec::new()))),
            signal: Signal::new(),
            binary: AtomicBool::new(false),
        }
    }

    /// Discard any pending response and binary expectation.
    pub fn reset(&self) {
        self.signal.reset();
        self.binary.store(false, Ordering::Relaxed);
    }

    /// Wait until a response is signaled and take a guard to it.
    pub async fn wait(&self) -> ResponseSlotGuard<'_, N> {
        self.signal.wait().await;

        // The mutex is never locked while the signal is raised
        self.response.try_lock().unwrap()
    }

    /// If a response is pending, take a guard to it.
    pub fn try_get(&self) -> Option<ResponseSlotGuard<'_, N>> {
        if self.signal.signaled() {
            Some(self.response.try_lock().unwrap())
        } else {
            None
        }
    }

    pub(crate) fn signal(&self, response: Response<N>) -> Result<(), SlotInUseError> {
        if self.signal.signaled() {
            return Err(SlotInUseError);
        }

        // Not signaled: the client cannot be holding the guard right now
        {
            let slot = self.response.try_lock().unwrap();
            *slot.borrow_mut() = response;
        }

        // The mutex is unlocked again before the signal is raised
        self.signal.signal(());
        Ok(())
    }

    pub(crate) fn expect_binary(&self) {
        self.binary.store(true, Ordering::Relaxed);
    }

    pub(crate) fn binary_expected(&self) -> bool {
        self.binary.load(Ordering::Relaxed)
    }

    pub(crate) fn finish_binary(&self) {
        self.binary.store(false, Ordering::Relaxed);
    }
}
