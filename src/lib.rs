//! Async driver for Iridium 9602/9603 Short Burst Data transceivers.
//!
//! The transceiver talks an AT dialect over an asynchronous serial line
//! and is a strictly serial device: one command in flight, answered in
//! order, with unsolicited result codes (`SBDRING` ring alerts, `+CIEV`
//! indicator events) interleaved at any time. This crate splits the work
//! into:
//!
//! - an [`Ingress`] fed with received bytes, classifying them into
//!   responses, prompts and unsolicited events,
//! - a [`Client`] that writes requests and suspends until the single
//!   in-flight command completes, fails or times out,
//! - a typed command catalog in [`commands`],
//! - a [`Modem`] orchestrating the multi-step SBD workflows: the
//!   two-phase binary write, the send pipeline
//!   (write → wait for network → session → fetch MT → clear buffers)
//!   and the boot sequence.
//!
//! Serial port handling stays outside: any pair of
//! [`embedded_io_async::Read`]/[`Write`](embedded_io_async::Write) halves
//! works, whether that is a UART on a microcontroller or a
//! `tokio-serial` adapter on a host (the 9602/9603 default line
//! configuration is 19200 8N1).
//!
//! ```ignore
//! static BUFFERS: Buffers<512, 4, 2> = Buffers::new();
//!
//! let (mut ingress, client) = BUFFERS.split(serial_tx, Config::default());
//! spawner.spawn(async move { ingress.read_from(serial_rx).await });
//!
//! let mut rings = BUFFERS.urc_subscription()?;
//! let mut modem = Modem::new(client, BUFFERS.urc_subscription()?);
//!
//! modem.init().await?;
//! let outcome = modem
//!     .send_text_message("hello via satellite", &SessionOptions::default())
//!     .await?;
//! if let Some(message) = outcome.mt_message {
//!     // A mobile-terminated message rode back on the same session
//! }
//! ```
//!
//! # Optional Cargo features
//!
//! - **`defmt`** - log via `defmt`.
//! - **`log`** - log via `log`. Mutually exclusive with `defmt`.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod buffers;
mod client;
pub mod codec;
pub mod commands;
mod config;
mod digest;
pub mod error;
mod helpers;
mod ingress;
mod modem;
mod response;
pub mod types;
mod traits;
mod urc;
mod urc_channel;

#[cfg(test)]
mod tx_mock;

pub use buffers::Buffers;
pub use client::Client;
pub use config::Config;
pub use digest::{DigestError, DigestResult, SbdDigester};
pub use error::{Error, SbdError};
pub use helpers::sbd_checksum;
pub use ingress::Ingress;
pub use modem::{Modem, SessionOptions};
pub use response::{Response, ResponseSlot};
pub use traits::{Digester, SbdCmd};
pub use urc::{AutoRegEvent, IndicatorEvent, Urc};
pub use urc_channel::{SubscribeError, UrcChannel, UrcPublisher, UrcSubscription};
